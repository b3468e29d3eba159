//! Lazy k-best forest traversal (spec §4.5, "algorithm 3" of Huang & Chiang
//! 2005): a priority queue per node, advancing one antecedent coordinate at
//! a time and recombining by `(slot, coordinate)` signature, grounded on the
//! same demand-driven shape as `cicada-apply`'s cube growing.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};

use cicada_core::{NodeId, Semiring};
use cicada_graph::{topologically_sort, Hypergraph};
use cicada_vector::FeatureFunction;

use crate::traversal::Traversal;

struct Derivation<S: Semiring, T> {
    score: S,
    value: T,
}

struct Candidate<S: Semiring> {
    slot: usize,
    j: Vec<usize>,
    score: S,
}

impl<S: Semiring> PartialEq for Candidate<S> {
    fn eq(&self, other: &Self) -> bool {
        self.score.value() == other.score.value()
    }
}
impl<S: Semiring> Eq for Candidate<S> {}
impl<S: Semiring> PartialOrd for Candidate<S> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl<S: Semiring> Ord for Candidate<S> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score.value().total_cmp(&other.score.value())
    }
}

struct NodeState<S: Semiring, T> {
    derivations: Vec<Derivation<S, T>>,
    heap: BinaryHeap<Candidate<S>>,
    pushed: HashSet<(usize, Vec<usize>)>,
    initialized: bool,
}

impl<S: Semiring, T> NodeState<S, T> {
    fn new() -> Self {
        Self {
            derivations: Vec::new(),
            heap: BinaryHeap::new(),
            pushed: HashSet::new(),
            initialized: false,
        }
    }
}

struct Engine<'a, S: Semiring, T> {
    graph: &'a Hypergraph,
    function: &'a dyn FeatureFunction<S>,
    traversal: &'a dyn Traversal<T>,
    states: Vec<NodeState<S, T>>,
}

impl<'a, S: Semiring, T: Clone> Engine<'a, S, T> {
    fn score_of(&self, edge: &cicada_graph::Edge, j: &[usize]) -> Option<S> {
        let mut score = self.function.evaluate(&edge.features);
        for (tail, &idx) in edge.tails().iter().zip(j) {
            let derivation = self.states[tail.index()].derivations.get(idx)?;
            score = score.times(derivation.score);
        }
        Some(score)
    }

    fn value_of(&self, edge: &cicada_graph::Edge, j: &[usize]) -> T {
        let antecedents: Vec<&T> = edge
            .tails()
            .iter()
            .zip(j)
            .map(|(tail, &idx)| &self.states[tail.index()].derivations[idx].value)
            .collect();
        self.traversal.combine(edge, &antecedents)
    }

    /// Ensures `derivations[node]` has an entry at `idx`, lazily growing the
    /// node's list as far as needed. Returns whether that entry now exists.
    fn ensure(&mut self, node: usize, idx: usize) -> bool {
        if self.states[node].derivations.len() > idx {
            return true;
        }

        if !self.states[node].initialized {
            self.states[node].initialized = true;
            let node_id = NodeId::from_raw(node as u32);
            let incoming: Vec<_> = self
                .graph
                .node(node_id)
                .expect("node index is in range")
                .incoming_edges()
                .to_vec();
            for (slot, edge_id) in incoming.iter().enumerate() {
                let edge = self.graph.edge(*edge_id).expect("incoming edges are in range");
                let mut ready = true;
                for &tail in edge.tails() {
                    if !self.ensure(tail.index(), 0) {
                        ready = false;
                        break;
                    }
                }
                if !ready {
                    continue;
                }
                let zero = vec![0usize; edge.arity()];
                if let Some(score) = self.score_of(edge, &zero) {
                    self.states[node].pushed.insert((slot, zero.clone()));
                    self.states[node].heap.push(Candidate { slot, j: zero, score });
                }
            }
        }

        while self.states[node].derivations.len() <= idx {
            let Some(best) = self.states[node].heap.pop() else {
                return false;
            };

            let node_id = NodeId::from_raw(node as u32);
            let edge_id = self.graph.node(node_id).expect("node index is in range").incoming_edges()[best.slot];
            let edge = self.graph.edge(edge_id).expect("incoming edges are in range").clone();

            for dim in 0..best.j.len() {
                let mut succ = best.j.clone();
                succ[dim] += 1;
                let tail = edge.tails()[dim];
                if !self.ensure(tail.index(), succ[dim]) {
                    continue;
                }
                if self.states[node].pushed.insert((best.slot, succ.clone())) {
                    if let Some(score) = self.score_of(&edge, &succ) {
                        self.states[node].heap.push(Candidate { slot: best.slot, j: succ, score });
                    }
                }
            }

            let value = self.value_of(&edge, &best.j);
            self.states[node].derivations.push(Derivation { score: best.score, value });
        }

        self.states[node].derivations.len() > idx
    }
}

/// A lazy iterator over a hypergraph's derivations in descending score
/// order, rooted at the goal node. `next()` yields `(weight, value)` pairs
/// or ends the stream once no further derivation exists — the contract
/// spec §4.5 gives both k-best and the sampler.
pub struct KBest<'a, S: Semiring, T: Clone> {
    engine: Engine<'a, S, T>,
    goal: Option<usize>,
    next_idx: usize,
}

impl<'a, S: Semiring, T: Clone> KBest<'a, S, T> {
    /// Builds a k-best iterator over `graph`'s derivations, scored by
    /// `function` and rendered by `traversal`.
    pub fn new(graph: &'a Hypergraph, function: &'a dyn FeatureFunction<S>, traversal: &'a dyn Traversal<T>) -> Self {
        let sorted_goal_exists = graph.is_valid();
        Self {
            engine: Engine {
                graph,
                function,
                traversal,
                states: (0..graph.node_count()).map(|_| NodeState::new()).collect(),
            },
            goal: if sorted_goal_exists { Some(graph.goal().index()) } else { None },
            next_idx: 0,
        }
    }
}

impl<'a, S: Semiring, T: Clone> Iterator for KBest<'a, S, T> {
    type Item = (S, T);

    fn next(&mut self) -> Option<Self::Item> {
        let goal = self.goal?;
        if !self.engine.ensure(goal, self.next_idx) {
            return None;
        }
        let derivation = &self.engine.states[goal].derivations[self.next_idx];
        self.next_idx += 1;
        Some((derivation.score, derivation.value.clone()))
    }
}

/// Collects up to `k` best derivations from `graph`, in descending score
/// order. A thin convenience wrapper over [`KBest`] for callers that don't
/// need the lazy iterator contract, first dropping any node unreachable
/// from the goal the same way `cicada-apply`'s appliers do.
pub fn k_best<S: Semiring, T: Clone>(
    graph: &Hypergraph,
    function: &dyn FeatureFunction<S>,
    traversal: &dyn Traversal<T>,
    k: usize,
) -> Vec<(S, T)> {
    let sorted = topologically_sort(graph);
    KBest::new(&sorted, function, traversal).take(k).collect()
}

/// The boxed-iterator entry point over `graph`'s derivations, descending by
/// score, for callers that want to stream rather than collect.
pub fn k_best_iter<'a, S: Semiring + 'a, T: Clone + 'a>(
    graph: &'a Hypergraph,
    function: &'a dyn FeatureFunction<S>,
    traversal: &'a dyn Traversal<T>,
) -> Box<dyn Iterator<Item = (S, T)> + 'a> {
    Box::new(KBest::new(graph, function, traversal))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cicada_core::{Symbol, Tropical, Vocab};
    use cicada_graph::Rule;
    use cicada_vector::{AttributeVector, FeatureId, FeatureVector, LinearTropical};

    use crate::traversal::SurfaceYield;

    fn rule(lhs: &str, source: Vec<&str>, weight: f64) -> Rule {
        let mut features = FeatureVector::new();
        features.set(FeatureId::intern("w"), weight);
        Rule::monolingual(
            Symbol::intern(lhs),
            source.into_iter().map(Symbol::intern).collect(),
            features,
            AttributeVector::new(),
        )
        .unwrap()
    }

    fn build_two_choice_graph() -> Hypergraph {
        let mut graph = Hypergraph::new();
        let left = graph.add_node();
        for (w, weight) in [("a0", -1.0), ("a1", -2.0)] {
            let e = graph.add_edge(&[], rule("[A]", vec![w], weight)).unwrap();
            graph.connect_edge(e, left).unwrap();
        }
        let right = graph.add_node();
        for (w, weight) in [("b0", -0.1), ("b1", -0.2)] {
            let e = graph.add_edge(&[], rule("[B]", vec![w], weight)).unwrap();
            graph.connect_edge(e, right).unwrap();
        }
        let root = graph.add_node();
        let r = rule(
            "[S]",
            vec!["[A,1]", "[B,2]"],
            0.0,
        );
        let e = graph.add_edge(&[left, right], r).unwrap();
        graph.connect_edge(e, root).unwrap();
        graph.set_goal(root);
        graph
    }

    #[test]
    fn k_best_is_sorted_descending_by_score() {
        Vocab::reset();
        let graph = build_two_choice_graph();
        let mut function = LinearTropical::new();
        function.set_weight(FeatureId::intern("w"), 1.0);

        let results = k_best::<Tropical, String>(&graph, &function, &SurfaceYield, 4);
        assert_eq!(results.len(), 4);
        for pair in results.windows(2) {
            assert!(pair[0].0.value() >= pair[1].0.value());
        }
    }

    #[test]
    fn k_best_exhausts_the_forest_and_then_ends() {
        Vocab::reset();
        let graph = build_two_choice_graph();
        let mut function = LinearTropical::new();
        function.set_weight(FeatureId::intern("w"), 1.0);

        let results = k_best::<Tropical, String>(&graph, &function, &SurfaceYield, 100);
        assert_eq!(results.len(), 4);
    }

    #[test]
    fn the_best_derivation_picks_the_least_negative_choice_on_each_side() {
        Vocab::reset();
        let graph = build_two_choice_graph();
        let mut function = LinearTropical::new();
        function.set_weight(FeatureId::intern("w"), 1.0);

        let results = k_best::<Tropical, String>(&graph, &function, &SurfaceYield, 1);
        assert_eq!(results[0].1, "a0 b0");
    }

    #[test]
    fn invalid_goal_yields_no_derivations() {
        Vocab::reset();
        let graph = Hypergraph::new();
        let function = LinearTropical::new();
        let results = k_best::<Tropical, String>(&graph, &function, &SurfaceYield, 5);
        assert!(results.is_empty());
    }
}
