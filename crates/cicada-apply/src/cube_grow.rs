//! `apply_cube_grow`: demand-driven cube growing. Unlike [`crate::cube_prune`],
//! which visits every node in topological order and fully populates its
//! `D[]` list before moving on, cube growing starts at the goal and only
//! computes as much of an antecedent's list as some descendant actually
//! asked for — useful when only a handful of goal-level derivations are
//! needed and most of the forest's breadth is never touched.

use std::collections::{BinaryHeap, HashSet};

use cicada_core::{NodeId, Semiring};
use cicada_graph::{topologically_sort, Hypergraph};
use cicada_model::Model;
use cicada_vector::FeatureFunction;

use crate::candidate::{score_candidate, Candidate, DerivationItem, Recombiner};

struct NodeState<S: Semiring> {
    heap: BinaryHeap<Candidate<S>>,
    pushed: HashSet<(usize, Vec<usize>)>,
    retained: Vec<DerivationItem<S>>,
    initialized: bool,
    recombiner: Recombiner,
}

impl<S: Semiring> Default for NodeState<S> {
    fn default() -> Self {
        Self {
            heap: BinaryHeap::new(),
            pushed: HashSet::new(),
            retained: Vec::new(),
            initialized: false,
            recombiner: Recombiner::new(None),
        }
    }
}

struct Grower<'a, S: Semiring> {
    sorted: &'a Hypergraph,
    model: &'a dyn Model,
    function: &'a dyn FeatureFunction<S>,
    k: usize,
    states: Vec<NodeState<S>>,
    out: Hypergraph,
    goal_out_node: Option<NodeId>,
}

impl<'a, S: Semiring> Grower<'a, S> {
    /// Resolves the output node for a popped candidate at `node`, recombining
    /// by `state` (or, at the goal, reusing the single reserved goal node).
    fn resolve(&mut self, node: usize, state: Vec<u8>, score: S, estimate: S) -> NodeId {
        let out = &mut self.out;
        let ns = &mut self.states[node];
        ns.recombiner.resolve(out, &mut ns.retained, state, score, estimate)
    }

    /// Ensures `derivations[node]` has an item at `idx`, growing it lazily
    /// (recursing into antecedents only as far as needed). Returns whether
    /// that item now exists.
    fn ensure(&mut self, node: usize, idx: usize) -> bool {
        if self.states[node].retained.len() > idx {
            return true;
        }
        if self.states[node].retained.len() >= self.k {
            return false;
        }

        if !self.states[node].initialized {
            self.states[node].initialized = true;
            let node_id = NodeId::from_raw(node as u32);
            let is_goal = self.sorted.is_valid() && node_id == self.sorted.goal();
            tracing::trace!(node, "applying candidates at node");
            if is_goal {
                let goal_node = self.out.add_node();
                self.goal_out_node = Some(goal_node);
                self.states[node].recombiner = Recombiner::new(Some(goal_node));
            }
            let incoming: Vec<_> = self
                .sorted
                .node(node_id)
                .expect("node index is in range")
                .incoming_edges()
                .to_vec();
            for (slot, edge_id) in incoming.iter().enumerate() {
                let edge = self.sorted.edge(*edge_id).expect("incoming edges are in range");
                let arity = edge.arity();
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
                let tails_d: Vec<&[DerivationItem<S>]> = edge
                    .tails()
                    .iter()
                    .map(|t| self.states[t.index()].retained.as_slice())
                    .collect();
                let zero = vec![0usize; arity];
                if let Some(candidate) =
                    score_candidate(self.model, self.function, edge, &tails_d, slot, zero.clone(), is_goal)
                {
                    self.states[node].pushed.insert((slot, zero));
                    self.states[node].heap.push(candidate);
                }
            }
        }

        while self.states[node].retained.len() <= idx {
            let Some(best) = self.states[node].heap.pop() else {
                return false;
            };

            let node_id = NodeId::from_raw(node as u32);
            let is_goal = self.sorted.is_valid() && node_id == self.sorted.goal();
            let edge_id = self.sorted.node(node_id).expect("node index is in range").incoming_edges()[best.slot];
            let edge = self.sorted.edge(edge_id).expect("incoming edges are in range").clone();

            for dim in 0..best.j.len() {
                let mut succ = best.j.clone();
                succ[dim] += 1;
                let tail = edge.tails()[dim];
                if !self.ensure(tail.index(), succ[dim]) {
                    continue;
                }
                if self.states[node].pushed.insert((best.slot, succ.clone())) {
                    let tails_d: Vec<&[DerivationItem<S>]> = edge
                        .tails()
                        .iter()
                        .map(|t| self.states[t.index()].retained.as_slice())
                        .collect();
                    if let Some(candidate) =
                        score_candidate(self.model, self.function, &edge, &tails_d, best.slot, succ, is_goal)
                    {
                        self.states[node].heap.push(candidate);
                    }
                }
            }

            let out_node = self.resolve(node, best.state, best.score, best.estimate);
            let new_edge = self
                .out
                .add_edge(&best.out_tails, edge.rule.clone())
                .expect("antecedent out_nodes always exist");
            {
                let new_edge_ref = self.out.edge_mut(new_edge).expect("just inserted");
                new_edge_ref.features += &best.heuristic_features;
            }
            self.out.connect_edge(new_edge, out_node).expect("out_node was just created");
        }
        tracing::debug!(node, retained = self.states[node].retained.len(), "node resolved");
        self.states[node].retained.len() > idx
    }
}

/// Rescores `graph` against `model`/`function`, growing at most `k`
/// derivations per node, but only for the nodes actually reachable while
/// filling the goal's list (antecedents never asked for stay untouched).
pub fn apply_cube_grow<S: Semiring>(
    graph: &Hypergraph,
    model: &dyn Model,
    function: &dyn FeatureFunction<S>,
    k: usize,
) -> Hypergraph {
    model.initialize();
    let sorted = topologically_sort(graph);
    let node_count = sorted.node_count();
    let mut grower = Grower {
        sorted: &sorted,
        model,
        function,
        k,
        states: (0..node_count).map(|_| NodeState::default()).collect(),
        out: Hypergraph::new(),
        goal_out_node: None,
    };

    if sorted.is_valid() && k > 0 {
        let goal_idx = sorted.goal().index();
        let mut idx = 0;
        while grower.ensure(goal_idx, idx) {
            idx += 1;
            if idx >= k {
                break;
            }
        }
        if let Some(out_goal) = grower.goal_out_node {
            grower.out.set_goal(out_goal);
        }
    }

    model.initialize();
    grower.out
}

#[cfg(test)]
mod tests {
    use super::*;
    use cicada_core::{Symbol, Tropical, Vocab};
    use cicada_graph::Rule;
    use cicada_model::BigramModel;
    use cicada_vector::{AttributeVector, FeatureId, FeatureVector, LinearTropical};

    fn build_two_choice_graph() -> (Hypergraph, BigramModel) {
        let a0 = Symbol::intern("a0");
        let a1 = Symbol::intern("a1");
        let b0 = Symbol::intern("b0");
        let b1 = Symbol::intern("b1");

        let mut graph = Hypergraph::new();
        let left = graph.add_node();
        for w in [a0, a1] {
            let rule = Rule::monolingual(Symbol::intern("[A]"), vec![w], FeatureVector::new(), AttributeVector::new()).unwrap();
            let e = graph.add_edge(&[], rule).unwrap();
            graph.connect_edge(e, left).unwrap();
        }
        let right = graph.add_node();
        for w in [b0, b1] {
            let rule = Rule::monolingual(Symbol::intern("[B]"), vec![w], FeatureVector::new(), AttributeVector::new()).unwrap();
            let e = graph.add_edge(&[], rule).unwrap();
            graph.connect_edge(e, right).unwrap();
        }
        let root = graph.add_node();
        let rule = Rule::monolingual(
            Symbol::intern("[S]"),
            vec![Symbol::intern("[A]").with_index(Some(1)), Symbol::intern("[B]").with_index(Some(2))],
            FeatureVector::new(),
            AttributeVector::new(),
        )
        .unwrap();
        let edge = graph.add_edge(&[left, right], rule).unwrap();
        graph.connect_edge(edge, root).unwrap();
        graph.set_goal(root);

        let mut model = BigramModel::new(-9.0);
        model.set_weight(Symbol::from_id(u32::MAX), a0, -1.0);
        model.set_weight(Symbol::from_id(u32::MAX), a1, -2.0);
        model.set_weight(a0, b0, -0.1);
        model.set_weight(a0, b1, -0.2);
        model.set_weight(a1, b0, -0.3);
        model.set_weight(a1, b1, -0.4);
        model.set_weight(b0, Symbol::from_id(u32::MAX), -0.5);
        model.set_weight(b1, Symbol::from_id(u32::MAX), -0.6);
        (graph, model)
    }

    #[test]
    fn cube_growing_only_populates_what_the_goal_demands() {
        Vocab::reset();
        let (graph, model) = build_two_choice_graph();
        let mut function = LinearTropical::new();
        function.set_weight(FeatureId::intern("bigram-lm"), 1.0);

        let grown = apply_cube_grow::<Tropical>(&graph, &model, &function, 1);
        assert!(grown.is_valid());
        let goal = grown.node(grown.goal()).unwrap();
        assert_eq!(goal.incoming_edges().len(), 1);
    }

    #[test]
    fn cube_growing_with_full_k_matches_exact_goal_edge_count() {
        Vocab::reset();
        let (graph, model) = build_two_choice_graph();
        let mut function = LinearTropical::new();
        function.set_weight(FeatureId::intern("bigram-lm"), 1.0);

        let grown = apply_cube_grow::<Tropical>(&graph, &model, &function, 4);
        let exact = crate::exact::apply_exact::<Tropical>(&graph, &model, &function);
        let goal_grown = grown.node(grown.goal()).unwrap();
        let goal_exact = exact.node(exact.goal()).unwrap();
        assert_eq!(goal_grown.incoming_edges().len(), goal_exact.incoming_edges().len());
    }

    #[test]
    fn zero_k_produces_an_invalid_empty_graph() {
        Vocab::reset();
        let (graph, model) = build_two_choice_graph();
        let mut function = LinearTropical::new();
        function.set_weight(FeatureId::intern("bigram-lm"), 1.0);
        let grown = apply_cube_grow::<Tropical>(&graph, &model, &function, 0);
        assert!(!grown.is_valid());
    }
}
