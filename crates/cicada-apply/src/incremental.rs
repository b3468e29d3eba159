//! `apply_incremental`: a simpler budgeted applier than [`crate::cube_prune`].
//! Rather than lazily exploring a per-node heap, every incoming edge's full
//! candidate cross product is scored up front; the node's retained list is
//! kept sorted by estimate and truncated to `k` immediately after each
//! candidate is folded in, so the working set never exceeds `k + 1` items.

use cicada_core::Semiring;
use cicada_graph::{topologically_sort, Hypergraph};
use cicada_model::Model;
use cicada_vector::FeatureFunction;

use crate::candidate::{score_candidate, Candidate, DerivationItem, Recombiner};
use crate::exact::cartesian_indices;

/// Rescores `graph` against `model`/`function`, keeping at most `k`
/// candidates per node at all times (truncated after every single
/// candidate, not just after a whole edge's worth).
pub fn apply_incremental<S: Semiring>(
    graph: &Hypergraph,
    model: &dyn Model,
    function: &dyn FeatureFunction<S>,
    k: usize,
) -> Hypergraph {
    model.initialize();
    let sorted = topologically_sort(graph);
    let mut out = Hypergraph::new();
    let mut goal_out_node: Option<cicada_core::NodeId> = None;
    let mut derivations: Vec<Vec<DerivationItem<S>>> = Vec::with_capacity(sorted.node_count());

    for node_id in sorted.node_ids() {
        derivations.push(Vec::new());

        let node = sorted.node(node_id).expect("node_ids are in range");
        let is_goal = sorted.is_valid() && node_id == sorted.goal();
        let goal_node = if is_goal { Some(out.add_node()) } else { None };
        if is_goal {
            goal_out_node = goal_node;
        }

        tracing::trace!(node = node_id.index(), incoming = node.incoming_edges().len(), "applying candidates at node");
        let mut pool: Vec<Candidate<S>> = Vec::new();
        if k > 0 {
            for (slot, &edge_id) in node.incoming_edges().iter().enumerate() {
                let edge = sorted.edge(edge_id).expect("incoming_edges are in range");
                let tails_d: Vec<&[DerivationItem<S>]> = edge
                    .tails()
                    .iter()
                    .map(|t| derivations[t.index()].as_slice())
                    .collect();
                for j in cartesian_indices(&tails_d) {
                    let Some(candidate) =
                        score_candidate(model, function, edge, &tails_d, slot, j, is_goal)
                    else {
                        continue;
                    };
                    insert_truncated(&mut pool, candidate, k);
                }
            }
        }

        let mut recombiner = Recombiner::new(goal_node);
        for candidate in pool {
            let edge = sorted
                .edge(node.incoming_edges()[candidate.slot])
                .expect("slot is one of this node's incoming edges");
            let out_node = recombiner.resolve(
                &mut out,
                &mut derivations[node_id.index()],
                candidate.state,
                candidate.score,
                candidate.estimate,
            );
            let new_edge = out
                .add_edge(&candidate.out_tails, edge.rule.clone())
                .expect("antecedent out_nodes always exist");
            {
                let new_edge_ref = out.edge_mut(new_edge).expect("just inserted");
                new_edge_ref.features += &candidate.heuristic_features;
            }
            out.connect_edge(new_edge, out_node)
                .expect("out_node was just created");
        }
        tracing::debug!(node = node_id.index(), retained = derivations[node_id.index()].len(), "node resolved");
    }

    if sorted.is_valid() {
        out.set_goal(goal_out_node.expect("goal node was reserved when processed"));
    }
    model.initialize();
    out
}

/// Inserts `candidate` into `pool` (kept sorted by descending estimate),
/// then truncates to `k`.
fn insert_truncated<S: Semiring>(pool: &mut Vec<Candidate<S>>, candidate: Candidate<S>, k: usize) {
    let position = pool
        .iter()
        .position(|existing| candidate.estimate.value() > existing.estimate.value())
        .unwrap_or(pool.len());
    pool.insert(position, candidate);
    pool.truncate(k);
}

#[cfg(test)]
mod tests {
    use super::*;
    use cicada_core::{Symbol, Tropical, Vocab};
    use cicada_graph::Rule;
    use cicada_model::BigramModel;
    use cicada_vector::{AttributeVector, FeatureId, FeatureVector, LinearTropical};

    fn build_graph() -> (Hypergraph, BigramModel) {
        let a0 = Symbol::intern("a0");
        let a1 = Symbol::intern("a1");
        let a2 = Symbol::intern("a2");

        let mut graph = Hypergraph::new();
        let leaves = graph.add_node();
        for w in [a0, a1, a2] {
            let rule = Rule::monolingual(Symbol::intern("[W]"), vec![w], FeatureVector::new(), AttributeVector::new()).unwrap();
            let e = graph.add_edge(&[], rule).unwrap();
            graph.connect_edge(e, leaves).unwrap();
        }
        graph.set_goal(leaves);

        let mut model = BigramModel::new(-9.0);
        model.set_weight(Symbol::from_id(u32::MAX), a0, -0.1);
        model.set_weight(Symbol::from_id(u32::MAX), a1, -0.2);
        model.set_weight(Symbol::from_id(u32::MAX), a2, -0.3);
        (graph, model)
    }

    #[test]
    fn incremental_application_keeps_only_the_best_k() {
        Vocab::reset();
        let (graph, model) = build_graph();
        let mut function = LinearTropical::new();
        function.set_weight(FeatureId::intern("bigram-lm"), 1.0);

        let applied = apply_incremental::<Tropical>(&graph, &model, &function, 2);
        assert!(applied.is_valid());
        let goal = applied.node(applied.goal()).unwrap();
        assert_eq!(goal.incoming_edges().len(), 2);
    }

    #[test]
    fn zero_k_retains_nothing() {
        Vocab::reset();
        let (graph, model) = build_graph();
        let mut function = LinearTropical::new();
        function.set_weight(FeatureId::intern("bigram-lm"), 1.0);
        let applied = apply_incremental::<Tropical>(&graph, &model, &function, 0);
        let goal = applied.node(applied.goal()).unwrap();
        assert!(goal.incoming_edges().is_empty());
    }

    #[test]
    fn insert_truncated_keeps_descending_order() {
        let mut pool: Vec<Candidate<Tropical>> = Vec::new();
        let make = |v: f64| Candidate {
            slot: 0,
            j: vec![],
            out_tails: vec![],
            score: Tropical(v),
            estimate: Tropical(v),
            state: vec![],
            heuristic_features: FeatureVector::new(),
        };
        insert_truncated(&mut pool, make(1.0), 2);
        insert_truncated(&mut pool, make(3.0), 2);
        insert_truncated(&mut pool, make(2.0), 2);
        let values: Vec<f64> = pool.iter().map(|c| c.estimate.value()).collect();
        assert_eq!(values, vec![3.0, 2.0]);
    }
}
