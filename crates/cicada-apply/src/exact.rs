//! `apply_exact`: full cartesian-product non-local feature application, with
//! no retained-list bound (spec §4.3 "no k" variant). Useful as the
//! ground-truth oracle the bounded appliers are tested against.

use cicada_core::Semiring;
use cicada_graph::{topologically_sort, Hypergraph};
use cicada_model::Model;
use cicada_vector::FeatureFunction;

use crate::candidate::{score_candidate, DerivationItem, Recombiner};

/// Rescoring `graph` against `model`/`function` by expanding every node's
/// full cross product of antecedent derivations. No item is ever dropped,
/// so this is exponential in edge arity and intended for small forests or
/// as a correctness oracle, not production decoding.
pub fn apply_exact<S: Semiring>(
    graph: &Hypergraph,
    model: &dyn Model,
    function: &dyn FeatureFunction<S>,
) -> Hypergraph {
    model.initialize();
    let sorted = topologically_sort(graph);
    let mut out = Hypergraph::new();
    let mut goal_out_node: Option<cicada_core::NodeId> = None;
    let mut derivations: Vec<Vec<DerivationItem<S>>> = Vec::with_capacity(sorted.node_count());

    for node_id in sorted.node_ids() {
        let node = sorted.node(node_id).expect("node_ids are in range");
        let is_goal = sorted.is_valid() && node_id == sorted.goal();
        let goal_node = if is_goal { Some(out.add_node()) } else { None };
        if is_goal {
            goal_out_node = goal_node;
        }
        tracing::trace!(node = node_id.index(), incoming = node.incoming_edges().len(), "applying candidates at node");
        let mut recombiner = Recombiner::new(goal_node);
        let mut retained: Vec<DerivationItem<S>> = Vec::new();

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
                let out_node = recombiner.resolve(
                    &mut out,
                    &mut retained,
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
        }
        tracing::debug!(node = node_id.index(), retained = retained.len(), "node resolved");
        derivations.push(retained);
    }

    if sorted.is_valid() {
        out.set_goal(goal_out_node.expect("goal node was reserved when processed"));
    }
    model.initialize();
    out
}

/// Every coordinate tuple across `tails_d`'s lengths (empty tuple if arity
/// is zero, i.e. a leaf edge).
pub(crate) fn cartesian_indices<T>(tails_d: &[&[T]]) -> Vec<Vec<usize>> {
    let mut result = vec![Vec::new()];
    for items in tails_d {
        let mut next = Vec::with_capacity(result.len() * items.len().max(1));
        for prefix in &result {
            for idx in 0..items.len() {
                let mut extended = prefix.clone();
                extended.push(idx);
                next.push(extended);
            }
        }
        result = next;
    }
    result
}
