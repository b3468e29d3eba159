//! `apply_cube_prune`: Huang & Chiang's cube pruning (spec §4.3), bounded by
//! a per-node retained-list size `k`. Nodes are processed in topological
//! order; each node's candidates are explored with a max-heap seeded from
//! every incoming edge's all-zero coordinate, popping the best estimate and
//! pushing its neighboring coordinates until `k` items are retained or the
//! heap empties.

use std::collections::{BinaryHeap, HashSet};

use cicada_core::Semiring;
use cicada_graph::{topologically_sort, Hypergraph};
use cicada_model::Model;
use cicada_vector::FeatureFunction;

use crate::candidate::{score_candidate, Candidate, DerivationItem, Recombiner};

/// Rescores `graph` against `model`/`function`, retaining at most `k`
/// derivations per node. `k == 0` produces an empty output (every node's
/// `D[]` list stays empty, so no edge ever qualifies).
pub fn apply_cube_prune<S: Semiring>(
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
        let node = sorted.node(node_id).expect("node_ids are in range");
        let is_goal = sorted.is_valid() && node_id == sorted.goal();
        let goal_node = if is_goal { Some(out.add_node()) } else { None };
        if is_goal {
            goal_out_node = goal_node;
        }
        tracing::trace!(node = node_id.index(), incoming = node.incoming_edges().len(), "applying candidates at node");
        let incoming: Vec<_> = node
            .incoming_edges()
            .iter()
            .map(|&e| sorted.edge(e).expect("incoming_edges are in range"))
            .collect();
        let tails_d_by_slot: Vec<Vec<&[DerivationItem<S>]>> = incoming
            .iter()
            .map(|edge| {
                edge.tails()
                    .iter()
                    .map(|t| derivations[t.index()].as_slice())
                    .collect()
            })
            .collect();

        let mut heap: BinaryHeap<Candidate<S>> = BinaryHeap::new();
        let mut pushed: HashSet<(usize, Vec<usize>)> = HashSet::new();

        if k > 0 {
            for (slot, edge) in incoming.iter().enumerate() {
                let tails_d = &tails_d_by_slot[slot];
                let zero = vec![0usize; tails_d.len()];
                if let Some(candidate) =
                    score_candidate(model, function, edge, tails_d, slot, zero.clone(), is_goal)
                {
                    pushed.insert((slot, zero));
                    heap.push(candidate);
                }
            }
        }

        let mut recombiner = Recombiner::new(goal_node);
        let mut retained: Vec<DerivationItem<S>> = Vec::new();
        while retained.len() < k {
            let Some(best) = heap.pop() else { break };

            for dim in 0..best.j.len() {
                let mut succ = best.j.clone();
                succ[dim] += 1;
                if pushed.insert((best.slot, succ.clone())) {
                    let edge = incoming[best.slot];
                    let tails_d = &tails_d_by_slot[best.slot];
                    if let Some(candidate) =
                        score_candidate(model, function, edge, tails_d, best.slot, succ, is_goal)
                    {
                        heap.push(candidate);
                    }
                }
            }

            let edge = incoming[best.slot];
            let out_node = recombiner.resolve(&mut out, &mut retained, best.state, best.score, best.estimate);
            let new_edge = out
                .add_edge(&best.out_tails, edge.rule.clone())
                .expect("antecedent out_nodes always exist");
            {
                let new_edge_ref = out.edge_mut(new_edge).expect("just inserted");
                new_edge_ref.features += &best.heuristic_features;
            }
            out.connect_edge(new_edge, out_node)
                .expect("out_node was just created");
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
