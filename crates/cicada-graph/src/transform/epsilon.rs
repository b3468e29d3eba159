//! Epsilon-edge elimination (spec §4.1, scenario "ε removal"): an edge whose
//! rule consumes nothing but a single tail is spliced away by merging that
//! tail's alternatives directly into the edge's head, summing features.

use cicada_core::CicadaError;

use crate::hypergraph::Hypergraph;

/// Removes every edge whose source side is exactly `[<epsilon>]`, merging
/// its unique tail's incoming edges into the edge's head and summing
/// features along the way. An ε-edge found with arity other than 1 is a
/// malformed graph: an ε production carries no antecedent to splice.
pub fn remove_epsilon(graph: &Hypergraph) -> Result<Hypergraph, CicadaError> {
    let is_epsilon_edge = |source: &[cicada_core::Symbol]| {
        source.len() == 1 && source[0].is_epsilon()
    };

    let mut out = Hypergraph::new();
    for _ in 0..graph.node_count() {
        out.add_node();
    }
    if graph.is_valid() {
        out.set_goal(graph.goal());
    }

    for node_id in graph.node_ids() {
        for &edge_id in graph.node_unchecked(node_id).incoming_edges() {
            let edge = graph.edge_unchecked(edge_id);
            if !is_epsilon_edge(&edge.rule.source) {
                continue;
            }
            if edge.tails().len() != 1 {
                return Err(CicadaError::malformed_graph(
                    "epsilon-edge-arity",
                    "an epsilon edge must have exactly one tail",
                ));
            }
            let tail = edge.tails()[0];
            for &inner_edge_id in graph.node_unchecked(tail).incoming_edges() {
                let inner = graph.edge_unchecked(inner_edge_id);
                let mut features = inner.features.clone();
                features += &edge.features;
                let new_edge_id = out
                    .add_edge(inner.tails(), inner.rule.clone())
                    .expect("tails already exist in out (same ids as graph)");
                let new_edge = out.edge_mut(new_edge_id).expect("just inserted");
                new_edge.features = features;
                new_edge.attributes = inner.attributes.clone();
                out.connect_edge(new_edge_id, node_id)
                    .expect("node_id exists in out (same id space)");
            }
        }
        // Non-epsilon edges into node_id are carried over untouched.
        for &edge_id in graph.node_unchecked(node_id).incoming_edges() {
            let edge = graph.edge_unchecked(edge_id);
            if is_epsilon_edge(&edge.rule.source) {
                continue;
            }
            let new_edge_id = out
                .add_edge(edge.tails(), edge.rule.clone())
                .expect("tails exist in out (same id space as graph)");
            let new_edge = out.edge_mut(new_edge_id).expect("just inserted");
            new_edge.features = edge.features.clone();
            new_edge.attributes = edge.attributes.clone();
            out.connect_edge(new_edge_id, node_id)
                .expect("node_id exists in out");
        }
    }

    Ok(out)
}
