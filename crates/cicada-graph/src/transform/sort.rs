//! Topological renumbering (spec §4.1): every tail id ends up strictly less
//! than its head's id, and nodes/edges unreachable from the goal are dropped.

use std::collections::HashMap;

use cicada_core::NodeId;

use crate::hypergraph::Hypergraph;

/// Returns a copy of `graph` renumbered so that for every edge, each tail's
/// node id is strictly less than the head's, with nodes/edges not reachable
/// from the goal dropped entirely. An invalid (goal-less) graph maps to an
/// empty graph.
pub fn topologically_sort(graph: &Hypergraph) -> Hypergraph {
    let mut out = Hypergraph::new();
    if !graph.is_valid() {
        return out;
    }

    let mut visited = vec![false; graph.node_count()];
    let mut order = Vec::new();
    visit(graph, graph.goal(), &mut visited, &mut order);

    let mut remap: HashMap<NodeId, NodeId> = HashMap::with_capacity(order.len());
    for &old_id in &order {
        remap.insert(old_id, out.add_node());
    }

    for old_edge_id in graph.edge_ids() {
        let edge = graph.edge_unchecked(old_edge_id);
        let Some(&new_head) = remap.get(&edge.head()) else {
            continue;
        };
        let new_tails: Vec<NodeId> = edge.tails().iter().map(|t| remap[t]).collect();
        let new_edge_id = out
            .add_edge(&new_tails, edge.rule.clone())
            .expect("remapped tails always exist");
        let new_edge = out.edge_mut(new_edge_id).expect("just inserted");
        new_edge.features = edge.features.clone();
        new_edge.attributes = edge.attributes.clone();
        out.connect_edge(new_edge_id, new_head)
            .expect("remapped head always exists");
    }

    out.set_goal(remap[&graph.goal()]);
    out
}

/// Post-order DFS: a node is pushed onto `order` only once every tail of
/// every one of its incoming edges has already been visited, so indexing
/// `order` left-to-right yields tails before heads.
fn visit(graph: &Hypergraph, node: NodeId, visited: &mut [bool], order: &mut Vec<NodeId>) {
    if visited[node.index()] {
        return;
    }
    visited[node.index()] = true;
    for &edge_id in graph.node_unchecked(node).incoming_edges() {
        for &tail in graph.edge_unchecked(edge_id).tails() {
            visit(graph, tail, visited, order);
        }
    }
    order.push(node);
}
