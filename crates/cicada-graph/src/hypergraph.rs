//! The mutable hypergraph/forest (spec §3, component C2).

use cicada_core::{CicadaError, EdgeId, NodeId};
use cicada_vector::{AttributeVector, FeatureVector};
use serde::{Deserialize, Serialize};

use crate::rule::Rule;

/// A node in the hypergraph: an accumulation point for zero or more
/// alternative derivations (`incoming_edges`), each of which produces it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Node {
    incoming: Vec<EdgeId>,
}

impl Node {
    /// Edges whose head is this node, i.e. the alternative ways to derive it.
    pub fn incoming_edges(&self) -> &[EdgeId] {
        &self.incoming
    }
}

/// A hyperedge: one rule application combining `tails` into `head`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    head: NodeId,
    tails: Vec<NodeId>,
    /// The rule licensing this edge.
    pub rule: Rule,
    /// Per-edge feature vector (independent of the rule's own features,
    /// e.g. model-contributed heuristic features from the applier).
    pub features: FeatureVector,
    /// Per-edge attribute vector.
    pub attributes: AttributeVector,
}

impl Edge {
    /// The node this edge derives.
    pub fn head(&self) -> NodeId {
        self.head
    }

    /// The antecedent nodes consumed by this edge, in rule order.
    pub fn tails(&self) -> &[NodeId] {
        &self.tails
    }

    /// The arity (antecedent count) of this edge.
    pub fn arity(&self) -> usize {
        self.tails.len()
    }
}

/// A mutable directed acyclic hypergraph with a designated goal node.
///
/// Construction is append-only: `add_node`/`add_edge` never remove or
/// renumber existing ids. Transforms (`topologically_sort`,
/// `remove_epsilon`, `remove_non_terminal`) build and return a *new*
/// hypergraph rather than mutating in place, per the "append-only during
/// composition; transform produces new graph then swap" resource rule.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Hypergraph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    goal: NodeId,
}

impl Hypergraph {
    /// Creates an empty hypergraph with no goal set.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            goal: NodeId::INVALID,
        }
    }

    /// Appends a new, edge-less node and returns its id.
    pub fn add_node(&mut self) -> NodeId {
        let id = NodeId::from_raw(self.nodes.len() as u32);
        self.nodes.push(Node::default());
        id
    }

    /// Appends a new hyperedge with the given tails and rule. The edge is
    /// not yet attached to a head node; call [`Hypergraph::connect_edge`].
    pub fn add_edge(&mut self, tails: &[NodeId], rule: Rule) -> Result<EdgeId, CicadaError> {
        for tail in tails {
            self.require_node(*tail)?;
        }
        let id = EdgeId::from_raw(self.edges.len() as u32);
        self.edges.push(Edge {
            head: NodeId::INVALID,
            tails: tails.to_vec(),
            features: rule.features.clone(),
            attributes: rule.attributes.clone(),
            rule,
        });
        Ok(id)
    }

    /// Attaches `edge` to `head`'s incoming-edge list. An edge belongs to
    /// exactly one head node; calling this twice on the same edge is a bug
    /// (re-architecture: append-only containers never un-attach an edge).
    pub fn connect_edge(&mut self, edge: EdgeId, head: NodeId) -> Result<(), CicadaError> {
        self.require_node(head)?;
        let edge_ref = self
            .edges
            .get_mut(edge.index())
            .ok_or_else(|| unknown_edge(edge))?;
        edge_ref.head = head;
        self.nodes[head.index()].incoming.push(edge);
        Ok(())
    }

    /// Sets (or replaces) the goal node.
    pub fn set_goal(&mut self, goal: NodeId) {
        self.goal = goal;
    }

    /// The designated goal node, or [`NodeId::INVALID`] if none was reached.
    pub fn goal(&self) -> NodeId {
        self.goal
    }

    /// `true` iff `goal != INVALID` and the goal node exists in this graph.
    /// A hypergraph with no valid goal represents `EmptyDerivation` (spec
    /// §7): this is a data condition callers must check, not an error.
    pub fn is_valid(&self) -> bool {
        self.goal.is_valid() && self.goal.index() < self.nodes.len()
    }

    /// Number of nodes (including any with no incoming edges).
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Returns the node for `id`.
    pub fn node(&self, id: NodeId) -> Result<&Node, CicadaError> {
        self.nodes.get(id.index()).ok_or_else(|| unknown_node(id))
    }

    /// Returns the edge for `id`.
    pub fn edge(&self, id: EdgeId) -> Result<&Edge, CicadaError> {
        self.edges.get(id.index()).ok_or_else(|| unknown_edge(id))
    }

    /// Mutable access to an edge's feature vector.
    pub fn edge_mut(&mut self, id: EdgeId) -> Result<&mut Edge, CicadaError> {
        self.edges.get_mut(id.index()).ok_or_else(|| unknown_edge(id))
    }

    /// Iterates over all node ids in insertion order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len()).map(|i| NodeId::from_raw(i as u32))
    }

    /// Iterates over all edge ids in insertion order.
    pub fn edge_ids(&self) -> impl Iterator<Item = EdgeId> {
        (0..self.edges.len()).map(|i| EdgeId::from_raw(i as u32))
    }

    /// Crate-internal direct access, used by transforms that have already
    /// established `id` is valid (no node/edge is ever removed after
    /// creation, so indices never go stale within one graph's lifetime).
    pub(crate) fn node_unchecked(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    /// See [`Hypergraph::node_unchecked`].
    pub(crate) fn edge_unchecked(&self, id: EdgeId) -> &Edge {
        &self.edges[id.index()]
    }

    fn require_node(&self, id: NodeId) -> Result<(), CicadaError> {
        if id.index() < self.nodes.len() {
            Ok(())
        } else {
            Err(unknown_node(id))
        }
    }

    /// Checks the structural invariants from spec §3/§8: every tail/head
    /// points at an existing node, and every edge appears in exactly its
    /// head node's incoming list.
    pub fn check_invariants(&self) -> Result<(), CicadaError> {
        for (idx, edge) in self.edges.iter().enumerate() {
            let edge_id = EdgeId::from_raw(idx as u32);
            if !edge.head.is_valid() {
                continue;
            }
            self.require_node(edge.head)?;
            for tail in &edge.tails {
                self.require_node(*tail)?;
            }
            let head_node = self.node(edge.head)?;
            if !head_node.incoming.contains(&edge_id) {
                return Err(CicadaError::malformed_graph(
                    "edge-head-mismatch",
                    "edge does not appear in its head node's incoming list",
                ));
            }
        }
        if self.goal.is_valid() {
            self.require_node(self.goal)?;
        }
        Ok(())
    }
}

fn unknown_node(id: NodeId) -> CicadaError {
    CicadaError::malformed_graph("unknown-node", "node does not exist")
        .with_context_node(id)
}

fn unknown_edge(id: EdgeId) -> CicadaError {
    CicadaError::malformed_graph("unknown-edge", "edge does not exist")
        .with_context_edge(id)
}

trait ContextExt {
    fn with_context_node(self, id: NodeId) -> CicadaError;
    fn with_context_edge(self, id: EdgeId) -> CicadaError;
}

impl ContextExt for CicadaError {
    fn with_context_node(self, id: NodeId) -> CicadaError {
        match self {
            CicadaError::MalformedGraph(info) => {
                CicadaError::MalformedGraph(info.with_context("node", id.as_raw()))
            }
            other => other,
        }
    }

    fn with_context_edge(self, id: EdgeId) -> CicadaError {
        match self {
            CicadaError::MalformedGraph(info) => {
                CicadaError::MalformedGraph(info.with_context("edge", id.as_raw()))
            }
            other => other,
        }
    }
}
