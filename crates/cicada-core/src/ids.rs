//! Integer handle types for hypergraph nodes and edges.
//!
//! Per the re-architecture design note, cyclic C++ pointer structures become
//! integer `NodeId`/`EdgeId` handles resolved through a side table owned by
//! the container (`cicada-graph::Hypergraph`); ownership flows outward from
//! the container, never through the handles themselves.

use serde::{Deserialize, Serialize};

/// Sentinel raw value for an unset/invalid node or edge id.
pub const INVALID_RAW: u32 = u32::MAX;

/// Identifier for a node within a hypergraph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(u32);

impl NodeId {
    /// The distinguished invalid node id (used for `Hypergraph::goal` absence).
    pub const INVALID: NodeId = NodeId(INVALID_RAW);

    /// Creates a node id from its raw index.
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw index backing this id.
    pub fn as_raw(self) -> u32 {
        self.0
    }

    /// Returns the index as `usize`, for array indexing.
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// `true` if this is the distinguished invalid id.
    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }
}

/// Identifier for a hyperedge within a hypergraph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EdgeId(u32);

impl EdgeId {
    /// The distinguished invalid edge id.
    pub const INVALID: EdgeId = EdgeId(INVALID_RAW);

    /// Creates an edge id from its raw index.
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw index backing this id.
    pub fn as_raw(self) -> u32 {
        self.0
    }

    /// Returns the index as `usize`, for array indexing.
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// `true` if this is the distinguished invalid id.
    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }
}

/// Identifier for a transducer state (spec §4.2/§6, `Transducer::next`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StateId(u32);

impl StateId {
    /// The distinguished root/invalid transducer state.
    pub const ROOT: StateId = StateId(0);

    /// Creates a state id from its raw index.
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw index backing this id.
    pub fn as_raw(self) -> u32 {
        self.0
    }

    /// Returns the index as `usize`, for array indexing.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}
