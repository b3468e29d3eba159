//! Binary and JSON encodings of a whole [`Hypergraph`] (spec §6), following
//! `asm-graph::serialization`'s split between a compact `bincode` form for
//! storage/transport and a `serde_json` form for inspection. Unlike the
//! teacher, `Hypergraph` already derives `Serialize`/`Deserialize` directly,
//! so no intermediate `Serializable*` shadow struct is needed here.

use cicada_core::errors::ErrorInfo;
use cicada_core::CicadaError;

use crate::hypergraph::Hypergraph;

/// Serializes `graph` to its compact binary representation.
pub fn graph_to_bytes(graph: &Hypergraph) -> Result<Vec<u8>, CicadaError> {
    bincode::serialize(graph).map_err(|err| {
        CicadaError::MalformedGraph(ErrorInfo::new("graph-serialize-bytes", err.to_string()))
    })
}

/// Restores a [`Hypergraph`] from its binary representation.
pub fn graph_from_bytes(bytes: &[u8]) -> Result<Hypergraph, CicadaError> {
    bincode::deserialize(bytes).map_err(|err| {
        CicadaError::MalformedGraph(ErrorInfo::new("graph-deserialize-bytes", err.to_string()))
    })
}

/// Serializes `graph` to a JSON string.
pub fn graph_to_json(graph: &Hypergraph) -> Result<String, CicadaError> {
    serde_json::to_string_pretty(graph).map_err(|err| {
        CicadaError::MalformedGraph(ErrorInfo::new("graph-serialize-json", err.to_string()))
    })
}

/// Restores a [`Hypergraph`] from a JSON string.
pub fn graph_from_json(json: &str) -> Result<Hypergraph, CicadaError> {
    serde_json::from_str(json).map_err(|err| {
        CicadaError::MalformedGraph(ErrorInfo::new("graph-deserialize-json", err.to_string()))
    })
}
