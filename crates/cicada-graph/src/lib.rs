#![deny(missing_docs)]
//! The hypergraph/forest data model, synchronous rules, input lattices, and
//! the structural transforms over them (spec §3 components C2/C3).

mod hypergraph;
pub mod lattice;
pub mod rule;
mod score;
pub mod serialization;
pub mod transform;

pub use hypergraph::{Edge, Hypergraph, Node};
pub use lattice::{Arc, Lattice};
pub use rule::{parse_rule_text, Rule};
pub use score::{inside_outside, InsideOutside};
pub use serialization::{graph_from_bytes, graph_from_json, graph_to_bytes, graph_to_json};
pub use transform::{debinarize, remove_epsilon, remove_non_terminal, topologically_sort};
