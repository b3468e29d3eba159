#![deny(missing_docs)]
//! Core identifiers, symbol interning, error types and semiring contracts
//! shared across the cicada forest decoding core.

pub mod errors;
pub mod ids;
pub mod rng;
pub mod semiring;
pub mod vocab;
mod symbol;

pub use errors::{CicadaError, ErrorInfo};
pub use ids::{EdgeId, NodeId, StateId, INVALID_RAW};
pub use rng::{derive_substream_seed, RngHandle};
pub use semiring::{LogExpectation, Probability, Semiring, Tropical};
pub use symbol::Symbol;
pub use vocab::Vocab;
