#![deny(missing_docs)]
//! Lazy k-best derivation enumeration and Monte-Carlo sampling over a
//! hypergraph (spec §4.5, component C10): both share the iterator contract
//! `next() -> Option<(weight, yield)>` and the same user-supplied
//! [`Traversal`] callback for building a yield bottom-up.

mod kbest;
mod sampler;
mod traversal;

pub use kbest::{k_best, k_best_iter, KBest};
pub use sampler::{sample_iter, Sampler};
pub use traversal::{SurfaceYield, Traversal};
