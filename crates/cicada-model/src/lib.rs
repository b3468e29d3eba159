#![deny(missing_docs)]
//! The non-local feature function (`Model`) interface (spec §3/§4.3/§6
//! component C6) and the `Stemmer`/`Cluster` auxiliary components (§4.6).

mod cluster;
mod model;
mod stemmer;

pub use cluster::{cluster_table, ClusterTable};
pub use model::{validate_state_size, BigramModel, Model};
pub use stemmer::{stem_memoized, NfkcStemmer, Stemmer, UpperStemmer};
