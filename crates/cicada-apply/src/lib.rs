#![deny(missing_docs)]
//! Non-local feature application over hypergraphs (spec §4.3, component C6
//! consumer): rescoring a composed forest against a [`cicada_model::Model`]
//! and a [`cicada_vector::FeatureFunction`], in four variants trading
//! exactness for bounded work — [`apply_exact`], [`apply_cube_prune`],
//! [`apply_cube_grow`], and [`apply_incremental`].

mod candidate;
mod cube_grow;
mod cube_prune;
mod exact;
mod incremental;

pub use cube_grow::apply_cube_grow;
pub use cube_prune::apply_cube_prune;
pub use exact::apply_exact;
pub use incremental::apply_incremental;
