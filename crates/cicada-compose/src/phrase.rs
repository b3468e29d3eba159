//! `compose_phrase`: the chart engine with `flags.distortion` enforced, so
//! only contiguous source spans up to that width are ever built (spec §4.2).

use cicada_core::{CicadaError, Symbol};
use cicada_graph::{Hypergraph, Lattice};
use cicada_grammar::Transducer;

use crate::chart::{compose_chart, ComposeFlags};

/// Composes a hypergraph from `lattice` under `grammars`, restricted to
/// spans no wider than `flags.distortion` (when set).
pub fn compose_phrase(
    goal: Symbol,
    grammars: &[&dyn Transducer],
    lattice: &Lattice,
    flags: &ComposeFlags,
) -> Result<Hypergraph, CicadaError> {
    compose_chart(goal, grammars, lattice, flags)
}
