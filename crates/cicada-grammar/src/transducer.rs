//! The grammar-as-state-machine interface consumed by composers (spec §3/§6
//! component C5). Grammar storage itself (on-disk indexed rule tables,
//! stemmer dictionaries) is out of scope; this crate only defines the
//! contract and a small set of reference implementations useful for
//! composing and testing.

use cicada_core::{StateId, Symbol};
use cicada_graph::{Lattice, Rule};

/// One grammar entry reachable at a trie state: a fully formed synchronous
/// (or monolingual) rule. Named `RulePair` after the spec's interface,
/// since a [`Rule`] already carries both the source and target sides.
pub type RulePair = Rule;

/// A grammar viewed as a trie-like state machine over source-side symbols.
///
/// `next` never fails: an unmatched symbol routes back to [`Transducer::root`],
/// mirroring the composer's "extend actives" step, which treats a `next`
/// result equal to `root()` as "this partial match dies here".
pub trait Transducer: Send + Sync {
    /// The initial (empty-prefix) state.
    fn root(&self) -> StateId;

    /// Advances `state` by consuming `symbol`; returns `root()` on no match.
    fn next(&self, state: StateId, symbol: Symbol) -> StateId;

    /// Rules completed at `state` (i.e. whose source RHS matches the prefix
    /// that reached `state`). Empty for states with no completed rule.
    fn rules(&self, state: StateId) -> &[RulePair];

    /// Whether span `[first, last)` is a legal match for this grammar, given
    /// the lattice's shortest distance between the two positions. Default
    /// grammars accept every span; glue/insertion/deletion grammars narrow
    /// this.
    fn valid_span(&self, first: usize, last: usize, distance: usize) -> bool {
        let _ = (first, last, distance);
        true
    }

    /// `true` if `state` has at least one outgoing transition.
    fn has_next(&self, state: StateId) -> bool;

    /// Hook called once per decoding with the input lattice, for grammars
    /// that build their rule set from the input (e.g. insertion/deletion).
    /// Static grammars (e.g. [`crate::trie::TrieGrammar`]) ignore this.
    fn assign(&mut self, input: &Lattice) {
        let _ = input;
    }
}
