#![deny(missing_docs)]
//! The Transducer grammar interface (spec §3/§6 component C5) and a small
//! set of reference grammars built on a mutable trie.

mod edit;
mod glue;
mod transducer;
mod trie;

pub use edit::{DeletionGrammar, InsertionGrammar};
pub use glue::GlueGrammar;
pub use transducer::{RulePair, Transducer};
pub use trie::TrieGrammar;
