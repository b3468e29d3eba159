#![deny(missing_docs)]
//! Coarse-to-fine parsing over an ordered sequence of grammars (spec §4.4,
//! component C9): each pass prunes the spans the previous, coarser pass
//! scored poorly, down to a full hypergraph-producing parse under the
//! finest grammar.

mod closure;
mod parse;
mod pass;
mod project;

pub use parse::parse_coarse;
pub use pass::PassResult;
