#![deny(missing_docs)]
//! Chart-based hypergraph composition (spec §4.2, component C7):
//! `compose_cky`/`compose_earley` (the shared [`chart`] engine),
//! `compose_phrase` (distortion-limited spans), `compose_tree` (bracketed
//! tree-fragment matching), and `compose_dependency_arc_standard`
//! (shift-reduce dependency parsing).

mod chart;
mod cky;
mod dependency;
mod earley;
mod phrase;
mod tree;

pub use chart::{compose_chart, compose_chart_filtered, ComposeFlags, SpanMap};
pub use cky::compose_cky;
pub use dependency::{compose_dependency_arc_standard, DependencyAction};
pub use earley::compose_earley;
pub use phrase::compose_phrase;
pub use tree::{compose_tree, parse_tree_text, render_tree_text, TreeFragment, TreeNode};
