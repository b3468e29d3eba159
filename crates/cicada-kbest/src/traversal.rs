//! The user-supplied bottom-up yield builder both k-best and the sampler
//! drive (spec §4.5: "build yields bottom-up through a user traversal
//! callback whose signature is `(edge, &out_yield, antecedent_yields_begin,
//! end)`").

use cicada_graph::Edge;

/// Builds a `T` for one hyperedge from the already-built `T`s of its tails.
///
/// A leaf edge (arity 0) is called with an empty `antecedents` slice.
pub trait Traversal<T> {
    /// Combines `edge` with its tails' already-built yields into this
    /// edge's own yield.
    fn combine(&self, edge: &Edge, antecedents: &[&T]) -> T;
}

/// A [`Traversal`] that renders space-joined terminal yields, ignoring
/// non-terminal RHS symbols (a minimal stand-in for the original's sentence
/// output; real traversals — tree rendering, alignment, n-best strings —
/// are supplied by the caller).
#[derive(Debug, Default, Clone, Copy)]
pub struct SurfaceYield;

impl Traversal<String> for SurfaceYield {
    fn combine(&self, edge: &Edge, antecedents: &[&String]) -> String {
        let mut words = Vec::new();
        let mut next_antecedent = antecedents.iter();
        for &symbol in &edge.rule.source {
            if symbol.is_non_terminal() {
                if let Some(child) = next_antecedent.next() {
                    if !child.is_empty() {
                        words.push((*child).clone());
                    }
                }
            } else if !symbol.is_epsilon() {
                words.push(symbol.text().to_string());
            }
        }
        words.join(" ")
    }
}
