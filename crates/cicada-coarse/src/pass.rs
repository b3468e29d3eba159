//! Runs a single coarse-to-fine pass (spec §4.4): compose under one grammar
//! with a caller-supplied pruning gate, then score every completed
//! `(span, lhs)` cell by its inside/outside product normalized against the
//! goal's inside score.

use std::collections::HashMap;

use cicada_core::{CicadaError, NodeId, Semiring, Symbol};
use cicada_compose::{compose_chart_filtered, ComposeFlags, SpanMap};
use cicada_grammar::Transducer;
use cicada_graph::{inside_outside, Hypergraph, Lattice};
use cicada_vector::FeatureFunction;

use crate::closure::UnaryClosure;

/// The hypergraph, span map and per-cell scores produced by one pass.
pub struct PassResult {
    /// The hypergraph this pass built (may be empty/invalid if `goal` was
    /// unreachable under this pass's grammar and gate).
    pub graph: Hypergraph,
    /// The `(span, lhs) -> node` correspondence backing `graph`.
    pub spans: SpanMap,
    /// Per-`(first, last, lhs)` pruning score, already propagated to every
    /// label reachable through a unary-rule chain (spec's "max-score
    /// paths").
    pub scores: HashMap<(usize, usize, Symbol), f64>,
}

/// Runs one pass of `grammar` over `lattice`, gating every completion
/// through `allow`, and scores the result with `function`.
pub fn run_pass<S: Semiring>(
    goal: Symbol,
    grammar: &dyn Transducer,
    lattice: &Lattice,
    flags: &ComposeFlags,
    function: &dyn FeatureFunction<S>,
    allow: &dyn Fn(usize, usize, Symbol) -> bool,
) -> Result<PassResult, CicadaError> {
    let (graph, spans) = compose_chart_filtered(goal, &[grammar], lattice, flags, allow)?;
    let len = lattice.len();

    let mut scores = HashMap::new();
    if graph.is_valid() {
        let io = inside_outside(&graph, function);
        let goal_inside = io.inside[graph.goal().index()].value();

        for i in 0..=len {
            for j in i..=len {
                for (lhs, node) in spans.entries(i, j) {
                    let raw = cell_score(&io, node);
                    scores.insert((i, j, lhs), raw - goal_inside);
                }
            }
        }

        let closure = UnaryClosure::build(&graph, &spans, len);
        let mut propagated = Vec::new();
        for (&(i, j, lhs), &score) in &scores {
            for &parent in closure.parents_of(lhs) {
                propagated.push(((i, j, parent), score));
            }
        }
        for (key, score) in propagated {
            let entry = scores.entry(key).or_insert(f64::NEG_INFINITY);
            if score > *entry {
                *entry = score;
            }
        }
    }

    Ok(PassResult { graph, spans, scores })
}

fn cell_score<S: Semiring>(io: &cicada_graph::InsideOutside<S>, node: NodeId) -> f64 {
    io.inside[node.index()].times(io.outside[node.index()]).value()
}
