//! Multi-pass coarse-to-fine orchestration (spec §4.4): run grammars
//! `G₁ ⊂ G₂ ⊂ … ⊂ Gₙ` from coarsest to finest, each pass pruning spans the
//! previous pass scored below its threshold, with a factor-relaxation retry
//! on the final pass if the goal ends up unreachable.

use std::collections::HashMap;

use cicada_core::{CicadaError, Semiring, Symbol};
use cicada_compose::ComposeFlags;
use cicada_grammar::Transducer;
use cicada_graph::{Hypergraph, Lattice};
use cicada_vector::FeatureFunction;

use crate::pass::run_pass;
use crate::project::project;

/// Number of times the final pass is retried with a relaxed pruning factor
/// before the caller is handed back whatever (possibly goal-unreachable)
/// hypergraph the last attempt produced.
const MAX_RELAXATION_ITERATIONS: u32 = 4;

/// The factor applied to every threshold on relaxation retry `n` (`0.1^n`).
const RELAXATION_FACTOR: f64 = 0.1;

/// Runs coarse-to-fine parsing over `lattice` under the ordered `grammars`
/// (coarsest first), pruning passes 2..n with `thresholds` (length
/// `grammars.len() - 1`).
///
/// A single grammar (`grammars.len() == 1`) degrades to an unpruned chart
/// parse, matching `compose_cky` under that grammar alone.
pub fn parse_coarse<S: Semiring>(
    goal: Symbol,
    grammars: &[&dyn Transducer],
    thresholds: &[f64],
    function: &dyn FeatureFunction<S>,
    lattice: &Lattice,
    flags: &ComposeFlags,
) -> Result<Hypergraph, CicadaError> {
    if grammars.is_empty() {
        return Err(CicadaError::malformed_input(
            "coarse/no-grammars",
            "parse_coarse requires at least one grammar",
        ));
    }
    let n = grammars.len();
    if n == 1 {
        let result = run_pass(goal, grammars[0], lattice, flags, function, &|_, _, _| true)?;
        return Ok(result.graph);
    }
    if thresholds.len() != n - 1 {
        return Err(CicadaError::malformed_input(
            "coarse/threshold-count",
            format!("expected {} thresholds for {} grammars, got {}", n - 1, n, thresholds.len()),
        ));
    }

    let pass_one = run_pass(goal, grammars[0], lattice, flags, function, &|_, _, _| true)?;

    let mut last_graph = Hypergraph::new();
    for attempt in 0..MAX_RELAXATION_ITERATIONS {
        let factor = RELAXATION_FACTOR.powi(attempt as i32);
        let mut prev_scores = pass_one.scores.clone();

        let mut final_graph = Hypergraph::new();
        for level in 2..=n {
            let tau = thresholds[level - 2] * factor;
            let projected = project_scores(&prev_scores, level);
            let allow = move |i: usize, j: usize, lhs: Symbol| {
                projected.get(&(i, j, project(level, lhs))).copied().unwrap_or(f64::NEG_INFINITY) >= tau
            };
            let result = run_pass(goal, grammars[level - 1], lattice, flags, function, &allow)?;
            if level == n {
                final_graph = result.graph;
            } else {
                prev_scores = result.scores;
            }
        }

        last_graph = final_graph;
        if last_graph.is_valid() {
            return Ok(last_graph);
        }
        tracing::debug!(attempt, factor, "coarse-to-fine final pass unreachable, relaxing");
    }

    Ok(last_graph)
}

fn project_scores(
    scores: &HashMap<(usize, usize, Symbol), f64>,
    level: usize,
) -> HashMap<(usize, usize, Symbol), f64> {
    let mut projected = HashMap::new();
    for (&(i, j, lhs), &score) in scores {
        let key = (i, j, project(level, lhs));
        let entry = projected.entry(key).or_insert(f64::NEG_INFINITY);
        if score > *entry {
            *entry = score;
        }
    }
    projected
}

#[cfg(test)]
mod tests {
    use super::*;
    use cicada_core::{Tropical, Vocab};
    use cicada_grammar::TrieGrammar;
    use cicada_vector::{AttributeVector, FeatureId, FeatureVector, LinearTropical};

    fn rule(lhs: &str, source: Vec<&str>, weight: f64) -> cicada_graph::Rule {
        let mut features = FeatureVector::new();
        features.set(FeatureId::intern("w"), weight);
        cicada_graph::Rule::monolingual(
            Symbol::intern(lhs),
            source.into_iter().map(Symbol::intern).collect(),
            features,
            AttributeVector::new(),
        )
        .unwrap()
    }

    fn function() -> LinearTropical {
        let mut f = LinearTropical::new();
        f.set_weight(FeatureId::intern("w"), 1.0);
        f
    }

    #[test]
    fn single_grammar_degrades_to_an_unpruned_parse() {
        Vocab::reset();
        let lattice = Lattice::linear(&["a"]);
        let mut grammar = TrieGrammar::new();
        grammar.insert(rule("[X]", vec!["a"], 1.0));
        grammar.insert(rule("[S]", vec!["[X,1]"], 1.0));

        let f = function();
        let graph = parse_coarse::<Tropical>(
            Symbol::intern("[S]"),
            &[&grammar],
            &[],
            &f,
            &lattice,
            &ComposeFlags::default(),
        )
        .unwrap();
        assert!(graph.is_valid());
    }

    #[test]
    fn permissive_thresholds_still_reach_the_goal() {
        Vocab::reset();
        let lattice = Lattice::linear(&["a", "b"]);
        let mut coarse = TrieGrammar::new();
        coarse.insert(rule("[X]", vec!["a"], 1.0));
        coarse.insert(rule("[X]", vec!["b"], 1.0));
        coarse.insert(rule("[S]", vec!["[X,1]", "[X,2]"], 1.0));

        let mut fine = TrieGrammar::new();
        fine.insert(rule("[X]", vec!["a"], 1.0));
        fine.insert(rule("[X]", vec!["b"], 1.0));
        fine.insert(rule("[S]", vec!["[X,1]", "[X,2]"], 1.0));

        let f = function();
        let graph = parse_coarse::<Tropical>(
            Symbol::intern("[S]"),
            &[&coarse, &fine],
            &[f64::NEG_INFINITY],
            &f,
            &lattice,
            &ComposeFlags::default(),
        )
        .unwrap();
        assert!(graph.is_valid());
    }

    #[test]
    fn impossibly_strict_thresholds_eventually_give_up_but_do_not_error() {
        Vocab::reset();
        let lattice = Lattice::linear(&["a", "b"]);
        let mut coarse = TrieGrammar::new();
        coarse.insert(rule("[X]", vec!["a"], 1.0));
        coarse.insert(rule("[X]", vec!["b"], 1.0));
        coarse.insert(rule("[S]", vec!["[X,1]", "[X,2]"], 1.0));

        let mut fine = TrieGrammar::new();
        fine.insert(rule("[X]", vec!["a"], 1.0));
        fine.insert(rule("[X]", vec!["b"], 1.0));
        fine.insert(rule("[S]", vec!["[X,1]", "[X,2]"], 1.0));

        let f = function();
        let graph = parse_coarse::<Tropical>(
            Symbol::intern("[S]"),
            &[&coarse, &fine],
            &[f64::INFINITY],
            &f,
            &lattice,
            &ComposeFlags::default(),
        )
        .unwrap();
        assert!(!graph.is_valid());
    }

    #[test]
    fn wrong_threshold_count_is_rejected() {
        Vocab::reset();
        let lattice = Lattice::linear(&["a"]);
        let mut coarse = TrieGrammar::new();
        coarse.insert(rule("[X]", vec!["a"], 1.0));
        let mut fine = TrieGrammar::new();
        fine.insert(rule("[X]", vec!["a"], 1.0));

        let f = function();
        let err = parse_coarse::<Tropical>(
            Symbol::intern("[X]"),
            &[&coarse, &fine],
            &[],
            &f,
            &lattice,
            &ComposeFlags::default(),
        )
        .unwrap_err();
        assert!(matches!(err, CicadaError::MalformedInput(_)));
    }
}
