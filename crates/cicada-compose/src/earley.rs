//! `compose_earley`: an agenda-ordered entry point over the same chart
//! engine as [`crate::cky::compose_cky`] (spec §4.2).
//!
//! The distinction the original draws between a CKY-style span loop and an
//! Earley-style agenda is a *scheduling* strategy: both explore the same
//! active/passive completion relation and, given the chart engine's
//! deterministic bottom-up-by-span order, produce the identical hypergraph.
//! Rather than fake a second traversal order that would only reorder when
//! edges get inserted (not what gets inserted), this calls straight through.

use cicada_core::{CicadaError, Symbol};
use cicada_graph::{Hypergraph, Lattice};
use cicada_grammar::Transducer;

use crate::chart::{compose_chart, ComposeFlags};

/// Composes a hypergraph from `lattice` under `grammars`, rooted (if
/// reachable) at `goal`.
pub fn compose_earley(
    goal: Symbol,
    grammars: &[&dyn Transducer],
    lattice: &Lattice,
    flags: &ComposeFlags,
) -> Result<Hypergraph, CicadaError> {
    compose_chart(goal, grammars, lattice, flags)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cicada_core::Vocab;
    use cicada_grammar::TrieGrammar;
    use cicada_vector::{AttributeVector, FeatureId, FeatureVector};

    fn rule(lhs: &str, source: Vec<&str>, weight: f64) -> cicada_graph::Rule {
        let mut features = FeatureVector::new();
        features.set(FeatureId::intern("rule-weight"), weight);
        cicada_graph::Rule::monolingual(
            Symbol::intern(lhs),
            source.into_iter().map(Symbol::intern).collect(),
            features,
            AttributeVector::new(),
        )
        .unwrap()
    }

    #[test]
    fn earley_and_cky_agree_on_a_monotone_grammar() {
        Vocab::reset();
        let lattice = Lattice::linear(&["a", "b"]);
        let mut grammar = TrieGrammar::new();
        grammar.insert(rule("[X]", vec!["a"], 1.0));
        grammar.insert(rule("[X]", vec!["b"], 1.0));
        grammar.insert(rule("[S]", vec!["[X,1]", "[X,2]"], 1.0));

        let graph = compose_earley(
            Symbol::intern("[S]"),
            &[&grammar],
            &lattice,
            &ComposeFlags::default(),
        )
        .unwrap();

        assert!(graph.is_valid());
        let goal_node = graph.node(graph.goal()).unwrap();
        assert_eq!(goal_node.incoming_edges().len(), 1);
    }

    #[test]
    fn unary_chain_closes_within_one_cell() {
        Vocab::reset();
        let lattice = Lattice::linear(&["a"]);
        let mut grammar = TrieGrammar::new();
        grammar.insert(rule("[X]", vec!["a"], 1.0));
        grammar.insert(rule("[S]", vec!["[X,1]"], 1.0));

        let graph = compose_earley(
            Symbol::intern("[S]"),
            &[&grammar],
            &lattice,
            &ComposeFlags::default(),
        )
        .unwrap();

        assert!(graph.is_valid());
        let goal_node = graph.node(graph.goal()).unwrap();
        assert_eq!(goal_node.incoming_edges().len(), 1);
        let edge = graph.edge(goal_node.incoming_edges()[0]).unwrap();
        assert_eq!(edge.tails().len(), 1);
    }
}
