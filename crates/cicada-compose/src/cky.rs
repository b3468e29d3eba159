//! `compose_cky`: the reference bottom-up chart composer (spec §4.2).

use cicada_core::{CicadaError, Symbol};
use cicada_graph::{Hypergraph, Lattice};
use cicada_grammar::Transducer;

use crate::chart::{compose_chart, ComposeFlags};

/// Composes a hypergraph from `lattice` under `grammars`, rooted (if
/// reachable) at `goal`.
pub fn compose_cky(
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
    fn cky_monotone_composition() {
        Vocab::reset();
        let lattice = Lattice::linear(&["a", "b"]);
        let mut grammar = TrieGrammar::new();
        grammar.insert(rule("[X]", vec!["a"], 1.0));
        grammar.insert(rule("[X]", vec!["b"], 1.0));
        grammar.insert(rule("[S]", vec!["[X,1]", "[X,2]"], 1.0));

        let graph = compose_cky(
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
        assert_eq!(edge.tails().len(), 2);
    }

    #[test]
    fn unreachable_goal_is_invalid() {
        Vocab::reset();
        let lattice = Lattice::linear(&["a"]);
        let grammar = TrieGrammar::new();
        let graph = compose_cky(
            Symbol::intern("[S]"),
            &[&grammar],
            &lattice,
            &ComposeFlags::default(),
        )
        .unwrap();
        assert!(!graph.is_valid());
    }
}
