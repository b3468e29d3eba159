//! The glue grammar: reorders top-level spans by gluing a goal symbol onto
//! translated constituents, straight or inverted. Grounded on
//! `grammar_hiero.hpp`'s `GrammarGlue`.

use cicada_core::{StateId, Symbol};
use cicada_graph::Rule;
use cicada_vector::{AttributeVector, FeatureId, FeatureVector};

use crate::transducer::{RulePair, Transducer};
use crate::trie::TrieGrammar;

/// Glue rules over a `goal` symbol and a generic `non_terminal` placeholder:
/// a unary pass-through, plus a monotone ("straight") and/or reordering
/// ("inverted") binary combination. Only the leftmost span is a legal glue
/// site (`valid_span` requires `first == 0`) unless both straight and
/// inverted reordering are enabled, mirroring the original's "straight &&
/// inverted => accept any span" shortcut.
#[derive(Debug, Clone)]
pub struct GlueGrammar {
    inner: TrieGrammar,
    straight: bool,
    inverted: bool,
}

impl GlueGrammar {
    /// Builds the glue grammar for `goal`/`non_terminal`, wiring in the
    /// straight and/or inverted reordering rules as requested.
    pub fn new(goal: Symbol, non_terminal: Symbol, straight: bool, inverted: bool) -> Self {
        let mut inner = TrieGrammar::new();

        inner.insert(
            Rule::monolingual(
                goal,
                vec![non_terminal.with_index(Some(1))],
                FeatureVector::new(),
                AttributeVector::new(),
            )
            .expect("unary glue rule is well-formed"),
        );

        if straight {
            let mut features = FeatureVector::new();
            features.set(FeatureId::intern("glue-straight-penalty"), -1.0);
            inner.insert(
                Rule::monolingual(
                    goal,
                    vec![goal.with_index(Some(1)), non_terminal.with_index(Some(2))],
                    features,
                    AttributeVector::new(),
                )
                .expect("straight glue rule is well-formed"),
            );
        }

        if inverted {
            let mut features = FeatureVector::new();
            features.set(FeatureId::intern("glue-inverted-penalty"), -1.0);
            let source = vec![goal.with_index(Some(1)), non_terminal.with_index(Some(2))];
            let target = vec![non_terminal.with_index(Some(2)), goal.with_index(Some(1))];
            inner.insert(
                Rule::new(goal, source, target, features, AttributeVector::new())
                    .expect("inverted glue rule is well-formed"),
            );
        }

        Self { inner, straight, inverted }
    }
}

impl Transducer for GlueGrammar {
    fn root(&self) -> StateId {
        self.inner.root()
    }

    fn next(&self, state: StateId, symbol: Symbol) -> StateId {
        self.inner.next(state, symbol)
    }

    fn rules(&self, state: StateId) -> &[RulePair] {
        self.inner.rules(state)
    }

    fn valid_span(&self, first: usize, _last: usize, _distance: usize) -> bool {
        (self.straight && self.inverted) || first == 0
    }

    fn has_next(&self, state: StateId) -> bool {
        self.inner.has_next(state)
    }
}
