//! A mutable Hiero-style trie grammar: rules are inserted by walking their
//! source-side symbol sequence, branching the trie as needed, grounded on
//! `grammar_hiero.hpp`'s `GrammarMutable`-derived grammars (which all insert
//! rules one at a time into a shared mutable rule set keyed by symbol
//! sequence).

use std::collections::HashMap;

use cicada_core::{StateId, Symbol};
use cicada_graph::Rule;

use crate::transducer::{RulePair, Transducer};

/// A growable trie over source-side symbol sequences. Each state holds the
/// rules whose source RHS is exactly the sequence of symbols leading to it.
#[derive(Debug, Clone, Default)]
pub struct TrieGrammar {
    transitions: Vec<HashMap<Symbol, StateId>>,
    rules: Vec<Vec<RulePair>>,
}

impl TrieGrammar {
    /// Creates an empty grammar with only the root state.
    pub fn new() -> Self {
        Self {
            transitions: vec![HashMap::new()],
            rules: vec![Vec::new()],
        }
    }

    /// Inserts `rule`, walking/extending the trie by `rule.source`. Trie
    /// transitions key on each symbol's index-stripped form: the composer
    /// advances a transducer state with a completed lhs like `[X]`, never
    /// with the rule-local index suffix `[X,2]` that only matters for
    /// source/target alignment within the stored rule itself.
    pub fn insert(&mut self, rule: Rule) {
        let mut state = StateId::ROOT;
        for &symbol in &rule.source {
            state = self.advance_or_create(state, symbol.non_terminal());
        }
        self.rules[state.index()].push(rule);
    }

    fn advance_or_create(&mut self, state: StateId, symbol: Symbol) -> StateId {
        if let Some(&next) = self.transitions[state.index()].get(&symbol) {
            return next;
        }
        let new_state = StateId::from_raw(self.transitions.len() as u32);
        self.transitions.push(HashMap::new());
        self.rules.push(Vec::new());
        self.transitions[state.index()].insert(symbol, new_state);
        new_state
    }

    /// Number of trie states, including the root.
    pub fn state_count(&self) -> usize {
        self.transitions.len()
    }
}

impl Transducer for TrieGrammar {
    fn root(&self) -> StateId {
        StateId::ROOT
    }

    fn next(&self, state: StateId, symbol: Symbol) -> StateId {
        self.transitions
            .get(state.index())
            .and_then(|edges| edges.get(&symbol))
            .copied()
            .unwrap_or_else(|| self.root())
    }

    fn rules(&self, state: StateId) -> &[RulePair] {
        self.rules.get(state.index()).map(Vec::as_slice).unwrap_or(&[])
    }

    fn has_next(&self, state: StateId) -> bool {
        self.transitions
            .get(state.index())
            .map(|edges| !edges.is_empty())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cicada_core::Vocab;
    use cicada_vector::{AttributeVector, FeatureVector};

    fn rule(lhs: &str, source: Vec<&str>) -> Rule {
        Rule::monolingual(
            Symbol::intern(lhs),
            source.into_iter().map(Symbol::intern).collect(),
            FeatureVector::new(),
            AttributeVector::new(),
        )
        .unwrap()
    }

    #[test]
    fn shared_prefixes_share_trie_states() {
        Vocab::reset();
        let mut grammar = TrieGrammar::new();
        grammar.insert(rule("[X]", vec!["a", "b"]));
        grammar.insert(rule("[Y]", vec!["a", "c"]));

        let after_a = grammar.next(grammar.root(), Symbol::intern("a"));
        assert_ne!(after_a, grammar.root());
        assert!(grammar.rules(after_a).is_empty());

        let after_ab = grammar.next(after_a, Symbol::intern("b"));
        assert_eq!(grammar.rules(after_ab).len(), 1);
        assert_eq!(grammar.rules(after_ab)[0].lhs.to_string(), "[X]");

        let after_ac = grammar.next(after_a, Symbol::intern("c"));
        assert_eq!(grammar.rules(after_ac).len(), 1);
        assert_eq!(grammar.rules(after_ac)[0].lhs.to_string(), "[Y]");
    }

    #[test]
    fn unmatched_symbol_routes_back_to_root() {
        Vocab::reset();
        let mut grammar = TrieGrammar::new();
        grammar.insert(rule("[X]", vec!["a"]));
        let miss = grammar.next(grammar.root(), Symbol::intern("z"));
        assert_eq!(miss, grammar.root());
    }
}
