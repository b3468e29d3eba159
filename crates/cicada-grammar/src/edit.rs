//! Insertion and deletion grammars: per-decoding rule sets built from the
//! input lattice's terminal vocabulary, one rule per distinct terminal.
//! Grounded on `grammar_hiero.hpp`'s `GrammarInsertion`/`GrammarDeletion`.

use std::collections::HashSet;

use cicada_core::{StateId, Symbol};
use cicada_graph::{Lattice, Rule};
use cicada_vector::{AttributeId, AttributeValue, AttributeVector, FeatureId, FeatureVector};

use crate::transducer::{RulePair, Transducer};
use crate::trie::TrieGrammar;

fn distinct_terminals(lattice: &Lattice) -> Vec<Symbol> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for pos in 0..lattice.len() {
        for arc in lattice.arcs_at(pos) {
            if !arc.label.is_epsilon() && seen.insert(arc.label) {
                out.push(arc.label);
            }
        }
    }
    out
}

/// Inserts a rule `non_terminal -> label` for every distinct terminal seen
/// in the most recently assigned lattice, tagged with an `insertion-penalty`
/// feature and an `insertion` attribute. Rebuilt fresh on every `assign`.
#[derive(Debug, Clone)]
pub struct InsertionGrammar {
    non_terminal: Symbol,
    inner: TrieGrammar,
}

impl InsertionGrammar {
    /// Creates an insertion grammar with no rules until [`Transducer::assign`]
    /// is called with a lattice.
    pub fn new(non_terminal: Symbol) -> Self {
        Self {
            non_terminal,
            inner: TrieGrammar::new(),
        }
    }
}

impl Transducer for InsertionGrammar {
    fn root(&self) -> StateId {
        self.inner.root()
    }

    fn next(&self, state: StateId, symbol: Symbol) -> StateId {
        self.inner.next(state, symbol)
    }

    fn rules(&self, state: StateId) -> &[RulePair] {
        self.inner.rules(state)
    }

    fn valid_span(&self, first: usize, last: usize, distance: usize) -> bool {
        distance <= 1 || last - first == 1
    }

    fn has_next(&self, state: StateId) -> bool {
        self.inner.has_next(state)
    }

    fn assign(&mut self, input: &Lattice) {
        self.inner = TrieGrammar::new();
        let mut features = FeatureVector::new();
        features.set(FeatureId::intern("insertion-penalty"), -1.0);
        let mut attributes = AttributeVector::new();
        attributes.set(AttributeId::intern("insertion"), AttributeValue::Int(1));

        for label in distinct_terminals(input) {
            let rule = Rule::monolingual(self.non_terminal, vec![label], features.clone(), attributes.clone())
                .expect("single-terminal rule is well-formed");
            self.inner.insert(rule);
        }
    }
}

/// Like [`InsertionGrammar`], but the target side is the distinguished
/// epsilon symbol: a translation that consumes a source terminal and
/// produces nothing, tagged with a `deletion-penalty` feature.
#[derive(Debug, Clone)]
pub struct DeletionGrammar {
    non_terminal: Symbol,
    inner: TrieGrammar,
}

impl DeletionGrammar {
    /// Creates a deletion grammar with no rules until [`Transducer::assign`]
    /// is called with a lattice.
    pub fn new(non_terminal: Symbol) -> Self {
        Self {
            non_terminal,
            inner: TrieGrammar::new(),
        }
    }
}

impl Transducer for DeletionGrammar {
    fn root(&self) -> StateId {
        self.inner.root()
    }

    fn next(&self, state: StateId, symbol: Symbol) -> StateId {
        self.inner.next(state, symbol)
    }

    fn rules(&self, state: StateId) -> &[RulePair] {
        self.inner.rules(state)
    }

    fn valid_span(&self, first: usize, last: usize, distance: usize) -> bool {
        distance <= 1 || last - first == 1
    }

    fn has_next(&self, state: StateId) -> bool {
        self.inner.has_next(state)
    }

    fn assign(&mut self, input: &Lattice) {
        self.inner = TrieGrammar::new();
        let mut features = FeatureVector::new();
        features.set(FeatureId::intern("deletion-penalty"), -1.0);
        let mut attributes = AttributeVector::new();
        attributes.set(AttributeId::intern("deletion"), AttributeValue::Int(1));

        for label in distinct_terminals(input) {
            let rule = Rule::new(
                self.non_terminal,
                vec![label],
                vec![Symbol::epsilon()],
                features.clone(),
                attributes.clone(),
            )
            .expect("single-terminal deletion rule is well-formed");
            self.inner.insert(rule);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cicada_core::Vocab;

    #[test]
    fn insertion_grammar_covers_each_distinct_terminal_once() {
        Vocab::reset();
        let lattice = Lattice::linear(&["a", "b", "a"]);
        let mut grammar = InsertionGrammar::new(Symbol::intern("[X]"));
        grammar.assign(&lattice);

        let after_a = grammar.next(grammar.root(), Symbol::intern("a"));
        assert_eq!(grammar.rules(after_a).len(), 1);
        let after_b = grammar.next(grammar.root(), Symbol::intern("b"));
        assert_eq!(grammar.rules(after_b).len(), 1);
    }

    #[test]
    fn deletion_grammar_targets_epsilon() {
        Vocab::reset();
        let lattice = Lattice::linear(&["a"]);
        let mut grammar = DeletionGrammar::new(Symbol::intern("[X]"));
        grammar.assign(&lattice);

        let after_a = grammar.next(grammar.root(), Symbol::intern("a"));
        let rules = grammar.rules(after_a);
        assert_eq!(rules.len(), 1);
        assert!(rules[0].target[0].is_epsilon());
    }
}
