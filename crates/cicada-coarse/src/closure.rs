//! Unary-rule closure over one pass's materialized hypergraph (spec §4.4):
//! "for each child lhs c, the set of reachable parents with max-score
//! paths; cycles c→…→c are forbidden; closures are cached per child id."
//!
//! A grammar's full rule set isn't enumerable through [`cicada_grammar::Transducer`]
//! alone (only rules reachable from a known trie state are), so this builds
//! the relation from the edges a pass actually produced: a unary edge
//! (arity 1) whose tail is completed over the same span as its head is a
//! unary-rule application, grounded the same way `debinarize` walks
//! same-span unary chains.

use std::collections::{HashMap, HashSet};

use cicada_core::Symbol;
use cicada_compose::SpanMap;
use cicada_graph::Hypergraph;

/// Per-child cache of reachable parent labels, built once per pass.
#[derive(Default)]
pub struct UnaryClosure {
    parents: HashMap<Symbol, Vec<Symbol>>,
}

impl UnaryClosure {
    /// Builds the closure from every same-span unary edge in `graph`, over
    /// every span recorded in `spans`.
    pub fn build(graph: &Hypergraph, spans: &SpanMap, len: usize) -> Self {
        let mut direct: HashMap<Symbol, HashSet<Symbol>> = HashMap::new();

        for i in 0..=len {
            for j in i..=len {
                let entries: Vec<(Symbol, cicada_core::NodeId)> = spans.entries(i, j).collect();
                for &(parent_lhs, parent_node) in &entries {
                    let Ok(node) = graph.node(parent_node) else { continue };
                    for &edge_id in node.incoming_edges() {
                        let Ok(edge) = graph.edge(edge_id) else { continue };
                        if edge.arity() != 1 {
                            continue;
                        }
                        let tail = edge.tails()[0];
                        if let Some(&(child_lhs, _)) =
                            entries.iter().find(|&&(_, n)| n == tail)
                        {
                            if child_lhs != parent_lhs {
                                direct.entry(child_lhs).or_default().insert(parent_lhs);
                            }
                        }
                    }
                }
            }
        }

        let mut parents = HashMap::new();
        for &child in direct.keys() {
            let mut reachable = Vec::new();
            let mut visited: HashSet<Symbol> = HashSet::new();
            visited.insert(child);
            let mut frontier: Vec<Symbol> = direct.get(&child).into_iter().flatten().copied().collect();
            while let Some(next) = frontier.pop() {
                if !visited.insert(next) {
                    continue;
                }
                reachable.push(next);
                if let Some(grandparents) = direct.get(&next) {
                    frontier.extend(grandparents.iter().copied());
                }
            }
            parents.insert(child, reachable);
        }

        Self { parents }
    }

    /// Labels reachable from `child` through a chain of unary rules, cycles
    /// excluded.
    pub fn parents_of(&self, child: Symbol) -> &[Symbol] {
        self.parents.get(&child).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cicada_core::Vocab;
    use cicada_compose::{compose_chart_filtered, ComposeFlags};
    use cicada_grammar::TrieGrammar;
    use cicada_graph::Lattice;
    use cicada_vector::{AttributeVector, FeatureVector};

    fn rule(lhs: &str, source: Vec<&str>) -> cicada_graph::Rule {
        cicada_graph::Rule::monolingual(
            Symbol::intern(lhs),
            source.into_iter().map(Symbol::intern).collect(),
            FeatureVector::new(),
            AttributeVector::new(),
        )
        .unwrap()
    }

    #[test]
    fn unary_chain_is_captured_as_a_reachable_parent() {
        Vocab::reset();
        let lattice = Lattice::linear(&["a"]);
        let mut grammar = TrieGrammar::new();
        grammar.insert(rule("[X]", vec!["a"]));
        grammar.insert(rule("[Y]", vec!["[X,1]"]));
        grammar.insert(rule("[S]", vec!["[Y,1]"]));

        let (graph, spans) = compose_chart_filtered(
            Symbol::intern("[S]"),
            &[&grammar],
            &lattice,
            &ComposeFlags::default(),
            &|_, _, _| true,
        )
        .unwrap();

        let closure = UnaryClosure::build(&graph, &spans, lattice.len());
        let parents = closure.parents_of(Symbol::intern("[X]"));
        assert!(parents.contains(&Symbol::intern("[Y]")));
        assert!(parents.contains(&Symbol::intern("[S]")));
    }

    #[test]
    fn a_label_is_never_its_own_parent() {
        Vocab::reset();
        let lattice = Lattice::linear(&["a"]);
        let mut grammar = TrieGrammar::new();
        grammar.insert(rule("[X]", vec!["a"]));

        let (graph, spans) = compose_chart_filtered(
            Symbol::intern("[X]"),
            &[&grammar],
            &lattice,
            &ComposeFlags::default(),
            &|_, _, _| true,
        )
        .unwrap();

        let closure = UnaryClosure::build(&graph, &spans, lattice.len());
        assert!(closure.parents_of(Symbol::intern("[X]")).is_empty());
    }
}
