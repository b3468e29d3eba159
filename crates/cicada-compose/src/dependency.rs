//! `compose_dependency_arc_standard`: builds a hypergraph from a sequence of
//! arc-standard shift-reduce transitions (spec §4.2 variant), tagging each
//! attach with `dependency-head`/`dependency-dependent`/`dependency-pos`
//! attributes.
//!
//! Unlike the span-based chart composers, arc-standard dependency parsing is
//! driven by an explicit transition sequence rather than a grammar: each
//! `LeftArc`/`RightArc` action is itself the "rule" being applied, so there
//! is no `Transducer` here — the transitions are the parameter the spec
//! names directly ("parameterizes cell construction by the arc-standard
//! head/dependent decisions").

use std::collections::VecDeque;

use cicada_core::{CicadaError, NodeId, Symbol};
use cicada_graph::{Hypergraph, Rule};
use cicada_vector::{AttributeId, AttributeValue, AttributeVector, FeatureVector};

/// One arc-standard transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyAction {
    /// Move the next buffer word onto the stack.
    Shift,
    /// Attach the second-from-top stack word as a dependent of the top.
    LeftArc,
    /// Attach the top stack word as a dependent of the second-from-top.
    RightArc,
}

/// Builds a hypergraph from `words` by replaying `actions` as an
/// arc-standard shift-reduce parse. Every word starts as its own leaf node
/// (rule `[W] -> word`); every arc attachment replaces the head's node with
/// a fresh one carrying an edge tailed at `[old_head, dependent]`, tagged
/// with the dependency attributes. The final single remaining stack element
/// becomes the goal.
pub fn compose_dependency_arc_standard(
    words: &[Symbol],
    actions: &[DependencyAction],
) -> Result<Hypergraph, CicadaError> {
    let n = words.len();
    let mut graph = Hypergraph::new();
    let mut node_for = Vec::with_capacity(n);
    for &word in words {
        let node = graph.add_node();
        let rule = Rule::monolingual(
            Symbol::intern("[W]"),
            vec![word],
            FeatureVector::new(),
            AttributeVector::new(),
        )?;
        let edge = graph.add_edge(&[], rule)?;
        graph.connect_edge(edge, node)?;
        node_for.push(node);
    }

    let mut stack: Vec<usize> = Vec::new();
    let mut buffer: VecDeque<usize> = (0..n).collect();

    for action in actions {
        match action {
            DependencyAction::Shift => {
                let word = buffer.pop_front().ok_or_else(|| {
                    CicadaError::malformed_input(
                        "dependency-buffer-empty",
                        "shift with an empty buffer",
                    )
                })?;
                stack.push(word);
            }
            DependencyAction::LeftArc => {
                if stack.len() < 2 {
                    return Err(CicadaError::malformed_input(
                        "dependency-stack-underflow",
                        "left-arc needs at least two stack elements",
                    ));
                }
                let head = stack[stack.len() - 1];
                let dependent = stack.remove(stack.len() - 2);
                attach(&mut graph, &mut node_for, words, head, dependent)?;
            }
            DependencyAction::RightArc => {
                if stack.len() < 2 {
                    return Err(CicadaError::malformed_input(
                        "dependency-stack-underflow",
                        "right-arc needs at least two stack elements",
                    ));
                }
                let dependent = stack.pop().unwrap();
                let head = *stack.last().unwrap();
                attach(&mut graph, &mut node_for, words, head, dependent)?;
            }
        }
    }

    if stack.len() != 1 || !buffer.is_empty() {
        return Err(CicadaError::malformed_input(
            "dependency-incomplete-parse",
            "transition sequence did not reduce to a single root",
        ));
    }

    graph.set_goal(node_for[stack[0]]);
    Ok(graph)
}

fn attach(
    graph: &mut Hypergraph,
    node_for: &mut [NodeId],
    words: &[Symbol],
    head: usize,
    dependent: usize,
) -> Result<(), CicadaError> {
    let mut attributes = AttributeVector::new();
    attributes.set(
        AttributeId::intern("dependency-head"),
        AttributeValue::String(words[head].text()),
    );
    attributes.set(
        AttributeId::intern("dependency-dependent"),
        AttributeValue::String(words[dependent].text()),
    );
    // No POS-tagging subsystem exists in this crate's `Symbol`; the head's
    // own surface form doubles as its tag, same simplification `pos_mode`
    // documents in `ComposeFlags`.
    attributes.set(
        AttributeId::intern("dependency-pos"),
        AttributeValue::String(words[head].text()),
    );
    let rule = Rule::monolingual(
        Symbol::intern("[DEP]"),
        vec![Symbol::intern("[H]").with_index(Some(1)), Symbol::intern("[D]").with_index(Some(2))],
        FeatureVector::new(),
        attributes,
    )?;
    let edge = graph.add_edge(&[node_for[head], node_for[dependent]], rule)?;
    let new_head_node = graph.add_node();
    graph.connect_edge(edge, new_head_node)?;
    node_for[head] = new_head_node;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cicada_core::Vocab;

    #[test]
    fn arc_standard_parses_a_three_word_sentence() {
        Vocab::reset();
        let words = [
            Symbol::intern("the"),
            Symbol::intern("dog"),
            Symbol::intern("barks"),
        ];
        // "the" <- "dog" (left-arc), then ("dog" "barks") -> "barks" is head (right-arc).
        let actions = [
            DependencyAction::Shift,
            DependencyAction::Shift,
            DependencyAction::LeftArc,
            DependencyAction::Shift,
            DependencyAction::RightArc,
        ];
        let graph = compose_dependency_arc_standard(&words, &actions).unwrap();
        assert!(graph.is_valid());
        let goal_node = graph.node(graph.goal()).unwrap();
        assert_eq!(goal_node.incoming_edges().len(), 1);
        let edge = graph.edge(goal_node.incoming_edges()[0]).unwrap();
        assert_eq!(
            edge.attributes.get(AttributeId::intern("dependency-head")),
            Some(&AttributeValue::String(Symbol::intern("barks").text()))
        );
    }

    #[test]
    fn incomplete_transition_sequence_is_rejected() {
        Vocab::reset();
        let words = [Symbol::intern("a"), Symbol::intern("b")];
        let actions = [DependencyAction::Shift];
        let err = compose_dependency_arc_standard(&words, &actions).unwrap_err();
        assert!(matches!(err, CicadaError::MalformedInput(_)));
    }
}
