//! Shared candidate scoring and ordering used by every applier variant
//! (spec §4.3).

use std::cmp::Ordering;
use std::collections::HashMap;

use cicada_core::{NodeId, Semiring};
use cicada_graph::{Edge, Hypergraph};
use cicada_model::Model;
use cicada_vector::{FeatureFunction, FeatureVector};

/// One retained derivation at an input node: the corresponding node in the
/// output graph, its score/estimate under the caller's semiring, and the
/// opaque model state threading into edges above it.
#[derive(Debug, Clone)]
pub(crate) struct DerivationItem<S: Semiring> {
    pub(crate) out_node: NodeId,
    pub(crate) score: S,
    pub(crate) estimate: S,
    pub(crate) state: Vec<u8>,
}

/// A scored candidate out-edge: `slot` identifies which of the node's
/// incoming edges it came from, `j` its coordinate into that edge's tails'
/// `D[]` lists (together, `(slot, j)` is the dedup key cube pruning needs).
#[derive(Debug, Clone)]
pub(crate) struct Candidate<S: Semiring> {
    pub(crate) slot: usize,
    pub(crate) j: Vec<usize>,
    pub(crate) out_tails: Vec<NodeId>,
    pub(crate) score: S,
    pub(crate) estimate: S,
    pub(crate) state: Vec<u8>,
    pub(crate) heuristic_features: FeatureVector,
}

impl<S: Semiring> PartialEq for Candidate<S> {
    fn eq(&self, other: &Self) -> bool {
        self.estimate.value() == other.estimate.value()
    }
}

impl<S: Semiring> Eq for Candidate<S> {}

impl<S: Semiring> PartialOrd for Candidate<S> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<S: Semiring> Ord for Candidate<S> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.estimate.value().total_cmp(&other.estimate.value())
    }
}

/// Scores the candidate at coordinate `j` over `edge`'s antecedent lists
/// `tails_d` (`tails_d[i]` is `D[edge.tails()[i]]`). Returns `None` if any
/// coordinate indexes past the end of its antecedent's retained list (an
/// exhausted dimension, per the failure semantics in spec §4.3).
pub(crate) fn score_candidate<S: Semiring>(
    model: &dyn Model,
    function: &dyn FeatureFunction<S>,
    edge: &Edge,
    tails_d: &[&[DerivationItem<S>]],
    slot: usize,
    j: Vec<usize>,
    is_goal: bool,
) -> Option<Candidate<S>> {
    let mut prev_states: Vec<Vec<u8>> = Vec::with_capacity(tails_d.len());
    let mut out_tails: Vec<NodeId> = Vec::with_capacity(tails_d.len());
    let mut prev_score = S::one();
    for (i, items) in tails_d.iter().enumerate() {
        if items.is_empty() {
            tracing::warn!(slot, antecedent = i, "skipping candidate: antecedent has no retained derivations");
            return None;
        }
        let item = items.get(j[i])?;
        prev_states.push(item.state.clone());
        out_tails.push(item.out_node);
        prev_score = prev_score.times(item.score);
    }
    let prev_refs: Vec<&[u8]> = prev_states.iter().map(Vec::as_slice).collect();
    let mut heuristic_features = FeatureVector::new();
    let state = model.apply(&prev_refs, edge, &mut heuristic_features);

    let rule_score = function.evaluate(&edge.features);
    let mut score = prev_score.times(rule_score);
    let mut estimate = score.times(function.evaluate(&heuristic_features));

    if is_goal {
        let mut final_features = FeatureVector::new();
        model.apply_final(&state, &mut final_features);
        let final_score = function.evaluate(&final_features);
        score = score.times(final_score);
        estimate = estimate.times(final_score);
        heuristic_features += &final_features;
    }

    Some(Candidate {
        slot,
        j,
        out_tails,
        score,
        estimate,
        state,
        heuristic_features,
    })
}

/// Assigns output nodes to popped candidates by model `state` (spec §4.3:
/// "recombine by state... otherwise allocate a new output node"). At the
/// goal, state-keyed recombination is skipped entirely and every candidate
/// attaches to the single goal node (spec.md line 101).
pub(crate) struct Recombiner {
    goal_node: Option<NodeId>,
    by_state: HashMap<Vec<u8>, usize>,
}

impl Recombiner {
    pub(crate) fn new(goal_node: Option<NodeId>) -> Self {
        Self {
            goal_node,
            by_state: HashMap::new(),
        }
    }

    /// Resolves the output node for a popped candidate with the given
    /// `state`/`score`/`estimate`. If a node already exists in `retained`
    /// for this exact state, its score/estimate is bumped in place when
    /// `estimate` improves on it and its existing node is reused; otherwise
    /// a new output node is allocated and a new [`DerivationItem`] is
    /// pushed onto `retained`.
    pub(crate) fn resolve<S: Semiring>(
        &mut self,
        out: &mut Hypergraph,
        retained: &mut Vec<DerivationItem<S>>,
        state: Vec<u8>,
        score: S,
        estimate: S,
    ) -> NodeId {
        if let Some(goal_node) = self.goal_node {
            return goal_node;
        }
        if let Some(&idx) = self.by_state.get(&state) {
            let existing = &mut retained[idx];
            if estimate.value() > existing.estimate.value() {
                existing.score = score;
                existing.estimate = estimate;
            }
            return existing.out_node;
        }
        let out_node = out.add_node();
        self.by_state.insert(state.clone(), retained.len());
        retained.push(DerivationItem {
            out_node,
            score,
            estimate,
            state,
        });
        out_node
    }
}
