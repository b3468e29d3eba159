//! The non-local feature function interface consumed by appliers (spec
//! §3/§4.3/§6 component C6): stateful scoring that produces an opaque state
//! blob per hyperedge.

use std::collections::HashMap;

use cicada_core::{CicadaError, Symbol};
use cicada_graph::Edge;
use cicada_vector::{FeatureId, FeatureVector};

/// A stateful feature function. `state_size` declares the fixed byte length
/// of every state this model produces; appliers use it to validate state
/// blobs before recombination (a mismatch is a [`CicadaError::ModelContract`]
/// fault, since it means the model violated its own declared contract).
pub trait Model: Send + Sync {
    /// The fixed length, in bytes, of states produced by `apply`/`apply_final`.
    fn state_size(&self) -> usize;

    /// Scores one hyperedge given the states of its tails (in tail order)
    /// and accumulates non-local features into `features`. Returns the new
    /// state for the edge's head.
    fn apply(&self, prev_states: &[&[u8]], edge: &Edge, features: &mut FeatureVector) -> Vec<u8>;

    /// Scores the transition out of the goal node (e.g. a sentence-end
    /// bigram), accumulating into `features`. Does not produce a new state.
    fn apply_final(&self, state: &[u8], features: &mut FeatureVector);

    /// Re-entrant per-thread setup hook, called at the start and end of each
    /// decoding call. Models with thread-local mutable caches (LM history,
    /// RNN buffers) reset them here.
    fn initialize(&self) {}
}

/// Validates that `state` has the length `model` declares, per the model
/// contract (spec §7 `ModelContract`).
pub fn validate_state_size(model: &dyn Model, state: &[u8]) -> Result<(), CicadaError> {
    if state.len() != model.state_size() {
        return Err(CicadaError::model_contract(
            "model-state-size-mismatch",
            format!(
                "state blob has {} bytes, model declares state_size() == {}",
                state.len(),
                model.state_size()
            ),
        ));
    }
    Ok(())
}

const BOUNDARY_CONTEXT: u32 = u32::MAX;

fn encode_context(context: u32) -> Vec<u8> {
    context.to_le_bytes().to_vec()
}

fn decode_context(state: &[u8]) -> u32 {
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&state[..4]);
    u32::from_le_bytes(bytes)
}

/// A toy bigram language model, used as the reference `Model` for cube
/// pruning tests (spec §8 scenario 2). State is the 4-byte id of the last
/// terminal symbol produced (or [`BOUNDARY_CONTEXT`] at the left edge).
/// Non-terminal occurrences in `edge.rule.source` pull their right-context
/// boundary from the corresponding tail's state.
#[derive(Debug, Clone, Default)]
pub struct BigramModel {
    weights: HashMap<(u32, u32), f64>,
    default_weight: f64,
}

impl BigramModel {
    /// Creates a model that scores any unseen bigram as `default_weight`.
    pub fn new(default_weight: f64) -> Self {
        Self {
            weights: HashMap::new(),
            default_weight,
        }
    }

    /// Sets the score for the `left -> right` bigram.
    pub fn set_weight(&mut self, left: Symbol, right: Symbol, weight: f64) {
        self.weights.insert((left.id(), right.id()), weight);
    }

    fn score(&self, left: u32, right: u32) -> f64 {
        self.weights.get(&(left, right)).copied().unwrap_or(self.default_weight)
    }
}

impl Model for BigramModel {
    fn state_size(&self) -> usize {
        4
    }

    fn apply(&self, prev_states: &[&[u8]], edge: &Edge, features: &mut FeatureVector) -> Vec<u8> {
        let feature = FeatureId::intern("bigram-lm");
        let mut context = BOUNDARY_CONTEXT;
        let mut occurrence = 0usize;
        for &symbol in &edge.rule.source {
            let next_context = if symbol.is_terminal() {
                symbol.id()
            } else {
                let next_context = decode_context(prev_states[occurrence]);
                occurrence += 1;
                next_context
            };
            features.add(feature, self.score(context, next_context));
            context = next_context;
        }
        encode_context(context)
    }

    fn apply_final(&self, state: &[u8], features: &mut FeatureVector) {
        let context = decode_context(state);
        features.add(FeatureId::intern("bigram-lm"), self.score(context, BOUNDARY_CONTEXT));
    }
}
