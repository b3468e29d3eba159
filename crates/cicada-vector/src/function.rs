//! The `FeatureFunction` contract consumed by inside/outside, the applier
//! and coarse-to-fine parsing (spec §6): `function: FeatureVector -> Semiring`.

use cicada_core::Semiring;

use crate::feature::FeatureVector;

/// Evaluates a feature vector into a semiring value for score aggregation.
///
/// Implementations are typically a dot product against a dense weight
/// table, projected through the target semiring (e.g. `exp(dot)` for
/// [`cicada_core::Probability`], or the raw dot product for
/// [`cicada_core::Tropical`]).
pub trait FeatureFunction<S: Semiring> {
    /// Evaluates `features` into a semiring value.
    fn evaluate(&self, features: &FeatureVector) -> S;
}

/// A [`FeatureFunction`] backed by a dense linear weight vector, evaluating
/// into the tropical (max-plus) semiring: `score = sum(weight[k] * v[k])`.
#[derive(Debug, Clone, Default)]
pub struct LinearTropical {
    weights: std::collections::BTreeMap<crate::feature::FeatureId, f64>,
}

impl LinearTropical {
    /// Creates an empty weight vector (all weights default to `0.0`).
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the weight for `key`.
    pub fn set_weight(&mut self, key: crate::feature::FeatureId, weight: f64) {
        self.weights.insert(key, weight);
    }
}

impl FeatureFunction<cicada_core::Tropical> for LinearTropical {
    fn evaluate(&self, features: &FeatureVector) -> cicada_core::Tropical {
        let score = features.dot(|key| self.weights.get(&key).copied().unwrap_or(0.0));
        cicada_core::Tropical(score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::FeatureId;
    use cicada_core::{Semiring, Vocab};

    #[test]
    fn linear_tropical_dot_product() {
        Vocab::reset();
        let mut fv = FeatureVector::new();
        let k = FeatureId::intern("lm");
        fv.set(k, 2.0);
        let mut weights = LinearTropical::new();
        weights.set_weight(k, 0.5);
        let score = weights.evaluate(&fv);
        assert_eq!(score.value(), 1.0);
    }
}
