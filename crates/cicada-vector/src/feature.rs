//! Sparse feature vectors (spec §3, component C4).

use std::collections::BTreeMap;
use std::fmt;
use std::ops::{AddAssign, Index};

use cicada_core::Vocab;
use serde::{Deserialize, Serialize};

/// Interned identifier for a feature name (e.g. `"rule-table-0"`, `"lm"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FeatureId(u32);

impl FeatureId {
    /// Interns `name` and returns its stable feature id.
    pub fn intern(name: &str) -> Self {
        FeatureId(Vocab::intern(name))
    }

    /// Resolves this id back to its feature name.
    pub fn text(self) -> Box<str> {
        Vocab::resolve(self.0)
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text())
    }
}

/// Returns the raw interned id backing `key`. Crate-internal: used by the
/// compact encoder, which must serialize the bare integer.
pub(crate) fn feature_id_raw(key: FeatureId) -> u32 {
    key.0
}

/// Reconstructs a [`FeatureId`] from a raw interned id. Crate-internal.
pub(crate) fn feature_id_from_raw(raw: u32) -> FeatureId {
    FeatureId(raw)
}

/// Ordered sparse mapping from interned feature id to a real value.
///
/// Zero-valued features are never stored: every mutating operation erases
/// entries whose value becomes exactly `0.0`, satisfying the "feature
/// sparsity" invariant (spec §8).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    values: BTreeMap<FeatureId, f64>,
}

impl FeatureVector {
    /// Creates an empty feature vector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if no non-zero features are present.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the number of non-zero features.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns the value stored for `key`, or `0.0` if absent.
    pub fn get(&self, key: FeatureId) -> f64 {
        self.values.get(&key).copied().unwrap_or(0.0)
    }

    /// Sets `key` to `value`, erasing the entry if `value == 0.0`.
    pub fn set(&mut self, key: FeatureId, value: f64) {
        if value == 0.0 {
            self.values.remove(&key);
        } else {
            self.values.insert(key, value);
        }
    }

    /// Adds `value` to the existing entry for `key`, erasing on zero.
    pub fn add(&mut self, key: FeatureId, value: f64) {
        let updated = self.get(key) + value;
        self.set(key, updated);
    }

    /// Iterates over `(key, value)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (FeatureId, f64)> + '_ {
        self.values.iter().map(|(k, v)| (*k, *v))
    }

    /// Computes the dot product against a dense weight lookup.
    pub fn dot(&self, weight_of: impl Fn(FeatureId) -> f64) -> f64 {
        self.values.iter().map(|(k, v)| v * weight_of(*k)).sum()
    }
}

impl Index<FeatureId> for FeatureVector {
    type Output = f64;

    fn index(&self, index: FeatureId) -> &f64 {
        self.values.get(&index).unwrap_or(&0.0)
    }
}

impl AddAssign<&FeatureVector> for FeatureVector {
    /// Pointwise addition with auto-erase on zero, used when merging features
    /// across recombined edges (e.g. `remove_epsilon`, `debinarize`).
    fn add_assign(&mut self, rhs: &FeatureVector) {
        for (key, value) in rhs.iter() {
            self.add(key, value);
        }
    }
}

impl std::ops::Add<&FeatureVector> for FeatureVector {
    type Output = FeatureVector;

    fn add(mut self, rhs: &FeatureVector) -> FeatureVector {
        self += rhs;
        self
    }
}

impl FromIterator<(FeatureId, f64)> for FeatureVector {
    fn from_iter<T: IntoIterator<Item = (FeatureId, f64)>>(iter: T) -> Self {
        let mut vector = FeatureVector::new();
        for (key, value) in iter {
            vector.set(key, value);
        }
        vector
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cicada_core::Vocab;

    #[test]
    fn zero_values_are_erased() {
        Vocab::reset();
        let mut fv = FeatureVector::new();
        let k = FeatureId::intern("lm");
        fv.set(k, 1.0);
        assert_eq!(fv.len(), 1);
        fv.add(k, -1.0);
        assert_eq!(fv.len(), 0);
        assert_eq!(fv.get(k), 0.0);
    }

    #[test]
    fn addition_is_pointwise() {
        Vocab::reset();
        let a_key = FeatureId::intern("a");
        let b_key = FeatureId::intern("b");
        let mut lhs = FeatureVector::new();
        lhs.set(a_key, 1.0);
        let mut rhs = FeatureVector::new();
        rhs.set(a_key, 2.0);
        rhs.set(b_key, 3.0);
        lhs += &rhs;
        assert_eq!(lhs.get(a_key), 3.0);
        assert_eq!(lhs.get(b_key), 3.0);
    }
}
