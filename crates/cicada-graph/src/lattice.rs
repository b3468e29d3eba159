//! Input word lattice (spec §3, component C3).

use cicada_core::Symbol;
use cicada_vector::FeatureVector;
use serde::{Deserialize, Serialize};

/// One arc leaving a lattice position, reaching `pos + distance`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Arc {
    /// The terminal symbol consumed by this arc.
    pub label: Symbol,
    /// Per-arc feature weights.
    pub features: FeatureVector,
    /// How many positions this arc advances (`>= 1`).
    pub distance: usize,
}

impl Arc {
    /// Creates a new arc. `distance` is clamped to at least `1`.
    pub fn new(label: Symbol, features: FeatureVector, distance: usize) -> Self {
        Self {
            label,
            features,
            distance: distance.max(1),
        }
    }
}

/// A DAG over integer positions, each position holding a set of outgoing
/// arcs labeled by terminal. Represents ambiguous tokenized input (e.g.
/// confusion networks, ASR lattices).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Lattice {
    positions: Vec<Vec<Arc>>,
}

impl Lattice {
    /// Creates an empty lattice with `len` positions (i.e. `len` arc-sets;
    /// the lattice spans positions `0..=len`).
    pub fn new(len: usize) -> Self {
        Self {
            positions: (0..len).map(|_| Vec::new()).collect(),
        }
    }

    /// Builds a linear (monotone, unambiguous) lattice from a sequence of
    /// terminal strings, one arc of distance 1 per token.
    pub fn linear(tokens: &[&str]) -> Self {
        let mut lattice = Lattice::new(tokens.len());
        for (i, token) in tokens.iter().enumerate() {
            lattice.positions[i].push(Arc::new(Symbol::intern(token), FeatureVector::new(), 1));
        }
        lattice
    }

    /// Number of positions (i.e. the input length in arc-sets).
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// `true` if this lattice has no positions.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Adds `arc` leaving position `pos`.
    pub fn push_arc(&mut self, pos: usize, arc: Arc) {
        if pos >= self.positions.len() {
            self.positions.resize_with(pos + 1, Vec::new);
        }
        self.positions[pos].push(arc);
    }

    /// Arcs leaving `pos`.
    pub fn arcs_at(&self, pos: usize) -> &[Arc] {
        self.positions.get(pos).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The minimum number of arc-hops needed to travel from `first` to
    /// `last`, or `None` if unreachable. A plain BFS over positions, since
    /// every arc's `distance` advances the position by a fixed amount.
    pub fn shortest_distance(&self, first: usize, last: usize) -> Option<usize> {
        if first == last {
            return Some(0);
        }
        if first > last {
            return None;
        }
        let mut dist = vec![usize::MAX; last + 1];
        dist[first] = 0;
        for pos in first..=last.min(self.positions.len().saturating_sub(1)) {
            if dist[pos] == usize::MAX {
                continue;
            }
            for arc in self.arcs_at(pos) {
                let next = pos + arc.distance;
                if next <= last && dist[pos] + 1 < dist[next] {
                    dist[next] = dist[pos] + 1;
                }
            }
        }
        let reached = dist[last];
        (reached != usize::MAX).then_some(reached)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cicada_core::Vocab;

    #[test]
    fn linear_lattice_has_one_arc_per_position() {
        Vocab::reset();
        let lattice = Lattice::linear(&["a", "b"]);
        assert_eq!(lattice.len(), 2);
        assert_eq!(lattice.arcs_at(0).len(), 1);
        assert_eq!(lattice.shortest_distance(0, 2), Some(2));
    }

    #[test]
    fn unreachable_span_returns_none() {
        Vocab::reset();
        let lattice = Lattice::new(3);
        assert_eq!(lattice.shortest_distance(0, 3), None);
    }
}
