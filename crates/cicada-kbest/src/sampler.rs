//! Top-down Monte-Carlo sampling over a hypergraph (spec §4.5): draws a
//! path from the goal down to the leaves, choosing one incoming edge per
//! node with probability proportional to `f(edge) × Πᵢ inside(tailᵢ)`
//! (uniform fallback when every edge weighs zero), then builds the yield
//! bottom-up through the same [`Traversal`] callback [`crate::KBest`] uses.
//!
//! `S::value()` is used directly as a nonnegative linear sampling weight,
//! so this is meant for a semiring like [`cicada_core::Probability`] whose
//! values already are probabilities; a log-domain semiring (`Tropical`,
//! `LogExpectation`) would need an `exp()` conversion this module doesn't
//! perform.
//!
//! A `temperature` (default `1.0`) tempers the draw distribution by raising
//! every edge weight to the `1.0 / temperature` power before normalizing,
//! same knob as the original sampler's `temperature` constructor argument.

use cicada_core::{derive_substream_seed, NodeId, RngHandle, Semiring};
use cicada_graph::{inside_outside, Hypergraph};
use cicada_vector::FeatureFunction;

use crate::traversal::Traversal;

fn draw_node<S: Semiring, T>(
    graph: &Hypergraph,
    function: &dyn FeatureFunction<S>,
    inside: &[S],
    node: NodeId,
    traversal: &dyn Traversal<T>,
    rng: &mut RngHandle,
    temperature: f64,
) -> (S, T) {
    let incoming = graph.node(node).expect("node exists").incoming_edges().to_vec();
    let raw_weights: Vec<f64> = incoming
        .iter()
        .map(|&edge_id| {
            let edge = graph.edge(edge_id).expect("edge exists");
            let mut w = function.evaluate(&edge.features).value();
            for &tail in edge.tails() {
                w *= inside[tail.index()].value();
            }
            w.max(0.0)
        })
        .collect();

    // Temperature only reshapes the draw distribution, never the returned
    // weight (`sample.hpp`'s `sampler.draw(..., temperature)` keeps
    // `scores[node_id][pos_sampled]` un-tempered too).
    let tempered: Vec<f64> = raw_weights.iter().map(|&w| w.powf(1.0 / temperature)).collect();
    let total: f64 = tempered.iter().sum();

    let chosen = if total > 0.0 {
        let r = rng.next_unit() * total;
        let mut cumulative = 0.0;
        let mut pick = incoming.len() - 1;
        for (i, &w) in tempered.iter().enumerate() {
            cumulative += w;
            if r < cumulative {
                pick = i;
                break;
            }
        }
        pick
    } else {
        (rng.next_unit() * incoming.len() as f64) as usize % incoming.len()
    };

    let edge = graph.edge(incoming[chosen]).expect("edge exists").clone();
    let mut score = function.evaluate(&edge.features);
    let mut values: Vec<T> = Vec::with_capacity(edge.tails().len());
    for &tail in edge.tails() {
        let (tail_score, tail_value) = draw_node(graph, function, inside, tail, traversal, rng, temperature);
        score = score.times(tail_score);
        values.push(tail_value);
    }
    let refs: Vec<&T> = values.iter().collect();
    let value = traversal.combine(&edge, &refs);
    (score, value)
}

/// A stream of `k_prime` independently drawn derivations, each reproducible
/// from `(seed, draw_index)` via [`derive_substream_seed`].
pub struct Sampler<'a, S: Semiring, T> {
    graph: &'a Hypergraph,
    function: &'a dyn FeatureFunction<S>,
    traversal: &'a dyn Traversal<T>,
    inside: Vec<S>,
    seed: u64,
    drawn: usize,
    k_prime: usize,
    temperature: f64,
}

impl<'a, S: Semiring, T> Sampler<'a, S, T> {
    /// Builds a sampler over `graph`'s derivations, weighted by `function`'s
    /// inside scores and rendered by `traversal`. Draws `k_prime` samples
    /// total, each one's randomness derived from `seed`, at the default
    /// temperature of `1.0` (the draw distribution used as-is).
    pub fn new(
        graph: &'a Hypergraph,
        function: &'a dyn FeatureFunction<S>,
        traversal: &'a dyn Traversal<T>,
        seed: u64,
        k_prime: usize,
    ) -> Self {
        Self::with_temperature(graph, function, traversal, seed, k_prime, 1.0)
    }

    /// As [`Sampler::new`], but flattens (`temperature > 1.0`) or sharpens
    /// (`temperature < 1.0`) the per-edge draw distribution by raising each
    /// weight to the `1.0 / temperature` power before normalizing.
    pub fn with_temperature(
        graph: &'a Hypergraph,
        function: &'a dyn FeatureFunction<S>,
        traversal: &'a dyn Traversal<T>,
        seed: u64,
        k_prime: usize,
        temperature: f64,
    ) -> Self {
        let inside = if graph.is_valid() {
            inside_outside(graph, function).inside
        } else {
            Vec::new()
        };
        Self {
            graph,
            function,
            traversal,
            inside,
            seed,
            drawn: 0,
            k_prime,
            temperature,
        }
    }
}

/// The boxed-iterator entry point over `k_prime` sampled derivations, at the
/// default temperature of `1.0`.
pub fn sample_iter<'a, S: Semiring + 'a, T: 'a>(
    graph: &'a Hypergraph,
    function: &'a dyn FeatureFunction<S>,
    traversal: &'a dyn Traversal<T>,
    seed: u64,
    k_prime: usize,
) -> Box<dyn Iterator<Item = (S, T)> + 'a> {
    Box::new(Sampler::new(graph, function, traversal, seed, k_prime))
}

impl<'a, S: Semiring, T> Iterator for Sampler<'a, S, T> {
    type Item = (S, T);

    fn next(&mut self) -> Option<Self::Item> {
        if self.drawn >= self.k_prime || !self.graph.is_valid() {
            return None;
        }
        let substream = derive_substream_seed(self.seed, self.drawn as u64);
        let mut rng = RngHandle::from_seed(substream);
        self.drawn += 1;
        Some(draw_node(
            self.graph,
            self.function,
            &self.inside,
            self.graph.goal(),
            self.traversal,
            &mut rng,
            self.temperature,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cicada_core::{Probability, Symbol, Vocab};
    use cicada_graph::Rule;
    use cicada_vector::{AttributeVector, FeatureId, FeatureVector};

    struct DotProbability {
        weights: std::collections::BTreeMap<cicada_vector::FeatureId, f64>,
    }

    impl FeatureFunction<Probability> for DotProbability {
        fn evaluate(&self, features: &cicada_vector::FeatureVector) -> Probability {
            let score = features.dot(|key| self.weights.get(&key).copied().unwrap_or(1.0));
            Probability(score)
        }
    }

    fn rule(lhs: &str, source: Vec<&str>, weight: f64) -> Rule {
        let mut features = FeatureVector::new();
        features.set(FeatureId::intern("w"), weight);
        Rule::monolingual(
            Symbol::intern(lhs),
            source.into_iter().map(Symbol::intern).collect(),
            features,
            AttributeVector::new(),
        )
        .unwrap()
    }

    fn build_graph() -> Hypergraph {
        let mut graph = Hypergraph::new();
        let left = graph.add_node();
        let e = graph.add_edge(&[], rule("[A]", vec!["a"], 1.0)).unwrap();
        graph.connect_edge(e, left).unwrap();
        let root = graph.add_node();
        let e = graph.add_edge(&[left], rule("[S]", vec!["[A,1]"], 1.0)).unwrap();
        graph.connect_edge(e, root).unwrap();
        graph.set_goal(root);
        graph
    }

    #[test]
    fn sampler_stops_after_k_prime_draws() {
        Vocab::reset();
        let graph = build_graph();
        let function = DotProbability { weights: std::collections::BTreeMap::new() };
        let samples: Vec<_> = Sampler::new(&graph, &function, &crate::traversal::SurfaceYield, 7, 3).collect();
        assert_eq!(samples.len(), 3);
        for (_, value) in &samples {
            assert_eq!(value, "a");
        }
    }

    #[test]
    fn same_seed_reproduces_the_same_draws() {
        Vocab::reset();
        let graph = build_graph();
        let function = DotProbability { weights: std::collections::BTreeMap::new() };
        let a: Vec<_> = Sampler::new(&graph, &function, &crate::traversal::SurfaceYield, 42, 5)
            .map(|(s, v)| (s.value(), v))
            .collect();
        let b: Vec<_> = Sampler::new(&graph, &function, &crate::traversal::SurfaceYield, 42, 5)
            .map(|(s, v)| (s.value(), v))
            .collect();
        assert_eq!(a, b);
    }

    #[test]
    fn invalid_goal_produces_no_samples() {
        Vocab::reset();
        let graph = Hypergraph::new();
        let function = DotProbability { weights: std::collections::BTreeMap::new() };
        let samples: Vec<_> = Sampler::new(&graph, &function, &crate::traversal::SurfaceYield, 1, 5).collect();
        assert!(samples.is_empty());
    }

    fn build_skewed_choice_graph() -> Hypergraph {
        let mut graph = Hypergraph::new();
        let left = graph.add_node();
        for (w, weight) in [("heavy", 9.0), ("light", 1.0)] {
            let e = graph.add_edge(&[], rule("[A]", vec![w], weight)).unwrap();
            graph.connect_edge(e, left).unwrap();
        }
        let root = graph.add_node();
        let e = graph.add_edge(&[left], rule("[S]", vec!["[A,1]"], 1.0)).unwrap();
        graph.connect_edge(e, root).unwrap();
        graph.set_goal(root);
        graph
    }

    #[test]
    fn a_low_temperature_sharpens_toward_the_heavier_edge() {
        Vocab::reset();
        let graph = build_skewed_choice_graph();
        let function = DotProbability { weights: std::collections::BTreeMap::new() };

        let heavy_count = |temperature: f64, seed: u64| {
            Sampler::with_temperature(&graph, &function, &crate::traversal::SurfaceYield, seed, 50, temperature)
                .filter(|(_, value)| value == "heavy")
                .count()
        };

        let sharp = (0..5).map(|s| heavy_count(0.1, s)).sum::<usize>();
        let flat = (0..5).map(|s| heavy_count(5.0, s)).sum::<usize>();
        assert!(sharp > flat, "sharp={sharp} flat={flat}");
    }
}
