//! Generic inside/outside scoring over a hypergraph (spec §4.4/§4.5's
//! shared "weight a derivation by a semiring function" primitive), used by
//! coarse-to-fine pruning and by the k-best sampler's proportional draw.

use cicada_core::Semiring;
use cicada_vector::FeatureFunction;

use crate::hypergraph::Hypergraph;

/// Per-node inside and outside scores under `function`'s semiring.
///
/// `inside[v]` is the total weight of every derivation rooted at `v`;
/// `outside[v]` is the total weight of every way to reach `v` from the
/// goal through the rest of the forest (`outside[goal] == S::one()`).
/// `graph` must already be topologically sorted (tails strictly precede
/// heads), the same precondition [`crate::topologically_sort`] produces.
pub struct InsideOutside<S: Semiring> {
    /// Inside score per node, indexed by [`cicada_core::NodeId::index`].
    pub inside: Vec<S>,
    /// Outside score per node, indexed by [`cicada_core::NodeId::index`].
    pub outside: Vec<S>,
}

/// Computes [`InsideOutside`] scores for every node in `graph`.
pub fn inside_outside<S: Semiring>(
    graph: &Hypergraph,
    function: &dyn FeatureFunction<S>,
) -> InsideOutside<S> {
    let n = graph.node_count();
    let mut inside = vec![S::zero(); n];

    for idx in 0..n {
        let node_id = cicada_core::NodeId::from_raw(idx as u32);
        let node = graph.node(node_id).expect("idx is in range");
        let mut total = S::zero();
        for &edge_id in node.incoming_edges() {
            let edge = graph.edge(edge_id).expect("incoming_edges are in range");
            let mut product = S::one();
            for &tail in edge.tails() {
                product = product.times(inside[tail.index()]);
            }
            let weight = function.evaluate(&edge.features);
            total = total.plus(product.times(weight));
        }
        inside[idx] = total;
    }

    let mut outside = vec![S::zero(); n];
    if graph.is_valid() {
        outside[graph.goal().index()] = S::one();
    }
    for idx in (0..n).rev() {
        let node_id = cicada_core::NodeId::from_raw(idx as u32);
        let node = graph.node(node_id).expect("idx is in range");
        let node_outside = outside[idx];
        for &edge_id in node.incoming_edges() {
            let edge = graph.edge(edge_id).expect("incoming_edges are in range");
            let weight = function.evaluate(&edge.features);
            let tails = edge.tails();
            for i in 0..tails.len() {
                let mut product = node_outside.times(weight);
                for (j, &t) in tails.iter().enumerate() {
                    if j != i {
                        product = product.times(inside[t.index()]);
                    }
                }
                let tail_idx = tails[i].index();
                outside[tail_idx] = outside[tail_idx].plus(product);
            }
        }
    }

    InsideOutside { inside, outside }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cicada_core::{Symbol, Tropical, Vocab};
    use cicada_vector::{AttributeVector, FeatureId, FeatureVector, LinearTropical};

    use crate::rule::Rule;

    #[test]
    fn inside_outside_agree_at_the_goal() {
        Vocab::reset();
        let mut graph = Hypergraph::new();
        let leaf = graph.add_node();
        let mut fv = FeatureVector::new();
        fv.set(FeatureId::intern("w"), 2.0);
        let leaf_rule = Rule::monolingual(Symbol::intern("[X]"), vec![Symbol::intern("a")], fv, AttributeVector::new()).unwrap();
        let leaf_edge = graph.add_edge(&[], leaf_rule).unwrap();
        graph.connect_edge(leaf_edge, leaf).unwrap();

        let root = graph.add_node();
        let root_rule = Rule::monolingual(
            Symbol::intern("[S]"),
            vec![Symbol::intern("[X]").with_index(Some(1))],
            FeatureVector::new(),
            AttributeVector::new(),
        )
        .unwrap();
        let root_edge = graph.add_edge(&[leaf], root_rule).unwrap();
        graph.connect_edge(root_edge, root).unwrap();
        graph.set_goal(root);

        let mut function = LinearTropical::new();
        function.set_weight(FeatureId::intern("w"), 1.0);

        let scores = inside_outside::<Tropical>(&graph, &function);
        assert_eq!(scores.outside[root.index()].value(), 0.0);
        assert_eq!(scores.inside[root.index()].value(), 2.0);
        assert_eq!(scores.inside[leaf.index()].value(), 2.0);
        assert_eq!(scores.outside[leaf.index()].value(), 0.0);
    }
}
