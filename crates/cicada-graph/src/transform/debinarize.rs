//! Generalized non-terminal splicing and debinarization (spec §4.1, scenario
//! "Debinarize cross-product"), grounded on the cross-product substitution
//! algorithm in `cicada/debinarize.hpp`: a node whose label satisfies a
//! predicate is spliced out of the graph by inlining each of its incoming
//! edges' right-hand sides into every edge that used the node as a tail,
//! taking the cross product of alternatives and summing features.
//!
//! Scope: splicing rewrites the `source` side (and, correspondingly, tails);
//! synchronous rules with a non-empty `target` are passed through unchanged
//! rather than spliced, since target-side index translation across a
//! cross-product is out of scope here — debinarization is run over
//! monolingual derivation/parse forests, which is its sole use upstream.

use cicada_core::{CicadaError, NodeId, Symbol};

use crate::hypergraph::{Edge, Hypergraph};
use crate::rule::Rule;

/// Splices every node whose first incoming edge's rule LHS satisfies
/// `predicate` out of the graph, taking the cross product of each spliced
/// node's alternative derivations against every edge that consumes it.
///
/// If no node matches `predicate`, returns a clone of `graph` unchanged.
pub fn remove_non_terminal(
    graph: &Hypergraph,
    predicate: impl Fn(Symbol) -> bool,
) -> Result<Hypergraph, CicadaError> {
    if !graph.is_valid() {
        return Ok(graph.clone());
    }

    let n = graph.node_count();
    let mut splice = vec![false; n];
    for node_id in graph.node_ids() {
        if let Some(&first_edge) = graph.node_unchecked(node_id).incoming_edges().first() {
            let lhs = graph.edge_unchecked(first_edge).rule.lhs;
            splice[node_id.index()] = predicate(lhs);
        }
    }
    if !splice.iter().any(|&b| b) {
        return Ok(graph.clone());
    }

    let mut out = Hypergraph::new();
    for _ in 0..n {
        out.add_node();
    }
    out.set_goal(graph.goal());

    for node_id in graph.node_ids() {
        for &edge_id in graph.node_unchecked(node_id).incoming_edges() {
            let edge = graph.edge_unchecked(edge_id);
            if !edge.rule.target.is_empty() {
                copy_edge_unspliced(&mut out, edge, node_id)?;
                continue;
            }

            let any_spliced = edge.tails().iter().any(|t| splice[t.index()]);
            if !any_spliced {
                copy_edge_unspliced(&mut out, edge, node_id)?;
                continue;
            }

            splice_edge(graph, &splice, edge, node_id, &mut out)?;
        }
    }

    Ok(out)
}

/// Strips the `^` marker: `X^` splices, every other label passes through.
pub fn debinarize(graph: &Hypergraph) -> Result<Hypergraph, CicadaError> {
    remove_non_terminal(graph, |lhs| lhs.binarized())
}

fn copy_edge_unspliced(out: &mut Hypergraph, edge: &Edge, head: NodeId) -> Result<(), CicadaError> {
    let new_edge_id = out.add_edge(edge.tails(), edge.rule.clone())?;
    let new_edge = out.edge_mut(new_edge_id)?;
    new_edge.features = edge.features.clone();
    new_edge.attributes = edge.attributes.clone();
    out.connect_edge(new_edge_id, head)
}

/// For `antecedent_index`, which element of `source` counted only over
/// non-terminal occurrences it denotes: the explicit index suffix if
/// present, else its left-to-right occurrence position (both 1-based).
fn antecedent_index(symbol: Symbol, occurrence: u32) -> usize {
    symbol.index().unwrap_or(occurrence) as usize - 1
}

/// Enumerates the cross product of alternatives at each spliced tail
/// position of `edge`, emitting one new edge per valid combination.
fn splice_edge(
    graph: &Hypergraph,
    splice: &[bool],
    edge: &Edge,
    head: NodeId,
    out: &mut Hypergraph,
) -> Result<(), CicadaError> {
    let arity = edge.tails().len();
    let mut j_ends = vec![1usize; arity];
    for (i, &tail) in edge.tails().iter().enumerate() {
        if splice[tail.index()] {
            j_ends[i] = graph.node_unchecked(tail).incoming_edges().len().max(1);
        }
    }

    let mut j = vec![0usize; arity];
    loop {
        if let Some((new_source, new_tails, features)) = expand_once(graph, splice, edge, &j)? {
            let rule = Rule::monolingual(edge.rule.lhs, new_source, features, edge.attributes.clone())?;
            let new_edge_id = out.add_edge(&new_tails, rule)?;
            out.connect_edge(new_edge_id, head)?;
        }

        let mut carry = true;
        for i in 0..arity {
            if j_ends[i] <= 1 {
                continue;
            }
            j[i] += 1;
            if j[i] < j_ends[i] {
                carry = false;
                break;
            }
            j[i] = 0;
        }
        if carry {
            break;
        }
    }
    Ok(())
}

/// Builds one member of the cross product: for each spliced tail position,
/// picks its `j[i]`-th alternative edge and inlines that edge's source RHS
/// in place of the occurrence. Returns `None` if the chosen alternative
/// itself has a spliced tail (a chain deeper than one level, left for a
/// subsequent pass rather than risked here).
fn expand_once(
    graph: &Hypergraph,
    splice: &[bool],
    edge: &Edge,
    j: &[usize],
) -> Result<Option<(Vec<Symbol>, Vec<NodeId>, cicada_vector::FeatureVector)>, CicadaError> {
    let mut new_source = Vec::new();
    let mut new_tails = Vec::new();
    let mut features = edge.features.clone();
    let mut occurrence = 0u32;
    let mut out_pos = 1u32;

    for &symbol in &edge.rule.source {
        if symbol.is_terminal() {
            new_source.push(symbol);
            continue;
        }
        occurrence += 1;
        let idx = antecedent_index(symbol, occurrence);
        let tail = edge.tails()[idx];

        if !splice[tail.index()] {
            new_tails.push(tail);
            new_source.push(symbol.non_terminal().with_index(Some(out_pos)));
            out_pos += 1;
            continue;
        }

        let alternatives = graph.node_unchecked(tail).incoming_edges();
        let chosen_id = alternatives[j[idx] % alternatives.len().max(1)];
        let chosen = graph.edge_unchecked(chosen_id);

        if chosen.tails().iter().any(|t| splice[t.index()]) {
            return Ok(None);
        }

        features += &chosen.features;
        let mut inner_occurrence = 0u32;
        for &inner_symbol in &chosen.rule.source {
            if inner_symbol.is_terminal() {
                new_source.push(inner_symbol);
                continue;
            }
            inner_occurrence += 1;
            let inner_idx = antecedent_index(inner_symbol, inner_occurrence);
            new_tails.push(chosen.tails()[inner_idx]);
            new_source.push(inner_symbol.non_terminal().with_index(Some(out_pos)));
            out_pos += 1;
        }
    }

    Ok(Some((new_source, new_tails, features)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cicada_core::Vocab;
    use cicada_vector::{AttributeVector, FeatureId, FeatureVector};

    fn rule(lhs: &str, source: Vec<Symbol>, features: FeatureVector) -> Rule {
        Rule::monolingual(Symbol::intern(lhs), source, features, AttributeVector::new()).unwrap()
    }

    #[test]
    fn debinarize_takes_cross_product_of_alternatives() {
        Vocab::reset();
        let mut graph = Hypergraph::new();
        let bin = graph.add_node(); // [X^]: two alternative expansions
        let root = graph.add_node();

        let mut f1 = FeatureVector::new();
        f1.set(FeatureId::intern("w"), 1.0);
        let e1 = graph
            .add_edge(&[], rule("[X^]", vec![Symbol::intern("a")], f1))
            .unwrap();
        graph.connect_edge(e1, bin).unwrap();

        let mut f2 = FeatureVector::new();
        f2.set(FeatureId::intern("w"), 2.0);
        let e2 = graph
            .add_edge(&[], rule("[X^]", vec![Symbol::intern("b")], f2))
            .unwrap();
        graph.connect_edge(e2, bin).unwrap();

        // Three edges use the binarized node as a tail.
        for _ in 0..3 {
            let root_edge = graph
                .add_edge(&[bin], rule("[S]", vec![Symbol::intern("[X^,1]")], FeatureVector::new()))
                .unwrap();
            graph.connect_edge(root_edge, root).unwrap();
        }
        graph.set_goal(root);

        let debinarized = debinarize(&graph).unwrap();
        let root_node = debinarized.node(root).unwrap();
        // 2 alternatives x 3 consuming edges = 6.
        assert_eq!(root_node.incoming_edges().len(), 6);
        for &edge_id in root_node.incoming_edges() {
            let e = debinarized.edge(edge_id).unwrap();
            assert!(e.tails().is_empty());
            assert!(e.rule.source == vec![Symbol::intern("a")] || e.rule.source == vec![Symbol::intern("b")]);
        }
    }

    #[test]
    fn graphs_with_no_binarized_nodes_are_returned_unchanged() {
        Vocab::reset();
        let mut graph = Hypergraph::new();
        let leaf = graph.add_node();
        let leaf_edge = graph
            .add_edge(&[], rule("[X]", vec![Symbol::intern("a")], FeatureVector::new()))
            .unwrap();
        graph.connect_edge(leaf_edge, leaf).unwrap();
        graph.set_goal(leaf);

        let out = debinarize(&graph).unwrap();
        assert_eq!(out.node_count(), graph.node_count());
        assert_eq!(out.edge_count(), graph.edge_count());
    }
}
