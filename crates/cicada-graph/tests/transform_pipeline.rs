use cicada_core::{Symbol, Vocab};
use cicada_graph::{debinarize, remove_epsilon, topologically_sort, Hypergraph, Rule};
use cicada_vector::{AttributeVector, FeatureId, FeatureVector};

fn leaf(lhs: &str, token: &str) -> Rule {
    Rule::monolingual(
        Symbol::intern(lhs),
        vec![Symbol::intern(token)],
        FeatureVector::new(),
        AttributeVector::new(),
    )
    .unwrap()
}

#[test]
fn epsilon_then_sort_then_debinarize_composes_cleanly() {
    Vocab::reset();
    let mut graph = Hypergraph::new();

    // B: two alternative spellings of the binarized tail.
    let bin = graph.add_node();
    let mut w1 = FeatureVector::new();
    w1.set(FeatureId::intern("w"), 0.5);
    let bin_edge_1 = graph.add_edge(&[], leaf("[X^]", "a")).unwrap();
    graph.edge_mut(bin_edge_1).unwrap().features = w1;
    graph.connect_edge(bin_edge_1, bin).unwrap();
    let bin_edge_2 = graph.add_edge(&[], leaf("[X^]", "b")).unwrap();
    graph.connect_edge(bin_edge_2, bin).unwrap();

    // C: reached from bin only via an epsilon pass-through edge.
    let via_eps = graph.add_node();
    let eps_rule = Rule::monolingual(
        Symbol::intern("[S]"),
        vec![Symbol::epsilon()],
        FeatureVector::new(),
        AttributeVector::new(),
    )
    .unwrap();
    let eps_edge = graph.add_edge(&[bin], eps_rule).unwrap();
    graph.connect_edge(eps_edge, via_eps).unwrap();

    let root = graph.add_node();
    let root_rule = Rule::monolingual(
        Symbol::intern("[S]"),
        vec![Symbol::intern("[X^,1]")],
        FeatureVector::new(),
        AttributeVector::new(),
    )
    .unwrap();
    let root_edge = graph.add_edge(&[via_eps], root_rule).unwrap();
    graph.connect_edge(root_edge, root).unwrap();
    graph.set_goal(root);

    let no_eps = remove_epsilon(&graph).unwrap();
    assert!(no_eps.is_valid());
    no_eps.check_invariants().unwrap();

    let sorted = topologically_sort(&no_eps);
    sorted.check_invariants().unwrap();
    for edge_id in sorted.edge_ids() {
        let edge = sorted.edge(edge_id).unwrap();
        for &tail in edge.tails() {
            assert!(tail.as_raw() < edge.head().as_raw());
        }
    }

    let final_graph = debinarize(&sorted).unwrap();
    final_graph.check_invariants().unwrap();
    assert!(final_graph.is_valid());
    let goal_node = final_graph.node(final_graph.goal()).unwrap();
    assert_eq!(goal_node.incoming_edges().len(), 2);
    for &edge_id in goal_node.incoming_edges() {
        let edge = final_graph.edge(edge_id).unwrap();
        assert!(edge.tails().is_empty());
        assert!(edge.rule.source == vec![Symbol::intern("a")] || edge.rule.source == vec![Symbol::intern("b")]);
    }
}
