//! The shared active/passive chart engine behind `compose_cky` and
//! `compose_earley` (spec §4.2): bottom-up composition by increasing span
//! length, extending actives across a sub-split, consuming lattice arcs,
//! and completing items into the passive chart.

use cicada_core::{CicadaError, NodeId, StateId, Symbol};
use cicada_graph::{Hypergraph, Lattice};
use cicada_grammar::Transducer;
use cicada_vector::FeatureVector;

/// Flags threaded through every `compose_*` entry point (spec §6).
#[derive(Debug, Clone)]
pub struct ComposeFlags {
    /// `true` (default) to label the derivation by the rule's shared `lhs`
    /// using the source-side match; kept for interface parity with the
    /// original two-sided grammar (this crate's [`cicada_graph::Rule`] has a
    /// single shared `lhs` for both sides, so the flag does not change
    /// which label is used — only documented intent is preserved).
    pub yield_source: bool,
    /// Reserved for treebank-style bracketed output; unused by the chart
    /// engine itself (consumed only by `compose_tree`).
    pub treebank: bool,
    /// Reserved for POS-tag-based terminal matching; this crate's `Symbol`
    /// has no separate POS slot, so lattice arcs are matched on their plain
    /// label regardless of this flag.
    pub pos_mode: bool,
    /// When `true`, the goal is reached through a dedicated extra node
    /// joined to the completed `S`-labeled span by an epsilon edge (so a
    /// later `remove_epsilon` pass collapses it back). When `false`, the
    /// completed span's own node is used directly as the goal.
    pub unique_goal: bool,
    /// Maximum contiguous source-span width `compose_phrase` will build a
    /// constituent over; cells wider than this are never extended or
    /// completed, capping the longest phrase the composer can form. `None`
    /// (the default, used by `compose_cky`/`compose_earley`) leaves every
    /// span width reachable.
    pub distortion: Option<usize>,
}

impl Default for ComposeFlags {
    fn default() -> Self {
        Self {
            yield_source: true,
            treebank: false,
            pos_mode: false,
            unique_goal: false,
            distortion: None,
        }
    }
}

#[derive(Debug, Clone)]
struct ActiveItem {
    state: StateId,
    tails: Vec<NodeId>,
    pending: FeatureVector,
}

/// Triangular active chart for one transducer: `actives[i][j]` holds every
/// partial match that started at `i` and has consumed input up to `j`.
struct ActiveChart {
    cells: Vec<Vec<Vec<ActiveItem>>>,
}

impl ActiveChart {
    fn new(n: usize) -> Self {
        Self {
            cells: (0..=n).map(|_| (0..=n).map(|_| Vec::new()).collect()).collect(),
        }
    }
}

/// Triangular passive chart: `passive[i][j]` maps each completed lhs to the
/// single node representing all its alternative derivations over `[i, j)`.
struct PassiveChart {
    cells: Vec<Vec<std::collections::BTreeMap<Symbol, NodeId>>>,
}

impl PassiveChart {
    fn new(n: usize) -> Self {
        Self {
            cells: (0..=n)
                .map(|_| (0..=n).map(|_| std::collections::BTreeMap::new()).collect())
                .collect(),
        }
    }
}

/// The completed `(span, lhs) -> node` correspondence left over once chart
/// composition finishes, exposed for callers (coarse-to-fine pruning) that
/// need to know which node a given cell's label was assigned to.
pub struct SpanMap {
    cells: Vec<Vec<std::collections::BTreeMap<Symbol, NodeId>>>,
}

impl SpanMap {
    /// Every `(lhs, node)` pair completed over `[i, j)`.
    pub fn entries(&self, i: usize, j: usize) -> impl Iterator<Item = (Symbol, NodeId)> + '_ {
        self.cells[i][j].iter().map(|(&s, &n)| (s, n))
    }

    /// The node completed for `lhs` over `[i, j)`, if any.
    pub fn get(&self, i: usize, j: usize, lhs: Symbol) -> Option<NodeId> {
        self.cells[i][j].get(&lhs).copied()
    }
}

/// Runs the bottom-up chart composition algorithm (spec §4.2) over `lattice`
/// with `grammars`, producing a hypergraph rooted (if reachable) at `goal`.
pub fn compose_chart(
    goal: Symbol,
    grammars: &[&dyn Transducer],
    lattice: &Lattice,
    flags: &ComposeFlags,
) -> Result<Hypergraph, CicadaError> {
    let (graph, _spans) = compose_chart_filtered(goal, grammars, lattice, flags, &|_, _, _| true)?;
    Ok(graph)
}

/// As [`compose_chart`], but additionally gates every completion through
/// `allow(i, j, lhs)`: a `false` result means that label is never completed
/// over that span, so no edge reaches it and nothing built on top of it is
/// reachable either. Also returns the finished `(span, lhs) -> node`
/// correspondence (spec §4.4's coarse-to-fine pass needs both).
pub fn compose_chart_filtered(
    goal: Symbol,
    grammars: &[&dyn Transducer],
    lattice: &Lattice,
    flags: &ComposeFlags,
    allow: &dyn Fn(usize, usize, Symbol) -> bool,
) -> Result<(Hypergraph, SpanMap), CicadaError> {
    let n = lattice.len();
    let mut graph = Hypergraph::new();
    let mut passive = PassiveChart::new(n);
    let mut actives: Vec<ActiveChart> = grammars.iter().map(|_| ActiveChart::new(n)).collect();

    // Seed every position with a fresh, zero-progress active item per
    // transducer: "start a new match here".
    for i in 0..=n {
        for (t, grammar) in grammars.iter().enumerate() {
            actives[t].cells[i][i].push(ActiveItem {
                state: grammar.root(),
                tails: Vec::new(),
                pending: FeatureVector::new(),
            });
        }
    }

    for span in 1..=n {
        for i in 0..=(n - span) {
            let j = i + span;
            if let Some(limit) = flags.distortion {
                if span > limit {
                    continue;
                }
            }
            let distance = lattice.shortest_distance(i, j);
            tracing::trace!(i, j, span, "processing chart cell");

            // 1. Extend actives across every *proper* sub-split m (i < m < j),
            // combining an active that already reached m with a passive item
            // spanning [m, j) — both sides finalized in an earlier, smaller
            // span, so this step alone never self-references the cell it is
            // filling.
            for m in (i + 1)..j {
                let completions: Vec<(Symbol, NodeId)> =
                    passive.cells[m][j].iter().map(|(&s, &node)| (s, node)).collect();
                for (t, grammar) in grammars.iter().enumerate() {
                    let pending_items = actives[t].cells[i][m].clone();
                    for active in &pending_items {
                        for &(lhs, node) in &completions {
                            let next_state = grammar.next(active.state, lhs);
                            if next_state == grammar.root() {
                                continue;
                            }
                            let mut tails = active.tails.clone();
                            tails.push(node);
                            actives[t].cells[i][j].push(ActiveItem {
                                state: next_state,
                                tails,
                                pending: active.pending.clone(),
                            });
                        }
                    }
                }
            }

            // 2. Consume a single lattice arc spanning some sub-range ending at j.
            for m in i..j {
                let d = j - m;
                for arc in lattice.arcs_at(m) {
                    if arc.distance != d {
                        continue;
                    }
                    for (t, grammar) in grammars.iter().enumerate() {
                        let pending_items = actives[t].cells[i][m].clone();
                        for active in &pending_items {
                            let mut next_state = grammar.next(active.state, arc.label);
                            if next_state == grammar.root() {
                                // Fall back to an epsilon-labeled transition
                                // (spec §4.2 step 2) so a grammar that only
                                // matches via its own epsilon rules can still
                                // consume this arc.
                                next_state = grammar.next(active.state, Symbol::epsilon());
                            }
                            if next_state == grammar.root() {
                                continue;
                            }
                            let mut pending = active.pending.clone();
                            pending += &arc.features;
                            actives[t].cells[i][j].push(ActiveItem {
                                state: next_state,
                                tails: active.tails.clone(),
                                pending,
                            });
                        }
                    }
                }
            }

            // 3+4. Complete items into passive[i][j], then fold the whole
            // cell's own passive entries back into the zero-progress actives
            // seeded at [i][i] — the split at m = i, which the proper
            // sub-split loop above cannot express since it would need
            // passive[i][j] before this very cell has produced it. Closing
            // over this (a unary rule completing immediately re-enters the
            // loop) handles unary chains the same way.
            let mut active_cursor = vec![0usize; grammars.len()];
            let mut passive_done: std::collections::HashSet<Symbol> = std::collections::HashSet::new();
            loop {
                let mut changed = false;

                for (t, grammar) in grammars.iter().enumerate() {
                    if !grammar.valid_span(i, j, distance.unwrap_or(usize::MAX)) {
                        active_cursor[t] = actives[t].cells[i][j].len();
                        continue;
                    }
                    while active_cursor[t] < actives[t].cells[i][j].len() {
                        let active = actives[t].cells[i][j][active_cursor[t]].clone();
                        active_cursor[t] += 1;
                        for rule in grammar.rules(active.state) {
                            let lhs = rule.lhs;
                            if !allow(i, j, lhs) {
                                continue;
                            }
                            let node = *passive.cells[i][j]
                                .entry(lhs)
                                .or_insert_with(|| graph.add_node());
                            let edge_id = graph.add_edge(&active.tails, rule.clone())?;
                            {
                                let edge = graph.edge_mut(edge_id)?;
                                edge.features += &active.pending;
                            }
                            graph.connect_edge(edge_id, node)?;
                            tracing::debug!(i, j, lhs = lhs.id(), "completed nonterminal");
                            changed = true;
                        }
                    }
                }

                let new_completions: Vec<(Symbol, NodeId)> = passive.cells[i][j]
                    .iter()
                    .filter(|(s, _)| !passive_done.contains(s))
                    .map(|(&s, &node)| (s, node))
                    .collect();
                for &(lhs, _) in &new_completions {
                    passive_done.insert(lhs);
                }
                if !new_completions.is_empty() {
                    for (t, grammar) in grammars.iter().enumerate() {
                        let roots = actives[t].cells[i][i].clone();
                        for active in &roots {
                            for &(lhs, node) in &new_completions {
                                let next_state = grammar.next(active.state, lhs);
                                if next_state == grammar.root() {
                                    continue;
                                }
                                let mut tails = active.tails.clone();
                                tails.push(node);
                                actives[t].cells[i][j].push(ActiveItem {
                                    state: next_state,
                                    tails,
                                    pending: active.pending.clone(),
                                });
                                changed = true;
                            }
                        }
                    }
                }

                if !changed {
                    break;
                }
            }
        }
    }

    if let Some(&s_node) = passive.cells[0][n].get(&goal) {
        if flags.unique_goal {
            let goal_node = graph.add_node();
            let eps_rule = cicada_graph::Rule::monolingual(
                goal,
                vec![Symbol::epsilon()],
                FeatureVector::new(),
                cicada_vector::AttributeVector::new(),
            )?;
            let eps_edge = graph.add_edge(&[s_node], eps_rule)?;
            graph.connect_edge(eps_edge, goal_node)?;
            graph.set_goal(goal_node);
        } else {
            graph.set_goal(s_node);
        }
    } else {
        tracing::warn!(n, goal = goal.id(), "goal symbol unreachable after chart composition");
    }

    Ok((graph, SpanMap { cells: passive.cells }))
}
