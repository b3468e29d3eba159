//! Bracketed tree-rule fragments (spec §6/§8) and `compose_tree`: a composer
//! that pattern-matches pre-parsed tree fragments rather than a flat lattice
//! grammar.
//!
//! A fragment such as `(A (B x) (C y))` is a fully instantiated derivation
//! step: `A` rewrites through two antecedents, `B` (itself rewriting to the
//! terminal `x`) and `C` (rewriting to `y`). `flatten_rules` walks a fragment
//! and emits one monolingual [`Rule`] per `Sub` node encountered — the same
//! flat `lhs -> source` shape [`crate::chart::compose_chart`] already
//! understands — so `compose_tree` can reuse that engine instead of a
//! parallel pattern-matcher.

use std::iter::Peekable;
use std::str::Chars;

use cicada_core::{CicadaError, Symbol};
use cicada_graph::{Hypergraph, Lattice, Rule};
use cicada_grammar::{Transducer, TrieGrammar};
use cicada_vector::{AttributeVector, FeatureVector};

use crate::chart::{compose_chart, ComposeFlags};

/// One child of a [`TreeFragment`]: either a terminal leaf or a nested
/// fragment with its own lhs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeNode {
    /// A terminal leaf.
    Terminal(Symbol),
    /// A nested fragment, itself rewriting some antecedent non-terminal.
    Sub(TreeFragment),
}

/// A parsed bracketed tree rule, e.g. `(A (B x) (C y))`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeFragment {
    /// The fragment's root label.
    pub lhs: Symbol,
    /// Ordered children, pre-order.
    pub children: Vec<TreeNode>,
}

impl TreeFragment {
    /// The immediate `Sub` children, paired with their lhs — the
    /// "antecedents" named in spec §8's round-trip law.
    pub fn antecedents(&self) -> Vec<(Symbol, &TreeFragment)> {
        self.children
            .iter()
            .filter_map(|child| match child {
                TreeNode::Sub(frag) => Some((frag.lhs, frag)),
                TreeNode::Terminal(_) => None,
            })
            .collect()
    }

    /// Flattens this fragment (and every nested fragment) into one
    /// monolingual [`Rule`] per `Sub` node, pre-order. The top-level
    /// fragment's rule is `rules[0]`.
    pub fn flatten_rules(&self) -> Result<Vec<Rule>, CicadaError> {
        let mut out = Vec::new();
        self.flatten_into(&mut out)?;
        Ok(out)
    }

    fn flatten_into(&self, out: &mut Vec<Rule>) -> Result<(), CicadaError> {
        let mut source = Vec::with_capacity(self.children.len());
        let mut next_index = 1u32;
        for child in &self.children {
            match child {
                TreeNode::Terminal(symbol) => source.push(*symbol),
                TreeNode::Sub(frag) => {
                    source.push(frag.lhs.with_index(Some(next_index)));
                    next_index += 1;
                }
            }
        }
        let rule = Rule::monolingual(self.lhs, source, FeatureVector::new(), AttributeVector::new())?;
        out.push(rule);
        for child in &self.children {
            if let TreeNode::Sub(frag) = child {
                frag.flatten_into(out)?;
            }
        }
        Ok(())
    }
}

/// Parses a bracketed tree rule, e.g. `(A (B x) (C y))`. Escapes `\\`, `\(`,
/// `\)` are unescaped inside labels and terminals.
pub fn parse_tree_text(text: &str) -> Result<TreeFragment, CicadaError> {
    let mut chars = text.trim().chars().peekable();
    let fragment = parse_fragment(&mut chars)?;
    skip_ws(&mut chars);
    if chars.next().is_some() {
        return Err(CicadaError::malformed_input(
            "tree-rule-trailing-data",
            "tree rule text has trailing data after the closing fragment",
        ));
    }
    Ok(fragment)
}

/// Renders a fragment back to bracketed text, pre-order, escaping `\\`, `\(`,
/// `\)` in every label/terminal.
pub fn render_tree_text(fragment: &TreeFragment) -> String {
    let mut out = String::new();
    render_into(fragment, &mut out);
    out
}

fn render_into(fragment: &TreeFragment, out: &mut String) {
    out.push('(');
    out.push_str(&escape_token(&fragment.lhs.text()));
    for child in &fragment.children {
        out.push(' ');
        match child {
            TreeNode::Terminal(symbol) => out.push_str(&escape_token(&symbol.text())),
            TreeNode::Sub(frag) => render_into(frag, out),
        }
    }
    out.push(')');
}

fn escape_token(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if ch == '\\' || ch == '(' || ch == ')' {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

fn skip_ws(chars: &mut Peekable<Chars<'_>>) {
    while matches!(chars.peek(), Some(c) if c.is_whitespace()) {
        chars.next();
    }
}

fn parse_fragment(chars: &mut Peekable<Chars<'_>>) -> Result<TreeFragment, CicadaError> {
    skip_ws(chars);
    match chars.next() {
        Some('(') => {}
        _ => {
            return Err(CicadaError::malformed_input(
                "tree-rule-expected-open-paren",
                "expected '(' to start a tree fragment",
            ))
        }
    }
    skip_ws(chars);
    let label = parse_token(chars)?;
    let mut children = Vec::new();
    loop {
        skip_ws(chars);
        match chars.peek() {
            Some(')') => {
                chars.next();
                break;
            }
            Some('(') => children.push(TreeNode::Sub(parse_fragment(chars)?)),
            Some(_) => children.push(TreeNode::Terminal(Symbol::intern(&parse_token(chars)?))),
            None => {
                return Err(CicadaError::malformed_input(
                    "tree-rule-unterminated",
                    "tree fragment is missing its closing ')'",
                ))
            }
        }
    }
    Ok(TreeFragment {
        lhs: Symbol::intern(&label),
        children,
    })
}

fn parse_token(chars: &mut Peekable<Chars<'_>>) -> Result<String, CicadaError> {
    let mut out = String::new();
    loop {
        match chars.peek() {
            None => break,
            Some(c) if c.is_whitespace() || *c == '(' || *c == ')' => break,
            Some('\\') => {
                chars.next();
                match chars.next() {
                    Some(escaped) => out.push(escaped),
                    None => {
                        return Err(CicadaError::malformed_input(
                            "tree-rule-dangling-escape",
                            "tree rule text ends with a dangling '\\'",
                        ))
                    }
                }
            }
            Some(c) => {
                out.push(*c);
                chars.next();
            }
        }
    }
    if out.is_empty() {
        return Err(CicadaError::malformed_input(
            "tree-rule-empty-token",
            "tree rule text contains an empty label or terminal",
        ));
    }
    Ok(out)
}

/// Composes a hypergraph from `lattice`, matching the flattened rule set of
/// every `fragment` bottom-up (spec §4.2 variant).
pub fn compose_tree(
    goal: Symbol,
    fragments: &[TreeFragment],
    lattice: &Lattice,
    flags: &ComposeFlags,
) -> Result<Hypergraph, CicadaError> {
    let mut grammar = TrieGrammar::new();
    for fragment in fragments {
        for rule in fragment.flatten_rules()? {
            grammar.insert(rule);
        }
    }
    let transducer: &dyn Transducer = &grammar;
    compose_chart(goal, &[transducer], lattice, flags)
}
