//! Synchronous rewrite rules (spec §3): `(lhs, source, target, features, attributes, arity)`.

use cicada_core::{CicadaError, Symbol};
use cicada_vector::{AttributeVector, FeatureVector};
use serde::{Deserialize, Serialize};

/// A synchronous (or monolingual, when `target` is empty) rewrite rule.
///
/// Invariants, enforced by [`Rule::new`]:
/// - every non-terminal in `source` carries a 1-based index;
/// - if `target` is non-empty, its multiset of non-terminal indices equals
///   `source`'s;
/// - `arity` equals the count of non-terminals on each side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// Left-hand-side non-terminal.
    pub lhs: Symbol,
    /// Source-side right-hand-side (terminals and indexed non-terminals).
    pub source: Vec<Symbol>,
    /// Target-side right-hand-side; empty for monolingual/parse rules.
    pub target: Vec<Symbol>,
    /// Per-rule sparse feature weights.
    pub features: FeatureVector,
    /// Per-rule tagged attributes.
    pub attributes: AttributeVector,
    /// Number of non-terminals on each side.
    pub arity: u32,
}

fn non_terminal_indices(rhs: &[Symbol]) -> Result<Vec<u32>, CicadaError> {
    let mut indices = Vec::new();
    let mut next_implicit = 1u32;
    for symbol in rhs {
        if symbol.is_non_terminal() {
            let idx = symbol.index().unwrap_or(next_implicit);
            next_implicit += 1;
            if idx == 0 {
                return Err(CicadaError::malformed_input(
                    "rule-index-zero",
                    "non-terminal index must be 1-based",
                ));
            }
            indices.push(idx);
        }
    }
    Ok(indices)
}

fn multiset_equal(a: &[u32], b: &[u32]) -> bool {
    let mut a = a.to_vec();
    let mut b = b.to_vec();
    a.sort_unstable();
    b.sort_unstable();
    a == b
}

impl Rule {
    /// Constructs a rule, validating the arity/index invariants from spec §3.
    pub fn new(
        lhs: Symbol,
        source: Vec<Symbol>,
        target: Vec<Symbol>,
        features: FeatureVector,
        attributes: AttributeVector,
    ) -> Result<Self, CicadaError> {
        let source_indices = non_terminal_indices(&source)?;
        let arity = source_indices.len() as u32;
        if !target.is_empty() {
            let target_indices = non_terminal_indices(&target)?;
            if target_indices.len() as u32 != arity {
                return Err(CicadaError::malformed_input(
                    "rule-arity-mismatch",
                    "target arity does not match source arity",
                ));
            }
            if !multiset_equal(&source_indices, &target_indices) {
                return Err(CicadaError::malformed_input(
                    "rule-index-multiset-mismatch",
                    "target non-terminal indices do not match source's",
                ));
            }
        }
        Ok(Rule {
            lhs,
            source,
            target,
            features,
            attributes,
            arity,
        })
    }

    /// Constructs a monolingual rule with an empty target side (pure parsing
    /// grammars, e.g. the CKY composer's default mode).
    pub fn monolingual(
        lhs: Symbol,
        source: Vec<Symbol>,
        features: FeatureVector,
        attributes: AttributeVector,
    ) -> Result<Self, CicadaError> {
        Self::new(lhs, source, Vec::new(), features, attributes)
    }

    /// Reorders `source`'s non-terminal index suffixes into rank order
    /// (`1..=arity` by position) and remaps `target`'s indices to match.
    pub fn sort_source_index(&mut self) {
        if self.arity <= 1 || self.target.is_empty() {
            return;
        }
        let mut index_map = vec![0u32; self.arity as usize + 1];
        let mut pos = 1u32;
        for symbol in &mut self.source {
            if symbol.is_non_terminal() {
                let original = symbol.index().unwrap_or(pos);
                index_map[original as usize] = pos;
                *symbol = symbol.with_index(Some(pos));
                pos += 1;
            }
        }
        pos = 1;
        for symbol in &mut self.target {
            if symbol.is_non_terminal() {
                let original = symbol.index().unwrap_or(pos);
                *symbol = symbol.with_index(Some(index_map[original as usize]));
                pos += 1;
            }
        }
    }

    /// Renders this rule in the spec §6 text format:
    /// `LHS ||| source_symbols ||| target_symbols [||| key=value ...]`.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        out.push_str(&self.lhs.to_string());
        out.push_str(" ||| ");
        out.push_str(&render_symbols(&self.source));
        out.push_str(" ||| ");
        out.push_str(&render_symbols(&self.target));
        for (key, value) in self.features.iter() {
            out.push_str(&format!(" {key}={value}"));
        }
        out
    }
}

fn render_symbols(symbols: &[Symbol]) -> String {
    symbols
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parses the spec §6 rule text format:
/// `LHS ||| source_symbols ||| target_symbols [||| key=value ...]`.
/// `LHS` is optional and defaults to `[X]`.
pub fn parse_rule_text(text: &str) -> Result<Rule, CicadaError> {
    let fields: Vec<&str> = text.split("|||").map(|s| s.trim()).collect();
    if fields.len() < 2 {
        return Err(CicadaError::malformed_input(
            "rule-text-fields",
            "rule text requires at least source and target fields",
        ));
    }

    // Determine whether the first field is an LHS (bracketed, single token)
    // or the start of the source phrase.
    let (lhs_text, rest): (&str, &[&str]) = if fields.len() >= 3
        && fields[0].starts_with('[')
        && fields[0].ends_with(']')
        && !fields[0].contains(' ')
    {
        (fields[0], &fields[1..])
    } else {
        ("[X]", &fields[..])
    };
    if rest.len() < 2 {
        return Err(CicadaError::malformed_input(
            "rule-text-fields",
            "rule text requires source and target fields",
        ));
    }

    let lhs = Symbol::intern(lhs_text);
    let source = parse_symbols(rest[0]);
    let target = parse_symbols(rest[1]);
    let mut features = FeatureVector::new();
    if let Some(score_field) = rest.get(2) {
        for token in score_field.split_whitespace() {
            let Some((key, value)) = token.split_once('=') else {
                return Err(CicadaError::malformed_input(
                    "rule-text-score",
                    format!("malformed key=value feature token: {token}"),
                ));
            };
            let value: f64 = value.parse().map_err(|_| {
                CicadaError::malformed_input(
                    "rule-text-score-value",
                    format!("non-numeric feature value: {value}"),
                )
            })?;
            features.set(cicada_vector::FeatureId::intern(key), value);
        }
    }
    Rule::new(lhs, source, target, features, AttributeVector::new())
}

fn parse_symbols(phrase: &str) -> Vec<Symbol> {
    phrase
        .split_whitespace()
        .map(Symbol::intern)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cicada_core::Vocab;

    #[test]
    fn monolingual_rule_computes_arity() {
        Vocab::reset();
        let lhs = Symbol::intern("[S]");
        let source = vec![Symbol::intern("[X,1]"), Symbol::intern("[X,2]")];
        let rule = Rule::monolingual(lhs, source, FeatureVector::new(), AttributeVector::new())
            .unwrap();
        assert_eq!(rule.arity, 2);
    }

    #[test]
    fn mismatched_target_indices_rejected() {
        Vocab::reset();
        let lhs = Symbol::intern("[S]");
        let source = vec![Symbol::intern("[X,1]"), Symbol::intern("[Y,2]")];
        let target = vec![Symbol::intern("[Y,2]"), Symbol::intern("[Y,2]")];
        let err = Rule::new(
            lhs,
            source,
            target,
            FeatureVector::new(),
            AttributeVector::new(),
        )
        .unwrap_err();
        assert_eq!(err.info().code, "rule-index-multiset-mismatch");
    }

    #[test]
    fn text_round_trip() {
        Vocab::reset();
        let text = "[S] ||| a b ||| x y ||| weight=1.5";
        let rule = parse_rule_text(text).unwrap();
        assert_eq!(rule.lhs.to_string(), "[S]");
        assert_eq!(rule.source.len(), 2);
        let rendered = rule.to_text();
        let reparsed = parse_rule_text(&rendered).unwrap();
        assert_eq!(reparsed.source, rule.source);
        assert_eq!(reparsed.target, rule.target);
    }

    #[test]
    fn default_lhs_is_x() {
        Vocab::reset();
        let rule = parse_rule_text("a ||| x").unwrap();
        assert_eq!(rule.lhs.to_string(), "[X]");
    }
}
