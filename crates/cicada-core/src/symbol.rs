//! Interned terminal/non-terminal symbols (spec §3, component C1).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::vocab::Vocab;

/// A terminal or non-terminal symbol.
///
/// Non-terminals are written in bracketed form, e.g. `[X]`. An index suffix
/// `[X,2]` binds the symbol to the second non-terminal slot of a rule's RHS.
/// A symbol introduced by grammar binarization carries a trailing `^` just
/// before the closing bracket, e.g. `[X^]` or `[X^,2]` — this convention is
/// confirmed by `original_source/cicada/debinarize.hpp`'s comment about
/// "stripping off the `^` from syntactic categories".
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Symbol(u32);

#[derive(Debug, Clone, PartialEq, Eq)]
struct Parsed<'a> {
    non_terminal: bool,
    base: &'a str,
    index: Option<u32>,
    binarized: bool,
}

fn parse(raw: &str) -> Parsed<'_> {
    let Some(inner) = raw.strip_prefix('[').and_then(|s| s.strip_suffix(']')) else {
        return Parsed {
            non_terminal: false,
            base: raw,
            index: None,
            binarized: false,
        };
    };
    let (base_part, index) = match inner.rsplit_once(',') {
        Some((base, idx)) if idx.chars().all(|c| c.is_ascii_digit()) && !idx.is_empty() => {
            (base, idx.parse::<u32>().ok())
        }
        _ => (inner, None),
    };
    let (base, binarized) = match base_part.strip_suffix('^') {
        Some(stripped) => (stripped, true),
        None => (base_part, false),
    };
    Parsed {
        non_terminal: true,
        base,
        index,
        binarized,
    }
}

impl Symbol {
    /// Epsilon: the distinguished empty terminal consumed by `remove_epsilon`.
    pub const EPSILON_TEXT: &'static str = "<epsilon>";

    /// Interns `text` (e.g. `"a"`, `"[X]"`, `"[X,2]"`) and returns its symbol.
    pub fn intern(text: &str) -> Self {
        Symbol(Vocab::intern(text))
    }

    /// Returns the raw interned text for this symbol.
    pub fn text(self) -> Box<str> {
        Vocab::resolve(self.0)
    }

    /// Returns the process-wide interned id backing this symbol.
    pub fn id(self) -> u32 {
        self.0
    }

    /// Reconstructs a symbol from a previously observed id. Callers must
    /// ensure the id was produced by [`Symbol::intern`] in this process.
    pub fn from_id(id: u32) -> Self {
        Symbol(id)
    }

    /// The distinguished epsilon terminal.
    pub fn epsilon() -> Self {
        Symbol::intern(Self::EPSILON_TEXT)
    }

    /// `true` if this is the distinguished epsilon terminal.
    pub fn is_epsilon(self) -> bool {
        self == Self::epsilon()
    }

    /// `true` if this symbol is a non-terminal (bracketed form).
    pub fn is_non_terminal(self) -> bool {
        let text = self.text();
        parse(&text).non_terminal
    }

    /// `true` if this symbol is a terminal (not bracketed).
    pub fn is_terminal(self) -> bool {
        !self.is_non_terminal()
    }

    /// The 1-based non-terminal index suffix, if present (`[X,2]` -> `Some(2)`).
    pub fn index(self) -> Option<u32> {
        let text = self.text();
        parse(&text).index
    }

    /// `true` if this symbol was introduced by rule binarization.
    pub fn binarized(self) -> bool {
        let text = self.text();
        parse(&text).binarized
    }

    /// Returns the same non-terminal with its index suffix replaced (or
    /// added, or removed when `index` is `None`).
    pub fn with_index(self, index: Option<u32>) -> Self {
        let text = self.text();
        let parsed = parse(&text);
        if !parsed.non_terminal {
            return self;
        }
        let caret = if parsed.binarized { "^" } else { "" };
        let rendered = match index {
            Some(i) => format!("[{}{},{}]", parsed.base, caret, i),
            None => format!("[{}{}]", parsed.base, caret),
        };
        Symbol::intern(&rendered)
    }

    /// Returns the non-terminal form of this symbol (index suffix removed,
    /// binarized marker preserved). Used when substituting a bare RHS symbol.
    pub fn non_terminal(self) -> Self {
        self.with_index(None)
    }

    /// Projects this symbol into a coarser equivalence class by truncating
    /// the interned base name to the low `bits` bits of a stable digest,
    /// producing a fresh coarse symbol `[base#<bucket>]`. Used by
    /// coarse-to-fine parsing (spec §4.4) to collapse fine labels.
    pub fn coarse(self, bits: u32) -> Self {
        let text = self.text();
        let parsed = parse(&text);
        if !parsed.non_terminal {
            return self;
        }
        let mut hash: u64 = 1469598103934665603;
        for byte in parsed.base.as_bytes() {
            hash ^= *byte as u64;
            hash = hash.wrapping_mul(1099511628211);
        }
        let mask = if bits >= 64 { u64::MAX } else { (1u64 << bits) - 1 };
        let bucket = hash & mask;
        Symbol::intern(&format!("[#{bucket}]"))
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({:?})", self.text())
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocab::Vocab;

    #[test]
    fn terminal_vs_non_terminal() {
        Vocab::reset();
        let a = Symbol::intern("a");
        let x = Symbol::intern("[X]");
        assert!(a.is_terminal());
        assert!(x.is_non_terminal());
    }

    #[test]
    fn index_suffix_round_trips() {
        Vocab::reset();
        let x2 = Symbol::intern("[X,2]");
        assert_eq!(x2.index(), Some(2));
        assert_eq!(x2.non_terminal().text().as_ref(), "[X]");
    }

    #[test]
    fn binarized_marker_detected() {
        Vocab::reset();
        let bin = Symbol::intern("[X^]");
        assert!(bin.binarized());
        let bin_idx = Symbol::intern("[X^,1]");
        assert!(bin_idx.binarized());
        assert_eq!(bin_idx.index(), Some(1));
    }

    #[test]
    fn coarse_projection_is_deterministic() {
        Vocab::reset();
        let x = Symbol::intern("[X]");
        assert_eq!(x.coarse(4), x.coarse(4));
    }
}
