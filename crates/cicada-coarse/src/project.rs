//! The coarsening projection between adjacent grammar levels (spec §4.4):
//! "bit-level for i>2, binarized vs non-binarized collapse for i=2".

use cicada_core::Symbol;

/// Projects `lhs` into the coarse label space compared against pass `level -
/// 1`'s scores when gating pass `level`'s completions. `level` is the 1-based
/// index of the grammar about to run (`2..=n`); level 1 (the coarsest
/// grammar) is never gated and has no projection.
pub fn project(level: usize, lhs: Symbol) -> Symbol {
    if level <= 2 {
        collapse_binarized(lhs)
    } else {
        lhs.coarse(bits_for_level(level))
    }
}

/// Wider buckets (fewer bits) for levels close to the coarse end, narrower
/// buckets as levels approach the finest grammar — never wide enough to
/// stop distinguishing labels entirely.
fn bits_for_level(level: usize) -> u32 {
    (4 + 2 * (level - 2) as u32).min(24)
}

/// Collapses away the binarization marker and any index suffix, so `[X]`,
/// `[X^]`, `[X,2]` and `[X^,2]` all project to the same `[X]` bucket.
fn collapse_binarized(lhs: Symbol) -> Symbol {
    if !lhs.is_non_terminal() {
        return lhs;
    }
    let bare = lhs.non_terminal();
    if !bare.binarized() {
        return bare;
    }
    let text = bare.text();
    let stripped = text.replacen("^]", "]", 1);
    Symbol::intern(&stripped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cicada_core::Vocab;

    #[test]
    fn binarized_marker_collapses_at_level_two() {
        Vocab::reset();
        let plain = Symbol::intern("[X]");
        let binarized = Symbol::intern("[X^]");
        let indexed = Symbol::intern("[X^,2]");
        assert_eq!(project(2, plain), project(2, binarized));
        assert_eq!(project(2, plain), project(2, indexed));
    }

    #[test]
    fn bit_level_projection_is_deterministic_past_level_two() {
        Vocab::reset();
        let x = Symbol::intern("[X]");
        assert_eq!(project(3, x), project(3, x));
    }

    #[test]
    fn terminals_pass_through_unprojected() {
        Vocab::reset();
        let a = Symbol::intern("a");
        assert_eq!(project(2, a), a);
        assert_eq!(project(5, a), a);
    }
}
