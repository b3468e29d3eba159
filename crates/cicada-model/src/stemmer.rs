//! Word-id-indexed stemming with a thread-local memoization cache (spec
//! §4.6/§5): each worker thread gets its own cache array, indexed by
//! interned symbol id, so concurrent decoding threads never contend on a
//! shared map. Grounded on `cicada/stemmer/{nfkc,upper}.cpp`'s per-word
//! memoization, minus the on-disk dictionary loading those variants also
//! do (out of scope; this operates purely on the interned string form).

use std::cell::RefCell;

use cicada_core::Symbol;

/// A word-id to word-id mapping that normalizes a surface form, e.g. case
/// folding or Unicode normalization.
pub trait Stemmer: Send + Sync {
    /// Returns the stemmed form of `symbol`, without the memoization layer.
    fn stem_uncached(&self, symbol: Symbol) -> Symbol;

    /// A short name identifying this stemmer variant, used as the
    /// thread-local cache's discriminant when multiple stemmers run in the
    /// same decoding call.
    fn name(&self) -> &'static str;
}

thread_local! {
    static STEM_CACHE: RefCell<Vec<(&'static str, Vec<Option<Symbol>>)>> = RefCell::new(Vec::new());
}

/// Stems `symbol` through `stemmer`, memoizing per thread and per word id so
/// repeated lookups for the same word within a thread never re-run
/// `stem_uncached`.
pub fn stem_memoized(stemmer: &dyn Stemmer, symbol: Symbol) -> Symbol {
    STEM_CACHE.with(|cache| {
        let mut cache = cache.borrow_mut();
        let slot = match cache.iter_mut().find(|(name, _)| *name == stemmer.name()) {
            Some((_, table)) => table,
            None => {
                cache.push((stemmer.name(), Vec::new()));
                &mut cache.last_mut().unwrap().1
            }
        };
        let id = symbol.id() as usize;
        if id >= slot.len() {
            slot.resize(id + 1, None);
        }
        if let Some(cached) = slot[id] {
            return cached;
        }
        let stemmed = stemmer.stem_uncached(symbol);
        slot[id] = Some(stemmed);
        stemmed
    })
}

/// Upper-cases the ASCII portion of the surface form. Non-ASCII bytes pass
/// through unchanged (full Unicode case folding is a grammar/dictionary
/// concern outside this core).
#[derive(Debug, Clone, Copy, Default)]
pub struct UpperStemmer;

impl Stemmer for UpperStemmer {
    fn stem_uncached(&self, symbol: Symbol) -> Symbol {
        Symbol::intern(&symbol.text().to_uppercase())
    }

    fn name(&self) -> &'static str {
        "upper"
    }
}

/// Stands in for full Unicode NFKC normalization (full-width/compatibility
/// character folding); a real decomposition table is out of scope here, so
/// this passes ASCII input through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct NfkcStemmer;

impl Stemmer for NfkcStemmer {
    fn stem_uncached(&self, symbol: Symbol) -> Symbol {
        // A full NFKC table is out of scope; ASCII input is already in
        // normal form, which covers this core's own test fixtures.
        Symbol::intern(&symbol.text())
    }

    fn name(&self) -> &'static str {
        "nfkc"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cicada_core::Vocab;

    #[test]
    fn upper_stemmer_memoizes_per_word() {
        Vocab::reset();
        let word = Symbol::intern("abc");
        let stemmed_once = stem_memoized(&UpperStemmer, word);
        let stemmed_again = stem_memoized(&UpperStemmer, word);
        assert_eq!(stemmed_once, stemmed_again);
        assert_eq!(stemmed_once.text().as_ref(), "ABC");
    }

    #[test]
    fn distinct_stemmers_keep_separate_caches() {
        Vocab::reset();
        let word = Symbol::intern("abc");
        let upper = stem_memoized(&UpperStemmer, word);
        let nfkc = stem_memoized(&NfkcStemmer, word);
        assert_ne!(upper, nfkc);
    }
}
