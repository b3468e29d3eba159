//! Word id to cluster id lookup, with a thread-local cache that loads each
//! distinct source at most once per thread (spec §4.6/§5). Grounded on
//! `cicada/cluster.cpp`'s single-load-per-path semantics; the on-disk/text
//! loading format itself is out of scope (an opaque collaborator), so
//! entries are supplied directly as `(word, cluster)` pairs.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use cicada_core::Symbol;

/// An in-memory word-to-cluster table.
#[derive(Debug, Clone, Default)]
pub struct ClusterTable {
    clusters: HashMap<Symbol, Symbol>,
}

impl ClusterTable {
    /// Builds a table from `(word, cluster)` pairs.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (Symbol, Symbol)>) -> Self {
        Self {
            clusters: pairs.into_iter().collect(),
        }
    }

    /// Looks up the cluster for `word`, or `word` itself if unmapped
    /// (unknown words fall back to their own surface form, same as an
    /// unclustered vocabulary).
    pub fn lookup(&self, word: Symbol) -> Symbol {
        self.clusters.get(&word).copied().unwrap_or(word)
    }
}

thread_local! {
    static CLUSTER_CACHE: RefCell<HashMap<String, Rc<ClusterTable>>> = RefCell::new(HashMap::new());
}

/// Returns the cluster table registered under `source_id` for the current
/// thread, building it with `build` on first access and reusing it on every
/// subsequent call from the same thread — the "single load" guarantee.
pub fn cluster_table(source_id: &str, build: impl FnOnce() -> ClusterTable) -> Rc<ClusterTable> {
    CLUSTER_CACHE.with(|cache| {
        let mut cache = cache.borrow_mut();
        cache
            .entry(source_id.to_string())
            .or_insert_with(|| Rc::new(build()))
            .clone()
    })
}
