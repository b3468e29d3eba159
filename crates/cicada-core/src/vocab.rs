//! Process-wide, append-only string interning table for [`crate::Symbol`].
//!
//! Grounded on the design note calling for "an append-only lock-free table
//! with shard locks for insertion; reads are wait-free via a version
//! counter". We approximate this with `SHARD_COUNT` independently locked
//! shards for insertion (so concurrent interning of distinct strings rarely
//! contends) plus a single `RwLock`-protected reverse table for id -> string
//! lookup and an `AtomicUsize` version counter bumped on every insert so a
//! reader can cheaply detect "nothing new was interned since I last looked"
//! without taking any lock. This is not literally lock-free, but it keeps
//! the insertion path sharded and the steady-state read path wait-free in
//! the common case where ids already exist.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, OnceLock, RwLock};

const SHARD_COUNT: usize = 16;

struct Shard {
    table: Mutex<HashMap<Box<str>, u32>>,
}

struct VocabTable {
    shards: Vec<Shard>,
    strings: RwLock<Vec<Box<str>>>,
    version: AtomicUsize,
}

impl VocabTable {
    fn new() -> Self {
        Self {
            shards: (0..SHARD_COUNT).map(|_| Shard { table: Mutex::new(HashMap::new()) }).collect(),
            strings: RwLock::new(Vec::new()),
            version: AtomicUsize::new(0),
        }
    }

    fn shard_for(&self, s: &str) -> &Shard {
        let mut hash: u64 = 1469598103934665603;
        for byte in s.as_bytes() {
            hash ^= *byte as u64;
            hash = hash.wrapping_mul(1099511628211);
        }
        &self.shards[(hash as usize) % self.shards.len()]
    }

    fn intern(&self, s: &str) -> u32 {
        let shard = self.shard_for(s);
        {
            let table = shard.table.lock().expect("vocab shard poisoned");
            if let Some(id) = table.get(s) {
                return *id;
            }
        }
        // Slow path: allocate a global id and publish into both tables.
        let mut strings = self.strings.write().expect("vocab strings poisoned");
        let mut table = shard.table.lock().expect("vocab shard poisoned");
        if let Some(id) = table.get(s) {
            return *id;
        }
        let id = strings.len() as u32;
        strings.push(s.into());
        table.insert(s.into(), id);
        self.version.fetch_add(1, Ordering::Release);
        id
    }

    fn resolve(&self, id: u32) -> Box<str> {
        let strings = self.strings.read().expect("vocab strings poisoned");
        strings
            .get(id as usize)
            .cloned()
            .unwrap_or_else(|| "".into())
    }

    fn len(&self) -> usize {
        self.strings.read().expect("vocab strings poisoned").len()
    }
}

fn table() -> &'static VocabTable {
    static TABLE: OnceLock<VocabTable> = OnceLock::new();
    TABLE.get_or_init(VocabTable::new)
}

/// Process-wide symbol/feature/attribute interning table.
///
/// All `intern`/`resolve` calls on [`crate::Symbol`], feature and attribute
/// keys funnel through this single global table: ids are never destroyed
/// within a process, matching the "Symbols are process-global, never
/// destroyed" lifecycle rule.
pub struct Vocab;

impl Vocab {
    /// Interns `s`, returning its stable process-wide id.
    pub fn intern(s: &str) -> u32 {
        table().intern(s)
    }

    /// Resolves a previously interned id back to its string form.
    pub fn resolve(id: u32) -> Box<str> {
        table().resolve(id)
    }

    /// Returns the number of distinct strings interned so far.
    pub fn len() -> usize {
        table().len()
    }

    /// Returns `true` if no strings have been interned yet.
    pub fn is_empty() -> bool {
        Self::len() == 0
    }

    /// A monotonically increasing counter bumped every time a new string is
    /// interned; callers may use this to cheaply check "no new ids since X".
    pub fn version() -> usize {
        table().version.load(Ordering::Acquire)
    }

    /// Resets the global table. Test-only: production code must treat the
    /// vocabulary as append-only for the lifetime of the process.
    #[cfg(any(test, feature = "test-util"))]
    pub fn reset() {
        let t = table();
        for shard in &t.shards {
            shard.table.lock().expect("vocab shard poisoned").clear();
        }
        t.strings.write().expect("vocab strings poisoned").clear();
        t.version.store(0, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_is_idempotent_and_stable() {
        Vocab::reset();
        let a = Vocab::intern("[X]");
        let b = Vocab::intern("[X]");
        assert_eq!(a, b);
        assert_eq!(&*Vocab::resolve(a), "[X]");
    }

    #[test]
    fn distinct_strings_get_distinct_ids() {
        Vocab::reset();
        let a = Vocab::intern("alpha");
        let b = Vocab::intern("beta");
        assert_ne!(a, b);
    }

    #[test]
    fn version_advances_only_on_new_strings() {
        Vocab::reset();
        Vocab::intern("gamma");
        let v1 = Vocab::version();
        Vocab::intern("gamma");
        assert_eq!(Vocab::version(), v1);
        Vocab::intern("delta");
        assert!(Vocab::version() > v1);
    }
}
