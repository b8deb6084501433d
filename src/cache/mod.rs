//! Fixed-capacity, thread-safe LRU cache.
//!
//! Grounded in the reference implementation's `common/lru_cache.h`: a
//! preallocated array of entries linked into a doubly-linked list by index
//! (not raw pointers, so the structure stays a plain, movable Rust value),
//! plus a hash index for O(1) lookup. One lock guards both; no lock is ever
//! held across a call into user code (`get_or_insert`'s `make_v` runs
//! outside the lock, matching §4.4's "no per-key lock" contract).

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::hash::Hash;

pub mod analysis;
pub mod keccak;

pub use analysis::AnalysisCache;
pub use keccak::KeccakCache;

/// Process-wide analysis cache shared by every `Execute`/`StepN` call,
/// toggled through `crate::config::set` ("analysis_cache").
pub static ANALYSIS_CACHE: Lazy<Mutex<AnalysisCache>> = Lazy::new(|| Mutex::new(AnalysisCache::new()));

/// Process-wide Keccak cache shared by every `SHA3` execution, toggled
/// through `crate::config::set` ("sha3_cache").
pub static KECCAK_CACHE: Lazy<KeccakCache> = Lazy::new(KeccakCache::new);

/// Sentinel for "no node" in the intrusive linked list, since `Option<usize>`
/// would otherwise cost an extra word per link for no benefit here.
const NIL: usize = usize::MAX;

struct Entry<K, V> {
    key: Option<K>,
    value: Option<V>,
    prev: usize,
    next: usize,
}

struct Inner<K, V> {
    entries: Vec<Entry<K, V>>,
    index: HashMap<K, usize>,
    head: usize,
    tail: usize,
    len: usize,
    /// Index of the next never-yet-used preallocated slot. Slots below
    /// this have all been linked into the real (used) list at least once;
    /// slots at or above it are blank and not part of any list.
    next_free: usize,
}

impl<K, V> Inner<K, V>
where
    K: Clone + Eq + Hash,
{
    fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "LRU cache capacity must be positive");
        let mut entries = Vec::with_capacity(capacity);
        for _ in 0..capacity {
            entries.push(Entry {
                key: None,
                value: None,
                prev: NIL,
                next: NIL,
            });
        }
        Self {
            entries,
            index: HashMap::with_capacity(capacity),
            head: NIL,
            tail: NIL,
            len: 0,
            next_free: 0,
        }
    }

    fn detach(&mut self, i: usize) {
        let (prev, next) = (self.entries[i].prev, self.entries[i].next);
        if prev != NIL {
            self.entries[prev].next = next;
        } else {
            self.head = next;
        }
        if next != NIL {
            self.entries[next].prev = prev;
        } else {
            self.tail = prev;
        }
    }

    fn push_front(&mut self, i: usize) {
        self.entries[i].prev = NIL;
        self.entries[i].next = self.head;
        if self.head != NIL {
            self.entries[self.head].prev = i;
        }
        self.head = i;
        if self.tail == NIL {
            self.tail = i;
        }
    }

    fn touch(&mut self, i: usize) {
        if self.head == i {
            return;
        }
        self.detach(i);
        self.push_front(i);
    }

    fn get(&mut self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        let i = *self.index.get(key)?;
        self.touch(i);
        self.entries[i].value.clone()
    }

    fn insert_or_assign(&mut self, key: K, value: V) -> V
    where
        V: Clone,
    {
        if let Some(&i) = self.index.get(&key) {
            self.entries[i].value = Some(value.clone());
            self.touch(i);
            return value;
        }

        let evict = self.len >= self.entries.len();
        let i = if evict {
            let tail = self.tail;
            if let Some(old_key) = self.entries[tail].key.take() {
                self.index.remove(&old_key);
            }
            self.detach(tail);
            tail
        } else {
            let i = self.next_free;
            self.next_free += 1;
            self.len += 1;
            i
        };

        self.entries[i].key = Some(key.clone());
        self.entries[i].value = Some(value.clone());
        self.push_front(i);
        self.index.insert(key, i);
        value
    }

    fn clear(&mut self) {
        let capacity = self.entries.len();
        self.entries.clear();
        for _ in 0..capacity {
            self.entries.push(Entry {
                key: None,
                value: None,
                prev: NIL,
                next: NIL,
            });
        }
        self.index.clear();
        self.head = NIL;
        self.tail = NIL;
        self.len = 0;
        self.next_free = 0;
    }
}

/// Thread-safe, fixed-capacity LRU cache keyed by `K`, holding `V`.
pub struct LruCache<K, V> {
    inner: Mutex<Inner<K, V>>,
    capacity: usize,
}

impl<K, V> LruCache<K, V>
where
    K: Clone + Eq + Hash,
    V: Clone,
{
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner::new(capacity)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look up `key`, moving it to the head of the LRU list on a hit.
    pub fn get(&self, key: &K) -> Option<V> {
        self.inner.lock().get(key)
    }

    /// Insert or overwrite `key`, evicting the least-recently-used entry if
    /// the cache was already at capacity.
    pub fn insert_or_assign(&self, key: K, value: V) -> V {
        self.inner.lock().insert_or_assign(key, value)
    }

    /// Return the cached value for `key`, or compute it with `make_value`,
    /// insert it, and return it. `make_value` runs without holding the
    /// lock, so concurrent misses for the same key may race; the last
    /// writer wins, matching §4.4.
    pub fn get_or_insert(&self, key: K, make_value: impl FnOnce() -> V) -> V {
        if let Some(v) = self.get(&key) {
            return v;
        }
        let v = make_value();
        self.insert_or_assign(key, v)
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }
}
