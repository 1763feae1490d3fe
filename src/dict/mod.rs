//! `Dict` — a chained hash table that rehashes incrementally, matching
//! redis's `dict.h`/`dict.c`.
//!
//! The original keeps two sub-tables (`ht[0]`, `ht[1]`) and, while growing or
//! shrinking, migrates a few buckets at a time on every subsequent operation
//! rather than stopping the world to rehash in one pass. That shape survives
//! here unchanged; what doesn't survive is the C vtable of
//! `keyDup`/`valDup`/`keyCompare`/`keyDestructor`/`valDestructor` function
//! pointers carried in `dictType` — Rust's `Eq`, `Clone`, and `Drop` already
//! give us those for free, so `Dict<K, V, S>` only takes a [`BuildHasher`]
//! (defaulting to [`crate::hash::DictHashBuilder`]) in their place.

mod entry;
mod iter;
mod safe_iter;

pub use entry::{Entry, OccupiedEntry, VacantEntry};
pub use iter::Iter;
pub use safe_iter::SafeIter;

use std::hash::{BuildHasher, Hash, Hasher};
use std::time::Instant;

use rand::Rng;

use crate::config::resize_enabled;
use crate::error::{Error, Result};
use crate::hash::DictHashBuilder;

const INITIAL_SIZE: usize = 4;
const FORCE_RESIZE_RATIO: usize = 5;
/// Caps how many empty buckets a single `rehash(n)` call will step over
/// before giving up for this call — without it, rehashing a table that's
/// gone mostly empty (e.g. after a mass delete) could scan arbitrarily many
/// empty buckets under the guise of "n steps of work".
const EMPTY_VISITS_PER_STEP: usize = 10;

pub(crate) struct Bucket<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    pub(crate) next: Option<Box<Bucket<K, V>>>,
}

struct SubTable<K, V> {
    buckets: Vec<Option<Box<Bucket<K, V>>>>,
    size: usize,
    sizemask: usize,
    used: usize,
}

impl<K, V> SubTable<K, V> {
    fn empty() -> Self {
        Self {
            buckets: Vec::new(),
            size: 0,
            sizemask: 0,
            used: 0,
        }
    }

    /// Fallible allocation: `capacity` is frequently driven by a caller
    /// (e.g. a protocol-level `HRANDFIELD`/`SCAN COUNT` style hint), so
    /// this is one of the few spots in the crate that surfaces an
    /// allocation failure as a `Result` instead of aborting, via
    /// `Vec::try_reserve`.
    fn try_with_size(size: usize) -> Result<Self> {
        let mut buckets = Vec::new();
        buckets
            .try_reserve_exact(size)
            .map_err(|_| Error::OutOfMemory)?;
        buckets.resize_with(size, || None);
        Ok(Self {
            buckets,
            size,
            sizemask: size - 1,
            used: 0,
        })
    }
}

fn next_table_size(capacity: usize) -> usize {
    capacity.max(INITIAL_SIZE).next_power_of_two()
}

/// An incrementally-rehashing chained hash table.
pub struct Dict<K, V, S = DictHashBuilder> {
    table: [SubTable<K, V>; 2],
    rehashidx: Option<usize>,
    /// Count of live safe iterators; while nonzero, automatic single-step
    /// rehashing on lookups/inserts is suppressed, matching the original's
    /// "don't rehash under an active safe iterator" rule.
    iterators: u64,
    hasher: S,
}

impl<K, V> Default for Dict<K, V, DictHashBuilder> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Dict<K, V, DictHashBuilder> {
    /// Creates an empty dictionary using the process-seeded MurmurHash2
    /// hasher.
    pub fn new() -> Self {
        Self::with_hasher(DictHashBuilder)
    }
}

impl<K, V, S: BuildHasher> Dict<K, V, S> {
    /// Creates an empty dictionary with a custom [`BuildHasher`].
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            table: [SubTable::empty(), SubTable::empty()],
            rehashidx: None,
            iterators: 0,
            hasher,
        }
    }

    /// Number of key/value pairs currently stored.
    pub fn len(&self) -> usize {
        self.table[0].used + self.table[1].used
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total bucket slots across both sub-tables (an upper bound on how
    /// many entries could be stored before the next grow).
    pub fn capacity(&self) -> usize {
        self.table[0].size + self.table[1].size
    }

    /// Whether a rehash is in progress.
    pub fn is_rehashing(&self) -> bool {
        self.rehashidx.is_some()
    }

    fn hash_key(&self, key: &K) -> u64
    where
        K: Hash,
    {
        let mut h = self.hasher.build_hasher();
        key.hash(&mut h);
        h.finish()
    }

    /// Grows or initializes the table to hold at least `capacity` entries.
    /// Errors if a rehash is already running, or `capacity` is smaller than
    /// the current element count.
    pub fn expand(&mut self, capacity: usize) -> Result<()> {
        if self.is_rehashing() {
            return Err(Error::AlreadyRehashing);
        }
        if capacity < self.table[0].used {
            return Err(Error::CapacityTooSmall);
        }
        let real_size = next_table_size(capacity);
        if self.table[0].size == real_size {
            return Ok(());
        }
        let new_table = SubTable::try_with_size(real_size)?;
        if self.table[0].size == 0 {
            log::trace!(target: "redis_core_ds::dict", "initial table allocated, size={real_size}");
            self.table[0] = new_table;
        } else {
            log::debug!(
                target: "redis_core_ds::dict",
                "rehash started: {} -> {} buckets",
                self.table[0].size,
                real_size
            );
            self.table[1] = new_table;
            self.rehashidx = Some(0);
        }
        Ok(())
    }

    /// Shrinks the table down to the smallest size that still fits the
    /// current element count. A no-op if automatic resizing is disabled or
    /// a rehash is already running.
    pub fn resize(&mut self) -> Result<()> {
        if !resize_enabled() {
            return Err(Error::ResizeForbidden);
        }
        if self.is_rehashing() {
            return Err(Error::AlreadyRehashing);
        }
        let minimal = self.table[0].used.max(INITIAL_SIZE);
        self.expand(minimal)
    }

    fn maybe_grow(&mut self) {
        if self.is_rehashing() {
            return;
        }
        if self.table[0].size == 0 {
            let _ = self.expand(INITIAL_SIZE);
            return;
        }
        if self.table[0].used >= self.table[0].size
            && (resize_enabled() || self.table[0].used / self.table[0].size > FORCE_RESIZE_RATIO)
        {
            let _ = self.expand(self.table[0].used * 2);
        }
    }

    /// Moves up to `n` buckets of `ht[0]` into `ht[1]`, advancing
    /// `rehashidx`. Returns `true` if more work remains, `false` if the
    /// rehash just completed (or none was in progress).
    pub fn rehash(&mut self, n: usize) -> bool {
        if !self.is_rehashing() {
            return false;
        }
        let mut n = n;
        let mut empty_visits = n * EMPTY_VISITS_PER_STEP;

        while n > 0 && self.table[0].used != 0 {
            let idx = self.rehashidx.expect("is_rehashing checked above");
            debug_assert!(idx < self.table[0].size);

            if self.table[0].buckets[idx].is_none() {
                self.rehashidx = Some(idx + 1);
                empty_visits -= 1;
                if empty_visits == 0 {
                    return true;
                }
                continue;
            }

            n -= 1;
            let mut cur = self.table[0].buckets[idx].take();
            while let Some(mut node) = cur {
                cur = node.next.take();
                let h = self.hash_key(&node.key);
                let new_idx = (h as usize) & self.table[1].sizemask;
                node.next = self.table[1].buckets[new_idx].take();
                self.table[0].used -= 1;
                self.table[1].used += 1;
                self.table[1].buckets[new_idx] = Some(node);
            }
            self.rehashidx = Some(idx + 1);
        }

        if self.table[0].used == 0 {
            self.table[0] = std::mem::replace(&mut self.table[1], SubTable::empty());
            self.rehashidx = None;
            log::debug!(target: "redis_core_ds::dict", "rehash finished, size={}", self.table[0].size);
            false
        } else {
            true
        }
    }

    /// Single opportunistic rehash step, run from inside lookups/inserts
    /// when no safe iterator is live.
    fn rehash_step(&mut self) {
        if self.iterators == 0 {
            self.rehash(1);
        }
    }

    /// Keeps rehashing in batches of 100 buckets until either the rehash
    /// finishes or roughly `ms` milliseconds have elapsed. Returns the
    /// number of 100-bucket batches performed.
    pub fn rehash_ms(&mut self, ms: u64) -> u64 {
        let start = Instant::now();
        let mut batches = 0u64;
        while self.is_rehashing() {
            self.rehash(100);
            batches += 1;
            if start.elapsed().as_millis() as u64 >= ms {
                break;
            }
        }
        batches
    }

    fn find_node_mut_raw(&mut self, hash: u64, key: &K) -> Option<*mut Bucket<K, V>>
    where
        K: Eq,
    {
        for t in 0..2 {
            if t == 1 && !self.is_rehashing() {
                break;
            }
            if self.table[t].size == 0 {
                continue;
            }
            let idx = (hash as usize) & self.table[t].sizemask;
            let mut cur = self.table[t].buckets[idx].as_deref_mut();
            while let Some(node) = cur {
                if &node.key == key {
                    return Some(node as *mut Bucket<K, V>);
                }
                cur = node.next.as_deref_mut();
            }
        }
        None
    }

    fn insert_new(&mut self, key: K, hash: u64, value: V) -> &mut V {
        let t = if self.is_rehashing() { 1 } else { 0 };
        let idx = (hash as usize) & self.table[t].sizemask;
        let mut node = Box::new(Bucket {
            key,
            value,
            next: self.table[t].buckets[idx].take(),
        });
        let ptr: *mut Bucket<K, V> = &mut *node;
        self.table[t].buckets[idx] = Some(node);
        self.table[t].used += 1;
        unsafe { &mut (*ptr).value }
    }

    /// Gets the given key's entry for in-place insert-or-update, the
    /// idiomatic replacement for the original's "`addRaw`/`replaceRaw`
    /// return a not-yet-valued entry" pattern — Rust's ownership rules make
    /// handing back a half-initialized entry for the caller to fill in
    /// unsound outside `unsafe`, so the value is supplied through the
    /// `Entry` API instead.
    pub fn entry(&mut self, key: K) -> Entry<'_, K, V, S>
    where
        K: Hash + Eq,
    {
        self.maybe_grow();
        if self.is_rehashing() {
            self.rehash_step();
        }
        let hash = self.hash_key(&key);
        if let Some(ptr) = self.find_node_mut_raw(hash, &key) {
            Entry::Occupied(OccupiedEntry::new(ptr))
        } else {
            Entry::Vacant(VacantEntry::new(self, key, hash))
        }
    }

    pub(crate) fn insert_via_vacant(&mut self, key: K, hash: u64, value: V) -> &mut V {
        self.insert_new(key, hash, value)
    }

    /// Adds a new key. Fails with [`Error::KeyExists`] if the key is
    /// already present — use [`Dict::replace`] to overwrite unconditionally.
    pub fn add(&mut self, key: K, value: V) -> Result<()>
    where
        K: Hash + Eq,
    {
        match self.entry(key) {
            Entry::Occupied(_) => Err(Error::KeyExists),
            Entry::Vacant(v) => {
                v.insert(value);
                Ok(())
            }
        }
    }

    /// Named wrapper kept for parity with the original `dictAddRaw`:
    /// returns a handle to the freshly inserted value, or `None` if the key
    /// already existed.
    pub fn add_raw(&mut self, key: K) -> Option<&mut V>
    where
        K: Hash + Eq,
        V: Default,
    {
        match self.entry(key) {
            Entry::Occupied(_) => None,
            Entry::Vacant(v) => Some(v.insert(V::default())),
        }
    }

    /// Inserts or overwrites, returning the value that was replaced, if
    /// any.
    pub fn replace(&mut self, key: K, value: V) -> Option<V>
    where
        K: Hash + Eq,
    {
        match self.entry(key) {
            Entry::Occupied(mut e) => Some(e.insert(value)),
            Entry::Vacant(v) => {
                v.insert(value);
                None
            }
        }
    }

    /// Named wrapper kept for parity with the original `dictReplaceRaw`:
    /// always returns a handle to the (possibly freshly defaulted) value.
    pub fn replace_raw(&mut self, key: K) -> &mut V
    where
        K: Hash + Eq,
        V: Default,
    {
        self.entry(key).or_insert_with(V::default)
    }

    fn unlink(table: &mut SubTable<K, V>, idx: usize, key: &K) -> Option<Box<Bucket<K, V>>>
    where
        K: Eq,
    {
        if table.buckets[idx].as_ref().map_or(false, |b| &b.key == key) {
            let mut node = table.buckets[idx].take().unwrap();
            table.buckets[idx] = node.next.take();
            table.used -= 1;
            return Some(node);
        }

        let mut cur = &mut table.buckets[idx];
        loop {
            let next_matches = match cur.as_ref() {
                Some(node) => node.next.as_ref().map_or(false, |n| &n.key == key),
                None => return None,
            };
            if next_matches {
                let node = cur.as_mut().unwrap();
                let mut target = node.next.take().unwrap();
                node.next = target.next.take();
                table.used -= 1;
                return Some(target);
            }
            if cur.as_ref().unwrap().next.is_none() {
                return None;
            }
            cur = &mut cur.as_mut().unwrap().next;
        }
    }

    /// Removes `key`, returning both the key and value that were stored —
    /// the Rust analogue of the original's "delete without invoking the
    /// destructors", since here there's nothing left for a destructor to do
    /// beyond the ordinary `Drop` the caller now controls by holding the
    /// pair.
    pub fn delete_no_free(&mut self, key: &K) -> Option<(K, V)>
    where
        K: Hash + Eq,
    {
        if self.table[0].size == 0 {
            return None;
        }
        if self.is_rehashing() {
            self.rehash_step();
        }
        let hash = self.hash_key(key);
        for t in 0..2 {
            if t == 1 && !self.is_rehashing() {
                break;
            }
            if self.table[t].size == 0 {
                continue;
            }
            let idx = (hash as usize) & self.table[t].sizemask;
            if let Some(node) = Self::unlink(&mut self.table[t], idx, key) {
                return Some((node.key, node.value));
            }
        }
        None
    }

    /// Removes `key`, returning the value that was stored.
    pub fn remove(&mut self, key: &K) -> Option<V>
    where
        K: Hash + Eq,
    {
        self.delete_no_free(key).map(|(_, v)| v)
    }

    /// Looks up a key, advancing an in-progress rehash by one step first —
    /// per spec.md §4.3.3, `find` is one of the three operations
    /// (`add`/`find`/`delete`) that drives incremental rehashing, so this
    /// takes `&mut self` rather than the `&self` a pure read would suggest.
    pub fn find(&mut self, key: &K) -> Option<&V>
    where
        K: Hash + Eq,
    {
        if self.table[0].size == 0 {
            return None;
        }
        if self.is_rehashing() {
            self.rehash_step();
        }
        let hash = self.hash_key(key);
        for t in 0..2 {
            if t == 1 && !self.is_rehashing() {
                break;
            }
            if self.table[t].size == 0 {
                continue;
            }
            let idx = (hash as usize) & self.table[t].sizemask;
            let mut cur = self.table[t].buckets[idx].as_deref();
            while let Some(node) = cur {
                if &node.key == key {
                    return Some(&node.value);
                }
                cur = node.next.as_deref();
            }
        }
        None
    }

    /// Same lookup as [`Dict::find`], named to match the original
    /// `dictFetchValue` convenience wrapper.
    pub fn fetch_value(&mut self, key: &K) -> Option<&V>
    where
        K: Hash + Eq,
    {
        self.find(key)
    }

    /// Mutable lookup; also advances an in-progress rehash by one step.
    pub fn find_mut(&mut self, key: &K) -> Option<&mut V>
    where
        K: Hash + Eq,
    {
        if self.table[0].size == 0 {
            return None;
        }
        if self.is_rehashing() {
            self.rehash_step();
        }
        let hash = self.hash_key(key);
        for t in 0..2 {
            if t == 1 && !self.is_rehashing() {
                break;
            }
            if self.table[t].size == 0 {
                continue;
            }
            let idx = (hash as usize) & self.table[t].sizemask;
            let mut cur = self.table[t].buckets[idx].as_deref_mut();
            while let Some(node) = cur {
                if &node.key == key {
                    return Some(&mut node.value);
                }
                cur = node.next.as_deref_mut();
            }
        }
        None
    }

    /// Resets to two empty sub-tables, discarding every entry. If `heartbeat`
    /// is given, it's called roughly every 1024 buckets swept — a progress
    /// callback for callers clearing a table large enough that dropping it
    /// outright would be a visible pause.
    pub fn empty<F: FnMut()>(&mut self, mut heartbeat: Option<F>) {
        const HEARTBEAT_EVERY: usize = 1024;
        if let Some(cb) = heartbeat.as_mut() {
            for t in 0..2 {
                let size = self.table[t].size;
                for i in 0..size {
                    self.table[t].buckets[i] = None;
                    if i % HEARTBEAT_EVERY == 0 {
                        cb();
                    }
                }
            }
        }
        self.table = [SubTable::empty(), SubTable::empty()];
        self.rehashidx = None;
    }

    /// Returns a uniformly-random live entry, or `None` if the dictionary
    /// is empty. Chains are walked to pick uniformly among their entries
    /// too, rather than biasing toward short chains — matching the
    /// original's two-stage "random bucket, then random chain position"
    /// scheme.
    pub fn get_random_key(&self) -> Option<(&K, &V)> {
        if self.len() == 0 {
            return None;
        }
        let mut rng = rand::thread_rng();
        let bucket = loop {
            if self.is_rehashing() {
                let rehashidx = self.rehashidx.unwrap();
                let span = self.table[0].size + self.table[1].size - rehashidx;
                let h = rehashidx + rng.gen_range(0..span);
                let b = if h >= self.table[0].size {
                    &self.table[1].buckets[h - self.table[0].size]
                } else {
                    &self.table[0].buckets[h]
                };
                if b.is_some() {
                    break b;
                }
            } else {
                let h = rng.gen_range(0..=self.table[0].sizemask);
                let b = &self.table[0].buckets[h];
                if b.is_some() {
                    break b;
                }
            }
        };

        let mut len = 0usize;
        let mut cur = bucket.as_deref();
        while let Some(node) = cur {
            len += 1;
            cur = node.next.as_deref();
        }
        let pick = rng.gen_range(0..len);
        let mut cur = bucket.as_deref();
        for _ in 0..pick {
            cur = cur.unwrap().next.as_deref();
        }
        cur.map(|n| (&n.key, &n.value))
    }

    /// Borrowing, fingerprint-checked iterator over every entry. Any
    /// mutation of `self` while the iterator is alive is a contract
    /// violation in the original design; here the borrow checker enforces
    /// it statically, and the fingerprint check on drop is kept as
    /// documentation and a debug-build backstop.
    pub fn iter(&self) -> Iter<'_, K, V, S> {
        Iter::new(self)
    }

    /// Returns the original `dictGetIterator` name for [`Dict::iter`].
    pub fn get_iterator(&self) -> Iter<'_, K, V, S> {
        self.iter()
    }

    /// A resumable cursor that tolerates mutation of `self` between steps.
    /// While live, it suppresses the opportunistic single-step rehashing
    /// that [`Dict::find_mut`]/[`Dict::entry`]/etc. otherwise perform, so
    /// call [`SafeIter::finish`] when done to let rehashing resume.
    pub fn safe_iter(&mut self) -> SafeIter<K> {
        self.iterators += 1;
        SafeIter::new()
    }

    /// Returns the original `dictGetSafeIterator` name for
    /// [`Dict::safe_iter`].
    pub fn get_safe_iterator(&mut self) -> SafeIter<K> {
        self.safe_iter()
    }

    pub(crate) fn pause_rehashing(&mut self) {
        self.iterators += 1;
    }

    pub(crate) fn resume_rehashing(&mut self) {
        self.iterators = self.iterators.saturating_sub(1);
    }

    pub(crate) fn table_size(&self, t: usize) -> usize {
        self.table[t].size
    }

    pub(crate) fn bucket(&self, t: usize, idx: usize) -> Option<&Bucket<K, V>> {
        self.table[t].buckets[idx].as_deref()
    }

    /// A snapshot used to detect whether `self` was mutated: combines each
    /// sub-table's backing-buffer address (changes on reallocation, e.g. a
    /// resize) with its size/used counts and the rehash cursor.
    pub fn fingerprint(&self) -> u64 {
        use std::collections::hash_map::DefaultHasher;
        let mut h = DefaultHasher::new();
        for t in &self.table {
            (t.buckets.as_ptr() as usize).hash(&mut h);
            t.size.hash(&mut h);
            t.used.hash(&mut h);
        }
        self.rehashidx.hash(&mut h);
        h.finish()
    }

    /// Visits every live entry reachable from `cursor`, returning the next
    /// cursor to resume from (`0` once a full pass has completed). Safe to
    /// call repeatedly while the table grows or shrinks between calls:
    /// every key present for the whole scan is guaranteed to be visited at
    /// least once, via the same reverse-binary-increment cursor the
    /// original uses.
    pub fn scan<F>(&mut self, cursor: u64, mut f: F) -> u64
    where
        F: FnMut(&K, &V),
    {
        if self.len() == 0 {
            return 0;
        }

        fn visit<K, V, F: FnMut(&K, &V)>(tbl: &SubTable<K, V>, idx: u64, f: &mut F) {
            let mut cur = tbl.buckets[idx as usize].as_deref();
            while let Some(n) = cur {
                f(&n.key, &n.value);
                cur = n.next.as_deref();
            }
        }

        let mut v = cursor;
        let m0;
        if !self.is_rehashing() {
            m0 = self.table[0].sizemask as u64;
            visit(&self.table[0], v & m0, &mut f);
        } else {
            let (small, large) = if self.table[0].size <= self.table[1].size {
                (0usize, 1usize)
            } else {
                (1usize, 0usize)
            };
            let ms = self.table[small].sizemask as u64;
            let ml = self.table[large].sizemask as u64;
            visit(&self.table[small], v & ms, &mut f);
            loop {
                visit(&self.table[large], v & ml, &mut f);
                v = ((v | ms) + 1) & !ms | (v & ms);
                if v & (ms ^ ml) == 0 {
                    break;
                }
            }
            m0 = ms;
        }

        v |= !m0;
        v = v.reverse_bits();
        v = v.wrapping_add(1);
        v.reverse_bits()
    }
}

impl<K, V, S> std::fmt::Debug for Dict<K, V, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dict")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .field("rehashing", &self.is_rehashing())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh<V>() -> Dict<i64, V, DictHashBuilder> {
        Dict::new()
    }

    #[test]
    fn add_find_remove_roundtrip() {
        let mut d = fresh::<&'static str>();
        d.add(1, "one").unwrap();
        d.add(2, "two").unwrap();
        assert_eq!(d.find(&1), Some(&"one"));
        assert_eq!(d.remove(&1), Some("one"));
        assert_eq!(d.find(&1), None);
        assert_eq!(d.len(), 1);
    }

    #[test]
    fn add_rejects_duplicate_replace_overwrites() {
        let mut d = fresh::<i64>();
        d.add(1, 10).unwrap();
        assert!(d.add(1, 20).is_err());
        assert_eq!(d.replace(1, 20), Some(10));
        assert_eq!(d.find(&1), Some(&20));
    }

    #[test]
    fn rehash_preserves_every_key() {
        let mut d = fresh::<i64>();
        for i in 0..100 {
            d.add(i, i * 10).unwrap();
        }
        d.expand(1024).unwrap();
        assert!(d.is_rehashing());
        let steps = d.table_size(0);
        for _ in 0..steps {
            d.rehash(1);
        }
        assert!(!d.is_rehashing());
        for i in 0..100 {
            assert_eq!(d.find(&i), Some(&(i * 10)));
        }
    }

    #[test]
    fn used_count_invariant_across_mutations() {
        let mut d = fresh::<i64>();
        for i in 0..50 {
            d.add(i, i).unwrap();
        }
        assert_eq!(d.len(), 50);
        for i in 0..25 {
            d.remove(&i);
        }
        assert_eq!(d.len(), 25);
        for i in 0..25 {
            d.replace(i + 100, i);
        }
        assert_eq!(d.len(), 50);
    }

    #[test]
    fn interleaved_find_add_delete_during_rehash() {
        let mut d = fresh::<i64>();
        for i in 0..200 {
            d.add(i, i).unwrap();
        }
        d.expand(2048).unwrap();
        assert!(d.is_rehashing());

        d.remove(&5);
        d.add(500, 500).unwrap();
        assert_eq!(d.find(&5), None);
        assert_eq!(d.find(&500), Some(&500));

        while d.rehash(4) {}
        for i in 0..200 {
            if i != 5 {
                assert_eq!(d.find(&i), Some(&i));
            }
        }
        assert_eq!(d.find(&500), Some(&500));
    }

    #[test]
    fn scan_visits_every_key_at_least_once_under_growth() {
        let mut d = fresh::<i64>();
        for i in 0..1000 {
            d.add(i, i).unwrap();
        }
        d.expand(4096).unwrap();

        let mut seen = std::collections::HashSet::new();
        let mut cursor = 0u64;
        loop {
            cursor = d.scan(cursor, |k, _| {
                seen.insert(*k);
            });
            d.rehash(8);
            if cursor == 0 {
                break;
            }
        }
        while d.rehash(8) {}
        for i in 0..1000 {
            assert!(seen.contains(&i), "key {i} missed by scan");
        }
    }

    #[test]
    fn fingerprint_changes_after_mutation() {
        let mut d = fresh::<i64>();
        d.add(1, 1).unwrap();
        let fp = d.fingerprint();
        d.add(2, 2).unwrap();
        assert_ne!(fp, d.fingerprint());
    }

    #[test]
    fn fingerprint_stable_without_mutation() {
        let mut d = fresh::<i64>();
        d.add(1, 1).unwrap();
        assert_eq!(d.fingerprint(), d.fingerprint());
    }

    #[test]
    fn get_random_key_is_always_live() {
        let mut d = fresh::<i64>();
        for i in 0..20 {
            d.add(i, i).unwrap();
        }
        for _ in 0..50 {
            let (k, v) = d.get_random_key().unwrap();
            assert_eq!(k, v);
        }
    }

    #[test]
    fn empty_resets_everything() {
        let mut d = fresh::<i64>();
        for i in 0..10 {
            d.add(i, i).unwrap();
        }
        d.empty::<fn()>(None);
        assert_eq!(d.len(), 0);
        assert!(d.find(&0).is_none());
    }

    #[test]
    fn empty_with_heartbeat_invokes_callback() {
        let mut d = fresh::<i64>();
        for i in 0..2000 {
            d.add(i, i).unwrap();
        }
        let mut ticks = 0;
        d.empty(Some(|| ticks += 1));
        assert!(ticks > 0);
        assert_eq!(d.len(), 0);
    }

    #[test]
    fn rehash_ms_returns_batch_count_and_drains_the_table() {
        let mut d = fresh::<i64>();
        for i in 0..100 {
            d.add(i, i).unwrap();
        }
        d.expand(1024).unwrap();
        assert!(d.is_rehashing());

        let batches = d.rehash_ms(1000);
        assert!(batches > 0);
        assert!(!d.is_rehashing());
        for i in 0..100 {
            assert_eq!(d.find(&i), Some(&i));
        }
    }

    #[test]
    fn rehash_ms_is_zero_when_not_rehashing() {
        let mut d = fresh::<i64>();
        d.add(1, 1).unwrap();
        assert_eq!(d.rehash_ms(10), 0);
    }
}
