//! The resumable, mutation-tolerant cursor matching the original's
//! `dictGetSafeIterator`.
//!
//! A safe iterator in the original is still a plain `dictIterator*` that
//! holds the table pointer for the whole traversal — what makes it "safe"
//! is only that the dict refuses to rehash while one is outstanding, so
//! add/delete of keys other than the one just visited stay legal mid-scan.
//! That shape doesn't translate: an `&'a mut Dict` borrow here would make
//! `self` uncallable for the scan's own duration. Instead this iterator
//! holds no reference into the dict at all, only cursor position plus a
//! cloned snapshot of whichever bucket chain it's currently draining, and
//! each step takes `&mut Dict` explicitly — so the caller is free to
//! mutate the dict between calls to [`SafeIter::next`], exactly as the
//! original contract allows.

use std::hash::{BuildHasher, Hash};

use super::Dict;

/// A resumable cursor obtained from
/// [`Dict::safe_iter`][super::Dict::safe_iter]. Call [`SafeIter::finish`]
/// once done so the dict can resume opportunistic rehashing.
pub struct SafeIter<K> {
    table_idx: usize,
    bucket_idx: usize,
    pending: Vec<K>,
}

impl<K> SafeIter<K> {
    pub(super) fn new() -> Self {
        Self {
            table_idx: 0,
            bucket_idx: 0,
            pending: Vec::new(),
        }
    }

    /// Advances to the next live key/value pair, re-reading `dict`'s
    /// current state each call. Keys snapshotted into the current bucket
    /// but removed from `dict` before being yielded are silently skipped.
    pub fn next<V, S>(&mut self, dict: &mut Dict<K, V, S>) -> Option<(K, V)>
    where
        K: Hash + Eq + Clone,
        V: Clone,
        S: BuildHasher,
    {
        loop {
            while let Some(key) = self.pending.pop() {
                if let Some(v) = dict.find(&key) {
                    let v = v.clone();
                    return Some((key, v));
                }
            }

            loop {
                let size = dict.table_size(self.table_idx);
                if size == 0 || self.bucket_idx >= size {
                    if self.table_idx == 0 && dict.is_rehashing() {
                        self.table_idx = 1;
                        self.bucket_idx = 0;
                        continue;
                    }
                    return None;
                }

                let idx = self.bucket_idx;
                self.bucket_idx += 1;

                let mut keys = Vec::new();
                let mut cur = dict.bucket(self.table_idx, idx);
                while let Some(node) = cur {
                    keys.push(node.key.clone());
                    cur = node.next.as_deref();
                }
                if !keys.is_empty() {
                    keys.reverse();
                    self.pending = keys;
                    break;
                }
            }
        }
    }

    /// Ends the traversal, letting `dict` resume opportunistic rehashing.
    pub fn finish<V, S: BuildHasher>(self, dict: &mut Dict<K, V, S>) {
        dict.resume_rehashing();
    }
}
