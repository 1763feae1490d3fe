//! The borrowing "unsafe" iterator, matching the original's
//! `dictGetIterator` (as opposed to `dictGetSafeIterator`): fast, but the
//! table must not be mutated while one is alive. In the original that was
//! an API contract enforced by a fingerprint check; here `&'a Dict` makes
//! it a compile error to even attempt the mutation, so the fingerprint
//! check below is redundant in safe code and kept only as a debug-build
//! backstop plus a record of the original invariant.

use super::{Bucket, Dict};

/// Borrowing iterator over every `(key, value)` pair in a [`Dict`].
/// Obtained from [`Dict::iter`][super::Dict::iter].
pub struct Iter<'a, K, V, S> {
    dict: &'a Dict<K, V, S>,
    table_idx: usize,
    bucket_idx: usize,
    cur: Option<&'a Bucket<K, V>>,
    fingerprint: u64,
}

impl<'a, K, V, S> Iter<'a, K, V, S> {
    pub(super) fn new(dict: &'a Dict<K, V, S>) -> Self {
        Self {
            dict,
            table_idx: 0,
            bucket_idx: 0,
            cur: None,
            fingerprint: dict.fingerprint(),
        }
    }
}

impl<'a, K, V, S> Iterator for Iter<'a, K, V, S> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(node) = self.cur {
                self.cur = node.next.as_deref();
                return Some((&node.key, &node.value));
            }

            if self.dict.table_size(self.table_idx) == 0
                || self.bucket_idx >= self.dict.table_size(self.table_idx)
            {
                if self.table_idx == 0 && self.dict.is_rehashing() {
                    self.table_idx = 1;
                    self.bucket_idx = 0;
                    continue;
                }
                return None;
            }

            self.cur = self.dict.bucket(self.table_idx, self.bucket_idx);
            self.bucket_idx += 1;
        }
    }
}

impl<'a, K, V, S> Drop for Iter<'a, K, V, S> {
    fn drop(&mut self) {
        debug_assert_eq!(
            self.fingerprint,
            self.dict.fingerprint(),
            "dict was mutated while an unsafe iterator was alive"
        );
    }
}
