//! The in-place insert-or-update API, `Dict`'s idiomatic replacement for
//! the original `dictAddRaw`/`dictReplaceRaw` "hand back a not-yet-valued
//! entry" pattern (see [`super::Dict::entry`]).

use std::hash::{BuildHasher, Hash};

use super::{Bucket, Dict};

/// A view into a single slot of a [`Dict`], obtained from [`Dict::entry`].
pub enum Entry<'a, K, V, S> {
    Occupied(OccupiedEntry<'a, K, V>),
    Vacant(VacantEntry<'a, K, V, S>),
}

impl<'a, K: Hash + Eq, V, S: BuildHasher> Entry<'a, K, V, S> {
    /// Inserts `default` if vacant, otherwise leaves the existing value
    /// untouched; returns a mutable reference to the value either way.
    pub fn or_insert(self, default: V) -> &'a mut V {
        match self {
            Entry::Occupied(e) => e.into_mut(),
            Entry::Vacant(e) => e.insert(default),
        }
    }

    /// Like [`Entry::or_insert`] but computes the default lazily.
    pub fn or_insert_with<F: FnOnce() -> V>(self, f: F) -> &'a mut V {
        match self {
            Entry::Occupied(e) => e.into_mut(),
            Entry::Vacant(e) => e.insert(f()),
        }
    }

    /// Runs `f` against the value if the entry is occupied; a no-op for a
    /// vacant entry.
    pub fn and_modify<F: FnOnce(&mut V)>(mut self, f: F) -> Self {
        if let Entry::Occupied(ref mut e) = self {
            f(e.get_mut());
        }
        self
    }
}

/// A view of an occupied slot.
///
/// Holds a raw pointer into the bucket chain rather than a borrow, since
/// the matching [`VacantEntry`] arm needs to hold `&'a mut Dict` at the same
/// time — the same trick `std::collections::HashMap`'s own entry API uses
/// internally.
pub struct OccupiedEntry<'a, K, V> {
    node: *mut Bucket<K, V>,
    _marker: std::marker::PhantomData<&'a mut Bucket<K, V>>,
}

impl<'a, K, V> OccupiedEntry<'a, K, V> {
    pub(super) fn new(node: *mut Bucket<K, V>) -> Self {
        Self {
            node,
            _marker: std::marker::PhantomData,
        }
    }

    pub fn key(&self) -> &K {
        unsafe { &(*self.node).key }
    }

    pub fn get(&self) -> &V {
        unsafe { &(*self.node).value }
    }

    pub fn get_mut(&mut self) -> &mut V {
        unsafe { &mut (*self.node).value }
    }

    pub fn into_mut(self) -> &'a mut V {
        unsafe { &mut (*self.node).value }
    }

    /// Overwrites the value, returning the one that was there before.
    pub fn insert(&mut self, value: V) -> V {
        unsafe { std::mem::replace(&mut (*self.node).value, value) }
    }
}

/// A view of a vacant slot, ready to be filled.
pub struct VacantEntry<'a, K, V, S> {
    dict: &'a mut Dict<K, V, S>,
    key: K,
    hash: u64,
}

impl<'a, K: Hash + Eq, V, S: BuildHasher> VacantEntry<'a, K, V, S> {
    pub(super) fn new(dict: &'a mut Dict<K, V, S>, key: K, hash: u64) -> Self {
        Self { dict, key, hash }
    }

    pub fn key(&self) -> &K {
        &self.key
    }

    /// Inserts `value`, returning a mutable reference to it.
    pub fn insert(self, value: V) -> &'a mut V {
        self.dict.insert_via_vacant(self.key, self.hash, value)
    }
}
