//! `IntSet` — a sorted, deduplicated set of integers stored at the smallest
//! encoding width that fits every member, matching redis's `intset.h`.
//!
//! Encoding only ever widens (16 -> 32 -> 64 bits) as larger values are
//! inserted; it never narrows back down after a removal, exactly like the
//! original.

use rand::Rng;

/// The integer width currently backing an [`IntSet`]'s storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Encoding {
    I16,
    I32,
    I64,
}

impl Encoding {
    fn width(self) -> usize {
        match self {
            Encoding::I16 => 2,
            Encoding::I32 => 4,
            Encoding::I64 => 8,
        }
    }

    fn for_value(v: i64) -> Encoding {
        if v >= i16::MIN as i64 && v <= i16::MAX as i64 {
            Encoding::I16
        } else if v >= i32::MIN as i64 && v <= i32::MAX as i64 {
            Encoding::I32
        } else {
            Encoding::I64
        }
    }
}

#[derive(Debug, Clone)]
enum Data {
    I16(Vec<i16>),
    I32(Vec<i32>),
    I64(Vec<i64>),
}

/// A sorted set of `i64`s, compactly encoded at the narrowest width that
/// fits every current member.
#[derive(Debug, Clone)]
pub struct IntSet {
    data: Data,
}

impl Default for IntSet {
    fn default() -> Self {
        Self::new()
    }
}

impl IntSet {
    /// Creates an empty set at the narrowest (16-bit) encoding.
    pub fn new() -> Self {
        Self {
            data: Data::I16(Vec::new()),
        }
    }

    /// The encoding currently in use.
    pub fn encoding(&self) -> Encoding {
        match &self.data {
            Data::I16(_) => Encoding::I16,
            Data::I32(_) => Encoding::I32,
            Data::I64(_) => Encoding::I64,
        }
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        match &self.data {
            Data::I16(v) => v.len(),
            Data::I32(v) => v.len(),
            Data::I64(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Size in bytes the encoded contents would occupy (header-free, just
    /// `len * width`) — matches `intsetBlobLen` minus the struct header,
    /// since this Rust type carries no on-disk header to account for.
    pub fn blob_len(&self) -> usize {
        self.len() * self.encoding().width()
    }

    /// Binary search for `value`; `Ok(i)` is the index of an exact match,
    /// `Err(i)` is where it would be inserted to keep the set sorted.
    fn search(&self, value: i64) -> Result<usize, usize> {
        match &self.data {
            Data::I16(v) => {
                if value < i16::MIN as i64 || value > i16::MAX as i64 {
                    return Err(self.insertion_point_for_out_of_range(value));
                }
                v.binary_search(&(value as i16))
            }
            Data::I32(v) => {
                if value < i32::MIN as i64 || value > i32::MAX as i64 {
                    return Err(self.insertion_point_for_out_of_range(value));
                }
                v.binary_search(&(value as i32))
            }
            Data::I64(v) => v.binary_search(&value),
        }
    }

    fn insertion_point_for_out_of_range(&self, value: i64) -> usize {
        if value < 0 {
            0
        } else {
            self.len()
        }
    }

    /// Upgrades storage to `new_enc` (which must be >= the current
    /// encoding), re-expanding every existing member, then inserts `value`
    /// at whichever end it belongs on — the very value that triggered the
    /// upgrade is necessarily either smaller than every existing member or
    /// larger, since it didn't fit the old width.
    fn upgrade_and_add(&mut self, new_enc: Encoding, value: i64) {
        log::debug!(
            target: "redis_core_ds::intset",
            "upgrading encoding {:?} -> {:?} ({} members)",
            self.encoding(),
            new_enc,
            self.len()
        );
        let widened: Vec<i64> = match &self.data {
            Data::I16(v) => v.iter().map(|&x| x as i64).collect(),
            Data::I32(v) => v.iter().map(|&x| x as i64).collect(),
            Data::I64(v) => v.clone(),
        };
        let prepend = value < 0;

        let mut new_vec_i64 = Vec::with_capacity(widened.len() + 1);
        if prepend {
            new_vec_i64.push(value);
            new_vec_i64.extend(widened);
        } else {
            new_vec_i64.extend(widened);
            new_vec_i64.push(value);
        }

        self.data = match new_enc {
            Encoding::I16 => {
                Data::I16(new_vec_i64.into_iter().map(|x| x as i16).collect())
            }
            Encoding::I32 => {
                Data::I32(new_vec_i64.into_iter().map(|x| x as i32).collect())
            }
            Encoding::I64 => Data::I64(new_vec_i64),
        };
    }

    /// Inserts `value`, upgrading the encoding first if it doesn't fit.
    /// Returns `true` if the value was newly added, `false` if it was
    /// already present (the set is unchanged).
    pub fn add(&mut self, value: i64) -> bool {
        let needed = Encoding::for_value(value);
        if needed > self.encoding() {
            self.upgrade_and_add(needed, value);
            return true;
        }

        match self.search(value) {
            Ok(_) => false,
            Err(idx) => {
                match &mut self.data {
                    Data::I16(v) => v.insert(idx, value as i16),
                    Data::I32(v) => v.insert(idx, value as i32),
                    Data::I64(v) => v.insert(idx, value),
                }
                true
            }
        }
    }

    /// Removes `value` if present. Encoding never narrows back down, even
    /// if this empties the set entirely — matching the original.
    pub fn remove(&mut self, value: i64) -> bool {
        match self.search(value) {
            Err(_) => false,
            Ok(idx) => {
                match &mut self.data {
                    Data::I16(v) => {
                        v.remove(idx);
                    }
                    Data::I32(v) => {
                        v.remove(idx);
                    }
                    Data::I64(v) => {
                        v.remove(idx);
                    }
                }
                true
            }
        }
    }

    /// Whether `value` is a member.
    pub fn find(&self, value: i64) -> bool {
        self.search(value).is_ok()
    }

    /// The member at position `pos` (0-indexed in sorted order), or `None`
    /// if out of bounds.
    pub fn get(&self, pos: usize) -> Option<i64> {
        match &self.data {
            Data::I16(v) => v.get(pos).map(|&x| x as i64),
            Data::I32(v) => v.get(pos).map(|&x| x as i64),
            Data::I64(v) => v.get(pos).copied(),
        }
    }

    /// A uniformly random member, or `None` if the set is empty.
    pub fn random(&self) -> Option<i64> {
        if self.is_empty() {
            return None;
        }
        let idx = rand::thread_rng().gen_range(0..self.len());
        self.get(idx)
    }

    /// Iterates members in ascending sorted order.
    pub fn iter(&self) -> IntSetIter<'_> {
        IntSetIter { set: self, pos: 0 }
    }
}

/// Ascending iterator over an [`IntSet`]'s members.
pub struct IntSetIter<'a> {
    set: &'a IntSet,
    pos: usize,
}

impl<'a> Iterator for IntSetIter<'a> {
    type Item = i64;

    fn next(&mut self) -> Option<i64> {
        let v = self.set.get(self.pos)?;
        self.pos += 1;
        Some(v)
    }
}

impl<'a> IntoIterator for &'a IntSet {
    type Item = i64;
    type IntoIter = IntSetIter<'a>;

    fn into_iter(self) -> IntSetIter<'a> {
        self.iter()
    }
}

impl FromIterator<i64> for IntSet {
    fn from_iter<T: IntoIterator<Item = i64>>(iter: T) -> Self {
        let mut set = IntSet::new();
        for v in iter {
            set.add(v);
        }
        set
    }
}
