//! # soa-map
//!
//! A flat sorted map from fixed-width integer keys to fixed-size values.
//!
//! All entries live in one contiguous block using a structure-of-arrays
//! layout: every key first, ascending, then every value, index-aligned with
//! its key. Lookups are a binary search over a dense key array, and the value
//! for a key sits at the same index in the value region.
//!
//! Because the value region begins right after `capacity` key slots, every
//! capacity change moves the value region. Growth triggered by an insertion
//! opens the slot for the new entry during that same move.
//!
//! ## Example
//!
//! ```rust
//! use soa_map::OrderedMap;
//!
//! let mut map: OrderedMap<u32> = OrderedMap::new(4);
//! map.insert_new(5, &50u32.to_ne_bytes()).unwrap();
//! map.insert_new(3, &30u32.to_ne_bytes()).unwrap();
//! map.insert_new(8, &80u32.to_ne_bytes()).unwrap();
//!
//! assert_eq!(map.get(3), Some(&30u32.to_ne_bytes()[..]));
//! assert_eq!(map.keys().collect::<Vec<_>>(), vec![3, 5, 8]);
//!
//! map.remove(3).unwrap();
//! assert!(map.get(3).is_none());
//! ```
//!
//! For plain-old-data values, [`TypedMap`] wraps the byte-level API, and
//! [`OrderedSet`] covers the zero-width value case.

#![deny(unsafe_op_in_unsafe_fn)]

mod alloc;
mod error;
mod iter;
mod key;
mod policy;
mod set;
mod typed;

pub use alloc::{BlockAlloc, Heap};
pub use error::{Error, Result};
pub use iter::{Cursor, Iter, Keys, Values};
pub use key::Key;
pub use policy::{GrowthPolicy, DEFAULT_EXPANSION_FACTOR, DEFAULT_MIN_CAPACITY};
pub use set::OrderedSet;
pub use typed::TypedMap;

use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};

use log::{debug, trace};

// =============================================================================
// Slot handles
// =============================================================================

/// Position of an entry, valid until the map's next structural mutation.
///
/// Obtained from [`OrderedMap::get_slot`] and consumed by
/// [`OrderedMap::remove_slot`]. The slot records which map issued it and that
/// map's mutation epoch, so a slot kept across an insertion, removal, clear or
/// capacity change, or handed to another map (a clone included), is rejected
/// instead of removing whatever entry sits at its index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Slot {
    index: usize,
    map: u64,
    epoch: u64,
}

impl Slot {
    /// Index of the entry in ascending key order.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }
}

// =============================================================================
// OrderedMap
// =============================================================================

/// Process-wide identity for each map instance, stamped into its slots.
fn next_map_id() -> u64 {
    static NEXT: AtomicU64 = AtomicU64::new(0);
    NEXT.fetch_add(1, Ordering::Relaxed)
}

/// A sorted flat map with keys and values in separate regions of one block.
///
/// Block layout for capacity `c`, key width `w` and value size `s`:
///
/// ```text
/// [ key 0 | key 1 | ... | key c-1 ][ value 0 | value 1 | ... | value c-1 ]
///   0                               c*w                        c*(w+s)
/// ```
///
/// Only the first `len()` slots of each region are live. A `value_size` of
/// zero turns the map into a key set.
pub struct OrderedMap<K, A: BlockAlloc = Heap> {
    /// Key region followed by value region. Empty while unallocated.
    data: Vec<u8>,
    count: usize,
    /// Slots reserved in each region. Zero exactly when `data` is unallocated.
    capacity: usize,
    value_size: usize,
    policy: GrowthPolicy,
    /// Unique per instance; clones get a fresh one.
    id: u64,
    /// Bumped on every structural mutation; stamps issued [`Slot`]s.
    epoch: u64,
    alloc: A,
    _marker: PhantomData<K>,
}

impl<K: Key> OrderedMap<K> {
    /// Creates an empty map storing `value_size`-byte values. Nothing is
    /// allocated until the first insertion.
    pub fn new(value_size: usize) -> Self {
        Self::with_allocator(value_size, GrowthPolicy::DEFAULT, Heap)
    }

    pub fn with_policy(value_size: usize, policy: GrowthPolicy) -> Self {
        Self::with_allocator(value_size, policy, Heap)
    }
}

impl<K: Key, A: BlockAlloc> OrderedMap<K, A> {
    pub fn with_allocator(value_size: usize, policy: GrowthPolicy, alloc: A) -> Self {
        Self {
            data: Vec::new(),
            count: 0,
            capacity: 0,
            value_size,
            policy,
            id: next_map_id(),
            epoch: 0,
            alloc,
            _marker: PhantomData,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Number of entries the current block holds without reallocating.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn value_size(&self) -> usize {
        self.value_size
    }

    #[inline]
    pub fn policy(&self) -> GrowthPolicy {
        self.policy
    }

    /// Bytes held by the backing block.
    pub fn memory_usage(&self) -> usize {
        self.data.capacity()
    }

    // -------------------------------------------------------------------------
    // Layout
    // -------------------------------------------------------------------------

    #[inline]
    fn block_bytes(&self, capacity: usize) -> Result<usize> {
        capacity
            .checked_mul(K::WIDTH + self.value_size)
            .ok_or(Error::CapacityOverflow)
    }

    /// Byte offset of value `idx` when the block holds `capacity` slots.
    #[inline]
    fn value_offset(&self, capacity: usize, idx: usize) -> usize {
        capacity * K::WIDTH + idx * self.value_size
    }

    #[inline]
    fn key_at(&self, idx: usize) -> K {
        K::read(&self.data[idx * K::WIDTH..(idx + 1) * K::WIDTH])
    }

    #[inline]
    fn write_key(&mut self, idx: usize, key: K) {
        key.write(&mut self.data[idx * K::WIDTH..(idx + 1) * K::WIDTH]);
    }

    #[inline]
    fn value_at(&self, idx: usize) -> &[u8] {
        let off = self.value_offset(self.capacity, idx);
        &self.data[off..off + self.value_size]
    }

    #[inline]
    fn value_at_mut(&mut self, idx: usize) -> &mut [u8] {
        let off = self.value_offset(self.capacity, idx);
        let size = self.value_size;
        &mut self.data[off..off + size]
    }

    #[inline]
    fn check_value(&self, value: &[u8]) -> Result<()> {
        if value.len() != self.value_size {
            return Err(Error::ValueSize {
                expected: self.value_size,
                actual: value.len(),
            });
        }
        Ok(())
    }

    #[inline]
    fn touch(&mut self) {
        self.epoch = self.epoch.wrapping_add(1);
    }

    // -------------------------------------------------------------------------
    // Relocation engine
    // -------------------------------------------------------------------------

    /// Moves the block to `target` slots per region.
    ///
    /// With `opening = Some(at)`, the entry slot `at` is left as a hole in both
    /// regions (entries at and after `at` end up one slot further on), ready
    /// for the caller to write a new entry. Requires
    /// `len() + opening.is_some() <= target`.
    ///
    /// Growth reallocates first, so the block is untouched if that fails.
    /// Shrinking moves the values down first and only then reallocates; a
    /// failed shrink keeps the larger block with the already valid layout.
    fn relocate(&mut self, opening: Option<usize>, target: usize) -> Result<()> {
        debug_assert!(self.count + usize::from(opening.is_some()) <= target);
        let bytes = self.block_bytes(target)?;

        if self.capacity == 0 {
            debug_assert_eq!(self.count, 0);
            self.data = self.alloc.allocate(bytes)?;
            self.capacity = target;
            trace!("allocated block: capacity {target}, {bytes} bytes");
            return Ok(());
        }

        let old = self.capacity;
        let growing = target >= old;
        // A block kept after a failed shrink may already be big enough.
        if growing && bytes > self.data.len() {
            self.alloc.reallocate(&mut self.data, bytes)?;
        }

        let n = self.count;
        let w = K::WIDTH;
        let s = self.value_size;
        let old_values = self.value_offset(old, 0);
        let new_values = self.value_offset(target, 0);

        match opening {
            None => {
                self.data
                    .copy_within(old_values..old_values + n * s, new_values);
            }
            Some(at) => {
                debug_assert!(at <= n);
                let lower = old_values..old_values + at * s;
                let upper = old_values + at * s..old_values + n * s;
                let upper_dst = new_values + (at + 1) * s;

                // Each move must not clobber a source the next one still reads.
                if growing {
                    self.data.copy_within(upper, upper_dst);
                    self.data.copy_within(lower, new_values);
                } else {
                    self.data.copy_within(lower, new_values);
                    self.data.copy_within(upper, upper_dst);
                }
                self.data.copy_within(at * w..n * w, (at + 1) * w);
            }
        }

        if !growing {
            if let Err(err) = self.alloc.reallocate(&mut self.data, bytes) {
                debug!("shrink to capacity {target} failed, keeping larger block: {err}");
            }
        }

        trace!("relocated block: capacity {old} -> {target}, opening {opening:?}");
        self.capacity = target;
        Ok(())
    }

    /// Shifts entries `[at, len)` up by one slot in both regions.
    fn open_gap(&mut self, at: usize) {
        debug_assert!(self.count < self.capacity);
        let n = self.count;
        let w = K::WIDTH;
        let s = self.value_size;
        let values = self.value_offset(self.capacity, 0);
        self.data
            .copy_within(values + at * s..values + n * s, values + (at + 1) * s);
        self.data.copy_within(at * w..n * w, (at + 1) * w);
    }

    /// Shifts entries `(at, len)` down by one slot in both regions.
    fn close_gap(&mut self, at: usize) {
        let n = self.count;
        let w = K::WIDTH;
        let s = self.value_size;
        let values = self.value_offset(self.capacity, 0);
        self.data.copy_within((at + 1) * w..n * w, at * w);
        self.data
            .copy_within(values + (at + 1) * s..values + n * s, values + at * s);
    }

    /// Grows ahead of time so that `additional` more entries fit.
    pub fn reserve(&mut self, additional: usize) -> Result<()> {
        let needed = self
            .count
            .checked_add(additional)
            .ok_or(Error::CapacityOverflow)?;
        if needed <= self.capacity {
            return Ok(());
        }
        let target = self.policy.grown_to_fit(self.capacity, needed)?;
        self.relocate(None, target)?;
        self.touch();
        Ok(())
    }

    /// Shrinks the block to exactly `len()` slots, or releases it when empty.
    ///
    /// Compaction is advisory: if the allocator cannot shrink the block, the
    /// map keeps the larger allocation and stays fully usable.
    pub fn compact(&mut self) {
        if self.count == 0 {
            if self.capacity != 0 {
                let block = std::mem::take(&mut self.data);
                self.alloc.release(block);
                self.capacity = 0;
                trace!("released block");
            }
        } else if self.count < self.capacity {
            if let Err(err) = self.relocate(None, self.count) {
                debug!("compaction skipped: {err}");
            }
        } else if let Ok(bytes) = self.block_bytes(self.count) {
            // Layout already matches `count`; only a block kept by an earlier
            // failed shrink is left to trim.
            if self.data.len() > bytes {
                if let Err(err) = self.alloc.reallocate(&mut self.data, bytes) {
                    debug!("shrink to capacity {} failed again: {err}", self.count);
                }
            }
        }
        self.touch();
    }

    /// Removes every entry but keeps the block.
    pub fn clear(&mut self) {
        self.count = 0;
        self.touch();
    }

    // -------------------------------------------------------------------------
    // Search
    // -------------------------------------------------------------------------

    /// Index of the first key not less than `key`.
    fn lower_bound(&self, key: K) -> usize {
        let mut first = 0usize;
        let mut len = self.count;
        while len > 0 {
            let half = len >> 1;
            let middle = first + half;
            if self.key_at(middle) < key {
                first = middle + 1;
                len = len - half - 1;
            } else {
                len = half;
            }
        }
        first
    }

    /// `Ok(index)` of `key`, or `Err(index)` where it would be inserted.
    #[inline]
    fn search(&self, key: K) -> std::result::Result<usize, usize> {
        let idx = self.lower_bound(key);
        if idx < self.count && self.key_at(idx) == key {
            Ok(idx)
        } else {
            Err(idx)
        }
    }

    /// Number of keys strictly less than `key`.
    pub fn rank(&self, key: K) -> usize {
        self.lower_bound(key)
    }

    fn find_value_index(&self, value: &[u8]) -> Option<usize> {
        if value.len() != self.value_size {
            return None;
        }
        (0..self.count).find(|&i| self.value_at(i) == value)
    }

    // -------------------------------------------------------------------------
    // Insertion
    // -------------------------------------------------------------------------

    fn insert_at(&mut self, at: usize, key: K, value: &[u8]) -> Result<()> {
        if self.count == self.capacity {
            let target = self.policy.grown(self.capacity)?;
            self.relocate(Some(at), target)?;
        } else {
            self.open_gap(at);
        }
        self.write_key(at, key);
        self.value_at_mut(at).copy_from_slice(value);
        self.count += 1;
        self.touch();
        Ok(())
    }

    /// Inserts a key that must not already be present.
    ///
    /// Returns [`Error::KeyExists`] and changes nothing if it is.
    pub fn insert_new(&mut self, key: K, value: &[u8]) -> Result<()> {
        self.check_value(value)?;
        match self.search(key) {
            Ok(_) => Err(Error::KeyExists),
            Err(at) => self.insert_at(at, key, value),
        }
    }

    /// Overwrites the value of a key that must already be present.
    pub fn set_existing(&mut self, key: K, value: &[u8]) -> Result<()> {
        self.check_value(value)?;
        let idx = self.search(key).map_err(|_| Error::NotFound)?;
        self.value_at_mut(idx).copy_from_slice(value);
        Ok(())
    }

    /// Overwrites the value for `key` in place, or inserts it.
    pub fn set_or_insert(&mut self, key: K, value: &[u8]) -> Result<()> {
        self.check_value(value)?;
        match self.search(key) {
            Ok(idx) => {
                self.value_at_mut(idx).copy_from_slice(value);
                Ok(())
            }
            Err(at) => self.insert_at(at, key, value),
        }
    }

    // -------------------------------------------------------------------------
    // Lookup
    // -------------------------------------------------------------------------

    pub fn get(&self, key: K) -> Option<&[u8]> {
        let idx = self.search(key).ok()?;
        Some(self.value_at(idx))
    }

    pub fn get_mut(&mut self, key: K) -> Option<&mut [u8]> {
        let idx = self.search(key).ok()?;
        Some(self.value_at_mut(idx))
    }

    /// Like [`get`](Self::get), also returning a [`Slot`] that
    /// [`remove_slot`](Self::remove_slot) accepts without searching again.
    pub fn get_slot(&self, key: K) -> Option<(Slot, &[u8])> {
        let index = self.search(key).ok()?;
        let slot = Slot {
            index,
            map: self.id,
            epoch: self.epoch,
        };
        Some((slot, self.value_at(index)))
    }

    /// Entry at position `idx` in ascending key order.
    pub fn get_index(&self, idx: usize) -> Option<(K, &[u8])> {
        if idx >= self.count {
            return None;
        }
        Some((self.key_at(idx), self.value_at(idx)))
    }

    pub fn first(&self) -> Option<(K, &[u8])> {
        self.get_index(0)
    }

    pub fn last(&self) -> Option<(K, &[u8])> {
        self.get_index(self.count.checked_sub(1)?)
    }

    /// Some value in the map, or `None` when empty.
    ///
    /// Which entry is returned is deterministic (currently the smallest key)
    /// but carries no meaning; this suits drain loops that repeatedly take an
    /// arbitrary entry and remove it.
    pub fn any_value(&self) -> Option<&[u8]> {
        self.first().map(|(_, value)| value)
    }

    #[inline]
    pub fn contains_key(&self, key: K) -> bool {
        self.search(key).is_ok()
    }

    /// Key of the first entry (by key order) whose value bytes equal `value`.
    ///
    /// Linear scan: values carry no ordering.
    pub fn find_key(&self, value: &[u8]) -> Option<K> {
        self.find_value_index(value).map(|idx| self.key_at(idx))
    }

    /// `true` if `key` is present and its value bytes equal `value`.
    pub fn find_and_compare(&self, key: K, value: &[u8]) -> bool {
        self.get(key) == Some(value)
    }

    /// Smallest non-negative key that is not present.
    ///
    /// Scans the run of keys `0, 1, 2, ...` starting at the position of key
    /// `0`, so negative or sparse keys do not affect the result. Cost is
    /// `O(log n)` plus the length of that run. Returns `None` only if every
    /// non-negative value of `K` is already a key.
    pub fn find_unused_key(&self) -> Option<K> {
        let start = self.lower_bound(K::from_index(0)?);
        let mut n = 0usize;
        while start + n < self.count {
            let candidate = K::from_index(n)?;
            if self.key_at(start + n) != candidate {
                return Some(candidate);
            }
            n += 1;
        }
        K::from_index(n)
    }

    // -------------------------------------------------------------------------
    // Removal
    // -------------------------------------------------------------------------

    /// Removes the entry at position `idx` and returns its key.
    pub fn remove_index(&mut self, idx: usize) -> Result<K> {
        if idx >= self.count {
            return Err(Error::IndexOutOfBounds {
                index: idx,
                len: self.count,
            });
        }
        let key = self.key_at(idx);
        self.close_gap(idx);
        self.count -= 1;
        self.touch();
        Ok(key)
    }

    /// Removes `key`, returning it back on success.
    pub fn remove(&mut self, key: K) -> Result<K> {
        let idx = self.search(key).map_err(|_| Error::NotFound)?;
        self.remove_index(idx)
    }

    /// Removes the first entry whose value bytes equal `value`.
    pub fn remove_value(&mut self, value: &[u8]) -> Option<K> {
        let idx = self.find_value_index(value)?;
        self.remove_index(idx).ok()
    }

    /// Removes the entry a [`Slot`] points at, without searching.
    ///
    /// Fails with [`Error::StaleSlot`] if the slot was issued by another map or
    /// if this map changed structurally since the slot was issued.
    pub fn remove_slot(&mut self, slot: Slot) -> Result<K> {
        if slot.map != self.id || slot.epoch != self.epoch || slot.index >= self.count {
            return Err(Error::StaleSlot);
        }
        self.remove_index(slot.index)
    }

    /// Keeps only the entries for which `f` returns `true`.
    pub fn retain<F>(&mut self, mut f: F)
    where
        F: FnMut(K, &mut [u8]) -> bool,
    {
        let mut cursor = self.cursor();
        while let Some((key, value)) = cursor.next_entry() {
            if !f(key, value) {
                cursor.remove_current();
            }
        }
    }

    // -------------------------------------------------------------------------
    // Iteration
    // -------------------------------------------------------------------------

    pub fn iter(&self) -> Iter<'_, K, A> {
        Iter::new(self)
    }

    pub fn keys(&self) -> Keys<'_, K, A> {
        Keys::new(self)
    }

    pub fn values(&self) -> Values<'_, K, A> {
        Values::new(self)
    }

    /// A cursor over the entries that can remove the current one and continue.
    pub fn cursor(&mut self) -> Cursor<'_, K, A> {
        Cursor::new(self)
    }
}

impl<K, A: BlockAlloc> Drop for OrderedMap<K, A> {
    fn drop(&mut self) {
        let block = std::mem::take(&mut self.data);
        self.alloc.release(block);
    }
}

impl<K: Key, A: BlockAlloc + Clone> OrderedMap<K, A> {
    /// Copies the map into a block obtained from a clone of its allocator.
    ///
    /// The copy is sized to the current capacity, so slack left by a failed
    /// shrink is not carried over. Slots issued by `self` are not valid for
    /// the copy.
    pub fn try_clone(&self) -> Result<Self> {
        let mut alloc = self.alloc.clone();
        let data = if self.capacity == 0 {
            Vec::new()
        } else {
            let bytes = self.block_bytes(self.capacity)?;
            let mut block = alloc.allocate(bytes)?;
            block.copy_from_slice(&self.data[..bytes]);
            block
        };
        Ok(Self {
            data,
            count: self.count,
            capacity: self.capacity,
            value_size: self.value_size,
            policy: self.policy,
            id: next_map_id(),
            epoch: self.epoch,
            alloc,
            _marker: PhantomData,
        })
    }
}

impl<K: Key, A: BlockAlloc + Clone> Clone for OrderedMap<K, A> {
    /// # Panics
    ///
    /// Panics if the allocator cannot provide the copy's block. Use
    /// [`OrderedMap::try_clone`] to handle that case.
    fn clone(&self) -> Self {
        match self.try_clone() {
            Ok(map) => map,
            Err(err) => panic!("OrderedMap::clone: {err}"),
        }
    }
}

impl<K: Key, A: BlockAlloc> std::fmt::Debug for OrderedMap<K, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: Key, A: BlockAlloc, B: BlockAlloc> PartialEq<OrderedMap<K, B>> for OrderedMap<K, A> {
    fn eq(&self, other: &OrderedMap<K, B>) -> bool {
        self.value_size == other.value_size
            && self.count == other.count
            && self.iter().eq(other.iter())
    }
}

impl<K: Key, A: BlockAlloc> Eq for OrderedMap<K, A> {}

impl<'a, K: Key, A: BlockAlloc> IntoIterator for &'a OrderedMap<K, A> {
    type Item = (K, &'a [u8]);
    type IntoIter = Iter<'a, K, A>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}


#[cfg(test)]
mod proptests;
