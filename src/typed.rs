//! A typed view over [`OrderedMap`] for plain-old-data values.

use std::fmt;
use std::marker::PhantomData;

use bytemuck::Pod;

use crate::{BlockAlloc, Error, GrowthPolicy, Heap, Key, OrderedMap, Result, Slot};

/// An [`OrderedMap`] whose value slots hold `V`.
///
/// Values are copied in and out as bytes. The value region's offset moves
/// with the capacity and is not aligned for `V`, so lookups return `V` by
/// value rather than by reference.
///
/// ```rust
/// use soa_map::TypedMap;
///
/// let mut map: TypedMap<u32, [f32; 3]> = TypedMap::new();
/// map.insert_new(7, [1.0, 2.0, 3.0]).unwrap();
/// map.set_or_insert(2, [0.5; 3]).unwrap();
///
/// assert_eq!(map.get(7), Some([1.0, 2.0, 3.0]));
/// assert_eq!(map.iter().map(|(k, _)| k).collect::<Vec<_>>(), vec![2, 7]);
/// ```
pub struct TypedMap<K, V, A: BlockAlloc = Heap> {
    raw: OrderedMap<K, A>,
    _marker: PhantomData<V>,
}

impl<K: Key, V: Pod> TypedMap<K, V> {
    pub fn new() -> Self {
        Self::with_policy(GrowthPolicy::DEFAULT)
    }

    pub fn with_policy(policy: GrowthPolicy) -> Self {
        Self::with_allocator(policy, Heap)
    }
}

impl<K: Key, V: Pod, A: BlockAlloc> TypedMap<K, V, A> {
    pub fn with_allocator(policy: GrowthPolicy, alloc: A) -> Self {
        Self {
            raw: OrderedMap::with_allocator(std::mem::size_of::<V>(), policy, alloc),
            _marker: PhantomData,
        }
    }

    #[inline]
    fn decode(bytes: &[u8]) -> V {
        bytemuck::pod_read_unaligned(bytes)
    }

    /// The underlying byte-level map.
    pub fn as_raw(&self) -> &OrderedMap<K, A> {
        &self.raw
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.raw.capacity()
    }

    pub fn insert_new(&mut self, key: K, value: V) -> Result<()> {
        self.raw.insert_new(key, bytemuck::bytes_of(&value))
    }

    pub fn set_existing(&mut self, key: K, value: V) -> Result<()> {
        self.raw.set_existing(key, bytemuck::bytes_of(&value))
    }

    pub fn set_or_insert(&mut self, key: K, value: V) -> Result<()> {
        self.raw.set_or_insert(key, bytemuck::bytes_of(&value))
    }

    pub fn get(&self, key: K) -> Option<V> {
        self.raw.get(key).map(Self::decode)
    }

    pub fn get_slot(&self, key: K) -> Option<(Slot, V)> {
        self.raw
            .get_slot(key)
            .map(|(slot, bytes)| (slot, Self::decode(bytes)))
    }

    /// Applies `f` to the value stored under `key` and writes the result back.
    pub fn update<F>(&mut self, key: K, f: F) -> Result<()>
    where
        F: FnOnce(V) -> V,
    {
        let slot = self.raw.get_mut(key).ok_or(Error::NotFound)?;
        let value = f(Self::decode(&*slot));
        slot.copy_from_slice(bytemuck::bytes_of(&value));
        Ok(())
    }

    #[inline]
    pub fn contains_key(&self, key: K) -> bool {
        self.raw.contains_key(key)
    }

    pub fn find_key(&self, value: &V) -> Option<K> {
        self.raw.find_key(bytemuck::bytes_of(value))
    }

    pub fn find_and_compare(&self, key: K, value: &V) -> bool {
        self.raw.find_and_compare(key, bytemuck::bytes_of(value))
    }

    pub fn any_value(&self) -> Option<V> {
        self.raw.any_value().map(Self::decode)
    }

    pub fn find_unused_key(&self) -> Option<K> {
        self.raw.find_unused_key()
    }

    /// Removes `key` and returns its value.
    pub fn remove(&mut self, key: K) -> Result<V> {
        let (slot, value) = self.get_slot(key).ok_or(Error::NotFound)?;
        self.raw.remove_slot(slot)?;
        Ok(value)
    }

    pub fn remove_value(&mut self, value: &V) -> Option<K> {
        self.raw.remove_value(bytemuck::bytes_of(value))
    }

    pub fn remove_slot(&mut self, slot: Slot) -> Result<K> {
        self.raw.remove_slot(slot)
    }

    pub fn retain<F>(&mut self, mut f: F)
    where
        F: FnMut(K, &V) -> bool,
    {
        self.raw.retain(|key, bytes| f(key, &Self::decode(bytes)));
    }

    /// Inserts or overwrites each pair in turn, stopping at the first
    /// allocation failure. Pairs applied before the failure stay applied.
    pub fn try_extend<I>(&mut self, iter: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
    {
        for (key, value) in iter {
            self.set_or_insert(key, value)?;
        }
        Ok(())
    }

    pub fn reserve(&mut self, additional: usize) -> Result<()> {
        self.raw.reserve(additional)
    }

    pub fn clear(&mut self) {
        self.raw.clear();
    }

    pub fn compact(&mut self) {
        self.raw.compact();
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (K, V)> + ExactSizeIterator + '_ {
        self.raw.iter().map(|(key, bytes)| (key, Self::decode(bytes)))
    }
}

impl<K: Key, V: Pod> Default for TypedMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Key, V: Pod, A: BlockAlloc + Clone> Clone for TypedMap<K, V, A> {
    fn clone(&self) -> Self {
        Self {
            raw: self.raw.clone(),
            _marker: PhantomData,
        }
    }
}

impl<K: Key, V: Pod + fmt::Debug, A: BlockAlloc> fmt::Debug for TypedMap<K, V, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: Key, V: Pod> FromIterator<(K, V)> for TypedMap<K, V> {
    /// Later pairs overwrite earlier ones with the same key.
    ///
    /// # Panics
    ///
    /// Panics if the block cannot be allocated.
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

impl<K: Key, V: Pod, A: BlockAlloc> Extend<(K, V)> for TypedMap<K, V, A> {
    /// # Panics
    ///
    /// Panics if the block cannot be grown. Use
    /// [`TypedMap::try_extend`] to handle that case.
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        if let Err(err) = self.try_extend(iter) {
            panic!("TypedMap::extend: {err}");
        }
    }
}
