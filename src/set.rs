//! Sorted flat key set: an [`OrderedMap`] with zero-width values.

use std::fmt;

use crate::{BlockAlloc, GrowthPolicy, Heap, Key, Keys, OrderedMap, Result};

/// A sorted set of integer keys stored in one dense array.
///
/// ```rust
/// use soa_map::OrderedSet;
///
/// let mut ids: OrderedSet<u32> = OrderedSet::new();
/// for id in [0, 1, 3] {
///     ids.insert(id).unwrap();
/// }
/// assert_eq!(ids.find_unused_key(), Some(2));
/// ```
pub struct OrderedSet<K, A: BlockAlloc = Heap> {
    raw: OrderedMap<K, A>,
}

impl<K: Key> OrderedSet<K> {
    pub fn new() -> Self {
        Self::with_policy(GrowthPolicy::DEFAULT)
    }

    pub fn with_policy(policy: GrowthPolicy) -> Self {
        Self {
            raw: OrderedMap::with_policy(0, policy),
        }
    }
}

impl<K: Key, A: BlockAlloc> OrderedSet<K, A> {
    pub fn with_allocator(policy: GrowthPolicy, alloc: A) -> Self {
        Self {
            raw: OrderedMap::with_allocator(0, policy, alloc),
        }
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

    /// Adds `key`. Returns `Ok(false)` if it was already present.
    pub fn insert(&mut self, key: K) -> Result<bool> {
        match self.raw.insert_new(key, &[]) {
            Ok(()) => Ok(true),
            Err(crate::Error::KeyExists) => Ok(false),
            Err(err) => Err(err),
        }
    }

    #[inline]
    pub fn contains(&self, key: K) -> bool {
        self.raw.contains_key(key)
    }

    /// Removes `key`, returning whether it was present.
    pub fn remove(&mut self, key: K) -> bool {
        self.raw.remove(key).is_ok()
    }

    pub fn first(&self) -> Option<K> {
        self.raw.first().map(|(key, _)| key)
    }

    pub fn last(&self) -> Option<K> {
        self.raw.last().map(|(key, _)| key)
    }

    /// Smallest non-negative key not in the set.
    pub fn find_unused_key(&self) -> Option<K> {
        self.raw.find_unused_key()
    }

    /// Inserts and returns the smallest non-negative key not yet in the set.
    pub fn allocate_key(&mut self) -> Result<Option<K>> {
        let Some(key) = self.raw.find_unused_key() else {
            return Ok(None);
        };
        self.raw.insert_new(key, &[])?;
        Ok(Some(key))
    }

    pub fn retain<F>(&mut self, mut f: F)
    where
        F: FnMut(K) -> bool,
    {
        self.raw.retain(|key, _| f(key));
    }

    pub fn clear(&mut self) {
        self.raw.clear();
    }

    pub fn compact(&mut self) {
        self.raw.compact();
    }

    pub fn iter(&self) -> Keys<'_, K, A> {
        self.raw.keys()
    }
}

impl<K: Key> Default for OrderedSet<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Key, A: BlockAlloc + Clone> Clone for OrderedSet<K, A> {
    fn clone(&self) -> Self {
        Self {
            raw: self.raw.clone(),
        }
    }
}

impl<K: Key, A: BlockAlloc> fmt::Debug for OrderedSet<K, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<'a, K: Key, A: BlockAlloc> IntoIterator for &'a OrderedSet<K, A> {
    type Item = K;
    type IntoIter = Keys<'a, K, A>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
