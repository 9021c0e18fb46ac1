//! Iteration over an [`OrderedMap`] in ascending key order.

use std::iter::FusedIterator;

use crate::{BlockAlloc, Key, OrderedMap};

/// Iterator over `(key, value)` pairs, ascending by key.
pub struct Iter<'a, K, A: BlockAlloc> {
    map: &'a OrderedMap<K, A>,
    front: usize,
    back: usize,
}

impl<'a, K: Key, A: BlockAlloc> Iter<'a, K, A> {
    pub(crate) fn new(map: &'a OrderedMap<K, A>) -> Self {
        Self {
            map,
            front: 0,
            back: map.len(),
        }
    }
}

impl<'a, K: Key, A: BlockAlloc> Iterator for Iter<'a, K, A> {
    type Item = (K, &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            return None;
        }
        let idx = self.front;
        self.front += 1;
        Some((self.map.key_at(idx), self.map.value_at(idx)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.back - self.front;
        (n, Some(n))
    }
}

impl<K: Key, A: BlockAlloc> DoubleEndedIterator for Iter<'_, K, A> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            return None;
        }
        self.back -= 1;
        Some((self.map.key_at(self.back), self.map.value_at(self.back)))
    }
}

impl<K: Key, A: BlockAlloc> ExactSizeIterator for Iter<'_, K, A> {}

impl<K: Key, A: BlockAlloc> FusedIterator for Iter<'_, K, A> {}

/// Iterator over keys, ascending.
pub struct Keys<'a, K, A: BlockAlloc> {
    inner: Iter<'a, K, A>,
}

impl<'a, K: Key, A: BlockAlloc> Keys<'a, K, A> {
    pub(crate) fn new(map: &'a OrderedMap<K, A>) -> Self {
        Self {
            inner: Iter::new(map),
        }
    }
}

impl<K: Key, A: BlockAlloc> Iterator for Keys<'_, K, A> {
    type Item = K;

    fn next(&mut self) -> Option<K> {
        self.inner.next().map(|(key, _)| key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K: Key, A: BlockAlloc> DoubleEndedIterator for Keys<'_, K, A> {
    fn next_back(&mut self) -> Option<K> {
        self.inner.next_back().map(|(key, _)| key)
    }
}

impl<K: Key, A: BlockAlloc> ExactSizeIterator for Keys<'_, K, A> {}

/// Iterator over value slots, in key order.
pub struct Values<'a, K, A: BlockAlloc> {
    inner: Iter<'a, K, A>,
}

impl<'a, K: Key, A: BlockAlloc> Values<'a, K, A> {
    pub(crate) fn new(map: &'a OrderedMap<K, A>) -> Self {
        Self {
            inner: Iter::new(map),
        }
    }
}

impl<'a, K: Key, A: BlockAlloc> Iterator for Values<'a, K, A> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<&'a [u8]> {
        self.inner.next().map(|(_, value)| value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'a, K: Key, A: BlockAlloc> DoubleEndedIterator for Values<'a, K, A> {
    fn next_back(&mut self) -> Option<&'a [u8]> {
        self.inner.next_back().map(|(_, value)| value)
    }
}

impl<K: Key, A: BlockAlloc> ExactSizeIterator for Values<'_, K, A> {}

/// A forward cursor that may remove the entry it last yielded.
///
/// Unlike [`Iter`], the cursor holds the map mutably, so the only mutation
/// possible mid-walk is [`remove_current`](Cursor::remove_current) (plus
/// writes through the yielded value slot).
///
/// ```rust
/// use soa_map::OrderedMap;
///
/// let mut map: OrderedMap<u32> = OrderedMap::new(1);
/// for k in 0..6 {
///     map.insert_new(k, &[k as u8]).unwrap();
/// }
///
/// let mut cursor = map.cursor();
/// while let Some((key, _)) = cursor.next_entry() {
///     if key % 2 == 1 {
///         cursor.remove_current();
///     }
/// }
/// assert_eq!(map.keys().collect::<Vec<_>>(), vec![0, 2, 4]);
/// ```
pub struct Cursor<'a, K, A: BlockAlloc> {
    map: &'a mut OrderedMap<K, A>,
    /// Index of the entry the next call to `next_entry` yields.
    next: usize,
    /// Index of the entry last yielded, until it is removed.
    current: Option<usize>,
}

impl<'a, K: Key, A: BlockAlloc> Cursor<'a, K, A> {
    pub(crate) fn new(map: &'a mut OrderedMap<K, A>) -> Self {
        Self {
            map,
            next: 0,
            current: None,
        }
    }

    /// Advances to the next entry, yielding its key and a writable value slot.
    pub fn next_entry(&mut self) -> Option<(K, &mut [u8])> {
        if self.next >= self.map.len() {
            self.current = None;
            return None;
        }
        let idx = self.next;
        self.next += 1;
        self.current = Some(idx);
        Some((self.map.key_at(idx), self.map.value_at_mut(idx)))
    }

    /// Removes the entry last yielded by [`next_entry`](Cursor::next_entry)
    /// and returns its key. The following `next_entry` yields the entry that
    /// slid into the removed position.
    ///
    /// Returns `None` if there is no current entry, either because iteration
    /// has not started or because the current entry was already removed.
    pub fn remove_current(&mut self) -> Option<K> {
        let idx = self.current.take()?;
        let key = self.map.remove_index(idx).ok()?;
        self.next = idx;
        Some(key)
    }

    /// Number of entries left to yield.
    pub fn remaining(&self) -> usize {
        self.map.len() - self.next
    }
}
