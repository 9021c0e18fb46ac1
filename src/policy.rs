//! Amortized growth configuration.

use crate::error::{Error, Result};

/// Capacity of the first allocation, and the floor for every growth target.
pub const DEFAULT_MIN_CAPACITY: usize = 32;

/// Multiplier applied to the capacity when an insertion finds the map full.
pub const DEFAULT_EXPANSION_FACTOR: usize = 2;

/// How an [`OrderedMap`](crate::OrderedMap) sizes its block as it grows.
///
/// Only insertions and [`reserve`](crate::OrderedMap::reserve) consult the
/// policy. Compaction always shrinks to the exact live count.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GrowthPolicy {
    min_capacity: usize,
    expansion_factor: usize,
}

impl GrowthPolicy {
    pub const DEFAULT: GrowthPolicy = GrowthPolicy {
        min_capacity: DEFAULT_MIN_CAPACITY,
        expansion_factor: DEFAULT_EXPANSION_FACTOR,
    };

    /// Builds a policy, rejecting a zero floor or a factor that would not grow.
    pub fn new(min_capacity: usize, expansion_factor: usize) -> Result<Self> {
        if min_capacity == 0 || expansion_factor < 2 {
            return Err(Error::InvalidGrowthPolicy {
                min_capacity,
                expansion_factor,
            });
        }
        Ok(Self {
            min_capacity,
            expansion_factor,
        })
    }

    #[inline]
    pub fn min_capacity(&self) -> usize {
        self.min_capacity
    }

    #[inline]
    pub fn expansion_factor(&self) -> usize {
        self.expansion_factor
    }

    /// Capacity to grow to when a map holding `capacity` slots is full.
    pub(crate) fn grown(&self, capacity: usize) -> Result<usize> {
        let target = capacity
            .checked_mul(self.expansion_factor)
            .ok_or(Error::CapacityOverflow)?;
        Ok(target.max(self.min_capacity))
    }

    /// Smallest growth target that holds at least `needed` slots.
    pub(crate) fn grown_to_fit(&self, capacity: usize, needed: usize) -> Result<usize> {
        let mut target = self.grown(capacity)?;
        while target < needed {
            target = self.grown(target)?;
        }
        Ok(target)
    }
}

impl Default for GrowthPolicy {
    fn default() -> Self {
        Self::DEFAULT
    }
}
