//! Error types for the `soa-map` crate

/// Failures reported by [`OrderedMap`](crate::OrderedMap) and its facades.
///
/// Every fallible operation returns one of these as a value. Insertion paths
/// attempt capacity growth before writing anything, so an error from an
/// insertion leaves the map exactly as it was.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The block allocator could not provide `bytes` bytes.
    #[error("failed to allocate {bytes} bytes for the key/value block")]
    OutOfMemory {
        /// Total size of the block that was requested.
        bytes: usize,
    },

    /// A capacity or byte-size computation overflowed `usize`.
    #[error("capacity computation overflowed")]
    CapacityOverflow,

    /// `insert_new` was called with a key that is already present.
    #[error("key already exists")]
    KeyExists,

    /// A key-addressed operation named a key that is not present.
    #[error("key not found")]
    NotFound,

    /// A value slice does not match the map's fixed value size.
    #[error("value is {actual} bytes, map stores {expected}-byte values")]
    ValueSize {
        /// The map's value slot size.
        expected: usize,
        /// Length of the slice that was passed in.
        actual: usize,
    },

    /// An index-addressed removal named a position past the live entries.
    #[error("index {index} out of bounds for map of length {len}")]
    IndexOutOfBounds {
        /// Requested index.
        index: usize,
        /// Number of live entries at the time of the call.
        len: usize,
    },

    /// A [`Slot`](crate::Slot) was used after the map it came from was mutated.
    #[error("slot handle is stale; the map was mutated after it was issued")]
    StaleSlot,

    /// A growth policy with `expansion_factor < 2` or `min_capacity == 0`.
    #[error("invalid growth policy: min_capacity {min_capacity}, expansion_factor {expansion_factor}")]
    InvalidGrowthPolicy {
        /// Requested minimum capacity.
        min_capacity: usize,
        /// Requested expansion factor.
        expansion_factor: usize,
    },
}

/// Shorthand used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;
