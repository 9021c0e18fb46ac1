//! The raw memory seam underneath [`OrderedMap`](crate::OrderedMap).
//!
//! The map keeps its keys and values in a single byte block. It never touches
//! the global allocator directly; every size change goes through a
//! [`BlockAlloc`], which lets callers (and tests) observe or restrict
//! allocation.

use crate::error::{Error, Result};

/// Allocation primitive consumed by the map.
///
/// A block is a `Vec<u8>` whose `len()` is the usable byte size. On
/// failure, [`reallocate`](BlockAlloc::reallocate) must leave `block`
/// exactly as it was.
pub trait BlockAlloc {
    /// Allocates a zeroed block of `bytes` bytes.
    fn allocate(&mut self, bytes: usize) -> Result<Vec<u8>>;

    /// Resizes `block` to `bytes`, preserving the first `min(old, new)` bytes.
    fn reallocate(&mut self, block: &mut Vec<u8>, bytes: usize) -> Result<()>;

    /// Returns a block to the allocator.
    fn release(&mut self, block: Vec<u8>) {
        drop(block);
    }
}

/// The default allocator: the global heap, with failures reported instead of
/// aborting the process.
#[derive(Clone, Copy, Debug, Default)]
pub struct Heap;

impl BlockAlloc for Heap {
    fn allocate(&mut self, bytes: usize) -> Result<Vec<u8>> {
        let mut block = Vec::new();
        block
            .try_reserve_exact(bytes)
            .map_err(|_| Error::OutOfMemory { bytes })?;
        block.resize(bytes, 0);
        Ok(block)
    }

    fn reallocate(&mut self, block: &mut Vec<u8>, bytes: usize) -> Result<()> {
        if bytes > block.len() {
            block
                .try_reserve_exact(bytes - block.len())
                .map_err(|_| Error::OutOfMemory { bytes })?;
            block.resize(bytes, 0);
        } else {
            block.truncate(bytes);
            block.shrink_to_fit();
        }
        Ok(())
    }
}
