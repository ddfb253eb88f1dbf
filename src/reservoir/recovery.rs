//! Startup recovery of the in-memory block-ring buffer (spec.md §4.7).
//!
//! The reservoir itself never persists anything; only the ring buffer that
//! the voting machine and proof-of-work window consult needs repopulating
//! from disk when the node restarts. Grounded on
//! `original_source/block/setup.go`'s `fillRingBuffer`: find the highest
//! stored block, seek a fetch cursor to the first height that still fits
//! in the ring, and walk forward, rejecting any gap in block numbers.

use crate::error::{FatalError, ReservoirResult};
use crate::traits::{BlockRing, BlockStore};

pub const GENESIS_BLOCK_NUMBER: u64 = 0;

/// Repopulate `ring` from `block_store`'s on-disk blocks. A store with
/// nothing on disk leaves the ring empty, which is not an error — a brand
/// new node has no history to recover.
pub fn recover_block_ring(block_store: &dyn BlockStore, ring: &dyn BlockRing) -> ReservoirResult<()> {
    ring.clear();

    let Some((height, _digest)) = block_store.last_element() else {
        return Ok(());
    };

    let ring_size = ring.size() as u64;
    let mut start = GENESIS_BLOCK_NUMBER + 1;
    if height > ring_size + 1 {
        start = height - ring_size + 1;
    }
    if start <= GENESIS_BLOCK_NUMBER {
        return Err(FatalError::InitialisationFailed.into());
    }

    let key = start.to_be_bytes();
    let mut cursor = block_store.new_fetch_cursor();
    cursor.seek(&key);

    let mut expected = start;
    for (item_key, packed) in cursor.fetch(ring_size as usize) {
        if item_key.len() < 8 {
            return Err(FatalError::InitialisationFailed.into());
        }
        let item_height = u64::from_be_bytes(item_key[..8].try_into().unwrap());
        if item_height != expected {
            return Err(FatalError::InitialisationFailed.into());
        }

        let digest = block_store
            .digest_for_block(item_height)
            .ok_or(FatalError::InitialisationFailed)?;
        ring.put(item_height, digest, packed);
        expected += 1;
    }

    Ok(())
}
