//! Cyclic read/write indices over the packet buffer.
//!
//! Three indices walk the same ring of `N` packet slots:
//!
//! - `ri`: next packet the client will read
//! - `wi`: one past the last packet the DataMover has completed
//! - `dmwi`: one past the last packet handed to the DataMover
//!
//! `wi` always lies in `[ri, dmwi]` cyclically. Each index has one writer:
//! the client moves `ri`, completion handling moves `wi`, the scheduler
//! moves `dmwi`.

use crate::driver::error::{IoError, IoResult};

/// Index state for the cyclic packet buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexTracker {
    /// Packet slots in the ring
    len: u32,
    /// Packets per DataMover transfer
    chunk: u32,
    ri: u32,
    wi: u32,
    dmwi: u32,
}

impl IndexTracker {
    /// Create a tracker for `len` slots moved `chunk` packets at a time
    #[must_use]
    pub const fn new(len: u32, chunk: u32) -> Self {
        Self {
            len,
            chunk,
            ri: 0,
            wi: 0,
            dmwi: 0,
        }
    }

    /// Number of packet slots
    #[cfg(test)]
    #[inline(always)]
    #[must_use]
    pub const fn len(&self) -> u32 {
        self.len
    }

    /// Check if the ring has no slots
    #[cfg(test)]
    #[inline(always)]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Packets moved per transfer
    #[inline(always)]
    #[must_use]
    pub const fn chunk_len(&self) -> u32 {
        self.chunk
    }

    /// Read index
    #[inline(always)]
    #[must_use]
    pub const fn ri(&self) -> u32 {
        self.ri
    }

    /// Write index
    #[inline(always)]
    #[must_use]
    pub const fn wi(&self) -> u32 {
        self.wi
    }

    /// DataMover write index
    #[inline(always)]
    #[must_use]
    pub const fn dmwi(&self) -> u32 {
        self.dmwi
    }

    /// `(to - from) mod len`
    #[inline(always)]
    const fn distance(&self, from: u32, to: u32) -> u32 {
        if self.len == 0 {
            return 0;
        }
        (to + self.len - from) % self.len
    }

    /// Packets written and not yet reclaimed
    #[inline(always)]
    #[must_use]
    pub const fn available_count(&self) -> u32 {
        self.distance(self.ri, self.wi)
    }

    /// Packets from `ri` up to the last scheduled slot
    #[inline(always)]
    #[must_use]
    pub const fn scheduled_count(&self) -> u32 {
        self.distance(self.ri, self.dmwi)
    }

    /// Slots the scheduler may still claim
    ///
    /// One slot is always kept back so that `dmwi == ri` means empty.
    #[inline(always)]
    #[must_use]
    pub const fn free_count(&self) -> u32 {
        if self.len == 0 {
            return 0;
        }
        self.len - 1 - self.scheduled_count()
    }

    /// Packets handed to the DataMover but not yet completed
    #[inline(always)]
    #[must_use]
    pub const fn in_flight_count(&self) -> u32 {
        self.distance(self.wi, self.dmwi)
    }

    /// Whether claiming another chunk would run into unread packets
    #[inline(always)]
    #[must_use]
    pub const fn would_overflow(&self) -> bool {
        self.free_count() < self.chunk
    }

    /// `dmwi` one chunk further, wrapped
    #[inline(always)]
    #[must_use]
    pub const fn next_dmwi(&self) -> u32 {
        (self.dmwi + self.chunk) % self.len
    }

    /// Claim the chunk at `dmwi` for a transfer.
    ///
    /// Returns the first slot of the claimed chunk.
    #[inline]
    pub fn claim_chunk(&mut self) -> u32 {
        let first = self.dmwi;
        self.dmwi = self.next_dmwi();
        first
    }

    /// Give back a chunk claimed by [`IndexTracker::claim_chunk`]
    #[inline]
    pub fn unclaim_chunk(&mut self, first: u32) {
        self.dmwi = first;
    }

    /// Publish completed packets up to `wi`
    #[inline]
    pub fn set_wi(&mut self, wi: u32) {
        self.wi = wi % self.len;
    }

    /// Hand packets `[ri, new_ri)` back to the producer.
    ///
    /// `new_ri` must lie in `[ri, wi]` cyclically; anything else is
    /// rejected and leaves the indices unchanged.
    pub fn reclaim(&mut self, new_ri: u32) -> IoResult<()> {
        if new_ri >= self.len {
            return Err(IoError::InvalidIndex);
        }
        if self.distance(self.ri, new_ri) > self.available_count() {
            return Err(IoError::InvalidIndex);
        }
        self.ri = new_ri;
        Ok(())
    }

    /// Set all indices to 0
    #[inline]
    pub fn reset(&mut self) {
        self.ri = 0;
        self.wi = 0;
        self.dmwi = 0;
    }

    /// Reset and switch to a new geometry
    pub fn reconfigure(&mut self, len: u32, chunk: u32) {
        self.len = len;
        self.chunk = chunk;
        self.reset();
    }
}

// =============================================================================
// Tests
// =============================================================================
