//! Packet buffer backed by DMA-coherent memory.
//!
//! The DataMover writes into this memory behind the CPU's back, so every
//! CPU access goes through volatile reads and writes.

use core::ptr::{self, NonNull};

use crate::driver::error::{DmaError, DmaResult};
use crate::hal::memory::{DmaAllocator, DmaRegion};
use crate::internal::constants::{TSIF_PKT_SIZE, TSIF_PKT_WORDS, TSIF_STATUS_OFFSET};
use crate::packet::PacketStatus;

/// Cyclic array of 192-byte packet slots.
#[derive(Debug, Default)]
pub struct PacketStore {
    region: Option<DmaRegion>,
    packets: u32,
}

impl PacketStore {
    /// Create an empty (unallocated) store
    #[must_use]
    pub const fn new() -> Self {
        Self {
            region: None,
            packets: 0,
        }
    }

    /// Whether a buffer is currently held
    #[inline(always)]
    #[must_use]
    pub const fn is_allocated(&self) -> bool {
        self.region.is_some()
    }

    /// Packet slots in the held buffer (0 when unallocated)
    #[inline(always)]
    #[must_use]
    pub const fn packets(&self) -> u32 {
        self.packets
    }

    /// Allocate a buffer for `packets` slots.
    ///
    /// Every status dword is cleared so no slot reads as valid before the
    /// DataMover has written it.
    pub fn allocate<A: DmaAllocator>(&mut self, alloc: &mut A, packets: u32) -> DmaResult<()> {
        if self.region.is_some() {
            self.free(alloc);
        }

        let len = packets as usize * TSIF_PKT_SIZE;
        let region = alloc
            .alloc_coherent(len)
            .ok_or(DmaError::AllocationFailed)?;
        if region.len() < len {
            alloc.free_coherent(region);
            return Err(DmaError::AllocationFailed);
        }

        self.region = Some(region);
        self.packets = packets;
        self.invalidate(0, packets);
        Ok(())
    }

    /// Return the buffer to the allocator
    pub fn free<A: DmaAllocator>(&mut self, alloc: &mut A) {
        if let Some(region) = self.region.take() {
            alloc.free_coherent(region);
        }
        self.packets = 0;
    }

    /// CPU pointer to the first slot
    #[must_use]
    pub fn base_ptr(&self) -> Option<NonNull<u8>> {
        self.region.as_ref().map(DmaRegion::cpu_ptr)
    }

    /// Bus address of the first slot
    #[must_use]
    pub fn base_bus_addr(&self) -> Option<u32> {
        self.region.as_ref().map(DmaRegion::bus_addr)
    }

    /// Bus address of slot `index`
    #[must_use]
    pub fn bus_addr(&self, index: u32) -> Option<u32> {
        if index >= self.packets {
            return None;
        }
        let base = self.base_bus_addr()?;
        Some(base + index * TSIF_PKT_SIZE as u32)
    }

    /// Word pointer to the start of slot `index`
    fn slot_ptr(&self, index: u32) -> Option<*mut u32> {
        if index >= self.packets {
            return None;
        }
        let region = self.region.as_ref()?;
        let offset = index as usize * TSIF_PKT_SIZE;
        // SAFETY: index < packets and the region covers packets * 192 bytes.
        Some(unsafe { region.cpu_ptr().as_ptr().add(offset) }.cast::<u32>())
    }

    /// Copy slot `index` into `out` and return its status
    pub fn copy_packet(&self, index: u32, out: &mut [u8; TSIF_PKT_SIZE]) -> Option<PacketStatus> {
        let src = self.slot_ptr(index)?;
        for (word, dst) in out.chunks_exact_mut(4).enumerate().take(TSIF_PKT_WORDS) {
            // SAFETY: word < TSIF_PKT_WORDS keeps the read inside the slot;
            // the region is 4-byte aligned and 192 is a multiple of 4.
            let value = unsafe { ptr::read_volatile(src.add(word)) };
            dst.copy_from_slice(&value.to_ne_bytes());
        }
        Some(PacketStatus::from_packet(out))
    }

    /// Status dword of slot `index`
    #[must_use]
    pub fn status(&self, index: u32) -> Option<PacketStatus> {
        let slot = self.slot_ptr(index)?;
        // SAFETY: the status dword is the last word of the slot.
        let raw = unsafe { ptr::read_volatile(slot.add(TSIF_STATUS_OFFSET / 4)) };
        Some(PacketStatus::from_raw(u32::from_le(raw)))
    }

    /// Clear the status dword of `count` slots starting at `first`.
    ///
    /// The range wraps around the end of the buffer.
    pub fn invalidate(&mut self, first: u32, count: u32) {
        if self.packets == 0 {
            return;
        }
        for i in 0..count.min(self.packets) {
            let index = (first + i) % self.packets;
            if let Some(slot) = self.slot_ptr(index) {
                // SAFETY: the status dword is the last word of the slot.
                unsafe { ptr::write_volatile(slot.add(TSIF_STATUS_OFFSET / 4), 0) };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::status_bits;
    use crate::testing::MockAllocator;

    #[test]
    fn allocate_and_free() {
        let mut alloc = MockAllocator::new();
        let mut store = PacketStore::new();
        assert!(!store.is_allocated());

        store.allocate(&mut alloc, 128).unwrap();
        assert!(store.is_allocated());
        assert_eq!(store.packets(), 128);
        assert_eq!(alloc.live_allocations(), 1);
        assert_eq!(alloc.last_request(), Some(128 * 192));

        store.free(&mut alloc);
        assert!(!store.is_allocated());
        assert_eq!(store.packets(), 0);
        assert_eq!(alloc.live_allocations(), 0);
    }

    #[test]
    fn allocation_failure_reported() {
        let mut alloc = MockAllocator::new();
        alloc.fail_next();
        let mut store = PacketStore::new();
        assert_eq!(
            store.allocate(&mut alloc, 128),
            Err(DmaError::AllocationFailed)
        );
        assert!(!store.is_allocated());
    }

    #[test]
    fn short_region_rejected_and_returned() {
        let mut alloc = MockAllocator::new();
        alloc.shrink_next(100);
        let mut store = PacketStore::new();
        assert_eq!(
            store.allocate(&mut alloc, 128),
            Err(DmaError::AllocationFailed)
        );
        assert_eq!(alloc.live_allocations(), 0);
    }

    #[test]
    fn bus_addresses_step_by_packet() {
        let mut alloc = MockAllocator::new();
        let mut store = PacketStore::new();
        assert_eq!(store.bus_addr(0), None);

        store.allocate(&mut alloc, 128).unwrap();
        let base = store.base_bus_addr().unwrap();
        assert_eq!(store.bus_addr(0), Some(base));
        assert_eq!(store.bus_addr(16), Some(base + 16 * 192));
        assert_eq!(store.bus_addr(128), None);
    }

    #[test]
    fn fresh_buffer_has_no_valid_packets() {
        let mut alloc = MockAllocator::new();
        alloc.fill_with(0xFF);
        let mut store = PacketStore::new();
        store.allocate(&mut alloc, 32).unwrap();

        for i in 0..32 {
            assert!(!store.status(i).unwrap().is_valid());
        }
    }

    #[test]
    fn copy_packet_reads_payload_and_status() {
        let mut alloc = MockAllocator::new();
        let mut store = PacketStore::new();
        store.allocate(&mut alloc, 32).unwrap();

        let status = status_bits::VALID | status_bits::FIRST | 0x00_1234;
        let mut pkt = [0u8; TSIF_PKT_SIZE];
        pkt[0] = 0x47;
        pkt[187] = 0xAB;
        pkt[188..].copy_from_slice(&status.to_le_bytes());
        alloc.write_packet(5, &pkt);

        let mut out = [0u8; TSIF_PKT_SIZE];
        let got = store.copy_packet(5, &mut out).unwrap();
        assert_eq!(out, pkt);
        assert!(got.is_valid());
        assert!(got.is_first());
        assert_eq!(got.timestamp(), 0x1234);
        assert_eq!(store.status(5), Some(got));
        assert!(store.copy_packet(32, &mut out).is_none());
    }

    #[test]
    fn invalidate_wraps_around_end() {
        let mut alloc = MockAllocator::new();
        let mut store = PacketStore::new();
        store.allocate(&mut alloc, 32).unwrap();

        let mut pkt = [0u8; TSIF_PKT_SIZE];
        pkt[188..].copy_from_slice(&status_bits::VALID.to_le_bytes());
        for i in 0..32 {
            alloc.write_packet(i, &pkt);
        }

        store.invalidate(28, 8);
        for i in 0..32 {
            let cleared = !(4..28).contains(&i);
            assert_eq!(!store.status(i).unwrap().is_valid(), cleared, "slot {i}");
        }
    }
}
