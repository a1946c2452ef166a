//! Testing utilities and mock implementations
//!
//! This module provides mock implementations of the HAL traits for
//! exercising the TSIF driver on the host without hardware access.
//!
//! Only available when running `cargo test`.

// Note: The #[cfg(test)] attribute is applied in lib.rs where this module is declared
#![allow(missing_docs)]
#![allow(clippy::std_instead_of_core, clippy::std_instead_of_alloc)]

extern crate std;

use core::cell::RefCell;
use core::ptr::NonNull;
use core::sync::atomic::{AtomicU32, Ordering};
use std::boxed::Box;
use std::collections::VecDeque;
use std::vec;
use std::vec::Vec;

use crate::driver::config::TsifMode;
use crate::driver::error::{DmaError, DmaResult, Result};
use crate::driver::status::StreamStatus;
use crate::driver::tsif::TsifClient;
use crate::hal::datamover::{BoxCommand, DataMover, XferResult, XferSlot};
use crate::hal::memory::{DmaAllocator, DmaRegion};
use crate::hal::stream::StreamControl;
use crate::internal::constants::TSIF_PKT_SIZE;

// =============================================================================
// Mock Allocator
// =============================================================================

/// Fake bus address of the first allocation
pub const MOCK_BUS_BASE: u32 = 0x1000_0000;

/// Spacing between fake bus addresses of successive allocations
const MOCK_BUS_STRIDE: u32 = 0x0100_0000;

struct MockBlock {
    bus: u32,
    words: *mut [u32],
}

/// Heap-backed stand-in for a coherent DMA pool
///
/// # Example
///
/// ```ignore
/// let mut alloc = MockAllocator::new();
/// let region = alloc.alloc_coherent(192).unwrap();
/// assert_eq!(alloc.live_allocations(), 1);
/// alloc.free_coherent(region);
/// ```
pub struct MockAllocator {
    live: Vec<MockBlock>,
    allocations: u32,
    frees: u32,
    last_request: Option<usize>,
    fail_next: bool,
    shrink_next: Option<usize>,
    fill: u8,
}

impl Default for MockAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl MockAllocator {
    pub fn new() -> Self {
        Self {
            live: Vec::new(),
            allocations: 0,
            frees: 0,
            last_request: None,
            fail_next: false,
            shrink_next: None,
            fill: 0,
        }
    }

    /// Make the next allocation fail
    pub fn fail_next(&mut self) {
        self.fail_next = true;
    }

    /// Make the next allocation return only `len` bytes
    pub fn shrink_next(&mut self, len: usize) {
        self.shrink_next = Some(len);
    }

    /// Byte pattern for new allocations
    pub fn fill_with(&mut self, byte: u8) {
        self.fill = byte;
    }

    pub fn live_allocations(&self) -> usize {
        self.live.len()
    }

    pub fn total_allocations(&self) -> u32 {
        self.allocations
    }

    pub fn total_frees(&self) -> u32 {
        self.frees
    }

    pub fn last_request(&self) -> Option<usize> {
        self.last_request
    }

    /// Simulate the DataMover writing one packet into the newest allocation
    pub fn write_packet(&mut self, slot: u32, packet: &[u8; TSIF_PKT_SIZE]) {
        let block = self.live.last().expect("no live allocation");
        // SAFETY: the block stays live until freed; tests never overlap
        // this write with a driver access.
        let words = unsafe { &mut *block.words };
        let first = slot as usize * TSIF_PKT_SIZE / 4;
        for (i, bytes) in packet.chunks_exact(4).enumerate() {
            let mut word = [0u8; 4];
            word.copy_from_slice(bytes);
            words[first + i] = u32::from_ne_bytes(word);
        }
    }
}

impl DmaAllocator for MockAllocator {
    fn alloc_coherent(&mut self, len: usize) -> Option<DmaRegion> {
        self.last_request = Some(len);
        if core::mem::take(&mut self.fail_next) {
            return None;
        }
        let len = self.shrink_next.take().unwrap_or(len);
        let pattern = u32::from_ne_bytes([self.fill; 4]);
        let words = Box::into_raw(vec![pattern; len.div_ceil(4)].into_boxed_slice());
        let bus = MOCK_BUS_BASE + self.allocations * MOCK_BUS_STRIDE;
        self.allocations += 1;
        self.live.push(MockBlock { bus, words });

        let cpu = NonNull::new(words.cast::<u8>())?;
        // SAFETY: the boxed slice covers `len` bytes and lives until freed.
        Some(unsafe { DmaRegion::new(cpu, bus, len) })
    }

    fn free_coherent(&mut self, region: DmaRegion) {
        let pos = self
            .live
            .iter()
            .position(|b| b.bus == region.bus_addr())
            .expect("freeing unknown region");
        let block = self.live.swap_remove(pos);
        // SAFETY: produced by Box::into_raw in alloc_coherent.
        drop(unsafe { Box::from_raw(block.words) });
        self.frees += 1;
    }
}

impl Drop for MockAllocator {
    fn drop(&mut self) {
        for block in self.live.drain(..) {
            // SAFETY: produced by Box::into_raw in alloc_coherent.
            drop(unsafe { Box::from_raw(block.words) });
        }
    }
}

// =============================================================================
// Mock DataMover
// =============================================================================

/// DataMover that completes transfers only when told to
///
/// Enqueued transfers wait in submission order until the test calls
/// [`MockDataMover::complete_next`] or the driver flushes.
#[derive(Debug, Default)]
pub struct MockDataMover {
    commands: Vec<(XferSlot, BoxCommand)>,
    in_flight: VecDeque<XferSlot>,
    results: VecDeque<(XferSlot, XferResult)>,
    flushes: u32,
    fail_enqueue: bool,
    hung: bool,
}

impl MockDataMover {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every command enqueued so far
    pub fn commands(&self) -> &[(XferSlot, BoxCommand)] {
        &self.commands
    }

    pub fn last_command(&self) -> Option<(XferSlot, BoxCommand)> {
        self.commands.last().copied()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    pub fn flush_count(&self) -> u32 {
        self.flushes
    }

    /// Reject subsequent enqueues
    pub fn set_fail_enqueue(&mut self, fail: bool) {
        self.fail_enqueue = fail;
    }

    /// Ignore flush requests
    pub fn set_hung(&mut self, hung: bool) {
        self.hung = hung;
    }

    /// Finish the oldest in-flight transfer with `result`
    pub fn complete_next(&mut self, result: XferResult) -> Option<XferSlot> {
        let slot = self.in_flight.pop_front()?;
        self.results.push_back((slot, result));
        Some(slot)
    }

    /// Queue a completion for a slot that has nothing in flight
    pub fn inject_result(&mut self, slot: XferSlot, result: XferResult) {
        self.results.push_back((slot, result));
    }
}

impl DataMover for MockDataMover {
    fn enqueue(&mut self, slot: XferSlot, cmd: &BoxCommand) -> DmaResult<()> {
        if self.fail_enqueue {
            return Err(DmaError::EnqueueFailed);
        }
        self.commands.push((slot, *cmd));
        self.in_flight.push_back(slot);
        Ok(())
    }

    fn flush(&mut self) {
        self.flushes += 1;
        if self.hung {
            return;
        }
        while let Some(slot) = self.in_flight.pop_front() {
            self.results.push_back((slot, XferResult::Flush));
        }
    }

    fn poll_result(&mut self) -> Option<(XferSlot, XferResult)> {
        self.results.pop_front()
    }
}

// =============================================================================
// Mock Stream Control
// =============================================================================

/// Receiver stand-in recording enable/disable calls
#[derive(Debug, Default)]
pub struct MockStream {
    enabled: bool,
    enables: u32,
    disables: u32,
    last_enable: Option<(TsifMode, u32)>,
    fail_enable: Option<crate::driver::error::Error>,
    pending: StreamStatus,
}

impl MockStream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn enable_count(&self) -> u32 {
        self.enables
    }

    pub fn disable_count(&self) -> u32 {
        self.disables
    }

    pub fn last_enable(&self) -> Option<(TsifMode, u32)> {
        self.last_enable
    }

    /// Make the next enable fail with `err`
    pub fn fail_next_enable(&mut self, err: crate::driver::error::Error) {
        self.fail_enable = Some(err);
    }

    /// Latch status flags for the next read
    pub fn raise(&mut self, status: StreamStatus) {
        self.pending = self.pending.merge(status);
    }
}

impl StreamControl for MockStream {
    fn enable(&mut self, mode: TsifMode, time_limit: u32) -> Result<()> {
        if let Some(err) = self.fail_enable.take() {
            return Err(err);
        }
        self.enabled = true;
        self.enables += 1;
        self.last_enable = Some((mode, time_limit));
        Ok(())
    }

    fn disable(&mut self) {
        self.enabled = false;
        self.disables += 1;
    }

    fn take_status(&mut self) -> StreamStatus {
        core::mem::take(&mut self.pending)
    }
}

// =============================================================================
// Mock Delay
// =============================================================================

/// Mock delay for testing without actual timing
///
/// Records delays for verification without actually waiting.
#[derive(Debug, Default)]
pub struct MockDelay {
    /// Total nanoseconds delayed
    total_ns: RefCell<u64>,
    calls: RefCell<u32>,
}

impl MockDelay {
    /// Create a new mock delay
    pub fn new() -> Self {
        Self::default()
    }

    /// Get total nanoseconds that were "delayed"
    pub fn total_ns(&self) -> u64 {
        *self.total_ns.borrow()
    }

    /// Get total milliseconds that were "delayed"
    pub fn total_ms(&self) -> u64 {
        self.total_ns() / 1_000_000
    }

    /// Number of delay calls
    pub fn calls(&self) -> u32 {
        *self.calls.borrow()
    }
}

impl embedded_hal::delay::DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        *self.total_ns.borrow_mut() += ns as u64;
        *self.calls.borrow_mut() += 1;
    }

    fn delay_ms(&mut self, ms: u32) {
        *self.total_ns.borrow_mut() += ms as u64 * 1_000_000;
        *self.calls.borrow_mut() += 1;
    }
}

// =============================================================================
// Counting Client
// =============================================================================

/// Client that counts notifications
#[derive(Debug, Default)]
pub struct CountingClient {
    notified: AtomicU32,
}

impl CountingClient {
    /// Leak a fresh client so it can be attached for `'static`
    pub fn leak() -> &'static CountingClient {
        Box::leak(Box::new(CountingClient::default()))
    }

    pub fn count(&self) -> u32 {
        self.notified.load(Ordering::SeqCst)
    }
}

impl TsifClient for CountingClient {
    fn notify(&self) {
        self.notified.fetch_add(1, Ordering::SeqCst);
    }
}

// =============================================================================
// Packet Helpers
// =============================================================================

/// Build a packet whose status dword is `status`
pub fn packet_with_status(status: u32) -> [u8; TSIF_PKT_SIZE] {
    let mut pkt = [0u8; TSIF_PKT_SIZE];
    pkt[0] = 0x47;
    pkt[TSIF_PKT_SIZE - 4..].copy_from_slice(&status.to_le_bytes());
    pkt
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::delay::DelayNs;

    #[test]
    fn mock_allocator_tracks_blocks() {
        let mut alloc = MockAllocator::new();
        let a = alloc.alloc_coherent(192).unwrap();
        let b = alloc.alloc_coherent(384).unwrap();
        assert_eq!(a.bus_addr(), MOCK_BUS_BASE);
        assert_ne!(a.bus_addr(), b.bus_addr());
        assert_eq!(b.len(), 384);
        assert_eq!(alloc.live_allocations(), 2);

        alloc.free_coherent(a);
        alloc.free_coherent(b);
        assert_eq!(alloc.live_allocations(), 0);
        assert_eq!(alloc.total_frees(), 2);
    }

    #[test]
    fn mock_allocator_failure_is_one_shot() {
        let mut alloc = MockAllocator::new();
        alloc.fail_next();
        assert!(alloc.alloc_coherent(192).is_none());
        let region = alloc.alloc_coherent(192).unwrap();
        alloc.free_coherent(region);
    }

    #[test]
    fn mock_datamover_completes_in_order() {
        let mut dm = MockDataMover::new();
        let cmd = BoxCommand::for_packets(MOCK_BUS_BASE, 16);
        dm.enqueue(XferSlot::Slot0, &cmd).unwrap();
        dm.enqueue(XferSlot::Slot1, &cmd).unwrap();
        assert_eq!(dm.in_flight(), 2);

        assert_eq!(dm.complete_next(XferResult::Done), Some(XferSlot::Slot0));
        assert_eq!(dm.poll_result(), Some((XferSlot::Slot0, XferResult::Done)));
        assert_eq!(dm.poll_result(), None);

        dm.flush();
        assert_eq!(dm.poll_result(), Some((XferSlot::Slot1, XferResult::Flush)));
        assert_eq!(dm.in_flight(), 0);
    }

    #[test]
    fn mock_datamover_hung_ignores_flush() {
        let mut dm = MockDataMover::new();
        dm.set_hung(true);
        dm.enqueue(XferSlot::Slot0, &BoxCommand::default()).unwrap();
        dm.flush();
        assert_eq!(dm.poll_result(), None);
        assert_eq!(dm.flush_count(), 1);
    }

    #[test]
    fn mock_stream_status_is_read_once() {
        let mut stream = MockStream::new();
        stream.raise(StreamStatus {
            lost_sync: true,
            ..Default::default()
        });
        assert!(stream.take_status().lost_sync);
        assert!(!stream.take_status().any());
    }

    #[test]
    fn mock_delay_tracking() {
        let mut delay = MockDelay::new();

        delay.delay_ns(1000);
        delay.delay_ns(2000);

        assert_eq!(delay.total_ns(), 3000);
        assert_eq!(delay.total_ms(), 0); // Less than 1ms

        delay.delay_ms(10);
        assert_eq!(delay.total_ms(), 10);
        assert_eq!(delay.calls(), 3);
    }

    #[test]
    fn counting_client_counts() {
        let client = CountingClient::leak();
        client.notify();
        client.notify();
        assert_eq!(client.count(), 2);
    }
}
