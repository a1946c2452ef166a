//! TSIF Driver
//!
//! This module provides the main TSIF driver. It ties the packet store, the
//! index tracker and the two DataMover transfer slots into a cyclic capture
//! buffer that a single client drains at its own pace.
//!
//! # Execution contexts
//!
//! | Context   | Entry point                         |
//! |-----------|-------------------------------------|
//! | Interrupt | [`Tsif::handle_interrupt`], [`Tsif::handle_stream_status`] |
//! | Deferred  | [`Tsif::run_deferred`]              |
//! | Process   | everything taking a [`ClientHandle`] |
//!
//! Completion handling never enqueues a transfer. It only marks a refill
//! pending; the deferred context picks it up.

use core::sync::atomic::{Ordering, fence};

use embedded_hal::delay::DelayNs;

use super::config::{BufConfig, State, TsifConfig, TsifMode};
use super::error::{DmaError, DmaResult, IoError, IoResult, Result};
use super::stats::Statistics;
use super::status::StreamStatus;
use crate::hal::datamover::{BoxCommand, DataMover, XferResult, XferSlot};
use crate::hal::memory::DmaAllocator;
use crate::hal::stream::StreamControl;
use crate::internal::constants::{
    FLUSH_POLL_INTERVAL_MS, FLUSH_TIMEOUT_POLLS, TSIF_PKT_SIZE, XFER_SLOTS,
};
use crate::internal::dma::{IndexTracker, PacketStore};
use crate::packet::PacketStatus;

// =============================================================================
// Client Types
// =============================================================================

/// Consumer of captured packets
///
/// `notify` runs in interrupt context after every transfer completion,
/// including the ones that end a stop. Keep it short.
///
/// The driver is still borrowed while `notify` runs, so it must not call
/// back into the driver. Through `SharedTsif` that panics on the nested
/// borrow. Record the event and wake the reader instead.
pub trait TsifClient {
    /// New packets may be available or the driver state changed
    fn notify(&self);
}

/// Token proving a client is attached
///
/// A handle goes stale on detach; later calls with it fail with
/// [`IoError::NotAttached`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClientHandle(u32);

/// Location and size of the packet buffer
///
/// `data` stays valid until the next stop frees the buffer. Packets in
/// `[ri, wi)` of the current [`TsifSnapshot`] may be read through it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BufferInfo {
    /// CPU address of packet 0
    pub data: *const u8,
    /// Bus address of packet 0, as the DataMover sees it
    pub bus: u32,
    /// Packet slots in the buffer
    pub packets: u32,
}

impl BufferInfo {
    /// Buffer size in bytes
    #[must_use]
    pub const fn len_bytes(&self) -> usize {
        self.packets as usize * TSIF_PKT_SIZE
    }

    /// CPU address of packet `index`, `None` past the end
    #[must_use]
    pub fn packet_ptr(&self, index: u32) -> Option<*const u8> {
        if index >= self.packets {
            return None;
        }
        Some(self.data.wrapping_add(index as usize * TSIF_PKT_SIZE))
    }
}

/// Read/write indices and driver state at one instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TsifSnapshot {
    /// Next packet to read
    pub ri: u32,
    /// One past the last written packet
    pub wi: u32,
    /// Driver state
    pub state: State,
}

impl TsifSnapshot {
    /// Packets in `[ri, wi)` for a buffer of `packets` slots
    #[must_use]
    pub const fn available(&self, packets: u32) -> u32 {
        if packets == 0 {
            return 0;
        }
        (self.wi + packets - self.ri) % packets
    }
}

// =============================================================================
// Transfer Slot State
// =============================================================================

/// Bookkeeping for one outstanding DataMover transfer
#[derive(Debug, Clone, Copy)]
struct Xfer {
    busy: bool,
    /// First packet slot written by the transfer
    first: u32,
    /// `wi` to publish when the transfer completes
    wi_target: u32,
    cmd: BoxCommand,
}

impl Xfer {
    const IDLE: Self = Self {
        busy: false,
        first: 0,
        wi_target: 0,
        cmd: BoxCommand {
            dst_row_addr: 0,
            row_len: 0,
            num_rows: 0,
            dst_row_offset: 0,
        },
    };
}

// =============================================================================
// TSIF Driver
// =============================================================================

/// TSIF capture driver
///
/// # Type Parameters
/// * `A` - Coherent memory allocator for the packet buffer
/// * `M` - DataMover channel
/// * `S` - TSIF receiver control
///
/// # Example
/// ```ignore
/// let mut tsif = Tsif::new(pool, datamover, receiver);
/// let handle = tsif.attach(&CLIENT)?;
/// tsif.set_buf_config(handle, 16, 8)?;
/// tsif.start(handle)?;
///
/// // DataMover IRQ
/// tsif.handle_interrupt();
/// // Deferred work
/// tsif.run_deferred()?;
/// ```
pub struct Tsif<A, M, S> {
    alloc: A,
    mover: M,
    stream: S,
    /// Current configuration
    config: TsifConfig,
    /// Current state
    state: State,
    store: PacketStore,
    indices: IndexTracker,
    xfers: [Xfer; XFER_SLOTS],
    stats: Statistics,
    client: Option<&'static dyn TsifClient>,
    /// Bumped on every attach so old handles go stale
    generation: u32,
    refill_pending: bool,
    flush_pending: bool,
    /// Set while consecutive schedules keep hitting overflow
    in_overflow: bool,
}

impl<A, M, S> Tsif<A, M, S>
where
    A: DmaAllocator,
    M: DataMover,
    S: StreamControl,
{
    /// Create a stopped driver with the default configuration
    pub const fn new(alloc: A, mover: M, stream: S) -> Self {
        let config = TsifConfig::new();
        Self {
            alloc,
            mover,
            stream,
            config,
            state: State::Stopped,
            store: PacketStore::new(),
            indices: IndexTracker::new(config.buf.packets(), config.buf.pkts_per_chunk),
            xfers: [Xfer::IDLE; XFER_SLOTS],
            stats: Statistics::new(),
            client: None,
            generation: 0,
            refill_pending: false,
            flush_pending: false,
            in_overflow: false,
        }
    }

    /// Create a stopped driver with `config`
    pub fn with_config(alloc: A, mover: M, stream: S, config: TsifConfig) -> Result<Self> {
        config.validate()?;
        let mut tsif = Self::new(alloc, mover, stream);
        tsif.config = config;
        tsif.indices
            .reconfigure(config.buf.packets(), config.buf.pkts_per_chunk);
        Ok(tsif)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Get the current state
    #[inline(always)]
    pub fn device_state(&self) -> State {
        self.state
    }

    /// Get the current configuration
    #[inline(always)]
    pub fn config(&self) -> &TsifConfig {
        &self.config
    }

    /// Snapshot of the event counters
    #[inline(always)]
    pub fn statistics(&self) -> Statistics {
        self.stats
    }

    /// Reset the event counters
    pub fn clear_statistics(&mut self) {
        self.stats.clear();
    }

    /// Whether `slot` has a transfer outstanding
    #[inline]
    pub fn is_xfer_busy(&self, slot: XferSlot) -> bool {
        self.xfers[slot.index()].busy
    }

    /// Number of transfers outstanding
    pub fn busy_xfers(&self) -> usize {
        self.xfers.iter().filter(|x| x.busy).count()
    }

    /// Whether a client is attached
    #[inline]
    pub fn is_attached(&self) -> bool {
        self.client.is_some()
    }

    /// Packet slots available to the client
    pub fn available_packets(&self) -> u32 {
        if self.store.is_allocated() {
            self.indices.available_count()
        } else {
            0
        }
    }

    /// Borrow the allocator
    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    /// Borrow the DataMover
    pub fn mover(&self) -> &M {
        &self.mover
    }

    /// Mutably borrow the DataMover
    pub fn mover_mut(&mut self) -> &mut M {
        &mut self.mover
    }

    /// Borrow the stream control
    pub fn stream(&self) -> &S {
        &self.stream
    }

    /// Mutably borrow the stream control
    pub fn stream_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    // =========================================================================
    // Client Attachment
    // =========================================================================

    /// Attach the single client
    ///
    /// # Errors
    /// - `Busy` - another client is attached
    pub fn attach(&mut self, client: &'static dyn TsifClient) -> IoResult<ClientHandle> {
        if self.client.is_some() {
            return Err(IoError::Busy);
        }
        self.generation = self.generation.wrapping_add(1);
        self.client = Some(client);

        #[cfg(feature = "defmt")]
        defmt::debug!("tsif: client attached");
        #[cfg(feature = "log")]
        log::debug!("tsif: client attached");

        Ok(ClientHandle(self.generation))
    }

    /// Detach the client, stopping capture first if needed
    ///
    /// If the stop times out the client stays attached.
    pub fn detach<D: DelayNs>(&mut self, handle: ClientHandle, delay: &mut D) -> Result<()> {
        self.check_handle(handle)?;
        self.stop_and_wait(delay)?;
        self.client = None;

        #[cfg(feature = "defmt")]
        defmt::debug!("tsif: client detached");
        #[cfg(feature = "log")]
        log::debug!("tsif: client detached");

        Ok(())
    }

    fn check_handle(&self, handle: ClientHandle) -> IoResult<()> {
        if self.client.is_some() && handle.0 == self.generation {
            Ok(())
        } else {
            Err(IoError::NotAttached)
        }
    }

    // =========================================================================
    // Client Queries
    // =========================================================================

    /// Location and size of the packet buffer
    ///
    /// # Errors
    /// - `InvalidState` - no buffer (capture stopped)
    pub fn buffer_info(&self, handle: ClientHandle) -> IoResult<BufferInfo> {
        self.check_handle(handle)?;
        let data = self.store.base_ptr().ok_or(IoError::InvalidState)?;
        let bus = self.store.base_bus_addr().ok_or(IoError::InvalidState)?;
        Ok(BufferInfo {
            data: data.as_ptr().cast_const(),
            bus,
            packets: self.store.packets(),
        })
    }

    /// Current indices and state
    pub fn state(&self, handle: ClientHandle) -> IoResult<TsifSnapshot> {
        self.check_handle(handle)?;
        Ok(TsifSnapshot {
            ri: self.indices.ri(),
            wi: self.indices.wi(),
            state: self.state,
        })
    }

    /// Copy packet `index` out of the buffer
    ///
    /// # Errors
    /// - `InvalidState` - no buffer
    /// - `InvalidIndex` - `index` beyond the buffer
    pub fn copy_packet(
        &self,
        handle: ClientHandle,
        index: u32,
        out: &mut [u8; TSIF_PKT_SIZE],
    ) -> IoResult<PacketStatus> {
        self.check_handle(handle)?;
        if !self.store.is_allocated() {
            return Err(IoError::InvalidState);
        }
        self.store
            .copy_packet(index, out)
            .ok_or(IoError::InvalidIndex)
    }

    /// Status trailer of packet `index`, without copying the payload
    ///
    /// # Errors
    /// - `InvalidState` - no buffer
    /// - `InvalidIndex` - `index` beyond the buffer
    pub fn packet_status(&self, handle: ClientHandle, index: u32) -> IoResult<PacketStatus> {
        self.check_handle(handle)?;
        if !self.store.is_allocated() {
            return Err(IoError::InvalidState);
        }
        self.store.status(index).ok_or(IoError::InvalidIndex)
    }

    /// Give packets `[ri, new_ri)` back to the driver
    ///
    /// # Errors
    /// - `InvalidState` - no buffer
    /// - `InvalidIndex` - `new_ri` outside `[ri, wi]`
    pub fn reclaim(&mut self, handle: ClientHandle, new_ri: u32) -> IoResult<()> {
        self.check_handle(handle)?;
        if !self.store.is_allocated() {
            return Err(IoError::InvalidState);
        }
        self.indices.reclaim(new_ri)
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    fn check_reconfigurable(&self, handle: ClientHandle) -> Result<()> {
        self.check_handle(handle)?;
        if self.state != State::Stopped {
            return Err(IoError::Busy.into());
        }
        Ok(())
    }

    /// Set the stream mode (stopped only)
    pub fn set_mode(&mut self, handle: ClientHandle, mode: TsifMode) -> Result<()> {
        self.check_reconfigurable(handle)?;
        self.config.mode = mode;
        Ok(())
    }

    /// Set the receiver time limit (stopped only)
    pub fn set_time_limit(&mut self, handle: ClientHandle, time_limit: u32) -> Result<()> {
        self.check_reconfigurable(handle)?;
        let config = self.config.with_time_limit(time_limit);
        config.validate()?;
        self.config = config;
        Ok(())
    }

    /// Set the packet buffer geometry (stopped only)
    pub fn set_buf_config(
        &mut self,
        handle: ClientHandle,
        pkts_per_chunk: u32,
        chunks_per_buf: u32,
    ) -> Result<()> {
        self.check_reconfigurable(handle)?;
        let buf = BufConfig::with_sizes(pkts_per_chunk, chunks_per_buf);
        buf.validate()?;
        self.config.buf = buf;
        self.indices.reconfigure(buf.packets(), buf.pkts_per_chunk);
        Ok(())
    }

    // =========================================================================
    // Start / Stop
    // =========================================================================

    /// Start capturing
    ///
    /// Allocates the packet buffer, queues the first two transfers and
    /// enables the receiver. Starting a running device does nothing.
    ///
    /// # Errors
    /// - `InvalidState` - a stop is still draining
    /// - `AllocationFailed` - no memory; the device stays stopped
    /// - `EnqueueFailed` or a receiver error - outstanding transfers are
    ///   flushed and the device returns to `Stopped` once they drain
    pub fn start(&mut self, handle: ClientHandle) -> Result<()> {
        self.check_handle(handle)?;
        match self.state {
            State::Stopped => {}
            State::Running => return Ok(()),
            State::Flushing => return Err(IoError::InvalidState.into()),
        }

        let buf = self.config.buf;
        self.store.allocate(&mut self.alloc, buf.packets())?;
        self.indices.reconfigure(buf.packets(), buf.pkts_per_chunk);
        self.xfers = [Xfer::IDLE; XFER_SLOTS];
        self.refill_pending = false;
        self.flush_pending = false;
        self.in_overflow = false;

        if let Err(e) = self.schedule() {
            self.abort_start();
            return Err(e.into());
        }
        if let Err(e) = self.stream.enable(self.config.mode, self.config.time_limit) {
            self.abort_start();
            return Err(e);
        }

        self.state = State::Running;

        #[cfg(feature = "defmt")]
        defmt::info!(
            "tsif: started, {} packets in {} chunks",
            buf.packets(),
            buf.chunks_per_buf
        );
        #[cfg(feature = "log")]
        log::info!(
            "tsif: started, {} packets in {} chunks",
            buf.packets(),
            buf.chunks_per_buf
        );

        Ok(())
    }

    /// Unwind a start that already queued transfers
    fn abort_start(&mut self) {
        self.state = State::Flushing;
        if self.busy_xfers() == 0 {
            self.finish_stop();
            return;
        }
        self.mover.flush();
        self.handle_interrupt();
    }

    /// Stop capturing and release the packet buffer
    ///
    /// Disables the receiver, then flushes the DataMover and waits for both
    /// transfers to drain, sleeping [`FLUSH_POLL_INTERVAL_MS`] between polls.
    /// Stopping a stopped device does nothing.
    ///
    /// # Errors
    /// - `FlushTimeout` - transfers did not drain within
    ///   [`FLUSH_TIMEOUT_POLLS`] polls; the device stays in `Flushing` with
    ///   its buffer held, and a later `stop` resumes the wait
    pub fn stop<D: DelayNs>(&mut self, handle: ClientHandle, delay: &mut D) -> Result<()> {
        self.check_handle(handle)?;
        self.stop_and_wait(delay)
    }

    fn stop_and_wait<D: DelayNs>(&mut self, delay: &mut D) -> Result<()> {
        if self.state == State::Stopped {
            return Ok(());
        }
        self.begin_stop();
        for _ in 0..FLUSH_TIMEOUT_POLLS {
            if self.poll_stop() {
                return Ok(());
            }
            delay.delay_ms(FLUSH_POLL_INTERVAL_MS);
        }
        self.flush_timed_out()
    }

    /// Disable the receiver and enter `Flushing`
    pub(crate) fn begin_stop(&mut self) {
        if self.state == State::Running {
            self.stream.disable();
            self.state = State::Flushing;

            #[cfg(feature = "defmt")]
            defmt::info!("tsif: stopping");
            #[cfg(feature = "log")]
            log::info!("tsif: stopping");
        }
        self.refill_pending = false;
    }

    /// One flush-and-drain step of a stop; `true` once stopped
    pub(crate) fn poll_stop(&mut self) -> bool {
        if self.state != State::Flushing {
            return true;
        }
        if self.busy_xfers() == 0 {
            self.finish_stop();
            self.notify_client();
            return true;
        }
        self.mover.flush();
        self.handle_interrupt();
        self.state == State::Stopped
    }

    pub(crate) fn flush_timed_out(&self) -> Result<()> {
        #[cfg(feature = "defmt")]
        defmt::warn!(
            "tsif: flush timed out, {} transfers ({} packets) pending",
            self.busy_xfers(),
            self.indices.in_flight_count()
        );
        #[cfg(feature = "log")]
        log::warn!(
            "tsif: flush timed out, {} transfers ({} packets) pending",
            self.busy_xfers(),
            self.indices.in_flight_count()
        );

        Err(DmaError::FlushTimeout.into())
    }

    fn finish_stop(&mut self) {
        self.store.free(&mut self.alloc);
        self.state = State::Stopped;
        self.refill_pending = false;
        self.flush_pending = false;

        #[cfg(feature = "defmt")]
        defmt::info!("tsif: stopped");
        #[cfg(feature = "log")]
        log::info!("tsif: stopped");
    }

    // =========================================================================
    // Scheduling
    // =========================================================================

    /// Queue transfers on every idle slot
    fn schedule(&mut self) -> DmaResult<()> {
        let mut scheduled = 0;
        for slot in XferSlot::ALL {
            if !self.xfers[slot.index()].busy {
                self.schedule_slot(slot)?;
                scheduled += 1;
            }
        }

        if scheduled == 0 {
            #[cfg(feature = "defmt")]
            defmt::debug!("tsif: no idle transfer slot");
            #[cfg(feature = "log")]
            log::debug!("tsif: no idle transfer slot");
        }
        Ok(())
    }

    fn schedule_slot(&mut self, slot: XferSlot) -> DmaResult<()> {
        let (first, wi_target, claimed) = if self.indices.would_overflow() {
            // Keep dmwi and write over the chunk at dmwi again
            self.stats.overflow = self.stats.overflow.wrapping_add(1);
            if !self.in_overflow {
                self.in_overflow = true;

                #[cfg(feature = "defmt")]
                defmt::warn!(
                    "tsif: overflow detected, ri={} dmwi={}",
                    self.indices.ri(),
                    self.indices.dmwi()
                );
                #[cfg(feature = "log")]
                log::warn!(
                    "tsif: overflow detected, ri={} dmwi={}",
                    self.indices.ri(),
                    self.indices.dmwi()
                );
            }
            let dmwi = self.indices.dmwi();
            (dmwi, dmwi, false)
        } else {
            self.in_overflow = false;
            let first = self.indices.claim_chunk();
            (first, self.indices.dmwi(), true)
        };

        let Some(dst) = self.store.bus_addr(first) else {
            if claimed {
                self.indices.unclaim_chunk(first);
            }
            return Err(DmaError::EnqueueFailed);
        };
        let cmd = BoxCommand::for_packets(dst, self.indices.chunk_len() as u16);

        // Chunk memory must be settled before the engine sees the command
        fence(Ordering::Release);
        self.xfers[slot.index()] = Xfer {
            busy: true,
            first,
            wi_target,
            cmd,
        };

        if let Err(e) = self.mover.enqueue(slot, &cmd) {
            self.xfers[slot.index()].busy = false;
            if claimed {
                self.indices.unclaim_chunk(first);
            }

            #[cfg(feature = "defmt")]
            defmt::warn!("tsif: enqueue failed on {:?}", slot);
            #[cfg(feature = "log")]
            log::warn!("tsif: enqueue failed on {:?}", slot);

            return Err(e);
        }
        Ok(())
    }

    // =========================================================================
    // Completion Handling
    // =========================================================================

    /// Drain DataMover results (call from the DataMover interrupt)
    ///
    /// Returns the number of completions handled.
    pub fn handle_interrupt(&mut self) -> usize {
        let mut handled = 0;
        while let Some((slot, result)) = self.mover.poll_result() {
            self.complete(slot, result);
            handled += 1;
        }
        handled
    }

    /// Account for one finished transfer
    pub fn complete(&mut self, slot: XferSlot, result: XferResult) {
        // Packets written by the engine become visible from here on
        fence(Ordering::Acquire);

        let xfer = self.xfers[slot.index()];
        if !xfer.busy {
            #[cfg(feature = "defmt")]
            defmt::warn!("tsif: completion on idle {:?}", slot);
            #[cfg(feature = "log")]
            log::warn!("tsif: completion on idle {:?}", slot);
            return;
        }

        let chunk = u32::from(xfer.cmd.num_rows);
        match result {
            XferResult::Done => {
                self.stats.rx = self.stats.rx.wrapping_add(1);
                if self.indices.wi() == xfer.wi_target {
                    self.stats.soft_drop = self.stats.soft_drop.wrapping_add(1);
                }
                self.indices.set_wi(xfer.wi_target);
                if self.state == State::Running {
                    self.refill_pending = true;
                }
            }
            XferResult::Error => {
                self.store.invalidate(xfer.first, chunk);
                self.stats.dma_error = self.stats.dma_error.wrapping_add(1);

                #[cfg(feature = "defmt")]
                defmt::warn!("tsif: transfer error on {:?}", slot);
                #[cfg(feature = "log")]
                log::warn!("tsif: transfer error on {:?}", slot);

                if self.state == State::Running {
                    self.stream.disable();
                    self.state = State::Flushing;
                    self.refill_pending = false;
                    self.flush_pending = true;
                }
            }
            XferResult::Flush => {
                self.store.invalidate(xfer.first, chunk);
            }
        }

        self.xfers[slot.index()].busy = false;
        if self.state == State::Flushing && self.busy_xfers() == 0 {
            self.finish_stop();
        }
        self.notify_client();
    }

    /// Deferred work: refill idle slots or push a pending flush
    ///
    /// Call after [`Tsif::handle_interrupt`] from a context where the
    /// DataMover may be enqueued to.
    pub fn run_deferred(&mut self) -> Result<()> {
        if core::mem::take(&mut self.flush_pending) && self.state == State::Flushing {
            self.mover.flush();
        }
        if core::mem::take(&mut self.refill_pending) && self.state == State::Running {
            self.schedule()?;
        }
        Ok(())
    }

    /// Whether [`Tsif::run_deferred`] has work
    #[inline]
    pub fn has_deferred_work(&self) -> bool {
        self.refill_pending || self.flush_pending
    }

    /// Read receiver status (call from the TSIF interrupt)
    pub fn handle_stream_status(&mut self) -> StreamStatus {
        let status = self.stream.take_status();
        self.stats.record_stream_status(status);

        if status.any() {
            #[cfg(feature = "defmt")]
            defmt::debug!("tsif: receiver status {:?}", status);
            #[cfg(feature = "log")]
            log::debug!("tsif: receiver status {:?}", status);
        }
        status
    }

    fn notify_client(&mut self) {
        if let Some(client) = self.client {
            self.stats.notify = self.stats.notify.wrapping_add(1);
            client.notify();
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
