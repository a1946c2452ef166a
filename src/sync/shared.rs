//! ISR-safe TSIF wrapper using critical sections.
//!
//! Provides [`SharedTsif`] so the DataMover interrupt, the deferred refill
//! and the client can all reach one driver instance.

use embedded_hal::delay::DelayNs;

use super::primitives::CriticalSectionCell;
use crate::driver::config::State;
use crate::driver::error::{IoResult, Result};
use crate::driver::stats::Statistics;
use crate::driver::status::StreamStatus;
use crate::driver::tsif::{ClientHandle, Tsif, TsifSnapshot};
use crate::hal::datamover::DataMover;
use crate::hal::memory::DmaAllocator;
use crate::hal::stream::StreamControl;
use crate::internal::constants::{FLUSH_POLL_INTERVAL_MS, FLUSH_TIMEOUT_POLLS};

/// ISR-safe TSIF wrapper using critical sections.
///
/// Every call runs inside `critical_section::with()`. The one exception is
/// [`SharedTsif::stop`], which sleeps between drain polls with the critical
/// section released so the DataMover interrupt can deliver flush results.
///
/// # Example
///
/// ```ignore
/// static TSIF: SharedTsif<Pool, Adm, TsifBlock> =
///     SharedTsif::new(Tsif::new(Pool::new(), Adm::new(), TsifBlock::new()));
///
/// #[interrupt]
/// fn ADM() {
///     if TSIF.on_interrupt() > 0 {
///         schedule_deferred();
///     }
/// }
///
/// fn deferred() {
///     TSIF.run_deferred().ok();
/// }
/// ```
pub struct SharedTsif<A, M, S> {
    inner: CriticalSectionCell<Tsif<A, M, S>>,
}

impl<A, M, S> SharedTsif<A, M, S>
where
    A: DmaAllocator,
    M: DataMover,
    S: StreamControl,
{
    /// Wrap a driver (const, suitable for static initialization).
    pub const fn new(tsif: Tsif<A, M, S>) -> Self {
        Self {
            inner: CriticalSectionCell::new(tsif),
        }
    }

    /// Execute a closure with exclusive access to the driver.
    ///
    /// Interrupts are disabled for the duration of the closure.
    #[inline]
    pub fn with<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&mut Tsif<A, M, S>) -> R,
    {
        self.inner.with(f)
    }

    /// Try to execute a closure, returning `None` if already borrowed.
    #[inline]
    pub fn try_with<R, F>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&mut Tsif<A, M, S>) -> R,
    {
        self.inner.try_with(f)
    }

    // =========================================================================
    // Interrupt & Deferred Context
    // =========================================================================

    /// DataMover interrupt entry; returns completions handled
    #[inline]
    pub fn on_interrupt(&self) -> usize {
        self.inner.with(|tsif| tsif.handle_interrupt())
    }

    /// TSIF receiver interrupt entry
    #[inline]
    pub fn on_stream_interrupt(&self) -> StreamStatus {
        self.inner.with(|tsif| tsif.handle_stream_status())
    }

    /// Deferred refill / flush
    #[inline]
    pub fn run_deferred(&self) -> Result<()> {
        self.inner.with(|tsif| tsif.run_deferred())
    }

    // =========================================================================
    // Client Context
    // =========================================================================

    /// See [`Tsif::start`]
    pub fn start(&self, handle: ClientHandle) -> Result<()> {
        self.inner.with(|tsif| tsif.start(handle))
    }

    /// See [`Tsif::stop`]
    ///
    /// Each drain poll takes the critical section briefly; the sleep happens
    /// outside it.
    pub fn stop<D: DelayNs>(&self, handle: ClientHandle, delay: &mut D) -> Result<()> {
        let stopped = self.inner.with(|tsif| -> Result<bool> {
            tsif.state(handle)?;
            if tsif.device_state() == State::Stopped {
                return Ok(true);
            }
            tsif.begin_stop();
            Ok(false)
        })?;
        if stopped {
            return Ok(());
        }

        for _ in 0..FLUSH_TIMEOUT_POLLS {
            if self.inner.with(|tsif| tsif.poll_stop()) {
                return Ok(());
            }
            delay.delay_ms(FLUSH_POLL_INTERVAL_MS);
        }
        self.inner.with(|tsif| tsif.flush_timed_out())
    }

    /// Stop if needed, then detach the client
    pub fn detach<D: DelayNs>(&self, handle: ClientHandle, delay: &mut D) -> Result<()> {
        self.stop(handle, delay)?;
        self.inner.with(|tsif| tsif.detach(handle, delay))
    }

    /// See [`Tsif::reclaim`]
    pub fn reclaim(&self, handle: ClientHandle, new_ri: u32) -> IoResult<()> {
        self.inner.with(|tsif| tsif.reclaim(handle, new_ri))
    }

    /// See [`Tsif::state`]
    pub fn state(&self, handle: ClientHandle) -> IoResult<TsifSnapshot> {
        self.inner.with_ref(|tsif| tsif.state(handle))
    }

    /// Snapshot of the event counters
    pub fn statistics(&self) -> Statistics {
        self.inner.with_ref(Tsif::statistics)
    }
}
