//! Driver statistics.

use super::status::StreamStatus;

/// Monotonic event counters
///
/// Counters wrap on overflow and never influence driver behavior.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Statistics {
    /// Chunks completed by the DataMover
    pub rx: u32,
    /// Schedules that found no free chunk
    pub overflow: u32,
    /// Completed chunks that were overwritten before the client saw them
    pub soft_drop: u32,
    /// Transfers the DataMover reported as failed
    pub dma_error: u32,
    /// Receiver FIFO overflows
    pub hw_overflow: u32,
    /// Receiver sync losses
    pub lost_sync: u32,
    /// Receiver timeouts
    pub timeout: u32,
    /// Client notifications delivered
    pub notify: u32,
}

impl Statistics {
    /// All counters at zero
    #[must_use]
    pub const fn new() -> Self {
        Self {
            rx: 0,
            overflow: 0,
            soft_drop: 0,
            dma_error: 0,
            hw_overflow: 0,
            lost_sync: 0,
            timeout: 0,
            notify: 0,
        }
    }

    /// Count the conditions in a receiver status read
    pub fn record_stream_status(&mut self, status: StreamStatus) {
        if status.overflow {
            self.hw_overflow = self.hw_overflow.wrapping_add(1);
        }
        if status.lost_sync {
            self.lost_sync = self.lost_sync.wrapping_add(1);
        }
        if status.timeout {
            self.timeout = self.timeout.wrapping_add(1);
        }
    }

    /// Reset all counters
    pub fn clear(&mut self) {
        *self = Self::new();
    }
}
