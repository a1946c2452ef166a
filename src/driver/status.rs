//! TSIF receiver status reported by the stream interrupt.
//!
//! This module provides the [`StreamStatus`] structure the platform fills
//! from the receiver's status register.

// =============================================================================
// Stream Status
// =============================================================================

/// Receiver conditions latched since the last read.
///
/// # Example
///
/// ```ignore
/// // In the TSIF interrupt handler
/// tsif.handle_stream_status();
/// if tsif.statistics().lost_sync > 0 {
///     // Signal source is unstable
/// }
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StreamStatus {
    /// Receiver FIFO overflowed; packets were lost before reaching memory
    pub overflow: bool,
    /// Sync byte lost; the receiver is re-acquiring packet alignment
    pub lost_sync: bool,
    /// Time limit expired without a complete packet
    pub timeout: bool,
}

impl StreamStatus {
    /// Check if any condition is set
    #[inline]
    #[must_use]
    pub const fn any(&self) -> bool {
        self.overflow || self.lost_sync || self.timeout
    }

    /// Combine two status reads
    #[inline]
    #[must_use]
    pub const fn merge(self, other: Self) -> Self {
        Self {
            overflow: self.overflow || other.overflow,
            lost_sync: self.lost_sync || other.lost_sync,
            timeout: self.timeout || other.timeout,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
