//! TSIF packet wire format.
//!
//! Each packet slot in the ring holds a 188-byte MPEG transport stream packet
//! followed by a little-endian status dword written by the TSIF hardware:
//!
//! | Bits  | Field                                  |
//! |-------|----------------------------------------|
//! | 0-23  | Timestamp (TTS)                        |
//! | 24    | Valid - packet was received            |
//! | 25    | First packet of a burst                |
//! | 26    | Hardware FIFO overflow before packet   |
//! | 27    | Packet received with error             |
//! | 28    | Null packet inserted by hardware       |
//! | 30    | Time limit expired                     |
//!
//! The layout is bit-exact and consumed directly by clients.

use crate::internal::constants::{TSIF_PKT_SIZE, TSIF_STATUS_OFFSET};

/// Status dword bit field constants
pub mod status_bits {
    /// Timestamp mask (24 bits)
    pub const TIMESTAMP_MASK: u32 = 0x00FF_FFFF;
    /// Valid - slot contains a received packet
    pub const VALID: u32 = 1 << 24;
    /// First packet after stream (re)start or a gap
    pub const FIRST: u32 = 1 << 25;
    /// Hardware FIFO overflowed before this packet
    pub const OVERFLOW: u32 = 1 << 26;
    /// Packet carries a reception error
    pub const ERROR: u32 = 1 << 27;
    /// Null packet inserted by hardware
    pub const NULL: u32 = 1 << 28;
    /// Time limit expired while waiting for this packet
    pub const TIMEOUT: u32 = 1 << 30;

    /// All flag bits that indicate a problem
    pub const ALL_ERRORS: u32 = OVERFLOW | ERROR | TIMEOUT;
}

/// Parsed packet status dword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PacketStatus(u32);

impl PacketStatus {
    /// Wrap a raw status dword
    #[inline(always)]
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Read the status dword from the tail of a packet
    #[inline]
    #[must_use]
    pub fn from_packet(packet: &[u8; TSIF_PKT_SIZE]) -> Self {
        let mut word = [0u8; 4];
        word.copy_from_slice(&packet[TSIF_STATUS_OFFSET..]);
        Self(u32::from_le_bytes(word))
    }

    /// Raw status dword
    #[inline(always)]
    #[must_use]
    pub const fn raw(&self) -> u32 {
        self.0
    }

    /// 24-bit transport timestamp
    #[inline(always)]
    #[must_use]
    pub const fn timestamp(&self) -> u32 {
        self.0 & status_bits::TIMESTAMP_MASK
    }

    /// Slot holds a received packet
    #[inline(always)]
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        (self.0 & status_bits::VALID) != 0
    }

    /// First packet of a burst
    #[inline(always)]
    #[must_use]
    pub const fn is_first(&self) -> bool {
        (self.0 & status_bits::FIRST) != 0
    }

    /// Hardware overflow occurred before this packet
    #[inline(always)]
    #[must_use]
    pub const fn is_overflow(&self) -> bool {
        (self.0 & status_bits::OVERFLOW) != 0
    }

    /// Packet was received with an error
    #[inline(always)]
    #[must_use]
    pub const fn is_error(&self) -> bool {
        (self.0 & status_bits::ERROR) != 0
    }

    /// Null packet
    #[inline(always)]
    #[must_use]
    pub const fn is_null(&self) -> bool {
        (self.0 & status_bits::NULL) != 0
    }

    /// Time limit expired
    #[inline(always)]
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        (self.0 & status_bits::TIMEOUT) != 0
    }

    /// Any error condition flagged
    #[inline(always)]
    #[must_use]
    pub const fn has_error(&self) -> bool {
        (self.0 & status_bits::ALL_ERRORS) != 0
    }
}

impl From<u32> for PacketStatus {
    fn from(raw: u32) -> Self {
        Self::from_raw(raw)
    }
}

// =============================================================================
// Tests
// =============================================================================
