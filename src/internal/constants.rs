//! Centralized Constants
//!
//! This module provides a single source of truth for all magic numbers and
//! configuration constants used throughout the TSIF driver.
//!
//! # Organization
//!
//! Constants are grouped by category:
//! - **Packet sizes**: TSIF packet dimensions
//! - **Buffer geometry**: Default and maximum chunk/buffer sizes
//! - **Transfers**: Outstanding DataMover transfer limits
//! - **Timing**: Flush polling interval and bound
//! - **Stream defaults**: Mode and time limit
//!
//! # Note
//!
//! Packet status bit definitions live in [`crate::packet`] since they are
//! part of the client-visible wire format.

// =============================================================================
// Packet Sizes
// =============================================================================

/// Size of one TSIF packet in memory (188-byte TS packet + 4-byte status)
pub const TSIF_PKT_SIZE: usize = 192;

/// Size of one TSIF packet in 32-bit words
pub const TSIF_PKT_WORDS: usize = TSIF_PKT_SIZE / 4;

/// Byte offset of the status dword within a packet
pub const TSIF_STATUS_OFFSET: usize = TSIF_PKT_SIZE - 4;

// =============================================================================
// Buffer Geometry
// =============================================================================

/// Default number of packets moved by one DataMover transfer
pub const DEFAULT_PKTS_PER_CHUNK: u32 = 16;

/// Default number of chunks in the packet buffer
pub const DEFAULT_CHUNKS_PER_BUF: u32 = 8;

/// Upper bound on `pkts_per_chunk * chunks_per_buf`
pub const MAX_PACKETS_IN_BUF: u32 = 10240;

/// Minimum chunks per buffer (one chunk being written, one being read)
pub const MIN_CHUNKS_PER_BUF: u32 = 2;

// =============================================================================
// Transfers
// =============================================================================

/// Number of DataMover transfers kept in flight while streaming
pub const XFER_SLOTS: usize = 2;

// =============================================================================
// Timing Constants
// =============================================================================

/// Sleep between DataMover flush polls in `stop()`, in milliseconds
pub const FLUSH_POLL_INTERVAL_MS: u32 = 10;

/// Maximum flush polls before `stop()` gives up (~5 s at 10 ms)
pub const FLUSH_TIMEOUT_POLLS: u32 = 500;

// =============================================================================
// Stream Defaults
// =============================================================================

/// Largest time limit accepted by the hardware (24-bit field)
pub const MAX_TIME_LIMIT: u32 = 0x00FF_FFFF;

/// Default time limit programmed on start
pub const DEFAULT_TIME_LIMIT: u32 = 0xFF;
