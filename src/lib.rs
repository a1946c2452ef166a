//! MSM TSIF Driver Core
//!
//! A `no_std`, `no_alloc` driver core for the Qualcomm MSM7x30/QSD8x50 TSIF
//! (Transport Stream Interface) receiver.
//!
//! The TSIF block receives 188-byte MPEG transport stream packets over a
//! serial link. A streaming DMA engine (the DataMover) copies them, with a
//! 4-byte status trailer each, into a cyclic buffer in memory. This crate
//! owns that buffer: it keeps two DataMover transfers in flight, tracks how
//! far the hardware has written and how far the client has read, and counts
//! packets lost when the client falls behind.
//!
//! # Architecture
//!
//! 1. **Driver Layer** ([`driver::tsif`]): scheduling, completion handling
//!    and the client interface
//! 2. **Buffer Engine** (internal): packet store and `ri`/`wi`/`dmwi` indices
//! 3. **HAL Layer** ([`hal`]): traits the platform implements for memory,
//!    DataMover and receiver control
//!
//! Register access, clocks, pins and interrupt wiring stay with the platform.
//!
//! # Features
//!
//! - `defmt`: Enable defmt formatting and logging
//! - `log`: Log through the `log` facade
//! - `critical-section`: Enable ISR-safe `SharedTsif` wrapper
//! - `async`: Enable the async client and `wait_for_packets`
//!
//! # Example
//!
//! ```ignore
//! use msm_tsif::{Tsif, TsifClient, TsifMode};
//! use embedded_hal::delay::DelayNs;
//!
//! struct Consumer;
//! impl TsifClient for Consumer {
//!     fn notify(&self) { /* wake the reader */ }
//! }
//! static CONSUMER: Consumer = Consumer;
//!
//! let mut tsif = Tsif::new(pool, datamover, receiver);
//! let handle = tsif.attach(&CONSUMER)?;
//! tsif.set_mode(handle, TsifMode::Mode2)?;
//! tsif.start(handle)?;
//!
//! // DataMover interrupt
//! tsif.handle_interrupt();
//! // Deferred work
//! tsif.run_deferred()?;
//!
//! // Reader
//! let snap = tsif.state(handle)?;
//! let mut pkt = [0u8; 192];
//! let mut i = snap.ri;
//! while i != snap.wi {
//!     let status = tsif.copy_packet(handle, i, &mut pkt)?;
//!     i = (i + 1) % tsif.buffer_info(handle)?.packets;
//! }
//! tsif.reclaim(handle, snap.wi)?;
//!
//! tsif.stop(handle, &mut delay)?;
//! ```
//!
//! # Memory Requirements
//!
//! The packet buffer is `pkts_per_chunk * chunks_per_buf * 192` bytes of
//! DMA-coherent memory, allocated on start and released on stop. With the
//! default geometry (16 x 8) that is 24 KiB.

#![no_std]
#![deny(missing_docs)]
#![allow(unsafe_code)]
#![deny(unsafe_op_in_unsafe_fn)]
// Clippy lint levels live here; thresholds and config are in Cargo.toml.
#![deny(clippy::correctness)]
#![warn(
    clippy::suspicious,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::cloned_instead_of_copied,
    clippy::explicit_iter_loop,
    clippy::implicit_clone,
    clippy::inconsistent_struct_constructor,
    clippy::manual_assert,
    clippy::manual_let_else,
    clippy::match_same_arms,
    clippy::needless_pass_by_value,
    clippy::semicolon_if_nothing_returned,
    clippy::uninlined_format_args,
    clippy::unnested_or_patterns,
    clippy::std_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::alloc_instead_of_core
)]
#![allow(
    clippy::mod_module_files,
    clippy::self_named_module_files,
    clippy::similar_names,
    clippy::too_many_arguments,
    clippy::struct_excessive_bools,
    clippy::fn_params_excessive_bools,
    clippy::type_complexity,
    clippy::must_use_candidate,
    clippy::assertions_on_constants,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    clippy::cast_lossless,
    clippy::panic_in_result_fn,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::module_name_repetitions,
    clippy::wildcard_imports,
    clippy::items_after_statements,
    clippy::let_underscore_future
)]

// =============================================================================
// Modules
// =============================================================================

pub mod driver;
pub mod hal;
pub mod packet;

// Internal implementation details (pub(crate) only)
mod internal;

#[cfg(feature = "critical-section")]
#[cfg_attr(docsrs, doc(cfg(feature = "critical-section")))]
pub mod sync;

// Test utilities (only available during testing)
#[cfg(test)]
pub mod testing;

// =============================================================================
// Re-exports
// =============================================================================

pub use driver::config::{BufConfig, State, TsifConfig, TsifMode};
pub use driver::error::{
    ConfigError, ConfigResult, DmaError, DmaResult, Error, IoError, IoResult, Result,
};
pub use driver::stats::Statistics;
pub use driver::status::StreamStatus;
pub use driver::tsif::{BufferInfo, ClientHandle, Tsif, TsifClient, TsifSnapshot};
pub use hal::{BoxCommand, DataMover, DmaAllocator, DmaRegion, StreamControl, XferResult, XferSlot};
pub use packet::PacketStatus;

// Re-export sync types when critical-section is enabled
#[cfg(feature = "critical-section")]
pub use sync::SharedTsif;

// Re-export async types when async feature is enabled
#[cfg(feature = "async")]
#[cfg_attr(docsrs, doc(cfg(feature = "async")))]
pub use sync::asynch::{AsyncTsifClient, wait_for_packets};

/// Shared driver constants.
///
/// These are grouped into a dedicated module to keep the top-level facade
/// focused on driver types.
pub mod constants {
    pub use crate::internal::constants::{
        // Buffer geometry
        DEFAULT_CHUNKS_PER_BUF,
        DEFAULT_PKTS_PER_CHUNK,
        // Stream
        DEFAULT_TIME_LIMIT,
        // Timing
        FLUSH_POLL_INTERVAL_MS,
        FLUSH_TIMEOUT_POLLS,
        MAX_PACKETS_IN_BUF,
        MAX_TIME_LIMIT,
        MIN_CHUNKS_PER_BUF,
        // Packet layout
        TSIF_PKT_SIZE,
        TSIF_STATUS_OFFSET,
        XFER_SLOTS,
    };
}
