//! Synchronization and Concurrency Support
//!
//! The driver runs in three contexts: the DataMover interrupt, deferred work
//! (refill), and the client. This module provides the glue for sharing one
//! driver between them:
//!
//! - **Primitives** (`primitives`): Low-level synchronization types
//!   - [`CriticalSectionCell`] - ISR-safe interior mutability
//!   - [`AtomicWaker`] - Async waker storage for interrupts
//!
//! - **Shared Wrapper** (`shared`): [`SharedTsif`], a critical-section
//!   protected driver with interrupt and deferred entry points
//!
//! - **Async Support** (`asynch`): [`AsyncTsifClient`] and
//!   [`wait_for_packets`]
//!
//! # Feature Flags
//!
//! - `critical-section`: Enables `primitives` and `shared` modules
//! - `async`: Enables `asynch` module (also requires `critical-section`)
//!
//! # Example
//!
//! ```ignore
//! use msm_tsif::sync::SharedTsif;
//!
//! static TSIF: SharedTsif<Pool, Adm, TsifBlock> =
//!     SharedTsif::new(Tsif::new(Pool::new(), Adm::new(), TsifBlock::new()));
//!
//! #[interrupt]
//! fn ADM_IRQ() {
//!     TSIF.on_interrupt();
//! }
//!
//! #[interrupt]
//! fn TSIF_IRQ() {
//!     TSIF.on_stream_interrupt();
//! }
//! ```

mod primitives;

#[cfg(feature = "async")]
pub use primitives::AtomicWaker;
pub use primitives::CriticalSectionCell;

mod shared;

pub use shared::SharedTsif;

#[cfg(feature = "async")]
pub mod asynch;

#[cfg(feature = "async")]
pub use asynch::{AsyncTsifClient, wait_for_packets};
