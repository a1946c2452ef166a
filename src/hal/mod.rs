//! Hardware Abstraction Layer
//!
//! The TSIF core never touches registers. Everything hardware-facing is
//! reached through the traits in this module, implemented by the platform:
//!
//! # Modules
//!
//! - [`datamover`]: Streaming DMA engine that moves packets into memory
//! - [`memory`]: DMA-coherent allocation for the packet buffer
//! - [`stream`]: TSIF receiver enable/disable and status
//!
//! # Delay Integration
//!
//! Types that require delays use `embedded_hal::delay::DelayNs` directly.
//! Pass any delay implementation from your HAL.

pub mod datamover;
pub mod memory;
pub mod stream;

// Re-export commonly used types
pub use datamover::{BoxCommand, DataMover, XferResult, XferSlot};
pub use memory::{DmaAllocator, DmaRegion};
pub use stream::StreamControl;
