//! Packet Buffer Engine
//!
//! Memory and index bookkeeping for the cyclic packet buffer.
//!
//! # Architecture
//!
//! - [`PacketStore`]: DMA-coherent packet slots with volatile access
//! - [`IndexTracker`]: the `ri`/`wi`/`dmwi` indices and derived counts
//!
//! The transfer scheduling that ties them together lives in the driver.

mod ring;
mod store;

pub use ring::IndexTracker;
pub use store::PacketStore;
