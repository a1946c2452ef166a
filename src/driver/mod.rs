//! Core driver components for the TSIF capture engine.
//!
//! - [`config`] - Configuration types and builder patterns
//! - [`error`] - Error types and result aliases
//! - [`stats`] - Event counters
//! - [`status`] - Receiver status flags
//! - [`tsif`] - The capture driver and client interface
//!
//! # Example
//!
//! ```ignore
//! use msm_tsif::driver::{TsifConfig, TsifMode, Tsif};
//!
//! let config = TsifConfig::new()
//!     .with_mode(TsifMode::Mode2)
//!     .with_buf_config(16, 8);
//! let tsif = Tsif::with_config(pool, datamover, receiver, config)?;
//! ```

// Submodules
pub mod config;
pub mod error;
pub mod stats;
pub mod status;
pub mod tsif;

// Re-exports for convenience
pub use config::{BufConfig, State, TsifConfig, TsifMode};
pub use error::{ConfigError, ConfigResult, DmaError, DmaResult, Error, IoError, IoResult, Result};
pub use stats::Statistics;
pub use status::StreamStatus;
pub use tsif::{BufferInfo, ClientHandle, Tsif, TsifClient, TsifSnapshot};
