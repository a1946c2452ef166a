//! Error types for the TSIF driver
//!
//! Errors are organized by domain for better diagnostics:
//! - [`ConfigError`]: Invalid stream or buffer configuration
//! - [`IoError`]: Client API misuse and state conflicts
//! - [`DmaError`]: Packet buffer allocation and DataMover failures
//!
//! The unified [`Error`] enum wraps all domain errors and is returned
//! by most driver methods.
//!
//! Buffer overflow is deliberately absent: a consumer that falls behind
//! only shows up in the soft-drop counters, never as an error.

// =============================================================================
// Configuration Errors
// =============================================================================

/// Configuration errors
///
/// Returned synchronously by the `set_*` calls; driver state is unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Stream mode outside 1..=3
    InvalidMode,
    /// Time limit does not fit the 24-bit field
    InvalidTimeLimit,
    /// Zero-sized chunk/buffer, too few chunks, or buffer over the packet bound
    InvalidBufferConfig,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ConfigError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ConfigError::InvalidMode => "invalid stream mode",
            ConfigError::InvalidTimeLimit => "time limit out of range",
            ConfigError::InvalidBufferConfig => "invalid buffer configuration",
        }
    }
}

// =============================================================================
// I/O Errors
// =============================================================================

/// Client API errors
///
/// These errors occur when the client calls into the driver at the wrong
/// time or with arguments that do not match the current ring state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IoError {
    /// Another client is attached, or configuration change while running
    Busy,
    /// Handle does not belong to the attached client
    NotAttached,
    /// Invalid state for operation (e.g., buffer info while stopped)
    InvalidState,
    /// Reclaim index outside the readable window
    InvalidIndex,
}

impl core::fmt::Display for IoError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl IoError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            IoError::Busy => "device busy",
            IoError::NotAttached => "client not attached",
            IoError::InvalidState => "invalid state for operation",
            IoError::InvalidIndex => "index outside readable window",
        }
    }
}

// =============================================================================
// DMA Errors
// =============================================================================

/// Packet buffer and DataMover errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DmaError {
    /// Coherent packet buffer could not be allocated
    AllocationFailed,
    /// DataMover rejected a transfer command
    EnqueueFailed,
    /// DataMover reported a transfer error
    TransferError,
    /// Outstanding transfers did not drain while stopping
    FlushTimeout,
}

impl core::fmt::Display for DmaError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl DmaError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            DmaError::AllocationFailed => "packet buffer allocation failed",
            DmaError::EnqueueFailed => "transfer enqueue failed",
            DmaError::TransferError => "DataMover transfer error",
            DmaError::FlushTimeout => "DataMover flush timed out",
        }
    }
}

// =============================================================================
// Unified Error Type
// =============================================================================

/// This enum wraps all domain-specific errors for unified error handling.
///
/// Match on the inner domain error for specific handling:
/// ```ignore
/// match result {
///     Err(Error::Config(ConfigError::InvalidMode)) => { /* ... */ }
///     Err(Error::Io(IoError::Busy)) => { /* ... */ }
///     Err(Error::Dma(DmaError::FlushTimeout)) => { /* ... */ }
///     _ => {}
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Configuration error
    Config(ConfigError),
    /// I/O error
    Io(IoError),
    /// DMA error
    Dma(DmaError),
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Config(e) => write!(f, "config: {}", e.as_str()),
            Error::Io(e) => write!(f, "io: {}", e.as_str()),
            Error::Dma(e) => write!(f, "dma: {}", e.as_str()),
        }
    }
}

// From impls for automatic conversion
impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl From<IoError> for Error {
    fn from(e: IoError) -> Self {
        Error::Io(e)
    }
}

impl From<DmaError> for Error {
    fn from(e: DmaError) -> Self {
        Error::Dma(e)
    }
}

/// Result type alias for TSIF operations
pub type Result<T> = core::result::Result<T, Error>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = core::result::Result<T, ConfigError>;

/// Result type alias for client API operations
pub type IoResult<T> = core::result::Result<T, IoError>;

/// Result type alias for DMA operations
pub type DmaResult<T> = core::result::Result<T, DmaError>;

// =============================================================================
// Unit Tests
// =============================================================================
