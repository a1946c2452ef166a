//! Configuration types for the TSIF driver

use super::error::{ConfigError, ConfigResult};
use crate::internal::constants::{
    DEFAULT_CHUNKS_PER_BUF, DEFAULT_PKTS_PER_CHUNK, DEFAULT_TIME_LIMIT, MAX_PACKETS_IN_BUF,
    MAX_TIME_LIMIT, MIN_CHUNKS_PER_BUF,
};

/// TSIF stream mode
///
/// Selects how the hardware frames the incoming serial stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum TsifMode {
    /// Mode 1: clock, data and valid signals
    #[default]
    Mode1 = 1,
    /// Mode 2: clock, data, valid and sync signals
    Mode2 = 2,
    /// Mode 3: clock, data and sync signals
    Mode3 = 3,
}

impl TsifMode {
    /// Convert a raw mode number
    pub const fn from_raw(mode: u8) -> ConfigResult<Self> {
        match mode {
            1 => Ok(TsifMode::Mode1),
            2 => Ok(TsifMode::Mode2),
            3 => Ok(TsifMode::Mode3),
            _ => Err(ConfigError::InvalidMode),
        }
    }

    /// Raw mode number as programmed into hardware
    #[must_use]
    pub const fn to_raw(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for TsifMode {
    type Error = ConfigError;

    fn try_from(mode: u8) -> ConfigResult<Self> {
        Self::from_raw(mode)
    }
}

/// Packet buffer geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BufConfig {
    /// Packets moved by one DataMover transfer
    pub pkts_per_chunk: u32,
    /// Chunks in the cyclic buffer
    pub chunks_per_buf: u32,
}

impl Default for BufConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl BufConfig {
    /// Default geometry (16 packets per chunk, 8 chunks)
    #[must_use]
    pub const fn new() -> Self {
        Self {
            pkts_per_chunk: DEFAULT_PKTS_PER_CHUNK,
            chunks_per_buf: DEFAULT_CHUNKS_PER_BUF,
        }
    }

    /// Geometry with explicit sizes (unvalidated)
    #[must_use]
    pub const fn with_sizes(pkts_per_chunk: u32, chunks_per_buf: u32) -> Self {
        Self {
            pkts_per_chunk,
            chunks_per_buf,
        }
    }

    /// Total packet slots in the buffer
    #[must_use]
    pub const fn packets(&self) -> u32 {
        self.pkts_per_chunk * self.chunks_per_buf
    }

    /// Check sizes against hardware and sanity bounds
    pub const fn validate(&self) -> ConfigResult<()> {
        if self.pkts_per_chunk == 0 || self.chunks_per_buf < MIN_CHUNKS_PER_BUF {
            return Err(ConfigError::InvalidBufferConfig);
        }
        match self.pkts_per_chunk.checked_mul(self.chunks_per_buf) {
            Some(total) if total <= MAX_PACKETS_IN_BUF => Ok(()),
            _ => Err(ConfigError::InvalidBufferConfig),
        }
    }
}

/// Complete TSIF configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TsifConfig {
    /// Stream mode
    pub mode: TsifMode,
    /// Time limit in TSIF clock ticks (24-bit)
    pub time_limit: u32,
    /// Packet buffer geometry
    pub buf: BufConfig,
}

impl Default for TsifConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl TsifConfig {
    /// Create a new configuration with defaults
    #[must_use]
    pub const fn new() -> Self {
        Self {
            mode: TsifMode::Mode1,
            time_limit: DEFAULT_TIME_LIMIT,
            buf: BufConfig::new(),
        }
    }

    // =========================================================================
    // Builder Methods
    // =========================================================================

    /// Set the stream mode
    #[must_use]
    pub const fn with_mode(mut self, mode: TsifMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the time limit
    #[must_use]
    pub const fn with_time_limit(mut self, time_limit: u32) -> Self {
        self.time_limit = time_limit;
        self
    }

    /// Set the packet buffer geometry
    #[must_use]
    pub const fn with_buf_config(mut self, pkts_per_chunk: u32, chunks_per_buf: u32) -> Self {
        self.buf = BufConfig::with_sizes(pkts_per_chunk, chunks_per_buf);
        self
    }

    /// Validate every field
    pub const fn validate(&self) -> ConfigResult<()> {
        if self.time_limit > MAX_TIME_LIMIT {
            return Err(ConfigError::InvalidTimeLimit);
        }
        self.buf.validate()
    }
}

/// Driver state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum State {
    /// No buffer allocated, hardware disabled
    #[default]
    Stopped,
    /// Streaming into the packet buffer
    Running,
    /// Hardware disabled, waiting for outstanding transfers to drain
    Flushing,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_default_values() {
        let config = TsifConfig::new();

        assert_eq!(config.mode, TsifMode::Mode1);
        assert_eq!(config.time_limit, DEFAULT_TIME_LIMIT);
        assert_eq!(config.buf.pkts_per_chunk, 16);
        assert_eq!(config.buf.chunks_per_buf, 8);
        assert_eq!(config.buf.packets(), 128);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_default_trait_matches_new() {
        assert_eq!(TsifConfig::default(), TsifConfig::new());
        assert_eq!(BufConfig::default(), BufConfig::new());
    }

    #[test]
    fn config_builder_chaining() {
        let config = TsifConfig::new()
            .with_mode(TsifMode::Mode3)
            .with_time_limit(0x1234)
            .with_buf_config(32, 4);

        assert_eq!(config.mode, TsifMode::Mode3);
        assert_eq!(config.time_limit, 0x1234);
        assert_eq!(config.buf.packets(), 128);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn mode_from_raw() {
        assert_eq!(TsifMode::from_raw(1), Ok(TsifMode::Mode1));
        assert_eq!(TsifMode::from_raw(2), Ok(TsifMode::Mode2));
        assert_eq!(TsifMode::from_raw(3), Ok(TsifMode::Mode3));
        assert_eq!(TsifMode::from_raw(0), Err(ConfigError::InvalidMode));
        assert_eq!(TsifMode::from_raw(4), Err(ConfigError::InvalidMode));
        assert_eq!(TsifMode::try_from(2u8), Ok(TsifMode::Mode2));
    }

    #[test]
    fn mode_to_raw() {
        assert_eq!(TsifMode::Mode1.to_raw(), 1);
        assert_eq!(TsifMode::Mode2.to_raw(), 2);
        assert_eq!(TsifMode::Mode3.to_raw(), 3);
    }

    #[test]
    fn time_limit_bound() {
        assert!(TsifConfig::new().with_time_limit(MAX_TIME_LIMIT).validate().is_ok());
        assert_eq!(
            TsifConfig::new().with_time_limit(MAX_TIME_LIMIT + 1).validate(),
            Err(ConfigError::InvalidTimeLimit)
        );
    }

    #[test]
    fn buf_config_packet_bound() {
        assert!(BufConfig::with_sizes(1024, 10).validate().is_ok());
        assert_eq!(
            BufConfig::with_sizes(1024, 11).validate(),
            Err(ConfigError::InvalidBufferConfig)
        );
    }

    #[test]
    fn buf_config_rejects_degenerate_sizes() {
        assert!(BufConfig::with_sizes(0, 8).validate().is_err());
        assert!(BufConfig::with_sizes(16, 0).validate().is_err());
        assert!(BufConfig::with_sizes(16, 1).validate().is_err());
        assert!(BufConfig::with_sizes(1, 2).validate().is_ok());
    }

    #[test]
    fn buf_config_overflowing_product_rejected() {
        assert!(BufConfig::with_sizes(u32::MAX, 2).validate().is_err());
    }

    #[test]
    fn state_default() {
        assert_eq!(State::default(), State::Stopped);
    }
}
