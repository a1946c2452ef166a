//! TSIF receiver control.

use crate::driver::config::TsifMode;
use crate::driver::error::Result;
use crate::driver::status::StreamStatus;

/// TSIF receiver block
///
/// Covers clocks, pins and the receiver's control/status registers.
pub trait StreamControl {
    /// Start receiving with the given mode and time limit
    fn enable(&mut self, mode: TsifMode, time_limit: u32) -> Result<()>;

    /// Stop receiving
    ///
    /// Called from interrupt context when a transfer error forces a stop.
    fn disable(&mut self);

    /// Read and acknowledge pending receiver status
    fn take_status(&mut self) -> StreamStatus;
}
