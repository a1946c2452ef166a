//! DataMover (streaming DMA engine) interface.
//!
//! The DataMover copies packets from the TSIF receive FIFO into the packet
//! buffer using "box" transfers: a number of equally sized rows written to
//! consecutive destination rows. One transfer moves one chunk.

use crate::driver::error::DmaResult;
use crate::internal::constants::TSIF_PKT_SIZE;

// =============================================================================
// Transfer Slot
// =============================================================================

/// One of the two in-flight transfer slots
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum XferSlot {
    /// First transfer slot
    Slot0,
    /// Second transfer slot
    Slot1,
}

impl XferSlot {
    /// All slots in scheduling order
    pub const ALL: [XferSlot; 2] = [XferSlot::Slot0, XferSlot::Slot1];

    /// Array index of this slot
    #[inline(always)]
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            XferSlot::Slot0 => 0,
            XferSlot::Slot1 => 1,
        }
    }
}

// =============================================================================
// Transfer Result
// =============================================================================

/// Outcome reported by the DataMover for a finished transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum XferResult {
    /// Transfer completed; the chunk holds fresh packets
    Done,
    /// Bus or engine error; chunk contents are undefined
    Error,
    /// Transfer aborted by a flush request
    Flush,
}

// =============================================================================
// Box Command
// =============================================================================

/// Box-mode transfer descriptor for one chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BoxCommand {
    /// Bus address of the first destination row
    pub dst_row_addr: u32,
    /// Bytes per row (one packet)
    pub row_len: u16,
    /// Number of rows (packets per chunk)
    pub num_rows: u16,
    /// Stride between destination rows in bytes
    pub dst_row_offset: u16,
}

impl BoxCommand {
    /// Command writing `packets` consecutive packets starting at `dst_row_addr`
    #[must_use]
    pub const fn for_packets(dst_row_addr: u32, packets: u16) -> Self {
        Self {
            dst_row_addr,
            row_len: TSIF_PKT_SIZE as u16,
            num_rows: packets,
            dst_row_offset: TSIF_PKT_SIZE as u16,
        }
    }

    /// Total bytes written by this command
    #[must_use]
    pub const fn len_bytes(&self) -> usize {
        self.num_rows as usize * self.row_len as usize
    }
}

// =============================================================================
// DataMover Trait
// =============================================================================

/// DataMover channel used by the TSIF core
///
/// Implementations wrap the platform's DMA channel. Transfers complete in
/// submission order.
///
/// Completions are not delivered through a callback. The platform's DMA
/// interrupt handler calls the driver's `handle_interrupt`, which drains
/// [`DataMover::poll_result`]. `enqueue` is never called from that path,
/// so implementations may hold their channel lock across it.
pub trait DataMover {
    /// Queue a transfer for `slot`
    fn enqueue(&mut self, slot: XferSlot, cmd: &BoxCommand) -> DmaResult<()>;

    /// Ask the engine to abort queued transfers
    ///
    /// Aborted transfers are reported with [`XferResult::Flush`].
    fn flush(&mut self);

    /// Pop the next finished transfer, if any
    fn poll_result(&mut self) -> Option<(XferSlot, XferResult)>;
}
