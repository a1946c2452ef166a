//! DMA-coherent memory for the packet buffer.

use core::ptr::NonNull;

/// A block of DMA-coherent memory
///
/// Holds the CPU view and the bus address of the same physically
/// contiguous region.
#[derive(Debug)]
pub struct DmaRegion {
    cpu: NonNull<u8>,
    bus: u32,
    len: usize,
}

impl DmaRegion {
    /// Describe an allocated region.
    ///
    /// # Safety
    ///
    /// `cpu` must be valid for reads and writes of `len` bytes, aligned to at
    /// least 4 bytes, and stay valid until the region is handed back through
    /// [`DmaAllocator::free_coherent`]. `bus` must be the device-visible
    /// address of the same memory.
    pub const unsafe fn new(cpu: NonNull<u8>, bus: u32, len: usize) -> Self {
        Self { cpu, bus, len }
    }

    /// CPU pointer to the start of the region
    #[inline(always)]
    pub const fn cpu_ptr(&self) -> NonNull<u8> {
        self.cpu
    }

    /// Bus address of the start of the region
    #[inline(always)]
    pub const fn bus_addr(&self) -> u32 {
        self.bus
    }

    /// Length in bytes
    #[inline(always)]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether the region is zero-sized
    #[inline(always)]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }
}

// SAFETY: the region is plain memory owned by whoever holds the DmaRegion.
unsafe impl Send for DmaRegion {}

/// Allocator for DMA-coherent, physically contiguous memory
pub trait DmaAllocator {
    /// Allocate `len` bytes; `None` when memory is exhausted
    fn alloc_coherent(&mut self, len: usize) -> Option<DmaRegion>;

    /// Return a region obtained from [`DmaAllocator::alloc_coherent`]
    ///
    /// May be called from interrupt context when the last outstanding
    /// transfer drains.
    fn free_coherent(&mut self, region: DmaRegion);
}
