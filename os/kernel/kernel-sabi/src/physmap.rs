//! Physical memory windows.
//!
//! The SABI driver touches two firmware-owned regions: the `0xF0000` BIOS
//! segment (scanned once) and the 16-byte interface buffer (read and written
//! on every transaction). Both are reached through [`PhysMapRw`], which hands
//! out owned [`MemoryWindow`]s. Dropping a window releases its mapping.

use core::ptr::NonNull;

/// Byte-addressed access to a mapped physical region.
///
/// Offsets are relative to the start of the window and must be below
/// [`MemoryWindow::len`]. Accesses go to the device or firmware memory
/// every time; implementations must not cache.
pub trait MemoryWindow {
    /// Size of the window in bytes.
    fn len(&self) -> usize;

    /// Whether the window is zero-sized.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read_u8(&self, offset: usize) -> u8;

    fn write_u8(&self, offset: usize, value: u8);

    /// Little-endian 16-bit read built from two byte reads.
    fn read_u16(&self, offset: usize) -> u16 {
        u16::from_le_bytes([self.read_u8(offset), self.read_u8(offset + 1)])
    }

    /// Little-endian 16-bit write built from two byte writes.
    fn write_u16(&self, offset: usize, value: u16) {
        let [lo, hi] = value.to_le_bytes();
        self.write_u8(offset, lo);
        self.write_u8(offset + 1, hi);
    }
}

/// Map a physical region and return a *read/write* window over its contents.
/// You provide the implementation (identity map, HHDM, ioremap, a test fake).
pub trait PhysMapRw {
    type Window: MemoryWindow;

    /// Returns `None` when the region cannot be mapped.
    ///
    /// # Safety
    /// The implementor must ensure the returned window is valid for `len`
    /// bytes at `paddr` for as long as it lives. The caller must not create
    /// conflicting mappings of the same region with different attributes.
    unsafe fn map_rw(&self, paddr: u64, len: usize) -> Option<Self::Window>;
}

/// [`PhysMapRw`] for kernels with a higher-half direct map (HHDM).
///
/// Every physical address is visible at `hhdm_base + paddr`, so mapping is
/// pointer arithmetic and dropping a window is a no-op.
#[derive(Debug, Clone, Copy)]
pub struct HhdmPhysMapper {
    hhdm_base: u64,
}

impl HhdmPhysMapper {
    #[must_use]
    pub const fn new(hhdm_base: u64) -> Self {
        Self { hhdm_base }
    }
}

impl PhysMapRw for HhdmPhysMapper {
    type Window = MmioWindow;

    unsafe fn map_rw(&self, paddr: u64, len: usize) -> Option<MmioWindow> {
        let va = self.hhdm_base.checked_add(paddr)?;
        let va = usize::try_from(va).ok()?;
        let base = NonNull::new(va as *mut u8)?;
        // SAFETY: caller guarantees the HHDM covers [paddr, paddr + len).
        Some(unsafe { MmioWindow::new(base, len) })
    }
}

/// Volatile view over mapped firmware memory.
#[derive(Debug)]
pub struct MmioWindow {
    base: NonNull<u8>,
    len: usize,
}

// SAFETY: the window is the sole owner of its view; volatile accesses carry
// no thread affinity.
unsafe impl Send for MmioWindow {}

impl MmioWindow {
    /// # Safety
    /// `base` must be valid for volatile reads and writes of `len` bytes for
    /// the lifetime of the returned window.
    #[must_use]
    pub const unsafe fn new(base: NonNull<u8>, len: usize) -> Self {
        Self { base, len }
    }
}

impl MemoryWindow for MmioWindow {
    fn len(&self) -> usize {
        self.len
    }

    fn read_u8(&self, offset: usize) -> u8 {
        debug_assert!(offset < self.len, "read past window end");
        // SAFETY: offset is inside the window established in `new`.
        unsafe { self.base.as_ptr().add(offset).read_volatile() }
    }

    fn write_u8(&self, offset: usize, value: u8) {
        debug_assert!(offset < self.len, "write past window end");
        // SAFETY: see `read_u8`.
        unsafe { self.base.as_ptr().add(offset).write_volatile(value) }
    }
}
