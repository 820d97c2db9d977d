use crate::PortIo;

/// [`PortIo`] backed by the `in`/`out` instructions.
#[derive(Debug)]
pub struct X86Ports {
    _private: (),
}

impl X86Ports {
    /// Creates the port capability.
    ///
    /// # Safety
    /// The caller must execute at CPL0 **or** hold I/O permission (IOPL or the
    /// TSS I/O bitmap) for every port later passed to this value; otherwise the
    /// CPU raises `#GP`. Coordinating with other users of the same device is
    /// also the caller's responsibility.
    #[must_use]
    pub const unsafe fn new() -> Self {
        Self { _private: () }
    }
}

impl PortIo for X86Ports {
    #[inline]
    fn outb(&self, port: u16, value: u8) {
        // SAFETY: privilege was asserted when `self` was created.
        unsafe { outb(port, value) }
    }

    #[inline]
    fn inb(&self, port: u16) -> u8 {
        // SAFETY: see `outb`.
        unsafe { inb(port) }
    }

    #[inline]
    fn outl(&self, port: u16, value: u32) {
        // SAFETY: see `outb`.
        unsafe { outl(port, value) }
    }

    #[inline]
    fn inl(&self, port: u16) -> u32 {
        // SAFETY: see `outb`.
        unsafe { inl(port) }
    }
}

/// Write one byte to an I/O port. Uses `out dx, al`.
///
/// # Safety
/// - **Privilege:** Execute at CPL0 or have I/O permission for `port`.
/// - **Correct port:** `port` must belong to the intended device and be in a
///   state that accepts this write. Writing an SMI command port triggers
///   firmware code immediately.
/// - **Ordering:** `out` is ordered with other I/O instructions but is **not**
///   a general memory fence. Shared-memory mailboxes written before the
///   trigger need a fence if the compiler could reorder them.
#[inline]
pub unsafe fn outb(port: u16, val: u8) {
    unsafe {
        core::arch::asm!("out dx, al", in("dx") port, in("al") val, options(nostack, preserves_flags));
    }
}

/// Read one byte from an I/O port. Uses `in al, dx`.
///
/// # Safety
/// Same obligations as [`outb`]. Reads of nonexistent ports may hang some
/// chipsets.
#[inline]
#[must_use]
pub unsafe fn inb(port: u16) -> u8 {
    let mut v: u8;
    unsafe {
        core::arch::asm!("in al, dx", in("dx") port, out("al") v, options(nomem, nostack, preserves_flags));
    }
    v
}

/// Write one dword to an I/O port. Uses `out dx, eax`.
///
/// # Safety
/// Same obligations as [`outb`].
#[inline]
pub unsafe fn outl(port: u16, val: u32) {
    unsafe {
        core::arch::asm!("out dx, eax", in("dx") port, in("eax") val, options(nostack, preserves_flags));
    }
}

/// Read one dword from an I/O port. Uses `in eax, dx`.
///
/// # Safety
/// Same obligations as [`outb`].
#[inline]
#[must_use]
pub unsafe fn inl(port: u16) -> u32 {
    let mut v: u32;
    unsafe {
        core::arch::asm!("in eax, dx", in("dx") port, out("eax") v, options(nomem, nostack, preserves_flags));
    }
    v
}
