//! # x86 I/O Port Access
//!
//! Low-level access to the x86 I/O port address space for drivers that talk to
//! firmware and legacy devices through `in`/`out` rather than MMIO.
//!
//! ## Overview
//!
//! Drivers never call the instructions directly. They take a [`PortIo`]
//! capability instead, which is either:
//!
//! * [`X86Ports`], the real thing, only constructible in a context that is
//!   allowed to execute `in`/`out` (CPL0 or a permissive IOPL/bitmap), or
//! * a recording fake in tests, so port protocols (SMI triggers, PCI
//!   configuration cycles, debug console output) can be verified on a host.
//!
//! ## Available Operations
//!
//! | width | write | read |
//! |---|---|---|
//! | byte | [`PortIo::outb`] | [`PortIo::inb`] |
//! | dword | [`PortIo::outl`] | [`PortIo::inl`] |
//!
//! ## Usage Example
//! ```rust,no_run
//! use kernel_ports::{PortIo, X86Ports};
//!
//! // SAFETY: running in ring 0.
//! let ports = unsafe { X86Ports::new() };
//! ports.outb(0xB2, 0x81);
//! ```
//!
//! ## Safety Model
//!
//! The privilege and device-presence obligations of the raw instructions are
//! discharged once, in [`X86Ports::new`]. After that the trait methods are
//! safe to call; protocol correctness (which port, which value, in which
//! order) is the caller's business and is usually enforced by a lock around a
//! whole register sequence.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
mod x86;

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
pub use x86::{X86Ports, inb, inl, outb, outl};

/// Port-mapped I/O capability.
///
/// Implementations must perform each access exactly once and in call order;
/// callers rely on that to sequence firmware handshakes.
pub trait PortIo {
    /// Write one byte to `port`.
    fn outb(&self, port: u16, value: u8);

    /// Read one byte from `port`.
    fn inb(&self, port: u16) -> u8;

    /// Write one dword to `port`.
    fn outl(&self, port: u16, value: u32);

    /// Read one dword from `port`.
    fn inl(&self, port: u16) -> u32;
}

impl<T: PortIo + ?Sized> PortIo for &T {
    #[inline]
    fn outb(&self, port: u16, value: u8) {
        (**self).outb(port, value);
    }

    #[inline]
    fn inb(&self, port: u16) -> u8 {
        (**self).inb(port)
    }

    #[inline]
    fn outl(&self, port: u16, value: u32) {
        (**self).outl(port, value);
    }

    #[inline]
    fn inl(&self, port: u16) -> u32 {
        (**self).inl(port)
    }
}
