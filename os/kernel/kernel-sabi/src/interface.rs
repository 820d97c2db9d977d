//! The interface buffer shared with the SMI handler.

use core::fmt;

use crate::physmap::MemoryWindow;

/// Bytes mapped at the interface buffer address.
pub const INTERFACE_LEN: usize = 16;

/// Result bytes handed back to callers. The firmware reserves more; nothing
/// known uses them.
pub const RESULT_LEN: usize = 4;

/// Main function code the BIOS expects in every request.
pub const MAIN_FUNCTION: u16 = 0x4C49;

const IFACE_MAIN: usize = 0x00;
const IFACE_SUB: usize = 0x02;
const IFACE_COMPLETE: usize = 0x04;
const IFACE_DATA: usize = 0x05;

/// Real-mode `segment:offset` pointer.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SegmentedAddress {
    pub segment: u16,
    pub offset: u16,
}

impl SegmentedAddress {
    #[must_use]
    pub const fn new(segment: u16, offset: u16) -> Self {
        Self { segment, offset }
    }

    /// `(segment << 4) + offset`.
    #[must_use]
    #[allow(clippy::cast_lossless)]
    pub const fn linear(self) -> u64 {
        ((self.segment as u64) << 4) + self.offset as u64
    }
}

impl fmt::Display for SegmentedAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04x}:{:04x}", self.segment, self.offset)
    }
}

/// Typed access to a mapped interface buffer.
#[derive(Debug)]
pub struct InterfaceBuffer<W> {
    window: W,
}

impl<W: MemoryWindow> InterfaceBuffer<W> {
    /// Wraps `window`, or gives it back if it is too small to hold the
    /// request fields and result bytes.
    ///
    /// # Errors
    /// Returns the window unchanged when it is shorter than [`INTERFACE_LEN`].
    pub fn new(window: W) -> Result<Self, W> {
        if window.len() < INTERFACE_LEN {
            return Err(window);
        }
        Ok(Self { window })
    }

    /// Writes the request fields and clears the completion flag.
    pub fn stage(&self, command: u8, payload: Option<u8>) {
        self.window.write_u16(IFACE_MAIN, MAIN_FUNCTION);
        self.window.write_u16(IFACE_SUB, u16::from(command));
        self.window.write_u8(IFACE_COMPLETE, 0);
        if let Some(data) = payload {
            self.window.write_u8(IFACE_DATA, data);
        }
    }

    #[must_use]
    pub fn completion(&self) -> u8 {
        self.window.read_u8(IFACE_COMPLETE)
    }

    #[must_use]
    pub fn data(&self, index: usize) -> u8 {
        self.window.read_u8(IFACE_DATA + index)
    }

    #[must_use]
    pub fn results(&self) -> [u8; RESULT_LEN] {
        core::array::from_fn(|i| self.data(i))
    }
}
