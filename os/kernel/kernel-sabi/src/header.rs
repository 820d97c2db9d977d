//! The SABI control header.
//!
//! ```text
//! +0x00  u16  SMI command port
//! +0x02  u8   restore-memory code   (write-protect the interface buffer)
//! +0x03  u8   interface-function code (trigger the SMI handler)
//! +0x04  u8   enable-memory code    (unlock the interface buffer)
//! +0x05  u16  interface buffer offset
//! +0x07  u16  interface buffer segment
//! +0x09  u8   BIOS interface version
//! +0x0A  u8   launcher string flag
//! ```

use core::fmt;

use crate::SabiError;
use crate::interface::SegmentedAddress;
use crate::physmap::MemoryWindow;

/// Size of the control header in bytes.
pub const HEADER_LEN: usize = 0x0B;

const PORT: usize = 0x00;
const RESTORE_MEM: usize = 0x02;
const IFACE_FUNC: usize = 0x03;
const ENABLE_MEM: usize = 0x04;
const DATA_OFFSET: usize = 0x05;
const DATA_SEGMENT: usize = 0x07;
const BIOS_IF_VER: usize = 0x09;
const LAUNCHER_STRING: usize = 0x0A;

/// Decoded control header. Values are taken as the BIOS wrote them.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ControlHeader {
    /// Port that receives the three SMI codes below.
    pub port: u16,
    pub restore_code: u8,
    pub trigger_code: u8,
    pub enable_code: u8,
    pub data_offset: u16,
    pub data_segment: u16,
    pub bios_version: u8,
    pub launcher_string: u8,
}

impl ControlHeader {
    #[must_use]
    pub const fn from_bytes(b: &[u8; HEADER_LEN]) -> Self {
        Self {
            port: u16::from_le_bytes([b[PORT], b[PORT + 1]]),
            restore_code: b[RESTORE_MEM],
            trigger_code: b[IFACE_FUNC],
            enable_code: b[ENABLE_MEM],
            data_offset: u16::from_le_bytes([b[DATA_OFFSET], b[DATA_OFFSET + 1]]),
            data_segment: u16::from_le_bytes([b[DATA_SEGMENT], b[DATA_SEGMENT + 1]]),
            bios_version: b[BIOS_IF_VER],
            launcher_string: b[LAUNCHER_STRING],
        }
    }

    /// Reads the header starting at `offset` within `window`.
    ///
    /// # Errors
    /// [`SabiError::HeaderOutOfWindow`] if fewer than [`HEADER_LEN`] bytes
    /// remain after `offset`.
    pub fn read<W: MemoryWindow + ?Sized>(window: &W, offset: usize) -> Result<Self, SabiError> {
        let fits = offset
            .checked_add(HEADER_LEN)
            .is_some_and(|end| end <= window.len());
        if !fits {
            return Err(SabiError::HeaderOutOfWindow {
                offset,
                window: window.len(),
            });
        }

        let mut raw = [0u8; HEADER_LEN];
        for (i, byte) in raw.iter_mut().enumerate() {
            *byte = window.read_u8(offset + i);
        }
        Ok(Self::from_bytes(&raw))
    }

    /// Real-mode location of the interface buffer.
    #[must_use]
    pub const fn interface_address(&self) -> SegmentedAddress {
        SegmentedAddress::new(self.data_segment, self.data_offset)
    }
}

impl fmt::Display for ControlHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "port={:#06x} restore={:#04x} iface={:#04x} enable={:#04x} buffer={} version={:#04x} launcher={:#04x}",
            self.port,
            self.restore_code,
            self.trigger_code,
            self.enable_code,
            self.interface_address(),
            self.bios_version,
            self.launcher_string,
        )
    }
}
