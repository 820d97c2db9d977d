//! Brightness through PCI configuration space.
//!
//! Before SABI was understood, the N130 brightness was driven by poking one
//! byte of the integrated graphics function's configuration space. The BIOS
//! still honours it, with a raw `0..=255` range and no panel power control.

use kernel_ports::PortIo;
use log::{info, warn};

use crate::device::{BacklightOps, BacklightProperties};
use crate::{BacklightError, DriverParams};

/// Intel 945GME integrated graphics, as found in the N130.
pub const GRAPHICS_VENDOR: u16 = 0x8086;
pub const GRAPHICS_DEVICE: u16 = 0x27AE;

const CONFIG_ADDRESS: u16 = 0xCF8;
const CONFIG_DATA: u16 = 0xCFC;

/// Byte access to one PCI function's configuration space.
pub trait PciConfig {
    fn read_u8(&self, offset: u8) -> u8;
    fn write_u8(&self, offset: u8, value: u8);

    fn read_u16(&self, offset: u8) -> u16 {
        u16::from_le_bytes([self.read_u8(offset), self.read_u8(offset.wrapping_add(1))])
    }
}

/// Bus/device/function of a PCI function.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PciAddress {
    pub bus: u8,
    pub device: u8,
    pub function: u8,
}

impl PciAddress {
    /// Integrated graphics sits at 00:02.0 on these machines.
    pub const GRAPHICS: Self = Self {
        bus: 0,
        device: 2,
        function: 0,
    };

    /// Configuration mechanism #1 address for the dword holding `offset`.
    #[must_use]
    pub const fn config_address(self, offset: u8) -> u32 {
        0x8000_0000
            | (self.bus as u32) << 16
            | ((self.device & 0x1F) as u32) << 11
            | ((self.function & 0x07) as u32) << 8
            | (offset & 0xFC) as u32
    }
}

/// [`PciConfig`] over the legacy `0xCF8`/`0xCFC` port pair.
pub struct PciConfigPorts<P> {
    ports: P,
    address: PciAddress,
}

impl<P: PortIo> PciConfigPorts<P> {
    pub const fn new(ports: P, address: PciAddress) -> Self {
        Self { ports, address }
    }
}

impl<P: PortIo> PciConfig for PciConfigPorts<P> {
    fn read_u8(&self, offset: u8) -> u8 {
        self.ports
            .outl(CONFIG_ADDRESS, self.address.config_address(offset));
        self.ports.inb(CONFIG_DATA + u16::from(offset & 3))
    }

    fn write_u8(&self, offset: u8, value: u8) {
        self.ports
            .outl(CONFIG_ADDRESS, self.address.config_address(offset));
        self.ports.outb(CONFIG_DATA + u16::from(offset & 3), value);
    }
}

/// Backlight driven through [`DriverParams::pci_offset`].
pub struct LegacyPciBacklight<C> {
    config: C,
    offset: u8,
}

impl<C: PciConfig> LegacyPciBacklight<C> {
    /// Verifies the function is the expected graphics device (unless
    /// `force`) and takes over its brightness register.
    ///
    /// # Errors
    /// [`BacklightError::DeviceMismatch`] for any other device.
    pub fn attach(config: C, params: &DriverParams) -> Result<Self, BacklightError> {
        let vendor = config.read_u16(0x00);
        let device = config.read_u16(0x02);
        if (vendor, device) != (GRAPHICS_VENDOR, GRAPHICS_DEVICE) {
            if !params.force {
                return Err(BacklightError::DeviceMismatch { vendor, device });
            }
            warn!("forcing legacy backlight on {vendor:04x}:{device:04x}");
        }

        let this = Self {
            config,
            offset: params.pci_offset,
        };
        info!(
            "legacy backlight at config offset {:#04x}, level {}",
            this.offset,
            this.get_brightness()
        );
        Ok(this)
    }
}

impl<C: PciConfig> BacklightOps for LegacyPciBacklight<C> {
    fn max_brightness(&self) -> u8 {
        u8::MAX
    }

    fn get_brightness(&self) -> u8 {
        self.config.read_u8(self.offset)
    }

    fn update_status(&self, props: &BacklightProperties) -> Result<(), BacklightError> {
        self.config.write_u8(self.offset, props.brightness);
        Ok(())
    }
}
