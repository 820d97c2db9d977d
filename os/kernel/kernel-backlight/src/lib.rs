//! # Samsung N120/N130/NC10 Backlight Driver
//!
//! Brightness and panel power for Samsung netbooks whose BIOS exposes the
//! SABI interface (see [`kernel_sabi`]), plus the PCI-configuration fallback
//! used before SABI was understood.
//!
//! ## Attaching
//!
//! ```text
//! DmiIdentity ──► supported table? ──no──► force? ──no──► Unsupported
//!                      │ yes                 │ yes
//!                      ▼                     ▼
//!                 Sabi::probe  (scan 0xF0000, map interface buffer)
//!                      ▼
//!                 SET_LINUX 0x81   (BIOS stops handling the Fn keys itself)
//!                      ▼
//!                 SamsungBacklight (get_brightness / update_status)
//! ```
//!
//! ## Levels
//!
//! The backlight subsystem sees levels `0..=7`; the BIOS is programmed with
//! `1..=8`. Reads that fail report the last known level.
//!
//! ## Example
//! ```rust,no_run
//! use kernel_backlight::{
//!     BacklightOps, BacklightProperties, DmiIdentity, DriverParams, Power, SamsungBacklight,
//! };
//! use kernel_ports::X86Ports;
//! use kernel_sabi::{HhdmPhysMapper, TscDelay};
//!
//! let identity = DmiIdentity {
//!     sys_vendor: "SAMSUNG ELECTRONICS CO., LTD.",
//!     product_name: "N130",
//!     board_name: "N130",
//! };
//! let mapper = HhdmPhysMapper::new(0xFFFF_8000_0000_0000);
//!
//! // SAFETY: ring 0, HHDM covers low memory.
//! let backlight = unsafe {
//!     SamsungBacklight::attach(
//!         &identity,
//!         DriverParams::default(),
//!         &mapper,
//!         X86Ports::new(),
//!         TscDelay::new(1_600_000_000),
//!     )
//! }
//! .expect("backlight");
//!
//! backlight
//!     .update_status(&BacklightProperties { brightness: 4, power: Power::On })
//!     .expect("update");
//! assert_eq!(backlight.get_brightness(), 4);
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

pub mod brightness;
pub mod commands;
mod device;
pub mod dmi;
mod driver;
mod error;
pub mod legacy;
mod logger;
mod params;

pub use device::{BacklightOps, BacklightProperties, Power};
pub use dmi::{DmiIdentity, DmiMatch};
pub use driver::SamsungBacklight;
pub use error::BacklightError;
pub use legacy::{LegacyPciBacklight, PciAddress, PciConfig, PciConfigPorts};
pub use logger::{DEBUG_PORT, PortLogger};
pub use params::{DEFAULT_PCI_OFFSET, DriverParams};
