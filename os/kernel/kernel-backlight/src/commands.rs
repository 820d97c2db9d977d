//! SABI command codes used by the backlight driver.

pub const GET_BRIGHTNESS: u8 = 0x10;
pub const SET_BRIGHTNESS: u8 = 0x11;
pub const GET_BACKLIGHT: u8 = 0x2D;
pub const SET_BACKLIGHT: u8 = 0x2E;

/// Hands brightness keys and panel control to the operating system.
pub const SET_LINUX: u8 = 0x0A;

/// Payload for [`SET_LINUX`].
pub const LINUX_MODE: u8 = 0x81;
