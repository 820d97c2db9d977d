//! The interface a backlight subsystem drives.

use crate::BacklightError;

/// Panel power as the backlight subsystem requests it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Power {
    #[default]
    On,
    Off,
}

/// Requested state handed to [`BacklightOps::update_status`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct BacklightProperties {
    pub brightness: u8,
    pub power: Power,
}

/// Backlight hardware operations.
pub trait BacklightOps {
    fn max_brightness(&self) -> u8;

    /// Current brightness in `0..=max_brightness()`. Never fails; reports
    /// the last known level when the hardware cannot be read.
    fn get_brightness(&self) -> u8;

    /// Applies brightness and power.
    ///
    /// # Errors
    /// When the hardware rejected the change.
    fn update_status(&self, props: &BacklightProperties) -> Result<(), BacklightError>;
}
