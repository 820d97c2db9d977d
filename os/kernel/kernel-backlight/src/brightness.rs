//! User brightness levels versus SABI hardware values.
//!
//! The BIOS counts brightness `1..=8`; `0` is reserved for the state where the
//! BIOS itself manages the panel. Users see `0..=7`.

/// Highest user level.
pub const MAX_LEVEL: u8 = 7;

/// Hardware value for a user level. Out-of-range levels clamp to
/// [`MAX_LEVEL`], so the result is always in `1..=8`.
#[must_use]
pub const fn to_hardware(level: u8) -> u8 {
    let level = if level > MAX_LEVEL { MAX_LEVEL } else { level };
    level + 1
}

/// User level for a hardware value. The BIOS-managed `0` reads as level 0.
#[must_use]
pub const fn from_hardware(hw: u8) -> u8 {
    let level = hw.saturating_sub(1);
    if level > MAX_LEVEL { MAX_LEVEL } else { level }
}
