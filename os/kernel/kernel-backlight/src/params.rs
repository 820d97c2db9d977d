use log::LevelFilter;

/// Configuration byte of the graphics function that holds the brightness
/// on the first N130 BIOS revisions.
pub const DEFAULT_PCI_OFFSET: u8 = 0xF4;

/// Load-time parameters.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DriverParams {
    /// Attach even if the platform identity does not match.
    pub force: bool,
    /// Verbose diagnostics, including the decoded SABI header.
    pub debug: bool,
    /// Brightness register used by the legacy PCI backend.
    pub pci_offset: u8,
}

impl Default for DriverParams {
    fn default() -> Self {
        Self::new()
    }
}

impl DriverParams {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            force: false,
            debug: false,
            pci_offset: DEFAULT_PCI_OFFSET,
        }
    }

    #[must_use]
    pub const fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    #[must_use]
    pub const fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    #[must_use]
    pub const fn with_pci_offset(mut self, offset: u8) -> Self {
        self.pci_offset = offset;
        self
    }

    /// Log level implied by [`DriverParams::debug`].
    #[must_use]
    pub const fn log_level(&self) -> LevelFilter {
        if self.debug {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        }
    }
}
