use kernel_sabi::SabiError;

#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BacklightError {
    /// The machine is not on the supported list and `force` was not given.
    #[error("platform not supported")]
    Unsupported,
    /// The legacy backend found a different PCI function than expected.
    #[error("unexpected PCI device {vendor:04x}:{device:04x}")]
    DeviceMismatch { vendor: u16, device: u16 },
    #[error(transparent)]
    Sabi(#[from] SabiError),
}

impl BacklightError {
    /// Whether the driver should simply not attach, as opposed to a failure
    /// on hardware it recognised.
    #[must_use]
    pub const fn is_unsupported(&self) -> bool {
        match self {
            Self::Unsupported | Self::DeviceMismatch { .. } => true,
            Self::Sabi(err) => err.is_unsupported(),
        }
    }
}
