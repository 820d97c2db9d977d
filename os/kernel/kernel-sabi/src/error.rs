use crate::transaction::{COMPLETION_OK, DATA_REJECTED};

/// Errors raised while locating the SABI interface or talking to it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SabiError {
    /// The BIOS segment does not carry the SABI marker. Expected on machines
    /// (or BIOS revisions) without the interface.
    #[error("SABI signature not found in {scanned:#x} bytes")]
    SignatureNotFound { scanned: usize },
    /// The marker was found but the control header would run past the end
    /// of the mapped segment.
    #[error("SABI header at {offset:#x} extends past the {window:#x}-byte window")]
    HeaderOutOfWindow { offset: usize, window: usize },
    #[error("failed to map {len:#x} bytes at physical {address:#x}")]
    MapFailed { address: u64, len: usize },
    #[error(transparent)]
    Transaction(#[from] TransactionFailure),
}

impl SabiError {
    /// Whether the error only means this machine has no usable SABI.
    #[must_use]
    pub const fn is_unsupported(&self) -> bool {
        matches!(
            self,
            Self::SignatureNotFound { .. } | Self::HeaderOutOfWindow { .. }
        )
    }
}

/// A transaction the BIOS did not complete successfully.
///
/// Carries the raw bytes observed after write access was restored so the
/// failure can be reported as the firmware left it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
#[error(
    "SABI command {command:#04x} failed with completion flag {completion:#04x} and output {data:#04x}"
)]
pub struct TransactionFailure {
    pub command: u8,
    pub completion: u8,
    pub data: u8,
}

/// Why a [`TransactionFailure`] happened, derived from its raw bytes.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FailureCause {
    /// The completion flag never reached the success sentinel.
    Incomplete,
    /// The BIOS flagged completion but answered with the rejection byte.
    Rejected,
}

impl TransactionFailure {
    #[must_use]
    pub const fn cause(&self) -> FailureCause {
        if self.completion == COMPLETION_OK && self.data == DATA_REJECTED {
            FailureCause::Rejected
        } else {
            FailureCause::Incomplete
        }
    }
}
