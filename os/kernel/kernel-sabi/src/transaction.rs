//! One SABI request/response exchange.
//!
//! ```text
//! Idle ─► WriteEnabled ─► CommandStaged ─► Triggered ─► Waiting ─► WriteRestored ─┬► Success
//!                                                                                 └► Failed
//! ```
//!
//! The sequence always runs to the end once started. Write access is
//! restored before the outcome is inspected, so a failed command leaves the
//! buffer protected just like a successful one.

use kernel_ports::PortIo;
use log::{trace, warn};

use crate::delay::Delay;
use crate::error::TransactionFailure;
use crate::header::ControlHeader;
use crate::interface::{InterfaceBuffer, RESULT_LEN};
use crate::physmap::MemoryWindow;

/// Completion flag value written by the BIOS when it serviced a request.
pub const COMPLETION_OK: u8 = 0xAA;

/// First data byte the BIOS leaves behind when it refused a request.
pub const DATA_REJECTED: u8 = 0xFF;

/// Time the SMI handler gets before the buffer is inspected.
pub const SMI_SETTLE_MS: u32 = 100;

/// A command plus its optional payload byte.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Request {
    pub command: u8,
    pub payload: Option<u8>,
}

impl Request {
    #[must_use]
    pub const fn get(command: u8) -> Self {
        Self {
            command,
            payload: None,
        }
    }

    #[must_use]
    pub const fn set(command: u8, data: u8) -> Self {
        Self {
            command,
            payload: Some(data),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TransactionState {
    Idle,
    WriteEnabled,
    CommandStaged,
    Triggered,
    Waiting,
    WriteRestored,
    Success,
    Failed,
}

/// Everything a transaction touches. Lives behind the channel lock.
pub(crate) struct Channel<W, P, D> {
    pub(crate) header: ControlHeader,
    pub(crate) iface: InterfaceBuffer<W>,
    pub(crate) ports: P,
    pub(crate) delay: D,
}

impl<W, P, D> Channel<W, P, D>
where
    W: MemoryWindow,
    P: PortIo,
    D: Delay,
{
    /// Runs `request` through the full state machine.
    pub(crate) fn execute(
        &self,
        request: Request,
    ) -> Result<[u8; RESULT_LEN], TransactionFailure> {
        let mut tx = Transaction::new(request);
        let port = self.header.port;

        self.ports.outb(port, self.header.enable_code);
        tx.advance(TransactionState::WriteEnabled);

        self.iface.stage(request.command, request.payload);
        tx.advance(TransactionState::CommandStaged);

        self.ports.outb(port, self.header.trigger_code);
        tx.advance(TransactionState::Triggered);

        tx.advance(TransactionState::Waiting);
        self.delay.delay_ms(SMI_SETTLE_MS);

        self.ports.outb(port, self.header.restore_code);
        tx.advance(TransactionState::WriteRestored);

        let completion = self.iface.completion();
        let data = self.iface.data(0);
        if completion == COMPLETION_OK && data != DATA_REJECTED {
            let results = self.iface.results();
            tx.advance(TransactionState::Success);
            return Ok(results);
        }

        tx.advance(TransactionState::Failed);
        let failure = TransactionFailure {
            command: request.command,
            completion,
            data,
        };
        warn!("{failure}");
        Err(failure)
    }
}

struct Transaction {
    request: Request,
    state: TransactionState,
}

impl Transaction {
    const fn new(request: Request) -> Self {
        Self {
            request,
            state: TransactionState::Idle,
        }
    }

    fn advance(&mut self, next: TransactionState) {
        trace!(
            "SABI {:#04x}: {:?} -> {:?}",
            self.request.command, self.state, next
        );
        self.state = next;
    }
}
