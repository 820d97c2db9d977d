//! # Samsung BIOS System Management Interface (SABI)
//!
//! Samsung netbooks (N120, N130, NC10 and relatives) expose a small command
//! interface inside their BIOS. The operating system drops a request into a
//! shared memory buffer and raises a System Management Interrupt (SMI) by
//! writing to an I/O port; firmware running in SMM services the request and
//! leaves the answer in the same buffer.
//!
//! ## Discovery
//!
//! ```text
//! 0xF0000 BIOS segment (64 KiB)
//!     ↓ linear scan for "SwSmi@"
//! Control header (port, SMI codes, segment:offset)
//!     ↓ (segment << 4) + offset
//! Interface buffer (16 bytes)
//! ```
//!
//! ## Transactions
//!
//! Every command runs the same six steps while holding the channel lock:
//!
//! 1. write-enable the buffer (`enable` code to the SMI port)
//! 2. stage main function `0x4C49`, the command and an optional payload byte
//! 3. trigger the handler (`iface` code to the SMI port)
//! 4. wait [`SMI_SETTLE_MS`]
//! 5. write-protect the buffer again (`restore` code)
//! 6. accept the result iff the completion flag reads `0xAA` and the first
//!    data byte is not `0xFF`
//!
//! The buffer and port are a single shared resource; [`Sabi`] serializes all
//! callers with a FIFO [`TicketLock`] held from step 1 through step 6.
//!
//! ## Capabilities
//!
//! Physical memory ([`PhysMapRw`]), ports ([`PortIo`]) and time ([`Delay`])
//! are supplied by the caller, which keeps the protocol testable against a
//! simulated BIOS and free of global state.
//!
//! ## Usage
//! ```rust,no_run
//! use kernel_ports::X86Ports;
//! use kernel_sabi::{HhdmPhysMapper, Sabi, TscDelay};
//!
//! const GET_BRIGHTNESS: u8 = 0x10;
//!
//! let mapper = HhdmPhysMapper::new(0xFFFF_8000_0000_0000);
//! // SAFETY: ring 0, HHDM covers low memory, SABI firmware trusted.
//! let sabi = unsafe {
//!     Sabi::probe(&mapper, X86Ports::new(), TscDelay::new(2_400_000_000))
//! }
//! .expect("SABI present");
//!
//! let level = sabi.get(GET_BRIGHTNESS).map(|r| r[0]);
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

mod delay;
mod error;
mod header;
mod interface;
mod lock;
mod physmap;
mod signature;
mod transaction;

pub use delay::Delay;
#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
pub use delay::TscDelay;
pub use error::{FailureCause, SabiError, TransactionFailure};
pub use header::{ControlHeader, HEADER_LEN};
pub use interface::{
    INTERFACE_LEN, InterfaceBuffer, MAIN_FUNCTION, RESULT_LEN,
    SegmentedAddress,
};
pub use lock::{TicketGuard, TicketLock};
pub use physmap::{HhdmPhysMapper, MemoryWindow, MmioWindow, PhysMapRw};
pub use signature::{BIOS_SEGMENT_BASE, BIOS_SEGMENT_LEN, SIGNATURE, find_signature};
pub use transaction::{
    COMPLETION_OK, DATA_REJECTED, Request, SMI_SETTLE_MS, TransactionState,
};

use kernel_ports::PortIo;
use log::{debug, info};

use transaction::Channel;

/// Finds and decodes the control header in a mapped BIOS segment.
///
/// # Errors
/// [`SabiError::SignatureNotFound`] or [`SabiError::HeaderOutOfWindow`]; both
/// mean the platform has no usable SABI.
pub fn locate_header<W: MemoryWindow + ?Sized>(segment: &W) -> Result<ControlHeader, SabiError> {
    let offset = find_signature(segment)?;
    info!("SABI signature found at {:#x}", BIOS_SEGMENT_BASE + offset as u64);
    let header = ControlHeader::read(segment, offset)?;
    debug!("SABI header: {header}");
    Ok(header)
}

/// A live connection to the SABI interface.
///
/// Owns the interface buffer mapping, the port capability and the delay
/// source. Shareable between threads; transactions are serialized.
pub struct Sabi<W, P, D> {
    header: ControlHeader,
    channel: TicketLock<Channel<W, P, D>>,
}

impl<W, P, D> Sabi<W, P, D>
where
    W: MemoryWindow,
    P: PortIo,
    D: Delay,
{
    /// Scans the BIOS segment, decodes the header and maps the interface
    /// buffer. The segment mapping is released before returning.
    ///
    /// # Errors
    /// Unsupported platform (see [`SabiError::is_unsupported`]) or
    /// [`SabiError::MapFailed`].
    ///
    /// # Safety
    /// `mapper` must produce valid windows for the BIOS segment and for
    /// whatever interface address the firmware advertises, and `ports` must
    /// be allowed to write the advertised SMI port.
    pub unsafe fn probe<M>(mapper: &M, ports: P, delay: D) -> Result<Self, SabiError>
    where
        M: PhysMapRw<Window = W>,
    {
        let header = {
            // SAFETY: forwarded to the caller.
            let segment = unsafe { mapper.map_rw(BIOS_SEGMENT_BASE, BIOS_SEGMENT_LEN) }.ok_or(
                SabiError::MapFailed {
                    address: BIOS_SEGMENT_BASE,
                    len: BIOS_SEGMENT_LEN,
                },
            )?;
            locate_header(&segment)?
        };

        // SAFETY: forwarded to the caller.
        unsafe { Self::with_header(mapper, header, ports, delay) }
    }

    /// Maps the interface buffer described by an already decoded header.
    ///
    /// # Errors
    /// [`SabiError::MapFailed`] if the buffer cannot be mapped or the mapping
    /// is shorter than [`INTERFACE_LEN`].
    ///
    /// # Safety
    /// Same as [`Sabi::probe`].
    pub unsafe fn with_header<M>(
        mapper: &M,
        header: ControlHeader,
        ports: P,
        delay: D,
    ) -> Result<Self, SabiError>
    where
        M: PhysMapRw<Window = W>,
    {
        let address = header.interface_address().linear();
        let map_failed = SabiError::MapFailed {
            address,
            len: INTERFACE_LEN,
        };

        // SAFETY: forwarded to the caller.
        let window = unsafe { mapper.map_rw(address, INTERFACE_LEN) }.ok_or(map_failed)?;
        let iface = InterfaceBuffer::new(window).map_err(|_| map_failed)?;
        debug!(
            "SABI interface buffer at {} ({address:#x})",
            header.interface_address()
        );

        Ok(Self {
            header,
            channel: TicketLock::new(Channel {
                header,
                iface,
                ports,
                delay,
            }),
        })
    }

    #[must_use]
    pub const fn header(&self) -> &ControlHeader {
        &self.header
    }

    /// Runs one transaction under the channel lock.
    ///
    /// # Errors
    /// [`SabiError::Transaction`] when the BIOS did not complete the request.
    pub fn execute(&self, request: Request) -> Result<[u8; RESULT_LEN], SabiError> {
        self.execute_with(request, |result| result)
    }

    /// Runs one transaction and hands a successful result to `commit` while
    /// the channel lock is still held, so state derived from the answer is
    /// updated in transaction order.
    ///
    /// # Errors
    /// See [`Sabi::execute`]. `commit` is not called on failure.
    pub fn execute_with<R>(
        &self,
        request: Request,
        commit: impl FnOnce([u8; RESULT_LEN]) -> R,
    ) -> Result<R, SabiError> {
        let channel = self.channel.lock();
        let result = channel.execute(request)?;
        Ok(commit(result))
    }

    /// Issues a read command and returns the first [`RESULT_LEN`] data bytes.
    ///
    /// # Errors
    /// See [`Sabi::execute`].
    pub fn get(&self, command: u8) -> Result<[u8; RESULT_LEN], SabiError> {
        self.execute(Request::get(command))
    }

    /// Issues a write command carrying one data byte.
    ///
    /// # Errors
    /// See [`Sabi::execute`].
    pub fn set(&self, command: u8, data: u8) -> Result<(), SabiError> {
        self.execute(Request::set(command, data)).map(|_| ())
    }
}
