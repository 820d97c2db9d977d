//! # Simulated SABI firmware
//!
//! A host-side stand-in for the Samsung BIOS: a 64 KiB BIOS segment carrying
//! the marker and control header, an interface buffer that only accepts
//! writes while unlocked, and an SMI handler that runs when the trigger code
//! hits the SMI port. Every access is appended to an event log tagged with
//! the calling thread, so tests can check ordering and exclusivity.
//!
//! The default SMI handler models the backlight commands of the N-series
//! netbooks (see [`Panel`]); tests can swap in their own with
//! [`SimulatedBios::with_responder`].

#![allow(clippy::missing_panics_doc)]

use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, ThreadId};
use std::time::Duration;

use kernel_ports::PortIo;
use kernel_sabi::{
    BIOS_SEGMENT_BASE, BIOS_SEGMENT_LEN, COMPLETION_OK, ControlHeader, DATA_REJECTED, Delay,
    HEADER_LEN, INTERFACE_LEN, MAIN_FUNCTION, MemoryWindow, PhysMapRw, SIGNATURE,
};

/// Where the marker sits in the default segment.
pub const SIGNATURE_OFFSET: usize = 0x2F40;

/// Header advertised by default.
pub const DEFAULT_HEADER: ControlHeader = ControlHeader {
    port: 0x00B2,
    restore_code: 0x82,
    trigger_code: 0x80,
    enable_code: 0x81,
    data_offset: 0x0010,
    data_segment: 0xE000,
    bios_version: 0x02,
    launcher_string: 0x01,
};

const GET_BRIGHTNESS: u8 = 0x10;
const SET_BRIGHTNESS: u8 = 0x11;
const GET_BACKLIGHT: u8 = 0x2D;
const SET_BACKLIGHT: u8 = 0x2E;
const SET_LINUX: u8 = 0x0A;

/// What the SMI handler leaves in the buffer.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Reply {
    pub completion: u8,
    pub data: [u8; 4],
}

impl Reply {
    #[must_use]
    pub const fn ok(data0: u8) -> Self {
        Self {
            completion: COMPLETION_OK,
            data: [data0, 0, 0, 0],
        }
    }

    #[must_use]
    pub const fn rejected() -> Self {
        Self {
            completion: COMPLETION_OK,
            data: [DATA_REJECTED, 0, 0, 0],
        }
    }
}

/// Panel state behind the default SMI handler.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Panel {
    /// Hardware brightness, `1..=8`; `0` means the BIOS manages it.
    pub brightness: u8,
    pub backlight_on: bool,
    /// Last value written with the "Linux mode" command.
    pub linux_mode: Option<u8>,
}

impl Default for Panel {
    fn default() -> Self {
        Self {
            brightness: 5,
            backlight_on: true,
            linux_mode: None,
        }
    }
}

impl Panel {
    fn respond(&mut self, command: u8, payload: u8) -> Reply {
        match command {
            GET_BRIGHTNESS => Reply::ok(self.brightness),
            SET_BRIGHTNESS if payload <= 8 => {
                self.brightness = payload;
                Reply::ok(payload)
            }
            GET_BACKLIGHT => Reply::ok(u8::from(self.backlight_on)),
            SET_BACKLIGHT if payload <= 1 => {
                self.backlight_on = payload == 1;
                Reply::ok(payload)
            }
            SET_LINUX => {
                self.linux_mode = Some(payload);
                Reply::ok(payload)
            }
            _ => Reply::rejected(),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EventKind {
    PortWrite { port: u16, value: u8 },
    BufferWrite { offset: usize, value: u8 },
    BufferRead { offset: usize },
    Delay { ms: u32 },
    /// The SMI handler ran for this command.
    Serviced { command: u8 },
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Event {
    pub thread: ThreadId,
    pub kind: EventKind,
}

type Responder = Box<dyn FnMut(u8, u8) -> Reply + Send>;

struct Firmware {
    header: ControlHeader,
    segment: Vec<u8>,
    iface: [u8; INTERFACE_LEN],
    unlocked: bool,
    panel: Panel,
    responder: Option<Responder>,
    events: Vec<Event>,
    segment_reads: usize,
    protected_writes: usize,
    live_mappings: usize,
    refuse_segment: bool,
    refuse_interface: bool,
    settle: Option<Duration>,
}

impl Firmware {
    fn log(&mut self, kind: EventKind) {
        self.events.push(Event {
            thread: thread::current().id(),
            kind,
        });
    }

    fn smi(&mut self) {
        let main = u16::from_le_bytes([self.iface[0], self.iface[1]]);
        if main != MAIN_FUNCTION {
            return;
        }
        let command = self.iface[2];
        let payload = self.iface[5];
        let reply = match self.responder.as_mut() {
            Some(respond) => respond(command, payload),
            None => self.panel.respond(command, payload),
        };
        self.iface[4] = reply.completion;
        self.iface[5..9].copy_from_slice(&reply.data);
        self.log(EventKind::Serviced { command });
    }
}

/// Handle to the simulated firmware. Clones share state.
#[derive(Clone)]
pub struct SimulatedBios {
    fw: Arc<Mutex<Firmware>>,
}

impl Default for SimulatedBios {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedBios {
    /// Firmware with [`DEFAULT_HEADER`] behind the marker at
    /// [`SIGNATURE_OFFSET`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_header_at(SIGNATURE_OFFSET, DEFAULT_HEADER)
    }

    /// Places the marker at `offset` followed by `header` (as far as it fits).
    #[must_use]
    pub fn with_header_at(offset: usize, header: ControlHeader) -> Self {
        let mut segment = vec![0u8; BIOS_SEGMENT_LEN];
        segment[offset..offset + SIGNATURE.len()].copy_from_slice(&SIGNATURE);

        let [port_lo, port_hi] = header.port.to_le_bytes();
        let [off_lo, off_hi] = header.data_offset.to_le_bytes();
        let [seg_lo, seg_hi] = header.data_segment.to_le_bytes();
        let raw: [u8; HEADER_LEN] = [
            port_lo,
            port_hi,
            header.restore_code,
            header.trigger_code,
            header.enable_code,
            off_lo,
            off_hi,
            seg_lo,
            seg_hi,
            header.bios_version,
            header.launcher_string,
        ];
        let start = offset + SIGNATURE.len();
        let room = BIOS_SEGMENT_LEN.saturating_sub(start).min(HEADER_LEN);
        segment[start..start + room].copy_from_slice(&raw[..room]);

        Self::from_segment(header, segment)
    }

    /// A BIOS without the SABI marker.
    #[must_use]
    pub fn without_signature() -> Self {
        Self::from_segment(DEFAULT_HEADER, vec![0u8; BIOS_SEGMENT_LEN])
    }

    fn from_segment(header: ControlHeader, segment: Vec<u8>) -> Self {
        Self {
            fw: Arc::new(Mutex::new(Firmware {
                header,
                segment,
                iface: [0; INTERFACE_LEN],
                unlocked: false,
                panel: Panel::default(),
                responder: None,
                events: Vec::new(),
                segment_reads: 0,
                protected_writes: 0,
                live_mappings: 0,
                refuse_segment: false,
                refuse_interface: false,
                settle: None,
            })),
        }
    }

    /// Replaces the panel model with `respond(command, payload)`.
    #[must_use]
    pub fn with_responder(self, respond: impl FnMut(u8, u8) -> Reply + Send + 'static) -> Self {
        self.state().responder = Some(Box::new(respond));
        self
    }

    /// Makes mapping the BIOS segment fail.
    #[must_use]
    pub fn refusing_segment_mapping(self) -> Self {
        self.state().refuse_segment = true;
        self
    }

    /// Makes mapping the interface buffer fail.
    #[must_use]
    pub fn refusing_interface_mapping(self) -> Self {
        self.state().refuse_interface = true;
        self
    }

    /// Makes every delay also sleep for `real` wall-clock time.
    #[must_use]
    pub fn settling_for(self, real: Duration) -> Self {
        self.state().settle = Some(real);
        self
    }

    #[must_use]
    pub fn with_panel(self, panel: Panel) -> Self {
        self.state().panel = panel;
        self
    }

    #[must_use]
    pub fn mapper(&self) -> SimMapper {
        SimMapper { bios: self.clone() }
    }

    #[must_use]
    pub fn ports(&self) -> SimPorts {
        SimPorts { bios: self.clone() }
    }

    #[must_use]
    pub fn delay(&self) -> SimDelay {
        SimDelay { bios: self.clone() }
    }

    #[must_use]
    pub fn header(&self) -> ControlHeader {
        self.state().header
    }

    #[must_use]
    pub fn panel(&self) -> Panel {
        self.state().panel
    }

    #[must_use]
    pub fn events(&self) -> Vec<Event> {
        self.state().events.clone()
    }

    pub fn clear_events(&self) {
        self.state().events.clear();
    }

    /// Bytes read from the BIOS segment so far.
    #[must_use]
    pub fn segment_reads(&self) -> usize {
        self.state().segment_reads
    }

    /// Buffer writes that arrived while the buffer was write-protected.
    #[must_use]
    pub fn protected_writes(&self) -> usize {
        self.state().protected_writes
    }

    #[must_use]
    pub fn live_mappings(&self) -> usize {
        self.state().live_mappings
    }

    #[must_use]
    pub fn is_unlocked(&self) -> bool {
        self.state().unlocked
    }

    /// Raw interface buffer contents.
    #[must_use]
    pub fn interface_bytes(&self) -> [u8; INTERFACE_LEN] {
        self.state().iface
    }

    fn state(&self) -> MutexGuard<'_, Firmware> {
        self.fw.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Region {
    Segment,
    Interface,
}

/// Mapping of either the BIOS segment or the interface buffer.
pub struct SimWindow {
    bios: SimulatedBios,
    region: Region,
    len: usize,
}

impl MemoryWindow for SimWindow {
    fn len(&self) -> usize {
        self.len
    }

    fn read_u8(&self, offset: usize) -> u8 {
        let mut fw = self.bios.state();
        match self.region {
            Region::Segment => {
                fw.segment_reads += 1;
                fw.segment[offset]
            }
            Region::Interface => {
                fw.log(EventKind::BufferRead { offset });
                fw.iface[offset]
            }
        }
    }

    fn write_u8(&self, offset: usize, value: u8) {
        let mut fw = self.bios.state();
        match self.region {
            Region::Segment => fw.protected_writes += 1,
            Region::Interface => {
                fw.log(EventKind::BufferWrite { offset, value });
                if fw.unlocked {
                    fw.iface[offset] = value;
                } else {
                    fw.protected_writes += 1;
                }
            }
        }
    }
}

impl Drop for SimWindow {
    fn drop(&mut self) {
        self.bios.state().live_mappings -= 1;
    }
}

pub struct SimMapper {
    bios: SimulatedBios,
}

impl PhysMapRw for SimMapper {
    type Window = SimWindow;

    unsafe fn map_rw(&self, paddr: u64, len: usize) -> Option<SimWindow> {
        let mut fw = self.bios.state();
        let region = if paddr == BIOS_SEGMENT_BASE
            && len <= fw.segment.len()
            && !fw.refuse_segment
        {
            Region::Segment
        } else if paddr == fw.header.interface_address().linear()
            && len <= INTERFACE_LEN
            && !fw.refuse_interface
        {
            Region::Interface
        } else {
            return None;
        };
        fw.live_mappings += 1;
        drop(fw);

        Some(SimWindow {
            bios: self.bios.clone(),
            region,
            len,
        })
    }
}

/// SMI port. Other ports are logged and otherwise ignored.
pub struct SimPorts {
    bios: SimulatedBios,
}

impl PortIo for SimPorts {
    fn outb(&self, port: u16, value: u8) {
        let mut fw = self.bios.state();
        fw.log(EventKind::PortWrite { port, value });
        if port != fw.header.port {
            return;
        }
        if value == fw.header.enable_code {
            fw.unlocked = true;
        } else if value == fw.header.restore_code {
            fw.unlocked = false;
        } else if value == fw.header.trigger_code {
            fw.smi();
        }
    }

    fn inb(&self, _port: u16) -> u8 {
        0xFF
    }

    fn outl(&self, _port: u16, _value: u32) {}

    fn inl(&self, _port: u16) -> u32 {
        u32::MAX
    }
}

/// Records delays instead of waiting (unless [`SimulatedBios::settling_for`]).
pub struct SimDelay {
    bios: SimulatedBios,
}

impl Delay for SimDelay {
    fn delay_ms(&self, ms: u32) {
        let settle = {
            let mut fw = self.bios.state();
            fw.log(EventKind::Delay { ms });
            fw.settle
        };
        if let Some(real) = settle {
            thread::sleep(real);
        }
    }
}

/// Splits an event log into per-transaction runs, each starting with the
/// write-enable port write. Returns `None` if any run mixes threads.
#[must_use]
pub fn transactions(events: &[Event], header: &ControlHeader) -> Option<Vec<Vec<Event>>> {
    let mut runs: Vec<Vec<Event>> = Vec::new();
    for event in events {
        let starts = event.kind
            == EventKind::PortWrite {
                port: header.port,
                value: header.enable_code,
            };
        match runs.last_mut() {
            Some(run) if !starts => {
                if run[0].thread != event.thread {
                    return None;
                }
                run.push(*event);
            }
            _ => runs.push(vec![*event]),
        }
    }
    Some(runs)
}
