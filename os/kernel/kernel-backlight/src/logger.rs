use core::fmt::{self, Write};

use kernel_ports::PortIo;
use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};

use crate::DriverParams;

/// QEMU's `-debugcon` port.
pub const DEBUG_PORT: u16 = 0x402;

/// `log` sink that writes each record byte-wise to an I/O port.
///
/// Meant to live in a `static` so it can be installed without allocation:
///
/// ```rust,no_run
/// use kernel_backlight::PortLogger;
/// use kernel_ports::X86Ports;
/// use log::LevelFilter;
///
/// static PORTS: X86Ports = unsafe { X86Ports::new() };
/// static LOGGER: PortLogger = PortLogger::new(&PORTS, LevelFilter::Info);
///
/// LOGGER.install().expect("logger initialization");
/// ```
pub struct PortLogger {
    ports: &'static (dyn PortIo + Sync),
    port: u16,
    max_level: LevelFilter,
}

impl PortLogger {
    #[must_use]
    pub const fn new(ports: &'static (dyn PortIo + Sync), max_level: LevelFilter) -> Self {
        Self {
            ports,
            port: DEBUG_PORT,
            max_level,
        }
    }

    /// Logger at the verbosity selected by [`DriverParams::debug`].
    #[must_use]
    pub const fn for_params(ports: &'static (dyn PortIo + Sync), params: &DriverParams) -> Self {
        Self::new(ports, params.log_level())
    }

    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Registers this logger with the `log` facade. Call once during early
    /// init.
    ///
    /// # Errors
    /// If a logger was already installed.
    pub fn install(&'static self) -> Result<(), SetLoggerError> {
        log::set_logger(self)?;
        log::set_max_level(self.max_level);
        Ok(())
    }
}

struct PortSink<'a> {
    ports: &'a dyn PortIo,
    port: u16,
}

impl Write for PortSink<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for b in s.bytes() {
            self.ports.outb(self.port, b);
        }
        Ok(())
    }
}

impl Log for PortLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.max_level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let mut sink = PortSink {
            ports: self.ports,
            port: self.port,
        };
        // Best effort; the sink itself cannot fail.
        let _ = writeln!(
            sink,
            "[{}] {}: {}",
            record.level(),
            record.target(),
            record.args()
        );
    }

    fn flush(&self) {}
}
