use core::sync::atomic::{AtomicU8, Ordering};

use kernel_ports::PortIo;
use kernel_sabi::{Delay, MemoryWindow, PhysMapRw, Request, Sabi};
use log::{debug, info, warn};

use crate::brightness::{MAX_LEVEL, from_hardware, to_hardware};
use crate::commands::{
    GET_BACKLIGHT, GET_BRIGHTNESS, LINUX_MODE, SET_BACKLIGHT, SET_BRIGHTNESS, SET_LINUX,
};
use crate::device::{BacklightOps, BacklightProperties, Power};
use crate::dmi::{DmiIdentity, find_supported};
use crate::{BacklightError, DriverParams};

/// An attached SABI backlight.
///
/// Owns the SABI connection; dropping it releases the interface mapping.
pub struct SamsungBacklight<W, P, D> {
    sabi: Sabi<W, P, D>,
    params: DriverParams,
    /// Last level read from or written to the BIOS. Only updated while the
    /// SABI channel is held.
    level: AtomicU8,
}

impl<W, P, D> SamsungBacklight<W, P, D>
where
    W: MemoryWindow,
    P: PortIo,
    D: Delay,
{
    /// Checks the platform, connects to SABI and switches the BIOS into
    /// OS-controlled mode.
    ///
    /// # Errors
    /// [`BacklightError::Unsupported`] for unknown machines without
    /// `force`, or the [`kernel_sabi::SabiError`] from probing.
    ///
    /// # Safety
    /// See [`Sabi::probe`].
    pub unsafe fn attach<M>(
        identity: &DmiIdentity<'_>,
        params: DriverParams,
        mapper: &M,
        ports: P,
        delay: D,
    ) -> Result<Self, BacklightError>
    where
        M: PhysMapRw<Window = W>,
    {
        if params.debug && log::max_level() < params.log_level() {
            log::set_max_level(params.log_level());
        }

        match find_supported(identity) {
            Some(m) => info!("{} detected", m.ident),
            None if params.force => warn!("forcing load on unsupported platform {identity}"),
            None => {
                debug!("{identity} is not a supported platform");
                return Err(BacklightError::Unsupported);
            }
        }

        // SAFETY: forwarded to the caller.
        let sabi = unsafe { Sabi::probe(mapper, ports, delay) }.inspect_err(|err| {
            if err.is_unsupported() {
                info!("this computer does not support SABI");
            }
        })?;

        if params.debug {
            let header = sabi.header();
            info!("SABI interface version {:#04x}", header.bios_version);
            info!("SABI header: {header}");
        }

        if let Err(err) = sabi.set(SET_LINUX, LINUX_MODE) {
            warn!("could not hand panel control to the OS: {err}");
        }

        let this = Self {
            sabi,
            params,
            level: AtomicU8::new(0),
        };
        let level = this.read_level().unwrap_or(0);
        info!("backlight at level {level}/{MAX_LEVEL}");
        Ok(this)
    }

    /// Current user level as reported by the BIOS.
    ///
    /// # Errors
    /// When the BIOS did not answer the query.
    pub fn read_level(&self) -> Result<u8, BacklightError> {
        let level = self
            .sabi
            .execute_with(Request::get(GET_BRIGHTNESS), |result| {
                let level = from_hardware(result[0]);
                self.level.store(level, Ordering::Relaxed);
                level
            })?;
        Ok(level)
    }

    /// Programs user level `level` (clamped to [`MAX_LEVEL`]).
    ///
    /// # Errors
    /// When the BIOS rejected the write. The last known level is unchanged.
    pub fn set_level(&self, level: u8) -> Result<(), BacklightError> {
        let hw = to_hardware(level);
        self.sabi
            .execute_with(Request::set(SET_BRIGHTNESS, hw), |_| {
                self.level.store(from_hardware(hw), Ordering::Relaxed);
            })?;
        Ok(())
    }

    /// Last level successfully read or written.
    #[must_use]
    pub fn last_level(&self) -> u8 {
        self.level.load(Ordering::Relaxed)
    }

    /// # Errors
    /// When the BIOS did not answer the query.
    pub fn power(&self) -> Result<Power, BacklightError> {
        let result = self.sabi.get(GET_BACKLIGHT)?;
        Ok(if result[0] == 0 { Power::Off } else { Power::On })
    }

    /// # Errors
    /// When the BIOS rejected the write.
    pub fn set_power(&self, power: Power) -> Result<(), BacklightError> {
        let on = u8::from(power == Power::On);
        self.sabi.set(SET_BACKLIGHT, on)?;
        Ok(())
    }

    #[must_use]
    pub const fn params(&self) -> &DriverParams {
        &self.params
    }

    #[must_use]
    pub const fn sabi(&self) -> &Sabi<W, P, D> {
        &self.sabi
    }
}

impl<W, P, D> BacklightOps for SamsungBacklight<W, P, D>
where
    W: MemoryWindow,
    P: PortIo,
    D: Delay,
{
    fn max_brightness(&self) -> u8 {
        MAX_LEVEL
    }

    fn get_brightness(&self) -> u8 {
        self.read_level().unwrap_or_else(|_| self.last_level())
    }

    fn update_status(&self, props: &BacklightProperties) -> Result<(), BacklightError> {
        self.set_level(props.brightness)?;
        self.set_power(props.power)
    }
}
