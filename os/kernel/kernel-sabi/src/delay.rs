//! Blocking delays.

/// Blocks the calling thread for at least the requested time.
pub trait Delay {
    fn delay_ms(&self, ms: u32);
}

impl<T: Delay + ?Sized> Delay for &T {
    #[inline]
    fn delay_ms(&self, ms: u32) {
        (**self).delay_ms(ms);
    }
}

/// Busy-waits on the time stamp counter.
///
/// The TSC frequency comes from the caller (CPUID leaf 15H/16H or a PIT
/// calibration done during boot). Assumes an invariant TSC.
#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
#[derive(Debug, Clone, Copy)]
pub struct TscDelay {
    ticks_per_ms: u64,
}

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
impl TscDelay {
    #[must_use]
    pub const fn new(tsc_hz: u64) -> Self {
        Self {
            ticks_per_ms: tsc_hz / 1_000,
        }
    }
}

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
impl Delay for TscDelay {
    fn delay_ms(&self, ms: u32) {
        let wait = self.ticks_per_ms.saturating_mul(u64::from(ms));
        let start = rdtsc();
        while rdtsc().wrapping_sub(start) < wait {
            core::hint::spin_loop();
        }
    }
}

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
#[inline(always)]
#[allow(clippy::inline_always)]
fn rdtsc() -> u64 {
    let lo: u32;
    let hi: u32;
    unsafe {
        core::arch::asm!(
            "lfence", // serialize (Intel-recommended)
            "rdtsc",
            out("eax") lo,
            out("edx") hi,
            options(nomem, nostack, preserves_flags),
        );
    }
    (u64::from(hi) << 32) | u64::from(lo)
}
