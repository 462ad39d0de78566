//! Calibration of the MIPS count/compare timer.

use crate::registry::Clock;
use core::time::Duration;

/// The count register advances once every other CPU cycle.
pub const fn timer_hz(cpu_hz: u64) -> u64 {
    cpu_hz / 2
}

crate::singleton! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub TimerFrequency {
        ticks_per_sec: u64,
        ticks_per_ms: u64,
        ticks_per_us: u64,
    }

    /// Calibrates the timer from the CPU clock.
    fn init(cpu_clock: Clock) {
        let ticks_per_sec = timer_hz(cpu_clock.rate());

        info!("Timer frequency: {ticks_per_sec} Hz (from {cpu_clock})");

        Self {
            ticks_per_sec,
            ticks_per_ms: ticks_per_sec / 1000,
            ticks_per_us: ticks_per_sec / 1000 / 1000,
        }
    }
}

impl TimerFrequency {
    pub fn ticks_per_sec() -> u64 {
        Self::get_static().ticks_per_sec
    }

    pub fn ticks_per_ms() -> u64 {
        Self::get_static().ticks_per_ms
    }

    pub fn ticks_per_us() -> u64 {
        Self::get_static().ticks_per_us
    }

    /// Number of timer ticks in `duration`.
    ///
    /// # Remarks
    ///
    /// - [`Duration`]s greater than [`u64::MAX`] microseconds will be truncated.
    pub fn ticks_in(duration: Duration) -> u64 {
        let duration_us = u64::try_from(duration.as_micros()).unwrap_or(u64::MAX);

        duration_us.saturating_mul(Self::ticks_per_us())
    }
}
