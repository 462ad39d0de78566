//! Boot-time clock bring-up.

use crate::{
    hw::RegisterView,
    registry::{Clock, Registry, lookup_clock},
    time::TimerFrequency,
    tree::{self, ClockTree},
    variant::{self, ClockKind, Variant},
};

/// Failures that stop system bring-up: the timer can't be calibrated without the
/// CPU clock.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum BootError {
    #[error("no usable clock variant: {0}")]
    Variant(#[from] variant::Error),

    #[error("failed to register clocks: {0}")]
    ClockInit(#[from] tree::Error),

    #[error("cpu clock is not registered")]
    MissingCpuClock,

    #[error("cpu clock runs at {0} Hz")]
    InvalidCpuRate(u64),
}

/// Registers the Loongson-1 clock tree for `variant` into `registry`.
pub fn clock_init(
    registry: &Registry,
    registers: &dyn RegisterView,
    variant: Variant,
) -> Result<(), tree::Error> {
    trace!("Initializing clocks for {variant}...");

    let clocks = ClockTree::ls1x(variant).register_all(registry, registers)?;

    for clock in &clocks {
        debug!("Clock: {clock}");
    }

    Ok(())
}

/// Looks up the CPU clock, which the system timer is calibrated from.
pub fn cpu_clock(registry: &Registry) -> Result<Clock, BootError> {
    let cpu = lookup_clock(registry, None, ClockKind::Cpu.name())
        .ok_or(BootError::MissingCpuClock)?;

    match cpu.rate() {
        0 => Err(BootError::InvalidCpuRate(0)),
        _ => Ok(cpu),
    }
}

/// Initializes the clocks and returns the clock to calibrate the system timer from.
pub fn plat_time_init(
    registry: &Registry,
    registers: &dyn RegisterView,
    variant: Variant,
) -> Result<Clock, BootError> {
    clock_init(registry, registers, variant)?;

    cpu_clock(registry)
}

/// Brings up the clocks for the variant this crate was built for and calibrates
/// the system timer.
///
/// # Panics
///
/// - Panics if the CPU clock can't be derived; bring-up can't continue without it.
/// - On the LS1A, panics if the firmware environment holding `cpuclock` and
///   `busclock` hasn't been parsed.
pub fn init(registry: &Registry, registers: &dyn RegisterView) {
    let cpu = Variant::selected(&crate::params::get())
        .map_err(BootError::from)
        .and_then(|variant| plat_time_init(registry, registers, variant))
        .unwrap_or_else(|error| panic!("unable to get cpu clock: {error}"));

    TimerFrequency::init(cpu);
}
