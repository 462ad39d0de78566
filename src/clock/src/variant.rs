//! Per-variant rate derivation.
//!
//! Each Loongson-1 revision lays out the clock registers differently and, on the
//! LS1A, the PLL registers can't be trusted at all. [`Variant`] is chosen once and
//! carries everything needed to derive every [`ClockKind`] on that revision.

use crate::{
    hw::{Register, RegisterView},
    params::Parameters,
};
use bit_field::BitField;
use core::{fmt, ops::Range};

/// Reference oscillator of the LS1A and LS1B.
pub const LS1B_OSC_HZ: u64 = 33_000_000;
/// Reference oscillator of the LS1C.
pub const LS1C_OSC_HZ: u64 = 24_000_000;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    #[error("`{0}` divider field is zero")]
    ZeroDivider(&'static str),

    #[error("derived rate is 0 Hz")]
    ZeroRate,

    #[error("clock has no parent to derive a rate from")]
    MissingParentRate,

    #[error("boot firmware did not provide `{0}`")]
    MissingFirmwareClock(&'static str),
}

/// Clock rates handed over by the boot firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FirmwareClocks {
    /// CPU clock, in Hz (`cpuclock`).
    pub cpu_hz: u64,
    /// Bus (DDR) clock, in Hz (`busclock`).
    pub bus_hz: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    /// Reading the PLL divider register on the LS1A returns garbage, so the CPU and
    /// DDR clocks are taken from the values the firmware measured.
    Ls1a(FirmwareClocks),
    Ls1b,
    Ls1c,
}

impl Variant {
    /// Selects the variant the crate was built for, pulling firmware-provided
    /// clocks out of `params` where the variant needs them.
    pub fn selected(params: &Parameters) -> Result<Self, Error> {
        let variant = if cfg!(feature = "ls1a") {
            Self::Ls1a(FirmwareClocks {
                cpu_hz: params
                    .cpu_clock_freq
                    .ok_or(Error::MissingFirmwareClock("cpuclock"))?,
                bus_hz: params
                    .bus_clock_freq
                    .ok_or(Error::MissingFirmwareClock("busclock"))?,
            })
        } else if cfg!(feature = "ls1c") {
            Self::Ls1c
        } else {
            Self::Ls1b
        };

        debug!("Clock variant: {variant}");

        Ok(variant)
    }

    /// Frequency of the external reference oscillator.
    pub const fn oscillator_hz(self) -> u64 {
        match self {
            Self::Ls1a(_) | Self::Ls1b => LS1B_OSC_HZ,
            Self::Ls1c => LS1C_OSC_HZ,
        }
    }

    /// Which clock the DDR clock is divided from.
    pub const fn ddr_parent(self) -> ClockKind {
        match self {
            Self::Ls1a(_) | Self::Ls1b => ClockKind::Pll,
            Self::Ls1c => ClockKind::Cpu,
        }
    }

    /// The clock `kind` is divided from on this variant, if any.
    pub const fn parent_of(self, kind: ClockKind) -> Option<ClockKind> {
        match kind {
            ClockKind::Pll => None,
            ClockKind::Cpu | ClockKind::Dc => Some(ClockKind::Pll),
            ClockKind::Ddr => Some(self.ddr_parent()),
            ClockKind::Apb => Some(ClockKind::Ddr),
        }
    }

    fn layout(self) -> &'static DividerLayout {
        match self {
            Self::Ls1a(_) | Self::Ls1b => &LS1B_LAYOUT,
            Self::Ls1c => &LS1C_LAYOUT,
        }
    }

    fn pll_rate(self, registers: &dyn RegisterView) -> u64 {
        let pll = registers.read(Register::PLL_FREQ);
        let osc = self.oscillator_hz();

        match self {
            Self::Ls1a(_) | Self::Ls1b => {
                let integer = 12 + u64::from(pll.get_bits(0..6));
                let fraction = u64::from(pll.get_bits(8..18));

                (integer * osc / 2) + (fraction * osc / 1024 / 2)
            }

            Self::Ls1c => {
                let multiplier = u64::from(pll.get_bits(8..16)) + u64::from(pll.get_bits(16..24));

                multiplier * osc / 4
            }
        }
    }

    fn cpu_rate(self, pll_hz: u64, registers: &dyn RegisterView) -> Result<u64, Error> {
        match self {
            Self::Ls1a(firmware) => Ok(firmware.cpu_hz),

            Self::Ls1b => self.layout().divide(pll_hz, registers, DividerField::Cpu),

            Self::Ls1c => {
                let flags = Ls1cPllDiv::from_bits_truncate(registers.read(Register::PLL_DIV));

                if !flags.contains(Ls1cPllDiv::CPU_SEL) {
                    // CPU runs directly off the oscillator.
                    Ok(self.oscillator_hz())
                } else if flags.contains(Ls1cPllDiv::CPU_EN) {
                    self.layout().divide(pll_hz, registers, DividerField::Cpu)
                } else {
                    Ok(pll_hz / 2)
                }
            }
        }
    }

    fn ddr_rate(self, parent_hz: u64, registers: &dyn RegisterView) -> Result<u64, Error> {
        match self {
            Self::Ls1a(firmware) => Ok(firmware.bus_hz),

            Self::Ls1b => self.layout().divide(parent_hz, registers, DividerField::Ddr),

            Self::Ls1c => {
                let divisor = match registers.read(Register::PLL_FREQ).get_bits(0..2) {
                    0 => 2,
                    1 => 4,
                    _ => 3,
                };

                Ok(parent_hz / divisor)
            }
        }
    }

    fn apb_rate(self, ddr_hz: u64) -> u64 {
        match self {
            Self::Ls1a(_) | Self::Ls1b => ddr_hz / 2,
            Self::Ls1c => ddr_hz,
        }
    }

    fn dc_rate(self, pll_hz: u64, registers: &dyn RegisterView) -> Result<u64, Error> {
        self.layout().divide(pll_hz, registers, DividerField::Dc)
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ls1a(firmware) => write!(
                f,
                "LS1A (firmware clocks: cpu {} Hz, bus {} Hz)",
                firmware.cpu_hz, firmware.bus_hz
            ),
            Self::Ls1b => f.write_str("LS1B"),
            Self::Ls1c => f.write_str("LS1C"),
        }
    }
}

bitflags! {
    /// Select and enable bits of the LS1C `PLL_DIV` register.
    #[repr(transparent)]
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Ls1cPllDiv: u32 {
        const CPU_SEL       = 1 << 0;
        const CPU_SEL_EN    = 1 << 1;
        const CAMERA_SEL    = 1 << 2;
        const CAMERA_SEL_EN = 1 << 3;
        const DC_SEL        = 1 << 4;
        const DC_SEL_EN     = 1 << 5;
        const CPU_EN        = 1 << 15;
        const CAMERA_EN     = 1 << 23;
        const DC_EN         = 1 << 31;
    }
}

#[derive(Debug, Clone, Copy)]
enum DividerField {
    Cpu,
    Ddr,
    Dc,
}

/// Bit ranges of the divider fields within `PLL_DIV`.
struct DividerLayout {
    cpu: Range<usize>,
    ddr: Range<usize>,
    dc: Range<usize>,
}

static LS1B_LAYOUT: DividerLayout = DividerLayout {
    cpu: 20..25,
    ddr: 14..19,
    dc: 26..31,
};

// The LS1C has no DDR divider; DDR is divided by a ratio in `PLL_FREQ`.
static LS1C_LAYOUT: DividerLayout = DividerLayout {
    cpu: 8..15,
    ddr: 0..0,
    dc: 24..31,
};

impl DividerLayout {
    fn divide(
        &self,
        rate: u64,
        registers: &dyn RegisterView,
        field: DividerField,
    ) -> Result<u64, Error> {
        let (bits, name) = match field {
            DividerField::Cpu => (self.cpu.clone(), "DIV_CPU"),
            DividerField::Ddr => (self.ddr.clone(), "DIV_DDR"),
            DividerField::Dc => (self.dc.clone(), "DIV_DC"),
        };

        let divisor = if bits.is_empty() {
            0
        } else {
            registers.read(Register::PLL_DIV).get_bits(bits)
        };

        match divisor {
            0 => Err(Error::ZeroDivider(name)),
            divisor => Ok(rate / u64::from(divisor)),
        }
    }
}

/// The node kinds of the clock tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClockKind {
    Pll,
    Cpu,
    Ddr,
    Apb,
    Dc,
}

impl ClockKind {
    /// Every kind, parents before children.
    pub const ALL: [Self; 5] = [Self::Pll, Self::Cpu, Self::Ddr, Self::Apb, Self::Dc];

    /// Name the clock is registered and looked up under.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Pll => "pll",
            Self::Cpu => "cpu",
            Self::Ddr => "ddr",
            Self::Apb => "apb",
            Self::Dc => "dc",
        }
    }
}

impl fmt::Display for ClockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a single clock's rate is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Derivation {
    pub kind: ClockKind,
    pub variant: Variant,
}

impl Derivation {
    pub const fn new(kind: ClockKind, variant: Variant) -> Self {
        Self { kind, variant }
    }

    /// Computes the clock's rate from its parent's rate and the live register values.
    ///
    /// The root (`pll`) ignores `parent_rate`; every other clock requires it.
    pub fn derive(
        &self,
        parent_rate: Option<u64>,
        registers: &dyn RegisterView,
    ) -> Result<u64, Error> {
        let variant = self.variant;
        let parent = || parent_rate.ok_or(Error::MissingParentRate);

        let rate = match self.kind {
            ClockKind::Pll => variant.pll_rate(registers),
            ClockKind::Cpu => variant.cpu_rate(parent()?, registers)?,
            ClockKind::Ddr => variant.ddr_rate(parent()?, registers)?,
            ClockKind::Apb => variant.apb_rate(parent()?),
            ClockKind::Dc => variant.dc_rate(parent()?, registers)?,
        };

        if rate == 0 {
            return Err(Error::ZeroRate);
        }

        Ok(rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hw::Snapshot;

    const LS1B_PLL_396MHZ: u32 = 12;

    fn ls1b_div(cpu: u32, ddr: u32, dc: u32) -> u32 {
        (dc << 26) | (cpu << 20) | (ddr << 14)
    }

    fn derive(
        kind: ClockKind,
        variant: Variant,
        parent: Option<u64>,
        regs: Snapshot,
    ) -> Result<u64, Error> {
        Derivation::new(kind, variant).derive(parent, &regs)
    }

    #[test]
    fn ls1b_pll_integer_and_fraction() {
        let regs = Snapshot::new(LS1B_PLL_396MHZ, 0);
        assert_eq!(derive(ClockKind::Pll, Variant::Ls1b, None, regs), Ok(396_000_000));

        // Half of the fractional range adds a quarter of the oscillator.
        let regs = Snapshot::new(LS1B_PLL_396MHZ | (512 << 8), 0);
        assert_eq!(
            derive(ClockKind::Pll, Variant::Ls1b, None, regs),
            Ok(396_000_000 + 8_250_000)
        );
    }

    #[test]
    fn ls1b_pll_maximum_fraction_does_not_overflow() {
        let regs = Snapshot::new(0x3F | (0x3FF << 8), 0);
        let rate = derive(ClockKind::Pll, Variant::Ls1b, None, regs).unwrap();

        assert_eq!(rate, 75 * LS1B_OSC_HZ / 2 + 0x3FF * LS1B_OSC_HZ / 2048);
    }

    #[test]
    fn ls1b_dividers() {
        let regs = Snapshot::new(LS1B_PLL_396MHZ, ls1b_div(2, 3, 4));
        let pll = Some(396_000_000);

        assert_eq!(derive(ClockKind::Cpu, Variant::Ls1b, pll, regs), Ok(198_000_000));
        assert_eq!(derive(ClockKind::Ddr, Variant::Ls1b, pll, regs), Ok(132_000_000));
        assert_eq!(derive(ClockKind::Dc, Variant::Ls1b, pll, regs), Ok(99_000_000));
        assert_eq!(
            derive(ClockKind::Apb, Variant::Ls1b, Some(132_000_000), regs),
            Ok(66_000_000)
        );
    }

    #[test]
    fn zero_dividers_are_rejected() {
        let regs = Snapshot::new(LS1B_PLL_396MHZ, ls1b_div(2, 3, 0));
        assert_eq!(
            derive(ClockKind::Dc, Variant::Ls1b, Some(396_000_000), regs),
            Err(Error::ZeroDivider("DIV_DC"))
        );

        let regs = Snapshot::new(LS1B_PLL_396MHZ, ls1b_div(0, 3, 4));
        assert_eq!(
            derive(ClockKind::Cpu, Variant::Ls1b, Some(396_000_000), regs),
            Err(Error::ZeroDivider("DIV_CPU"))
        );

        let regs = Snapshot::new(0, Ls1cPllDiv::CPU_SEL.union(Ls1cPllDiv::CPU_EN).bits());
        assert_eq!(
            derive(ClockKind::Cpu, Variant::Ls1c, Some(240_000_000), regs),
            Err(Error::ZeroDivider("DIV_CPU"))
        );
    }

    #[test]
    fn non_root_requires_parent_rate() {
        let regs = Snapshot::new(LS1B_PLL_396MHZ, ls1b_div(2, 3, 4));
        assert_eq!(
            derive(ClockKind::Apb, Variant::Ls1b, None, regs),
            Err(Error::MissingParentRate)
        );
    }

    #[test]
    fn ls1a_trusts_firmware() {
        let variant = Variant::Ls1a(FirmwareClocks {
            cpu_hz: 266_000_000,
            bus_hz: 133_000_000,
        });
        // Garbage divider register.
        let regs = Snapshot::new(LS1B_PLL_396MHZ, 0);

        assert_eq!(derive(ClockKind::Cpu, variant, Some(396_000_000), regs), Ok(266_000_000));
        assert_eq!(derive(ClockKind::Ddr, variant, Some(396_000_000), regs), Ok(133_000_000));
        assert_eq!(derive(ClockKind::Apb, variant, Some(133_000_000), regs), Ok(66_500_000));
    }

    #[test]
    fn ls1a_missing_firmware_clock_is_zero_rate() {
        let variant = Variant::Ls1a(FirmwareClocks { cpu_hz: 0, bus_hz: 0 });
        let regs = Snapshot::new(LS1B_PLL_396MHZ, 0);

        assert_eq!(
            derive(ClockKind::Cpu, variant, Some(396_000_000), regs),
            Err(Error::ZeroRate)
        );
    }

    #[test]
    fn ls1c_clocks() {
        // (0x14 + 0x14) * 24 MHz / 4 = 240 MHz, DDR ratio 1 (divide by 4).
        let pll_freq = (0x14 << 16) | (0x14 << 8) | 1;
        let pll_div = Ls1cPllDiv::CPU_SEL.union(Ls1cPllDiv::CPU_EN).bits() | (2 << 8) | (5 << 24);
        let regs = Snapshot::new(pll_freq, pll_div);

        assert_eq!(derive(ClockKind::Pll, Variant::Ls1c, None, regs), Ok(240_000_000));
        assert_eq!(derive(ClockKind::Cpu, Variant::Ls1c, Some(240_000_000), regs), Ok(120_000_000));
        assert_eq!(derive(ClockKind::Ddr, Variant::Ls1c, Some(120_000_000), regs), Ok(30_000_000));
        assert_eq!(derive(ClockKind::Apb, Variant::Ls1c, Some(30_000_000), regs), Ok(30_000_000));
        assert_eq!(derive(ClockKind::Dc, Variant::Ls1c, Some(240_000_000), regs), Ok(48_000_000));
    }

    #[test]
    fn ls1c_cpu_select_bits() {
        let pll = Some(240_000_000);

        // Not selected: runs off the oscillator.
        let regs = Snapshot::new(0, 0);
        assert_eq!(derive(ClockKind::Cpu, Variant::Ls1c, pll, regs), Ok(LS1C_OSC_HZ));

        // Selected, divider disabled: fixed divide-by-two.
        let regs = Snapshot::new(0, Ls1cPllDiv::CPU_SEL.bits());
        assert_eq!(derive(ClockKind::Cpu, Variant::Ls1c, pll, regs), Ok(120_000_000));
    }

    #[test]
    fn ls1c_ddr_ratios() {
        let cpu = Some(240_000_000);

        for (ratio, expected) in [
            (0, 120_000_000),
            (1, 60_000_000),
            (2, 80_000_000),
            (3, 80_000_000),
        ] {
            let regs = Snapshot::new(ratio, 0);
            assert_eq!(derive(ClockKind::Ddr, Variant::Ls1c, cpu, regs), Ok(expected));
        }
    }

    #[test]
    fn ddr_parent_depends_on_variant() {
        assert_eq!(Variant::Ls1b.parent_of(ClockKind::Ddr), Some(ClockKind::Pll));
        assert_eq!(Variant::Ls1c.parent_of(ClockKind::Ddr), Some(ClockKind::Cpu));
        assert_eq!(Variant::Ls1c.parent_of(ClockKind::Pll), None);
    }

    #[test]
    fn selected_variant_follows_features() {
        let params = Parameters {
            cpu_clock_freq: Some(266_000_000),
            bus_clock_freq: Some(133_000_000),
        };

        let expected = if cfg!(feature = "ls1a") {
            Variant::Ls1a(FirmwareClocks {
                cpu_hz: 266_000_000,
                bus_hz: 133_000_000,
            })
        } else if cfg!(feature = "ls1c") {
            Variant::Ls1c
        } else {
            Variant::Ls1b
        };

        assert_eq!(Variant::selected(&params), Ok(expected));
    }
}
