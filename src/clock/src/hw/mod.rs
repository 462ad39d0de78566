//! Clock configuration registers of the Loongson-1 clock controller.

mod mmio;

pub use mmio::MmioRegisters;

use num_enum::IntoPrimitive;

/// Physical base address of the clock controller register block.
pub const CLOCK_BASE: u32 = 0x1FE7_8030;

/// Offset of the MIPS `kseg1` (unmapped, uncached) segment.
pub const KSEG1_OFFSET: u32 = 0xA000_0000;

#[repr(u32)]
#[derive(Debug, IntoPrimitive, Clone, Copy, PartialEq, Eq)]
#[allow(non_camel_case_types)]
#[rustfmt::skip]
pub enum Register {
    PLL_FREQ    = CLOCK_BASE,
    PLL_DIV     = CLOCK_BASE + 0x4,
}

impl Register {
    /// Physical address of the register.
    #[inline]
    pub fn address(self) -> u32 {
        u32::from(self)
    }

    /// Address of the register within the uncached `kseg1` window.
    #[inline]
    pub fn kseg1_address(self) -> u32 {
        self.address() | KSEG1_OFFSET
    }
}

/// Read access to the clock registers.
///
/// Reads are infallible and side-effect free.
pub trait RegisterView {
    fn read(&self, register: Register) -> u32;
}

impl<T: RegisterView + ?Sized> RegisterView for &T {
    #[inline]
    fn read(&self, register: Register) -> u32 {
        (**self).read(register)
    }
}

/// Register values captured at a single point in time.
///
/// Used where the clock controller isn't mapped, e.g. when the values were handed
/// over by the boot firmware or when running hosted.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    pub pll_freq: u32,
    pub pll_div: u32,
}

impl Snapshot {
    pub const fn new(pll_freq: u32, pll_div: u32) -> Self {
        Self { pll_freq, pll_div }
    }

    /// Captures the current contents of every clock register from `registers`.
    pub fn capture(registers: &impl RegisterView) -> Self {
        Self {
            pll_freq: registers.read(Register::PLL_FREQ),
            pll_div: registers.read(Register::PLL_DIV),
        }
    }
}

impl RegisterView for Snapshot {
    fn read(&self, register: Register) -> u32 {
        match register {
            Register::PLL_FREQ => self.pll_freq,
            Register::PLL_DIV => self.pll_div,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_addresses() {
        assert_eq!(Register::PLL_FREQ.address(), 0x1FE7_8030);
        assert_eq!(Register::PLL_DIV.address(), 0x1FE7_8034);
        assert_eq!(Register::PLL_DIV.kseg1_address(), 0xBFE7_8034);
    }

    #[test]
    fn snapshot_capture_reads_through_references() {
        let source = Snapshot::new(0x0C, 0x1020_8000);
        let captured = Snapshot::capture(&&source);

        assert_eq!(captured, source);
        assert_eq!(captured.read(Register::PLL_DIV), 0x1020_8000);
    }

    #[test]
    fn default_snapshot_reads_zero() {
        let snapshot = Snapshot::default();

        assert_eq!(snapshot, Snapshot::new(0, 0));
        assert_eq!(snapshot.read(Register::PLL_FREQ), 0);
    }
}
