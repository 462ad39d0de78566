use super::{Register, RegisterView};
use core::{num::NonZero, ptr::NonNull};
use safe_mmio::{UniqueMmioPointer, fields::ReadPure};

/// The clock registers, read through their memory-mapped addresses.
pub struct MmioRegisters {
    pll_freq: UniqueMmioPointer<'static, ReadPure<u32>>,
    pll_div: UniqueMmioPointer<'static, ReadPure<u32>>,
}

// Safety: The registers are read-only and reading them has no side effects.
unsafe impl Send for MmioRegisters {}
// Safety: See above; no interior state is touched by a read.
unsafe impl Sync for MmioRegisters {}

impl MmioRegisters {
    /// Maps the clock registers through the uncached `kseg1` window.
    ///
    /// # Safety
    ///
    /// - The clock controller must be present at [`super::CLOCK_BASE`].
    /// - `kseg1` must be identity-mapped to physical memory (true on any MIPS32 core
    ///   running in kernel mode).
    pub unsafe fn kseg1() -> Self {
        // Safety: Caller is required to maintain safety invariants.
        unsafe {
            Self::with_base(
                usize::try_from(Register::PLL_FREQ.kseg1_address())
                    .ok()
                    .and_then(NonZero::new)
                    .expect("`kseg1` register address is a non-zero `usize`"),
            )
        }
    }

    /// Maps the clock registers at `base`, the virtual address of `PLL_FREQ`.
    ///
    /// # Safety
    ///
    /// `base` must be a valid, mapped virtual address for the clock register block,
    /// and must remain so for the rest of the program.
    pub unsafe fn with_base(pll_freq_address: NonZero<usize>) -> Self {
        let pll_div_address = pll_freq_address
            .checked_add(Self::offset_of(Register::PLL_DIV))
            .expect("clock register address overflowed");

        trace!("Mapping clock registers @ {pll_freq_address:#X}");

        // Safety: Caller guarantees the addresses point at the register block.
        unsafe {
            Self {
                pll_freq: UniqueMmioPointer::new(NonNull::with_exposed_provenance(
                    pll_freq_address,
                )),
                pll_div: UniqueMmioPointer::new(NonNull::with_exposed_provenance(
                    pll_div_address,
                )),
            }
        }
    }

    fn offset_of(register: Register) -> usize {
        usize::try_from(register.address() - Register::PLL_FREQ.address())
            .expect("register offset fits in `usize`")
    }
}

impl RegisterView for MmioRegisters {
    fn read(&self, register: Register) -> u32 {
        match register {
            Register::PLL_FREQ => self.pll_freq.read(),
            Register::PLL_DIV => self.pll_div.read(),
        }
    }
}
