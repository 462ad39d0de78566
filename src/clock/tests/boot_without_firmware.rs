//! Bring-up without a parsed firmware environment. Lives in its own binary so no
//! other test has stored parameters first.

use ls1x_clock::{Registry, boot, hw::Snapshot, time::TimerFrequency};

#[test]
#[cfg_attr(feature = "ls1a", should_panic(expected = "unable to get cpu clock"))]
fn boot_does_not_wait_for_firmware_environment() {
    // Derivable on LS1B (396 MHz PLL) and LS1C (120 MHz PLL); the LS1A needs the
    // firmware's `cpuclock`/`busclock` instead.
    let registers = Snapshot::new(12 | (0x14 << 16), (4 << 26) | (2 << 20) | (3 << 14));

    let registry = Registry::new();
    boot::init(&registry, &registers);

    let cpu = registry.lookup("cpu").unwrap();
    assert_eq!(registry.len(), 5);
    assert_eq!(TimerFrequency::ticks_per_sec(), cpu.rate() / 2);
}
