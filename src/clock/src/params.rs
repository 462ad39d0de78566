use spin::Once;

static PARAMS: Once<Parameters> = Once::new();

/// Clock-related values from the boot firmware (PMON) environment.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Parameters {
    /// CPU clock measured by the firmware, in Hz.
    pub cpu_clock_freq: Option<u64>,

    /// Bus (DDR) clock measured by the firmware, in Hz.
    pub bus_clock_freq: Option<u64>,
}

impl Parameters {
    /// Parses `key=value` pairs from the firmware environment.
    ///
    /// Unknown keys and malformed values are logged and skipped.
    pub fn from_env<'a>(env: impl IntoIterator<Item = &'a str>) -> Self {
        let mut params = Parameters::default();

        for var in env {
            match var.trim().split_once('=') {
                None if var.trim().is_empty() => {
                    // Ignore accidental extra spaces
                }

                Some(("cpuclock", value)) => params.cpu_clock_freq = parse_hz("cpuclock", value),

                Some(("busclock", value)) => params.bus_clock_freq = parse_hz("busclock", value),

                Some((key, _)) => {
                    trace!("Ignoring firmware environment variable: {key:?}");
                }

                None => {
                    warn!("Malformed firmware environment variable: {var:?}");
                }
            }
        }

        debug!("Firmware Parameters:\n{params:#?}");

        params
    }
}

fn parse_hz(key: &str, value: &str) -> Option<u64> {
    let value = value.trim();
    let parsed = match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => value.parse(),
    };

    match parsed {
        Ok(0) => {
            warn!("Firmware reported a 0 Hz `{key}`; ignoring it.");
            None
        }

        Ok(hz) => Some(hz),

        Err(error) => {
            error!("Failed to parse firmware `{key}` value {value:?}: {error:?}");
            None
        }
    }
}

/// Parses and stores the firmware environment. Only the first call has any effect.
pub fn parse<'a>(env: impl IntoIterator<Item = &'a str>) {
    PARAMS.call_once(|| Parameters::from_env(env));
}

/// The stored firmware parameters, or empty ones if [`parse`] hasn't been called.
pub fn get() -> Parameters {
    PARAMS.get().copied().unwrap_or_else(|| {
        debug!("Firmware environment was never parsed; using empty parameters.");

        Parameters::default()
    })
}
