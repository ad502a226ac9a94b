//! Closed lists and fixed defaults, ported from the original's
//! `sonic/constants.py`.

/// Closed list of HWSKUs this generator knows a port map for. An HWSKU
/// outside this set is a validation error, not a silent empty config.
pub const SUPPORTED_HWSKUS: &[&str] = &[
    "Accton-AS4625-54T",
    "Accton-AS5835-54T",
    "Accton-AS5835-54X",
    "Accton-AS7326-56X",
    "Accton-AS7726-32X",
    "Accton-AS9716-32D",
];

pub const DEFAULT_LOCAL_AS_PREFIX: u64 = 4200;

pub const DEFAULT_SONIC_VERSION: &str = "4.5.0";

pub const HIGH_SPEED_PORTS: &[u32] = &[100_000, 200_000, 400_000, 800_000];
