//! Constants

/// Minimum output frequency the S5i front end can deliver
pub const OUT_FREQ_MIN: u64 = 40_000_000;

/// Maximum output frequency, VCO fundamental with no divider
pub const OUT_FREQ_MAX: u64 = 4_400_000_000;

/// Fundamental VCO mode (before dividers), min frequency
pub const VCO_FREQ_MIN: u64 = 2_200_000_000;

/// Fundamental VCO mode (before dividers), max frequency
pub const VCO_FREQ_MAX: u64 = 4_400_000_000;

/// Largest RF output divider exponent (divide-by-64)
pub const RF_DIV_EXP_MAX: u8 = 6;

/// At or above this frequency the 8/9 prescaler is required;
/// below it the 4/5 prescaler is used
pub const PRESCALER_45_MAX: u64 = 3_600_000_000;

/// Minimum INT value with the 4/5 prescaler
pub const INT_MIN_P45: u16 = 23;

/// Minimum INT value with the 8/9 prescaler
pub const INT_MIN_P89: u16 = 75;

/// The INT field is 16 bits wide
pub const INT_MAX: u64 = 65_535;

/// The R counter is 10 bits wide, division ratios 1 to 1023
pub const R_MAX: u64 = 1023;

/// Band select logic clock ceiling; the R counter output is divided
/// down until it stays below this rate
pub const BAND_SELECT_PFD_MAX: u32 = 10_000;

/// The band select clock divider is 8 bits wide
pub const BAND_SELECT_DIV_MAX: u32 = 255;

/// On-board reference oscillator of the S5i module
pub const INTERNAL_REF_FREQUENCY: u32 = 10_000_000;

/// Output frequency programmed by [`init`](crate::device::S5i::init)
pub const STARTUP_FREQUENCY: u64 = 100_000_000;

/// Stepsize a freshly created device plans with
pub const DEFAULT_STEPSIZE: u64 = 1_000_000;
