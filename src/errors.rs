//! Error types

/// Frequency planning failure, before anything touches the bus.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PlanError {
    /// Output frequency outside the chip span, or no RF divider
    /// exponent puts the VCO in its operating range, or the INT
    /// value does not fit the prescaler/field limits
    OutOfRange,
    /// Output frequency is not an integer multiple of the stepsize
    OffGrid,
    /// Reference frequency is not an integer multiple of the stepsize,
    /// or the resulting R counter value exceeds 1023
    InvalidStepsize,
}

/// Device level error: any planning failure, or a bus write failure
/// carried through unmodified.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<B> {
    /// See [`PlanError::OutOfRange`]
    OutOfRange,
    /// See [`PlanError::OffGrid`]
    OffGrid,
    /// See [`PlanError::InvalidStepsize`]
    InvalidStepsize,
    /// Bus write failed; no further register writes are attempted
    Bus(B),
}

impl<B> From<PlanError> for Error<B> {
    fn from(e: PlanError) -> Self {
        match e {
            PlanError::OutOfRange => Error::OutOfRange,
            PlanError::OffGrid => Error::OffGrid,
            PlanError::InvalidStepsize => Error::InvalidStepsize,
        }
    }
}
