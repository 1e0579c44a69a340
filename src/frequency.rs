//! Frequency planning
//!
//! Turns a requested output frequency into the integer divider set of
//! the ADF4351: RF output divider exponent, prescaler mode, feedback
//! INT, reference R counter and the band select clock divider.
//!
//! In integer-N mode the output is
//!
//! ```text
//! f_out = INT * f_ref / R
//! ```
//!
//! with the VCO running at `2^divider_exponent * f_out`, which must sit
//! in its 2.2 GHz to 4.4 GHz operating range.

use crate::{constants::*, errors::*, register::*};

/// A validated divider configuration for one output frequency.
///
/// Only produced by [`FrequencyPlan::on_grid`] and
/// [`FrequencyPlan::closest`]; a value of this type always satisfies
/// the chip constraints.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FrequencyPlan {
    /// RF output divider exponent, 0..=6 (divide by 2^n)
    pub divider_exponent: u8,
    /// Prescaler mode, fixes the minimum INT value
    pub prescaler: Prescaler,
    /// Integer feedback division factor
    pub feedback_int: u16,
    /// Reference R counter, 1..=1023
    pub reference_divisor: u16,
    /// Band select clock divider, 1..=255
    pub band_select: u8,
}

impl FrequencyPlan {
    /// Plans `frequency` on the grid spanned by `stepsize`.
    ///
    /// The reference divided by the stepsize becomes the R counter and
    /// the frequency divided by the stepsize becomes INT, so both
    /// ratios must be exact integers within the counter widths.
    pub fn on_grid(
        frequency: u64,
        stepsize: u64,
        ref_frequency: u32,
    ) -> Result<Self, PlanError> {
        if !(OUT_FREQ_MIN..=OUT_FREQ_MAX).contains(&frequency) {
            return Err(PlanError::OutOfRange);
        }
        let divider_exponent = rf_divider_exponent(frequency)?;
        let prescaler = prescaler_for(frequency);

        let reference = u64::from(ref_frequency);
        if stepsize == 0 || reference % stepsize != 0 {
            return Err(PlanError::InvalidStepsize);
        }
        let r = reference / stepsize;
        if r == 0 || r > R_MAX {
            return Err(PlanError::InvalidStepsize);
        }
        if frequency % stepsize != 0 {
            return Err(PlanError::OffGrid);
        }
        let int = frequency / stepsize;
        if int < u64::from(prescaler.min_int()) || int > INT_MAX {
            return Err(PlanError::OutOfRange);
        }

        Ok(FrequencyPlan {
            divider_exponent,
            prescaler,
            feedback_int: int as u16,
            reference_divisor: r as u16,
            band_select: band_select_clock_div(ref_frequency, r as u16),
        })
    }

    /// Plans the closest reachable frequency without a fixed grid.
    ///
    /// Searches INT ascending from the prescaler minimum and picks the
    /// first value whose implied R counter `INT * f_ref / frequency` is
    /// nearest to an integer, which keeps INT (and with it the phase
    /// noise) as small as possible. Returns the plan together with the
    /// frequency it actually produces; the caller decides whether a
    /// snapped result is acceptable.
    pub fn closest(
        frequency: u64,
        ref_frequency: u32,
    ) -> Result<(Self, u64), PlanError> {
        if !(OUT_FREQ_MIN..=OUT_FREQ_MAX).contains(&frequency) {
            return Err(PlanError::OutOfRange);
        }
        if ref_frequency == 0 {
            return Err(PlanError::InvalidStepsize);
        }
        let divider_exponent = rf_divider_exponent(frequency)?;
        let prescaler = prescaler_for(frequency);

        let reference = u64::from(ref_frequency);
        let nmin = u64::from(prescaler.min_int());
        let nmax = (R_MAX * frequency / reference).min(INT_MAX);
        if nmax < nmin {
            return Err(PlanError::OutOfRange);
        }

        // R_real = n * f_ref / frequency; its distance to the nearest
        // integer is |n * f_ref - round(R_real) * frequency| / frequency.
        // The denominator is common to all candidates, so the numerator
        // alone orders them exactly, without floating point.
        let mut best_n = nmin;
        let mut best_r = 1u64;
        let mut best_err = u64::MAX;
        for n in nmin..=nmax {
            let num = n * reference;
            let r = ((2 * num + frequency) / (2 * frequency)).clamp(1, R_MAX);
            let err = num.abs_diff(r * frequency);
            if err < best_err {
                best_err = err;
                best_n = n;
                best_r = r;
                if err == 0 {
                    break;
                }
            }
        }

        let actual = (best_n * reference + best_r / 2) / best_r;
        let plan = FrequencyPlan {
            divider_exponent,
            prescaler,
            feedback_int: best_n as u16,
            reference_divisor: best_r as u16,
            band_select: band_select_clock_div(ref_frequency, best_r as u16),
        };
        Ok((plan, actual))
    }

    /// Merges the dynamic fields of this plan into a register set,
    /// leaving every other bit as it was.
    pub fn apply(&self, rs: RegisterSet) -> RegisterSet {
        rs.set(Int(self.feedback_int))
            .set(self.prescaler)
            .set(R(self.reference_divisor))
            .set(RfDividerSelect(self.divider_exponent))
            .set(BandSelectClockDiv(self.band_select))
    }
}

/// Smallest divider exponent that puts the VCO in its operating range
fn rf_divider_exponent(frequency: u64) -> Result<u8, PlanError> {
    let mut vco = frequency;
    let mut exp = 0u8;
    while vco < VCO_FREQ_MIN {
        if exp == RF_DIV_EXP_MAX {
            return Err(PlanError::OutOfRange);
        }
        vco *= 2;
        exp += 1;
    }
    if vco > VCO_FREQ_MAX {
        return Err(PlanError::OutOfRange);
    }
    Ok(exp)
}

/// Prescaler mode for an output frequency
fn prescaler_for(frequency: u64) -> Prescaler {
    if frequency >= PRESCALER_45_MAX {
        Prescaler::P89
    } else {
        Prescaler::P45
    }
}

/// Band select clock divider for a given reference and R counter.
///
/// The R counter output clocks the VCO band select logic. When that
/// rate exceeds the 10 kHz ceiling, the divider is raised to
/// `ceil(pfd / 10 kHz)`, saturating at the 8-bit field maximum.
pub fn band_select_clock_div(ref_frequency: u32, r: u16) -> u8 {
    let limit = u64::from(r) * u64::from(BAND_SELECT_PFD_MAX);
    let div = (u64::from(ref_frequency) + limit - 1) / limit;
    div.max(1).min(u64::from(BAND_SELECT_DIV_MAX)) as u8
}

/// Stepsize implied by the lowest-noise plan for `frequency`: the PFD
/// rate `f_ref / R` of the divider pair [`FrequencyPlan::closest`]
/// settles on, rounded to whole hertz.
pub fn optimal_stepsize(frequency: u64, ref_frequency: u32) -> Result<u64, PlanError> {
    let (plan, _) = FrequencyPlan::closest(frequency, ref_frequency)?;
    let r = u64::from(plan.reference_divisor);
    Ok((u64::from(ref_frequency) + r / 2) / r)
}
