//! Arps decline equations
//!
//! Closed-form rate and cumulative volume for the exponential (b = 0),
//! hyperbolic and harmonic (b = 1) members of the Arps family, plus their
//! inverses.
//!
//! | b        | rate(t)                      | cumulative(t)                                      |
//! |----------|------------------------------|----------------------------------------------------|
//! | 0        | qi·exp(−Di·t)                | (qi − q)/Di                                        |
//! | 1        | qi/(1 + Di·t)                | (qi/Di)·ln(1 + Di·t)                               |
//! | other    | qi·(1 + b·Di·t)^(−1/b)       | qi/((1−b)·Di)·[1 − (1 + b·Di·t)^(1−1/b)]           |
//!
//! Di below `DI_EPSILON` degenerates to a flat rate qi with cumulative qi·t.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::defaults::{B_EPSILON, DI_EPSILON};

/// Days per year used for annual decline conversions
pub const DAYS_PER_YEAR: f64 = 365.25;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DeclineError {
    #[error("Invalid parameter {name} = {value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },
}

impl DeclineError {
    const fn invalid(name: &'static str, value: f64, reason: &'static str) -> Self {
        Self::InvalidParameter {
            name,
            value,
            reason,
        }
    }
}

// ============================================================================
// Parameters
// ============================================================================

/// Validated Arps parameters.
///
/// Construct through [`ArpsParams::new`]; the fields are public for reading
/// but every evaluation path assumes they passed validation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArpsParams {
    /// Initial rate at t = 0
    pub qi: f64,
    /// Nominal decline rate (1/day)
    pub di: f64,
    /// Decline exponent
    pub b: f64,
}

/// Which closed form a parameter set evaluates with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Branch {
    Flat,
    Exponential,
    Harmonic,
    Hyperbolic,
}

impl ArpsParams {
    /// Validate and build a parameter set.
    ///
    /// Rejects qi <= 0, Di < 0, b < 0 and any non-finite value.
    pub fn new(qi: f64, di: f64, b: f64) -> Result<Self, DeclineError> {
        if !qi.is_finite() || qi <= 0.0 {
            return Err(DeclineError::invalid("qi", qi, "initial rate must be finite and > 0"));
        }
        if !di.is_finite() || di < 0.0 {
            return Err(DeclineError::invalid("di", di, "decline rate must be finite and >= 0"));
        }
        if !b.is_finite() || b < 0.0 {
            return Err(DeclineError::invalid("b", b, "decline exponent must be finite and >= 0"));
        }
        Ok(Self { qi, di, b })
    }

    pub fn exponential(qi: f64, di: f64) -> Result<Self, DeclineError> {
        Self::new(qi, di, 0.0)
    }

    pub fn harmonic(qi: f64, di: f64) -> Result<Self, DeclineError> {
        Self::new(qi, di, 1.0)
    }

    fn branch(&self) -> Branch {
        if self.di < DI_EPSILON {
            Branch::Flat
        } else if self.b < B_EPSILON {
            Branch::Exponential
        } else if (self.b - 1.0).abs() < B_EPSILON {
            Branch::Harmonic
        } else {
            Branch::Hyperbolic
        }
    }

    fn check_time(t: f64) -> Result<(), DeclineError> {
        if !t.is_finite() || t < 0.0 {
            return Err(DeclineError::invalid("t", t, "time must be finite and >= 0"));
        }
        Ok(())
    }

    /// Instantaneous rate at time `t` (days).
    pub fn rate(&self, t: f64) -> Result<f64, DeclineError> {
        Self::check_time(t)?;
        Ok(self.rate_unchecked(t))
    }

    /// Cumulative volume produced over `[0, t]`.
    pub fn cumulative(&self, t: f64) -> Result<f64, DeclineError> {
        Self::check_time(t)?;
        Ok(self.cumulative_unchecked(t))
    }

    /// Rate without time validation; callers guarantee `t >= 0`.
    pub(crate) fn rate_unchecked(&self, t: f64) -> f64 {
        let Self { qi, di, b } = *self;
        match self.branch() {
            Branch::Flat => qi,
            Branch::Exponential => qi * (-di * t).exp(),
            Branch::Harmonic => qi / (1.0 + di * t),
            Branch::Hyperbolic => qi * (1.0 + b * di * t).powf(-1.0 / b),
        }
    }

    pub(crate) fn cumulative_unchecked(&self, t: f64) -> f64 {
        let Self { qi, di, b } = *self;
        match self.branch() {
            Branch::Flat => qi * t,
            Branch::Exponential => (qi - self.rate_unchecked(t)) / di,
            Branch::Harmonic => (qi / di) * (di * t).ln_1p(),
            Branch::Hyperbolic => {
                qi / ((1.0 - b) * di) * (1.0 - (1.0 + b * di * t).powf(1.0 - 1.0 / b))
            }
        }
    }

    /// Time at which the rate first falls to `q`.
    ///
    /// Returns `Some(0.0)` when `q >= qi` and `None` when the rate never
    /// reaches `q` (flat model, or `q <= 0`).
    pub fn time_to_rate(&self, q: f64) -> Option<f64> {
        if q >= self.qi {
            return Some(0.0);
        }
        if q <= 0.0 || !q.is_finite() {
            return None;
        }
        let ratio = self.qi / q;
        let Self { di, b, .. } = *self;
        match self.branch() {
            Branch::Flat => None,
            Branch::Exponential => Some(ratio.ln() / di),
            Branch::Harmonic => Some((ratio - 1.0) / di),
            Branch::Hyperbolic => Some((ratio.powf(b) - 1.0) / (b * di)),
        }
    }

    /// Instantaneous nominal decline D(t) = Di / (1 + b·Di·t).
    pub fn instantaneous_decline(&self, t: f64) -> Result<f64, DeclineError> {
        Self::check_time(t)?;
        Ok(self.di / (1.0 + self.b * self.di * t))
    }
}

// ============================================================================
// Decline Rate Conversions
// ============================================================================

/// Effective annual decline (fraction per year) from a nominal daily decline,
/// for exponential decline: `De = 1 − exp(−Di·365.25)`.
pub fn effective_from_nominal(di_per_day: f64) -> f64 {
    1.0 - (-di_per_day * DAYS_PER_YEAR).exp()
}

/// Nominal daily decline from an effective annual decline in `[0, 1)`.
pub fn nominal_from_effective(de_per_year: f64) -> Result<f64, DeclineError> {
    if !de_per_year.is_finite() || !(0.0..1.0).contains(&de_per_year) {
        return Err(DeclineError::invalid(
            "de",
            de_per_year,
            "effective decline must be in [0, 1)",
        ));
    }
    Ok(-(1.0 - de_per_year).ln() / DAYS_PER_YEAR)
}

/// Secant effective annual decline for hyperbolic decline:
/// `De = 1 − (1 + b·Di·365.25)^(−1/b)`. Falls back to the exponential form for b = 0.
pub fn secant_effective_decline(params: &ArpsParams) -> f64 {
    if params.b < B_EPSILON {
        return effective_from_nominal(params.di);
    }
    1.0 - (1.0 + params.b * params.di * DAYS_PER_YEAR).powf(-1.0 / params.b)
}
