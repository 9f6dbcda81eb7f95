//! Decline Curve Analysis Module
//!
//! Deterministic Arps decline calculations. No I/O, no shared state.
//!
//! - `model`: closed-form rate, cumulative and inverse functions
//! - `quality`: production data cleaning and defect counting
//! - `statistics`: R², RMSE and parameter confidence intervals
//! - `fitter`: Levenberg-Marquardt curve fitting

pub mod fitter;
pub mod model;
pub mod quality;
pub mod statistics;

pub use fitter::{fit, FitOutcome, Fitter, FittingError};
pub use model::{
    effective_from_nominal, nominal_from_effective, secant_effective_decline, ArpsParams,
    DeclineError, DAYS_PER_YEAR,
};
pub use quality::clean_points;
