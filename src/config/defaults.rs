//! System-wide default constants.
//!
//! Centralises the numbers that seed `EngineConfig::default()` and the
//! fallbacks used when the global config has not been initialised.

// ============================================================================
// Arps Model
// ============================================================================

/// Decline rates below this are treated as zero (flat-rate model).
pub const DI_EPSILON: f64 = 1e-12;

/// b-factors within this distance of 0 or 1 use the exponential or
/// harmonic closed forms.
pub const B_EPSILON: f64 = 1e-9;

// ============================================================================
// Curve Fitter
// ============================================================================

/// Lower bound on the fitted b-factor.
pub const B_MIN: f64 = 0.0;

/// Upper bound on the fitted b-factor.
pub const B_MAX: f64 = 2.0;

/// Starting b-factor for unconstrained hyperbolic fits.
pub const INITIAL_B: f64 = 0.5;

/// Levenberg-Marquardt outer iteration cap.
pub const MAX_ITERATIONS: usize = 200;

/// Relative cost reduction below which the fit is considered converged.
pub const COST_TOLERANCE: f64 = 1e-12;

/// Parameter step (change in ln Di, or in b) below which the fit is
/// considered converged.
pub const STEP_TOLERANCE: f64 = 1e-10;

/// Cosine between the residuals and every free Jacobian column below which
/// the fit is at a stationary point.
pub const GRADIENT_TOLERANCE: f64 = 1e-10;

/// Initial Marquardt damping factor.
pub const INITIAL_DAMPING: f64 = 1e-3;

/// Minimum valid points required to fit.
pub const MIN_POINTS: usize = 3;

/// Confidence level for parameter intervals.
pub const CONFIDENCE_LEVEL: f64 = 0.95;

/// Floor on the initial decline estimate (1/day) so the solver never starts
/// on the Di = 0 boundary.
pub const MIN_INITIAL_DI: f64 = 1e-6;

// ============================================================================
// Forecast
// ============================================================================

/// Forecast sampling step (days).
pub const FORECAST_STEP_DAYS: f64 = 1.0;

/// Default forecast horizon (days). 10 950 = 30 years.
pub const FORECAST_DAYS: u32 = 10_950;

/// Default economic limit (rate units). Zero disables the limit.
pub const ECONOMIC_LIMIT: f64 = 0.0;

/// Upper bound on `days / step_days + 1`, the length of a forecast series.
pub const MAX_FORECAST_SAMPLES: usize = 1_000_000;

// ============================================================================
// Scenario Store
// ============================================================================

/// Schema version written into saved scenario files.
pub const SCENARIO_SCHEMA_VERSION: u32 = 1;
