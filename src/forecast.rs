//! Forecast Generator
//!
//! Projects a fitted Arps model forward from t = 0 to the economic limit or
//! the duration cap, whichever comes first. EUR comes from the closed-form
//! cumulative function, so it does not depend on the sampling step.
//!
//! A forecast is always rebuilt from its fit and settings; nothing is
//! patched incrementally.

use thiserror::Error;
use tracing::debug;

use crate::config::defaults::MAX_FORECAST_SAMPLES;
use crate::decline::{ArpsParams, DeclineError};
use crate::types::{FitResult, ForecastPoint, ForecastResult, ForecastSettings};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ForecastError {
    #[error("Invalid forecast settings: {0}")]
    InvalidSettings(String),

    #[error(transparent)]
    Model(#[from] DeclineError),
}

/// Validate settings before any evaluation.
fn check_settings(settings: &ForecastSettings) -> Result<(), ForecastError> {
    if settings.days == 0 {
        return Err(ForecastError::InvalidSettings("days must be > 0".to_string()));
    }
    if !settings.economic_limit.is_finite() || settings.economic_limit < 0.0 {
        return Err(ForecastError::InvalidSettings(format!(
            "economic_limit must be finite and >= 0 (got {})",
            settings.economic_limit
        )));
    }
    if !settings.step_days.is_finite() || settings.step_days <= 0.0 {
        return Err(ForecastError::InvalidSettings(format!(
            "step_days must be finite and > 0 (got {})",
            settings.step_days
        )));
    }
    let samples = f64::from(settings.days) / settings.step_days + 1.0;
    if samples > MAX_FORECAST_SAMPLES as f64 {
        return Err(ForecastError::InvalidSettings(format!(
            "{} days at step_days {} needs {samples:.0} samples, limit is {MAX_FORECAST_SAMPLES}",
            settings.days, settings.step_days
        )));
    }
    Ok(())
}

/// End of the forecast and whether the economic limit caused it.
///
/// The limit time is the first t with rate(t) <= limit; 0 when the initial
/// rate is already at or below the limit.
fn end_of_forecast(params: &ArpsParams, settings: &ForecastSettings) -> (f64, bool) {
    let cap = f64::from(settings.days);
    if settings.economic_limit <= 0.0 {
        return (cap, false);
    }
    match params.time_to_rate(settings.economic_limit) {
        Some(t) if t <= cap => (t, true),
        _ => (cap, false),
    }
}

/// Generate a forecast from a fit.
pub fn forecast(
    fit: &FitResult,
    settings: &ForecastSettings,
) -> Result<ForecastResult, ForecastError> {
    check_settings(settings)?;
    let params = fit.params()?;
    Ok(forecast_params(&params, settings))
}

/// Forecast directly from validated parameters (settings already checked).
fn forecast_params(params: &ArpsParams, settings: &ForecastSettings) -> ForecastResult {
    let (time_to_limit, limit_reached) = end_of_forecast(params, settings);

    let sample = |t: f64| ForecastPoint {
        t,
        rate: params.rate_unchecked(t),
        cumulative: params.cumulative_unchecked(t),
    };

    let step = settings.step_days;
    let mut series: Vec<ForecastPoint> = (0_u32..)
        .map(|i| f64::from(i) * step)
        .take_while(|&t| t <= time_to_limit)
        .map(sample)
        .collect();

    let needs_end = series
        .last()
        .map_or(true, |last| time_to_limit - last.t > step * 1e-9);
    if needs_end {
        series.push(sample(time_to_limit));
    }

    let eur = params.cumulative_unchecked(time_to_limit);

    debug!(
        qi = params.qi,
        di = params.di,
        b = params.b,
        time_to_limit,
        limit_reached,
        eur,
        samples = series.len(),
        "Forecast generated"
    );

    ForecastResult {
        series,
        eur,
        time_to_limit,
        limit_reached,
    }
}
