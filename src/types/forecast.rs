//! Forecast settings and results

use serde::{Deserialize, Serialize};

use crate::config::defaults;

/// Forecast horizon and stopping rule
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastSettings {
    /// Duration cap in days (> 0)
    pub days: u32,
    /// Rate below which production stops (0 disables the limit)
    pub economic_limit: f64,
    /// Sampling interval of the returned series in days
    #[serde(default = "default_step_days")]
    pub step_days: f64,
}

fn default_step_days() -> f64 {
    defaults::FORECAST_STEP_DAYS
}

impl ForecastSettings {
    /// Settings with the configured sampling step
    pub fn new(days: u32, economic_limit: f64) -> Self {
        Self {
            days,
            economic_limit,
            step_days: crate::config::get().forecast.step_days,
        }
    }

    #[must_use]
    pub fn with_step(mut self, step_days: f64) -> Self {
        self.step_days = step_days;
        self
    }
}

impl Default for ForecastSettings {
    fn default() -> Self {
        let f = &crate::config::get().forecast;
        Self {
            days: f.default_days,
            economic_limit: f.default_economic_limit,
            step_days: f.step_days,
        }
    }
}

/// One sample of a forecast
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    /// Days from the start of the forecast
    pub t: f64,
    pub rate: f64,
    /// Cumulative volume produced since t = 0
    pub cumulative: f64,
}

/// Forecast derived from one fit and one set of settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    pub series: Vec<ForecastPoint>,
    /// Estimated ultimate recovery at `time_to_limit`
    pub eur: f64,
    /// Days until the economic limit, or the duration cap
    pub time_to_limit: f64,
    /// Whether the economic limit (rather than the cap) ended the forecast
    pub limit_reached: bool,
}

impl ForecastResult {
    /// Rate at the end of the forecast
    pub fn final_rate(&self) -> Option<f64> {
        self.series.last().map(|p| p.rate)
    }
}
