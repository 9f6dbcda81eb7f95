//! Scenario / Comparison Store
//!
//! Named fit + forecast results per well and stream, kept for side-by-side
//! comparison. A [`Scenario`] always holds the forecast derived from its own
//! fit and settings: changing either produces a new scenario with a freshly
//! computed forecast.
//!
//! Backends implement [`ScenarioStore`]:
//! - `InMemoryScenarioStore`: `RwLock`-guarded map with JSON save/load

mod memory;

pub use memory::InMemoryScenarioStore;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::forecast::{forecast, ForecastError};
use crate::types::{FitResult, ForecastResult, ForecastSettings, ModelType, Stream};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    #[error("scenario already exists: {0}")]
    Duplicate(ScenarioKey),

    #[error("scenario not found: {0}")]
    NotFound(ScenarioKey),

    #[error("storage error: {0}")]
    Storage(String),

    #[error(transparent)]
    Forecast(#[from] ForecastError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("schema version mismatch: file has v{0}, expected v{1}")]
    SchemaMismatch(u32, u32),
}

// ============================================================================
// Scenario Key
// ============================================================================

/// Store key: one scenario per (well, stream, name)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ScenarioKey {
    pub well_id: String,
    pub stream: Stream,
    pub name: String,
}

impl ScenarioKey {
    pub fn new(well_id: impl Into<String>, stream: Stream, name: impl Into<String>) -> Self {
        Self {
            well_id: well_id.into(),
            stream,
            name: name.into(),
        }
    }
}

impl std::fmt::Display for ScenarioKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.well_id, self.stream, self.name)
    }
}

// ============================================================================
// Scenario
// ============================================================================

/// A named fit with the forecast derived from it.
///
/// Fields are read-only; use [`Scenario::with_fit`] or
/// [`Scenario::with_settings`] to get an updated copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    id: Uuid,
    well_id: String,
    name: String,
    stream: Stream,
    settings: ForecastSettings,
    fit_results: FitResult,
    forecast_results: ForecastResult,
    created_at: DateTime<Utc>,
}

impl Scenario {
    /// Build a scenario, computing its forecast from `fit` and `settings`.
    pub fn new(
        well_id: impl Into<String>,
        name: impl Into<String>,
        stream: Stream,
        fit: FitResult,
        settings: ForecastSettings,
    ) -> Result<Self, ForecastError> {
        let forecast_results = forecast(&fit, &settings)?;
        Ok(Self {
            id: Uuid::new_v4(),
            well_id: well_id.into(),
            name: name.into(),
            stream,
            settings,
            fit_results: fit,
            forecast_results,
            created_at: Utc::now(),
        })
    }

    /// Same scenario (id, name, stream) with a new fit and recomputed forecast.
    pub fn with_fit(&self, fit: FitResult) -> Result<Self, ForecastError> {
        let forecast_results = forecast(&fit, &self.settings)?;
        Ok(Self {
            fit_results: fit,
            forecast_results,
            ..self.clone()
        })
    }

    /// Same scenario with new forecast settings and recomputed forecast.
    pub fn with_settings(&self, settings: ForecastSettings) -> Result<Self, ForecastError> {
        let forecast_results = forecast(&self.fit_results, &settings)?;
        Ok(Self {
            settings,
            forecast_results,
            ..self.clone()
        })
    }

    /// Recompute the forecast from the stored fit and settings.
    ///
    /// Used after deserialisation so a loaded scenario can never carry a
    /// forecast that disagrees with its fit.
    pub fn rebuild(self) -> Result<Self, ForecastError> {
        let forecast_results = forecast(&self.fit_results, &self.settings)?;
        Ok(Self {
            forecast_results,
            ..self
        })
    }

    pub fn key(&self) -> ScenarioKey {
        ScenarioKey::new(self.well_id.clone(), self.stream, self.name.clone())
    }

    pub const fn id(&self) -> Uuid {
        self.id
    }

    pub fn well_id(&self) -> &str {
        &self.well_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub const fn stream(&self) -> Stream {
        self.stream
    }

    pub const fn settings(&self) -> &ForecastSettings {
        &self.settings
    }

    pub const fn fit_results(&self) -> &FitResult {
        &self.fit_results
    }

    pub const fn forecast_results(&self) -> &ForecastResult {
        &self.forecast_results
    }

    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

// ============================================================================
// Store Trait
// ============================================================================

/// Trait for scenario storage backends
///
/// Implementations must be thread-safe (Send + Sync). Reads hand out
/// `Arc<Scenario>` snapshots that later writes never mutate.
pub trait ScenarioStore: Send + Sync {
    /// Insert a new scenario; fails if its key is taken
    fn add_scenario(&self, scenario: Scenario) -> Result<Arc<Scenario>, ScenarioError>;

    /// Overwrite the scenario stored under the same key
    fn replace_scenario(&self, scenario: Scenario) -> Result<Arc<Scenario>, ScenarioError>;

    /// Delete and return a scenario
    fn remove_scenario(&self, key: &ScenarioKey) -> Result<Arc<Scenario>, ScenarioError>;

    fn get_scenario(&self, key: &ScenarioKey) -> Result<Option<Arc<Scenario>>, ScenarioError>;

    /// Scenarios for one well and stream, ordered by name
    fn list_scenarios(
        &self,
        well_id: &str,
        stream: Stream,
    ) -> Result<Vec<Arc<Scenario>>, ScenarioError>;

    /// Every stored scenario, ordered by key
    fn snapshot(&self) -> Result<Vec<Arc<Scenario>>, ScenarioError>;

    /// Backend name for logging
    fn backend_name(&self) -> &'static str;
}

// ============================================================================
// Comparison
// ============================================================================

/// One row of a side-by-side scenario comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub name: String,
    pub stream: Stream,
    pub model_type: ModelType,
    pub qi: f64,
    pub di: f64,
    pub b: f64,
    pub r_squared: f64,
    pub eur: f64,
    pub time_to_limit: f64,
    /// EUR relative to the first row (1.0 for the first row)
    pub eur_ratio: f64,
}

/// Flatten scenarios into comparison rows, keeping their order.
pub fn compare(scenarios: &[Arc<Scenario>]) -> Vec<ComparisonRow> {
    let reference_eur = scenarios
        .first()
        .map(|s| s.forecast_results().eur)
        .unwrap_or(0.0);

    scenarios
        .iter()
        .map(|s| {
            let fit = s.fit_results();
            let fc = s.forecast_results();
            ComparisonRow {
                name: s.name().to_string(),
                stream: s.stream(),
                model_type: fit.model_type,
                qi: fit.qi,
                di: fit.di,
                b: fit.b,
                r_squared: fit.r_squared,
                eur: fc.eur,
                time_to_limit: fc.time_to_limit,
                eur_ratio: if reference_eur > 0.0 {
                    fc.eur / reference_eur
                } else {
                    0.0
                },
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_fit() -> FitResult {
        FitResult::manual(ModelType::Exponential, 1000.0, 0.005, 0.0).unwrap()
    }

    #[test]
    fn test_new_scenario_has_derived_forecast() {
        let settings = ForecastSettings::new(365, 50.0);
        let s = Scenario::new("W-1", "base", Stream::Oil, base_fit(), settings).unwrap();
        let expected = forecast(&base_fit(), &settings).unwrap();
        assert_eq!(s.forecast_results(), &expected);
        assert_eq!(s.key(), ScenarioKey::new("W-1", Stream::Oil, "base"));
    }

    #[test]
    fn test_with_settings_recomputes_forecast() {
        let s = Scenario::new("W-1", "base", Stream::Oil, base_fit(), ForecastSettings::new(365, 0.0))
            .unwrap();
        let longer = s.with_settings(ForecastSettings::new(730, 0.0)).unwrap();
        assert_eq!(longer.id(), s.id());
        assert_eq!(longer.forecast_results().time_to_limit, 730.0);
        assert!(longer.forecast_results().eur > s.forecast_results().eur);
        // original untouched
        assert_eq!(s.forecast_results().time_to_limit, 365.0);
    }

    #[test]
    fn test_with_fit_recomputes_forecast() {
        let s = Scenario::new("W-1", "base", Stream::Gas, base_fit(), ForecastSettings::new(365, 0.0))
            .unwrap();
        let steeper = FitResult::manual(ModelType::Exponential, 1000.0, 0.02, 0.0).unwrap();
        let updated = s.with_fit(steeper).unwrap();
        assert!(updated.forecast_results().eur < s.forecast_results().eur);
        assert_eq!(updated.fit_results().di, 0.02);
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let result = Scenario::new("W-1", "bad", Stream::Oil, base_fit(), ForecastSettings::new(0, 0.0));
        assert!(result.is_err());
    }

    #[test]
    fn test_compare_rows() {
        let a = Scenario::new("W-1", "a", Stream::Oil, base_fit(), ForecastSettings::new(365, 0.0))
            .unwrap();
        let b = a.with_settings(ForecastSettings::new(730, 0.0)).unwrap();
        let rows = compare(&[Arc::new(a), Arc::new(b)]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].eur_ratio, 1.0);
        assert!(rows[1].eur_ratio > 1.0);
    }
}
