//! Engine Configuration - solver, forecast and import tuning as TOML values
//!
//! Each struct implements `Default` with the values in `defaults`, so a
//! missing file or missing section behaves exactly like the built-in tuning.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::defaults;

/// Environment variable naming a config file
pub const CONFIG_ENV_VAR: &str = "DCA_CONFIG";

/// Config file looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = "dca_config.toml";

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for the decline engine.
///
/// Load with `EngineConfig::load()` which searches:
/// 1. `$DCA_CONFIG` env var
/// 2. `./dca_config.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Levenberg-Marquardt tuning and parameter bounds
    #[serde(default)]
    pub fitting: FittingConfig,

    /// Forecast sampling and defaults
    #[serde(default)]
    pub forecast: ForecastConfig,

    /// Production CSV import
    #[serde(default)]
    pub import: ImportConfig,
}

impl EngineConfig {
    /// Load configuration using the standard search order.
    ///
    /// A file that fails to parse or validate is logged and skipped.
    pub fn load() -> Self {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded engine config from {}", CONFIG_ENV_VAR);
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from {}, falling back", CONFIG_ENV_VAR);
                    }
                }
            } else {
                warn!(path = %path, "{} points to non-existent file, falling back", CONFIG_ENV_VAR);
            }
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!("Loaded engine config from ./{}", LOCAL_CONFIG_FILE);
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./{}, using defaults", LOCAL_CONFIG_FILE);
                }
            }
        }

        info!("No {} found, using built-in defaults", LOCAL_CONFIG_FILE);
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Parse(_, inner) => ConfigError::Parse(path.to_path_buf(), inner),
            other => other,
        })
    }

    /// Parse and validate a TOML document. Unknown keys are logged, not rejected.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        for w in super::validation::validate_unknown_keys(contents) {
            warn!("{}", w);
        }

        let config: Self =
            toml::from_str(contents).map_err(|e| ConfigError::Parse(PathBuf::new(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Save config to a file.
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = self.to_toml()?;
        std::fs::write(path, contents).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        info!(path = %path.display(), "Engine config saved");
        Ok(())
    }

    /// Validate all values for internal consistency.
    ///
    /// Rules:
    /// - every value finite
    /// - `0 <= b_min <= initial_b <= b_max`
    /// - tolerances and damping positive, iteration cap and min points > 0
    /// - confidence level strictly between 0 and 1
    /// - forecast step and horizon positive, economic limit non-negative
    /// - default horizon sampled in at most `MAX_FORECAST_SAMPLES` points
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        let f = &self.fitting;
        for (name, value) in [
            ("fitting.b_min", f.b_min),
            ("fitting.b_max", f.b_max),
            ("fitting.initial_b", f.initial_b),
            ("fitting.cost_tolerance", f.cost_tolerance),
            ("fitting.step_tolerance", f.step_tolerance),
            ("fitting.gradient_tolerance", f.gradient_tolerance),
            ("fitting.initial_damping", f.initial_damping),
            ("fitting.confidence_level", f.confidence_level),
            ("forecast.step_days", self.forecast.step_days),
            ("forecast.default_economic_limit", self.forecast.default_economic_limit),
        ] {
            if !value.is_finite() {
                errors.push(format!("{name} must be finite (got {value})"));
            }
        }

        if f.b_min < 0.0 {
            errors.push(format!("fitting.b_min ({:.3}) must be >= 0", f.b_min));
        }
        if f.b_max < f.b_min {
            errors.push(format!(
                "fitting.b_max ({:.3}) must be >= b_min ({:.3})",
                f.b_max, f.b_min
            ));
        }
        if f.initial_b < f.b_min || f.initial_b > f.b_max {
            errors.push(format!(
                "fitting.initial_b ({:.3}) must lie within [b_min, b_max] = [{:.3}, {:.3}]",
                f.initial_b, f.b_min, f.b_max
            ));
        }
        if f.max_iterations == 0 {
            errors.push("fitting.max_iterations must be > 0".to_string());
        }
        if f.cost_tolerance <= 0.0 {
            errors.push("fitting.cost_tolerance must be > 0".to_string());
        }
        if f.step_tolerance <= 0.0 {
            errors.push("fitting.step_tolerance must be > 0".to_string());
        }
        if f.gradient_tolerance < 0.0 {
            errors.push("fitting.gradient_tolerance must be >= 0".to_string());
        }
        if f.initial_damping <= 0.0 {
            errors.push("fitting.initial_damping must be > 0".to_string());
        }
        if f.min_points < defaults::MIN_POINTS {
            errors.push(format!(
                "fitting.min_points ({}) must be >= {}",
                f.min_points,
                defaults::MIN_POINTS
            ));
        }
        if f.confidence_level <= 0.0 || f.confidence_level >= 1.0 {
            errors.push(format!(
                "fitting.confidence_level ({:.3}) must be in (0, 1)",
                f.confidence_level
            ));
        }

        let fc = &self.forecast;
        if fc.step_days <= 0.0 {
            errors.push("forecast.step_days must be > 0".to_string());
        } else if f64::from(fc.default_days) / fc.step_days + 1.0
            > defaults::MAX_FORECAST_SAMPLES as f64
        {
            errors.push(format!(
                "forecast.default_days / forecast.step_days ({} / {}) exceeds {} samples",
                fc.default_days,
                fc.step_days,
                defaults::MAX_FORECAST_SAMPLES
            ));
        }
        if fc.default_days == 0 {
            errors.push("forecast.default_days must be > 0".to_string());
        }
        if fc.default_economic_limit < 0.0 {
            errors.push("forecast.default_economic_limit must be >= 0".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config I/O error ({}): {1}", .0.display())]
    Io(PathBuf, std::io::Error),

    #[error("Config parse error ({}): {1}", .0.display())]
    Parse(PathBuf, toml::de::Error),

    #[error("Config serialization error: {0}")]
    Serialize(toml::ser::Error),

    #[error("Config validation failed:\n  - {}", .0.join("\n  - "))]
    Validation(Vec<String>),
}

// ============================================================================
// Fitting
// ============================================================================

/// Levenberg-Marquardt tuning and b-factor bounds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittingConfig {
    /// Lower clamp on fitted b
    #[serde(default = "default_b_min")]
    pub b_min: f64,

    /// Upper clamp on fitted b
    #[serde(default = "default_b_max")]
    pub b_max: f64,

    /// Starting b for hyperbolic fits
    #[serde(default = "default_initial_b")]
    pub initial_b: f64,

    /// Outer iteration cap before reporting non-convergence
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// Relative cost reduction treated as converged
    #[serde(default = "default_cost_tolerance")]
    pub cost_tolerance: f64,

    /// Parameter step treated as converged
    #[serde(default = "default_step_tolerance")]
    pub step_tolerance: f64,

    /// Scaled gradient treated as converged
    #[serde(default = "default_gradient_tolerance")]
    pub gradient_tolerance: f64,

    /// Starting Marquardt damping
    #[serde(default = "default_initial_damping")]
    pub initial_damping: f64,

    /// Valid points required before fitting
    #[serde(default = "default_min_points")]
    pub min_points: usize,

    /// Level for parameter confidence intervals
    #[serde(default = "default_confidence_level")]
    pub confidence_level: f64,
}

fn default_b_min() -> f64 { defaults::B_MIN }
fn default_b_max() -> f64 { defaults::B_MAX }
fn default_initial_b() -> f64 { defaults::INITIAL_B }
fn default_max_iterations() -> usize { defaults::MAX_ITERATIONS }
fn default_cost_tolerance() -> f64 { defaults::COST_TOLERANCE }
fn default_step_tolerance() -> f64 { defaults::STEP_TOLERANCE }
fn default_gradient_tolerance() -> f64 { defaults::GRADIENT_TOLERANCE }
fn default_initial_damping() -> f64 { defaults::INITIAL_DAMPING }
fn default_min_points() -> usize { defaults::MIN_POINTS }
fn default_confidence_level() -> f64 { defaults::CONFIDENCE_LEVEL }

impl Default for FittingConfig {
    fn default() -> Self {
        Self {
            b_min: default_b_min(),
            b_max: default_b_max(),
            initial_b: default_initial_b(),
            max_iterations: default_max_iterations(),
            cost_tolerance: default_cost_tolerance(),
            step_tolerance: default_step_tolerance(),
            gradient_tolerance: default_gradient_tolerance(),
            initial_damping: default_initial_damping(),
            min_points: default_min_points(),
            confidence_level: default_confidence_level(),
        }
    }
}

// ============================================================================
// Forecast
// ============================================================================

/// Forecast sampling and the defaults used when the caller gives none
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastConfig {
    /// Series sampling interval (days)
    #[serde(default = "default_step_days")]
    pub step_days: f64,

    /// Default horizon (days)
    #[serde(default = "default_days")]
    pub default_days: u32,

    /// Default economic limit (rate units, 0 = none)
    #[serde(default)]
    pub default_economic_limit: f64,
}

fn default_step_days() -> f64 { defaults::FORECAST_STEP_DAYS }
fn default_days() -> u32 { defaults::FORECAST_DAYS }

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            step_days: default_step_days(),
            default_days: default_days(),
            default_economic_limit: defaults::ECONOMIC_LIMIT,
        }
    }
}

// ============================================================================
// Import
// ============================================================================

/// Production CSV import
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportConfig {
    /// Unit of the rate column in source files (e.g. "m3/d")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_unit: Option<String>,

    /// Unit rates are converted to before fitting (e.g. "bbl/d")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_rate_unit: Option<String>,
}
