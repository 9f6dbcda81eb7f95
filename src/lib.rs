//! DCA Engine: Arps decline curve analysis
//!
//! Fits exponential, harmonic and hyperbolic Arps models to well production
//! history and projects them forward to an economic limit.
//!
//! ## Architecture
//!
//! - **Units**: oilfield/SI conversions for imported data
//! - **Decline**: closed-form Arps model and Levenberg-Marquardt fitter
//! - **Forecast**: rate/cumulative series, EUR and time to economic limit
//! - **Scenario**: named fit + forecast sets for comparison
//! - **Analysis**: per-well, per-stream orchestration on the rayon pool
//! - **Import**: production CSV reader

pub mod analysis;
pub mod config;
pub mod decline;
pub mod forecast;
pub mod import;
pub mod scenario;
pub mod types;
pub mod units;

// Re-export configuration
pub use config::{ConfigError, EngineConfig};

// Re-export commonly used types
pub use types::{
    DataQualityReport, FitMode, FitResult, ForecastPoint, ForecastResult, ForecastSettings,
    ModelType, ParameterConfidence, ProductionPoint, Stream,
};

// Re-export decline components
pub use decline::{fit, ArpsParams, DeclineError, FitOutcome, Fitter, FittingError};

// Re-export forecast and scenario components
pub use forecast::{forecast, ForecastError};
pub use scenario::{
    ComparisonRow, InMemoryScenarioStore, Scenario, ScenarioError, ScenarioKey, ScenarioStore,
};

pub use analysis::{analyze_well, WellAnalysis};
pub use import::{import_csv, ImportError, ImportOptions, ProductionImport};
