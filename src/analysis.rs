//! Well Analysis
//!
//! Fits and forecasts every stream of one well. Streams are independent, so
//! they run in parallel on the rayon pool; a failing stream is recorded and
//! the others still complete.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::decline::{FitOutcome, Fitter, FittingError};
use crate::forecast::{forecast, ForecastError};
use crate::scenario::Scenario;
use crate::types::{FitMode, ForecastResult, ForecastSettings, ProductionPoint, Stream};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StreamError {
    #[error(transparent)]
    Fitting(#[from] FittingError),

    #[error(transparent)]
    Forecast(#[from] ForecastError),
}

/// Successful fit and forecast for one stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamAnalysis {
    pub stream: Stream,
    #[serde(flatten)]
    pub outcome: FitOutcome,
    pub forecast: ForecastResult,
}

/// A stream that could not be analysed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamFailure {
    pub stream: Stream,
    pub reason: String,
}

/// Results for every stream of one well, in input order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WellAnalysis {
    pub well_id: String,
    pub settings: ForecastSettings,
    pub streams: Vec<StreamAnalysis>,
    pub failures: Vec<StreamFailure>,
}

impl WellAnalysis {
    pub fn stream(&self, stream: Stream) -> Option<&StreamAnalysis> {
        self.streams.iter().find(|s| s.stream == stream)
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// One scenario named `name` per successfully analysed stream.
    pub fn into_scenarios(self, name: &str) -> Result<Vec<Scenario>, ForecastError> {
        let Self {
            well_id,
            settings,
            streams,
            ..
        } = self;
        streams
            .into_iter()
            .map(|s| Scenario::new(well_id.clone(), name, s.stream, s.outcome.fit, settings))
            .collect()
    }
}

/// Analyse one stream: fit, then forecast.
pub fn analyze_stream(
    fitter: &Fitter,
    points: &[ProductionPoint],
    mode: FitMode,
    settings: &ForecastSettings,
) -> Result<(FitOutcome, ForecastResult), StreamError> {
    let outcome = fitter.fit_with_report(points, mode, None)?;
    let forecast = forecast(&outcome.fit, settings)?;
    Ok((outcome, forecast))
}

/// Analyse every stream of a well with the global fitter configuration.
pub fn analyze_well(
    well_id: &str,
    streams: &[(Stream, Vec<ProductionPoint>)],
    mode: FitMode,
    settings: &ForecastSettings,
) -> WellAnalysis {
    analyze_well_with(&Fitter::from_global(), well_id, streams, mode, settings)
}

/// Analyse every stream of a well with an explicit fitter.
pub fn analyze_well_with(
    fitter: &Fitter,
    well_id: &str,
    streams: &[(Stream, Vec<ProductionPoint>)],
    mode: FitMode,
    settings: &ForecastSettings,
) -> WellAnalysis {
    let results: Vec<(Stream, Result<(FitOutcome, ForecastResult), StreamError>)> = streams
        .par_iter()
        .map(|(stream, points)| (*stream, analyze_stream(fitter, points, mode, settings)))
        .collect();

    let mut analysis = WellAnalysis {
        well_id: well_id.to_string(),
        settings: *settings,
        streams: Vec::new(),
        failures: Vec::new(),
    };

    for (stream, result) in results {
        match result {
            Ok((outcome, forecast)) => {
                info!(
                    well = %well_id,
                    stream = %stream,
                    model = %outcome.fit.model_type,
                    eur = forecast.eur,
                    time_to_limit = forecast.time_to_limit,
                    "Stream analysed"
                );
                analysis.streams.push(StreamAnalysis {
                    stream,
                    outcome,
                    forecast,
                });
            }
            Err(e) => {
                warn!(well = %well_id, stream = %stream, error = %e, "Stream analysis failed");
                analysis.failures.push(StreamFailure {
                    stream,
                    reason: e.to_string(),
                });
            }
        }
    }

    analysis
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ModelType;

    fn exponential(qi: f64, di: f64) -> Vec<ProductionPoint> {
        (0..12)
            .map(|i| {
                let t = f64::from(i) * 30.0;
                ProductionPoint::new(t, qi * (-di * t).exp())
            })
            .collect()
    }

    #[test]
    fn test_all_streams_analysed() {
        let streams = vec![
            (Stream::Oil, exponential(1000.0, 0.004)),
            (Stream::Gas, exponential(5000.0, 0.002)),
            (Stream::Water, exponential(200.0, 0.001)),
        ];
        let result = analyze_well("W-1", &streams, FitMode::Auto, &ForecastSettings::new(365, 0.0));

        assert!(result.is_complete());
        assert_eq!(result.streams.len(), 3);
        // input order kept
        let order: Vec<Stream> = result.streams.iter().map(|s| s.stream).collect();
        assert_eq!(order, vec![Stream::Oil, Stream::Gas, Stream::Water]);
        let gas = result.stream(Stream::Gas).unwrap();
        assert!((gas.outcome.fit.qi - 5000.0).abs() / 5000.0 < 1e-3);
    }

    #[test]
    fn test_failure_is_recorded_not_fatal() {
        let streams = vec![
            (Stream::Oil, exponential(1000.0, 0.004)),
            (Stream::Water, vec![ProductionPoint::new(0.0, 10.0)]),
        ];
        let result = analyze_well(
            "W-1",
            &streams,
            FitMode::Fixed(ModelType::Exponential),
            &ForecastSettings::new(365, 0.0),
        );
        assert_eq!(result.streams.len(), 1);
        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.failures[0].stream, Stream::Water);
        assert!(result.failures[0].reason.contains("Insufficient data"));
    }

    #[test]
    fn test_into_scenarios() {
        let streams = vec![
            (Stream::Oil, exponential(1000.0, 0.004)),
            (Stream::Gas, exponential(5000.0, 0.002)),
        ];
        let settings = ForecastSettings::new(365, 50.0);
        let result = analyze_well("W-7", &streams, FitMode::Auto, &settings);
        let expected_eur = result.stream(Stream::Oil).unwrap().forecast.eur;

        let scenarios = result.into_scenarios("base").unwrap();
        assert_eq!(scenarios.len(), 2);
        assert!(scenarios.iter().all(|s| s.well_id() == "W-7" && s.name() == "base"));
        assert_eq!(scenarios[0].stream(), Stream::Oil);
        assert_eq!(scenarios[0].forecast_results().eur, expected_eur);
    }
}
