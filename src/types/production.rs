//! Production data types: observed points, streams, data-quality metadata

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Production Point
// ============================================================================

/// A single observed production rate.
///
/// `time_days` is measured from the start of the decline period being
/// analysed. `date` is carried through from the importer when available and
/// is not used by the fitter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProductionPoint {
    /// Elapsed time in days (>= 0)
    pub time_days: f64,
    /// Production rate in the stream's rate unit (>= 0)
    pub rate: f64,
    /// Calendar timestamp of the observation, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
}

impl ProductionPoint {
    pub const fn new(time_days: f64, rate: f64) -> Self {
        Self {
            time_days,
            rate,
            date: None,
        }
    }

    pub const fn with_date(time_days: f64, rate: f64, date: DateTime<Utc>) -> Self {
        Self {
            time_days,
            rate,
            date: Some(date),
        }
    }
}

impl From<(f64, f64)> for ProductionPoint {
    fn from((time_days, rate): (f64, f64)) -> Self {
        Self::new(time_days, rate)
    }
}

/// Build a point series from `(time_days, rate)` pairs.
pub fn points_from_pairs(pairs: &[(f64, f64)]) -> Vec<ProductionPoint> {
    pairs.iter().copied().map(ProductionPoint::from).collect()
}

// ============================================================================
// Stream
// ============================================================================

/// Produced fluid stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stream {
    Oil,
    Gas,
    Water,
}

impl Stream {
    pub const ALL: [Self; 3] = [Self::Oil, Self::Gas, Self::Water];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Oil => "oil",
            Self::Gas => "gas",
            Self::Water => "water",
        }
    }
}

impl std::fmt::Display for Stream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Stream {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "oil" | "o" => Ok(Self::Oil),
            "gas" | "g" => Ok(Self::Gas),
            "water" | "w" => Ok(Self::Water),
            other => Err(format!("unknown stream '{other}' (expected oil, gas or water)")),
        }
    }
}

// ============================================================================
// Data Quality Report
// ============================================================================

/// Counts of defects found while cleaning a point series.
///
/// Every excluded point is counted in exactly one bucket, checked in the
/// order: non-finite, negative time, zero/negative rate, duplicate time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataQualityReport {
    /// Points supplied by the caller
    pub input_count: usize,
    /// Points kept after cleaning
    pub valid_count: usize,
    /// NaN or infinite time/rate
    pub non_finite: usize,
    /// Time before zero
    pub negative_time: usize,
    /// Rate of zero or below (shut-in or bad data)
    pub zero_or_negative_rate: usize,
    /// Repeated time value (first occurrence kept)
    pub duplicate_time: usize,
    /// Input was not already sorted by time
    pub reordered: bool,
}

impl DataQualityReport {
    /// Total number of points excluded from the fit
    pub const fn excluded(&self) -> usize {
        self.non_finite + self.negative_time + self.zero_or_negative_rate + self.duplicate_time
    }

    /// True when nothing was dropped or reordered
    pub const fn is_clean(&self) -> bool {
        self.excluded() == 0 && !self.reordered
    }
}
