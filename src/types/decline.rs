//! Decline model and fit result types

use serde::{Deserialize, Serialize};

use crate::decline::{ArpsParams, DeclineError};

// ============================================================================
// Model Type
// ============================================================================

/// Arps decline family member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelType {
    /// b = 0
    Exponential,
    /// b fitted within the configured bounds
    Hyperbolic,
    /// b = 1
    Harmonic,
}

impl ModelType {
    pub const ALL: [Self; 3] = [Self::Exponential, Self::Harmonic, Self::Hyperbolic];

    /// The fixed b-factor for constrained families, `None` when b is free.
    pub const fn pinned_b(self) -> Option<f64> {
        match self {
            Self::Exponential => Some(0.0),
            Self::Harmonic => Some(1.0),
            Self::Hyperbolic => None,
        }
    }

    /// Number of free parameters in a fit of this family
    pub const fn parameter_count(self) -> usize {
        match self {
            Self::Exponential | Self::Harmonic => 2,
            Self::Hyperbolic => 3,
        }
    }

    /// Ordering used to break adjusted-R² ties in auto mode (simpler first)
    pub const fn complexity(self) -> u8 {
        match self {
            Self::Exponential => 0,
            Self::Harmonic => 1,
            Self::Hyperbolic => 2,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Exponential => "exponential",
            Self::Hyperbolic => "hyperbolic",
            Self::Harmonic => "harmonic",
        }
    }
}

impl std::fmt::Display for ModelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ModelType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "exponential" | "exp" => Ok(Self::Exponential),
            "hyperbolic" | "hyp" => Ok(Self::Hyperbolic),
            "harmonic" | "har" => Ok(Self::Harmonic),
            other => Err(format!("unknown model type '{other}'")),
        }
    }
}

/// Which family (or families) to fit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitMode {
    /// Fit exactly this family
    Fixed(ModelType),
    /// Fit every family and keep the best adjusted R²
    Auto,
}

impl From<ModelType> for FitMode {
    fn from(model: ModelType) -> Self {
        Self::Fixed(model)
    }
}

impl std::str::FromStr for FitMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("auto") {
            Ok(Self::Auto)
        } else {
            s.parse::<ModelType>().map(Self::Fixed)
        }
    }
}

// ============================================================================
// Fit Result
// ============================================================================

/// Two-sided confidence interval for each fitted parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParameterConfidence {
    /// Confidence level, e.g. 0.95
    pub level: f64,
    pub qi: (f64, f64),
    pub di: (f64, f64),
    /// Only present when b was a free parameter
    pub b: Option<(f64, f64)>,
}

/// Fitted Arps parameters and goodness-of-fit statistics.
///
/// Immutable once produced by the fitter. Hand-entered or adjusted
/// parameters go through [`FitResult::manual`], which drops the statistics
/// that belonged to the fitted set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitResult {
    pub model_type: ModelType,
    /// Initial rate at t = 0
    pub qi: f64,
    /// Nominal decline rate (1/day)
    pub di: f64,
    /// Decline exponent
    pub b: f64,
    /// Coefficient of determination on the cleaned point set
    pub r_squared: f64,
    /// Root mean squared residual (rate units)
    pub rmse: f64,
    /// Levenberg-Marquardt iterations used (0 for manual entries)
    pub iterations: usize,
    /// Points the statistics were computed over
    pub points_used: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<ParameterConfidence>,
}

impl FitResult {
    /// Wrap manually entered parameters. Statistics are left at zero.
    pub fn manual(model_type: ModelType, qi: f64, di: f64, b: f64) -> Result<Self, DeclineError> {
        let b = model_type.pinned_b().unwrap_or(b);
        ArpsParams::new(qi, di, b)?;
        Ok(Self {
            model_type,
            qi,
            di,
            b,
            r_squared: 0.0,
            rmse: 0.0,
            iterations: 0,
            points_used: 0,
            confidence: None,
        })
    }

    /// Validated model parameters for evaluation
    pub fn params(&self) -> Result<ArpsParams, DeclineError> {
        ArpsParams::new(self.qi, self.di, self.b)
    }
}
