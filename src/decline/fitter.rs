//! Arps Curve Fitter
//!
//! Nonlinear least-squares fit of observed `(t, rate)` points to an Arps
//! model. The rate is linear in qi, so qi is solved in closed form for each
//! (Di, b) and Levenberg-Marquardt runs on the remaining parameters only
//! (separable least squares). Di is searched in log space and b is projected
//! back onto `[b_min, b_max]` after every step.
//!
//! Exponential and harmonic fits pin b to 0 and 1, leaving a one-dimensional
//! search over Di. `FitMode::Auto` fits all three families and keeps the best
//! adjusted R².

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use super::model::{ArpsParams, DeclineError};
use super::quality::{clean_points, rates_identical};
use super::statistics;
use crate::config::defaults::{DI_EPSILON, MIN_INITIAL_DI};
use crate::config::FittingConfig;
use crate::types::{
    DataQualityReport, FitMode, FitResult, ModelType, ParameterConfidence, ProductionPoint,
};

/// Damping bounds for the Marquardt parameter
const MIN_DAMPING: f64 = 1e-15;
const MAX_DAMPING: f64 = 1e16;

/// Search range for Di (1/day)
const MIN_FIT_DI: f64 = 1e-10;
const MAX_FIT_DI: f64 = 1e3;

/// Below this b the Jacobian uses the exponential limit of ∂f/∂b
const SMALL_B: f64 = 1e-6;

/// Adjusted R² differences below this are ties in auto mode
const R_SQUARED_TIE: f64 = 1e-9;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FittingError {
    #[error("Insufficient data: need {required} valid points, have {valid}")]
    InsufficientData { valid: usize, required: usize },

    #[error("Fit did not converge after {iterations} iterations (residual sum of squares {cost:.6e})")]
    NonConvergent { iterations: usize, cost: f64 },

    #[error("Degenerate input: {0}")]
    DegenerateInput(String),

    #[error(transparent)]
    InvalidParameter(#[from] DeclineError),
}

/// A fit together with the cleaning report for its input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitOutcome {
    pub fit: FitResult,
    pub quality: DataQualityReport,
}

// ============================================================================
// Fitter
// ============================================================================

/// Levenberg-Marquardt Arps fitter with explicit tuning.
#[derive(Debug, Clone, Default)]
pub struct Fitter {
    config: FittingConfig,
}

impl Fitter {
    pub const fn new(config: FittingConfig) -> Self {
        Self { config }
    }

    /// Fitter using the global engine config (defaults when uninitialised)
    pub fn from_global() -> Self {
        Self::new(crate::config::get().fitting.clone())
    }

    pub const fn config(&self) -> &FittingConfig {
        &self.config
    }

    /// Fit `points` and discard the data-quality report.
    pub fn fit(
        &self,
        points: &[ProductionPoint],
        mode: impl Into<FitMode>,
        initial_guess: Option<ArpsParams>,
    ) -> Result<FitResult, FittingError> {
        self.fit_with_report(points, mode, initial_guess)
            .map(|outcome| outcome.fit)
    }

    /// Clean `points`, fit the requested family (or all of them), and return
    /// the fit alongside the cleaning report.
    pub fn fit_with_report(
        &self,
        points: &[ProductionPoint],
        mode: impl Into<FitMode>,
        initial_guess: Option<ArpsParams>,
    ) -> Result<FitOutcome, FittingError> {
        let (clean, quality) = clean_points(points);

        if clean.len() < self.config.min_points {
            return Err(FittingError::InsufficientData {
                valid: clean.len(),
                required: self.config.min_points,
            });
        }
        if rates_identical(&clean) {
            return Err(FittingError::DegenerateInput(format!(
                "all {} rates are identical, decline is undefined",
                clean.len()
            )));
        }

        let fit = match mode.into() {
            FitMode::Fixed(model) => self.fit_model(&clean, model, initial_guess)?,
            FitMode::Auto => self.fit_best(&clean, initial_guess)?,
        };

        info!(
            model = %fit.model_type,
            qi = fit.qi,
            di = fit.di,
            b = fit.b,
            r_squared = fit.r_squared,
            rmse = fit.rmse,
            iterations = fit.iterations,
            points = fit.points_used,
            "Decline fit complete"
        );

        Ok(FitOutcome { fit, quality })
    }

    /// Fit every family; best adjusted R² wins, ties go to the simpler model.
    fn fit_best(
        &self,
        points: &[ProductionPoint],
        initial_guess: Option<ArpsParams>,
    ) -> Result<FitResult, FittingError> {
        let mut best: Option<(f64, FitResult)> = None;
        let mut last_error = None;

        for model in ModelType::ALL {
            match self.fit_model(points, model, initial_guess) {
                Ok(fit) => {
                    let score = statistics::adjusted_r_squared(
                        fit.r_squared,
                        fit.points_used,
                        model.parameter_count(),
                    );
                    debug!(
                        model = %model,
                        r_squared = fit.r_squared,
                        adjusted = score,
                        "Auto-fit candidate"
                    );
                    let better = best.as_ref().map_or(true, |(current_score, current)| {
                        let gain = score - current_score;
                        gain > R_SQUARED_TIE
                            || (gain.abs() <= R_SQUARED_TIE
                                && model.complexity() < current.model_type.complexity())
                    });
                    if better {
                        best = Some((score, fit));
                    }
                }
                Err(e) => {
                    debug!(model = %model, error = %e, "Auto-fit candidate failed");
                    last_error = Some(e);
                }
            }
        }

        best.map(|(_, fit)| fit).ok_or_else(|| {
            last_error.unwrap_or(FittingError::NonConvergent {
                iterations: 0,
                cost: f64::NAN,
            })
        })
    }

    /// Fit one family to already-cleaned points.
    fn fit_model(
        &self,
        points: &[ProductionPoint],
        model: ModelType,
        initial_guess: Option<ArpsParams>,
    ) -> Result<FitResult, FittingError> {
        let problem = Problem::new(points, model, &self.config);
        let start = match initial_guess {
            Some(guess) => problem.eta_from(&guess),
            None => problem.initial_eta(self.config.initial_b),
        };

        let solution = problem.solve(start, &self.config)?;
        let params = solution.params;

        let predicted: Vec<f64> = problem.t.iter().map(|&t| params.rate_unchecked(t)).collect();
        let observed = problem.y.as_slice();

        let confidence = problem
            .confidence(&params, solution.cost, self.config.confidence_level)
            .map(|intervals| ParameterConfidence {
                level: self.config.confidence_level,
                qi: intervals[0],
                di: intervals[1],
                b: intervals.get(2).copied(),
            });

        Ok(FitResult {
            model_type: model,
            qi: params.qi,
            di: params.di,
            b: params.b,
            r_squared: statistics::r_squared(observed, &predicted),
            rmse: statistics::rmse(observed, &predicted),
            iterations: solution.iterations,
            points_used: points.len(),
            confidence,
        })
    }
}

/// Fit with the global engine config.
///
/// `mode` accepts a [`ModelType`] for a fixed family or [`FitMode::Auto`].
pub fn fit(
    points: &[ProductionPoint],
    mode: impl Into<FitMode>,
    initial_guess: Option<ArpsParams>,
) -> Result<FitResult, FittingError> {
    Fitter::from_global().fit(points, mode, initial_guess)
}

// ============================================================================
// Least-Squares Problem
// ============================================================================

struct Solution {
    params: ArpsParams,
    cost: f64,
    iterations: usize,
}

/// Least-squares state at one point of the reduced parameter space.
struct Profile {
    /// Optimal qi for the current (Di, b)
    qi: f64,
    /// Unit-rate curve, rate(t) / qi
    shape: DVector<f64>,
    shape_norm: f64,
    residuals: DVector<f64>,
    cost: f64,
}

/// Observations plus the parameterisation for one model family.
///
/// The rate is linear in qi, so qi is eliminated in closed form for every
/// (Di, b) and the solver works on η = [ln Di] when b is pinned,
/// [ln Di, b] otherwise. Working in ln Di keeps Di positive and turns Di
/// steps into relative changes.
struct Problem {
    t: Vec<f64>,
    y: DVector<f64>,
    pinned_b: Option<f64>,
    lower: [f64; 2],
    upper: [f64; 2],
}

impl Problem {
    fn new(points: &[ProductionPoint], model: ModelType, config: &FittingConfig) -> Self {
        let t: Vec<f64> = points.iter().map(|p| p.time_days).collect();
        let y = DVector::from_iterator(points.len(), points.iter().map(|p| p.rate));
        Self {
            t,
            y,
            pinned_b: model.pinned_b(),
            lower: [MIN_FIT_DI.ln(), config.b_min],
            upper: [MAX_FIT_DI.ln(), config.b_max],
        }
    }

    const fn dims(&self) -> usize {
        if self.pinned_b.is_some() {
            1
        } else {
            2
        }
    }

    /// Initial guess: Di from the log-slope between first and last point.
    fn initial_eta(&self, initial_b: f64) -> DVector<f64> {
        let n = self.t.len();
        let (t0, q0) = (self.t[0], self.y[0]);
        let (tn, qn) = (self.t[n - 1], self.y[n - 1]);

        let di = if tn > t0 && qn < q0 {
            (q0 / qn).ln() / (tn - t0)
        } else {
            MIN_INITIAL_DI
        }
        .max(MIN_INITIAL_DI);

        self.project(self.eta_raw(di, initial_b))
    }

    /// qi of a caller's guess is implied by its (Di, b).
    fn eta_from(&self, guess: &ArpsParams) -> DVector<f64> {
        self.project(self.eta_raw(guess.di.max(MIN_FIT_DI), guess.b))
    }

    fn eta_raw(&self, di: f64, b: f64) -> DVector<f64> {
        if self.pinned_b.is_some() {
            DVector::from_vec(vec![di.ln()])
        } else {
            DVector::from_vec(vec![di.ln(), b])
        }
    }

    fn project(&self, mut eta: DVector<f64>) -> DVector<f64> {
        for i in 0..self.dims() {
            eta[i] = eta[i].clamp(self.lower[i], self.upper[i]);
        }
        eta
    }

    /// Unit-rate model for η
    fn unit_params(&self, eta: &DVector<f64>) -> ArpsParams {
        ArpsParams {
            qi: 1.0,
            di: eta[0].exp(),
            b: self.pinned_b.unwrap_or_else(|| eta[1]),
        }
    }

    /// Solve for qi and evaluate the residuals; `None` when the curve
    /// underflows or the cost is not finite.
    fn profile(&self, eta: &DVector<f64>) -> Option<Profile> {
        let unit = self.unit_params(eta);
        let shape =
            DVector::from_iterator(self.t.len(), self.t.iter().map(|&t| unit.rate_unchecked(t)));
        let shape_norm = shape.norm_squared();
        if !shape_norm.is_finite() || shape_norm <= 0.0 {
            return None;
        }

        let qi = shape.dot(&self.y) / shape_norm;
        if !qi.is_finite() || qi <= 0.0 {
            return None;
        }

        let residuals = &self.y - &shape * qi;
        let cost = residuals.norm_squared();
        cost.is_finite().then_some(Profile {
            qi,
            shape,
            shape_norm,
            residuals,
            cost,
        })
    }

    /// ∂(qi·shape)/∂η including the dependence of the optimal qi on η.
    fn jacobian(&self, eta: &DVector<f64>, profile: &Profile) -> DMatrix<f64> {
        let unit = self.unit_params(eta);
        let k = self.dims();
        let mut jac = DMatrix::zeros(self.t.len(), k);

        for j in 0..k {
            let d_shape = DVector::from_iterator(
                self.t.len(),
                self.t.iter().map(|&t| {
                    let (_, d_di, d_b) = rate_gradient(&unit, t);
                    if j == 0 {
                        unit.di * d_di
                    } else {
                        d_b
                    }
                }),
            );
            let d_qi = (d_shape.dot(&self.y) - 2.0 * profile.qi * d_shape.dot(&profile.shape))
                / profile.shape_norm;
            jac.set_column(j, &(d_shape * profile.qi + &profile.shape * d_qi));
        }
        jac
    }

    /// Parameters not sitting on a bound that the descent direction pushes into.
    fn free_parameters(&self, eta: &DVector<f64>, gradient: &DVector<f64>) -> Vec<usize> {
        (0..self.dims())
            .filter(|&i| {
                let held_low = eta[i] <= self.lower[i] && gradient[i] < 0.0;
                let held_high = eta[i] >= self.upper[i] && gradient[i] > 0.0;
                !(held_low || held_high)
            })
            .collect()
    }

    /// Largest cosine between the residual vector and a free Jacobian column.
    fn scaled_gradient(
        free: &[usize],
        jtj: &DMatrix<f64>,
        gradient: &DVector<f64>,
        cost: f64,
    ) -> f64 {
        let residual_norm = cost.sqrt();
        free.iter()
            .map(|&i| {
                let column_norm = jtj[(i, i)].sqrt();
                if column_norm > 0.0 {
                    gradient[i].abs() / (column_norm * residual_norm)
                } else {
                    0.0
                }
            })
            .fold(0.0_f64, f64::max)
    }

    fn solve(&self, start: DVector<f64>, config: &FittingConfig) -> Result<Solution, FittingError> {
        let k = self.dims();
        let zero_cost = f64::EPSILON.powi(2) * self.y.norm_squared().max(f64::MIN_POSITIVE);

        let mut eta = start;
        let Some(mut state) = self.profile(&eta) else {
            return Err(FittingError::NonConvergent {
                iterations: 0,
                cost: f64::NAN,
            });
        };
        let mut lambda = config.initial_damping;

        let finish = |eta: &DVector<f64>, state: &Profile, iterations: usize| Solution {
            params: ArpsParams {
                qi: state.qi,
                ..self.unit_params(eta)
            },
            cost: state.cost,
            iterations,
        };

        if state.cost <= zero_cost {
            return Ok(finish(&eta, &state, 0));
        }

        for iteration in 1..=config.max_iterations {
            let jac = self.jacobian(&eta, &state);
            let jac_t = jac.transpose();
            let jtj = &jac_t * &jac;
            let gradient = &jac_t * &state.residuals;

            let free = self.free_parameters(&eta, &gradient);
            let cosine = Self::scaled_gradient(&free, &jtj, &gradient, state.cost);
            if cosine <= config.gradient_tolerance {
                debug!(iteration, cost = state.cost, cosine, "LM gradient test satisfied");
                return Ok(finish(&eta, &state, iteration - 1));
            }

            // Parameters held at a bound stay put; the step is solved over the rest.
            let m = free.len();
            let jtj_free = DMatrix::from_fn(m, m, |r, c| jtj[(free[r], free[c])]);
            let gradient_free = DVector::from_fn(m, |r, _| gradient[free[r]]);
            let max_diag = (0..m).map(|i| jtj_free[(i, i)]).fold(0.0_f64, f64::max);
            let diag_floor = (max_diag * 1e-12).max(f64::MIN_POSITIVE);

            let mut accepted = false;
            while lambda <= MAX_DAMPING {
                let mut damped = jtj_free.clone();
                for i in 0..m {
                    damped[(i, i)] += lambda * jtj_free[(i, i)].max(diag_floor);
                }

                let Some(step_free) = damped.lu().solve(&gradient_free) else {
                    lambda *= 10.0;
                    continue;
                };
                let mut delta = DVector::zeros(k);
                for (r, &i) in free.iter().enumerate() {
                    delta[i] = step_free[r];
                }

                let candidate = self.project(&eta + &delta);
                match self.profile(&candidate) {
                    Some(next) if next.cost < state.cost => {
                        let step = (&candidate - &eta).amax();
                        let relative_reduction = (state.cost - next.cost) / state.cost;

                        eta = candidate;
                        state = next;
                        lambda = (lambda / 10.0).max(MIN_DAMPING);
                        accepted = true;

                        debug!(
                            iteration,
                            cost = state.cost,
                            lambda,
                            step,
                            relative_reduction,
                            "LM step accepted"
                        );

                        if relative_reduction <= config.cost_tolerance
                            || step <= config.step_tolerance
                            || state.cost <= zero_cost
                        {
                            return Ok(finish(&eta, &state, iteration));
                        }
                        break;
                    }
                    _ => lambda *= 10.0,
                }
            }

            if !accepted {
                // No damping level reduces the cost: stationary point within bounds.
                debug!(iteration, cost = state.cost, "LM damping saturated, treating as converged");
                return Ok(finish(&eta, &state, iteration));
            }
        }

        Err(FittingError::NonConvergent {
            iterations: config.max_iterations,
            cost: state.cost,
        })
    }

    /// Intervals for (qi, Di[, b]) from the Jacobian of the full model.
    fn confidence(&self, params: &ArpsParams, cost: f64, level: f64) -> Option<Vec<(f64, f64)>> {
        let k = self.dims() + 1;
        let mut jac = DMatrix::zeros(self.t.len(), k);
        for (i, &t) in self.t.iter().enumerate() {
            let (d_qi, d_di, d_b) = rate_gradient(params, t);
            jac[(i, 0)] = d_qi;
            jac[(i, 1)] = d_di;
            if k == 3 {
                jac[(i, 2)] = d_b;
            }
        }
        let jtj = jac.transpose() * &jac;
        let estimates = [params.qi, params.di, params.b];
        statistics::parameter_intervals(&estimates[..k], &jtj, cost, self.t.len(), level)
    }
}

/// Partial derivatives of rate(t) with respect to (qi, Di, b).
fn rate_gradient(p: &ArpsParams, t: f64) -> (f64, f64, f64) {
    let ArpsParams { qi, di, b } = *p;

    if di < DI_EPSILON {
        // Flat limit: ∂/∂Di of qi·(1 + b·Di·t)^(-1/b) at Di = 0 is -qi·t for every b
        return (1.0, -qi * t, 0.0);
    }

    if b < SMALL_B {
        let decay = (-di * t).exp();
        let rate = qi * decay;
        return (decay, -t * rate, rate * (di * t).powi(2) / 2.0);
    }

    let x = b * di * t;
    let u = 1.0 + x;
    let decay = u.powf(-1.0 / b);
    let rate = qi * decay;
    let d_di = -rate * t / u;
    let d_b = rate * (x.ln_1p() / (b * b) - di * t / (b * u));
    (decay, d_di, d_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::points_from_pairs;

    fn synthetic(params: &ArpsParams, times: impl Iterator<Item = f64>) -> Vec<ProductionPoint> {
        times
            .map(|t| ProductionPoint::new(t, params.rate(t).unwrap()))
            .collect()
    }

    fn within(actual: f64, expected: f64, rel: f64) -> bool {
        (actual - expected).abs() <= rel * expected.abs()
    }

    #[test]
    fn test_gradient_matches_finite_difference() {
        for b in [0.0, 0.5, 1.0, 1.6] {
            let p = ArpsParams::new(900.0, 0.004, b).unwrap();
            let t = 250.0;
            let (d_qi, d_di, d_b) = rate_gradient(&p, t);

            let h_qi = 1e-3;
            let fd_qi = (ArpsParams::new(900.0 + h_qi, 0.004, b).unwrap().rate(t).unwrap()
                - ArpsParams::new(900.0 - h_qi, 0.004, b).unwrap().rate(t).unwrap())
                / (2.0 * h_qi);
            let h_di = 1e-7;
            let fd_di = (ArpsParams::new(900.0, 0.004 + h_di, b).unwrap().rate(t).unwrap()
                - ArpsParams::new(900.0, 0.004 - h_di, b).unwrap().rate(t).unwrap())
                / (2.0 * h_di);

            assert!(within(d_qi, fd_qi, 1e-6), "b={b}: d_qi {d_qi} vs {fd_qi}");
            assert!(within(d_di, fd_di, 1e-5), "b={b}: d_di {d_di} vs {fd_di}");

            if b > 0.1 {
                let h_b = 1e-6;
                let fd_b = (ArpsParams::new(900.0, 0.004, b + h_b).unwrap().rate(t).unwrap()
                    - ArpsParams::new(900.0, 0.004, b - h_b).unwrap().rate(t).unwrap())
                    / (2.0 * h_b);
                assert!(within(d_b, fd_b, 1e-4), "b={b}: d_b {d_b} vs {fd_b}");
            }
        }
    }

    #[test]
    fn test_profiled_jacobian_matches_finite_difference() {
        let pts = points_from_pairs(&[
            (0.0, 1000.0),
            (30.0, 850.0),
            (60.0, 730.0),
            (90.0, 640.0),
            (120.0, 575.0),
        ]);
        let problem = Problem::new(&pts, ModelType::Hyperbolic, &FittingConfig::default());
        let eta = DVector::from_vec(vec![0.004_f64.ln(), 0.7]);
        let state = problem.profile(&eta).unwrap();
        let jac = problem.jacobian(&eta, &state);

        // Fitted curve with qi re-solved at every η
        let model = |eta: &DVector<f64>| &problem.y - &problem.profile(eta).unwrap().residuals;
        let h = 1e-6;
        for j in 0..2 {
            let mut up = eta.clone();
            up[j] += h;
            let mut down = eta.clone();
            down[j] -= h;
            let fd = (model(&up) - model(&down)) / (2.0 * h);
            for i in 0..pts.len() {
                assert!(
                    (jac[(i, j)] - fd[i]).abs() <= 1e-5 * fd[i].abs().max(1.0),
                    "column {j}, row {i}: {} vs {}",
                    jac[(i, j)],
                    fd[i]
                );
            }
        }
    }

    #[test]
    fn test_exponential_round_trip() {
        let truth = ArpsParams::exponential(1200.0, 0.003).unwrap();
        let pts = synthetic(&truth, (0..24).map(|m| f64::from(m) * 30.0));
        let fit = Fitter::default().fit(&pts, ModelType::Exponential, None).unwrap();

        assert_eq!(fit.model_type, ModelType::Exponential);
        assert_eq!(fit.b, 0.0);
        assert!(within(fit.qi, 1200.0, 0.01));
        assert!(within(fit.di, 0.003, 0.01));
        assert!(fit.r_squared > 0.9999);
    }

    #[test]
    fn test_harmonic_round_trip() {
        let truth = ArpsParams::harmonic(800.0, 0.01).unwrap();
        let pts = synthetic(&truth, (0..20).map(|m| f64::from(m) * 30.0));
        let fit = Fitter::default().fit(&pts, ModelType::Harmonic, None).unwrap();

        assert_eq!(fit.b, 1.0);
        assert!(within(fit.qi, 800.0, 0.01));
        assert!(within(fit.di, 0.01, 0.01));
        assert!(fit.r_squared > 0.9999);
    }

    #[test]
    fn test_hyperbolic_round_trip() {
        let truth = ArpsParams::new(1000.0, 0.01, 0.8).unwrap();
        let pts = synthetic(&truth, (0..25).map(|m| f64::from(m) * 30.0));
        let fit = Fitter::default().fit(&pts, ModelType::Hyperbolic, None).unwrap();

        assert!(within(fit.qi, 1000.0, 0.01), "qi {}", fit.qi);
        assert!(within(fit.di, 0.01, 0.01), "di {}", fit.di);
        assert!(within(fit.b, 0.8, 0.01), "b {}", fit.b);
        assert!(fit.r_squared > 0.9999);
        assert!(fit.rmse < 1e-3);
    }

    #[test]
    fn test_b_clamped_to_configured_bounds() {
        let truth = ArpsParams::new(1000.0, 0.02, 1.8).unwrap();
        let pts = synthetic(&truth, (0..25).map(|m| f64::from(m) * 30.0));
        let config = FittingConfig {
            b_max: 1.2,
            initial_b: 0.5,
            ..FittingConfig::default()
        };
        let fit = Fitter::new(config).fit(&pts, ModelType::Hyperbolic, None).unwrap();
        assert!(fit.b <= 1.2 + 1e-12);
        assert!(fit.b >= 0.0);
    }

    #[test]
    fn test_auto_prefers_exponential_on_exponential_data() {
        let truth = ArpsParams::exponential(500.0, 0.002).unwrap();
        let pts = synthetic(&truth, (0..30).map(|m| f64::from(m) * 30.0));
        let fit = Fitter::default().fit(&pts, FitMode::Auto, None).unwrap();
        assert_eq!(fit.model_type, ModelType::Exponential);
    }

    #[test]
    fn test_two_points_insufficient() {
        let pts = points_from_pairs(&[(0.0, 100.0), (30.0, 90.0), (60.0, 0.0)]);
        let err = Fitter::default().fit(&pts, ModelType::Exponential, None).unwrap_err();
        assert_eq!(
            err,
            FittingError::InsufficientData {
                valid: 2,
                required: 3
            }
        );
    }

    #[test]
    fn test_identical_rates_degenerate() {
        let pts = points_from_pairs(&[(0.0, 100.0), (30.0, 100.0), (60.0, 100.0), (90.0, 100.0)]);
        let err = Fitter::default().fit(&pts, FitMode::Auto, None).unwrap_err();
        assert!(matches!(err, FittingError::DegenerateInput(_)));
    }

    #[test]
    fn test_iteration_cap_reports_non_convergence() {
        let truth = ArpsParams::new(1000.0, 0.01, 0.8).unwrap();
        let pts = synthetic(&truth, (0..25).map(|m| f64::from(m) * 30.0));
        let config = FittingConfig {
            max_iterations: 1,
            ..FittingConfig::default()
        };
        let err = Fitter::new(config)
            .fit(&pts, ModelType::Hyperbolic, None)
            .unwrap_err();
        assert!(matches!(err, FittingError::NonConvergent { iterations: 1, .. }));
    }

    #[test]
    fn test_initial_guess_is_honoured() {
        let truth = ArpsParams::exponential(1000.0, 0.004).unwrap();
        let pts = synthetic(&truth, (0..12).map(|m| f64::from(m) * 30.0));
        let guess = ArpsParams::exponential(1000.0, 0.004).unwrap();
        let fit = Fitter::default()
            .fit(&pts, ModelType::Exponential, Some(guess))
            .unwrap();
        assert!(fit.iterations <= 1);
        assert!(within(fit.di, 0.004, 1e-9));
    }

    #[test]
    fn test_fit_is_deterministic() {
        let pts = points_from_pairs(&[
            (0.0, 980.0),
            (30.0, 870.0),
            (60.0, 745.0),
            (90.0, 660.0),
            (120.0, 600.0),
            (150.0, 530.0),
        ]);
        let a = Fitter::default().fit(&pts, FitMode::Auto, None).unwrap();
        let b = Fitter::default().fit(&pts, FitMode::Auto, None).unwrap();
        assert_eq!(a, b);
    }
}
