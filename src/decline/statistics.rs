//! Goodness-of-fit statistics and parameter confidence intervals

use nalgebra::DMatrix;
use statrs::distribution::{ContinuousCDF, StudentsT};

/// Coefficient of determination, R² = 1 − SS_res / SS_tot.
///
/// Returns 1.0 for a perfect fit of constant data and 0.0 when SS_tot is
/// zero but residuals are not.
pub fn r_squared(observed: &[f64], predicted: &[f64]) -> f64 {
    let n = observed.len();
    if n == 0 {
        return 0.0;
    }
    let mean = observed.iter().sum::<f64>() / n as f64;
    let ss_tot: f64 = observed.iter().map(|o| (o - mean).powi(2)).sum();
    let ss_res = sum_squared_residuals(observed, predicted);

    if ss_tot <= f64::EPSILON * mean.abs().max(1.0) {
        return if ss_res <= f64::EPSILON { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

/// R² penalised for the number of fitted parameters,
/// `1 − (1 − R²)·(n − 1)/(n − p)`.
///
/// A fit with no residual degrees of freedom scores negative infinity.
pub fn adjusted_r_squared(r_squared: f64, n_points: usize, n_params: usize) -> f64 {
    if n_points <= n_params {
        return f64::NEG_INFINITY;
    }
    let n = n_points as f64;
    let p = n_params as f64;
    1.0 - (1.0 - r_squared) * (n - 1.0) / (n - p)
}

/// Root mean squared residual.
pub fn rmse(observed: &[f64], predicted: &[f64]) -> f64 {
    if observed.is_empty() {
        return 0.0;
    }
    (sum_squared_residuals(observed, predicted) / observed.len() as f64).sqrt()
}

pub fn sum_squared_residuals(observed: &[f64], predicted: &[f64]) -> f64 {
    observed
        .iter()
        .zip(predicted)
        .map(|(o, p)| (o - p).powi(2))
        .sum()
}

/// Two-sided Student-t intervals `θ ± t·se` from the Gauss-Newton
/// covariance `s²·(JᵀJ)⁻¹`, with `s² = SS_res / (n − p)`.
///
/// Returns `None` when there are no residual degrees of freedom or the
/// normal matrix is singular.
pub fn parameter_intervals(
    estimates: &[f64],
    jtj: &DMatrix<f64>,
    ss_res: f64,
    n_points: usize,
    level: f64,
) -> Option<Vec<(f64, f64)>> {
    let p = estimates.len();
    if n_points <= p || jtj.nrows() != p || jtj.ncols() != p {
        return None;
    }
    let dof = (n_points - p) as f64;
    let s2 = ss_res / dof;
    let covariance = jtj.clone().try_inverse()?;

    let t_dist = StudentsT::new(0.0, 1.0, dof).ok()?;
    let t_crit = t_dist.inverse_cdf(0.5 + level / 2.0);
    if !t_crit.is_finite() {
        return None;
    }

    estimates
        .iter()
        .enumerate()
        .map(|(i, &theta)| {
            let var = s2 * covariance[(i, i)];
            if var.is_finite() && var >= 0.0 {
                let half = t_crit * var.sqrt();
                Some((theta - half, theta + half))
            } else {
                None
            }
        })
        .collect()
}
