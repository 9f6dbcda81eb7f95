//! Production data cleaning ahead of fitting
//!
//! Sorts points by time and drops every point the fitter cannot use,
//! counting each exclusion in a [`DataQualityReport`] instead of failing.

use tracing::warn;

use crate::types::{DataQualityReport, ProductionPoint};

/// Clean a point series for fitting.
///
/// Exclusion order per point: non-finite value, negative time, rate <= 0.
/// Survivors are stably sorted by time and duplicate times keep the first
/// occurrence in input order.
pub fn clean_points(points: &[ProductionPoint]) -> (Vec<ProductionPoint>, DataQualityReport) {
    let mut report = DataQualityReport {
        input_count: points.len(),
        ..Default::default()
    };

    let mut kept: Vec<ProductionPoint> = Vec::with_capacity(points.len());
    for p in points {
        if !p.time_days.is_finite() || !p.rate.is_finite() {
            report.non_finite += 1;
        } else if p.time_days < 0.0 {
            report.negative_time += 1;
        } else if p.rate <= 0.0 {
            report.zero_or_negative_rate += 1;
        } else {
            kept.push(*p);
        }
    }

    report.reordered = kept.windows(2).any(|w| w[1].time_days < w[0].time_days);
    if report.reordered {
        kept.sort_by(|a, b| a.time_days.total_cmp(&b.time_days));
    }

    let before = kept.len();
    kept.dedup_by(|later, earlier| later.time_days == earlier.time_days);
    report.duplicate_time = before - kept.len();
    report.valid_count = kept.len();

    if !report.is_clean() {
        warn!(
            input = report.input_count,
            valid = report.valid_count,
            non_finite = report.non_finite,
            negative_time = report.negative_time,
            zero_or_negative_rate = report.zero_or_negative_rate,
            duplicate_time = report.duplicate_time,
            reordered = report.reordered,
            "Production data cleaned before fitting"
        );
    }

    (kept, report)
}

/// Whether every rate equals the first within a relative tolerance.
pub fn rates_identical(points: &[ProductionPoint]) -> bool {
    let Some(first) = points.first() else {
        return true;
    };
    let scale = first.rate.abs().max(f64::MIN_POSITIVE);
    points
        .iter()
        .all(|p| (p.rate - first.rate).abs() <= 1e-12 * scale)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::points_from_pairs;

    #[test]
    fn test_clean_input_untouched() {
        let pts = points_from_pairs(&[(0.0, 100.0), (10.0, 90.0), (20.0, 81.0)]);
        let (kept, report) = clean_points(&pts);
        assert_eq!(kept, pts);
        assert!(report.is_clean());
        assert_eq!(report.valid_count, 3);
    }

    #[test]
    fn test_defects_counted_not_kept() {
        let pts = points_from_pairs(&[
            (0.0, 100.0),
            (10.0, 0.0),
            (20.0, -5.0),
            (-1.0, 50.0),
            (30.0, f64::NAN),
            (40.0, 70.0),
        ]);
        let (kept, report) = clean_points(&pts);
        assert_eq!(kept.len(), 2);
        assert_eq!(report.zero_or_negative_rate, 2);
        assert_eq!(report.negative_time, 1);
        assert_eq!(report.non_finite, 1);
        assert_eq!(report.excluded(), 4);
        assert_eq!(report.input_count, report.valid_count + report.excluded());
    }

    #[test]
    fn test_unsorted_input_sorted_and_flagged() {
        let pts = points_from_pairs(&[(20.0, 80.0), (0.0, 100.0), (10.0, 90.0)]);
        let (kept, report) = clean_points(&pts);
        let times: Vec<f64> = kept.iter().map(|p| p.time_days).collect();
        assert_eq!(times, vec![0.0, 10.0, 20.0]);
        assert!(report.reordered);
    }

    #[test]
    fn test_duplicate_time_keeps_first() {
        let pts = points_from_pairs(&[(0.0, 100.0), (10.0, 90.0), (10.0, 95.0), (20.0, 80.0)]);
        let (kept, report) = clean_points(&pts);
        assert_eq!(kept.len(), 3);
        assert_eq!(kept[1].rate, 90.0);
        assert_eq!(report.duplicate_time, 1);
    }

    #[test]
    fn test_rates_identical() {
        assert!(rates_identical(&points_from_pairs(&[(0.0, 5.0), (1.0, 5.0)])));
        assert!(!rates_identical(&points_from_pairs(&[(0.0, 5.0), (1.0, 4.9)])));
    }
}
