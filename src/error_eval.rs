//! Reconstruction error against a ground-truth field.

use crate::error::{CurlometerError, Result};
use crate::Vector3;

/// Error reported for points with a zero estimate (no tetrahedron passed
/// the gate).
pub const NO_COVERAGE_ERROR: f64 = 1.0;

/// Per-point percent error `100·|estimate − truth| / |estimate|`.
///
/// Points whose estimate is exactly the zero vector get
/// [`NO_COVERAGE_ERROR`] instead of dividing by zero.
pub fn percent_error(estimate: &[Vector3], truth: &[Vector3]) -> Result<Vec<f64>> {
    if estimate.len() != truth.len() {
        return Err(CurlometerError::InputShape(format!(
            "estimate has {} points but ground truth has {}",
            estimate.len(),
            truth.len()
        )));
    }

    Ok(estimate
        .iter()
        .zip(truth)
        .map(|(est, tru)| {
            let magnitude = est.norm();
            if magnitude == 0.0 {
                NO_COVERAGE_ERROR
            } else {
                100.0 * (est - tru).norm() / magnitude
            }
        })
        .collect())
}

/// Summary statistics of a percent-error field over the covered points.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorSummary {
    /// Points where at least one tetrahedron passed the gate.
    pub covered_points: usize,
    pub total_points: usize,
    /// Mean percent error over covered points; `None` without coverage.
    pub mean_percent: Option<f64>,
    pub median_percent: Option<f64>,
    pub max_percent: Option<f64>,
}

impl ErrorSummary {
    /// Summarise `errors`, counting a point as covered when
    /// `tetra_passed[k] > 0`.
    pub fn from_errors(errors: &[f64], tetra_passed: &[usize]) -> Result<Self> {
        if errors.len() != tetra_passed.len() {
            return Err(CurlometerError::InputShape(format!(
                "{} error values but {} coverage counts",
                errors.len(),
                tetra_passed.len()
            )));
        }

        let mut covered: Vec<f64> = errors
            .iter()
            .zip(tetra_passed)
            .filter(|(_, &n)| n > 0)
            .map(|(&e, _)| e)
            .collect();
        covered.sort_by(f64::total_cmp);

        let n = covered.len();
        let (mean_percent, median_percent, max_percent) = if n == 0 {
            (None, None, None)
        } else {
            let mean = covered.iter().sum::<f64>() / n as f64;
            let median = if n % 2 == 1 {
                covered[n / 2]
            } else {
                0.5 * (covered[n / 2 - 1] + covered[n / 2])
            };
            (Some(mean), Some(median), covered.last().copied())
        };

        Ok(Self {
            covered_points: n,
            total_points: errors.len(),
            mean_percent,
            median_percent,
            max_percent,
        })
    }

    /// Fraction of points with coverage.
    pub fn coverage(&self) -> f64 {
        if self.total_points == 0 {
            0.0
        } else {
            self.covered_points as f64 / self.total_points as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_error() {
        let est = vec![Vector3::new(2.0, 0.0, 0.0), Vector3::new(0.0, 4.0, 0.0)];
        let truth = vec![Vector3::new(1.0, 0.0, 0.0), Vector3::new(0.0, 4.0, 0.0)];
        let err = percent_error(&est, &truth).unwrap();
        assert!((err[0] - 50.0).abs() < 1e-12);
        assert_eq!(err[1], 0.0);
    }

    #[test]
    fn test_zero_estimate_reports_fallback() {
        let est = vec![Vector3::zeros()];
        let truth = vec![Vector3::new(3.0, -1.0, 7.0)];
        assert_eq!(percent_error(&est, &truth).unwrap(), vec![NO_COVERAGE_ERROR]);
        let truth = vec![Vector3::zeros()];
        assert_eq!(percent_error(&est, &truth).unwrap(), vec![NO_COVERAGE_ERROR]);
    }

    #[test]
    fn test_length_mismatch() {
        let err = percent_error(&[Vector3::zeros()], &[]).unwrap_err();
        assert!(matches!(err, CurlometerError::InputShape(_)));
    }

    #[test]
    fn test_summary_ignores_uncovered_points() {
        let errors = [10.0, 1.0, 30.0, 20.0, 1.0];
        let passed = [3, 0, 1, 2, 0];
        let summary = ErrorSummary::from_errors(&errors, &passed).unwrap();
        assert_eq!(summary.covered_points, 3);
        assert_eq!(summary.total_points, 5);
        assert_eq!(summary.mean_percent, Some(20.0));
        assert_eq!(summary.median_percent, Some(20.0));
        assert_eq!(summary.max_percent, Some(30.0));
        assert!((summary.coverage() - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_summary_without_coverage() {
        let summary = ErrorSummary::from_errors(&[1.0, 1.0], &[0, 0]).unwrap();
        assert_eq!(summary.covered_points, 0);
        assert_eq!(summary.mean_percent, None);
        assert_eq!(summary.coverage(), 0.0);
    }
}
