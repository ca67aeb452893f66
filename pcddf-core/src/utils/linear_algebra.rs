//! Linear algebra utilities.

use crate::errors::{PcddfError, PcddfResult};

/// Coefficients of a fitted straight line `y = slope * x + intercept`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearFit {
    /// Evaluate the fitted line at `x`
    pub fn evaluate(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Ordinary least squares fit of a straight line through `(x, y)` pairs.
///
/// Pairs where either value is not finite are ignored.
///
/// # Errors
/// Returns [`PcddfError::InsufficientRegressionData`] if fewer than two usable pairs
/// remain or if all remaining `x` values are identical.
///
/// # Example
/// ```
/// use pcddf_core::utils::linear_algebra::linear_regression;
///
/// let x = [0.0, 1.0, 2.0, f64::NAN];
/// let y = [1.0, 3.0, 5.0, 100.0];
///
/// let fit = linear_regression(&x, &y).unwrap();
/// assert!((fit.slope - 2.0).abs() < 1e-12);
/// assert!((fit.intercept - 1.0).abs() < 1e-12);
/// ```
pub fn linear_regression(x: &[f64], y: &[f64]) -> PcddfResult<LinearFit> {
    assert_eq!(x.len(), y.len(), "x must have same length as y");

    let points: Vec<(f64, f64)> = x
        .iter()
        .zip(y)
        .filter(|(a, b)| a.is_finite() && b.is_finite())
        .map(|(a, b)| (*a, *b))
        .collect();
    let n = points.len();
    if n < 2 {
        return Err(PcddfError::InsufficientRegressionData(n));
    }

    let x_mean = points.iter().map(|p| p.0).sum::<f64>() / n as f64;
    let y_mean = points.iter().map(|p| p.1).sum::<f64>() / n as f64;

    let (sxy, sxx) = points.iter().fold((0.0, 0.0), |(sxy, sxx), (a, b)| {
        let dx = a - x_mean;
        (sxy + dx * (b - y_mean), sxx + dx * dx)
    });
    if sxx == 0.0 {
        return Err(PcddfError::InsufficientRegressionData(n));
    }

    let slope = sxy / sxx;
    Ok(LinearFit {
        slope,
        intercept: y_mean - slope * x_mean,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use is_close::is_close;

    #[test]
    fn test_exact_line() {
        let x = vec![-1.0, 0.0, 1.0, 2.0];
        let y: Vec<f64> = x.iter().map(|v| 0.5 * v - 3.0).collect();

        let fit = linear_regression(&x, &y).unwrap();
        assert!(is_close!(fit.slope, 0.5));
        assert!(is_close!(fit.intercept, -3.0));
        assert!(is_close!(fit.evaluate(4.0), -1.0));
    }

    #[test]
    fn test_least_squares_known_solution() {
        // Points (1, 1), (2, 2), (3, 2): slope 0.5, intercept 2/3
        let fit = linear_regression(&[1.0, 2.0, 3.0], &[1.0, 2.0, 2.0]).unwrap();
        assert!(is_close!(fit.slope, 0.5));
        assert!(is_close!(fit.intercept, 2.0 / 3.0));
    }

    #[test]
    fn test_non_finite_points_ignored() {
        let x = [1.0, f64::NAN, 2.0, 3.0];
        let y = [2.0, 7.0, f64::INFINITY, 6.0];

        let fit = linear_regression(&x, &y).unwrap();
        assert!(is_close!(fit.slope, 2.0));
        assert!(fit.intercept.abs() < 1e-12);
    }

    #[test]
    fn test_too_few_points() {
        let result = linear_regression(&[1.0, f64::NAN], &[1.0, 2.0]);
        assert!(matches!(
            result,
            Err(PcddfError::InsufficientRegressionData(1))
        ));
    }

    #[test]
    fn test_degenerate_x() {
        let result = linear_regression(&[2.0, 2.0, 2.0], &[1.0, 2.0, 3.0]);
        assert!(matches!(
            result,
            Err(PcddfError::InsufficientRegressionData(3))
        ));
    }

    #[test]
    #[should_panic]
    fn test_length_mismatch() {
        let _ = linear_regression(&[1.0, 2.0], &[1.0]);
    }
}
