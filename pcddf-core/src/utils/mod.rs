pub mod linear_algebra;

use ndarray::Array1;

/// Sum of an array, skipping absent (`NaN`) values.
///
/// An array with no present values sums to zero.
pub fn nan_sum(values: &Array1<f64>) -> f64 {
    values.iter().filter(|v| !v.is_nan()).sum()
}
