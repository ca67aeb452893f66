//! Vapour pressure and gas-phase fraction of congeners
//!
//! The subcooled liquid vapour pressure of each congener follows a
//! Clausius–Clapeyron style log-linear relationship with temperature:
//!
//! $$ p_L = 10^{\,b - a / T} $$
//!
//! with per-congener coefficients $a$ and $b$ and the absolute temperature $T$ (K).
//! The gas-phase fraction is then derived from $\ln(p_L)$, either with a fixed
//! empirical correlation or with a line fitted to reference measurements.

use crate::parameters::GasFractionParameters;
use log::debug;
use ndarray::Array1;
use pcddf_core::config::GasFractionPolicy;
use pcddf_core::congeners::congener_keys;
use pcddf_core::errors::{PcddfError, PcddfResult};
use pcddf_core::table::Table;
use pcddf_core::utils::linear_algebra::linear_regression;
use serde::{Deserialize, Serialize};

/// Column of the coefficient table holding $a$
pub const COLUMN_A: &str = "a";
/// Column of the coefficient table holding $b$
pub const COLUMN_B: &str = "b";

/// Per-congener vapour pressure coefficients.
///
/// Read-only reference data, loaded once per run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaporPressure {
    congeners: Vec<String>,
    a: Array1<f64>,
    b: Array1<f64>,
    parameters: GasFractionParameters,
}

impl VaporPressure {
    /// Create from coefficients given in the order of `congeners`
    ///
    /// # Errors
    /// Fails unless there is exactly one $a$ and one $b$ per congener.
    pub fn from_coefficients(
        congeners: Vec<String>,
        a: Array1<f64>,
        b: Array1<f64>,
    ) -> PcddfResult<Self> {
        for (column, values) in [(COLUMN_A, &a), (COLUMN_B, &b)] {
            if values.len() != congeners.len() {
                return Err(PcddfError::CoefficientCount {
                    column: column.to_string(),
                    expected: congeners.len(),
                    found: values.len(),
                });
            }
        }
        Ok(Self {
            congeners,
            a,
            b,
            parameters: GasFractionParameters::default(),
        })
    }

    /// Create from a coefficient table, reindexed to the canonical congener order
    pub fn from_table(table: &Table) -> PcddfResult<Self> {
        let table = table.reindex(&congener_keys());
        Self::from_coefficients(
            table.index().to_vec(),
            table.column(COLUMN_A)?.clone(),
            table.column(COLUMN_B)?.clone(),
        )
    }

    pub fn congeners(&self) -> &[String] {
        &self.congeners
    }

    /// Vapour pressure of every congener at `temperature` (K).
    ///
    /// Congeners with absent coefficients yield `NaN`.
    ///
    /// # Errors
    /// Fails if the temperature is not above absolute zero or if a congener with
    /// coefficients has a vapour pressure which is not strictly positive and finite.
    pub fn calculate(&self, temperature: f64) -> PcddfResult<Array1<f64>> {
        if !(temperature > 0.0) {
            return Err(PcddfError::InvalidTemperature(temperature));
        }

        let vp: Array1<f64> = self
            .a
            .iter()
            .zip(self.b.iter())
            .map(|(a, b)| 10f64.powf(b - a / temperature))
            .collect();

        if let Some(i) = vp
            .iter()
            .position(|p| !p.is_nan() && !(*p > 0.0 && p.is_finite()))
        {
            return Err(PcddfError::NonPositiveVaporPressure {
                congener: self.congeners[i].clone(),
                temperature,
            });
        }
        Ok(vp)
    }

    /// Gas fraction from the fixed empirical correlation, without clamping
    pub fn empirical_gas_fraction(&self, vapor_pressure: &Array1<f64>) -> Array1<f64> {
        vapor_pressure.mapv(|p| self.parameters.intercept + self.parameters.slope * p.ln())
    }

    /// Gas fraction from a line fitted through reference measurements.
    ///
    /// The reference gas fractions are regressed against $\ln(p_L)$ at the reference
    /// temperature, the fitted line is evaluated at $\ln(p_L)$ for the operating
    /// temperature and the result is clamped to `[0, 1]`.
    pub fn regression_gas_fraction(
        &self,
        vapor_pressure: &Array1<f64>,
        reference_vapor_pressure: &Array1<f64>,
        reference_gas_fraction: &Array1<f64>,
    ) -> PcddfResult<Array1<f64>> {
        let x = reference_vapor_pressure.mapv(f64::ln);
        let fit = linear_regression(&x.to_vec(), &reference_gas_fraction.to_vec())?;
        debug!(
            "Gas fraction regression: slope={}, intercept={}",
            fit.slope, fit.intercept
        );
        Ok(vapor_pressure.mapv(|p| fit.evaluate(p.ln()).clamp(0.0, 1.0)))
    }

    /// Gas fraction at `temperature` (K) using the selected policy.
    ///
    /// The reference values are only used by [`GasFractionPolicy::Regression`].
    pub fn gas_fraction(
        &self,
        policy: GasFractionPolicy,
        temperature: f64,
        reference_temperature: f64,
        reference_gas_fraction: &Array1<f64>,
    ) -> PcddfResult<Array1<f64>> {
        let vp = self.calculate(temperature)?;
        match policy {
            GasFractionPolicy::Empirical => Ok(self.empirical_gas_fraction(&vp)),
            GasFractionPolicy::Regression => {
                let vp_reference = self.calculate(reference_temperature)?;
                self.regression_gas_fraction(&vp, &vp_reference, reference_gas_fraction)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use is_close::is_close;
    use ndarray::array;

    fn keys(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("congener_{}", i)).collect()
    }

    fn example() -> VaporPressure {
        VaporPressure::from_coefficients(
            keys(3),
            array![4000.0, 4500.0, 5000.0],
            array![8.0, 8.5, 9.0],
        )
        .unwrap()
    }

    #[test]
    fn test_vapor_pressure_formula() {
        let vp = example().calculate(500.0).unwrap();
        assert!(is_close!(vp[0], 10f64.powf(8.0 - 8.0)));
        assert!(is_close!(vp[1], 10f64.powf(8.5 - 9.0)));
        assert!(is_close!(vp[2], 10f64.powf(9.0 - 10.0)));
    }

    #[test]
    fn test_vapor_pressure_increases_with_temperature() {
        let vp = example();
        let cold = vp.calculate(400.0).unwrap();
        let hot = vp.calculate(600.0).unwrap();
        for (c, h) in cold.iter().zip(hot.iter()) {
            assert!(h > c);
        }
    }

    #[test]
    fn test_missing_coefficients_propagate_nan() {
        let vp = VaporPressure::from_coefficients(keys(2), array![4000.0, f64::NAN], array![8.0, 8.5])
            .unwrap();
        let result = vp.calculate(500.0).unwrap();
        assert!(result[0] > 0.0);
        assert!(result[1].is_nan());
    }

    #[test]
    fn test_coefficient_count_must_match_congeners() {
        let err =
            VaporPressure::from_coefficients(keys(3), array![4000.0, 4500.0, 5000.0], array![8.0])
                .unwrap_err();
        match err {
            PcddfError::CoefficientCount {
                column,
                expected,
                found,
            } => {
                assert_eq!(column, COLUMN_B);
                assert_eq!(expected, 3);
                assert_eq!(found, 1);
            }
            other => panic!("Expected CoefficientCount, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_temperature() {
        assert!(matches!(
            example().calculate(0.0),
            Err(PcddfError::InvalidTemperature(_))
        ));
        assert!(matches!(
            example().calculate(-10.0),
            Err(PcddfError::InvalidTemperature(_))
        ));
    }

    #[test]
    fn test_underflowing_vapor_pressure_is_an_error() {
        let vp = VaporPressure::from_coefficients(keys(1), array![1.0e6], array![0.0]).unwrap();
        match vp.calculate(1.0) {
            Err(PcddfError::NonPositiveVaporPressure { congener, .. }) => {
                assert_eq!(congener, "congener_0")
            }
            other => panic!("Expected NonPositiveVaporPressure, got {:?}", other),
        }
    }

    #[test]
    fn test_empirical_gas_fraction() {
        let vp = example();
        let gf = vp.empirical_gas_fraction(&array![1.0, std::f64::consts::E]);
        assert!(is_close!(gf[0], 0.3491));
        assert!(is_close!(gf[1], 0.3491 + 0.0407));
    }

    #[test]
    fn test_empirical_gas_fraction_is_not_clamped() {
        let vp = example();
        let gf = vp.empirical_gas_fraction(&array![1e-20]);
        assert!(gf[0] < 0.0);
    }

    #[test]
    fn test_regression_reproduces_reference_at_reference_temperature() {
        let vp = example();
        let vp_ref = vp.calculate(450.0).unwrap();
        // Reference fractions lying exactly on a line in ln(vp)
        let reference = vp_ref.mapv(|p| 0.6 + 0.05 * p.ln());

        let gf = vp
            .gas_fraction(GasFractionPolicy::Regression, 450.0, 450.0, &reference)
            .unwrap();
        for (g, r) in gf.iter().zip(reference.iter()) {
            assert!(is_close!(*g, *r), "Expected {}, got {}", r, g);
        }
    }

    #[test]
    fn test_regression_is_clamped() {
        let vp = example();
        let vp_ref = vp.calculate(450.0).unwrap();
        let reference = vp_ref.mapv(|p| 0.5 + 0.2 * p.ln());

        // Extreme temperatures push the fitted line far outside [0, 1]
        let hot = vp
            .gas_fraction(GasFractionPolicy::Regression, 5000.0, 450.0, &reference)
            .unwrap();
        let cold = vp
            .gas_fraction(GasFractionPolicy::Regression, 100.0, 450.0, &reference)
            .unwrap();
        assert!(hot.iter().all(|g| *g == 1.0));
        assert!(cold.iter().all(|g| *g == 0.0));
    }

    #[test]
    fn test_regression_needs_two_points() {
        let vp = example();
        let reference = array![0.5, f64::NAN, f64::NAN];
        assert!(matches!(
            vp.gas_fraction(GasFractionPolicy::Regression, 450.0, 450.0, &reference),
            Err(PcddfError::InsufficientRegressionData(1))
        ));
    }

    #[test]
    fn test_from_table_reindexes() {
        let table = Table::new("Congener", vec!["OCDF".to_string(), "2,3,7,8-TCDD".to_string()])
            .with_column(COLUMN_A, array![3000.0, 2000.0])
            .with_column(COLUMN_B, array![7.0, 6.0]);
        let vp = VaporPressure::from_table(&table).unwrap();

        assert_eq!(vp.congeners().len(), 17);
        assert_eq!(vp.congeners()[0], "2,3,7,8-TCDD");
        let result = vp.calculate(1000.0).unwrap();
        assert!(is_close!(result[0], 10f64.powf(6.0 - 2.0)));
        assert!(is_close!(result[16], 10f64.powf(7.0 - 3.0)));
        assert!(result[1].is_nan());
    }
}
