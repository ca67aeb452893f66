//! Gas/particle partitioning parameters

use serde::{Deserialize, Serialize};

/// Parameters of the empirical gas-phase fraction correlation.
///
/// The gas-phase fraction of a congener is related to its subcooled liquid
/// vapour pressure $p_L$ by
///
/// $$\phi_{gas} = a + b \cdot \ln(p_L)$$
///
/// No clamping is applied, so the result may leave `[0, 1]` for very volatile
/// or very involatile congeners.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GasFractionParameters {
    /// Intercept $a$
    /// unit: dimensionless
    /// default: 0.3491
    pub intercept: f64,

    /// Slope $b$ with respect to the natural log of the vapour pressure
    /// unit: dimensionless
    /// default: 0.0407
    pub slope: f64,
}

impl Default for GasFractionParameters {
    fn default() -> Self {
        Self {
            intercept: 0.3491,
            slope: 0.0407,
        }
    }
}
