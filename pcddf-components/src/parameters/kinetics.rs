//! PCDD/F formation and decomposition kinetics
//!
//! # Reference
//!
//! Rate constants as fitted by Palmer et al. (2021).

use serde::{Deserialize, Serialize};

/// Arrhenius parameters for PCDD/F formation and decomposition in the furnace.
///
/// Formation and decomposition rate constants follow
///
/// $$k = A \cdot \exp\left(-\frac{E}{R T}\right)$$
///
/// Formation is enhanced by chlorine and by catalytic metals (Fe, Cu) in the
/// waste through saturating terms $f / (f + K)$.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KineticParameters {
    /// Pre-exponential formation factor for 2,3,7,8-TCDF
    /// unit: (pg PCDD/F)/(g waste·s)
    /// default: 5.73e5
    pub af_tcdf: f64,

    /// Pre-exponential formation factor for OCDF
    /// unit: (pg PCDD/F)/(g waste·s)
    /// default: 1.73e6
    pub af_ocdf: f64,

    /// Pre-exponential formation factor for 1,2,3,6,7,8-HxCDD
    /// unit: (pg PCDD/F)/(g waste·s)
    /// default: 5.03e5
    pub af_hxcdd: f64,

    /// Pre-exponential decomposition factor
    /// unit: 1/s
    /// default: 2.23e2
    pub ad: f64,

    /// Activation energy of formation
    /// unit: kJ/mol
    /// default: 16.79
    pub ef: f64,

    /// Activation energy of decomposition
    /// unit: kJ/mol
    /// default: 44.56
    pub ed: f64,

    /// Half-saturation constant of the chlorine effect
    /// unit: mass fraction
    /// default: 0.0509
    pub k_cl: f64,

    /// Half-saturation constant of the metal (Fe + Cu) effect
    /// unit: mass fraction
    /// default: 0.00259
    pub k_metal: f64,

    /// Gas constant
    /// unit: kJ/(mol·K)
    /// default: 8.314e-3
    pub gas_constant: f64,
}

impl KineticParameters {
    /// Congeners with a fitted formation factor
    pub const FORMATION_CONGENERS: [&'static str; 3] =
        ["2,3,7,8-TCDF", "OCDF", "1,2,3,6,7,8-HxCDD"];

    /// Pre-exponential formation factor of a congener, if it has been fitted
    pub fn formation_factor(&self, congener: &str) -> Option<f64> {
        match congener {
            "2,3,7,8-TCDF" => Some(self.af_tcdf),
            "OCDF" => Some(self.af_ocdf),
            "1,2,3,6,7,8-HxCDD" => Some(self.af_hxcdd),
            _ => None,
        }
    }
}

impl Default for KineticParameters {
    fn default() -> Self {
        Self {
            af_tcdf: 5.73e5,
            af_ocdf: 1.73e6,
            af_hxcdd: 5.03e5,
            ad: 2.23e2,
            ef: 16.79,
            ed: 44.56,
            k_cl: 0.0509,
            k_metal: 0.00259,
            gas_constant: 8.314e-3,
        }
    }
}
