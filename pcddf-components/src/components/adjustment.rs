//! Adjustment factors for removal efficiencies
//!
//! A device may declare a set of phases whose removal efficiencies are
//! multiplied, congener by congener, by factors from an auxiliary table.
//! The table has one column per phase (`gas`, `particulate`, `total`).

use log::{debug, warn};
use ndarray::Array1;
use pcddf_core::config::{AdjustmentConfig, Phase};
use pcddf_core::congeners::congener_keys;
use pcddf_core::errors::PcddfResult;
use pcddf_core::io::CsvReader;
use pcddf_core::table::Table;

/// Loaded adjustment of a single device.
///
/// The default value applies no adjustment.
#[derive(Debug, Clone, Default)]
pub struct Adjustment {
    phases: Vec<Phase>,
    factors: Option<Table>,
}

impl Adjustment {
    /// The identity adjustment
    pub fn none() -> Self {
        Self::default()
    }

    /// Adjust `phases` using a factor table already in canonical congener order
    pub fn new(phases: Vec<Phase>, factors: Table) -> Self {
        Self {
            phases,
            factors: Some(factors),
        }
    }

    /// Load the factor table of a device, if the device declares an adjustment
    pub fn load(config: Option<&AdjustmentConfig>, reader: &CsvReader) -> PcddfResult<Self> {
        let Some(config) = config else {
            return Ok(Self::none());
        };

        let keys = congener_keys();
        let table = reader.read_table(&config.factors_path)?;
        let missing = table.missing_keys(&keys);
        if !missing.is_empty() {
            warn!(
                "Adjustment factors in {} are missing congeners {:?}",
                config.factors_path.display(),
                missing
            );
        }
        debug!(
            "Loaded adjustment factors for phases {:?} from {}",
            config.phases,
            config.factors_path.display()
        );
        Ok(Self::new(config.phases.clone(), table.reindex(&keys)))
    }

    pub fn is_identity(&self) -> bool {
        self.factors.is_none() || self.phases.is_empty()
    }

    /// Apply the factors for `phase` to a removal efficiency series.
    ///
    /// The series is returned unchanged unless `phase` is one of the adjusted phases.
    ///
    /// # Errors
    /// Fails if the factor table has no column for an adjusted phase.
    pub fn apply(&self, efficiency: &Array1<f64>, phase: Phase) -> PcddfResult<Array1<f64>> {
        match &self.factors {
            Some(factors) if self.phases.contains(&phase) => {
                Ok(efficiency * factors.column(phase.as_str())?)
            }
            _ => Ok(efficiency.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use is_close::is_close;
    use ndarray::array;
    use pcddf_core::errors::PcddfError;

    fn factors() -> Table {
        Table::new("Congener", vec!["A".to_string(), "B".to_string()])
            .with_column("gas", array![0.5, 2.0])
            .with_column("particulate", array![1.5, f64::NAN])
    }

    #[test]
    fn test_no_adjustment_is_identity() {
        let adjustment = Adjustment::none();
        let efficiency = array![0.37, -0.2, 0.91];

        assert!(adjustment.is_identity());
        for phase in Phase::ALL {
            assert_eq!(adjustment.apply(&efficiency, phase).unwrap(), efficiency);
        }
    }

    #[test]
    fn test_listed_phase_is_multiplied() {
        let adjustment = Adjustment::new(vec![Phase::Gas], factors());
        let adjusted = adjustment.apply(&array![0.4, 0.3], Phase::Gas).unwrap();
        assert!(is_close!(adjusted[0], 0.2));
        assert!(is_close!(adjusted[1], 0.6));
    }

    #[test]
    fn test_unlisted_phase_is_unchanged() {
        let adjustment = Adjustment::new(vec![Phase::Gas], factors());
        let efficiency = array![0.4, 0.3];
        assert_eq!(
            adjustment.apply(&efficiency, Phase::Particulate).unwrap(),
            efficiency
        );
    }

    #[test]
    fn test_missing_factor_propagates_nan() {
        let adjustment = Adjustment::new(vec![Phase::Particulate], factors());
        let adjusted = adjustment
            .apply(&array![0.4, 0.3], Phase::Particulate)
            .unwrap();
        assert!(is_close!(adjusted[0], 0.6));
        assert!(adjusted[1].is_nan());
    }

    #[test]
    fn test_missing_phase_column() {
        let adjustment = Adjustment::new(vec![Phase::Total], factors());
        assert!(matches!(
            adjustment.apply(&array![0.4, 0.3], Phase::Total),
            Err(PcddfError::MissingColumn { .. })
        ));
    }
}
