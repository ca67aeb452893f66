//! Device with a single removal efficiency per congener
//!
//! The removal efficiency $\eta$ is read from the reference data, either directly
//! or as $1 - r_{after} / r_{before}$. It is applied to the incoming profile $x$ and
//! then re-expressed relative to the mass that remains,
//!
//! $$\eta' = 1 - \frac{1 - \eta}{\sum_i x_i (1 - \eta_i)}$$
//!
//! so that the outgoing profile $x (1 - \eta')$ is again normalised.

use super::device::{
    removal_efficiency, Device, StageInput, AFTER_TOTAL, BEFORE_TOTAL, REMOVAL_EFFICIENCY,
};
use super::partitioning::adjustment_comment;
use log::debug;
use ndarray::Array1;
use pcddf_core::config::{AdjustmentConfig, Phase};
use pcddf_core::errors::PcddfResult;
use pcddf_core::table::Table;
use pcddf_core::utils::nan_sum;
use serde::{Deserialize, Serialize};

/// Aggregate removal without phase partitioning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemovalEfficiencyDevice {
    name: String,
    adjust: Option<AdjustmentConfig>,
}

impl RemovalEfficiencyDevice {
    pub fn new(name: &str, adjust: Option<AdjustmentConfig>) -> Self {
        Self {
            name: name.to_string(),
            adjust,
        }
    }

    /// Removal efficiency from the reference data
    ///
    /// Uses the `Removal Efficiency` column when present and otherwise derives it
    /// from the `Before (Total)` and `After (Total)` columns.
    pub fn reference_efficiency(&self, reference: &Table) -> PcddfResult<Array1<f64>> {
        match reference.get(REMOVAL_EFFICIENCY) {
            Some(efficiency) => Ok(efficiency.clone()),
            None => Ok(removal_efficiency(
                reference.column(BEFORE_TOTAL)?,
                reference.column(AFTER_TOTAL)?,
            )),
        }
    }

    /// Removal efficiency relative to the mass remaining after the device
    pub fn calculate_adjusted_efficiency(
        &self,
        profile: &Array1<f64>,
        efficiency: &Array1<f64>,
    ) -> Array1<f64> {
        let remaining = 1.0 - efficiency;
        let total_after = nan_sum(&(profile * &remaining));
        debug!("{}: profile sum after removal {}", self.name, total_after);
        1.0 - remaining / total_after
    }
}

#[typetag::serde]
impl Device for RemovalEfficiencyDevice {
    fn name(&self) -> &str {
        &self.name
    }

    fn mode(&self) -> &'static str {
        "removal efficiency"
    }

    fn adjust(&self) -> Option<&AdjustmentConfig> {
        self.adjust.as_ref()
    }

    fn describe(&self) -> Vec<String> {
        self.adjust.iter().map(adjustment_comment).collect()
    }

    fn solve(&self, input: &StageInput) -> PcddfResult<Table> {
        let efficiency = self.reference_efficiency(input.reference)?;
        let adjusted = self.calculate_adjusted_efficiency(input.profile, &efficiency);
        let adjusted = input.adjustment.apply(&adjusted, Phase::Total)?;
        let result = input.profile * &(1.0 - &adjusted);

        Ok(input
            .output_table()
            .with_column(BEFORE_TOTAL, input.profile.clone())
            .with_column(REMOVAL_EFFICIENCY, adjusted)
            .with_column(input.result_column, result))
    }
}
