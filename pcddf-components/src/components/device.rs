//! Abatement devices of the profile model
//!
//! Each device consumes the congener profile produced by the previous stage and
//! returns a table with its intermediate results and the transformed profile.

use super::adjustment::Adjustment;
use super::vapor_pressure::VaporPressure;
use ndarray::Array1;
use pcddf_core::config::AdjustmentConfig;
use pcddf_core::errors::PcddfResult;
use pcddf_core::table::Table;
use std::fmt::Debug;

/// Reference column: gas-phase fraction of the total profile before the device
pub const BEFORE_GAS: &str = "Before (Gas)";
/// Reference column: particulate-phase fraction of the total profile before the device
pub const BEFORE_PARTICULATE: &str = "Before (Particulate)";
/// Reference column: gas-phase fraction of the total profile after the device
pub const AFTER_GAS: &str = "After (Gas)";
/// Reference column: particulate-phase fraction of the total profile after the device
pub const AFTER_PARTICULATE: &str = "After (Particulate)";
/// Reference column: total profile before the device
pub const BEFORE_TOTAL: &str = "Before (Total)";
/// Reference column: total profile after the device
pub const AFTER_TOTAL: &str = "After (Total)";
/// Reference column: removal efficiency of a device without phase partitioning
pub const REMOVAL_EFFICIENCY: &str = "Removal Efficiency";

/// Everything a device needs to solve a single stage
#[derive(Debug, Clone)]
pub struct StageInput<'a> {
    /// Congeners in canonical order, the row order of every table
    pub congeners: &'a [String],
    /// Profile carried forward from the previous stage
    pub profile: &'a Array1<f64>,
    /// Reference measurements for this device, in canonical order
    pub reference: &'a Table,
    /// Only loaded when a device of the chain needs it
    pub vapor_pressure: Option<&'a VaporPressure>,
    pub adjustment: &'a Adjustment,
    pub index_label: &'a str,
    /// Name of the output column holding the transformed profile
    pub result_column: &'a str,
}

impl StageInput<'_> {
    /// Start an output table indexed by the canonical congeners
    pub fn output_table(&self) -> Table {
        Table::new(self.index_label, self.congeners.to_vec())
    }
}

/// A single abatement or treatment stage.
///
/// Devices are serialisable trait objects so that a configured chain can be
/// stored and restored.
#[typetag::serde]
pub trait Device: Debug {
    fn name(&self) -> &str;

    /// Short human readable name of the transformation mode
    fn mode(&self) -> &'static str;

    /// Whether [`StageInput::vapor_pressure`] must be provided
    fn requires_vapor_pressure(&self) -> bool {
        false
    }

    /// Adjustment factors declared for this device
    fn adjust(&self) -> Option<&AdjustmentConfig> {
        None
    }

    /// Operating parameters, written as comments above the stage output
    fn describe(&self) -> Vec<String> {
        vec![]
    }

    /// Transform the incoming profile.
    ///
    /// The returned table contains at least `input.result_column`.
    fn solve(&self, input: &StageInput) -> PcddfResult<Table>;
}

/// Removal efficiency implied by a pair of before/after measurements
///
/// $$\eta = 1 - \frac{m_{out}}{m_{in}}$$
pub fn removal_efficiency(before: &Array1<f64>, after: &Array1<f64>) -> Array1<f64> {
    1.0 - after / before
}
