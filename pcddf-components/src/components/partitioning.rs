//! Device with phase-dependent removal
//!
//! Models a device such as an electrostatic precipitator whose removal
//! efficiency differs between the gas and the particulate phase.
//!
//! # What This Component Does
//!
//! 1. Estimates the gas-phase fraction $\phi$ of each congener at the operating temperature.
//! 2. Splits the incoming profile $x$ into phases and scales it to absolute
//!    concentrations with the inlet bulk concentration $C_{in}$:
//!    $c^{g}_{before} = x \phi C_{in}$, $c^{p}_{before} = x (1 - \phi) C_{in}$
//! 3. Derives per-phase removal efficiencies from the reference measurements:
//!    $$\eta_{phase} = 1 - \frac{r^{phase}_{after} C_{out}}{r^{phase}_{before} C_{in}}$$
//!    and applies any adjustment factors.
//! 4. Removes $c_{after} = (1 - \eta) c_{before}$ in each phase.
//! 5. Renormalises both phases by the sum over all congeners and both phases,
//!    so the outgoing profile sums to one.

use super::device::{
    removal_efficiency, Device, StageInput, AFTER_GAS, AFTER_PARTICULATE, BEFORE_GAS,
    BEFORE_PARTICULATE, BEFORE_TOTAL,
};
use log::debug;
use ndarray::Array1;
use pcddf_core::config::{AdjustmentConfig, GasFractionPolicy, Phase, CELSIUS_TO_KELVIN};
use pcddf_core::errors::{PcddfError, PcddfResult};
use pcddf_core::table::Table;
use pcddf_core::utils::nan_sum;
use serde::{Deserialize, Serialize};

/// Output column: estimated gas-phase fraction at the operating temperature
pub const GAS_FRACTION: &str = "Gas Fraction";
/// Output column: gas-phase removal efficiency after adjustment
pub const REMOVAL_EFFICIENCY_GAS: &str = "Removal Efficiency (Gas)";
/// Output column: particulate-phase removal efficiency after adjustment
pub const REMOVAL_EFFICIENCY_PARTICULATE: &str = "Removal Efficiency (Particulate)";
/// Output column: removal efficiency of both phases combined
pub const REMOVAL_EFFICIENCY_TOTAL: &str = "Removal Efficiency (Total)";

/// Operating parameters of a partitioning device
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartitioningParameters {
    /// Operating temperature
    /// unit: °C
    pub temperature: f64,
    /// Temperature at which the reference measurements were taken
    /// unit: °C
    pub ref_temperature: f64,
    /// Inlet bulk PCDD/F concentration
    /// unit: ng/Nm3
    pub conc_in: f64,
    /// Outlet bulk PCDD/F concentration
    /// unit: ng/Nm3
    pub conc_out: f64,
    pub gas_fraction: GasFractionPolicy,
}

/// Phase-resolved removal of congeners
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartitioningDevice {
    name: String,
    parameters: PartitioningParameters,
    adjust: Option<AdjustmentConfig>,
}

/// Intermediate results of a single phase
#[derive(Debug, Clone)]
struct PhaseResult {
    before: Array1<f64>,
    efficiency: Array1<f64>,
    conc_before: Array1<f64>,
    conc_after: Array1<f64>,
}

impl PartitioningDevice {
    pub fn from_parameters(
        name: &str,
        parameters: PartitioningParameters,
        adjust: Option<AdjustmentConfig>,
    ) -> Self {
        Self {
            name: name.to_string(),
            parameters,
            adjust,
        }
    }

    /// Gas-phase fraction of each congener at the operating temperature
    pub fn calculate_gas_fraction(&self, input: &StageInput) -> PcddfResult<Array1<f64>> {
        let vapor_pressure = input.vapor_pressure.ok_or_else(|| {
            PcddfError::MissingReferenceData("Vapour pressure coefficients".to_string())
        })?;

        let before_gas = input.reference.column(BEFORE_GAS)?;
        let before_particulate = input.reference.column(BEFORE_PARTICULATE)?;
        let reference_gas_fraction = before_gas / &(before_gas + before_particulate);

        vapor_pressure.gas_fraction(
            self.parameters.gas_fraction,
            self.parameters.temperature + CELSIUS_TO_KELVIN,
            self.parameters.ref_temperature + CELSIUS_TO_KELVIN,
            &reference_gas_fraction,
        )
    }

    /// Removal efficiency of one phase from the reference measurements, before adjustment
    pub fn calculate_removal_efficiency(
        &self,
        reference_before: &Array1<f64>,
        reference_after: &Array1<f64>,
    ) -> Array1<f64> {
        removal_efficiency(
            &(reference_before * self.parameters.conc_in),
            &(reference_after * self.parameters.conc_out),
        )
    }

    fn solve_phase(
        &self,
        input: &StageInput,
        phase: Phase,
        before: Array1<f64>,
        reference_before: &str,
        reference_after: &str,
    ) -> PcddfResult<PhaseResult> {
        let efficiency = self.calculate_removal_efficiency(
            input.reference.column(reference_before)?,
            input.reference.column(reference_after)?,
        );
        let efficiency = input.adjustment.apply(&efficiency, phase)?;

        let conc_before = &before * self.parameters.conc_in;
        let conc_after = (1.0 - &efficiency) * &conc_before;
        Ok(PhaseResult {
            before,
            efficiency,
            conc_before,
            conc_after,
        })
    }
}

#[typetag::serde]
impl Device for PartitioningDevice {
    fn name(&self) -> &str {
        &self.name
    }

    fn mode(&self) -> &'static str {
        "partitioning"
    }

    fn requires_vapor_pressure(&self) -> bool {
        true
    }

    fn adjust(&self) -> Option<&AdjustmentConfig> {
        self.adjust.as_ref()
    }

    fn describe(&self) -> Vec<String> {
        let p = &self.parameters;
        let mut lines = vec![
            format!(
                "temperature={} degC, ref_temperature={} degC",
                p.temperature, p.ref_temperature
            ),
            format!("conc_in={} ng/Nm3, conc_out={} ng/Nm3", p.conc_in, p.conc_out),
            format!(
                "gas_fraction={}",
                match p.gas_fraction {
                    GasFractionPolicy::Empirical => "empirical",
                    GasFractionPolicy::Regression => "regression",
                }
            ),
        ];
        if let Some(adjust) = &self.adjust {
            lines.push(adjustment_comment(adjust));
        }
        lines
    }

    fn solve(&self, input: &StageInput) -> PcddfResult<Table> {
        let gas_fraction = self.calculate_gas_fraction(input)?;

        let gas = self.solve_phase(
            input,
            Phase::Gas,
            input.profile * &gas_fraction,
            BEFORE_GAS,
            AFTER_GAS,
        )?;
        let particulate = self.solve_phase(
            input,
            Phase::Particulate,
            input.profile * &(1.0 - &gas_fraction),
            BEFORE_PARTICULATE,
            AFTER_PARTICULATE,
        )?;

        // Normalised over every congener and both phases at once
        let total_after = nan_sum(&gas.conc_after) + nan_sum(&particulate.conc_after);
        debug!(
            "{}: total concentration after device {} ng/Nm3",
            self.name, total_after
        );

        let efficiency_total = 1.0
            - &(&gas.conc_after + &particulate.conc_after)
                / &(&gas.conc_before + &particulate.conc_before);
        let after_gas = &gas.conc_after / total_after;
        let after_particulate = &particulate.conc_after / total_after;
        let result = &after_gas + &after_particulate;

        Ok(input
            .output_table()
            .with_column(GAS_FRACTION, gas_fraction)
            .with_column(BEFORE_GAS, gas.before)
            .with_column(BEFORE_PARTICULATE, particulate.before)
            .with_column(BEFORE_TOTAL, input.profile.clone())
            .with_column(REMOVAL_EFFICIENCY_GAS, gas.efficiency)
            .with_column(REMOVAL_EFFICIENCY_PARTICULATE, particulate.efficiency)
            .with_column(REMOVAL_EFFICIENCY_TOTAL, efficiency_total)
            .with_column(AFTER_GAS, after_gas)
            .with_column(AFTER_PARTICULATE, after_particulate)
            .with_column(input.result_column, result))
    }
}

pub(crate) fn adjustment_comment(adjust: &AdjustmentConfig) -> String {
    let phases: Vec<&str> = adjust.phases.iter().map(|p| p.as_str()).collect();
    format!(
        "adjusted phases: {} from {}",
        phases.join(" "),
        adjust.factors_path.display()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::adjustment::Adjustment;
    use crate::components::vapor_pressure::VaporPressure;
    use is_close::is_close;
    use ndarray::array;

    fn congeners() -> Vec<String> {
        vec!["A".to_string(), "B".to_string()]
    }

    fn parameters(policy: GasFractionPolicy) -> PartitioningParameters {
        PartitioningParameters {
            temperature: 226.85,
            ref_temperature: 126.85,
            conc_in: 2.0,
            conc_out: 1.0,
            gas_fraction: policy,
        }
    }

    fn reference() -> Table {
        Table::new("Congener", congeners())
            .with_column(BEFORE_GAS, array![0.3, 0.1])
            .with_column(BEFORE_PARTICULATE, array![0.2, 0.4])
            .with_column(AFTER_GAS, array![0.3, 0.2])
            .with_column(AFTER_PARTICULATE, array![0.1, 0.4])
    }

    fn vapor_pressure() -> VaporPressure {
        // 500 K operating temperature: vp = [1, 0.1], ln(vp) = [0, -ln 10]
        VaporPressure::from_coefficients(congeners(), array![1000.0, 1500.0], array![2.0, 2.0])
            .unwrap()
    }

    fn solve(device: &PartitioningDevice, profile: &Array1<f64>, adjustment: &Adjustment) -> Table {
        let congeners = congeners();
        let reference = reference();
        let vapor_pressure = vapor_pressure();
        let input = StageInput {
            congeners: &congeners,
            profile,
            reference: &reference,
            vapor_pressure: Some(&vapor_pressure),
            adjustment,
            index_label: "Congener",
            result_column: "After (Total)",
        };
        device.solve(&input).unwrap()
    }

    #[test]
    fn test_removal_efficiency_scaled_by_bulk_concentrations() {
        let device = PartitioningDevice::from_parameters(
            "ESP",
            parameters(GasFractionPolicy::Empirical),
            None,
        );
        let eff = device.calculate_removal_efficiency(&array![0.3, 0.2], &array![0.3, 0.1]);
        // 1 - 0.3 * 1 / (0.3 * 2), 1 - 0.1 * 1 / (0.2 * 2)
        assert!(is_close!(eff[0], 0.5));
        assert!(is_close!(eff[1], 0.75));
    }

    #[test]
    fn test_empirical_partitioning() {
        let device = PartitioningDevice::from_parameters(
            "ESP",
            parameters(GasFractionPolicy::Empirical),
            None,
        );
        let profile = array![0.6, 0.4];
        let output = solve(&device, &profile, &Adjustment::none());

        let gf = output.column(GAS_FRACTION).unwrap();
        assert!(is_close!(gf[0], 0.3491));
        assert!(is_close!(gf[1], 0.3491 - 0.0407 * 10f64.ln()));

        // Phase split conserves the incoming profile
        let before_gas = output.column(BEFORE_GAS).unwrap();
        let before_particulate = output.column(BEFORE_PARTICULATE).unwrap();
        for i in 0..2 {
            assert!(is_close!(before_gas[i] + before_particulate[i], profile[i]));
        }

        // Removal efficiencies from the reference data
        let eff_gas = output.column(REMOVAL_EFFICIENCY_GAS).unwrap();
        let eff_particulate = output.column(REMOVAL_EFFICIENCY_PARTICULATE).unwrap();
        assert!(is_close!(eff_gas[0], 0.5));
        assert!(eff_gas[1].abs() < 1e-12);
        assert!(is_close!(eff_particulate[0], 0.75));
        assert!(is_close!(eff_particulate[1], 0.5));

        // Hand-computed absolute concentrations after the device
        let conc_after = [
            0.5 * 2.0 * before_gas[0],
            1.0 * 2.0 * before_gas[1],
            0.25 * 2.0 * before_particulate[0],
            0.5 * 2.0 * before_particulate[1],
        ];
        let total: f64 = conc_after.iter().sum();
        let after_gas = output.column(AFTER_GAS).unwrap();
        let after_particulate = output.column(AFTER_PARTICULATE).unwrap();
        assert!(is_close!(after_gas[0], conc_after[0] / total));
        assert!(is_close!(after_gas[1], conc_after[1] / total));
        assert!(is_close!(after_particulate[0], conc_after[2] / total));
        assert!(is_close!(after_particulate[1], conc_after[3] / total));

        let result = output.column("After (Total)").unwrap();
        assert!(is_close!(result.sum(), 1.0));
        assert!(is_close!(result[0], after_gas[0] + after_particulate[0]));
    }

    #[test]
    fn test_total_removal_efficiency() {
        let device = PartitioningDevice::from_parameters(
            "ESP",
            parameters(GasFractionPolicy::Empirical),
            None,
        );
        let output = solve(&device, &array![0.6, 0.4], &Adjustment::none());

        let before_gas = output.column(BEFORE_GAS).unwrap();
        let before_particulate = output.column(BEFORE_PARTICULATE).unwrap();
        let total = output.column(REMOVAL_EFFICIENCY_TOTAL).unwrap();
        let expected = 1.0 - (0.5 * before_gas[0] + 0.25 * before_particulate[0]) / 0.6;
        assert!(is_close!(total[0], expected));
    }

    #[test]
    fn test_regression_partitioning_is_bounded() {
        let device = PartitioningDevice::from_parameters(
            "ESP",
            parameters(GasFractionPolicy::Regression),
            None,
        );
        let output = solve(&device, &array![0.6, 0.4], &Adjustment::none());

        let gf = output.column(GAS_FRACTION).unwrap();
        assert!(gf.iter().all(|g| (0.0..=1.0).contains(g)));
        let result = output.column("After (Total)").unwrap();
        assert!(is_close!(result.sum(), 1.0));
    }

    #[test]
    fn test_adjustment_applies_to_listed_phase_only() {
        let device = PartitioningDevice::from_parameters(
            "ESP",
            parameters(GasFractionPolicy::Empirical),
            None,
        );
        let factors = Table::new("Congener", congeners())
            .with_column("particulate", array![0.5, 0.5])
            .with_column("gas", array![10.0, 10.0]);
        let adjustment = Adjustment::new(vec![Phase::Particulate], factors);
        let output = solve(&device, &array![0.6, 0.4], &adjustment);

        let eff_gas = output.column(REMOVAL_EFFICIENCY_GAS).unwrap();
        let eff_particulate = output.column(REMOVAL_EFFICIENCY_PARTICULATE).unwrap();
        assert!(is_close!(eff_gas[0], 0.5));
        assert!(is_close!(eff_particulate[0], 0.375));
        assert!(is_close!(eff_particulate[1], 0.25));
    }

    #[test]
    fn test_missing_vapor_pressure() {
        let device = PartitioningDevice::from_parameters(
            "ESP",
            parameters(GasFractionPolicy::Empirical),
            None,
        );
        let congeners = congeners();
        let reference = reference();
        let profile = array![0.6, 0.4];
        let adjustment = Adjustment::none();
        let input = StageInput {
            congeners: &congeners,
            profile: &profile,
            reference: &reference,
            vapor_pressure: None,
            adjustment: &adjustment,
            index_label: "Congener",
            result_column: "After (Total)",
        };
        assert!(matches!(
            device.solve(&input),
            Err(PcddfError::MissingReferenceData(_))
        ));
    }

    #[test]
    fn test_serialization() {
        let device: Box<dyn Device> = Box::new(PartitioningDevice::from_parameters(
            "ESP",
            parameters(GasFractionPolicy::Regression),
            None,
        ));
        let json = serde_json::to_string(&device).unwrap();
        let restored: Box<dyn Device> = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.name(), "ESP");
        assert_eq!(restored.mode(), "partitioning");
    }
}
