//! Quantity model
//!
//! Yearly stack emission of PCDD/Fs from the formation and decomposition kinetics in
//! the furnace of an incinerator.
//!
//! # What This Component Does
//!
//! 1. Derives the oxygen ratio of each year from the air and waste inputs and the
//!    elemental composition of the waste:
//!    $$r_O = \frac{23 m_{air} + 100 f_O m_{waste}}{3200 m_{waste} (f_C/12 + f_H/4 + f_S/32)}$$
//! 2. Evaluates the saturating effects of chlorine and of catalytic metals,
//!    $E_{Cl} = f_{Cl} / (f_{Cl} + K_{Cl})$ and $E_{metal} = f_{metal} / (f_{metal} + K_{metal})$.
//! 3. Solves the first order formation/decomposition balance over the residence time $t$:
//!    $$\dot{m} = \frac{k_f E_{Cl} E_{metal}}{k_d} \left(1 - e^{-k_d r_O t}\right)$$
//! 4. Scales the rate of the selected congener to the total PCDD/F released per year.
//! 5. Applies the removal efficiency of every device in operation that year.

use crate::parameters::KineticParameters;
use log::{debug, info};
use ndarray::Array1;
use pcddf_core::config::{QuantityModelConfig, RemovalStep, CELSIUS_TO_KELVIN};
use pcddf_core::errors::{PcddfError, PcddfResult};
use pcddf_core::io::{CsvReader, CsvWriter};
use pcddf_core::table::Table;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Input column: combustion air (kg/yr)
pub const M_AIR: &str = "m_air";
/// Input column: waste incinerated (kg/yr)
pub const M_WASTE: &str = "m_waste";
pub const F_O: &str = "f_O";
pub const F_C: &str = "f_C";
pub const F_H: &str = "f_H";
pub const F_S: &str = "f_S";
pub const F_CL: &str = "f_Cl";
pub const F_FE: &str = "f_Fe";
pub const F_CU: &str = "f_Cu";

const MODEL_NAME: &str = "PCDD/F quantity model";

/// Yearly stack emission from combustion kinetics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuantityModel {
    data_path: PathBuf,
    output_path: PathBuf,
    index_label: String,
    result_column: String,
    /// Combustion temperature
    /// unit: °C
    combustion_temperature: f64,
    /// Residence time of the flue gas in the combustion zone
    /// unit: s
    residence_time: f64,
    /// unit: h
    yearly_operation_hours: f64,
    congener: String,
    /// Fraction of `congener` in the total PCDD/F emission
    congener_fraction: f64,
    removal_efficiencies: Vec<RemovalStep>,
    kinetics: KineticParameters,
}

impl QuantityModel {
    /// Create the model from its validated configuration.
    ///
    /// # Errors
    /// Fails if no formation kinetics are known for the configured congener.
    pub fn from_config(config: &QuantityModelConfig) -> PcddfResult<Self> {
        let kinetics = KineticParameters::default();
        if kinetics.formation_factor(&config.congener).is_none() {
            return Err(PcddfError::InvalidValue {
                key: "congener".to_string(),
                value: config.congener.clone(),
                expected: KineticParameters::FORMATION_CONGENERS
                    .iter()
                    .map(|c| c.to_string())
                    .collect(),
            });
        }

        Ok(Self {
            data_path: config.data_path.clone(),
            output_path: config.output_path.clone(),
            index_label: config.index_label.clone(),
            result_column: config.result_column.clone(),
            combustion_temperature: config.combustion_temperature,
            residence_time: config.residence_time,
            yearly_operation_hours: config.yearly_operation_hours,
            congener: config.congener.clone(),
            congener_fraction: config.congener_fraction,
            removal_efficiencies: config.removal_efficiencies.clone(),
            kinetics,
        })
    }

    fn temperature(&self) -> f64 {
        self.combustion_temperature + CELSIUS_TO_KELVIN
    }

    fn arrhenius(&self, pre_exponential: f64, activation_energy: f64) -> f64 {
        pre_exponential
            * (-activation_energy / (self.kinetics.gas_constant * self.temperature())).exp()
    }

    /// Formation rate constant of the selected congener
    /// unit: (pg PCDD/F)/(g waste·s)
    pub fn formation_rate_constant(&self) -> f64 {
        let af = self
            .kinetics
            .formation_factor(&self.congener)
            .unwrap_or(f64::NAN);
        self.arrhenius(af, self.kinetics.ef)
    }

    /// Decomposition rate constant
    /// unit: 1/s
    pub fn decomposition_rate_constant(&self) -> f64 {
        self.arrhenius(self.kinetics.ad, self.kinetics.ed)
    }

    /// Ratio of the oxygen supplied to the oxygen needed for complete combustion
    pub fn oxygen_ratio(&self, data: &Table) -> PcddfResult<Array1<f64>> {
        let m_air = data.column(M_AIR)?;
        let m_waste = data.column(M_WASTE)?;
        let demand =
            data.column(F_C)? / 12.0 + &(data.column(F_H)? / 4.0) + &(data.column(F_S)? / 32.0);

        let supplied = m_air * 23.0 + &(data.column(F_O)? * m_waste * 100.0);
        Ok(supplied / &(m_waste * &demand * 3200.0))
    }

    pub fn chlorine_effect(&self, data: &Table) -> PcddfResult<Array1<f64>> {
        Ok(saturation(data.column(F_CL)?, self.kinetics.k_cl))
    }

    pub fn metal_effect(&self, data: &Table) -> PcddfResult<Array1<f64>> {
        let f_metal = data.column(F_FE)? + data.column(F_CU)?;
        Ok(saturation(&f_metal, self.kinetics.k_metal))
    }

    /// Emission rate of the selected congener
    /// unit: (pg PCDD/F)/(g waste)
    pub fn emission_rate(&self, data: &Table) -> PcddfResult<Array1<f64>> {
        let kf = self.formation_rate_constant();
        let kd = self.decomposition_rate_constant();
        debug!("Rate constants at {} K: kf={}, kd={}", self.temperature(), kf, kd);

        let conversion = self
            .oxygen_ratio(data)?
            .mapv(|ratio| 1.0 - (-kd * ratio * self.residence_time).exp());
        Ok(self.chlorine_effect(data)? * &self.metal_effect(data)? * &conversion * (kf / kd))
    }

    /// Total PCDD/F leaving the furnace each year
    /// unit: g
    pub fn furnace_emission(&self, data: &Table) -> PcddfResult<Array1<f64>> {
        let rate = self.emission_rate(data)?;
        Ok(rate * data.column(M_WASTE)? * self.yearly_operation_hours * 3600.0 * 1e-9
            / self.congener_fraction)
    }

    /// Fraction of the furnace emission passing all devices operating in `year`
    pub fn penetration(&self, year: i32) -> f64 {
        self.removal_efficiencies
            .iter()
            .filter(|step| step.since_year.map_or(true, |since| year >= since))
            .map(|step| 1.0 - step.efficiency)
            .product()
    }

    /// Stack emission for every year of `data`
    pub fn solve(&self, data: &Table) -> PcddfResult<Table> {
        let years = data
            .index()
            .iter()
            .map(|year| {
                year.trim()
                    .parse::<i32>()
                    .map_err(|_| PcddfError::InvalidIndex(year.clone()))
            })
            .collect::<PcddfResult<Vec<i32>>>()?;

        let penetration: Array1<f64> = years.iter().map(|year| self.penetration(*year)).collect();
        let stack = self.furnace_emission(data)? * &penetration;

        Ok(Table::new(&self.index_label, data.index().to_vec())
            .with_column(&self.result_column, stack))
    }

    /// Read the yearly inputs, solve and write the results
    pub fn run(&self) -> PcddfResult<Table> {
        let data = CsvReader::new(&self.index_label).read_table(&self.data_path)?;
        info!("Solving quantity model for {} years", data.len());
        let results = self.solve(&data)?;

        if let Some(parent) = self.output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| PcddfError::io(parent, e))?;
        }
        CsvWriter::new(self.comments()).write_table(&results, &self.output_path)?;
        info!("Wrote {}", self.output_path.display());
        Ok(results)
    }

    fn comments(&self) -> Vec<String> {
        let mut comments = vec![
            MODEL_NAME.to_string(),
            format!(
                "combustion_temperature={} degC, residence_time={} s, yearly_operation_hours={} h",
                self.combustion_temperature, self.residence_time, self.yearly_operation_hours
            ),
            format!(
                "congener={}, congener_fraction={}",
                self.congener, self.congener_fraction
            ),
        ];
        comments.extend(self.removal_efficiencies.iter().map(|step| {
            match step.since_year {
                Some(year) => format!("{}: efficiency={} since {}", step.device, step.efficiency, year),
                None => format!("{}: efficiency={}", step.device, step.efficiency),
            }
        }));
        comments
    }
}

/// $f / (f + K)$
fn saturation(fraction: &Array1<f64>, half_saturation: f64) -> Array1<f64> {
    fraction.mapv(|f| f / (f + half_saturation))
}
