//! Model configuration.
//!
//! Configuration is read from a TOML file with one table per model:
//!
//! ```toml
//! [profile_model]
//! data_path = "data/profile_model"
//! output_path = "output/profile_model"
//! index_label = "Congener"
//! result_column = "After (Total)"
//! gas_fraction = "regression"
//!
//! [[profile_model.devices]]
//! name = "ESP"
//! partition = true
//! temperature = 290.0
//! ref_temperature = 290.0
//! conc_in = 58.966
//! conc_out = 134.08
//! adjust = { phase = ["particulate"], factors_path = "params/esp_adjust.csv" }
//!
//! [[profile_model.devices]]
//! name = "Wet scrubber"
//! partition = false
//! ```
//!
//! The file is first parsed into raw records where every key is optional.
//! Validation then reports every missing key of a section at once,
//! before any numerical work is started.
//! A `NaN` number counts as an absent value.

use crate::errors::{PcddfError, PcddfResult};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Offset between degrees Celsius and Kelvin
pub const CELSIUS_TO_KELVIN: f64 = 273.15;

/// Default location of the vapour pressure coefficients
pub const DEFAULT_VAPOR_PRESSURE_PATH: &str = "params/vapor_pressure.csv";

/// How the gas-phase fraction of each congener is estimated from its vapour pressure
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GasFractionPolicy {
    /// Fixed empirical correlation with the log of the vapour pressure
    #[default]
    Empirical,
    /// Line fitted against the reference gas fractions of the device
    Regression,
}

impl GasFractionPolicy {
    pub const NAMES: [&'static str; 2] = ["empirical", "regression"];
}

impl FromStr for GasFractionPolicy {
    type Err = PcddfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "empirical" => Ok(Self::Empirical),
            "regression" => Ok(Self::Regression),
            _ => Err(PcddfError::InvalidValue {
                key: "gas_fraction".to_string(),
                value: s.to_string(),
                expected: Self::NAMES.iter().map(|n| n.to_string()).collect(),
            }),
        }
    }
}

/// Physical phase that a removal efficiency refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Gas,
    Particulate,
    Total,
}

impl Phase {
    pub const ALL: [Phase; 3] = [Phase::Gas, Phase::Particulate, Phase::Total];

    /// Name of the phase, which is also the name of its column in adjustment factor tables
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Gas => "gas",
            Phase::Particulate => "particulate",
            Phase::Total => "total",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = PcddfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Phase::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| PcddfError::InvalidPhases(vec![s.to_string()]))
    }
}

/// Multiplicative correction of removal efficiencies for a set of phases
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjustmentConfig {
    pub phases: Vec<Phase>,
    pub factors_path: PathBuf,
}

/// Operating parameters that select how a device transforms the profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DeviceKind {
    /// Removal efficiency differs between gas and particulate phase
    Partitioning {
        /// Operating temperature (°C)
        temperature: f64,
        /// Temperature at which the reference data were measured (°C)
        ref_temperature: f64,
        /// Inlet bulk PCDD/F concentration (ng/Nm3)
        conc_in: f64,
        /// Outlet bulk PCDD/F concentration (ng/Nm3)
        conc_out: f64,
        /// Overrides the model-wide policy when set
        gas_fraction: Option<GasFractionPolicy>,
    },
    /// A single aggregate removal efficiency per congener
    RemovalEfficiency,
}

/// A validated device of the treatment chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceConfig {
    pub name: String,
    pub kind: DeviceKind,
    pub adjust: Option<AdjustmentConfig>,
}

impl DeviceConfig {
    pub fn is_partitioning(&self) -> bool {
        matches!(self.kind, DeviceKind::Partitioning { .. })
    }
}

/// Validated configuration of the profile model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileModelConfig {
    /// Directory holding `input_<i>.csv` files
    pub data_path: PathBuf,
    /// Directory receiving `output_<i>.csv` files
    pub output_path: PathBuf,
    pub index_label: String,
    /// Column of each stage output carried forward to the next stage
    pub result_column: String,
    pub vapor_pressure_path: PathBuf,
    pub gas_fraction: GasFractionPolicy,
    /// Persist the output of every stage as it is produced
    pub checkpoint: bool,
    pub devices: Vec<DeviceConfig>,
}

/// Removal of PCDD/Fs by a device downstream of the stack emission calculation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemovalStep {
    pub device: String,
    pub efficiency: f64,
    /// First year the device is in operation. Always in operation if not set.
    pub since_year: Option<i32>,
}

/// Validated configuration of the quantity model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantityModelConfig {
    pub data_path: PathBuf,
    pub output_path: PathBuf,
    pub index_label: String,
    pub result_column: String,
    /// Combustion temperature (°C)
    pub combustion_temperature: f64,
    /// Residence time of the flue gas (s)
    pub residence_time: f64,
    /// Annual hours of operation (h)
    pub yearly_operation_hours: f64,
    /// Congener whose formation kinetics are evaluated
    pub congener: String,
    /// Fraction of that congener in total PCDD/Fs
    pub congener_fraction: f64,
    pub removal_efficiencies: Vec<RemovalStep>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawAdjustmentConfig {
    pub phase: Option<Vec<String>>,
    pub factors_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawDeviceConfig {
    pub name: Option<String>,
    pub partition: Option<bool>,
    pub temperature: Option<f64>,
    pub ref_temperature: Option<f64>,
    pub conc_in: Option<f64>,
    pub conc_out: Option<f64>,
    pub gas_fraction: Option<String>,
    pub adjust: Option<RawAdjustmentConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawProfileModelConfig {
    pub data_path: Option<PathBuf>,
    pub output_path: Option<PathBuf>,
    pub index_label: Option<String>,
    pub result_column: Option<String>,
    pub vapor_pressure_path: Option<PathBuf>,
    pub gas_fraction: Option<String>,
    pub checkpoint: Option<bool>,
    pub devices: Option<Vec<RawDeviceConfig>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawRemovalStep {
    pub device: Option<String>,
    pub efficiency: Option<f64>,
    pub since_year: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawQuantityModelConfig {
    pub data_path: Option<PathBuf>,
    pub output_path: Option<PathBuf>,
    pub index_label: Option<String>,
    pub result_column: Option<String>,
    pub combustion_temperature: Option<f64>,
    pub residence_time: Option<f64>,
    pub yearly_operation_hours: Option<f64>,
    pub congener: Option<String>,
    pub congener_fraction: Option<f64>,
    pub removal_efficiencies: Option<Vec<RawRemovalStep>>,
}

/// Contents of a configuration file before validation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    pub profile_model: Option<RawProfileModelConfig>,
    pub quantity_model: Option<RawQuantityModelConfig>,
}

impl ConfigFile {
    /// Section names understood by [`ConfigFile::validate`]
    pub const SECTIONS: [&'static str; 2] = ["profile_model", "quantity_model"];

    pub fn from_path(path: &Path) -> PcddfResult<Self> {
        let contents = fs::read_to_string(path).map_err(|e| PcddfError::io(path, e))?;
        debug!("Loaded configuration from {}", path.display());
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> PcddfResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Validate a single section of the configuration by name
    pub fn validate(&self, section: &str) -> PcddfResult<()> {
        match section {
            "profile_model" => self.profile_model().map(|_| ()),
            "quantity_model" => self.quantity_model().map(|_| ()),
            _ => Err(PcddfError::UnknownSection(section.to_string())),
        }
    }

    pub fn profile_model(&self) -> PcddfResult<ProfileModelConfig> {
        self.profile_model
            .as_ref()
            .ok_or_else(|| missing("configuration", &["profile_model"]))?
            .validate()
    }

    pub fn quantity_model(&self) -> PcddfResult<QuantityModelConfig> {
        self.quantity_model
            .as_ref()
            .ok_or_else(|| missing("configuration", &["quantity_model"]))?
            .validate()
    }
}

impl RawProfileModelConfig {
    pub fn validate(&self) -> PcddfResult<ProfileModelConfig> {
        let section = "profile_model";
        has_required_keys(
            section,
            &[
                ("data_path", self.data_path.is_some()),
                ("output_path", self.output_path.is_some()),
                ("index_label", self.index_label.is_some()),
                ("result_column", self.result_column.is_some()),
                ("devices", self.devices.is_some()),
            ],
        )?;

        let gas_fraction = match &self.gas_fraction {
            Some(policy) => policy.parse()?,
            None => GasFractionPolicy::default(),
        };

        let devices = required(self.devices.as_ref(), section, "devices")?
            .iter()
            .enumerate()
            .map(|(i, device)| device.validate(i + 1))
            .collect::<PcddfResult<Vec<_>>>()?;

        Ok(ProfileModelConfig {
            data_path: required(self.data_path.clone(), section, "data_path")?,
            output_path: required(self.output_path.clone(), section, "output_path")?,
            index_label: required(self.index_label.clone(), section, "index_label")?,
            result_column: required(self.result_column.clone(), section, "result_column")?,
            vapor_pressure_path: self
                .vapor_pressure_path
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_VAPOR_PRESSURE_PATH)),
            gas_fraction,
            checkpoint: self.checkpoint.unwrap_or(true),
            devices,
        })
    }
}

impl RawDeviceConfig {
    /// Validate the configuration of the device at (1-based) `stage`
    pub fn validate(&self, stage: usize) -> PcddfResult<DeviceConfig> {
        let section = format!("profile_model.devices[{}]", stage - 1);
        has_required_keys(&section, &[("partition", self.partition.is_some())])?;

        let kind = if required(self.partition, &section, "partition")? {
            has_required_keys(
                &section,
                &[
                    ("temperature", is_present(self.temperature)),
                    ("ref_temperature", is_present(self.ref_temperature)),
                    ("conc_in", is_present(self.conc_in)),
                    ("conc_out", is_present(self.conc_out)),
                ],
            )?;
            DeviceKind::Partitioning {
                temperature: required(self.temperature, &section, "temperature")?,
                ref_temperature: required(self.ref_temperature, &section, "ref_temperature")?,
                conc_in: required(self.conc_in, &section, "conc_in")?,
                conc_out: required(self.conc_out, &section, "conc_out")?,
                gas_fraction: self
                    .gas_fraction
                    .as_deref()
                    .map(GasFractionPolicy::from_str)
                    .transpose()?,
            }
        } else {
            DeviceKind::RemovalEfficiency
        };

        let adjust = self
            .adjust
            .as_ref()
            .map(|adjust| adjust.validate(&format!("{}.adjust", section)))
            .transpose()?;

        Ok(DeviceConfig {
            name: self
                .name
                .clone()
                .unwrap_or_else(|| format!("device_{}", stage)),
            kind,
            adjust,
        })
    }
}

impl RawAdjustmentConfig {
    pub fn validate(&self, section: &str) -> PcddfResult<AdjustmentConfig> {
        has_required_keys(
            section,
            &[
                ("phase", self.phase.is_some()),
                ("factors_path", self.factors_path.is_some()),
            ],
        )?;

        let names = required(self.phase.as_ref(), section, "phase")?;
        let invalid: Vec<String> = names
            .iter()
            .filter(|name| name.parse::<Phase>().is_err())
            .cloned()
            .collect();
        if !invalid.is_empty() {
            return Err(PcddfError::InvalidPhases(invalid));
        }

        Ok(AdjustmentConfig {
            phases: names
                .iter()
                .map(|name| name.parse())
                .collect::<PcddfResult<Vec<Phase>>>()?,
            factors_path: required(self.factors_path.clone(), section, "factors_path")?,
        })
    }
}

impl RawQuantityModelConfig {
    pub fn validate(&self) -> PcddfResult<QuantityModelConfig> {
        let section = "quantity_model";
        has_required_keys(
            section,
            &[
                ("data_path", self.data_path.is_some()),
                ("output_path", self.output_path.is_some()),
                ("index_label", self.index_label.is_some()),
                ("result_column", self.result_column.is_some()),
                (
                    "combustion_temperature",
                    is_present(self.combustion_temperature),
                ),
                ("residence_time", is_present(self.residence_time)),
                (
                    "yearly_operation_hours",
                    is_present(self.yearly_operation_hours),
                ),
                ("congener", self.congener.is_some()),
                ("congener_fraction", is_present(self.congener_fraction)),
                ("removal_efficiencies", self.removal_efficiencies.is_some()),
            ],
        )?;

        let removal_efficiencies = required(
            self.removal_efficiencies.as_ref(),
            section,
            "removal_efficiencies",
        )?
        .iter()
        .enumerate()
        .map(|(i, step)| step.validate(&format!("{}.removal_efficiencies[{}]", section, i)))
        .collect::<PcddfResult<Vec<_>>>()?;

        Ok(QuantityModelConfig {
            data_path: required(self.data_path.clone(), section, "data_path")?,
            output_path: required(self.output_path.clone(), section, "output_path")?,
            index_label: required(self.index_label.clone(), section, "index_label")?,
            result_column: required(self.result_column.clone(), section, "result_column")?,
            combustion_temperature: required(
                self.combustion_temperature,
                section,
                "combustion_temperature",
            )?,
            residence_time: required(self.residence_time, section, "residence_time")?,
            yearly_operation_hours: required(
                self.yearly_operation_hours,
                section,
                "yearly_operation_hours",
            )?,
            congener: required(self.congener.clone(), section, "congener")?,
            congener_fraction: required(self.congener_fraction, section, "congener_fraction")?,
            removal_efficiencies,
        })
    }
}

impl RawRemovalStep {
    pub fn validate(&self, section: &str) -> PcddfResult<RemovalStep> {
        has_required_keys(
            section,
            &[
                ("device", self.device.is_some()),
                ("efficiency", is_present(self.efficiency)),
            ],
        )?;
        Ok(RemovalStep {
            device: required(self.device.clone(), section, "device")?,
            efficiency: required(self.efficiency, section, "efficiency")?,
            since_year: self.since_year,
        })
    }
}

/// Fail with every key whose value is absent
fn has_required_keys(section: &str, keys: &[(&str, bool)]) -> PcddfResult<()> {
    let missing_keys: Vec<&str> = keys
        .iter()
        .filter(|(_, present)| !present)
        .map(|(key, _)| *key)
        .collect();
    if missing_keys.is_empty() {
        Ok(())
    } else {
        Err(missing(section, &missing_keys))
    }
}

fn missing(section: &str, keys: &[&str]) -> PcddfError {
    PcddfError::MissingKeys {
        section: section.to_string(),
        keys: keys.iter().map(|k| k.to_string()).collect(),
    }
}

fn required<T>(value: Option<T>, section: &str, key: &str) -> PcddfResult<T> {
    value.ok_or_else(|| missing(section, &[key]))
}

fn is_present(value: Option<f64>) -> bool {
    value.is_some_and(|v| !v.is_nan())
}
