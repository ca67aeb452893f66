//! Profile model
//!
//! Tracks how the PCDD/F mass is distributed across congeners while the flue gas
//! passes through a chain of abatement devices.
//!
//! Stage 0 is the initial profile read from `input_0.csv`, the sum of its gas and
//! particulate parts. Every following stage $i$ applies device $i$ to the profile
//! of stage $i - 1$ using the reference measurements in `input_<i>.csv`.
//!
//! Stages are handed over in memory. When checkpointing is enabled the output of
//! every stage is also written to `output_<i>.csv` as soon as it is produced,
//! which allows a single stage to be rerun later from the output of its predecessor.

use super::adjustment::Adjustment;
use super::device::{Device, StageInput};
use super::partitioning::{PartitioningDevice, PartitioningParameters};
use super::removal::RemovalEfficiencyDevice;
use super::vapor_pressure::VaporPressure;
use log::{info, warn};
use ndarray::Array1;
use pcddf_core::config::{
    DeviceConfig, DeviceKind, GasFractionPolicy, ProfileModelConfig, DEFAULT_VAPOR_PRESSURE_PATH,
};
use pcddf_core::congeners::congener_keys;
use pcddf_core::errors::{PcddfError, PcddfResult};
use pcddf_core::io::{CsvReader, CsvWriter};
use pcddf_core::table::Table;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Column of the initial profile holding the gas-phase part
pub const GAS: &str = "Gas";
/// Column of the initial profile holding the particulate-phase part
pub const PARTICULATE: &str = "Particulate";

const MODEL_NAME: &str = "PCDD/F profile model";

/// Build a device from its validated configuration.
///
/// Partitioning devices without their own gas fraction policy use `default_policy`.
pub fn build_device(config: &DeviceConfig, default_policy: GasFractionPolicy) -> Box<dyn Device> {
    match config.kind {
        DeviceKind::Partitioning {
            temperature,
            ref_temperature,
            conc_in,
            conc_out,
            gas_fraction,
        } => Box::new(PartitioningDevice::from_parameters(
            &config.name,
            PartitioningParameters {
                temperature,
                ref_temperature,
                conc_in,
                conc_out,
                gas_fraction: gas_fraction.unwrap_or(default_policy),
            },
            config.adjust.clone(),
        )),
        DeviceKind::RemovalEfficiency => Box::new(RemovalEfficiencyDevice::new(
            &config.name,
            config.adjust.clone(),
        )),
    }
}

/// An ordered chain of devices and the locations of their data.
///
/// The model holds no results between runs,
/// so running it twice on the same input files produces identical outputs.
#[derive(Debug, Serialize, Deserialize)]
pub struct ProfileModel {
    data_path: PathBuf,
    output_path: PathBuf,
    index_label: String,
    result_column: String,
    vapor_pressure_path: PathBuf,
    checkpoint: bool,
    devices: Vec<Box<dyn Device>>,
}

impl ProfileModel {
    /// Create a model without any devices.
    ///
    /// Checkpointing is enabled and the vapour pressure coefficients are read from
    /// their default location.
    pub fn new(data_path: &Path, output_path: &Path, index_label: &str, result_column: &str) -> Self {
        Self {
            data_path: data_path.to_path_buf(),
            output_path: output_path.to_path_buf(),
            index_label: index_label.to_string(),
            result_column: result_column.to_string(),
            vapor_pressure_path: PathBuf::from(DEFAULT_VAPOR_PRESSURE_PATH),
            checkpoint: true,
            devices: vec![],
        }
    }

    pub fn from_config(config: &ProfileModelConfig) -> Self {
        let model = Self::new(
            &config.data_path,
            &config.output_path,
            &config.index_label,
            &config.result_column,
        )
        .with_vapor_pressure_path(&config.vapor_pressure_path)
        .with_checkpoint(config.checkpoint);

        config.devices.iter().fold(model, |model, device| {
            model.with_device(build_device(device, config.gas_fraction))
        })
    }

    /// Append a device to the end of the chain
    pub fn with_device(mut self, device: Box<dyn Device>) -> Self {
        self.devices.push(device);
        self
    }

    pub fn with_vapor_pressure_path(mut self, path: &Path) -> Self {
        self.vapor_pressure_path = path.to_path_buf();
        self
    }

    /// Persist every stage as it is produced, rather than only the final stage
    pub fn with_checkpoint(mut self, checkpoint: bool) -> Self {
        self.checkpoint = checkpoint;
        self
    }

    pub fn devices(&self) -> &[Box<dyn Device>] {
        &self.devices
    }

    /// Index of the final stage, equal to the number of devices
    pub fn last_stage(&self) -> usize {
        self.devices.len()
    }

    /// Reference data for `stage`, or the initial profile for stage 0
    pub fn input_path(&self, stage: usize) -> PathBuf {
        self.data_path.join(format!("input_{}.csv", stage))
    }

    pub fn output_path(&self, stage: usize) -> PathBuf {
        self.output_path.join(format!("output_{}.csv", stage))
    }

    fn reader(&self) -> CsvReader {
        CsvReader::new(&self.index_label)
    }

    fn device(&self, stage: usize) -> PcddfResult<&dyn Device> {
        stage
            .checked_sub(1)
            .and_then(|i| self.devices.get(i))
            .map(|device| &**device)
            .ok_or(PcddfError::UnknownStage {
                stage,
                last: self.last_stage(),
            })
    }

    /// Read a congener table and conform it to the canonical congener order
    fn read_congener_table(&self, path: &Path) -> PcddfResult<Table> {
        let keys = congener_keys();
        let table = self.reader().read_table(path)?;
        let missing = table.missing_keys(&keys);
        if !missing.is_empty() {
            warn!("{} has no rows for {:?}", path.display(), missing);
        }
        Ok(table.reindex(&keys))
    }

    /// Combined gas and particulate profile of stage 0
    pub fn initial_profile(&self) -> PcddfResult<Table> {
        let input = self.read_congener_table(&self.input_path(0))?;
        let gas = input.column(GAS)?;
        let particulate = input.column(PARTICULATE)?;

        Ok(Table::new(&self.index_label, congener_keys())
            .with_column(GAS, gas.clone())
            .with_column(PARTICULATE, particulate.clone())
            .with_column(&self.result_column, gas + particulate))
    }

    /// Vapour pressure coefficients of every congener
    pub fn load_vapor_pressure(&self) -> PcddfResult<VaporPressure> {
        VaporPressure::from_table(&self.read_congener_table(&self.vapor_pressure_path)?)
    }

    /// Apply the device of `stage` to the profile of the previous stage
    pub fn solve_stage(
        &self,
        stage: usize,
        profile: &Array1<f64>,
        vapor_pressure: Option<&VaporPressure>,
    ) -> PcddfResult<Table> {
        let device = self.device(stage)?;
        info!("Stage {}: {} ({})", stage, device.name(), device.mode());

        let reference = self.read_congener_table(&self.input_path(stage))?;
        let adjustment = Adjustment::load(device.adjust(), &self.reader())?;
        let congeners = congener_keys();
        let input = StageInput {
            congeners: &congeners,
            profile,
            reference: &reference,
            vapor_pressure,
            adjustment: &adjustment,
            index_label: &self.index_label,
            result_column: &self.result_column,
        };

        let output = device.solve(&input)?;
        self.warn_undefined(stage, &output)?;
        Ok(output)
    }

    /// Run the whole chain, returning the output of every stage starting with stage 0
    pub fn run(&self) -> PcddfResult<Vec<Table>> {
        let vapor_pressure = if self.devices.iter().any(|d| d.requires_vapor_pressure()) {
            Some(self.load_vapor_pressure()?)
        } else {
            None
        };

        let initial = self.initial_profile()?;
        self.warn_undefined(0, &initial)?;
        if self.checkpoint {
            self.persist(0, &initial)?;
        }

        let mut profile = initial.column(&self.result_column)?.clone();
        let mut stages = vec![initial];
        for stage in 1..=self.last_stage() {
            let output = self.solve_stage(stage, &profile, vapor_pressure.as_ref())?;
            if self.checkpoint {
                self.persist(stage, &output)?;
            }
            profile = output.column(&self.result_column)?.clone();
            stages.push(output);
        }

        if !self.checkpoint {
            if let Some(last) = stages.last() {
                self.persist(self.last_stage(), last)?;
            }
        }
        info!("Finished {} stages", stages.len());
        Ok(stages)
    }

    /// Recompute a single stage from the persisted output of the stage before it.
    ///
    /// The result is written to the output of `stage`, replacing any previous file.
    pub fn run_stage(&self, stage: usize) -> PcddfResult<Table> {
        let output = if stage == 0 {
            self.initial_profile()?
        } else {
            let device = self.device(stage)?;
            let vapor_pressure = if device.requires_vapor_pressure() {
                Some(self.load_vapor_pressure()?)
            } else {
                None
            };
            let previous = self.read_checkpoint(stage - 1)?;
            self.solve_stage(
                stage,
                previous.column(&self.result_column)?,
                vapor_pressure.as_ref(),
            )?
        };
        self.persist(stage, &output)?;
        Ok(output)
    }

    /// Read back the persisted output of `stage`
    pub fn read_checkpoint(&self, stage: usize) -> PcddfResult<Table> {
        self.read_congener_table(&self.output_path(stage))
    }

    /// Comment lines written above the output of `stage`
    fn comments(&self, stage: usize) -> Vec<String> {
        let mut comments = vec![MODEL_NAME.to_string()];
        match self.device(stage) {
            Ok(device) => {
                comments.push(format!(
                    "Stage {}: {} ({})",
                    stage,
                    device.name(),
                    device.mode()
                ));
                comments.extend(device.describe());
            }
            Err(_) => comments.push(format!("Stage {}: initial profile", stage)),
        }
        comments
    }

    fn persist(&self, stage: usize, table: &Table) -> PcddfResult<()> {
        fs::create_dir_all(&self.output_path)
            .map_err(|e| PcddfError::io(self.output_path.clone(), e))?;
        let path = self.output_path(stage);
        CsvWriter::new(self.comments(stage)).write_table(table, &path)?;
        info!("Stage {}: wrote {}", stage, path.display());
        Ok(())
    }

    fn warn_undefined(&self, stage: usize, output: &Table) -> PcddfResult<()> {
        let result = output.column(&self.result_column)?;
        let undefined: Vec<&str> = output
            .index()
            .iter()
            .zip(result.iter())
            .filter(|(_, value)| value.is_nan())
            .map(|(key, _)| key.as_str())
            .collect();
        if !undefined.is_empty() {
            warn!("Stage {}: undefined result for {:?}", stage, undefined);
        }
        Ok(())
    }
}
