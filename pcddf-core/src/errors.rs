use std::path::PathBuf;
use thiserror::Error;

/// Error type for invalid configuration, data or I/O.
#[derive(Error, Debug)]
pub enum PcddfError {
    #[error("Missing keys {keys:?} in {section} or their values are absent")]
    MissingKeys { section: String, keys: Vec<String> },
    #[error("Invalid phases {0:?} in adjustment. Expected any of gas, particulate, total")]
    InvalidPhases(Vec<String>),
    #[error("Invalid value {value:?} for {key}. Expected one of {expected:?}")]
    InvalidValue {
        key: String,
        value: String,
        expected: Vec<String>,
    },
    #[error("Unknown configuration section: {0}")]
    UnknownSection(String),
    #[error("Column {column:?} not found in {table}")]
    MissingColumn { column: String, table: String },
    #[error("Index label {expected:?} not found in header of {table}")]
    MissingIndex { expected: String, table: String },
    #[error("Could not parse {value:?} in column {column:?} of {table} as a number")]
    InvalidNumber {
        value: String,
        column: String,
        table: String,
    },
    #[error("Index value {0:?} is not a valid year")]
    InvalidIndex(String),
    #[error("Vapour pressure of {congener} is not positive at {temperature} K")]
    NonPositiveVaporPressure { congener: String, temperature: f64 },
    #[error("Expected one {column:?} coefficient per congener ({expected}), got {found}")]
    CoefficientCount {
        column: String,
        expected: usize,
        found: usize,
    },
    #[error("Temperature must be above absolute zero. Got {0} K")]
    InvalidTemperature(f64),
    #[error("Linear regression needs at least two distinct finite points, got {0}")]
    InsufficientRegressionData(usize),
    #[error("{0} are required but were not loaded")]
    MissingReferenceData(String),
    #[error("Stage {stage} does not exist. The chain has stages 0..={last}")]
    UnknownStage { stage: usize, last: usize },
    #[error("Could not access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error("Could not parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

impl PcddfError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Convenience type for `Result<T, PcddfError>`.
pub type PcddfResult<T> = Result<T, PcddfError>;
