//! Model parameters
//!
//! Each parameter struct provides defaults matching the published correlations the
//! models were calibrated with. All structs deserialise with `#[serde(default)]`
//! so a partial parameter set only overrides the given values.

mod gas_fraction;
mod kinetics;

pub use gas_fraction::GasFractionParameters;
pub use kinetics::KineticParameters;
