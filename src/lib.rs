//! Emission estimates for PCDD/Fs released from industrial waste incineration
//!
//! The models live in [`pcddf_components`] and the shared plumbing they are built on
//! (configuration, congener registry, tables and CSV files) in [`pcddf_core`].
//! Both are re-exported here.

pub use pcddf_components::{components, parameters};
pub use pcddf_core::{config, congeners, errors, io, table, utils};
