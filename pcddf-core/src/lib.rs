//! Shared plumbing for the PCDD/F emission models.
//!
//! - [`congeners`]: canonical congener registry
//! - [`table`]: keyed tables with reindexing onto the canonical order
//! - [`io`]: CSV reading and writing with comment headers
//! - [`config`]: TOML configuration and validation
//! - [`utils`]: numerical helpers

pub mod config;
pub mod congeners;
pub mod io;
pub mod table;
pub mod utils;

pub mod errors;
