//! Numerical models of PCDD/F emissions from waste incineration
//!
//! * [`components::ProfileModel`] follows the congener profile through a chain of
//!   abatement devices.
//! * [`components::QuantityModel`] estimates the yearly stack emission from
//!   combustion kinetics.

pub mod components;
pub mod parameters;
