//! Statutory payroll engine
//!
//! This crate computes Kenyan statutory deductions (PAYE with personal
//! relief, tiered NSSF, and the NHDF and SHA levies) from versioned,
//! per-organization rule sets, and serves the rule-administration API.

#![warn(missing_docs)]

pub mod api;
pub mod calculation;
pub mod config;
pub mod error;
pub mod models;
pub mod store;
