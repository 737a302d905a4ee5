//! Core data models for the statutory payroll engine.
//!
//! This module contains all the domain models used throughout the engine.

mod deduction;
mod money;
mod rule_set;

pub use deduction::{AuditStep, BandCharge, DeductionBreakdown, PayrollCalculation};
pub use money::{MAX_MINOR_UNITS, Money};
pub use rule_set::{
    BandLimit, Editor, MAX_COMBINED_EMPLOYEE_RATE, RuleSet, RuleSetDelta, StatutoryParameters,
    TaxBand, TierRates,
};
