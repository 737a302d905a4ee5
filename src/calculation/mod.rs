//! Calculation logic for the statutory payroll engine.
//!
//! This module contains the pure calculation functions: progressive PAYE
//! over tax bands with personal relief, tiered NSSF contributions, flat
//! NHDF and SHA levies, the taxable-pay policy, and the net pay calculation
//! that composes them in a fixed order.

mod contributions;
mod payroll;
mod tax_bands;
mod taxable_pay;

pub use contributions::{
    ContributionResult, ContributionSide, Levy, LevyResult, TierLimits, calculate_flat_levy,
    calculate_tiered_contribution,
};
pub use payroll::{compute_payroll, compute_payroll_with_audit};
pub use tax_bands::{PayeResult, calculate_paye};
pub use taxable_pay::TaxablePayPolicy;
