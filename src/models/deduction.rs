//! Calculation result models.
//!
//! This module contains [`DeductionBreakdown`], the figures the payroll-period
//! workflow persists for one pay event, and [`PayrollCalculation`], which adds
//! the per-band PAYE charges and an audit trail explaining each figure.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Money;

/// The statutory deductions for one pay event.
///
/// Invariants: `net_pay = gross_pay - total_employee_deductions` and
/// `total_employee_deductions = paye_net + nssf_employee + nhdf + sha`.
/// Every amount is non-negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductionBreakdown {
    /// The rule set version the figures were computed under.
    pub rule_set_version: u32,
    /// Gross pay for the period.
    pub gross_pay: Money,
    /// Pay subject to PAYE after the taxable-pay policy.
    pub taxable_pay: Money,
    /// PAYE before relief.
    pub paye_gross: Money,
    /// Personal relief actually applied (never more than `paye_gross`).
    pub personal_relief_applied: Money,
    /// PAYE after relief.
    pub paye_net: Money,
    /// Employee NSSF contribution.
    pub nssf_employee: Money,
    /// Employer NSSF contribution.
    pub nssf_employer: Money,
    /// Housing levy.
    pub nhdf: Money,
    /// Health insurance levy.
    pub sha: Money,
    /// Sum of all deductions taken from the employee.
    pub total_employee_deductions: Money,
    /// Take-home pay.
    pub net_pay: Money,
    /// Gross pay plus the employer's NSSF contribution.
    pub employer_cost: Money,
}

/// The PAYE charged inside one band.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandCharge {
    /// The band's label.
    pub label: String,
    /// The band's rate.
    pub rate: Decimal,
    /// How much taxable pay fell inside the band.
    pub taxed_amount: Money,
    /// Unrounded tax on `taxed_amount`, in major units.
    pub tax: Decimal,
}

/// A single step in the audit trace recording a calculation decision.
///
/// Each step captures the input, output, and reasoning for a rule application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStep {
    /// The sequential step number.
    pub step_number: u32,
    /// The unique identifier of the rule that was applied.
    pub rule_id: String,
    /// The human-readable name of the rule.
    pub rule_name: String,
    /// The input data for this step.
    pub input: serde_json::Value,
    /// The output data from this step.
    pub output: serde_json::Value,
    /// Human-readable explanation of the decision.
    pub reasoning: String,
}

/// A breakdown together with the trail that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollCalculation {
    /// The computed figures.
    pub breakdown: DeductionBreakdown,
    /// PAYE charged per band, in band order.
    pub band_charges: Vec<BandCharge>,
    /// Every rule applied, in calculation order.
    pub audit_steps: Vec<AuditStep>,
}
