//! Taxable pay policies.
//!
//! Which parts of gross pay are exempt from PAYE is decided by the payroll
//! period workflow, not by the engine. The workflow passes its decision in
//! as a [`TaxablePayPolicy`].

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::models::{AuditStep, Money};

/// How taxable pay is derived from gross pay.
///
/// # Example
///
/// ```
/// use payroll_engine::calculation::TaxablePayPolicy;
/// use payroll_engine::models::Money;
///
/// let policy = TaxablePayPolicy::ExcludeNonTaxable { amount: Money::from_whole(5_000) };
/// assert_eq!(policy.taxable_pay(Money::from_whole(50_000)).unwrap(), Money::from_whole(45_000));
/// assert_eq!(
///     TaxablePayPolicy::default().taxable_pay(Money::from_whole(50_000)).unwrap(),
///     Money::from_whole(50_000)
/// );
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TaxablePayPolicy {
    /// All of gross pay is taxable.
    #[default]
    Gross,
    /// Gross pay less a non-taxable amount supplied by the caller.
    ExcludeNonTaxable {
        /// The non-taxable part of gross pay.
        amount: Money,
    },
}

impl TaxablePayPolicy {
    /// Derives taxable pay from gross pay.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the non-taxable amount is negative or
    /// larger than gross pay.
    pub fn taxable_pay(&self, gross_pay: Money) -> EngineResult<Money> {
        match self {
            TaxablePayPolicy::Gross => Ok(gross_pay),
            TaxablePayPolicy::ExcludeNonTaxable { amount } => {
                if amount.is_negative() {
                    return Err(EngineError::invalid_input(
                        "non_taxable_amount",
                        format!("{} must not be negative", amount),
                    ));
                }
                if *amount > gross_pay {
                    return Err(EngineError::invalid_input(
                        "non_taxable_amount",
                        format!("{} exceeds gross pay {}", amount, gross_pay),
                    ));
                }
                Ok(gross_pay - *amount)
            }
        }
    }

    pub(crate) fn audit_step(
        &self,
        gross_pay: Money,
        taxable_pay: Money,
        step_number: u32,
    ) -> AuditStep {
        let (policy, reasoning) = match self {
            TaxablePayPolicy::Gross => (
                "gross",
                format!("All gross pay is taxable: {}", taxable_pay),
            ),
            TaxablePayPolicy::ExcludeNonTaxable { amount } => (
                "exclude_non_taxable",
                format!(
                    "{} less non-taxable {} = {}",
                    gross_pay, amount, taxable_pay
                ),
            ),
        };

        AuditStep {
            step_number,
            rule_id: "taxable_pay".to_string(),
            rule_name: "Taxable Pay".to_string(),
            input: serde_json::json!({
                "gross_pay": gross_pay.to_string(),
                "policy": policy
            }),
            output: serde_json::json!({
                "taxable_pay": taxable_pay.to_string()
            }),
            reasoning,
        }
    }
}
