//! Progressive PAYE calculation.
//!
//! This module walks the ordered PAYE bands of a rule set, taxes the slice
//! of taxable pay falling inside each band at that band's rate, and then
//! applies personal relief against the resulting tax.

use rust_decimal::Decimal;
use tracing::trace;

use crate::error::{EngineError, EngineResult};
use crate::models::{AuditStep, BandCharge, Money, TaxBand};

/// The result of a PAYE calculation, including the band charges and audit step.
#[derive(Debug, Clone)]
pub struct PayeResult {
    /// Tax due before relief.
    pub gross_tax: Money,
    /// Relief actually applied: `min(relief, gross_tax)`.
    pub relief_applied: Money,
    /// Tax due after relief; never negative.
    pub net_tax: Money,
    /// Tax charged inside each band reached by the taxable pay.
    pub band_charges: Vec<BandCharge>,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

/// Calculates PAYE on `taxable_pay` over progressive bands.
///
/// Each band taxes the part of taxable pay in `(previous limit, this limit]`
/// at its own rate, so an amount exactly on a limit is taxed wholly in the
/// lower band. The open-ended last band taxes everything above the last
/// finite limit. Band products are summed exactly and the total is rounded
/// to the cent once. Relief is then subtracted from the tax (never from the
/// taxable pay) and floored at zero.
///
/// The bands must already satisfy the rule-set invariants.
///
/// # Errors
///
/// Returns `InvalidInput` if `taxable_pay` is negative, or
/// `CalculationError` if the rounded tax does not fit in an amount.
///
/// # Examples
///
/// ```
/// use payroll_engine::calculation::calculate_paye;
/// use payroll_engine::models::{Money, TaxBand};
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// let bands = vec![
///     TaxBand::up_to(Money::from_whole(24_000), Decimal::from_str("0.10").unwrap(), "10%"),
///     TaxBand::unbounded(Decimal::from_str("0.25").unwrap(), "25%"),
/// ];
///
/// let result = calculate_paye(Money::from_whole(30_000), &bands, Money::from_whole(2_400), 1).unwrap();
/// assert_eq!(result.gross_tax, Money::from_whole(3_900));
/// assert_eq!(result.net_tax, Money::from_whole(1_500));
/// ```
pub fn calculate_paye(
    taxable_pay: Money,
    bands: &[TaxBand],
    personal_relief: Money,
    step_number: u32,
) -> EngineResult<PayeResult> {
    if taxable_pay.is_negative() {
        return Err(EngineError::invalid_input(
            "taxable_pay",
            format!("{} must not be negative", taxable_pay),
        ));
    }

    let mut lower = Money::ZERO;
    let mut tax_minor = Decimal::ZERO;
    let mut band_charges = Vec::new();

    for band in bands {
        if taxable_pay <= lower {
            break;
        }

        let upper = match band.upto.bound() {
            Some(limit) => limit.min(taxable_pay),
            None => taxable_pay,
        };
        let taxed_amount = upper - lower;
        let band_tax = taxed_amount.times_rate(band.rate);
        tax_minor += band_tax;

        trace!(
            band = %band.label,
            taxed_amount = %taxed_amount,
            rate = %band.rate,
            "PAYE band charged"
        );

        band_charges.push(BandCharge {
            label: band.label.clone(),
            rate: band.rate,
            taxed_amount,
            tax: band_tax / Decimal::ONE_HUNDRED,
        });

        match band.upto.bound() {
            Some(limit) => lower = limit,
            None => break,
        }
    }

    let gross_tax = Money::round_minor(tax_minor)?;
    let relief_applied = personal_relief.max(Money::ZERO).min(gross_tax);
    let net_tax = gross_tax - relief_applied;

    let band_summary = band_charges
        .iter()
        .map(|c| format!("{} x {}", c.taxed_amount, c.rate.normalize()))
        .collect::<Vec<_>>()
        .join(" + ");

    let audit_step = AuditStep {
        step_number,
        rule_id: "paye_bands".to_string(),
        rule_name: "PAYE Progressive Bands".to_string(),
        input: serde_json::json!({
            "taxable_pay": taxable_pay.to_string(),
            "bands": bands.len(),
            "personal_relief": personal_relief.to_string()
        }),
        output: serde_json::json!({
            "gross_tax": gross_tax.to_string(),
            "relief_applied": relief_applied.to_string(),
            "net_tax": net_tax.to_string(),
            "bands_reached": band_charges.len()
        }),
        reasoning: if band_charges.is_empty() {
            "No taxable pay - no PAYE due".to_string()
        } else {
            format!(
                "{} = {}; less relief {} = {}",
                band_summary, gross_tax, relief_applied, net_tax
            )
        },
    };

    Ok(PayeResult {
        gross_tax,
        relief_applied,
        net_tax,
        band_charges,
        audit_step,
    })
}
