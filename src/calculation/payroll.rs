//! Net pay calculation.
//!
//! [`compute_payroll`] is the single entry point the payroll-period workflow
//! and the rule-administration preview use to turn one gross pay figure and
//! one rule set into a [`DeductionBreakdown`]. It has no side effects and
//! holds no state, so entries for a period can be computed in parallel.

use tracing::debug;

use crate::error::{EngineError, EngineResult};
use crate::models::{AuditStep, DeductionBreakdown, Money, PayrollCalculation, RuleSet};

use super::contributions::{
    ContributionSide, Levy, TierLimits, calculate_flat_levy, calculate_tiered_contribution,
};
use super::tax_bands::calculate_paye;
use super::taxable_pay::TaxablePayPolicy;

/// Computes the statutory deductions and net pay for one gross pay figure.
///
/// Equivalent to [`compute_payroll_with_audit`] without the audit trail.
///
/// # Examples
///
/// ```
/// use payroll_engine::calculation::{compute_payroll, TaxablePayPolicy};
/// use payroll_engine::models::{Money, RuleSet, StatutoryParameters};
/// use chrono::Utc;
///
/// let rules = RuleSet {
///     organization_id: "clinic_001".to_string(),
///     version: 1,
///     effective_from: Utc::now(),
///     is_active: true,
///     parameters: StatutoryParameters::kenya(),
///     notes: None,
///     updated_by: None,
///     updated_at: Utc::now(),
/// };
///
/// let breakdown = compute_payroll(Money::from_whole(100_000), &rules, &TaxablePayPolicy::Gross).unwrap();
/// assert_eq!(breakdown.nssf_employee, Money::from_whole(1_080));
/// assert_eq!(breakdown.net_pay.to_string(), "72286.67");
/// ```
pub fn compute_payroll(
    gross_pay: Money,
    rules: &RuleSet,
    policy: &TaxablePayPolicy,
) -> EngineResult<DeductionBreakdown> {
    compute_payroll_with_audit(gross_pay, rules, policy).map(|calculation| calculation.breakdown)
}

/// Computes the statutory deductions and net pay, keeping every step.
///
/// The order is fixed: taxable pay, PAYE over the bands, personal relief,
/// flat levies on gross pay, employee and employer NSSF, then the totals.
///
/// # Errors
///
/// - `InvalidInput` if gross pay is negative or out of range, or the
///   taxable-pay policy cannot be applied to it
/// - `InvalidRuleSet` if `rules` breaks a rule-set invariant
pub fn compute_payroll_with_audit(
    gross_pay: Money,
    rules: &RuleSet,
    policy: &TaxablePayPolicy,
) -> EngineResult<PayrollCalculation> {
    if gross_pay.is_negative() {
        return Err(EngineError::invalid_input(
            "gross_pay",
            format!("{} must not be negative", gross_pay),
        ));
    }
    if !gross_pay.in_range() {
        return Err(EngineError::invalid_input(
            "gross_pay",
            format!("{} is out of range", gross_pay),
        ));
    }

    let params = &rules.parameters;
    params.validate()?;

    let mut audit_steps = Vec::new();
    let mut step_number: u32 = 1;

    let taxable_pay = policy.taxable_pay(gross_pay)?;
    audit_steps.push(policy.audit_step(gross_pay, taxable_pay, step_number));
    step_number += 1;

    let paye = calculate_paye(
        taxable_pay,
        &params.paye_bands,
        params.personal_relief,
        step_number,
    )?;
    audit_steps.push(paye.audit_step);
    step_number += 1;

    let nhdf = calculate_flat_levy(gross_pay, params.nhdf_rate, Levy::Nhdf, step_number)?;
    audit_steps.push(nhdf.audit_step);
    step_number += 1;

    let sha = calculate_flat_levy(gross_pay, params.sha_rate, Levy::Sha, step_number)?;
    audit_steps.push(sha.audit_step);
    step_number += 1;

    let limits = TierLimits {
        tier1: params.nssf_tier1_limit,
        tier2: params.nssf_tier2_limit,
    };
    let nssf_employee = calculate_tiered_contribution(
        gross_pay,
        limits,
        params.employee_tier_rates(),
        ContributionSide::Employee,
        step_number,
    )?;
    audit_steps.push(nssf_employee.audit_step);
    step_number += 1;

    let nssf_employer = calculate_tiered_contribution(
        gross_pay,
        limits,
        params.employer_tier_rates(),
        ContributionSide::Employer,
        step_number,
    )?;
    audit_steps.push(nssf_employer.audit_step);
    step_number += 1;

    let total_employee_deductions =
        paye.net_tax + nssf_employee.amount + nhdf.amount + sha.amount;
    debug_assert!(
        total_employee_deductions <= gross_pay,
        "deductions {} exceed gross pay {}",
        total_employee_deductions,
        gross_pay
    );
    let net_pay = gross_pay - total_employee_deductions;
    let employer_cost = gross_pay + nssf_employer.amount;

    audit_steps.push(AuditStep {
        step_number,
        rule_id: "net_pay".to_string(),
        rule_name: "Net Pay".to_string(),
        input: serde_json::json!({
            "gross_pay": gross_pay.to_string(),
            "paye_net": paye.net_tax.to_string(),
            "nssf_employee": nssf_employee.amount.to_string(),
            "nhdf": nhdf.amount.to_string(),
            "sha": sha.amount.to_string()
        }),
        output: serde_json::json!({
            "total_employee_deductions": total_employee_deductions.to_string(),
            "net_pay": net_pay.to_string(),
            "employer_cost": employer_cost.to_string()
        }),
        reasoning: format!(
            "{} - ({} + {} + {} + {}) = {}",
            gross_pay, paye.net_tax, nssf_employee.amount, nhdf.amount, sha.amount, net_pay
        ),
    });

    debug!(
        organization_id = %rules.organization_id,
        rule_set_version = rules.version,
        gross_pay = %gross_pay,
        net_pay = %net_pay,
        "Payroll computed"
    );

    let breakdown = DeductionBreakdown {
        rule_set_version: rules.version,
        gross_pay,
        taxable_pay,
        paye_gross: paye.gross_tax,
        personal_relief_applied: paye.relief_applied,
        paye_net: paye.net_tax,
        nssf_employee: nssf_employee.amount,
        nssf_employer: nssf_employer.amount,
        nhdf: nhdf.amount,
        sha: sha.amount,
        total_employee_deductions,
        net_pay,
        employer_cost,
    };

    Ok(PayrollCalculation {
        breakdown,
        band_charges: paye.band_charges,
        audit_steps,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{StatutoryParameters, TaxBand};
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn money(s: &str) -> Money {
        Money::from_major(dec(s)).unwrap()
    }

    fn kenya_rules() -> RuleSet {
        let at = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        RuleSet {
            organization_id: "clinic_001".to_string(),
            version: 3,
            effective_from: at,
            is_active: true,
            parameters: StatutoryParameters::kenya(),
            notes: None,
            updated_by: None,
            updated_at: at,
        }
    }

    fn gross_policy() -> TaxablePayPolicy {
        TaxablePayPolicy::Gross
    }

    #[test]
    fn test_kenya_scenario_100k() {
        let b = compute_payroll(money("100000"), &kenya_rules(), &gross_policy()).unwrap();

        assert_eq!(b.rule_set_version, 3);
        assert_eq!(b.gross_pay, money("100000"));
        assert_eq!(b.taxable_pay, money("100000"));
        assert_eq!(b.paye_gross, money("24783.33"));
        assert_eq!(b.personal_relief_applied, money("2400"));
        assert_eq!(b.paye_net, money("22383.33"));
        assert_eq!(b.nssf_employee, money("1080"));
        assert_eq!(b.nssf_employer, money("1080"));
        assert_eq!(b.nhdf, money("1500"));
        assert_eq!(b.sha, money("2750"));
        assert_eq!(b.total_employee_deductions, money("27713.33"));
        assert_eq!(b.net_pay, money("72286.67"));
        assert_eq!(b.employer_cost, money("101080"));
    }

    #[test]
    fn test_net_pay_identity_holds() {
        for gross in ["0", "1", "5999.99", "24000", "32333.33", "250000", "2000000"] {
            let b = compute_payroll(money(gross), &kenya_rules(), &gross_policy()).unwrap();
            assert_eq!(
                b.total_employee_deductions,
                b.paye_net + b.nssf_employee + b.nhdf + b.sha
            );
            assert_eq!(b.net_pay, b.gross_pay - b.total_employee_deductions);
            assert!(!b.net_pay.is_negative(), "negative net pay for {}", gross);
        }
    }

    #[test]
    fn test_zero_gross_pay_is_all_zero() {
        let b = compute_payroll(Money::ZERO, &kenya_rules(), &gross_policy()).unwrap();

        assert_eq!(b.total_employee_deductions, Money::ZERO);
        assert_eq!(b.net_pay, Money::ZERO);
        assert_eq!(b.employer_cost, Money::ZERO);
    }

    #[test]
    fn test_low_pay_relief_exceeds_tax() {
        let b = compute_payroll(money("20000"), &kenya_rules(), &gross_policy()).unwrap();

        assert_eq!(b.paye_gross, money("2000"));
        assert_eq!(b.personal_relief_applied, money("2000"));
        assert_eq!(b.paye_net, Money::ZERO);
    }

    #[test]
    fn test_non_taxable_amount_reduces_paye_only() {
        let policy = TaxablePayPolicy::ExcludeNonTaxable {
            amount: money("10000"),
        };
        let with_exclusion = compute_payroll(money("100000"), &kenya_rules(), &policy).unwrap();
        let without = compute_payroll(money("100000"), &kenya_rules(), &gross_policy()).unwrap();

        assert_eq!(with_exclusion.taxable_pay, money("90000"));
        assert_eq!(with_exclusion.paye_gross, money("21783.33"));
        assert!(with_exclusion.paye_net < without.paye_net);
        // Levies and NSSF stay on gross pay.
        assert_eq!(with_exclusion.nhdf, without.nhdf);
        assert_eq!(with_exclusion.sha, without.sha);
        assert_eq!(with_exclusion.nssf_employee, without.nssf_employee);
    }

    #[test]
    fn test_negative_gross_pay_rejected() {
        let result = compute_payroll(Money::from_minor(-1), &kenya_rules(), &gross_policy());

        match result {
            Err(EngineError::InvalidInput { field, .. }) => assert_eq!(field, "gross_pay"),
            other => panic!("Expected InvalidInput, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_rules_rejected_before_computing() {
        let mut rules = kenya_rules();
        rules.parameters.paye_bands = vec![TaxBand::up_to(money("1000"), dec("0.1"), "10%")];

        let result = compute_payroll(money("5000"), &rules, &gross_policy());
        assert!(matches!(result, Err(EngineError::InvalidRuleSet { .. })));
    }

    #[test]
    fn test_rates_above_full_pay_rejected_as_invalid_rules() {
        let mut rules = kenya_rules();
        rules.parameters.nhdf_rate = dec("0.6");
        rules.parameters.sha_rate = dec("0.6");

        let result = compute_payroll(money("1000"), &rules, &gross_policy());

        match result {
            Err(EngineError::InvalidRuleSet { field, .. }) => {
                assert_eq!(field, "combined_employee_rate")
            }
            other => panic!("Expected InvalidRuleSet, got {:?}", other),
        }
    }

    #[test]
    fn test_rates_at_ceiling_never_exceed_small_gross() {
        let mut rules = kenya_rules();
        rules.parameters.paye_bands = vec![TaxBand::unbounded(dec("0.40"), "flat")];
        rules.parameters.personal_relief = Money::ZERO;
        rules.parameters.nssf_employee_rate = dec("0.05");
        rules.parameters.nhdf_rate = dec("0.03");
        rules.parameters.sha_rate = dec("0.02");

        for cents in 0..=2_000 {
            let b = compute_payroll(Money::from_minor(cents), &rules, &gross_policy()).unwrap();
            assert!(!b.net_pay.is_negative(), "negative net pay at {} cents", cents);
            assert_eq!(b.net_pay, b.gross_pay - b.total_employee_deductions);
        }
    }

    #[test]
    fn test_employer_tier2_override_changes_employer_only() {
        let mut rules = kenya_rules();
        rules.parameters.nssf_employer_tier2_rate = Some(dec("0.10"));

        let b = compute_payroll(money("100000"), &rules, &gross_policy()).unwrap();

        // 6,000 x 0.06 + 12,000 x 0.10
        assert_eq!(b.nssf_employer, money("1560"));
        assert_eq!(b.nssf_employee, money("1080"));
        assert_eq!(b.employer_cost, money("101560"));
    }

    #[test]
    fn test_audit_trail_follows_calculation_order() {
        let calculation =
            compute_payroll_with_audit(money("100000"), &kenya_rules(), &gross_policy()).unwrap();

        let rule_ids: Vec<&str> = calculation
            .audit_steps
            .iter()
            .map(|s| s.rule_id.as_str())
            .collect();
        assert_eq!(
            rule_ids,
            vec![
                "taxable_pay",
                "paye_bands",
                "nhdf_levy",
                "sha_levy",
                "nssf_employee",
                "nssf_employer",
                "net_pay"
            ]
        );
        let numbers: Vec<u32> = calculation.audit_steps.iter().map(|s| s.step_number).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(calculation.band_charges.len(), 3);
    }

    #[test]
    fn test_with_and_without_audit_agree() {
        let rules = kenya_rules();
        let plain = compute_payroll(money("61234.56"), &rules, &gross_policy()).unwrap();
        let traced =
            compute_payroll_with_audit(money("61234.56"), &rules, &gross_policy()).unwrap();

        assert_eq!(plain, traced.breakdown);
    }
}
