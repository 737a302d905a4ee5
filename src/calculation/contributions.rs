//! Pension contribution and flat levy calculations.
//!
//! NSSF is a two-tier contribution: pay up to the tier 1 limit is charged at
//! the tier 1 rate, pay between the two limits at the tier 2 rate, and pay
//! above the tier 2 limit is not pensionable. Housing (NHDF) and health (SHA)
//! levies are flat percentages of gross pay with no cap.

use rust_decimal::Decimal;

use crate::error::{EngineError, EngineResult};
use crate::models::{AuditStep, Money, TierRates};

/// Which side of the payroll a contribution is charged to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContributionSide {
    /// Deducted from the employee's pay.
    Employee,
    /// Paid by the employer on top of gross pay.
    Employer,
}

impl ContributionSide {
    fn as_str(&self) -> &'static str {
        match self {
            ContributionSide::Employee => "employee",
            ContributionSide::Employer => "employer",
        }
    }
}

/// The NSSF tier limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierLimits {
    /// Upper limit of tier 1.
    pub tier1: Money,
    /// Upper limit of tier 2; pay above it is not pensionable.
    pub tier2: Money,
}

/// The result of a tiered contribution calculation.
#[derive(Debug, Clone)]
pub struct ContributionResult {
    /// The contribution due.
    pub amount: Money,
    /// Gross pay capped at the tier 2 limit.
    pub pensionable_base: Money,
    /// Part of the pensionable base inside tier 1.
    pub tier1_portion: Money,
    /// Part of the pensionable base inside tier 2.
    pub tier2_portion: Money,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

/// Calculates a tiered pension contribution.
///
/// `pensionable = min(gross, tier2)`, `tier1 = min(pensionable, tier1_limit)`,
/// `tier2 = max(0, pensionable - tier1_limit)`, and the contribution is
/// `tier1 x rate1 + tier2 x rate2`, rounded to the cent once.
///
/// # Errors
///
/// Returns `InvalidInput` if `gross_pay` is negative.
///
/// # Examples
///
/// ```
/// use payroll_engine::calculation::{calculate_tiered_contribution, ContributionSide, TierLimits};
/// use payroll_engine::models::{Money, TierRates};
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// let limits = TierLimits { tier1: Money::from_whole(6_000), tier2: Money::from_whole(18_000) };
/// let rates = TierRates::uniform(Decimal::from_str("0.06").unwrap());
///
/// let result = calculate_tiered_contribution(
///     Money::from_whole(100_000), limits, rates, ContributionSide::Employee, 1,
/// ).unwrap();
/// assert_eq!(result.amount, Money::from_whole(1_080));
/// assert_eq!(result.pensionable_base, Money::from_whole(18_000));
/// ```
pub fn calculate_tiered_contribution(
    gross_pay: Money,
    limits: TierLimits,
    rates: TierRates,
    side: ContributionSide,
    step_number: u32,
) -> EngineResult<ContributionResult> {
    if gross_pay.is_negative() {
        return Err(EngineError::invalid_input(
            "gross_pay",
            format!("{} must not be negative", gross_pay),
        ));
    }

    let pensionable_base = gross_pay.min(limits.tier2);
    let tier1_portion = pensionable_base.min(limits.tier1);
    let tier2_portion = (pensionable_base - limits.tier1).max(Money::ZERO);

    let amount = Money::round_minor(
        tier1_portion.times_rate(rates.tier1) + tier2_portion.times_rate(rates.tier2),
    )?;

    let side_str = side.as_str();
    let reasoning = if rates.tier1 == rates.tier2 {
        format!(
            "min({}, {}) = {} x {} = {}",
            gross_pay,
            limits.tier2,
            pensionable_base,
            rates.tier1.normalize(),
            amount
        )
    } else {
        format!(
            "Tier 1 {} x {} + tier 2 {} x {} = {}",
            tier1_portion,
            rates.tier1.normalize(),
            tier2_portion,
            rates.tier2.normalize(),
            amount
        )
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: format!("nssf_{}", side_str),
        rule_name: format!("NSSF {} Contribution", capitalize(side_str)),
        input: serde_json::json!({
            "gross_pay": gross_pay.to_string(),
            "tier1_limit": limits.tier1.to_string(),
            "tier2_limit": limits.tier2.to_string(),
            "tier1_rate": rates.tier1.normalize().to_string(),
            "tier2_rate": rates.tier2.normalize().to_string()
        }),
        output: serde_json::json!({
            "pensionable_base": pensionable_base.to_string(),
            "tier1_portion": tier1_portion.to_string(),
            "tier2_portion": tier2_portion.to_string(),
            "amount": amount.to_string()
        }),
        reasoning,
    };

    Ok(ContributionResult {
        amount,
        pensionable_base,
        tier1_portion,
        tier2_portion,
        audit_step,
    })
}

/// The flat-rate levies charged on gross pay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Levy {
    /// National Housing Development Fund levy.
    Nhdf,
    /// Social Health Authority contribution.
    Sha,
}

impl Levy {
    fn rule_id(&self) -> &'static str {
        match self {
            Levy::Nhdf => "nhdf_levy",
            Levy::Sha => "sha_levy",
        }
    }

    fn rule_name(&self) -> &'static str {
        match self {
            Levy::Nhdf => "Housing Levy (NHDF)",
            Levy::Sha => "Health Insurance Levy (SHA)",
        }
    }
}

/// The result of a flat levy calculation.
#[derive(Debug, Clone)]
pub struct LevyResult {
    /// The levy due.
    pub amount: Money,
    /// The amount the rate was applied to.
    pub base: Money,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

/// Calculates a flat levy: `gross x rate`, rounded to the cent, no cap.
///
/// # Errors
///
/// Returns `InvalidInput` if `gross_pay` is negative.
pub fn calculate_flat_levy(
    gross_pay: Money,
    rate: Decimal,
    levy: Levy,
    step_number: u32,
) -> EngineResult<LevyResult> {
    if gross_pay.is_negative() {
        return Err(EngineError::invalid_input(
            "gross_pay",
            format!("{} must not be negative", gross_pay),
        ));
    }

    let amount = Money::round_minor(gross_pay.times_rate(rate))?;

    let audit_step = AuditStep {
        step_number,
        rule_id: levy.rule_id().to_string(),
        rule_name: levy.rule_name().to_string(),
        input: serde_json::json!({
            "gross_pay": gross_pay.to_string(),
            "rate": rate.normalize().to_string()
        }),
        output: serde_json::json!({
            "amount": amount.to_string()
        }),
        reasoning: format!("{} x {} = {}", gross_pay, rate.normalize(), amount),
    };

    Ok(LevyResult {
        amount,
        base: gross_pay,
        audit_step,
    })
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn money(s: &str) -> Money {
        Money::from_major(dec(s)).unwrap()
    }

    fn kenya_limits() -> TierLimits {
        TierLimits {
            tier1: money("6000"),
            tier2: money("18000"),
        }
    }

    fn six_percent() -> TierRates {
        TierRates::uniform(dec("0.06"))
    }

    fn nssf(gross: &str, rates: TierRates) -> ContributionResult {
        calculate_tiered_contribution(
            money(gross),
            kenya_limits(),
            rates,
            ContributionSide::Employee,
            1,
        )
        .unwrap()
    }

    #[test]
    fn test_pay_within_tier1() {
        let result = nssf("5000", six_percent());

        assert_eq!(result.amount, money("300"));
        assert_eq!(result.pensionable_base, money("5000"));
        assert_eq!(result.tier1_portion, money("5000"));
        assert_eq!(result.tier2_portion, Money::ZERO);
    }

    #[test]
    fn test_pay_spanning_both_tiers() {
        let result = nssf("10000", six_percent());

        assert_eq!(result.tier1_portion, money("6000"));
        assert_eq!(result.tier2_portion, money("4000"));
        assert_eq!(result.amount, money("600"));
    }

    #[test]
    fn test_pay_above_tier2_is_capped() {
        let result = nssf("100000", six_percent());

        assert_eq!(result.pensionable_base, money("18000"));
        assert_eq!(result.tier2_portion, money("12000"));
        assert_eq!(result.amount, money("1080"));
    }

    #[test]
    fn test_pay_exactly_at_tier_limits() {
        assert_eq!(nssf("6000", six_percent()).tier2_portion, Money::ZERO);
        assert_eq!(nssf("18000", six_percent()).amount, money("1080"));
    }

    #[test]
    fn test_zero_pay_contributes_nothing() {
        let result = nssf("0", six_percent());
        assert_eq!(result.amount, Money::ZERO);
        assert_eq!(result.pensionable_base, Money::ZERO);
    }

    #[test]
    fn test_distinct_tier_rates() {
        let rates = TierRates {
            tier1: dec("0.06"),
            tier2: dec("0.04"),
        };
        let result = nssf("100000", rates);

        // 6,000 x 0.06 + 12,000 x 0.04 = 360 + 480
        assert_eq!(result.amount, money("840"));
        assert!(result.audit_step.reasoning.starts_with("Tier 1"));
    }

    #[test]
    fn test_contribution_rounds_once() {
        // 3,333.33 x 0.06 = 199.9998
        let result = nssf("3333.33", six_percent());
        assert_eq!(result.amount, money("200"));
    }

    #[test]
    fn test_employer_side_audit_step() {
        let result = calculate_tiered_contribution(
            money("20000"),
            kenya_limits(),
            six_percent(),
            ContributionSide::Employer,
            7,
        )
        .unwrap();

        assert_eq!(result.audit_step.rule_id, "nssf_employer");
        assert_eq!(result.audit_step.rule_name, "NSSF Employer Contribution");
        assert_eq!(result.audit_step.step_number, 7);
        assert_eq!(result.audit_step.output["pensionable_base"], "18000.00");
    }

    #[test]
    fn test_negative_gross_rejected_for_contribution() {
        let result = calculate_tiered_contribution(
            Money::from_minor(-100),
            kenya_limits(),
            six_percent(),
            ContributionSide::Employee,
            1,
        );
        assert!(matches!(result, Err(EngineError::InvalidInput { .. })));
    }

    #[test]
    fn test_flat_levies_on_100k() {
        let nhdf = calculate_flat_levy(money("100000"), dec("0.015"), Levy::Nhdf, 1).unwrap();
        let sha = calculate_flat_levy(money("100000"), dec("0.0275"), Levy::Sha, 2).unwrap();

        assert_eq!(nhdf.amount, money("1500"));
        assert_eq!(nhdf.base, money("100000"));
        assert_eq!(sha.amount, money("2750"));
        assert_eq!(sha.audit_step.rule_id, "sha_levy");
    }

    #[test]
    fn test_flat_levy_has_no_cap() {
        let levy = calculate_flat_levy(money("5000000"), dec("0.0275"), Levy::Sha, 1).unwrap();
        assert_eq!(levy.amount, money("137500"));
    }

    #[test]
    fn test_flat_levy_rounds_half_away_from_zero() {
        // 33.33 x 0.015 = 0.49995
        let levy = calculate_flat_levy(money("33.33"), dec("0.015"), Levy::Nhdf, 1).unwrap();
        assert_eq!(levy.amount, money("0.50"));
    }

    #[test]
    fn test_negative_gross_rejected_for_levy() {
        let result = calculate_flat_levy(Money::from_minor(-1), dec("0.015"), Levy::Nhdf, 1);
        assert!(matches!(result, Err(EngineError::InvalidInput { .. })));
    }
}
