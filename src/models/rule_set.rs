//! Versioned statutory rule sets.
//!
//! A [`RuleSet`] is one immutable version of the statutory parameters an
//! organization pays under. The parameters themselves live in
//! [`StatutoryParameters`], which is also the unit that gets validated,
//! merged with a [`RuleSetDelta`] and shipped as configured defaults.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{EngineError, EngineResult};

use super::Money;

/// Ceiling on the sum of the marginal rates charged to the employee.
///
/// Each deduction is rounded to the cent on its own, and a rounded amount is
/// never more than twice its exact value. Keeping the exact total at or
/// below half of gross pay therefore keeps net pay non-negative at every
/// gross pay.
pub const MAX_COMBINED_EMPLOYEE_RATE: Decimal = Decimal::from_parts(5, 0, 0, false, 1);

/// The upper limit of a PAYE band.
///
/// # Example
///
/// ```
/// use payroll_engine::models::{BandLimit, Money};
///
/// let limit = BandLimit::UpTo(Money::from_whole(24_000));
/// assert_eq!(limit.bound(), Some(Money::from_whole(24_000)));
/// assert!(BandLimit::Unbounded.is_unbounded());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BandLimit {
    /// The band covers taxable pay up to and including this amount.
    UpTo(Money),
    /// The band has no upper limit.
    Unbounded,
}

impl BandLimit {
    /// The finite bound, if any.
    pub fn bound(&self) -> Option<Money> {
        match self {
            BandLimit::UpTo(amount) => Some(*amount),
            BandLimit::Unbounded => None,
        }
    }

    /// Returns true for the open-ended top band.
    pub fn is_unbounded(&self) -> bool {
        matches!(self, BandLimit::Unbounded)
    }
}

/// A single progressive income-tax band.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxBand {
    /// Upper limit of the band (inclusive).
    pub upto: BandLimit,
    /// Rate applied to the slice of taxable pay inside the band.
    pub rate: Decimal,
    /// Display label (e.g. "30%").
    #[serde(default)]
    pub label: String,
}

impl TaxBand {
    /// Creates a band with a finite upper limit.
    pub fn up_to(amount: Money, rate: Decimal, label: impl Into<String>) -> Self {
        Self {
            upto: BandLimit::UpTo(amount),
            rate,
            label: label.into(),
        }
    }

    /// Creates the open-ended top band.
    pub fn unbounded(rate: Decimal, label: impl Into<String>) -> Self {
        Self {
            upto: BandLimit::Unbounded,
            rate,
            label: label.into(),
        }
    }
}

/// Rates for the two pension tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierRates {
    /// Rate on the slice of pay up to the tier 1 limit.
    pub tier1: Decimal,
    /// Rate on the slice between the tier 1 and tier 2 limits.
    pub tier2: Decimal,
}

impl TierRates {
    /// The same rate on both tiers.
    pub fn uniform(rate: Decimal) -> Self {
        Self {
            tier1: rate,
            tier2: rate,
        }
    }
}

/// The statutory parameters that drive a payroll calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatutoryParameters {
    /// PAYE bands, ascending, open-ended band last.
    pub paye_bands: Vec<TaxBand>,
    /// Monthly personal relief subtracted from computed PAYE.
    pub personal_relief: Money,
    /// Employee NSSF rate (tier 1, and tier 2 unless overridden).
    pub nssf_employee_rate: Decimal,
    /// Employer NSSF rate (tier 1, and tier 2 unless overridden).
    pub nssf_employer_rate: Decimal,
    /// Optional employee rate for tier 2.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nssf_employee_tier2_rate: Option<Decimal>,
    /// Optional employer rate for tier 2.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nssf_employer_tier2_rate: Option<Decimal>,
    /// Upper limit of NSSF tier 1 (lower earnings limit).
    pub nssf_tier1_limit: Money,
    /// Upper limit of NSSF tier 2 (upper earnings limit).
    pub nssf_tier2_limit: Money,
    /// Housing levy rate on gross pay.
    pub nhdf_rate: Decimal,
    /// Health insurance levy rate on gross pay.
    pub sha_rate: Decimal,
}

impl StatutoryParameters {
    /// Employee pension rates per tier.
    pub fn employee_tier_rates(&self) -> TierRates {
        TierRates {
            tier1: self.nssf_employee_rate,
            tier2: self
                .nssf_employee_tier2_rate
                .unwrap_or(self.nssf_employee_rate),
        }
    }

    /// Employer pension rates per tier.
    pub fn employer_tier_rates(&self) -> TierRates {
        TierRates {
            tier1: self.nssf_employer_rate,
            tier2: self
                .nssf_employer_tier2_rate
                .unwrap_or(self.nssf_employer_rate),
        }
    }

    /// Returns a copy with every field present in `delta` replaced.
    pub fn merged(&self, delta: &RuleSetDelta) -> StatutoryParameters {
        let mut merged = self.clone();
        if let Some(bands) = &delta.paye_bands {
            merged.paye_bands = bands.clone();
        }
        if let Some(relief) = delta.personal_relief {
            merged.personal_relief = relief;
        }
        if let Some(rate) = delta.nssf_employee_rate {
            merged.nssf_employee_rate = rate;
        }
        if let Some(rate) = delta.nssf_employer_rate {
            merged.nssf_employer_rate = rate;
        }
        if let Some(rate) = delta.nssf_employee_tier2_rate {
            merged.nssf_employee_tier2_rate = rate;
        }
        if let Some(rate) = delta.nssf_employer_tier2_rate {
            merged.nssf_employer_tier2_rate = rate;
        }
        if let Some(limit) = delta.nssf_tier1_limit {
            merged.nssf_tier1_limit = limit;
        }
        if let Some(limit) = delta.nssf_tier2_limit {
            merged.nssf_tier2_limit = limit;
        }
        if let Some(rate) = delta.nhdf_rate {
            merged.nhdf_rate = rate;
        }
        if let Some(rate) = delta.sha_rate {
            merged.sha_rate = rate;
        }
        merged
    }

    /// Checks every invariant a rule set must hold before it is stored or
    /// used for a calculation.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRuleSet` naming the first offending field when:
    /// - the band list is empty, unsorted, has a bound ≤ its predecessor,
    ///   has decreasing rates, or does not end in exactly one open-ended band
    /// - any rate lies outside [0, 1]
    /// - any amount is negative or out of range
    /// - the NSSF tier 1 limit is not below the tier 2 limit
    /// - the top band rate, the larger employee NSSF tier rate and both
    ///   levy rates add up to more than [`MAX_COMBINED_EMPLOYEE_RATE`]
    pub fn validate(&self) -> EngineResult<()> {
        validate_bands(&self.paye_bands)?;

        validate_amount("personal_relief", self.personal_relief)?;
        validate_fraction("nssf_employee_rate", self.nssf_employee_rate)?;
        validate_fraction("nssf_employer_rate", self.nssf_employer_rate)?;
        if let Some(rate) = self.nssf_employee_tier2_rate {
            validate_fraction("nssf_employee_tier2_rate", rate)?;
        }
        if let Some(rate) = self.nssf_employer_tier2_rate {
            validate_fraction("nssf_employer_tier2_rate", rate)?;
        }
        validate_amount("nssf_tier1_limit", self.nssf_tier1_limit)?;
        validate_amount("nssf_tier2_limit", self.nssf_tier2_limit)?;
        if self.nssf_tier1_limit >= self.nssf_tier2_limit {
            return Err(EngineError::invalid_rule_set(
                "nssf_tier1_limit",
                format!(
                    "{} must be below nssf_tier2_limit {}",
                    self.nssf_tier1_limit, self.nssf_tier2_limit
                ),
            ));
        }
        validate_fraction("nhdf_rate", self.nhdf_rate)?;
        validate_fraction("sha_rate", self.sha_rate)?;

        self.validate_combined_employee_rate()
    }

    fn validate_combined_employee_rate(&self) -> EngineResult<()> {
        let top_band_rate = self
            .paye_bands
            .last()
            .map(|band| band.rate)
            .unwrap_or(Decimal::ZERO);
        let tiers = self.employee_tier_rates();
        let nssf_rate = tiers.tier1.max(tiers.tier2);
        let combined = top_band_rate + nssf_rate + self.nhdf_rate + self.sha_rate;

        if combined > MAX_COMBINED_EMPLOYEE_RATE {
            return Err(EngineError::invalid_rule_set(
                "combined_employee_rate",
                format!(
                    "top band {} + nssf {} + nhdf {} + sha {} = {} exceeds {}",
                    top_band_rate,
                    nssf_rate,
                    self.nhdf_rate,
                    self.sha_rate,
                    combined,
                    MAX_COMBINED_EMPLOYEE_RATE
                ),
            ));
        }
        Ok(())
    }
}

fn validate_bands(bands: &[TaxBand]) -> EngineResult<()> {
    if bands.is_empty() {
        return Err(EngineError::invalid_rule_set(
            "paye_bands",
            "at least one band is required",
        ));
    }

    let last = bands.len() - 1;
    let mut previous_bound = Money::ZERO;
    let mut previous_rate: Option<Decimal> = None;

    for (index, band) in bands.iter().enumerate() {
        let field = format!("paye_bands[{}]", index);

        validate_fraction(&field, band.rate)?;
        if let Some(previous) = previous_rate {
            if band.rate < previous {
                return Err(EngineError::invalid_rule_set(
                    field,
                    format!(
                        "rate {} is below the previous band's rate {}",
                        band.rate, previous
                    ),
                ));
            }
        }
        previous_rate = Some(band.rate);

        match band.upto {
            BandLimit::UpTo(bound) => {
                if index == last {
                    return Err(EngineError::invalid_rule_set(
                        field,
                        "the last band must have no upper limit",
                    ));
                }
                validate_amount(&field, bound)?;
                if bound <= previous_bound {
                    return Err(EngineError::invalid_rule_set(
                        field,
                        format!(
                            "upper limit {} must exceed the previous limit {}",
                            bound, previous_bound
                        ),
                    ));
                }
                previous_bound = bound;
            }
            BandLimit::Unbounded => {
                if index != last {
                    return Err(EngineError::invalid_rule_set(
                        field,
                        "only the last band may have no upper limit",
                    ));
                }
            }
        }
    }

    Ok(())
}

fn validate_fraction(field: &str, rate: Decimal) -> EngineResult<()> {
    if rate < Decimal::ZERO || rate > Decimal::ONE {
        return Err(EngineError::invalid_rule_set(
            field,
            format!("rate {} must be between 0 and 1", rate),
        ));
    }
    Ok(())
}

fn validate_amount(field: &str, amount: Money) -> EngineResult<()> {
    if amount.is_negative() {
        return Err(EngineError::invalid_rule_set(
            field,
            format!("amount {} must not be negative", amount),
        ));
    }
    if !amount.in_range() {
        return Err(EngineError::invalid_rule_set(
            field,
            format!("amount {} is out of range", amount),
        ));
    }
    Ok(())
}

/// The person who made an edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Editor {
    /// Stable identifier of the editor.
    pub id: String,
    /// Display name of the editor.
    pub label: String,
}

impl Editor {
    /// Creates an editor record.
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

/// One stored version of an organization's statutory rules.
///
/// Versions are never mutated once stored; an edit produces a new version
/// and flips `is_active` on the old one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
    /// The tenant these rules belong to.
    pub organization_id: String,
    /// Version number, assigned by the store and never reused.
    pub version: u32,
    /// When this version took effect.
    pub effective_from: DateTime<Utc>,
    /// Whether this is the organization's current version.
    pub is_active: bool,
    /// The statutory parameters.
    pub parameters: StatutoryParameters,
    /// Free-form note from the editor.
    #[serde(default)]
    pub notes: Option<String>,
    /// Who created this version (`None` for bootstrapped defaults).
    #[serde(default)]
    pub updated_by: Option<Editor>,
    /// When this version was created.
    pub updated_at: DateTime<Utc>,
}

impl RuleSet {
    /// Returns this version with `parameters` replaced, for previewing
    /// unsaved edits. The version number is kept.
    pub fn with_parameters(&self, parameters: StatutoryParameters) -> RuleSet {
        RuleSet {
            parameters,
            ..self.clone()
        }
    }
}

/// A partial edit of a rule set.
///
/// Absent fields keep the base version's value. The tier 2 overrides
/// distinguish "absent" (keep) from `null` (clear the override).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSetDelta {
    /// Replacement band list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paye_bands: Option<Vec<TaxBand>>,
    /// Replacement personal relief.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personal_relief: Option<Money>,
    /// Replacement employee NSSF rate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nssf_employee_rate: Option<Decimal>,
    /// Replacement employer NSSF rate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nssf_employer_rate: Option<Decimal>,
    /// Set or clear the employee tier 2 override.
    #[serde(
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub nssf_employee_tier2_rate: Option<Option<Decimal>>,
    /// Set or clear the employer tier 2 override.
    #[serde(
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub nssf_employer_tier2_rate: Option<Option<Decimal>>,
    /// Replacement tier 1 limit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nssf_tier1_limit: Option<Money>,
    /// Replacement tier 2 limit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nssf_tier2_limit: Option<Money>,
    /// Replacement housing levy rate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nhdf_rate: Option<Decimal>,
    /// Replacement health levy rate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha_rate: Option<Decimal>,
    /// Note recorded on the new version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl RuleSetDelta {
    /// Returns true if the delta changes no parameter.
    pub fn is_empty(&self) -> bool {
        let without_notes = RuleSetDelta {
            notes: None,
            ..self.clone()
        };
        without_notes == RuleSetDelta::default()
    }
}

/// Maps a present field (including `null`) to `Some`, so that a missing
/// field stays `None` through `#[serde(default)]`.
fn deserialize_present<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn params() -> StatutoryParameters {
        StatutoryParameters::kenya()
    }

    fn expect_invalid(params: &StatutoryParameters, expected_field: &str) {
        match params.validate() {
            Err(EngineError::InvalidRuleSet { field, .. }) => assert_eq!(field, expected_field),
            other => panic!("Expected InvalidRuleSet on {}, got {:?}", expected_field, other),
        }
    }

    #[test]
    fn test_kenya_defaults_are_valid() {
        assert!(params().validate().is_ok());
    }

    #[test]
    fn test_out_of_order_bands_rejected() {
        let mut p = params();
        p.paye_bands.swap(0, 1);
        expect_invalid(&p, "paye_bands[1]");
    }

    #[test]
    fn test_repeated_bound_rejected() {
        let mut p = params();
        p.paye_bands[1].upto = p.paye_bands[0].upto;
        expect_invalid(&p, "paye_bands[1]");
    }

    #[test]
    fn test_zero_first_bound_rejected() {
        let mut p = params();
        p.paye_bands[0].upto = BandLimit::UpTo(Money::ZERO);
        expect_invalid(&p, "paye_bands[0]");
    }

    #[test]
    fn test_decreasing_rates_rejected() {
        let mut p = params();
        p.paye_bands[2].rate = dec("0.20");
        expect_invalid(&p, "paye_bands[2]");
    }

    #[test]
    fn test_equal_consecutive_rates_allowed() {
        let mut p = params();
        p.paye_bands[1].rate = p.paye_bands[0].rate;
        assert!(p.validate().is_ok());
    }

    #[test]
    fn test_missing_unbounded_band_rejected() {
        let mut p = params();
        let last = p.paye_bands.len() - 1;
        p.paye_bands[last].upto = BandLimit::UpTo(Money::from_whole(2_000_000));
        expect_invalid(&p, &format!("paye_bands[{}]", last));
    }

    #[test]
    fn test_unbounded_band_before_last_rejected() {
        let mut p = params();
        p.paye_bands[3].upto = BandLimit::Unbounded;
        expect_invalid(&p, "paye_bands[3]");
    }

    #[test]
    fn test_single_unbounded_band_is_valid() {
        let mut p = params();
        p.paye_bands = vec![TaxBand::unbounded(dec("0.16"), "flat")];
        assert!(p.validate().is_ok());
    }

    #[test]
    fn test_empty_bands_rejected() {
        let mut p = params();
        p.paye_bands.clear();
        expect_invalid(&p, "paye_bands");
    }

    #[test]
    fn test_rate_above_one_rejected() {
        let mut p = params();
        p.sha_rate = dec("1.01");
        expect_invalid(&p, "sha_rate");
    }

    #[test]
    fn test_negative_rate_rejected() {
        let mut p = params();
        p.nssf_employer_rate = dec("-0.01");
        expect_invalid(&p, "nssf_employer_rate");
    }

    #[test]
    fn test_negative_relief_rejected() {
        let mut p = params();
        p.personal_relief = Money::from_whole(-1);
        expect_invalid(&p, "personal_relief");
    }

    #[test]
    fn test_tier1_not_below_tier2_rejected() {
        let mut p = params();
        p.nssf_tier1_limit = p.nssf_tier2_limit;
        expect_invalid(&p, "nssf_tier1_limit");
    }

    #[test]
    fn test_tier2_override_rate_validated() {
        let mut p = params();
        p.nssf_employee_tier2_rate = Some(dec("2"));
        expect_invalid(&p, "nssf_employee_tier2_rate");
    }

    #[test]
    fn test_levies_above_full_pay_rejected() {
        let mut p = params();
        p.nhdf_rate = dec("0.6");
        p.sha_rate = dec("0.6");
        expect_invalid(&p, "combined_employee_rate");
    }

    #[test]
    fn test_combined_rate_counts_larger_nssf_tier() {
        let mut p = params();
        // 0.35 + 0.06 + 0.015 + 0.0275 leaves 0.0475 of headroom.
        p.nssf_employee_tier2_rate = Some(dec("0.1075"));
        assert!(p.validate().is_ok());

        p.nssf_employee_tier2_rate = Some(dec("0.1076"));
        expect_invalid(&p, "combined_employee_rate");

        p.nssf_employee_tier2_rate = None;
        p.nssf_employer_tier2_rate = Some(dec("0.5"));
        assert!(p.validate().is_ok());
    }

    #[test]
    fn test_combined_rate_at_ceiling_allowed() {
        let mut p = params();
        p.paye_bands = vec![TaxBand::unbounded(dec("0.40"), "flat")];
        p.nssf_employee_rate = dec("0.05");
        p.nhdf_rate = dec("0.03");
        p.sha_rate = dec("0.02");
        assert!(p.validate().is_ok());

        p.sha_rate = dec("0.021");
        expect_invalid(&p, "combined_employee_rate");
    }

    #[test]
    fn test_tier_rates_fall_back_to_tier1_rate() {
        let mut p = params();
        assert_eq!(p.employee_tier_rates(), TierRates::uniform(dec("0.06")));

        p.nssf_employer_tier2_rate = Some(dec("0.04"));
        assert_eq!(
            p.employer_tier_rates(),
            TierRates {
                tier1: dec("0.06"),
                tier2: dec("0.04")
            }
        );
    }

    #[test]
    fn test_merge_replaces_only_present_fields() {
        let delta = RuleSetDelta {
            sha_rate: Some(dec("0.03")),
            nssf_tier2_limit: Some(Money::from_whole(36_000)),
            ..RuleSetDelta::default()
        };

        let merged = params().merged(&delta);

        assert_eq!(merged.sha_rate, dec("0.03"));
        assert_eq!(merged.nssf_tier2_limit, Money::from_whole(36_000));
        assert_eq!(merged.nhdf_rate, params().nhdf_rate);
        assert_eq!(merged.paye_bands, params().paye_bands);
    }

    #[test]
    fn test_delta_null_clears_tier2_override() {
        let mut base = params();
        base.nssf_employee_tier2_rate = Some(dec("0.05"));

        let keep: RuleSetDelta = serde_json::from_str("{}").unwrap();
        assert_eq!(base.merged(&keep).nssf_employee_tier2_rate, Some(dec("0.05")));

        let clear: RuleSetDelta =
            serde_json::from_str(r#"{"nssf_employee_tier2_rate": null}"#).unwrap();
        assert_eq!(base.merged(&clear).nssf_employee_tier2_rate, None);

        let set: RuleSetDelta =
            serde_json::from_str(r#"{"nssf_employee_tier2_rate": "0.07"}"#).unwrap();
        assert_eq!(base.merged(&set).nssf_employee_tier2_rate, Some(dec("0.07")));
    }

    #[test]
    fn test_delta_is_empty_ignores_notes() {
        let delta = RuleSetDelta {
            notes: Some("no-op".to_string()),
            ..RuleSetDelta::default()
        };
        assert!(delta.is_empty());

        let delta = RuleSetDelta {
            nhdf_rate: Some(dec("0.015")),
            ..RuleSetDelta::default()
        };
        assert!(!delta.is_empty());
    }

    #[test]
    fn test_band_limit_serialization() {
        assert_eq!(
            serde_json::to_string(&BandLimit::UpTo(Money::from_minor(3_233_333))).unwrap(),
            r#"{"up_to":"32333.33"}"#
        );
        assert_eq!(
            serde_json::to_string(&BandLimit::Unbounded).unwrap(),
            r#""unbounded""#
        );
    }

    #[test]
    fn test_deserialize_band_list_from_yaml() {
        let yaml = r#"
- upto: !up_to "24000.00"
  rate: "0.10"
  label: "10%"
- upto: unbounded
  rate: "0.35"
  label: "35%"
"#;

        let bands: Vec<TaxBand> = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(bands[0].upto.bound(), Some(Money::from_whole(24_000)));
        assert!(bands[1].upto.is_unbounded());
    }

    #[test]
    fn test_deserialize_band_list() {
        let json = r#"[
            {"upto": {"up_to": "24000.00"}, "rate": "0.10", "label": "10%"},
            {"upto": "unbounded", "rate": "0.35", "label": "35%"}
        ]"#;

        let bands: Vec<TaxBand> = serde_json::from_str(json).unwrap();
        assert_eq!(bands.len(), 2);
        assert_eq!(bands[0].upto.bound(), Some(Money::from_whole(24_000)));
        assert!(bands[1].upto.is_unbounded());
        assert_eq!(bands[1].rate, dec("0.35"));
    }
}
