//! Request types for the payroll engine API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::calculation::TaxablePayPolicy;
use crate::models::{Editor, Money, RuleSetDelta};

/// Body of `PUT /organizations/:org/rules`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateRulesRequest {
    /// Who is making the edit.
    pub editor: Editor,
    /// The version the edit was prepared against. When absent the edit is
    /// applied to whatever version is current.
    #[serde(default)]
    pub expected_version: Option<u32>,
    /// The fields to change.
    pub delta: RuleSetDelta,
}

/// Body of `POST /organizations/:org/rules/revert`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevertRequest {
    /// Who is reverting.
    pub editor: Editor,
}

/// Body of `POST /organizations/:org/payroll/preview`.
///
/// Previews are computed against a stored version, optionally with an
/// unsaved delta merged in. Nothing is written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewRequest {
    /// Gross pay for the period.
    pub gross_pay: Money,
    /// How taxable pay is derived; defaults to all of gross pay.
    #[serde(default)]
    pub taxable_pay_policy: Option<TaxablePayPolicy>,
    /// Unsaved edits to preview.
    #[serde(default)]
    pub delta: Option<RuleSetDelta>,
    /// The version to compute against; defaults to the current version.
    #[serde(default)]
    pub rule_set_version: Option<u32>,
}

/// Query of `GET /organizations/:org/rules/in-force`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InForceQuery {
    /// The instant to look up, in RFC 3339.
    pub at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_deserialize_update_request() {
        let json = r#"{
            "editor": { "id": "user_42", "label": "Payroll Admin" },
            "expected_version": 3,
            "delta": { "sha_rate": "0.03", "notes": "SHA increase" }
        }"#;

        let request: UpdateRulesRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.editor.id, "user_42");
        assert_eq!(request.expected_version, Some(3));
        assert_eq!(request.delta.sha_rate, Some(Decimal::new(3, 2)));
        assert_eq!(request.delta.notes.as_deref(), Some("SHA increase"));
    }

    #[test]
    fn test_update_request_without_expected_version() {
        let json = r#"{
            "editor": { "id": "user_42", "label": "Payroll Admin" },
            "delta": {}
        }"#;

        let request: UpdateRulesRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.expected_version, None);
        assert!(request.delta.is_empty());
    }

    #[test]
    fn test_deserialize_preview_request_defaults() {
        let json = r#"{ "gross_pay": "100000.00" }"#;

        let request: PreviewRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.gross_pay, Money::from_whole(100_000));
        assert!(request.taxable_pay_policy.is_none());
        assert!(request.delta.is_none());
        assert!(request.rule_set_version.is_none());
    }

    #[test]
    fn test_deserialize_preview_request_with_policy() {
        let json = r#"{
            "gross_pay": "50000",
            "taxable_pay_policy": { "kind": "exclude_non_taxable", "amount": "5000" },
            "rule_set_version": 2
        }"#;

        let request: PreviewRequest = serde_json::from_str(json).unwrap();
        assert_eq!(
            request.taxable_pay_policy,
            Some(TaxablePayPolicy::ExcludeNonTaxable {
                amount: Money::from_whole(5_000)
            })
        );
        assert_eq!(request.rule_set_version, Some(2));
    }

    #[test]
    fn test_preview_rejects_sub_cent_gross() {
        let json = r#"{ "gross_pay": "100.005" }"#;
        assert!(serde_json::from_str::<PreviewRequest>(json).is_err());
    }
}
