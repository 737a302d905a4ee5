//! Configuration types for the statutory payroll engine.
//!
//! This module contains the strongly-typed configuration structures that
//! are deserialized from YAML configuration files.

use serde::Deserialize;

use crate::models::StatutoryParameters;

/// Metadata about the jurisdiction whose statutes the defaults encode.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct JurisdictionMetadata {
    /// ISO country code (e.g., "KE").
    pub code: String,
    /// The human-readable name of the jurisdiction.
    pub name: String,
    /// ISO currency code for all amounts (e.g., "KES").
    pub currency: String,
    /// Pay frequency the amounts are expressed in (e.g., "monthly").
    pub pay_frequency: String,
    /// URL to the official statutory guidance.
    pub source_url: String,
}

/// The complete jurisdiction configuration loaded from YAML files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JurisdictionConfig {
    metadata: JurisdictionMetadata,
    defaults: StatutoryParameters,
}

impl JurisdictionConfig {
    /// Creates a new JurisdictionConfig from its component parts.
    pub fn new(metadata: JurisdictionMetadata, defaults: StatutoryParameters) -> Self {
        Self { metadata, defaults }
    }

    /// The built-in Kenyan configuration.
    pub fn kenya() -> Self {
        Self {
            metadata: JurisdictionMetadata {
                code: "KE".to_string(),
                name: "Kenya".to_string(),
                currency: "KES".to_string(),
                pay_frequency: "monthly".to_string(),
                source_url: "https://www.kra.go.ke/individual/filing-paying/types-of-taxes/paye"
                    .to_string(),
            },
            defaults: StatutoryParameters::kenya(),
        }
    }

    /// Returns the jurisdiction metadata.
    pub fn metadata(&self) -> &JurisdictionMetadata {
        &self.metadata
    }

    /// Returns the statutory defaults used to bootstrap and revert rule sets.
    pub fn defaults(&self) -> &StatutoryParameters {
        &self.defaults
    }
}
