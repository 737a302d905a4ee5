//! Error types for the statutory payroll engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for every failure the rule store, the calculators and the configuration
//! loader can report.

use thiserror::Error;

/// The main error type for the statutory payroll engine.
///
/// All operations in the engine return this error type, making it easy
/// to handle errors consistently throughout the application.
///
/// # Example
///
/// ```
/// use payroll_engine::error::EngineError;
///
/// let error = EngineError::InvalidRuleSet {
///     field: "nssf_tier1_limit".to_string(),
///     message: "must be below the tier 2 limit".to_string(),
/// };
/// assert_eq!(
///     error.to_string(),
///     "Invalid rule set field 'nssf_tier1_limit': must be below the tier 2 limit"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// A rule set (or the result of merging a delta into one) broke an invariant.
    #[error("Invalid rule set field '{field}': {message}")]
    InvalidRuleSet {
        /// The field that failed validation.
        field: String,
        /// A description of the violated invariant.
        message: String,
    },

    /// Another edit committed a new version after this edit read its base.
    #[error(
        "Concurrent modification of rules for '{organization_id}': expected active version {expected_version}, found {actual_version}"
    )]
    ConcurrentModification {
        /// The organization whose rules were being edited.
        organization_id: String,
        /// The version the edit was based on.
        expected_version: u32,
        /// The version that was actually active at commit time.
        actual_version: u32,
    },

    /// No rule set could be found or bootstrapped.
    #[error("Rule set not found for '{organization_id}': {message}")]
    NotFound {
        /// The organization that was queried.
        organization_id: String,
        /// What was being looked for.
        message: String,
    },

    /// A calculation input was outside its contract (e.g. negative gross pay).
    #[error("Invalid input '{field}': {message}")]
    InvalidInput {
        /// The input that was rejected.
        field: String,
        /// A description of why the input was rejected.
        message: String,
    },

    /// The storage beneath the rule store failed.
    #[error("Storage error: {message}")]
    Storage {
        /// A description of the storage failure.
        message: String,
    },

    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// A general calculation error occurred.
    #[error("Calculation error: {message}")]
    CalculationError {
        /// A description of the calculation error.
        message: String,
    },
}

impl EngineError {
    /// Shorthand for an [`EngineError::InvalidRuleSet`].
    pub fn invalid_rule_set(field: impl Into<String>, message: impl Into<String>) -> Self {
        EngineError::InvalidRuleSet {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Shorthand for an [`EngineError::InvalidInput`].
    pub fn invalid_input(field: impl Into<String>, message: impl Into<String>) -> Self {
        EngineError::InvalidInput {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;
