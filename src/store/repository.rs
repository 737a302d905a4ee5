//! Persistence boundary for rule sets.

use async_trait::async_trait;

use crate::error::EngineResult;
use crate::models::RuleSet;

/// Storage for versioned rule sets, keyed by organization and version.
///
/// Implementations keep an append-only history per organization with exactly
/// one active version. The two write operations are conditional so that the
/// [`RuleStore`](super::RuleStore) can run optimistic transitions on top.
#[async_trait]
pub trait RuleRepository: Send + Sync {
    /// The active version, or `None` if the organization has no versions.
    async fn active(&self, organization_id: &str) -> EngineResult<Option<RuleSet>>;

    /// Every version, newest first.
    async fn history(&self, organization_id: &str) -> EngineResult<Vec<RuleSet>>;

    /// A specific version.
    async fn version(&self, organization_id: &str, version: u32)
    -> EngineResult<Option<RuleSet>>;

    /// Stores `initial` if the organization has no versions yet.
    ///
    /// Returns the active version afterwards, which is `initial` only for
    /// the caller that won the insert.
    async fn insert_initial(&self, initial: RuleSet) -> EngineResult<RuleSet>;

    /// Deactivates `expected_version` and stores `next` as the active version.
    ///
    /// # Errors
    ///
    /// Fails with `ConcurrentModification` without writing anything if
    /// `expected_version` is no longer the active version.
    async fn commit(&self, expected_version: u32, next: RuleSet) -> EngineResult<RuleSet>;
}
