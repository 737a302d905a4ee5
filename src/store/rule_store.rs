//! The rule store: which rule set applies to an organization, and how it
//! changes.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::error::{EngineError, EngineResult};
use crate::models::{Editor, RuleSet, RuleSetDelta, StatutoryParameters};

use super::memory::InMemoryRuleRepository;
use super::repository::RuleRepository;

const REVERT_NOTE: &str = "Reverted to statutory defaults";

/// Single source of truth for an organization's statutory rules.
///
/// Every edit is an optimistic read-validate-commit transition: the new
/// version is only written if the version it was derived from is still the
/// active one. A losing edit fails with `ConcurrentModification` and must be
/// retried against the new current version.
///
/// # Example
///
/// ```
/// use payroll_engine::models::{Editor, RuleSetDelta, StatutoryParameters};
/// use payroll_engine::store::RuleStore;
/// use rust_decimal::Decimal;
///
/// # #[tokio::main]
/// # async fn main() {
/// let store = RuleStore::in_memory(StatutoryParameters::kenya());
///
/// let current = store.get_current("clinic_001").await.unwrap();
/// assert_eq!(current.version, 1);
///
/// let delta = RuleSetDelta { sha_rate: Some(Decimal::new(3, 2)), ..Default::default() };
/// let editor = Editor::new("user_42", "Payroll Admin");
/// let updated = store.update("clinic_001", &editor, &delta).await.unwrap();
/// assert_eq!(updated.version, 2);
/// # }
/// ```
#[derive(Clone)]
pub struct RuleStore {
    repository: Arc<dyn RuleRepository>,
    defaults: StatutoryParameters,
}

impl RuleStore {
    /// Creates a store over `repository`, bootstrapping with `defaults`.
    pub fn new(repository: Arc<dyn RuleRepository>, defaults: StatutoryParameters) -> Self {
        Self {
            repository,
            defaults,
        }
    }

    /// Creates a store backed by an [`InMemoryRuleRepository`].
    pub fn in_memory(defaults: StatutoryParameters) -> Self {
        Self::new(Arc::new(InMemoryRuleRepository::new()), defaults)
    }

    /// The parameters used for bootstrap and revert.
    pub fn defaults(&self) -> &StatutoryParameters {
        &self.defaults
    }

    /// Returns the active rule set, creating version 1 from the defaults if
    /// the organization has none.
    ///
    /// Bootstrap is an insert-if-absent, so concurrent first callers all get
    /// the same version 1. The bootstrapped version is effective from the
    /// Unix epoch so that it also covers pay periods before the first edit.
    ///
    /// # Errors
    ///
    /// - `Storage` if the active version cannot be read
    /// - `NotFound` if no version exists and the bootstrap write fails
    pub async fn get_current(&self, organization_id: &str) -> EngineResult<RuleSet> {
        if let Some(active) = self.repository.active(organization_id).await? {
            return Ok(active);
        }

        let now = Utc::now();
        let initial = RuleSet {
            organization_id: organization_id.to_string(),
            version: 1,
            effective_from: DateTime::<Utc>::UNIX_EPOCH,
            is_active: true,
            parameters: self.defaults.clone(),
            notes: Some("Statutory defaults".to_string()),
            updated_by: None,
            updated_at: now,
        };

        match self.repository.insert_initial(initial).await {
            Ok(active) => {
                info!(
                    organization_id,
                    version = active.version,
                    "Bootstrapped default rule set"
                );
                Ok(active)
            }
            Err(err) => {
                warn!(organization_id, error = %err, "Rule set bootstrap failed");
                Err(EngineError::NotFound {
                    organization_id: organization_id.to_string(),
                    message: format!("no rule set exists and bootstrap failed: {}", err),
                })
            }
        }
    }

    /// Every version for the organization, newest first.
    pub async fn get_history(&self, organization_id: &str) -> EngineResult<Vec<RuleSet>> {
        self.get_current(organization_id).await?;
        self.repository.history(organization_id).await
    }

    /// A specific version.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the version does not exist.
    pub async fn get_version(&self, organization_id: &str, version: u32) -> EngineResult<RuleSet> {
        self.get_current(organization_id).await?;
        self.repository
            .version(organization_id, version)
            .await?
            .ok_or_else(|| EngineError::NotFound {
                organization_id: organization_id.to_string(),
                message: format!("version {} does not exist", version),
            })
    }

    /// The rule set that was in force at `at`: the version with the latest
    /// `effective_from` not after `at`.
    ///
    /// Use this to recompute a historical pay period with the rules that
    /// applied then rather than the current ones.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no version was in force at `at`.
    pub async fn rules_in_force_at(
        &self,
        organization_id: &str,
        at: DateTime<Utc>,
    ) -> EngineResult<RuleSet> {
        self.get_history(organization_id)
            .await?
            .into_iter()
            .filter(|rules| rules.effective_from <= at)
            .max_by_key(|rules| (rules.effective_from, rules.version))
            .ok_or_else(|| EngineError::NotFound {
                organization_id: organization_id.to_string(),
                message: format!("no rule set was in force at {}", at),
            })
    }

    /// Applies `delta` to the current version and commits the result as a
    /// new active version effective now.
    ///
    /// # Errors
    ///
    /// - `InvalidRuleSet` if the merged parameters break an invariant; nothing
    ///   is written
    /// - `ConcurrentModification` if another edit committed first
    pub async fn update(
        &self,
        organization_id: &str,
        editor: &Editor,
        delta: &RuleSetDelta,
    ) -> EngineResult<RuleSet> {
        let current = self.get_current(organization_id).await?;
        self.update_from(organization_id, current.version, editor, delta)
            .await
    }

    /// Like [`update`](Self::update), but derived from `expected_version`,
    /// the version the editor was looking at.
    ///
    /// # Errors
    ///
    /// As for `update`; `ConcurrentModification` is also returned when
    /// `expected_version` is not the current version.
    pub async fn update_from(
        &self,
        organization_id: &str,
        expected_version: u32,
        editor: &Editor,
        delta: &RuleSetDelta,
    ) -> EngineResult<RuleSet> {
        let current = self.current_at_version(organization_id, expected_version).await?;
        let parameters = current.parameters.merged(delta);
        self.transition(current, editor, parameters, delta.notes.clone())
            .await
    }

    /// Replaces the current parameters with the configured defaults as a new
    /// version.
    ///
    /// # Errors
    ///
    /// Returns `ConcurrentModification` if another edit committed first.
    pub async fn revert_to_defaults(
        &self,
        organization_id: &str,
        editor: &Editor,
    ) -> EngineResult<RuleSet> {
        let current = self.get_current(organization_id).await?;
        self.transition(
            current,
            editor,
            self.defaults.clone(),
            Some(REVERT_NOTE.to_string()),
        )
        .await
    }

    async fn current_at_version(
        &self,
        organization_id: &str,
        expected_version: u32,
    ) -> EngineResult<RuleSet> {
        let current = self.get_current(organization_id).await?;
        if current.version != expected_version {
            warn!(
                organization_id,
                expected_version,
                actual_version = current.version,
                "Rule set edit based on a superseded version"
            );
            return Err(EngineError::ConcurrentModification {
                organization_id: organization_id.to_string(),
                expected_version,
                actual_version: current.version,
            });
        }
        Ok(current)
    }

    async fn transition(
        &self,
        current: RuleSet,
        editor: &Editor,
        parameters: StatutoryParameters,
        notes: Option<String>,
    ) -> EngineResult<RuleSet> {
        let organization_id = current.organization_id.as_str();

        if let Err(err) = parameters.validate() {
            warn!(
                organization_id,
                editor = %editor.id,
                error = %err,
                "Rejected invalid rule set edit"
            );
            return Err(err);
        }

        let now = Utc::now();
        let next = RuleSet {
            organization_id: current.organization_id.clone(),
            version: current.version + 1,
            effective_from: now,
            is_active: true,
            parameters,
            notes,
            updated_by: Some(editor.clone()),
            updated_at: now,
        };

        match self.repository.commit(current.version, next).await {
            Ok(committed) => {
                info!(
                    organization_id,
                    previous_version = current.version,
                    version = committed.version,
                    editor = %editor.id,
                    "Committed new rule set version"
                );
                Ok(committed)
            }
            Err(err) => {
                warn!(
                    organization_id,
                    base_version = current.version,
                    error = %err,
                    "Rule set commit failed"
                );
                Err(err)
            }
        }
    }
}
