//! In-memory rule repository.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{EngineError, EngineResult};
use crate::models::RuleSet;

use super::repository::RuleRepository;

/// A [`RuleRepository`] held in process memory.
///
/// Each organization's versions are kept oldest first. All writes happen
/// under one lock, so the active-version check and the flip of `is_active`
/// are a single step.
#[derive(Debug, Default)]
pub struct InMemoryRuleRepository {
    organizations: RwLock<HashMap<String, Vec<RuleSet>>>,
}

impl InMemoryRuleRepository {
    /// Creates an empty repository.
    pub fn new() -> Self {
        Self::default()
    }
}

fn active_of(versions: &[RuleSet]) -> Option<&RuleSet> {
    versions.iter().rfind(|rules| rules.is_active)
}

#[async_trait]
impl RuleRepository for InMemoryRuleRepository {
    async fn active(&self, organization_id: &str) -> EngineResult<Option<RuleSet>> {
        let organizations = self.organizations.read().await;
        Ok(organizations
            .get(organization_id)
            .and_then(|versions| active_of(versions))
            .cloned())
    }

    async fn history(&self, organization_id: &str) -> EngineResult<Vec<RuleSet>> {
        let organizations = self.organizations.read().await;
        Ok(organizations
            .get(organization_id)
            .map(|versions| versions.iter().rev().cloned().collect())
            .unwrap_or_default())
    }

    async fn version(
        &self,
        organization_id: &str,
        version: u32,
    ) -> EngineResult<Option<RuleSet>> {
        let organizations = self.organizations.read().await;
        Ok(organizations
            .get(organization_id)
            .and_then(|versions| versions.iter().find(|rules| rules.version == version))
            .cloned())
    }

    async fn insert_initial(&self, initial: RuleSet) -> EngineResult<RuleSet> {
        let mut organizations = self.organizations.write().await;
        let versions = organizations
            .entry(initial.organization_id.clone())
            .or_default();

        if let Some(active) = active_of(versions) {
            return Ok(active.clone());
        }
        if !versions.is_empty() {
            return Err(EngineError::Storage {
                message: format!(
                    "organization '{}' has versions but none is active",
                    initial.organization_id
                ),
            });
        }

        versions.push(initial.clone());
        Ok(initial)
    }

    async fn commit(&self, expected_version: u32, next: RuleSet) -> EngineResult<RuleSet> {
        let mut organizations = self.organizations.write().await;
        let versions = organizations
            .get_mut(&next.organization_id)
            .ok_or_else(|| EngineError::NotFound {
                organization_id: next.organization_id.clone(),
                message: "no rule set to supersede".to_string(),
            })?;

        let active_index = versions
            .iter()
            .rposition(|rules| rules.is_active)
            .ok_or_else(|| EngineError::NotFound {
                organization_id: next.organization_id.clone(),
                message: "no active rule set to supersede".to_string(),
            })?;

        let actual_version = versions[active_index].version;
        if actual_version != expected_version {
            return Err(EngineError::ConcurrentModification {
                organization_id: next.organization_id.clone(),
                expected_version,
                actual_version,
            });
        }

        let latest = versions.iter().map(|rules| rules.version).max().unwrap_or(0);
        if next.version <= latest {
            return Err(EngineError::Storage {
                message: format!(
                    "version {} would reuse an existing version number (latest {})",
                    next.version, latest
                ),
            });
        }

        versions[active_index].is_active = false;
        let mut next = next;
        next.is_active = true;
        versions.push(next.clone());
        Ok(next)
    }
}
