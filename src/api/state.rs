//! Application state for the payroll engine API.
//!
//! This module defines the shared application state that is available
//! to all request handlers.

use std::sync::Arc;

use crate::config::ConfigLoader;
use crate::store::RuleStore;

/// Shared application state.
///
/// Holds the rule store every handler reads and edits, and the loaded
/// jurisdiction configuration whose defaults seed that store.
#[derive(Clone)]
pub struct AppState {
    rules: RuleStore,
    config: Arc<ConfigLoader>,
}

impl AppState {
    /// Creates state with an in-memory rule store seeded from `config`.
    pub fn new(config: ConfigLoader) -> Self {
        let rules = RuleStore::in_memory(config.defaults().clone());
        Self::with_store(config, rules)
    }

    /// Creates state around an existing rule store.
    pub fn with_store(config: ConfigLoader, rules: RuleStore) -> Self {
        Self {
            rules,
            config: Arc::new(config),
        }
    }

    /// Returns the rule store.
    pub fn rules(&self) -> &RuleStore {
        &self.rules
    }

    /// Returns the configuration loader.
    pub fn config(&self) -> &ConfigLoader {
        &self.config
    }
}
