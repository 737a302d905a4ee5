//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading jurisdiction
//! configurations from YAML files.

use std::fs;
use std::path::Path;

use tracing::info;

use crate::error::{EngineError, EngineResult};
use crate::models::StatutoryParameters;

use super::types::{JurisdictionConfig, JurisdictionMetadata};

/// Loads and provides access to jurisdiction configuration.
///
/// # Directory Structure
///
/// ```text
/// config/ke/
/// ├── jurisdiction.yaml        # Jurisdiction metadata
/// └── statutory_defaults.yaml  # Default PAYE, NSSF, NHDF and SHA parameters
/// ```
///
/// # Example
///
/// ```no_run
/// use payroll_engine::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config/ke").unwrap();
/// println!("Loaded jurisdiction: {}", loader.metadata().name);
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config: JurisdictionConfig,
}

impl ConfigLoader {
    /// Loads configuration from the specified directory.
    ///
    /// # Returns
    ///
    /// Returns a `ConfigLoader` instance on success, or an error if:
    /// - Any required file is missing (`ConfigNotFound`)
    /// - Any file contains invalid YAML (`ConfigParseError`)
    /// - The statutory defaults break a rule-set invariant (`ConfigParseError`)
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();

        let metadata_path = path.join("jurisdiction.yaml");
        let metadata = Self::load_yaml::<JurisdictionMetadata>(&metadata_path)?;

        let defaults_path = path.join("statutory_defaults.yaml");
        let defaults = Self::load_yaml::<StatutoryParameters>(&defaults_path)?;
        defaults
            .validate()
            .map_err(|e| EngineError::ConfigParseError {
                path: defaults_path.display().to_string(),
                message: e.to_string(),
            })?;

        info!(
            jurisdiction = %metadata.code,
            bands = defaults.paye_bands.len(),
            "Loaded statutory defaults"
        );

        Ok(Self {
            config: JurisdictionConfig::new(metadata, defaults),
        })
    }

    /// Wraps an already-built configuration.
    pub fn from_config(config: JurisdictionConfig) -> Self {
        Self { config }
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> EngineResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| EngineError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    /// Returns the underlying jurisdiction configuration.
    pub fn config(&self) -> &JurisdictionConfig {
        &self.config
    }

    /// Returns the jurisdiction metadata.
    pub fn metadata(&self) -> &JurisdictionMetadata {
        self.config.metadata()
    }

    /// Returns the statutory defaults.
    pub fn defaults(&self) -> &StatutoryParameters {
        self.config.defaults()
    }
}
