//! Configuration loading and management for the statutory payroll engine.
//!
//! This module loads the jurisdiction metadata and statutory defaults from
//! YAML files, provides the built-in Kenyan defaults, and reads the server
//! settings from the environment.
//!
//! # Example
//!
//! ```no_run
//! use payroll_engine::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config/ke").unwrap();
//! println!("Loaded jurisdiction: {}", config.metadata().name);
//! ```

mod defaults;
mod loader;
mod settings;
mod types;

pub use loader::ConfigLoader;
pub use settings::{BIND_ADDR_VAR, CONFIG_DIR_VAR, ServerSettings};
pub use types::{JurisdictionConfig, JurisdictionMetadata};
