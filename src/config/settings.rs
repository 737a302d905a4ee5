//! Server settings read from the environment.

use std::net::SocketAddr;
use std::path::PathBuf;

use crate::error::{EngineError, EngineResult};

/// Environment variable holding the socket address to bind.
pub const BIND_ADDR_VAR: &str = "PAYROLL_BIND_ADDR";
/// Environment variable holding the jurisdiction configuration directory.
pub const CONFIG_DIR_VAR: &str = "PAYROLL_CONFIG_DIR";

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_CONFIG_DIR: &str = "./config/ke";

/// Settings for the HTTP server binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    /// Address the API listens on.
    pub bind_addr: SocketAddr,
    /// Directory containing `jurisdiction.yaml` and `statutory_defaults.yaml`.
    pub config_dir: PathBuf,
}

impl ServerSettings {
    /// Reads settings from the process environment.
    pub fn from_env() -> EngineResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through `lookup`, falling back to defaults for unset keys.
    pub fn from_lookup<F>(lookup: F) -> EngineResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind_addr = lookup(BIND_ADDR_VAR).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_addr
            .parse()
            .map_err(|e: std::net::AddrParseError| EngineError::ConfigParseError {
                path: BIND_ADDR_VAR.to_string(),
                message: format!("'{}': {}", bind_addr, e),
            })?;

        let config_dir = lookup(CONFIG_DIR_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_DIR));

        Ok(Self {
            bind_addr,
            config_dir,
        })
    }
}
