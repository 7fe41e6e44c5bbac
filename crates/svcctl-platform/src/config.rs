use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ServiceError};

/// Description of one managed service. Read-only once handed to a backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Name registered with the service manager (required)
    pub name: String,

    /// Human-readable name shown by the manager
    #[serde(default)]
    pub display_name: String,

    #[serde(default)]
    pub description: String,

    /// Account the service runs as; empty means the manager default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,

    /// Arguments passed to the executable when the manager launches it
    #[serde(default)]
    pub arguments: Vec<String>,

    /// Names of services that must be started first
    #[serde(default)]
    pub dependencies: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_directory: Option<PathBuf>,

    /// Executable path; defaults to the current executable at install time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executable: Option<PathBuf>,

    /// Backend-specific knobs
    #[serde(default)]
    pub option: serde_json::Map<String, serde_json::Value>,

    #[serde(default)]
    pub env_vars: BTreeMap<String, String>,
}

impl Config {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(ServiceError::NameRequired);
        }
        Ok(())
    }

    /// Display name, falling back to the service name.
    pub fn display_name(&self) -> &str {
        if self.display_name.is_empty() {
            &self.name
        } else {
            &self.display_name
        }
    }
}
