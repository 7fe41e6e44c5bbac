use std::path::PathBuf;
use std::sync::Arc;

use crate::config::Config;
use crate::error::{Result, ServiceError};
use crate::status::ManagerState;

/// Start/stop callbacks supplied by the embedding application.
///
/// Both are invoked from the manager's worker thread and must return
/// promptly; nothing here bounds how long they take.
pub trait Interface: Send + Sync {
    fn start(&self) -> anyhow::Result<()>;

    fn stop(&self) -> anyhow::Result<()>;
}

/// Everything a native manager needs to register a service.
#[derive(Debug, Clone)]
pub struct InstallSpec {
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub executable: PathBuf,
    pub arguments: Vec<String>,
    pub dependencies: Vec<String>,
    pub account: Option<String>,
    pub password: Option<String>,
}

impl InstallSpec {
    /// Build from a config, resolving the executable to the current binary
    /// when the config leaves it unset.
    pub fn from_config(config: &Config, password: Option<String>) -> Result<Self> {
        config.validate()?;
        let executable = match &config.executable {
            Some(path) => path.clone(),
            None => std::env::current_exe()
                .map_err(|e| ServiceError::io("failed to get current exe path", e))?,
        };
        Ok(Self {
            name: config.name.clone(),
            display_name: config.display_name().to_string(),
            description: config.description.clone(),
            executable,
            arguments: config.arguments.clone(),
            dependencies: config.dependencies.clone(),
            account: config.user_name.clone().filter(|a| !a.is_empty()),
            password: password.filter(|p| !p.is_empty()),
        })
    }
}

/// Raw manager primitives, keyed by service name.
pub trait ServiceManager: Send + Sync {
    /// Register the service; fails with `AlreadyExists` if the name is taken.
    fn install(&self, spec: &InstallSpec) -> Result<()>;

    /// Remove the registration.
    fn uninstall(&self, name: &str) -> Result<()>;

    fn start(&self, name: &str) -> Result<()>;

    fn stop(&self, name: &str) -> Result<()>;

    /// Query the native state. A missing service is `NotInstalled`.
    fn query(&self, name: &str) -> Result<ManagerState>;

    /// Process id of the running service, if the manager reports one.
    fn process_id(&self, name: &str) -> Result<Option<u32>>;
}

/// Last-resort process handling for backends with a kill fallback.
pub trait ProcessControl: Send + Sync {
    fn is_alive(&self, pid: u32) -> bool;

    fn kill(&self, pid: u32) -> anyhow::Result<()>;
}

/// One native service system (SCM, systemd, launchd, ...).
pub trait System: Send + Sync {
    /// Short identifier, e.g. "windows-service".
    fn name(&self) -> &'static str;

    /// True if this system's manager is present and usable on this host.
    fn detect(&self) -> bool;

    /// True when running as a normal foreground process rather than under
    /// the manager. Evaluated once by the host at startup.
    fn interactive(&self) -> bool;

    fn manager(&self) -> &dyn ServiceManager;

    /// Kill fallback used when a stop never converges. `None` disables it.
    fn process_control(&self) -> Option<&dyn ProcessControl> {
        None
    }

    /// Hand the current process over to the manager's dispatcher and block
    /// until the manager stops the service.
    fn run_managed(&self, name: &str, handler: Arc<dyn Interface>) -> Result<()>;
}
