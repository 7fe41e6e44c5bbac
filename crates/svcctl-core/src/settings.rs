use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use svcctl_platform::Config;

use crate::control::RetryPolicy;
use crate::pid_record::{PidRecord, DEFAULT_PID_FILE};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// The managed service
    #[serde(default)]
    pub service: Config,

    /// Start/stop retry budget
    #[serde(default)]
    pub retry: RetryPolicy,

    /// Where the last started process id is recorded
    #[serde(default = "default_pid_file")]
    pub pid_file: PathBuf,
}

fn default_pid_file() -> PathBuf {
    PathBuf::from(DEFAULT_PID_FILE)
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            service: Config::default(),
            retry: RetryPolicy::default(),
            pid_file: default_pid_file(),
        }
    }
}

impl Settings {
    /// Default settings file path for this platform
    pub fn default_path() -> PathBuf {
        if let Some(dirs) = directories::ProjectDirs::from("com", "svcctl", "svcctl") {
            dirs.config_dir().join("settings.json")
        } else {
            PathBuf::from("svcctl-settings.json")
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read settings from {}", path.display()))?;
        let mut settings: Self =
            serde_json::from_str(&data).with_context(|| "failed to parse settings JSON")?;
        if settings.pid_file.as_os_str().is_empty() {
            settings.pid_file = default_pid_file();
        }
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create settings dir {}", parent.display()))?;
        }
        let data = serde_json::to_string_pretty(self)?;
        std::fs::write(path, data)
            .with_context(|| format!("failed to write settings to {}", path.display()))?;
        Ok(())
    }

    pub fn pid_record(&self) -> PidRecord {
        PidRecord::new(&self.pid_file)
    }
}
