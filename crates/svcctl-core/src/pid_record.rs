use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use svcctl_platform::{ProcessControl, Result, ServiceError};

pub const DEFAULT_PID_FILE: &str = ".pid";

/// Last known process id of a started service, persisted as plain text.
///
/// Only a kill target of last resort: the manager's own status query is
/// always authoritative. Last writer wins.
#[derive(Debug, Clone)]
pub struct PidRecord {
    path: PathBuf,
}

impl PidRecord {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the recorded pid. A missing file is `None`.
    pub fn read(&self) -> Result<Option<u32>> {
        let data = match std::fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(ServiceError::io(
                    format!("failed to read pid record {}", self.path.display()),
                    e,
                ))
            }
        };

        let trimmed = data.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        trimmed.parse::<u32>().map(Some).map_err(|e| {
            ServiceError::io(
                format!("corrupt pid record {}", self.path.display()),
                std::io::Error::new(ErrorKind::InvalidData, e),
            )
        })
    }

    pub fn write(&self, pid: u32) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                ServiceError::io(format!("failed to create {}", parent.display()), e)
            })?;
        }
        std::fs::write(&self.path, pid.to_string()).map_err(|e| {
            ServiceError::io(
                format!("failed to write pid record {}", self.path.display()),
                e,
            )
        })
    }

    /// The recorded pid, if one exists and that process is still alive.
    pub fn live_pid(&self, process: &dyn ProcessControl) -> Result<Option<u32>> {
        Ok(self.read()?.filter(|pid| process.is_alive(*pid)))
    }
}

impl Default for PidRecord {
    fn default() -> Self {
        Self::new(DEFAULT_PID_FILE)
    }
}
