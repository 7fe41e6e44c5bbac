//! systemd detection. Registration is not implemented for this system.

use std::path::Path;
use std::sync::Arc;

use svcctl_platform::{Interface, Result, ServiceManager, System};

use crate::stub::UnsupportedManager;
use crate::supervise;

const SYSTEM_NAME: &str = "linux-systemd";

pub struct SystemdSystem {
    manager: UnsupportedManager,
}

impl SystemdSystem {
    pub fn new() -> Self {
        Self {
            manager: UnsupportedManager::new(SYSTEM_NAME),
        }
    }
}

impl Default for SystemdSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for SystemdSystem {
    fn name(&self) -> &'static str {
        SYSTEM_NAME
    }

    fn detect(&self) -> bool {
        cfg!(target_os = "linux") && Path::new("/run/systemd/system").exists()
    }

    /// systemd sets INVOCATION_ID for every unit it launches.
    fn interactive(&self) -> bool {
        std::env::var_os("INVOCATION_ID").is_none() && nix::unistd::getppid().as_raw() != 1
    }

    fn manager(&self) -> &dyn ServiceManager {
        &self.manager
    }

    fn run_managed(&self, name: &str, handler: Arc<dyn Interface>) -> Result<()> {
        supervise::run(name, handler)
    }
}
