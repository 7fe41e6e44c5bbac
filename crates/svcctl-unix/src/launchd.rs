//! launchd detection. Registration is not implemented for this system.

use std::sync::Arc;

use svcctl_platform::{Interface, Result, ServiceManager, System};

use crate::stub::UnsupportedManager;
use crate::supervise;

const SYSTEM_NAME: &str = "darwin-launchd";

pub struct LaunchdSystem {
    manager: UnsupportedManager,
}

impl LaunchdSystem {
    pub fn new() -> Self {
        Self {
            manager: UnsupportedManager::new(SYSTEM_NAME),
        }
    }
}

impl Default for LaunchdSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for LaunchdSystem {
    fn name(&self) -> &'static str {
        SYSTEM_NAME
    }

    fn detect(&self) -> bool {
        cfg!(target_os = "macos")
    }

    // launchd is pid 1; a service's parent is launchd itself.
    fn interactive(&self) -> bool {
        nix::unistd::getppid().as_raw() != 1
    }

    fn manager(&self) -> &dyn ServiceManager {
        &self.manager
    }

    fn run_managed(&self, name: &str, handler: Arc<dyn Interface>) -> Result<()> {
        supervise::run(name, handler)
    }
}
