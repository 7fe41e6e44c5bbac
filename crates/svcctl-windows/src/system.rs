use std::sync::Arc;

use svcctl_platform::{Interface, ProcessControl, Result, ServiceManager, System};

use crate::dispatcher;
use crate::process::WindowsProcessControl;
use crate::scm::ScmManager;
use crate::session;

const SYSTEM_NAME: &str = "windows-service";

/// Windows-family backend: SCM registration plus the kill fallback.
pub struct WindowsSystem {
    manager: ScmManager,
    process: WindowsProcessControl,
}

impl WindowsSystem {
    pub fn new() -> Self {
        Self {
            manager: ScmManager,
            process: WindowsProcessControl,
        }
    }
}

impl Default for WindowsSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for WindowsSystem {
    fn name(&self) -> &'static str {
        SYSTEM_NAME
    }

    fn detect(&self) -> bool {
        true
    }

    fn interactive(&self) -> bool {
        session::is_interactive_session()
    }

    fn manager(&self) -> &dyn ServiceManager {
        &self.manager
    }

    fn process_control(&self) -> Option<&dyn ProcessControl> {
        Some(&self.process)
    }

    fn run_managed(&self, name: &str, handler: Arc<dyn Interface>) -> Result<()> {
        dispatcher::run(name, handler)
    }
}
