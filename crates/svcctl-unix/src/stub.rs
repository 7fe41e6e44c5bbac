use svcctl_platform::{InstallSpec, ManagerState, Result, ServiceError, ServiceManager};

/// Manager primitives for systems without a registration path.
pub struct UnsupportedManager {
    system: &'static str,
}

impl UnsupportedManager {
    pub fn new(system: &'static str) -> Self {
        Self { system }
    }
}

impl ServiceManager for UnsupportedManager {
    fn install(&self, _spec: &InstallSpec) -> Result<()> {
        Err(ServiceError::NotSupported(self.system))
    }

    fn uninstall(&self, _name: &str) -> Result<()> {
        Err(ServiceError::NotSupported(self.system))
    }

    fn start(&self, _name: &str) -> Result<()> {
        Err(ServiceError::NotSupported(self.system))
    }

    fn stop(&self, _name: &str) -> Result<()> {
        Err(ServiceError::NotSupported(self.system))
    }

    fn query(&self, _name: &str) -> Result<ManagerState> {
        Err(ServiceError::NotSupported(self.system))
    }

    fn process_id(&self, _name: &str) -> Result<Option<u32>> {
        Ok(None)
    }
}
