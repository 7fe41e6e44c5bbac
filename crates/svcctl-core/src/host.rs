//! Backend selection: systems are tried in registration order and the first
//! one that detects becomes the host for the rest of the process.

use std::sync::Arc;

use tracing::{debug, info};

use svcctl_platform::{Config, Interface, Result, ServiceError, System};

use crate::service::Service;

#[derive(Default)]
pub struct Registry {
    systems: Vec<Arc<dyn System>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, system: Arc<dyn System>) -> Self {
        self.systems.push(system);
        self
    }

    /// Bind to the first system that detects.
    pub fn detect(&self) -> Result<Host> {
        for system in &self.systems {
            if system.detect() {
                return Ok(Host::new(system.clone()));
            }
            debug!(system = system.name(), "service system not detected");
        }
        Err(ServiceError::NoSystemDetected)
    }
}

/// The detected service system, with its interactive flag resolved once.
#[derive(Clone)]
pub struct Host {
    system: Arc<dyn System>,
    interactive: bool,
}

impl Host {
    pub fn new(system: Arc<dyn System>) -> Self {
        let interactive = system.interactive();
        info!(
            system = system.name(),
            interactive, "service system detected"
        );
        Self {
            system,
            interactive,
        }
    }

    pub fn system(&self) -> &dyn System {
        self.system.as_ref()
    }

    pub fn name(&self) -> &'static str {
        self.system.name()
    }

    pub fn interactive(&self) -> bool {
        self.interactive
    }

    /// Bind a service object to this host.
    pub fn new_service(&self, handler: Arc<dyn Interface>, config: Config) -> Result<Service> {
        config.validate()?;
        Ok(Service::new(self.clone(), handler, config))
    }
}
