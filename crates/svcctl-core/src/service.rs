use std::sync::Arc;

use tracing::info;

use svcctl_platform::{Config, InstallSpec, Interface, Result, ServiceError, ServiceManager, Status};

use crate::control::query_status;
use crate::host::Host;
use crate::shutdown;

/// A service bound to one config, one set of callbacks and the host system.
///
/// Lifecycle methods forward straight to the manager primitives without the
/// preconditions and retries of [`crate::Controller`].
pub struct Service {
    host: Host,
    handler: Arc<dyn Interface>,
    config: Config,
}

impl Service {
    pub(crate) fn new(host: Host, handler: Arc<dyn Interface>, config: Config) -> Self {
        Self {
            host,
            handler,
            config,
        }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn platform(&self) -> &'static str {
        self.host.name()
    }

    fn manager(&self) -> &dyn ServiceManager {
        self.host.system().manager()
    }

    pub fn install(&self, password: Option<String>) -> Result<()> {
        let spec = InstallSpec::from_config(&self.config, password)?;
        self.manager().install(&spec)
    }

    pub fn uninstall(&self) -> Result<()> {
        self.manager().uninstall(self.name())
    }

    pub fn start(&self) -> Result<()> {
        self.manager().start(self.name())
    }

    pub fn stop(&self) -> Result<()> {
        self.manager().stop(self.name())
    }

    /// Stop then start. A failure in between leaves the service stopped.
    pub fn restart(&self) -> Result<()> {
        self.stop()?;
        self.start()
    }

    pub fn status(&self) -> Result<Status> {
        query_status(self.manager(), self.name())
    }

    /// Run the service: under the manager, hand over to its dispatcher;
    /// interactively, start, wait for Ctrl-C / SIGTERM, then stop.
    pub fn run(&self) -> Result<()> {
        if self.host.interactive() {
            self.run_interactive(shutdown::wait_for_shutdown)
        } else {
            info!(service = self.name(), system = self.platform(), "running under service manager");
            self.host
                .system()
                .run_managed(self.name(), self.handler.clone())
        }
    }

    fn run_interactive<F>(&self, wait: F) -> Result<()>
    where
        F: FnOnce() -> std::io::Result<()>,
    {
        info!(service = self.name(), "running interactively");
        self.handler.start().map_err(ServiceError::Callback)?;
        let waited = wait();
        let stopped = self.handler.stop().map_err(ServiceError::Callback);
        waited.map_err(|e| ServiceError::io("failed to wait for shutdown signal", e))?;
        stopped
    }
}
