//! Lifecycle orchestration: precondition checks, bounded retries and the
//! kill fallback, layered over the raw manager primitives of the host.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use svcctl_platform::error::Action;
use svcctl_platform::{
    InstallSpec, ProcessControl, Result, ServiceError, ServiceManager, Status,
};

use crate::host::Host;
use crate::pid_record::PidRecord;

/// Attempt budget and pause between attempts for start/stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    #[serde(default = "default_attempts")]
    pub attempts: u32,

    /// Pause between attempts in milliseconds
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
}

fn default_attempts() -> u32 {
    3
}
fn default_delay_ms() -> u64 {
    1000
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: default_attempts(),
            delay_ms: default_delay_ms(),
        }
    }
}

impl RetryPolicy {
    pub fn new(attempts: u32, delay: Duration) -> Self {
        Self {
            attempts,
            delay_ms: u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
        }
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    fn budget(&self) -> u32 {
        self.attempts.max(1)
    }
}

/// Query a service and normalize the answer to [`Status`].
///
/// "Not installed" becomes `Uninstalled`; `NotSupported` passes through;
/// any other failure becomes `StatusUnknown`.
pub fn query_status(manager: &dyn ServiceManager, name: &str) -> Result<Status> {
    match manager.query(name) {
        Ok(state) => Ok(state.fold()),
        Err(ServiceError::NotInstalled(_)) => Ok(Status::Uninstalled),
        Err(e @ ServiceError::NotSupported(_)) => Err(e),
        Err(ServiceError::Manager(source)) => Err(ServiceError::StatusUnknown {
            name: name.to_string(),
            source,
        }),
        Err(e) => Err(ServiceError::StatusUnknown {
            name: name.to_string(),
            source: e.into(),
        }),
    }
}

/// Stateless lifecycle operations against the bound host.
pub struct Controller {
    host: Host,
    policy: RetryPolicy,
    pid_record: PidRecord,
}

impl Controller {
    pub fn new(host: Host, policy: RetryPolicy, pid_record: PidRecord) -> Self {
        Self {
            host,
            policy,
            pid_record,
        }
    }

    pub fn host(&self) -> &Host {
        &self.host
    }

    fn manager(&self) -> &dyn ServiceManager {
        self.host.system().manager()
    }

    pub fn status(&self, name: &str) -> Result<Status> {
        check_name(name)?;
        query_status(self.manager(), name)
    }

    pub fn process_id(&self, name: &str) -> Result<Option<u32>> {
        check_name(name)?;
        self.manager().process_id(name)
    }

    /// Register a service that is not installed yet. An installed but idle
    /// service is left alone; a running one is refused.
    pub fn install(&self, spec: &InstallSpec) -> Result<()> {
        check_name(&spec.name)?;
        match self.status(&spec.name)? {
            Status::Running => {
                warn!(service = %spec.name, "install refused, service is running");
                Err(ServiceError::AlreadyRunning(spec.name.clone()))
            }
            Status::Uninstalled => {
                info!(service = %spec.name, executable = %spec.executable.display(), "installing service");
                self.manager().install(spec)?;
                info!(service = %spec.name, "service installed");
                Ok(())
            }
            status => {
                info!(service = %spec.name, %status, "service already installed");
                Ok(())
            }
        }
    }

    pub fn start(&self, name: &str) -> Result<()> {
        check_name(name)?;
        match self.status(name)? {
            Status::Running => {
                info!(service = name, "service already running");
                return Ok(());
            }
            Status::Uninstalled => {
                error!(service = name, "cannot start, service not installed");
                return Err(ServiceError::NotInstalled(name.to_string()));
            }
            _ => {}
        }

        let budget = self.policy.budget();
        for attempt in 1..=budget {
            info!(service = name, attempt, "starting service");
            match self.manager().start(name) {
                Ok(()) => {}
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => warn!(service = name, attempt, "start call failed: {}", e),
            }

            let status = self.probe(name);
            if status == Status::Running {
                self.record_pid(name);
                info!(service = name, attempt, "service started");
                return Ok(());
            }
            warn!(service = name, attempt, %status, "service did not start");
            self.pause(attempt, budget);
        }

        error!(service = name, attempts = budget, "start failed");
        Err(ServiceError::RetryExhausted {
            name: name.to_string(),
            action: Action::Start,
            attempts: budget,
        })
    }

    pub fn stop(&self, name: &str) -> Result<()> {
        check_name(name)?;
        let status = self.status(name)?;
        if status != Status::Running {
            info!(service = name, %status, "service not running");
            return Ok(());
        }

        let budget = self.policy.budget();
        for attempt in 1..=budget {
            info!(service = name, attempt, "stopping service");
            match self.manager().stop(name) {
                Ok(()) => {}
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => warn!(service = name, attempt, "stop call failed: {}", e),
            }

            let status = self.probe(name);
            if status == Status::Stopped {
                info!(service = name, attempt, "service stopped");
                return Ok(());
            }
            warn!(service = name, attempt, %status, "service did not stop");
            self.pause(attempt, budget);
        }

        if let Some(process) = self.host.system().process_control() {
            match self.kill_recorded(name, process) {
                Ok(true) => return Ok(()),
                Ok(false) => {}
                Err(e) => warn!(service = name, "kill fallback failed: {}", e),
            }
        }

        error!(service = name, attempts = budget, "stop failed");
        Err(ServiceError::RetryExhausted {
            name: name.to_string(),
            action: Action::Stop,
            attempts: budget,
        })
    }

    /// Remove the registration in a single attempt.
    pub fn uninstall(&self, name: &str) -> Result<()> {
        check_name(name)?;
        if self.status(name)? == Status::Uninstalled {
            info!(service = name, "service already uninstalled");
            return Ok(());
        }
        info!(service = name, "uninstalling service");
        self.manager().uninstall(name)?;
        info!(service = name, "service uninstalled");
        Ok(())
    }

    /// Status for convergence checks inside a retry loop: errors count as
    /// `Unknown` and never end the loop.
    fn probe(&self, name: &str) -> Status {
        match query_status(self.manager(), name) {
            Ok(status) => status,
            Err(e) => {
                warn!(service = name, "status query failed: {}", e);
                Status::Unknown
            }
        }
    }

    fn pause(&self, attempt: u32, budget: u32) {
        if attempt < budget && self.policy.delay_ms > 0 {
            std::thread::sleep(self.policy.delay());
        }
    }

    fn record_pid(&self, name: &str) {
        match self.manager().process_id(name) {
            Ok(Some(pid)) => match self.pid_record.write(pid) {
                Ok(()) => debug!(service = name, pid, "pid recorded"),
                Err(e) => warn!(service = name, pid, "failed to record pid: {}", e),
            },
            Ok(None) => debug!(service = name, "manager reported no pid"),
            Err(e) => warn!(service = name, "failed to query pid: {}", e),
        }
    }

    /// Kill the recorded process if it is still alive. Returns whether a
    /// kill was delivered.
    fn kill_recorded(&self, name: &str, process: &dyn ProcessControl) -> Result<bool> {
        let pid = match self.pid_record.live_pid(process)? {
            Some(pid) => pid,
            None => {
                info!(service = name, record = %self.pid_record.path().display(), "no live recorded process to kill");
                return Ok(false);
            }
        };

        warn!(service = name, pid, "stop did not converge, killing recorded process");
        process.kill(pid).map_err(ServiceError::Manager)?;
        info!(service = name, pid, "recorded process killed");
        Ok(true)
    }
}

fn check_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(ServiceError::NameRequired);
    }
    Ok(())
}
