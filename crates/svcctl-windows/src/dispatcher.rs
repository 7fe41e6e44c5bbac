//! SCM service entry point. The SCM calls back into a plain `extern`
//! function, so the handler is parked in a process-wide cell for the one
//! dispatcher run a process may have.

use std::ffi::OsString;
use std::sync::mpsc;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use tracing::{error, info};
use windows_service::service::{
    ServiceControl, ServiceControlAccept, ServiceExitCode, ServiceState, ServiceStatus,
    ServiceType,
};
use windows_service::service_control_handler::{
    self, ServiceControlHandlerResult, ServiceStatusHandle,
};
use windows_service::{define_windows_service, service_dispatcher};

use svcctl_platform::dispatch::{ControlEvent, Dispatcher, ReportedState, StatusReporter};
use svcctl_platform::{Interface, Result, ServiceError};

const PENDING_WAIT_HINT: Duration = Duration::from_secs(10);

struct Registration {
    name: String,
    handler: Arc<dyn Interface>,
}

static REGISTRATION: OnceLock<Registration> = OnceLock::new();

define_windows_service!(ffi_service_main, service_main);

/// Block in the SCM dispatcher until the service stops.
pub(crate) fn run(name: &str, handler: Arc<dyn Interface>) -> Result<()> {
    REGISTRATION
        .set(Registration {
            name: name.to_string(),
            handler,
        })
        .map_err(|_| ServiceError::manager(anyhow::anyhow!("service dispatcher already started")))?;

    info!(service = name, "starting service dispatcher");
    service_dispatcher::start(name, ffi_service_main).map_err(ServiceError::manager)?;
    info!(service = name, "service dispatcher returned");
    Ok(())
}

fn service_main(_arguments: Vec<OsString>) {
    if let Err(e) = run_service() {
        error!("service failed: {}", e);
    }
}

fn run_service() -> windows_service::Result<()> {
    let Some(registration) = REGISTRATION.get() else {
        return Ok(());
    };

    let (tx, rx) = mpsc::channel();
    let event_handler = move |control| -> ServiceControlHandlerResult {
        let event = match control {
            ServiceControl::Stop => ControlEvent::Stop,
            ServiceControl::Shutdown => ControlEvent::Shutdown,
            ServiceControl::Interrogate => ControlEvent::Interrogate,
            _ => return ServiceControlHandlerResult::NotImplemented,
        };
        let _ = tx.send(event);
        ServiceControlHandlerResult::NoError
    };

    let handle = service_control_handler::register(&registration.name, event_handler)?;
    let mut reporter = ScmReporter {
        handle,
        checkpoint: 0,
    };

    let outcome = Dispatcher::new(registration.name.clone(), registration.handler.clone())
        .run(&rx, &mut reporter);

    let exit_code = if outcome.is_failure() {
        ServiceExitCode::ServiceSpecific(outcome.exit_code())
    } else {
        ServiceExitCode::Win32(0)
    };
    handle.set_service_status(ServiceStatus {
        service_type: ServiceType::OWN_PROCESS,
        current_state: ServiceState::Stopped,
        controls_accepted: ServiceControlAccept::empty(),
        exit_code,
        checkpoint: 0,
        wait_hint: Duration::default(),
        process_id: None,
    })
}

struct ScmReporter {
    handle: ServiceStatusHandle,
    checkpoint: u32,
}

impl StatusReporter for ScmReporter {
    fn report(&mut self, state: ReportedState) -> anyhow::Result<()> {
        let (current_state, controls_accepted, wait_hint) = match state {
            ReportedState::StartPending => (
                ServiceState::StartPending,
                ServiceControlAccept::empty(),
                PENDING_WAIT_HINT,
            ),
            ReportedState::Running => (
                ServiceState::Running,
                ServiceControlAccept::STOP | ServiceControlAccept::SHUTDOWN,
                Duration::default(),
            ),
            ReportedState::StopPending => (
                ServiceState::StopPending,
                ServiceControlAccept::empty(),
                PENDING_WAIT_HINT,
            ),
        };

        // Pending states must advance the checkpoint on every report.
        let checkpoint = if wait_hint.is_zero() {
            0
        } else {
            self.checkpoint += 1;
            self.checkpoint
        };

        self.handle.set_service_status(ServiceStatus {
            service_type: ServiceType::OWN_PROCESS,
            current_state,
            controls_accepted,
            exit_code: ServiceExitCode::Win32(0),
            checkpoint,
            wait_hint,
            process_id: None,
        })?;
        Ok(())
    }
}
