//! Windows Service Control Manager (SCM) primitives.

use std::ffi::{OsStr, OsString};
use std::time::{Duration, Instant};

use tracing::{debug, info};
use windows::core::w;
use windows::Win32::Foundation::ERROR_SUCCESS;
use windows::Win32::System::Registry::{RegGetValueW, HKEY_LOCAL_MACHINE, RRF_RT_REG_SZ};
use windows_service::service::{
    Service, ServiceAccess, ServiceDependency, ServiceErrorControl, ServiceInfo, ServiceStartType,
    ServiceState, ServiceType,
};
use windows_service::service_manager::{ServiceManager as Scm, ServiceManagerAccess};

use svcctl_platform::{InstallSpec, ManagerState, Result, ServiceError, ServiceManager};

const ERROR_SERVICE_ALREADY_RUNNING: i32 = 1056;
const ERROR_SERVICE_DOES_NOT_EXIST: i32 = 1060;
const ERROR_SERVICE_NOT_ACTIVE: i32 = 1062;

const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_millis(20_000);
const STOP_POLL_INTERVAL: Duration = Duration::from_millis(50);

fn os_error(err: &windows_service::Error) -> Option<i32> {
    match err {
        windows_service::Error::Winapi(io) => io.raw_os_error(),
        _ => None,
    }
}

/// Map an SCM error for `name`, folding "does not exist" into `NotInstalled`.
fn map_err(name: &str, err: windows_service::Error) -> ServiceError {
    if os_error(&err) == Some(ERROR_SERVICE_DOES_NOT_EXIST) {
        ServiceError::NotInstalled(name.to_string())
    } else {
        ServiceError::manager(err)
    }
}

fn fold_state(state: ServiceState) -> ManagerState {
    match state {
        ServiceState::StartPending => ManagerState::StartPending,
        ServiceState::Running => ManagerState::Running,
        ServiceState::ContinuePending => ManagerState::ContinuePending,
        ServiceState::PausePending => ManagerState::PausePending,
        ServiceState::Paused => ManagerState::Paused,
        ServiceState::StopPending => ManagerState::StopPending,
        ServiceState::Stopped => ManagerState::Stopped,
    }
}

/// How long Windows waits before killing a service that ignores a stop,
/// from `WaitToKillServiceTimeout`.
fn stop_timeout() -> Duration {
    let mut buf = [0u16; 32];
    let mut size = (buf.len() * std::mem::size_of::<u16>()) as u32;
    let rc = unsafe {
        RegGetValueW(
            HKEY_LOCAL_MACHINE,
            w!("SYSTEM\\CurrentControlSet\\Control"),
            w!("WaitToKillServiceTimeout"),
            RRF_RT_REG_SZ,
            None,
            Some(buf.as_mut_ptr().cast()),
            Some(&mut size as *mut u32),
        )
    };
    if rc != ERROR_SUCCESS {
        return DEFAULT_STOP_TIMEOUT;
    }

    let len = buf.iter().position(|&c| c == 0).unwrap_or(buf.len());
    String::from_utf16_lossy(&buf[..len])
        .trim()
        .parse::<u64>()
        .map(Duration::from_millis)
        .unwrap_or(DEFAULT_STOP_TIMEOUT)
}

pub struct ScmManager;

impl ScmManager {
    fn connect(access: ServiceManagerAccess) -> Result<Scm> {
        Scm::local_computer(None::<&str>, access).map_err(ServiceError::manager)
    }

    fn open(name: &str, access: ServiceAccess) -> Result<Service> {
        let scm = Self::connect(ServiceManagerAccess::CONNECT)?;
        scm.open_service(name, access).map_err(|e| map_err(name, e))
    }

    /// Request a stop and poll until the service reports `Stopped` or the
    /// system kill timeout passes.
    fn stop_wait(name: &str, service: &Service) -> Result<()> {
        let mut status = match service.stop() {
            Ok(status) => status,
            Err(e) if os_error(&e) == Some(ERROR_SERVICE_NOT_ACTIVE) => return Ok(()),
            Err(e) => return Err(map_err(name, e)),
        };

        let deadline = Instant::now() + stop_timeout() + STOP_POLL_INTERVAL * 2;
        while status.current_state != ServiceState::Stopped {
            if Instant::now() >= deadline {
                debug!(service = name, state = ?status.current_state, "stop wait timed out");
                break;
            }
            std::thread::sleep(STOP_POLL_INTERVAL);
            status = service.query_status().map_err(|e| map_err(name, e))?;
        }
        Ok(())
    }
}

impl ServiceManager for ScmManager {
    fn install(&self, spec: &InstallSpec) -> Result<()> {
        let scm = Self::connect(ServiceManagerAccess::CONNECT | ServiceManagerAccess::CREATE_SERVICE)?;
        if scm.open_service(&spec.name, ServiceAccess::QUERY_STATUS).is_ok() {
            return Err(ServiceError::AlreadyExists(spec.name.clone()));
        }

        let info = ServiceInfo {
            name: OsString::from(&spec.name),
            display_name: OsString::from(&spec.display_name),
            service_type: ServiceType::OWN_PROCESS,
            start_type: ServiceStartType::AutoStart,
            error_control: ServiceErrorControl::Normal,
            executable_path: spec.executable.clone(),
            launch_arguments: spec.arguments.iter().map(OsString::from).collect(),
            dependencies: spec
                .dependencies
                .iter()
                .map(|d| ServiceDependency::Service(OsString::from(d)))
                .collect(),
            account_name: spec.account.as_ref().map(OsString::from),
            account_password: spec.password.as_ref().map(OsString::from),
        };

        let service = scm
            .create_service(&info, ServiceAccess::CHANGE_CONFIG)
            .map_err(ServiceError::manager)?;

        if !spec.description.is_empty() {
            service
                .set_description(&spec.description)
                .map_err(ServiceError::manager)?;
        }

        info!(service = %spec.name, "registered with service control manager");
        Ok(())
    }

    fn uninstall(&self, name: &str) -> Result<()> {
        let service = Self::open(name, ServiceAccess::DELETE)?;
        service.delete().map_err(|e| map_err(name, e))
    }

    fn start(&self, name: &str) -> Result<()> {
        let service = Self::open(name, ServiceAccess::START)?;
        match service.start(&[] as &[&OsStr]) {
            Ok(()) => Ok(()),
            Err(e) if os_error(&e) == Some(ERROR_SERVICE_ALREADY_RUNNING) => Ok(()),
            Err(e) => Err(map_err(name, e)),
        }
    }

    fn stop(&self, name: &str) -> Result<()> {
        let service = Self::open(name, ServiceAccess::STOP | ServiceAccess::QUERY_STATUS)?;
        Self::stop_wait(name, &service)
    }

    fn query(&self, name: &str) -> Result<ManagerState> {
        let service = Self::open(name, ServiceAccess::QUERY_STATUS)?;
        let status = service.query_status().map_err(|e| map_err(name, e))?;
        Ok(fold_state(status.current_state))
    }

    fn process_id(&self, name: &str) -> Result<Option<u32>> {
        let service = Self::open(name, ServiceAccess::QUERY_STATUS)?;
        let status = service.query_status().map_err(|e| map_err(name, e))?;
        Ok(status.process_id.filter(|pid| *pid != 0))
    }
}
