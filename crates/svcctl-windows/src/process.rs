//! Process liveness and forced termination for the stop fallback.

use anyhow::{Context, Result};
use tracing::debug;

use windows::Win32::Foundation::{CloseHandle, HANDLE, STILL_ACTIVE};
use windows::Win32::System::Threading::{
    GetExitCodeProcess, OpenProcess, TerminateProcess, PROCESS_ACCESS_RIGHTS,
    PROCESS_QUERY_LIMITED_INFORMATION, PROCESS_TERMINATE,
};

use svcctl_platform::ProcessControl;

/// Exit code handed to a killed service process.
const KILLED_EXIT_CODE: u32 = 1;

/// Closes the wrapped handle on drop.
struct OwnedHandle(HANDLE);

impl OwnedHandle {
    fn open(access: PROCESS_ACCESS_RIGHTS, pid: u32) -> windows::core::Result<Self> {
        unsafe { OpenProcess(access, false, pid).map(OwnedHandle) }
    }
}

impl Drop for OwnedHandle {
    fn drop(&mut self) {
        unsafe {
            let _ = CloseHandle(self.0);
        }
    }
}

pub struct WindowsProcessControl;

impl ProcessControl for WindowsProcessControl {
    fn is_alive(&self, pid: u32) -> bool {
        let handle = match OwnedHandle::open(PROCESS_QUERY_LIMITED_INFORMATION, pid) {
            Ok(h) => h,
            Err(e) => {
                debug!(pid, "OpenProcess failed, treating as exited: {}", e);
                return false;
            }
        };

        let mut code = 0u32;
        unsafe {
            if GetExitCodeProcess(handle.0, &mut code).is_err() {
                return false;
            }
        }
        code == STILL_ACTIVE.0 as u32
    }

    fn kill(&self, pid: u32) -> Result<()> {
        let handle = OwnedHandle::open(PROCESS_TERMINATE, pid)
            .with_context(|| format!("failed to open process {}", pid))?;
        unsafe {
            TerminateProcess(handle.0, KILLED_EXIT_CODE)
                .with_context(|| format!("failed to terminate process {}", pid))?;
        }
        Ok(())
    }
}
