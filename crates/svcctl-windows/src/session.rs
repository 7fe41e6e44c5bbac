// Windows session detection
//
// Services run in Session 0 (SYSTEM service context); anything started by a
// logged-in user runs in session 1 or above.

use windows::Win32::Foundation::BOOL;
use windows::Win32::System::Threading::GetCurrentProcessId;

use tracing::{debug, warn};

/// FFI binding for ProcessIdToSessionId (not always in the windows crate features)
extern "system" {
    fn ProcessIdToSessionId(dwProcessId: u32, pSessionId: *mut u32) -> BOOL;
}

/// Returns the session ID of the current process, or `None` if the lookup
/// failed.
pub fn current_session_id() -> Option<u32> {
    unsafe {
        let pid = GetCurrentProcessId();
        let mut session_id: u32 = 0;
        if ProcessIdToSessionId(pid, &mut session_id).as_bool() {
            Some(session_id)
        } else {
            warn!("ProcessIdToSessionId failed");
            None
        }
    }
}

/// Returns true if the process was started by a user rather than by the
/// Service Control Manager. A failed lookup counts as service context.
pub fn is_interactive_session() -> bool {
    let session_id = current_session_id();
    debug!(session_id = ?session_id, "windows session detection");
    matches!(session_id, Some(id) if id != 0)
}
