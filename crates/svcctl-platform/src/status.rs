use std::fmt;

use serde::{Deserialize, Serialize};

/// Service status as seen by callers of the control layer.
///
/// Always derived from a fresh manager query; never cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// The query failed for a reason other than "not installed".
    Unknown,
    Running,
    Stopped,
    Uninstalled,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Unknown => "unknown",
            Status::Running => "running",
            Status::Stopped => "stopped",
            Status::Uninstalled => "uninstalled",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw state reported by a native service manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagerState {
    StartPending,
    Running,
    ContinuePending,
    PausePending,
    Paused,
    StopPending,
    Stopped,
}

impl ManagerState {
    /// Fold the native state onto its nearest stable neighbour.
    ///
    /// A starting service already owns a process, so it counts as running;
    /// every paused or stopping state counts as stopped.
    pub fn fold(self) -> Status {
        match self {
            ManagerState::StartPending | ManagerState::Running => Status::Running,
            ManagerState::ContinuePending
            | ManagerState::PausePending
            | ManagerState::Paused
            | ManagerState::StopPending
            | ManagerState::Stopped => Status::Stopped,
        }
    }
}

impl From<ManagerState> for Status {
    fn from(state: ManagerState) -> Self {
        state.fold()
    }
}
