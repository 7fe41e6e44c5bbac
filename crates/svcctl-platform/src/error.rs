use std::fmt;

use thiserror::Error;

/// Retried lifecycle action, used to label exhausted budgets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Start,
    Stop,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Action::Start => "start",
            Action::Stop => "stop",
        })
    }
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("service name is required")]
    NameRequired,

    #[error("no service system detected")]
    NoSystemDetected,

    #[error("service {0} is not installed")]
    NotInstalled(String),

    #[error("service {0} already exists")]
    AlreadyExists(String),

    #[error("service {0} is running")]
    AlreadyRunning(String),

    #[error("operation not supported by {0}")]
    NotSupported(&'static str),

    #[error("service manager call failed: {0:#}")]
    Manager(#[source] anyhow::Error),

    #[error("status of service {name} is unknown: {source:#}")]
    StatusUnknown {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("{action} of service {name} failed after {attempts} attempts")]
    RetryExhausted {
        name: String,
        action: Action,
        attempts: u32,
    },

    #[error("service callback failed: {0:#}")]
    Callback(#[source] anyhow::Error),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl ServiceError {
    pub fn manager(err: impl Into<anyhow::Error>) -> Self {
        ServiceError::Manager(err.into())
    }

    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        ServiceError::Io {
            context: context.into(),
            source,
        }
    }

    /// Errors that no amount of retrying will fix.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ServiceError::NameRequired
                | ServiceError::NoSystemDetected
                | ServiceError::NotInstalled(_)
                | ServiceError::NotSupported(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;
