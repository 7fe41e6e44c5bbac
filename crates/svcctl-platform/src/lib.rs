//! Platform-neutral vocabulary shared by every service backend.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod service;
pub mod status;

pub use config::Config;
pub use error::{Result, ServiceError};
pub use service::{InstallSpec, Interface, ProcessControl, ServiceManager, System};
pub use status::{ManagerState, Status};
