pub mod control;
pub mod host;
pub mod pid_record;
pub mod service;
pub mod settings;
pub mod shutdown;

#[cfg(test)]
pub(crate) mod fake;

pub use control::{Controller, RetryPolicy};
pub use host::{Host, Registry};
pub use pid_record::PidRecord;
pub use service::Service;
pub use settings::Settings;
