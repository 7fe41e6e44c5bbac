// Windows Service Control Manager backend

#[cfg(target_os = "windows")]
pub mod session;

#[cfg(target_os = "windows")]
pub mod scm;

#[cfg(target_os = "windows")]
pub mod process;

#[cfg(target_os = "windows")]
mod dispatcher;

#[cfg(target_os = "windows")]
pub mod system;

#[cfg(target_os = "windows")]
pub use system::WindowsSystem;
