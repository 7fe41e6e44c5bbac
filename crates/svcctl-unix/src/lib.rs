// Unix service systems (systemd, launchd)
//
// Neither backend registers services with its manager: every primitive
// reports "not supported". Detection, interactive detection and running
// under the manager are real.

#[cfg(unix)]
mod supervise;

#[cfg(unix)]
pub mod stub;

#[cfg(unix)]
pub mod systemd;

#[cfg(unix)]
pub mod launchd;
