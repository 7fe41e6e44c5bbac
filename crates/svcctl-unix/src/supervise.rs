//! Running under a Unix supervisor: SIGTERM / SIGINT become stop requests
//! for the shared dispatcher.

use std::sync::mpsc;
use std::sync::Arc;

use nix::sys::signal::{SigSet, SigmaskHow, Signal};
use tracing::{debug, info, warn};

use svcctl_platform::dispatch::{ControlEvent, Dispatcher, ReportedState, StatusReporter};
use svcctl_platform::{Interface, Result, ServiceError};

/// Supervisors on these systems have no status channel; transitions are
/// only logged.
struct LogReporter<'a> {
    name: &'a str,
}

impl StatusReporter for LogReporter<'_> {
    fn report(&mut self, state: ReportedState) -> anyhow::Result<()> {
        debug!(service = self.name, ?state, "service state");
        Ok(())
    }
}

pub(crate) fn run(name: &str, handler: Arc<dyn Interface>) -> Result<()> {
    let mut mask = SigSet::empty();
    mask.add(Signal::SIGTERM);
    mask.add(Signal::SIGINT);
    // Threads spawned from here on inherit the blocked mask, so only the
    // waiter below ever sees these signals.
    let previous = mask
        .thread_swap_mask(SigmaskHow::SIG_BLOCK)
        .map_err(ServiceError::manager)?;

    let result = dispatch(name, handler, mask);

    if let Err(e) = previous.thread_set_mask() {
        warn!(service = name, "failed to restore signal mask: {}", e);
    }
    result
}

fn dispatch(name: &str, handler: Arc<dyn Interface>, mask: SigSet) -> Result<()> {
    let (tx, rx) = mpsc::channel();
    std::thread::Builder::new()
        .name("svcctl-signals".into())
        .spawn(move || {
            if let Ok(signal) = mask.wait() {
                info!(?signal, "stop signal received");
                let event = match signal {
                    Signal::SIGTERM => ControlEvent::Stop,
                    _ => ControlEvent::Shutdown,
                };
                let _ = tx.send(event);
            }
        })
        .map_err(|e| ServiceError::io("failed to spawn signal thread", e))?;

    let outcome = Dispatcher::new(name, handler).run(&rx, &mut LogReporter { name });
    if outcome.is_failure() {
        return Err(ServiceError::Callback(anyhow::anyhow!(
            "service {} exited with code {}",
            name,
            outcome.exit_code()
        )));
    }
    Ok(())
}
