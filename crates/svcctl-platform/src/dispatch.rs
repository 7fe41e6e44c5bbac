//! Manager-event dispatcher shared by every backend that supervises the
//! service process itself.
//!
//! The backend owns the native plumbing (control handler registration,
//! status handle); it forwards control requests into a channel and lets
//! [`Dispatcher::run`] drive the user callbacks and the reported state.

use std::sync::mpsc::Receiver;
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::service::Interface;

/// Control request delivered by the manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlEvent {
    Stop,
    Shutdown,
    Interrogate,
    Other,
}

/// State the dispatcher reports back to the manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportedState {
    StartPending,
    Running,
    StopPending,
}

pub trait StatusReporter {
    fn report(&mut self, state: ReportedState) -> anyhow::Result<()>;
}

/// How the callback loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitOutcome {
    Graceful,
    StartFailed,
    StopFailed,
}

impl ExitOutcome {
    /// Service-specific exit code handed to the manager.
    pub fn exit_code(&self) -> u32 {
        match self {
            ExitOutcome::Graceful => 0,
            ExitOutcome::StartFailed => 1,
            ExitOutcome::StopFailed => 2,
        }
    }

    pub fn is_failure(&self) -> bool {
        *self != ExitOutcome::Graceful
    }
}

pub struct Dispatcher {
    name: String,
    handler: Arc<dyn Interface>,
}

impl Dispatcher {
    pub fn new(name: impl Into<String>, handler: Arc<dyn Interface>) -> Self {
        Self {
            name: name.into(),
            handler,
        }
    }

    /// Run the callback loop until a stop, a shutdown, or the manager
    /// hangs up the event channel. Blocks on each user callback.
    pub fn run(
        &self,
        events: &Receiver<ControlEvent>,
        reporter: &mut dyn StatusReporter,
    ) -> ExitOutcome {
        let mut current = ReportedState::StartPending;
        self.report(reporter, current);

        if let Err(e) = self.handler.start() {
            error!(service = %self.name, "service start failed: {:#}", e);
            return ExitOutcome::StartFailed;
        }

        current = ReportedState::Running;
        self.report(reporter, current);
        info!(service = %self.name, "service running");

        loop {
            let event = match events.recv() {
                Ok(event) => event,
                Err(_) => {
                    warn!(service = %self.name, "control channel closed, shutting down");
                    ControlEvent::Shutdown
                }
            };

            match event {
                ControlEvent::Interrogate => self.report(reporter, current),
                ControlEvent::Stop | ControlEvent::Shutdown => {
                    current = ReportedState::StopPending;
                    self.report(reporter, current);
                    return match self.handler.stop() {
                        Ok(()) => {
                            info!(service = %self.name, ?event, "service stopped");
                            ExitOutcome::Graceful
                        }
                        Err(e) => {
                            error!(service = %self.name, ?event, "service stop failed: {:#}", e);
                            ExitOutcome::StopFailed
                        }
                    };
                }
                ControlEvent::Other => continue,
            }
        }
    }

    fn report(&self, reporter: &mut dyn StatusReporter, state: ReportedState) {
        if let Err(e) = reporter.report(state) {
            warn!(service = %self.name, ?state, "failed to report status: {:#}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;

    #[derive(Default)]
    struct Program {
        fail_start: bool,
        fail_stop: bool,
        starts: AtomicUsize,
        stops: AtomicUsize,
    }

    impl Interface for Program {
        fn start(&self) -> anyhow::Result<()> {
            self.starts.fetch_add(1, Ordering::SeqCst);
            if self.fail_start {
                anyhow::bail!("boom");
            }
            Ok(())
        }

        fn stop(&self) -> anyhow::Result<()> {
            self.stops.fetch_add(1, Ordering::SeqCst);
            if self.fail_stop {
                anyhow::bail!("stuck");
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct Recorder(Vec<ReportedState>);

    impl StatusReporter for Recorder {
        fn report(&mut self, state: ReportedState) -> anyhow::Result<()> {
            self.0.push(state);
            Ok(())
        }
    }

    fn dispatch(program: Arc<Program>, events: Vec<ControlEvent>) -> (ExitOutcome, Vec<ReportedState>) {
        let (tx, rx) = mpsc::channel();
        for event in events {
            tx.send(event).unwrap();
        }
        drop(tx);
        let mut recorder = Recorder::default();
        let outcome = Dispatcher::new("demo", program).run(&rx, &mut recorder);
        (outcome, recorder.0)
    }

    #[test]
    fn test_stop_after_interrogate() {
        let program = Arc::new(Program::default());
        let (outcome, states) = dispatch(
            program.clone(),
            vec![ControlEvent::Interrogate, ControlEvent::Other, ControlEvent::Stop],
        );
        assert_eq!(outcome, ExitOutcome::Graceful);
        assert_eq!(
            states,
            vec![
                ReportedState::StartPending,
                ReportedState::Running,
                ReportedState::Running,
                ReportedState::StopPending,
            ]
        );
        assert_eq!(program.stops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_start_failure_never_reaches_running() {
        let program = Arc::new(Program {
            fail_start: true,
            ..Program::default()
        });
        let (outcome, states) = dispatch(program.clone(), vec![ControlEvent::Stop]);
        assert_eq!(outcome, ExitOutcome::StartFailed);
        assert_eq!(outcome.exit_code(), 1);
        assert_eq!(states, vec![ReportedState::StartPending]);
        assert_eq!(program.stops.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_shutdown_stop_failure() {
        let program = Arc::new(Program {
            fail_stop: true,
            ..Program::default()
        });
        let (outcome, _) = dispatch(program, vec![ControlEvent::Shutdown]);
        assert_eq!(outcome, ExitOutcome::StopFailed);
        assert_eq!(outcome.exit_code(), 2);
    }

    #[test]
    fn test_closed_channel_stops_service() {
        let program = Arc::new(Program::default());
        let (outcome, states) = dispatch(program.clone(), vec![]);
        assert_eq!(outcome, ExitOutcome::Graceful);
        assert_eq!(states.last(), Some(&ReportedState::StopPending));
        assert_eq!(program.stops.load(Ordering::SeqCst), 1);
    }
}
