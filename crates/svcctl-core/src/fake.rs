//! Scripted in-memory service system for tests.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};

use svcctl_platform::dispatch::{ControlEvent, Dispatcher, ReportedState, StatusReporter};
use svcctl_platform::{
    InstallSpec, Interface, ManagerState, ProcessControl, Result, ServiceError, ServiceManager,
    System,
};

/// When a start/stop request takes effect.
#[derive(Debug, Clone, Copy)]
pub enum Converge {
    /// On the n-th call after being configured
    After(u32),
    Never,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Calls {
    pub install: u32,
    pub uninstall: u32,
    pub start: u32,
    pub stop: u32,
}

struct Inner {
    state: Option<ManagerState>,
    start: Converge,
    stop: Converge,
    start_pending: u32,
    stop_pending: u32,
    pid: Option<u32>,
    /// Queries answered before every further query fails
    queries_left: Option<u32>,
    unsupported: bool,
    calls: Calls,
}

pub struct FakeManager {
    inner: Mutex<Inner>,
}

impl Default for FakeManager {
    fn default() -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: None,
                start: Converge::After(1),
                stop: Converge::After(1),
                start_pending: 0,
                stop_pending: 0,
                pid: None,
                queries_left: None,
                unsupported: false,
                calls: Calls::default(),
            }),
        }
    }
}

impl FakeManager {
    pub fn set_state(&self, state: Option<ManagerState>) {
        self.inner.lock().unwrap().state = state;
    }

    pub fn set_start(&self, converge: Converge) {
        let mut inner = self.inner.lock().unwrap();
        inner.start = converge;
        inner.start_pending = 0;
    }

    pub fn set_stop(&self, converge: Converge) {
        let mut inner = self.inner.lock().unwrap();
        inner.stop = converge;
        inner.stop_pending = 0;
    }

    pub fn set_pid(&self, pid: Option<u32>) {
        self.inner.lock().unwrap().pid = pid;
    }

    pub fn fail_queries(&self, fail: bool) {
        self.inner.lock().unwrap().queries_left = fail.then_some(0);
    }

    pub fn fail_queries_after(&self, answered: u32) {
        self.inner.lock().unwrap().queries_left = Some(answered);
    }

    pub fn calls(&self) -> Calls {
        self.inner.lock().unwrap().calls
    }

    fn guard(&self) -> Result<std::sync::MutexGuard<'_, Inner>> {
        let inner = self.inner.lock().unwrap();
        if inner.unsupported {
            return Err(ServiceError::NotSupported("stub"));
        }
        Ok(inner)
    }
}

fn converged(converge: Converge, pending: u32) -> bool {
    match converge {
        Converge::After(n) => pending >= n,
        Converge::Never => false,
    }
}

impl ServiceManager for FakeManager {
    fn install(&self, spec: &InstallSpec) -> Result<()> {
        let mut inner = self.guard()?;
        inner.calls.install += 1;
        if inner.state.is_some() {
            return Err(ServiceError::AlreadyExists(spec.name.clone()));
        }
        inner.state = Some(ManagerState::Stopped);
        Ok(())
    }

    fn uninstall(&self, name: &str) -> Result<()> {
        let mut inner = self.guard()?;
        inner.calls.uninstall += 1;
        if inner.state.take().is_none() {
            return Err(ServiceError::NotInstalled(name.to_string()));
        }
        Ok(())
    }

    fn start(&self, name: &str) -> Result<()> {
        let mut inner = self.guard()?;
        inner.calls.start += 1;
        if inner.state.is_none() {
            return Err(ServiceError::NotInstalled(name.to_string()));
        }
        inner.start_pending += 1;
        if converged(inner.start, inner.start_pending) {
            inner.state = Some(ManagerState::Running);
            Ok(())
        } else {
            inner.state = Some(ManagerState::Stopped);
            Err(ServiceError::manager(anyhow::anyhow!("service did not respond")))
        }
    }

    fn stop(&self, _name: &str) -> Result<()> {
        let mut inner = self.guard()?;
        inner.calls.stop += 1;
        inner.stop_pending += 1;
        if converged(inner.stop, inner.stop_pending) {
            inner.state = Some(ManagerState::Stopped);
            Ok(())
        } else {
            inner.state = Some(ManagerState::StartPending);
            Err(ServiceError::manager(anyhow::anyhow!("service did not respond")))
        }
    }

    fn query(&self, name: &str) -> Result<ManagerState> {
        let mut inner = self.guard()?;
        match inner.queries_left {
            Some(0) => return Err(ServiceError::manager(anyhow::anyhow!("access denied"))),
            Some(n) => inner.queries_left = Some(n - 1),
            None => {}
        }
        inner
            .state
            .ok_or_else(|| ServiceError::NotInstalled(name.to_string()))
    }

    fn process_id(&self, _name: &str) -> Result<Option<u32>> {
        let inner = self.guard()?;
        Ok(match inner.state {
            Some(ManagerState::Running) => inner.pid,
            _ => None,
        })
    }
}

#[derive(Default)]
pub struct FakeProcess {
    alive: Mutex<HashSet<u32>>,
    kills: Mutex<Vec<u32>>,
    fail: bool,
}

impl FakeProcess {
    pub fn with_alive(pids: &[u32]) -> Self {
        Self {
            alive: Mutex::new(pids.iter().copied().collect()),
            ..Self::default()
        }
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn kills(&self) -> Vec<u32> {
        self.kills.lock().unwrap().clone()
    }
}

impl ProcessControl for FakeProcess {
    fn is_alive(&self, pid: u32) -> bool {
        self.alive.lock().unwrap().contains(&pid)
    }

    fn kill(&self, pid: u32) -> anyhow::Result<()> {
        self.kills.lock().unwrap().push(pid);
        if self.fail {
            anyhow::bail!("access denied");
        }
        self.alive.lock().unwrap().remove(&pid);
        Ok(())
    }
}

pub struct FakeSystem {
    name: &'static str,
    detected: bool,
    interactive: bool,
    probes: AtomicUsize,
    managed_runs: AtomicUsize,
    pub manager: FakeManager,
    process: Option<FakeProcess>,
}

impl FakeSystem {
    pub fn named(name: &'static str) -> Self {
        Self {
            name,
            detected: true,
            interactive: false,
            probes: AtomicUsize::new(0),
            managed_runs: AtomicUsize::new(0),
            manager: FakeManager::default(),
            process: None,
        }
    }

    pub fn undetected(mut self) -> Self {
        self.detected = false;
        self
    }

    pub fn with_interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    pub fn unsupported(self) -> Self {
        self.manager.inner.lock().unwrap().unsupported = true;
        self
    }

    pub fn with_process(mut self, process: FakeProcess) -> Self {
        self.process = Some(process);
        self
    }

    pub fn process(&self) -> Option<&FakeProcess> {
        self.process.as_ref()
    }

    pub fn interactive_probes(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }

    pub fn managed_runs(&self) -> usize {
        self.managed_runs.load(Ordering::SeqCst)
    }
}

struct Discard;

impl StatusReporter for Discard {
    fn report(&mut self, _state: ReportedState) -> anyhow::Result<()> {
        Ok(())
    }
}

impl System for FakeSystem {
    fn name(&self) -> &'static str {
        self.name
    }

    fn detect(&self) -> bool {
        self.detected
    }

    fn interactive(&self) -> bool {
        self.probes.fetch_add(1, Ordering::SeqCst);
        self.interactive
    }

    fn manager(&self) -> &dyn ServiceManager {
        &self.manager
    }

    fn process_control(&self) -> Option<&dyn ProcessControl> {
        self.process.as_ref().map(|p| p as &dyn ProcessControl)
    }

    /// Simulates a manager that starts the service and immediately stops it.
    fn run_managed(&self, name: &str, handler: Arc<dyn Interface>) -> Result<()> {
        self.managed_runs.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = mpsc::channel();
        let _ = tx.send(ControlEvent::Interrogate);
        let _ = tx.send(ControlEvent::Stop);
        let outcome = Dispatcher::new(name, handler).run(&rx, &mut Discard);
        if outcome.is_failure() {
            return Err(ServiceError::Callback(anyhow::anyhow!(
                "service exited with code {}",
                outcome.exit_code()
            )));
        }
        Ok(())
    }
}

/// Interface that does nothing.
pub struct Noop;

impl Interface for Noop {
    fn start(&self) -> anyhow::Result<()> {
        Ok(())
    }

    fn stop(&self) -> anyhow::Result<()> {
        Ok(())
    }
}
