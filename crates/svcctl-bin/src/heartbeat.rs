//! Demo workload hosted by `svcctl run`: logs a heartbeat until stopped.

use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Mutex;
use std::thread::JoinHandle;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use tracing::info;

use svcctl_platform::Interface;

pub struct Heartbeat {
    interval: Duration,
    worker: Mutex<Option<(Sender<()>, JoinHandle<()>)>>,
}

impl Heartbeat {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            worker: Mutex::new(None),
        }
    }
}

impl Interface for Heartbeat {
    fn start(&self) -> Result<()> {
        let mut worker = self.worker.lock().map_err(|_| anyhow!("worker lock poisoned"))?;
        if worker.is_some() {
            return Ok(());
        }

        let (tx, rx) = mpsc::channel::<()>();
        let interval = self.interval;
        let handle = std::thread::Builder::new()
            .name("heartbeat".into())
            .spawn(move || {
                let mut beats: u64 = 0;
                loop {
                    match rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {
                            beats += 1;
                            info!(beats, "heartbeat");
                        }
                        // stop requested or sender dropped
                        _ => break,
                    }
                }
            })
            .context("failed to spawn heartbeat thread")?;

        *worker = Some((tx, handle));
        info!(interval_ms = interval.as_millis() as u64, "heartbeat started");
        Ok(())
    }

    fn stop(&self) -> Result<()> {
        let taken = self
            .worker
            .lock()
            .map_err(|_| anyhow!("worker lock poisoned"))?
            .take();
        if let Some((tx, handle)) = taken {
            let _ = tx.send(());
            handle
                .join()
                .map_err(|_| anyhow!("heartbeat thread panicked"))?;
            info!("heartbeat stopped");
        }
        Ok(())
    }
}
