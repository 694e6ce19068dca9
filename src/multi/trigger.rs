//! Periodic background task
//!
//! A named thread that runs a task on every tick until stopped. A failing
//! task is logged and retried on the next tick.

use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{self, select, Sender};
use tracing::{debug, warn};

use crate::error::{Result, TableError};

pub struct PeriodicTrigger {
    name: String,
    /// Never sent on; dropping it stops the loop
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl PeriodicTrigger {
    /// Run `task` every `interval`, first after one full interval
    pub fn spawn<F>(name: impl Into<String>, interval: Duration, mut task: F) -> Result<Self>
    where
        F: FnMut() -> Result<()> + Send + 'static,
    {
        let name = name.into();
        let (stop_tx, stop_rx) = channel::bounded::<()>(0);
        let ticker = channel::tick(interval);

        let task_name = name.clone();
        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn(move || loop {
                select! {
                    recv(ticker) -> _ => {
                        if let Err(e) = task() {
                            warn!(task = %task_name, error = %e, "Periodic task failed");
                        }
                    }
                    recv(stop_rx) -> _ => break,
                }
            })
            .map_err(TableError::io("spawning periodic trigger"))?;

        debug!(task = %name, ?interval, "Periodic trigger started");
        Ok(Self {
            name,
            stop: Some(stop_tx),
            handle: Some(handle),
        })
    }

    /// Stop ticking and wait for a running task to finish
    pub fn stop(mut self) -> Result<()> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<()> {
        self.stop.take();
        if let Some(handle) = self.handle.take() {
            handle
                .join()
                .map_err(|_| TableError::Worker(format!("periodic task {} panicked", self.name)))?;
            debug!(task = %self.name, "Periodic trigger stopped");
        }
        Ok(())
    }
}

impl Drop for PeriodicTrigger {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            warn!(error = %e, "Periodic trigger stopped with errors");
        }
    }
}
