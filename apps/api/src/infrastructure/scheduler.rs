// Cancellable scheduled work
//
// Every timer-driven script (server task scripts, local simulation, metrics
// ticker, reconnect loop) runs behind a ScheduledTask. Dropping the handle
// aborts the work, so no timer outlives its owner.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, Interval};

/// Shortest period a ticker will run at; tokio rejects a zero period
pub const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Interval whose first tick lands one full period from now
///
/// A zero period is raised to `MIN_PERIOD`.
pub fn ticker(period: Duration) -> Interval {
    let period = period.max(MIN_PERIOD);
    interval_at(Instant::now() + period, period)
}

/// Handle to a spawned timer-driven task; aborts the task on drop
#[derive(Debug)]
pub struct ScheduledTask {
    handle: Option<JoinHandle<()>>,
}

impl ScheduledTask {
    /// Spawns `future` on the current runtime
    pub fn spawn<F>(future: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self {
            handle: Some(tokio::spawn(future)),
        }
    }

    /// Runs `tick` every `period`, first after one full period
    pub fn every<F>(period: Duration, mut tick: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        Self::spawn(async move {
            let mut ticks = ticker(period);
            loop {
                ticks.tick().await;
                tick();
            }
        })
    }

    pub fn cancel(&self) {
        if let Some(handle) = &self.handle {
            handle.abort();
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, |h| h.is_finished())
    }

    /// Lets the task run on without an owner
    pub fn detach(mut self) {
        self.handle.take();
    }
}

impl Drop for ScheduledTask {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Keyed set of running scripts, at most one per key
#[derive(Debug, Default)]
pub struct ScheduledTasks {
    tasks: Mutex<HashMap<String, ScheduledTask>>,
}

impl ScheduledTasks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a script under `key`; returns true when it replaced (and
    /// cancelled) a running one
    pub fn insert(&self, key: &str, task: ScheduledTask) -> bool {
        self.lock().insert(key.to_string(), task).is_some()
    }

    /// Forgets a script that ran to completion without aborting it
    ///
    /// Called from inside the script itself.
    pub fn finish(&self, key: &str) {
        if let Some(task) = self.lock().remove(key) {
            task.detach();
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Cancels every script; returns how many were running
    pub fn cancel_all(&self) -> usize {
        let drained: Vec<_> = self.lock().drain().collect();
        for (_, task) in &drained {
            task.cancel();
        }
        drained.len()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, ScheduledTask>> {
        self.tasks.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
