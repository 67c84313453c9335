//! Tokio driver for the update scheduler
//!
//! [`SharedScheduler`] owns an [`UpdateScheduler`] behind a mutex and a
//! background task that sleeps until the throttle deadline, then runs the
//! pass. Timestamps come from `tokio::time`, so a paused test clock drives
//! the throttle deterministically.

use std::sync::{Arc, Mutex, MutexGuard};

use crossbeam_channel::Receiver;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use crate::core::{config::EngineConfig, geo::BoundingBox, site::Site};
use crate::scheduler::update::{Trigger, UpdateScheduler};
use crate::spatial::clustering::EngineResult;
use crate::Result;

type Shared<P> = Arc<Mutex<UpdateScheduler<P>>>;

fn lock<P>(inner: &Mutex<UpdateScheduler<P>>) -> MutexGuard<'_, UpdateScheduler<P>> {
    // A panicked pass leaves the scheduler itself consistent.
    inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn now() -> instant::Instant {
    tokio::time::Instant::now().into_std()
}

pub struct SharedScheduler<P> {
    inner: Shared<P>,
    wake: Arc<Notify>,
    task: JoinHandle<()>,
}

impl<P: Send + Sync + 'static> SharedScheduler<P> {
    /// Builds the scheduler and spawns its timer task on the current runtime
    pub fn spawn(config: EngineConfig) -> Result<Self> {
        let inner = Arc::new(Mutex::new(UpdateScheduler::new(config)?));
        let wake = Arc::new(Notify::new());
        let task = tokio::spawn(run_timer(Arc::clone(&inner), Arc::clone(&wake)));
        Ok(Self { inner, wake, task })
    }

    /// Replaces the site list. A new id set is clustered before this returns.
    pub fn on_sites_changed(&self, sites: Vec<Site<P>>) {
        // Same ids may schedule a throttled pass, so the timer needs a nudge.
        lock(&self.inner).on_sites_changed(sites, now());
        self.wake.notify_one();
    }

    pub fn on_viewport_changed(&self, bounds: BoundingBox, zoom: f64) {
        lock(&self.inner).on_viewport_changed(bounds, zoom, now());
        self.wake.notify_one();
    }

    /// Runs any pending viewport pass right away
    pub fn flush(&self) -> bool {
        let ran = lock(&self.inner).flush();
        self.wake.notify_one();
        ran
    }

    /// Recomputes against the latest viewport without holding the lock
    /// while the engine runs. A pass that finishes after a newer one was
    /// applied is discarded.
    pub fn recompute(&self) {
        let (input, engine) = {
            let mut scheduler = lock(&self.inner);
            (scheduler.prepare_pass(Trigger::DataChanged), scheduler.engine().clone())
        };
        if let Some(input) = input {
            let outcome = input.run(&engine);
            lock(&self.inner).apply(outcome);
        }
    }

    pub fn subscribe(&self) -> Receiver<Arc<EngineResult<P>>> {
        lock(&self.inner).subscribe()
    }

    pub fn result(&self) -> Arc<EngineResult<P>> {
        lock(&self.inner).result()
    }

    /// Runs `f` against the scheduler under its lock
    pub fn with<R>(&self, f: impl FnOnce(&mut UpdateScheduler<P>) -> R) -> R {
        f(&mut lock(&self.inner))
    }

    /// Disposes the scheduler and stops the timer task
    pub fn shutdown(&self) {
        lock(&self.inner).dispose();
        self.task.abort();
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

impl<P> Drop for SharedScheduler<P> {
    fn drop(&mut self) {
        self.task.abort();
        lock(&self.inner).dispose();
    }
}

async fn run_timer<P>(inner: Shared<P>, wake: Arc<Notify>) {
    loop {
        let deadline = {
            let scheduler = lock(&inner);
            if scheduler.is_disposed() {
                break;
            }
            scheduler.next_deadline()
        };

        match deadline {
            Some(deadline) => {
                let deadline = tokio::time::Instant::from_std(deadline);
                tokio::select! {
                    _ = tokio::time::sleep_until(deadline) => {}
                    _ = wake.notified() => continue,
                }
            }
            None => {
                wake.notified().await;
                continue;
            }
        }

        if lock(&inner).poll(now()) {
            log::trace!("throttled pass ran from timer task");
        }
    }
    log::debug!("scheduler timer task stopped");
}
