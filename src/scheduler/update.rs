//! Update scheduler
//!
//! Owns the current [`EngineResult`] and decides when the clustering engine
//! runs. Data changes recompute immediately; camera movement goes through a
//! trailing-edge [`Throttle`]. Every pass carries a generation number and a
//! result is only applied when it is newer than the last applied one.

use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender};
use instant::Instant;
use serde::{Deserialize, Serialize};

use crate::adapter::ViewportAdapter;
use crate::core::{config::EngineConfig, geo::BoundingBox, site::Site};
use crate::prelude::HashSet;
use crate::scheduler::throttle::Throttle;
use crate::spatial::clustering::{ClusterEngine, EngineResult};
use crate::traits::MapSurface;
use crate::{ClusterError, Result};

/// Camera extent and zoom used for one pass
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportState {
    pub bounds: BoundingBox,
    pub zoom: f64,
}

impl ViewportState {
    pub fn new(bounds: BoundingBox, zoom: f64) -> Self {
        Self { bounds, zoom }
    }
}

/// What caused a pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trigger {
    /// The site list changed (filter applied, new search results)
    DataChanged,
    /// The camera moved or zoomed
    ViewportChanged,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerStats {
    /// Passes that ran the engine, successful or not
    pub passes: u64,
    pub immediate_passes: u64,
    pub throttled_passes: u64,
    /// Triggers that found no viewport to cluster against
    pub skipped: u64,
    pub failed: u64,
    pub stale_discarded: u64,
}

/// Everything a pass needs, detached from the scheduler so it can be
/// computed without holding it.
pub struct PassInput<P> {
    pub generation: u64,
    pub trigger: Trigger,
    pub sites: Arc<[Arc<Site<P>>]>,
    pub ids: Arc<HashSet<String>>,
    pub viewport: ViewportState,
}

pub struct PassOutcome<P> {
    input: PassInput<P>,
    result: Result<EngineResult<P>>,
}

impl<P> PassInput<P> {
    /// Runs the engine; pure, safe to call off the scheduler's thread
    pub fn run(self, engine: &ClusterEngine) -> PassOutcome<P> {
        let result = engine.cluster(&self.sites, &self.viewport.bounds, self.viewport.zoom);
        PassOutcome {
            input: self,
            result,
        }
    }
}

pub struct UpdateScheduler<P> {
    engine: ClusterEngine,
    throttle: Throttle<ViewportState>,
    sites: Arc<[Arc<Site<P>>]>,
    site_ids: Arc<HashSet<String>>,
    /// Latest camera reported by the host
    viewport: Option<ViewportState>,
    last_processed_ids: Arc<HashSet<String>>,
    last_processed_viewport: Option<ViewportState>,
    result: Arc<EngineResult<P>>,
    generation: u64,
    applied_generation: u64,
    last_error: Option<ClusterError>,
    subscribers: Vec<Sender<Arc<EngineResult<P>>>>,
    stats: SchedulerStats,
    disposed: bool,
}

impl<P> UpdateScheduler<P> {
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            engine: ClusterEngine::new(config.clustering)?,
            throttle: Throttle::new(config.scheduler.throttle_interval()),
            sites: Arc::from(Vec::new()),
            site_ids: Arc::new(HashSet::default()),
            viewport: None,
            last_processed_ids: Arc::new(HashSet::default()),
            last_processed_viewport: None,
            result: Arc::new(EngineResult::empty()),
            generation: 0,
            applied_generation: 0,
            last_error: None,
            subscribers: Vec::new(),
            stats: SchedulerStats::default(),
            disposed: false,
        })
    }

    pub fn engine(&self) -> &ClusterEngine {
        &self.engine
    }

    /// The result currently shown
    pub fn result(&self) -> Arc<EngineResult<P>> {
        Arc::clone(&self.result)
    }

    pub fn stats(&self) -> &SchedulerStats {
        &self.stats
    }

    pub fn last_error(&self) -> Option<&ClusterError> {
        self.last_error.as_ref()
    }

    pub fn last_processed_ids(&self) -> &HashSet<String> {
        &self.last_processed_ids
    }

    pub fn last_processed_viewport(&self) -> Option<&ViewportState> {
        self.last_processed_viewport.as_ref()
    }

    pub fn viewport(&self) -> Option<&ViewportState> {
        self.viewport.as_ref()
    }

    pub fn sites(&self) -> &[Arc<Site<P>>] {
        &self.sites
    }

    pub fn has_pending_update(&self) -> bool {
        self.throttle.is_pending()
    }

    /// When the pending viewport pass becomes due
    pub fn next_deadline(&self) -> Option<Instant> {
        self.throttle.deadline()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Streams every applied result. The current result is delivered first;
    /// dropping the receiver unsubscribes.
    pub fn subscribe(&mut self) -> Receiver<Arc<EngineResult<P>>> {
        let (tx, rx) = crossbeam_channel::unbounded();
        if tx.send(Arc::clone(&self.result)).is_ok() && !self.disposed {
            self.subscribers.push(tx);
        }
        rx
    }

    /// Data-change trigger.
    ///
    /// A different id set recomputes right away. With the same ids the new
    /// payloads are adopted and a throttled pass is scheduled only when the
    /// camera has moved since the last pass.
    pub fn on_sites_changed(&mut self, sites: Vec<Site<P>>, now: Instant) {
        if self.disposed {
            return;
        }

        let ids: HashSet<String> = sites.iter().map(|site| site.id.clone()).collect();
        let ids_changed = ids != *self.last_processed_ids;
        self.sites = sites.into_iter().map(Arc::new).collect();
        self.site_ids = Arc::new(ids);

        if ids_changed {
            log::debug!("site set changed ({} sites), clustering now", self.sites.len());
            self.run_now(Trigger::DataChanged);
            return;
        }

        match self.viewport {
            Some(viewport)
                if !self.throttle.is_pending()
                    && self.last_processed_viewport != Some(viewport) =>
            {
                self.throttle.submit(viewport, now);
            }
            _ => log::debug!("site ids unchanged, no recompute scheduled"),
        }
    }

    /// Viewport-change trigger, throttled. Only the most recent viewport in
    /// a window is clustered.
    pub fn on_viewport_changed(&mut self, bounds: BoundingBox, zoom: f64, now: Instant) {
        if self.disposed {
            return;
        }

        let viewport = ViewportState::new(bounds, zoom);
        self.viewport = Some(viewport);

        let unchanged = !self.throttle.is_pending()
            && self.last_processed_viewport == Some(viewport)
            && *self.site_ids == *self.last_processed_ids;
        if unchanged {
            return;
        }

        self.throttle.submit(viewport, now);
    }

    /// Pulls the live camera from the adapter. A host that is not ready yet
    /// clears the viewport and the result instead of failing.
    pub fn sync_viewport<S: MapSurface>(&mut self, adapter: &ViewportAdapter<S>, now: Instant) {
        match adapter.current_viewport() {
            Ok((bounds, zoom)) => self.on_viewport_changed(bounds, zoom, now),
            Err(ClusterError::HostNotReady) => {
                log::debug!("map surface not ready, skipping clustering");
                self.viewport = None;
                self.throttle.flush();
                self.show_empty();
            }
            Err(err) => self.record_failure(err),
        }
    }

    /// Runs the pending viewport pass if its window has elapsed. Returns
    /// whether a pass ran.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.throttle.poll(now) {
            Some(viewport) => {
                self.run_throttled(viewport);
                true
            }
            None => false,
        }
    }

    /// Runs the pending viewport pass without waiting, e.g. when a gesture ends
    pub fn flush(&mut self) -> bool {
        match self.throttle.flush() {
            Some(viewport) => {
                self.run_throttled(viewport);
                true
            }
            None => false,
        }
    }

    /// Cancels the throttle and drops subscribers. Later triggers are ignored.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.throttle.cancel();
        self.subscribers.clear();
        self.disposed = true;
        log::debug!("update scheduler disposed");
    }

    fn run_throttled(&mut self, viewport: ViewportState) {
        if let Some(input) = self.prepare_pass_with(Trigger::ViewportChanged, Some(viewport)) {
            let outcome = input.run(&self.engine);
            self.apply(outcome);
        }
    }

    fn run_now(&mut self, trigger: Trigger) {
        if let Some(input) = self.prepare_pass(trigger) {
            let outcome = input.run(&self.engine);
            self.apply(outcome);
        }
    }

    /// Snapshots the inputs for a pass against the latest known viewport.
    /// Returns `None`, and shows an empty result, when no viewport is known.
    pub fn prepare_pass(&mut self, trigger: Trigger) -> Option<PassInput<P>> {
        self.prepare_pass_with(trigger, None)
    }

    fn prepare_pass_with(
        &mut self,
        trigger: Trigger,
        viewport: Option<ViewportState>,
    ) -> Option<PassInput<P>> {
        if self.disposed {
            return None;
        }

        let Some(viewport) = viewport.or(self.viewport) else {
            self.stats.skipped += 1;
            self.show_empty();
            return None;
        };

        self.generation += 1;
        self.stats.passes += 1;
        match trigger {
            Trigger::DataChanged => self.stats.immediate_passes += 1,
            Trigger::ViewportChanged => self.stats.throttled_passes += 1,
        }

        Some(PassInput {
            generation: self.generation,
            trigger,
            sites: Arc::clone(&self.sites),
            ids: Arc::clone(&self.site_ids),
            viewport,
        })
    }

    /// Applies a finished pass unless a newer one was applied meanwhile.
    /// Failures keep the current result.
    pub fn apply(&mut self, outcome: PassOutcome<P>) {
        let PassOutcome { input, result } = outcome;
        if self.disposed {
            return;
        }
        if input.generation <= self.applied_generation {
            log::warn!(
                "discarding stale {:?} pass {} (applied {})",
                input.trigger,
                input.generation,
                self.applied_generation
            );
            self.stats.stale_discarded += 1;
            return;
        }
        self.applied_generation = input.generation;

        match result {
            Ok(result) => {
                log::debug!(
                    "{:?} pass {}: {} clusters, {} individual sites at zoom {:.2}",
                    input.trigger,
                    input.generation,
                    result.clusters.len(),
                    result.individual_sites.len(),
                    input.viewport.zoom
                );
                self.last_processed_ids = input.ids;
                self.last_processed_viewport = Some(input.viewport);
                self.last_error = None;
                self.publish(Arc::new(result));
            }
            Err(err) => self.record_failure(err),
        }
    }

    fn record_failure(&mut self, err: ClusterError) {
        log::error!("clustering failed, keeping previous result: {}", err);
        self.stats.failed += 1;
        self.last_error = Some(err);
    }

    /// The empty result reflects no viewport, so the next camera report must
    /// schedule a pass even when it matches the last processed one.
    fn show_empty(&mut self) {
        self.last_processed_viewport = None;
        if !self.result.is_empty() {
            self.publish(Arc::new(EngineResult::empty()));
        }
    }

    fn publish(&mut self, result: Arc<EngineResult<P>>) {
        self.result = result;
        let current = &self.result;
        self.subscribers
            .retain(|subscriber| subscriber.send(Arc::clone(current)).is_ok());
    }
}

impl<P> Drop for UpdateScheduler<P> {
    fn drop(&mut self) {
        self.dispose();
    }
}
