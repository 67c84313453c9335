//! Prelude module for common reefcluster types and traits
//!
//! This module re-exports the most commonly used types, traits, and functions
//! for easy importing with `use reefcluster::prelude::*;`

pub use crate::core::{
    bounds::Bounds,
    config::{ClusteringConfig, ClusteringProfile, EngineConfig, SchedulerConfig},
    geo::{BoundingBox, LatLng, Point},
    site::{dedup_by_id, Site},
    viewport::Viewport,
};

pub use crate::adapter::{MarkerKind, ViewportAdapter, VisibleMarker};

pub use crate::input::{
    events::{InputEvent, MarkerEvent},
    handler::{hit_test, Action, InteractionRouter},
};

pub use crate::scheduler::{
    throttle::{Edge, Throttle},
    update::{SchedulerStats, Trigger, UpdateScheduler, ViewportState},
};

pub use crate::spatial::clustering::{Cluster, ClusterEngine, EngineResult};

pub use crate::traits::{MapSurface, SiteSelectionHandler};

#[cfg(feature = "tokio-runtime")]
pub use crate::driver::SharedScheduler;

pub use crate::{ClusterError, Result};

pub use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

pub use instant::Instant;

pub use fxhash::{FxHashMap as HashMap, FxHashSet as HashSet, FxHasher};
