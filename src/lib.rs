//! # reefcluster
//!
//! Viewport-aware marker clustering for dive-site maps.
//!
//! Sites are grouped by screen-pixel proximity at the current zoom. A
//! scheduler decides when to recompute: data changes run right away, camera
//! movement is throttled, and out-of-date passes never overwrite newer
//! results. Hosts plug their map in through [`traits::MapSurface`].

pub mod adapter;
pub mod core;
#[cfg(feature = "tokio-runtime")]
pub mod driver;
pub mod input;
pub mod prelude;
pub mod scheduler;
pub mod spatial;
pub mod traits;
pub use crate::core::constants;

// Re-export public API
pub use core::{
    bounds::Bounds,
    config::{ClusteringConfig, ClusteringProfile, EngineConfig, SchedulerConfig},
    geo::{BoundingBox, LatLng, Point},
    site::Site,
    viewport::Viewport,
};

pub use adapter::{MarkerKind, ViewportAdapter, VisibleMarker};

pub use input::{
    events::MarkerEvent,
    handler::{Action, InteractionRouter},
};

pub use scheduler::{Throttle, UpdateScheduler};

pub use spatial::clustering::{Cluster, ClusterEngine, EngineResult};

pub use traits::{MapSurface, SiteSelectionHandler};

#[cfg(feature = "tokio-runtime")]
pub use driver::SharedScheduler;

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, ClusterError>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum ClusterError {
    #[error("Invalid viewport: {0}")]
    InvalidViewport(String),

    #[error("Invalid zoom level: {0}")]
    InvalidZoom(f64),

    #[error("Invalid coordinates for site {id}: ({lat}, {lng})")]
    InvalidCoordinates { id: String, lat: f64, lng: f64 },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Map surface is not ready")]
    HostNotReady,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Error type alias for convenience
pub type Error = ClusterError;

/// Installs `env_logger` once; later calls are no-ops.
#[cfg(feature = "debug")]
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .is_test(cfg!(test))
        .try_init();
}
