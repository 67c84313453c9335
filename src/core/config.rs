//! Configuration for the clustering engine and its update scheduler
//!
//! Configurations are plain serde structs. They can be built by hand, taken
//! from a preset [`ClusteringProfile`], or loaded from JSON. Every config is
//! validated once at construction; there is no hot reload.

use crate::core::constants::{
    DEFAULT_CLUSTER_RADIUS, DEFAULT_DECLUSTER_ZOOM, DEFAULT_THROTTLE_MS, MAX_SUPPORTED_ZOOM,
};
use crate::{ClusterError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum ClusteringProfile {
    Balanced,
    /// Busy regions: larger radius, clusters survive to higher zooms
    Dense,
    /// Few sites: small radius, declusters early
    Sparse,
    Custom(ClusteringConfig),
}

impl ClusteringProfile {
    pub fn resolve(&self) -> ClusteringConfig {
        match self {
            Self::Balanced => ClusteringConfig::default(),
            Self::Dense => ClusteringConfig {
                min_points: 3,
                max_zoom: 15.0,
                radius: 80.0,
            },
            Self::Sparse => ClusteringConfig {
                min_points: 2,
                max_zoom: 10.0,
                radius: 30.0,
            },
            Self::Custom(config) => config.clone(),
        }
    }
}

impl Default for ClusteringProfile {
    fn default() -> Self {
        Self::Balanced
    }
}

/// Clustering parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringConfig {
    /// Minimum group size reported as a cluster
    pub min_points: usize,
    /// Zoom at and above which clustering is disabled
    pub max_zoom: f64,
    /// Neighbourhood radius in screen pixels at the current zoom
    pub radius: f64,
}

impl ClusteringConfig {
    pub fn new(min_points: usize, max_zoom: f64, radius: f64) -> Result<Self> {
        let config = Self {
            min_points,
            max_zoom,
            radius,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.min_points < 2 {
            return Err(ClusterError::InvalidConfig(format!(
                "min_points must be at least 2, got {}",
                self.min_points
            )));
        }
        if !(self.radius.is_finite() && self.radius > 0.0) {
            return Err(ClusterError::InvalidConfig(format!(
                "radius must be a positive number of pixels, got {}",
                self.radius
            )));
        }
        if !(0.0..=MAX_SUPPORTED_ZOOM).contains(&self.max_zoom) {
            return Err(ClusterError::InvalidConfig(format!(
                "max_zoom {} outside supported range 0..={}",
                self.max_zoom, MAX_SUPPORTED_ZOOM
            )));
        }
        Ok(())
    }
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            min_points: 2,
            max_zoom: DEFAULT_DECLUSTER_ZOOM,
            radius: DEFAULT_CLUSTER_RADIUS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Minimum interval between viewport-triggered passes
    pub throttle_interval_ms: u64,
}

impl SchedulerConfig {
    pub fn throttle_interval(&self) -> Duration {
        Duration::from_millis(self.throttle_interval_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.throttle_interval_ms == 0 {
            return Err(ClusterError::InvalidConfig(
                "throttle_interval_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            throttle_interval_ms: DEFAULT_THROTTLE_MS,
        }
    }
}

/// Everything needed to build an [`UpdateScheduler`](crate::UpdateScheduler)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub clustering: ClusteringConfig,
    pub scheduler: SchedulerConfig,
}

impl EngineConfig {
    pub fn from_profile(profile: &ClusteringProfile) -> Self {
        Self {
            clustering: profile.resolve(),
            scheduler: SchedulerConfig::default(),
        }
    }

    /// Parses and validates a JSON document. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.clustering.validate()?;
        self.scheduler.validate()
    }
}
