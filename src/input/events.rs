use std::sync::Arc;

use crate::adapter::{MarkerKind, VisibleMarker};
use crate::core::{geo::Point, site::Site};
use crate::spatial::clustering::Cluster;

/// Input the presentation layer reports back about markers
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// Click or tap at a container position
    Click { position: Point },
}

/// Outbound events emitted when the user activates a marker
#[derive(Debug, PartialEq)]
pub enum MarkerEvent<P> {
    /// The host should fit the camera to the cluster's bounds
    ClusterActivated(Cluster<P>),
    /// The site id goes to whoever loads site details
    SiteActivated(Arc<Site<P>>),
}

impl<P> Clone for MarkerEvent<P> {
    fn clone(&self) -> Self {
        match self {
            Self::ClusterActivated(cluster) => Self::ClusterActivated(cluster.clone()),
            Self::SiteActivated(site) => Self::SiteActivated(Arc::clone(site)),
        }
    }
}

impl<P> From<&VisibleMarker<P>> for MarkerEvent<P> {
    fn from(marker: &VisibleMarker<P>) -> Self {
        match &marker.kind {
            MarkerKind::Cluster(cluster) => Self::ClusterActivated(cluster.clone()),
            MarkerKind::Site(site) => Self::SiteActivated(Arc::clone(site)),
        }
    }
}
