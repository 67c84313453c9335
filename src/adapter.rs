//! Viewport adapter
//!
//! Wraps a host [`MapSurface`] and turns its camera into plain geometry for
//! the scheduler. After a pass it culls the result against the *live*
//! camera, which may already differ from the one the pass used during a fast
//! pan; the one-frame staleness is cheaper than re-clustering every frame.

use std::sync::Arc;

use crate::core::{
    geo::{BoundingBox, LatLng, Point},
    site::Site,
};
use crate::spatial::{
    clustering::{Cluster, EngineResult},
    culling::Culling,
};
use crate::traits::MapSurface;
use crate::{ClusterError, Result};

/// What a visible marker stands for
#[derive(Debug, PartialEq)]
pub enum MarkerKind<P> {
    Cluster(Cluster<P>),
    Site(Arc<Site<P>>),
}

impl<P> Clone for MarkerKind<P> {
    fn clone(&self) -> Self {
        match self {
            Self::Cluster(cluster) => Self::Cluster(cluster.clone()),
            Self::Site(site) => Self::Site(Arc::clone(site)),
        }
    }
}

/// A marker that survived culling, with its container pixel position
#[derive(Debug, PartialEq)]
pub struct VisibleMarker<P> {
    pub kind: MarkerKind<P>,
    pub position: LatLng,
    pub screen: Point,
}

impl<P> Clone for VisibleMarker<P> {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind.clone(),
            position: self.position,
            screen: self.screen,
        }
    }
}

impl<P> VisibleMarker<P> {
    pub fn is_cluster(&self) -> bool {
        matches!(self.kind, MarkerKind::Cluster(_))
    }
}

pub struct ViewportAdapter<S> {
    surface: S,
    /// Extra pixels around the screen in which markers are still drawn
    margin_px: f64,
}

impl<S: MapSurface> ViewportAdapter<S> {
    pub fn new(surface: S) -> Self {
        Self {
            surface,
            margin_px: 0.0,
        }
    }

    pub fn with_margin(mut self, margin_px: f64) -> Self {
        self.margin_px = margin_px.max(0.0);
        self
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// Live camera extent and zoom
    pub fn current_viewport(&self) -> Result<(BoundingBox, f64)> {
        self.surface.camera().ok_or(ClusterError::HostNotReady)
    }

    /// Container pixel position of a coordinate
    pub fn project(&self, point: &LatLng) -> Result<Point> {
        self.surface.project(point).ok_or(ClusterError::HostNotReady)
    }

    pub fn is_visible(&self, point: &LatLng, bounds: &BoundingBox) -> bool {
        Culling::lat_lng_visible(bounds, point)
    }

    /// Markers of `result` that the live camera shows, clusters first, with
    /// pixel positions. Empty while the host is not ready.
    pub fn cull<P>(&self, result: &EngineResult<P>) -> Vec<VisibleMarker<P>> {
        let Ok((live, _)) = self.current_viewport() else {
            return Vec::new();
        };
        let screen = self.surface.screen_bounds();

        let clusters = result
            .clusters
            .iter()
            .map(|cluster| (MarkerKind::Cluster(cluster.clone()), cluster.center_lat_lng()));
        let sites = result
            .individual_sites
            .iter()
            .map(|site| (MarkerKind::Site(Arc::clone(site)), site.position()));

        clusters
            .chain(sites)
            .filter_map(|(kind, position)| {
                let pixel = self.surface.project(&position)?;
                let on_screen = screen.as_ref().is_some_and(|screen| {
                    Culling::point_visible_with_margin(screen, &pixel, self.margin_px)
                });
                (self.is_visible(&position, &live) || on_screen).then_some(VisibleMarker {
                    kind,
                    position,
                    screen: pixel,
                })
            })
            .collect()
    }

    /// Zooms the host so the whole cluster is visible
    pub fn zoom_to_cluster<P>(&mut self, cluster: &Cluster<P>) {
        log::debug!("fitting camera to cluster {}", cluster.id);
        self.surface.fit_bounds(&cluster.bounds);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{config::ClusteringConfig, viewport::Viewport};
    use crate::spatial::clustering::ClusterEngine;

    fn adapter() -> ViewportAdapter<Viewport> {
        ViewportAdapter::new(Viewport::new(
            LatLng::new(27.0, 34.0),
            10.0,
            Point::new(800.0, 600.0),
        ))
    }

    #[test]
    fn test_current_viewport_from_surface() {
        let adapter = adapter();
        let (bounds, zoom) = adapter.current_viewport().unwrap();
        assert_eq!(zoom, 10.0);
        assert!(bounds.contains(&LatLng::new(27.0, 34.0)));
    }

    #[test]
    fn test_not_ready_surface() {
        let adapter = ViewportAdapter::new(Viewport::new(
            LatLng::new(0.0, 0.0),
            3.0,
            Point::new(0.0, 0.0),
        ));
        assert!(matches!(
            adapter.current_viewport(),
            Err(ClusterError::HostNotReady)
        ));
        assert!(adapter.project(&LatLng::new(0.0, 0.0)).is_err());
    }

    #[test]
    fn test_cull_uses_live_viewport() {
        let sites = vec![
            Arc::new(Site::bare("inside", 27.0, 34.0)),
            Arc::new(Site::bare("outside", 27.0, 36.0)),
        ];
        let engine = ClusterEngine::new(ClusteringConfig::default()).unwrap();
        let wide = BoundingBox::new(30.0, 40.0, 20.0, 30.0);
        let result = engine.cluster(&sites, &wide, 13.0).unwrap();
        assert_eq!(result.individual_sites.len(), 2);

        let adapter = adapter();
        let visible = adapter.cull(&result);
        assert_eq!(visible.len(), 1);
        assert!(!visible[0].is_cluster());
        assert!((visible[0].screen.x - 400.0).abs() < 1e-6);
        assert!((visible[0].screen.y - 300.0).abs() < 1e-6);
    }

    #[test]
    fn test_cull_margin_keeps_edge_markers() {
        let adapter = adapter();
        let (live, _) = adapter.current_viewport().unwrap();
        let edge = Arc::new(Site::bare("edge", 27.0, live.max_lng + 0.005));
        let result = EngineResult {
            clusters: Vec::new(),
            individual_sites: vec![edge],
        };

        assert!(adapter.cull(&result).is_empty());
        // 0.005 degrees is ~3.6px at zoom 10
        assert_eq!(adapter.with_margin(10.0).cull(&result).len(), 1);
    }

    #[test]
    fn test_zoom_to_cluster_fits_bounds() {
        let sites = vec![
            Arc::new(Site::bare("a", 27.0, 34.0)),
            Arc::new(Site::bare("b", 27.2, 34.2)),
        ];
        let engine = ClusterEngine::new(ClusteringConfig::default()).unwrap();
        let world = BoundingBox::new(-180.0, 180.0, -85.0, 85.0);
        let result = engine.cluster(&sites, &world, 4.0).unwrap();
        let cluster = &result.clusters[0];

        let mut adapter = ViewportAdapter::new(Viewport::new(
            LatLng::new(0.0, 0.0),
            2.0,
            Point::new(800.0, 600.0),
        ));
        adapter.zoom_to_cluster(cluster);
        let (bounds, zoom) = adapter.current_viewport().unwrap();
        assert!(zoom > 4.0);
        assert!(bounds.contains(&LatLng::new(27.0, 34.0)));
        assert!(bounds.contains(&LatLng::new(27.2, 34.2)));
    }
}
