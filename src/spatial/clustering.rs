//! Greedy single-link marker clustering
//!
//! Sites are projected once into normalized Web Mercator space, where the
//! pixel radius becomes a zoom-dependent tolerance. Seeds are taken in input
//! order; each seed absorbs its unvisited neighbours once. Membership near
//! the border of two dense groups therefore depends on input order, which is
//! an accepted approximation: the output is still fully deterministic.

use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::core::{
    config::ClusteringConfig,
    geo::{pixels_to_unit, BoundingBox, LatLng, Point},
    site::Site,
};
use crate::prelude::FxHasher;
use crate::spatial::index::{IndexedPoint, SpatialIndex};
use crate::{ClusterError, Result};

/// A group of nearby sites shown as one marker
#[derive(Debug, PartialEq)]
pub struct Cluster<P> {
    /// Stable for identical membership and zoom bucket
    pub id: String,
    /// Mean member position as `[lng, lat]`
    pub center: [f64; 2],
    pub count: usize,
    /// Members in input order
    pub points: Vec<Arc<Site<P>>>,
    /// Exact extent of the members, target for zoom-to-cluster
    pub bounds: BoundingBox,
    /// Integer zoom the cluster was computed for
    pub zoom_bucket: u32,
}

impl<P> Clone for Cluster<P> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            center: self.center,
            count: self.count,
            points: self.points.clone(),
            bounds: self.bounds,
            zoom_bucket: self.zoom_bucket,
        }
    }
}

impl<P> Cluster<P> {
    /// Builds a cluster from a non-empty member list
    fn from_members(points: Vec<Arc<Site<P>>>, zoom_bucket: u32) -> Self {
        let count = points.len();
        let (sum_lng, sum_lat) = points
            .iter()
            .fold((0.0, 0.0), |(lng, lat), site| (lng + site.lng, lat + site.lat));
        let center = [sum_lng / count as f64, sum_lat / count as f64];
        let bounds = BoundingBox::enclosing(points.iter().map(|site| site.position()))
            .unwrap_or_else(|| BoundingBox::new(center[0], center[0], center[1], center[1]));
        let id = Self::create_cluster_id(&points, zoom_bucket);

        Self {
            id,
            center,
            count,
            points,
            bounds,
            zoom_bucket,
        }
    }

    /// Hash of the sorted member ids plus the zoom bucket. FxHasher has no
    /// per-process seed, so ids survive restarts.
    fn create_cluster_id(points: &[Arc<Site<P>>], zoom_bucket: u32) -> String {
        let mut ids: Vec<&str> = points.iter().map(|site| site.id.as_str()).collect();
        ids.sort_unstable();

        let mut hasher = FxHasher::default();
        zoom_bucket.hash(&mut hasher);
        for id in ids {
            id.hash(&mut hasher);
        }
        format!("cluster_z{}_{:016x}", zoom_bucket, hasher.finish())
    }

    pub fn center_lat_lng(&self) -> LatLng {
        LatLng::new(self.center[1], self.center[0])
    }

    pub fn contains_site(&self, id: &str) -> bool {
        self.points.iter().any(|site| site.id == id)
    }
}

/// Output of one clustering pass
#[derive(Debug, PartialEq)]
pub struct EngineResult<P> {
    pub clusters: Vec<Cluster<P>>,
    /// Sites not absorbed into any cluster, in input order
    pub individual_sites: Vec<Arc<Site<P>>>,
}

impl<P> Clone for EngineResult<P> {
    fn clone(&self) -> Self {
        Self {
            clusters: self.clusters.clone(),
            individual_sites: self.individual_sites.clone(),
        }
    }
}

impl<P> Default for EngineResult<P> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<P> EngineResult<P> {
    pub fn empty() -> Self {
        Self {
            clusters: Vec::new(),
            individual_sites: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty() && self.individual_sites.is_empty()
    }

    /// Number of sites represented, clustered or not
    pub fn site_count(&self) -> usize {
        self.clusters.iter().map(|c| c.count).sum::<usize>() + self.individual_sites.len()
    }

    /// Every represented site, cluster members first
    pub fn sites(&self) -> impl Iterator<Item = &Arc<Site<P>>> {
        self.clusters
            .iter()
            .flat_map(|cluster| cluster.points.iter())
            .chain(self.individual_sites.iter())
    }
}

/// Pure clustering over a snapshot of sites
#[derive(Debug, Clone)]
pub struct ClusterEngine {
    config: ClusteringConfig,
}

impl ClusterEngine {
    pub fn new(config: ClusteringConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ClusteringConfig {
        &self.config
    }

    /// Partitions the sites near `viewport` into clusters and individual
    /// sites.
    ///
    /// Sites further than `radius` pixels outside the viewport are left out
    /// of both lists. Fails on a malformed viewport, a negative or
    /// non-finite zoom, or any site with non-finite coordinates.
    pub fn cluster<P>(
        &self,
        sites: &[Arc<Site<P>>],
        viewport: &BoundingBox,
        zoom: f64,
    ) -> Result<EngineResult<P>> {
        viewport.validate_viewport()?;
        if !zoom.is_finite() || zoom < 0.0 {
            return Err(ClusterError::InvalidZoom(zoom));
        }
        if let Some(site) = sites.iter().find(|site| !site.has_finite_position()) {
            return Err(ClusterError::InvalidCoordinates {
                id: site.id.clone(),
                lat: site.lat,
                lng: site.lng,
            });
        }
        if sites.is_empty() {
            return Ok(EngineResult::empty());
        }

        let tolerance = pixels_to_unit(self.config.radius, zoom);
        let candidates = Self::candidates(sites, viewport, tolerance);

        if zoom >= self.config.max_zoom {
            return Ok(EngineResult {
                clusters: Vec::new(),
                individual_sites: candidates
                    .into_iter()
                    .map(|(site, _)| Arc::clone(site))
                    .collect(),
            });
        }

        Ok(self.greedy_cluster(&candidates, tolerance, zoom.floor() as u32))
    }

    /// Sites inside the viewport padded by the tolerance, with their
    /// projected positions, in input order.
    fn candidates<'a, P>(
        sites: &'a [Arc<Site<P>>],
        viewport: &BoundingBox,
        tolerance: f64,
    ) -> Vec<(&'a Arc<Site<P>>, Point)> {
        let (top_left, bottom_right) = viewport.to_unit_mercator();
        let (min_x, max_x) = (top_left.x - tolerance, bottom_right.x + tolerance);
        let (min_y, max_y) = (top_left.y - tolerance, bottom_right.y + tolerance);

        sites
            .iter()
            .filter_map(|site| {
                let projected = site.position().to_unit_mercator();
                let inside = projected.x >= min_x
                    && projected.x <= max_x
                    && projected.y >= min_y
                    && projected.y <= max_y;
                inside.then_some((site, projected))
            })
            .collect()
    }

    fn greedy_cluster<P>(
        &self,
        candidates: &[(&Arc<Site<P>>, Point)],
        tolerance: f64,
        zoom_bucket: u32,
    ) -> EngineResult<P> {
        let index = SpatialIndex::build(
            candidates
                .iter()
                .enumerate()
                .map(|(slot, (_, position))| IndexedPoint::new(slot, *position))
                .collect(),
        );

        let mut visited = vec![false; candidates.len()];
        let mut result = EngineResult::empty();

        for slot in 0..candidates.len() {
            if visited[slot] {
                continue;
            }

            // Earlier slots are all visited, so the seed leads the group.
            let group: Vec<usize> = index
                .within_radius(&candidates[slot].1, tolerance)
                .into_iter()
                .filter(|&other| !visited[other])
                .collect();

            if group.len() >= self.config.min_points {
                let members = group
                    .iter()
                    .map(|&member| {
                        visited[member] = true;
                        Arc::clone(candidates[member].0)
                    })
                    .collect();
                result
                    .clusters
                    .push(Cluster::from_members(members, zoom_bucket));
            } else {
                visited[slot] = true;
                result.individual_sites.push(Arc::clone(candidates[slot].0));
            }
        }

        result
    }
}

impl Default for ClusterEngine {
    fn default() -> Self {
        Self {
            config: ClusteringConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sites(coords: &[(f64, f64)]) -> Vec<Arc<Site<()>>> {
        coords
            .iter()
            .enumerate()
            .map(|(i, &(lat, lng))| Arc::new(Site::bare(format!("site-{}", i), lat, lng)))
            .collect()
    }

    fn engine() -> ClusterEngine {
        ClusterEngine::new(ClusteringConfig::new(2, 12.0, 50.0).unwrap()).unwrap()
    }

    fn world() -> BoundingBox {
        BoundingBox::new(-180.0, 180.0, -85.0, 85.0)
    }

    #[test]
    fn test_empty_input() {
        let result = engine().cluster::<()>(&[], &world(), 3.0).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_single_site_stays_individual() {
        let input = sites(&[(10.0, 10.0)]);
        let result = engine().cluster(&input, &world(), 3.0).unwrap();
        assert!(result.clusters.is_empty());
        assert_eq!(result.individual_sites.len(), 1);
    }

    #[test]
    fn test_identical_coordinates_form_one_cluster() {
        let input = sites(&[(-16.5, 145.7), (-16.5, 145.7)]);
        let result = engine().cluster(&input, &world(), 8.0).unwrap();
        assert_eq!(result.clusters.len(), 1);
        let cluster = &result.clusters[0];
        assert_eq!(cluster.count, 2);
        assert_eq!(cluster.center, [145.7, -16.5]);
        assert_eq!(cluster.bounds, BoundingBox::new(145.7, 145.7, -16.5, -16.5));
        assert!(result.individual_sites.is_empty());
    }

    #[test]
    fn test_far_apart_sites_not_clustered() {
        // Red Sea and Great Barrier Reef
        let input = sites(&[(27.0, 34.0), (-16.5, 145.7)]);
        let result = engine().cluster(&input, &world(), 4.0).unwrap();
        assert!(result.clusters.is_empty());
        assert_eq!(result.individual_sites.len(), 2);
        assert_eq!(result.individual_sites[0].id, "site-0");
    }

    #[test]
    fn test_radius_scales_with_zoom() {
        // 0.1 degrees apart on the equator: ~36px at zoom 9, ~73px at zoom 10
        let input = sites(&[(0.0, 0.0), (0.0, 0.1)]);
        let engine = engine();
        assert_eq!(engine.cluster(&input, &world(), 9.0).unwrap().clusters.len(), 1);
        assert!(engine.cluster(&input, &world(), 10.0).unwrap().clusters.is_empty());
    }

    #[test]
    fn test_min_points_respected() {
        let config = ClusteringConfig::new(3, 12.0, 50.0).unwrap();
        let engine = ClusterEngine::new(config).unwrap();
        let input = sites(&[(0.0, 0.0), (0.0, 0.001)]);
        let result = engine.cluster(&input, &world(), 5.0).unwrap();
        assert!(result.clusters.is_empty());
        assert_eq!(result.individual_sites.len(), 2);
    }

    #[test]
    fn test_released_neighbour_can_seed_later_cluster() {
        // A is close to B only; B, C and D sit together; min_points = 3.
        // A alone cannot reach three members, B seeds the cluster afterwards.
        let config = ClusteringConfig::new(3, 12.0, 50.0).unwrap();
        let engine = ClusterEngine::new(config).unwrap();
        // At zoom 10 one degree of longitude is ~728px on the equator.
        let input = sites(&[(0.0, -0.06), (0.0, 0.0), (0.0, 0.01), (0.0, 0.02)]);
        let result = engine.cluster(&input, &world(), 10.0).unwrap();
        assert_eq!(result.individual_sites.len(), 1);
        assert_eq!(result.individual_sites[0].id, "site-0");
        assert_eq!(result.clusters.len(), 1);
        let ids: Vec<&str> = result.clusters[0].points.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["site-1", "site-2", "site-3"]);
    }

    #[test]
    fn test_declustered_at_max_zoom() {
        let input = sites(&[(0.0, 0.0), (0.0, 0.0), (0.0, 0.0)]);
        let result = engine().cluster(&input, &world(), 12.0).unwrap();
        assert!(result.clusters.is_empty());
        assert_eq!(result.individual_sites.len(), 3);
    }

    #[test]
    fn test_sites_outside_viewport_filtered() {
        let input = sites(&[(0.5, 0.5), (40.0, 40.0)]);
        let viewport = BoundingBox::new(0.0, 1.0, 0.0, 1.0);
        let result = engine().cluster(&input, &viewport, 9.0).unwrap();
        assert_eq!(result.site_count(), 1);
        assert_eq!(result.individual_sites[0].id, "site-0");
    }

    #[test]
    fn test_sites_just_outside_viewport_kept() {
        // 0.01 degrees past the edge is well within 50px at zoom 9
        let input = sites(&[(0.5, 1.01)]);
        let viewport = BoundingBox::new(0.0, 1.0, 0.0, 1.0);
        let result = engine().cluster(&input, &viewport, 9.0).unwrap();
        assert_eq!(result.site_count(), 1);
    }

    #[test]
    fn test_cluster_id_stable_and_order_independent() {
        let a = sites(&[(0.0, 0.0), (0.0, 0.001)]);
        let b: Vec<_> = a.iter().rev().cloned().collect();
        let engine = engine();
        let first = engine.cluster(&a, &world(), 5.0).unwrap();
        let second = engine.cluster(&b, &world(), 5.0).unwrap();
        assert_eq!(first.clusters[0].id, second.clusters[0].id);
        assert!(first.clusters[0].id.starts_with("cluster_z5_"));

        let other_zoom = engine.cluster(&a, &world(), 6.0).unwrap();
        assert_ne!(first.clusters[0].id, other_zoom.clusters[0].id);
    }

    #[test]
    fn test_invalid_input_rejected() {
        let engine = engine();
        let input = sites(&[(0.0, 0.0)]);
        assert!(matches!(
            engine.cluster(&input, &BoundingBox::new(1.0, 0.0, 0.0, 1.0), 3.0),
            Err(ClusterError::InvalidViewport(_))
        ));
        assert!(matches!(
            engine.cluster(&input, &world(), -1.0),
            Err(ClusterError::InvalidZoom(_))
        ));
        assert!(matches!(
            engine.cluster(&input, &world(), f64::NAN),
            Err(ClusterError::InvalidZoom(_))
        ));

        let broken = vec![Arc::new(Site::bare("bad", f64::NAN, 0.0))];
        match engine.cluster(&broken, &world(), 3.0) {
            Err(ClusterError::InvalidCoordinates { id, .. }) => assert_eq!(id, "bad"),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
