use crate::core::geo::Point;

use rstar::{PointDistance, RTree, RTreeObject, AABB};

/// A candidate site projected into normalized Web Mercator space.
///
/// `slot` is the position of the site in the candidate list, which is the
/// clustering processing order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexedPoint {
    pub slot: usize,
    pub position: Point,
}

impl IndexedPoint {
    pub fn new(slot: usize, position: Point) -> Self {
        Self { slot, position }
    }
}

// --- rstar integration -------------------------------------------------------------------------

impl RTreeObject for IndexedPoint {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.position.x, self.position.y])
    }
}

impl PointDistance for IndexedPoint {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        self.position.distance_squared(&Point::new(point[0], point[1]))
    }
}

/// R-tree over projected candidate points, rebuilt for every clustering pass
pub struct SpatialIndex {
    rtree: RTree<IndexedPoint>,
}

impl SpatialIndex {
    /// Bulk loads the tree; cheaper than repeated inserts and independent of
    /// insertion order.
    pub fn build(points: Vec<IndexedPoint>) -> Self {
        Self {
            rtree: RTree::bulk_load(points),
        }
    }

    /// Slots of every point within `radius` (inclusive) of `center`, sorted
    /// ascending so callers see them in processing order.
    pub fn within_radius(&self, center: &Point, radius: f64) -> Vec<usize> {
        let mut slots: Vec<usize> = self
            .rtree
            .locate_within_distance([center.x, center.y], radius * radius)
            .map(|item| item.slot)
            .collect();
        slots.sort_unstable();
        slots
    }

    pub fn len(&self) -> usize {
        self.rtree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.rtree.size() == 0
    }
}
