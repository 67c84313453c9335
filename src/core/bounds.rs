use crate::core::geo::Point;
use serde::{Deserialize, Serialize};

/// Pixel rectangle of the map container, origin at the top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Point,
    pub max: Point,
}

impl Bounds {
    pub fn new(min: Point, max: Point) -> Self {
        Self { min, max }
    }

    /// Container of `size` pixels
    pub fn from_size(size: Point) -> Self {
        Self::new(Point::new(0.0, 0.0), size)
    }

    /// Edges are inclusive
    pub fn contains(&self, point: &Point) -> bool {
        (self.min.x..=self.max.x).contains(&point.x) && (self.min.y..=self.max.y).contains(&point.y)
    }

    /// Grows every side by `margin` pixels
    pub fn expanded(&self, margin: f64) -> Bounds {
        let pad = Point::new(margin, margin);
        Bounds::new(self.min.subtract(&pad), self.max.add(&pad))
    }
}
