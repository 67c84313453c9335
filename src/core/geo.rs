use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::core::constants::{MAX_LATITUDE, TILE_SIZE};
use crate::{ClusterError, Result};

/// WGS84 position in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Both components are finite numbers
    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }

    /// Clamps latitude to the range Web Mercator can represent
    pub fn clamp_lat(lat: f64) -> f64 {
        lat.clamp(-MAX_LATITUDE, MAX_LATITUDE)
    }

    /// Projects into normalized Web Mercator space, where the whole world
    /// spans `[0, 1]` on both axes and `y` grows southwards.
    ///
    /// Multiplying the result by `TILE_SIZE * 2^zoom` yields world pixels.
    pub fn to_unit_mercator(&self) -> Point {
        let x = self.lng / 360.0 + 0.5;
        let sin = Self::clamp_lat(self.lat).to_radians().sin();
        let y = 0.5 - 0.25 * ((1.0 + sin) / (1.0 - sin)).ln() / PI;
        Point::new(x, y)
    }

    /// Inverse of [`LatLng::to_unit_mercator`]
    pub fn from_unit_mercator(point: Point) -> Self {
        let lng = (point.x - 0.5) * 360.0;
        let y2 = (180.0 - point.y * 360.0) * PI / 180.0;
        let lat = 360.0 * y2.exp().atan() / PI - 90.0;
        Self::new(lat, lng)
    }
}

impl Default for LatLng {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

/// 2D point in pixels or normalized Mercator units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn add(&self, other: &Point) -> Point {
        Point::new(self.x + other.x, self.y + other.y)
    }

    pub fn subtract(&self, other: &Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y)
    }

    pub fn multiply(&self, scalar: f64) -> Point {
        Point::new(self.x * scalar, self.y * scalar)
    }

    pub fn distance_squared(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }
}

impl Default for Point {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

/// Geographic extent expressed as longitude/latitude ranges.
///
/// Used both for the camera's visible area and for the exact extent of a
/// cluster. Only viewports are required to be non-degenerate, see
/// [`BoundingBox::validate_viewport`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lng: f64,
    pub max_lng: f64,
    pub min_lat: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    pub fn new(min_lng: f64, max_lng: f64, min_lat: f64, max_lat: f64) -> Self {
        Self {
            min_lng,
            max_lng,
            min_lat,
            max_lat,
        }
    }

    /// Smallest box enclosing every coordinate, `None` for an empty iterator
    pub fn enclosing(mut points: impl Iterator<Item = LatLng>) -> Option<Self> {
        let first = points.next()?;
        let mut bounds = Self::new(first.lng, first.lng, first.lat, first.lat);
        for point in points {
            bounds.extend(&point);
        }
        Some(bounds)
    }

    /// Checks the camera invariant: finite, `min < max` on both axes
    pub fn validate_viewport(&self) -> Result<()> {
        let values = [self.min_lng, self.max_lng, self.min_lat, self.max_lat];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ClusterError::InvalidViewport(format!(
                "non-finite bounds {:?}",
                self
            )));
        }
        if self.min_lng >= self.max_lng {
            return Err(ClusterError::InvalidViewport(format!(
                "min_lng {} must be less than max_lng {}",
                self.min_lng, self.max_lng
            )));
        }
        if self.min_lat >= self.max_lat {
            return Err(ClusterError::InvalidViewport(format!(
                "min_lat {} must be less than max_lat {}",
                self.min_lat, self.max_lat
            )));
        }
        Ok(())
    }

    pub fn south_west(&self) -> LatLng {
        LatLng::new(self.min_lat, self.min_lng)
    }

    pub fn north_east(&self) -> LatLng {
        LatLng::new(self.max_lat, self.max_lng)
    }

    /// Checks if the bounds contain a point (edges inclusive)
    pub fn contains(&self, point: &LatLng) -> bool {
        point.lat >= self.min_lat
            && point.lat <= self.max_lat
            && point.lng >= self.min_lng
            && point.lng <= self.max_lng
    }

    pub fn extend(&mut self, point: &LatLng) {
        self.min_lat = self.min_lat.min(point.lat);
        self.min_lng = self.min_lng.min(point.lng);
        self.max_lat = self.max_lat.max(point.lat);
        self.max_lng = self.max_lng.max(point.lng);
    }

    /// Midpoint in degrees, not in projected space
    pub fn center(&self) -> LatLng {
        LatLng::new(
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lng + self.max_lng) / 2.0,
        )
    }

    /// The bounds projected into normalized Web Mercator space as
    /// `(top_left, bottom_right)`.
    pub fn to_unit_mercator(&self) -> (Point, Point) {
        let top_left = LatLng::new(self.max_lat, self.min_lng).to_unit_mercator();
        let bottom_right = LatLng::new(self.min_lat, self.max_lng).to_unit_mercator();
        (top_left, bottom_right)
    }
}

/// Number of world pixels spanned by the whole map at `zoom`
pub fn world_size(zoom: f64) -> f64 {
    TILE_SIZE as f64 * 2_f64.powf(zoom)
}

/// Converts a pixel distance at `zoom` into a distance in normalized
/// Web Mercator units.
pub fn pixels_to_unit(pixels: f64, zoom: f64) -> f64 {
    pixels / world_size(zoom)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finite_positions() {
        let coord = LatLng::new(-8.2755, 115.5937);
        assert_eq!(coord.lat, -8.2755);
        assert_eq!(coord.lng, 115.5937);
        assert!(coord.is_finite());
        assert!(!LatLng::new(f64::NAN, 0.0).is_finite());
    }

    #[test]
    fn test_unit_mercator_roundtrip() {
        let origin = LatLng::new(0.0, 0.0).to_unit_mercator();
        assert!((origin.x - 0.5).abs() < 1e-12);
        assert!((origin.y - 0.5).abs() < 1e-12);

        let coord = LatLng::new(27.2579, 33.8116);
        let back = LatLng::from_unit_mercator(coord.to_unit_mercator());
        assert!((back.lat - coord.lat).abs() < 1e-9);
        assert!((back.lng - coord.lng).abs() < 1e-9);
    }

    #[test]
    fn test_north_is_up() {
        let north = LatLng::new(10.0, 0.0).to_unit_mercator();
        let south = LatLng::new(-10.0, 0.0).to_unit_mercator();
        assert!(north.y < south.y);
    }

    #[test]
    fn test_viewport_validation() {
        assert!(BoundingBox::new(0.0, 1.0, 0.0, 1.0).validate_viewport().is_ok());
        assert!(matches!(
            BoundingBox::new(2.0, 1.0, 0.0, 1.0).validate_viewport(),
            Err(ClusterError::InvalidViewport(_))
        ));
        assert!(BoundingBox::new(0.0, 1.0, 1.0, 1.0)
            .validate_viewport()
            .is_err());
        assert!(BoundingBox::new(0.0, f64::INFINITY, 0.0, 1.0)
            .validate_viewport()
            .is_err());
    }

    #[test]
    fn test_enclosing_bounds() {
        let points = [
            LatLng::new(1.0, 2.0),
            LatLng::new(-1.0, 5.0),
            LatLng::new(0.5, 3.0),
        ];
        let bounds = BoundingBox::enclosing(points.into_iter()).unwrap();
        assert_eq!(bounds, BoundingBox::new(2.0, 5.0, -1.0, 1.0));
        assert!(BoundingBox::enclosing(std::iter::empty()).is_none());
    }

    #[test]
    fn test_pixels_to_unit_halves_per_zoom() {
        let z3 = pixels_to_unit(50.0, 3.0);
        let z4 = pixels_to_unit(50.0, 4.0);
        assert!((z3 / z4 - 2.0).abs() < 1e-12);
        assert!((pixels_to_unit(256.0, 0.0) - 1.0).abs() < 1e-12);
    }
}
