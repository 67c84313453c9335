use crate::core::{
    bounds::Bounds,
    constants::{MAX_LATITUDE, MAX_SUPPORTED_ZOOM},
    geo::{world_size, BoundingBox, LatLng, Point},
};
use crate::traits::MapSurface;
use serde::{Deserialize, Serialize};

/// Camera state: center, zoom and container size.
///
/// A minimal in-process camera. It stands in for a real map widget wherever
/// one is not available (headless hosts, tests) and is the reference
/// [`MapSurface`] implementation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub center: LatLng,
    pub zoom: f64,
    /// Container size in pixels, zero until laid out
    pub size: Point,
    pub min_zoom: f64,
    pub max_zoom: f64,
}

impl Viewport {
    pub fn new(center: LatLng, zoom: f64, size: Point) -> Self {
        Self {
            center: Self::clamp_center(center),
            zoom: zoom.clamp(0.0, MAX_SUPPORTED_ZOOM),
            size,
            min_zoom: 0.0,
            max_zoom: MAX_SUPPORTED_ZOOM,
        }
    }

    /// Sets the center of the viewport, clamped to the projectable world
    pub fn set_center(&mut self, center: LatLng) {
        self.center = Self::clamp_center(center);
    }

    /// Clamped to the zoom limits
    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom.clamp(self.min_zoom, self.max_zoom);
    }

    /// Zero-area viewports have not been laid out yet
    pub fn is_laid_out(&self) -> bool {
        self.size.x > 0.0 && self.size.y > 0.0
    }

    /// World pixel position, at the current zoom unless one is given
    pub fn project(&self, lat_lng: &LatLng, zoom: Option<f64>) -> Point {
        let scale = world_size(zoom.unwrap_or(self.zoom));
        lat_lng.to_unit_mercator().multiply(scale)
    }

    pub fn unproject(&self, pixel: &Point, zoom: Option<f64>) -> LatLng {
        let scale = world_size(zoom.unwrap_or(self.zoom));
        LatLng::from_unit_mercator(pixel.multiply(1.0 / scale))
    }

    /// Container pixel position of a coordinate
    pub fn lat_lng_to_pixel(&self, lat_lng: &LatLng) -> Point {
        let origin = self.project(&self.center, None);
        self.project(lat_lng, None)
            .subtract(&origin)
            .add(&self.size.multiply(0.5))
    }

    pub fn pixel_to_lat_lng(&self, pixel: &Point) -> LatLng {
        let origin = self.project(&self.center, None);
        let world = pixel.subtract(&self.size.multiply(0.5)).add(&origin);
        self.unproject(&world, None)
    }

    /// Moves the camera by a pixel offset
    pub fn pan(&mut self, delta: Point) {
        let center_px = self.project(&self.center, None);
        let new_center = self.unproject(&center_px.add(&delta), None);
        self.set_center(new_center);
    }

    /// Geographic extent of the container
    pub fn bounds(&self) -> BoundingBox {
        let nw = self.pixel_to_lat_lng(&Point::new(0.0, 0.0));
        let se = self.pixel_to_lat_lng(&self.size);
        BoundingBox::new(nw.lng, se.lng, se.lat, nw.lat)
    }

    /// Centers on `bounds` and picks the highest integer zoom that fits it
    /// inside the viewport minus `padding` pixels on every side.
    pub fn fit_bounds(&mut self, bounds: &BoundingBox, padding: Option<f64>) {
        let padding = padding.unwrap_or(20.0);
        let available = Point::new(self.size.x - 2.0 * padding, self.size.y - 2.0 * padding);

        let mut best_zoom = self.min_zoom;
        for test_zoom in (self.min_zoom.ceil() as i32)..=(self.max_zoom.floor() as i32) {
            let zoom = test_zoom as f64;
            let nw = self.project(&LatLng::new(bounds.max_lat, bounds.min_lng), Some(zoom));
            let se = self.project(&LatLng::new(bounds.min_lat, bounds.max_lng), Some(zoom));

            if (se.x - nw.x).abs() <= available.x && (se.y - nw.y).abs() <= available.y {
                best_zoom = zoom;
            } else {
                break;
            }
        }

        self.set_center(bounds.center());
        self.set_zoom(best_zoom);
    }

    fn clamp_center(center: LatLng) -> LatLng {
        LatLng::new(
            center.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE),
            center.lng.clamp(-180.0, 180.0),
        )
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(LatLng::new(0.0, 0.0), 0.0, Point::new(800.0, 600.0))
    }
}

impl MapSurface for Viewport {
    fn camera(&self) -> Option<(BoundingBox, f64)> {
        self.is_laid_out().then(|| (self.bounds(), self.zoom))
    }

    fn project(&self, lat_lng: &LatLng) -> Option<Point> {
        self.is_laid_out().then(|| self.lat_lng_to_pixel(lat_lng))
    }

    fn screen_bounds(&self) -> Option<Bounds> {
        self.is_laid_out().then(|| Bounds::from_size(self.size))
    }

    fn fit_bounds(&mut self, bounds: &BoundingBox) {
        Viewport::fit_bounds(self, bounds, None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewport_creation() {
        let viewport = Viewport::new(LatLng::new(-8.27, 115.59), 10.0, Point::new(800.0, 600.0));
        assert_eq!(viewport.zoom, 10.0);
        assert_eq!(viewport.center.lat, -8.27);
        assert_eq!(viewport.size.x, 800.0);
    }

    #[test]
    fn test_coordinate_conversion() {
        let viewport = Viewport::new(LatLng::new(0.0, 0.0), 1.0, Point::new(512.0, 512.0));

        let center = viewport.pixel_to_lat_lng(&Point::new(256.0, 256.0));
        assert!(center.lat.abs() < 0.01);
        assert!(center.lng.abs() < 0.01);

        let pixel = viewport.lat_lng_to_pixel(&LatLng::new(10.0, 20.0));
        let back = viewport.pixel_to_lat_lng(&pixel);
        assert!((back.lat - 10.0).abs() < 1e-9);
        assert!((back.lng - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_bounds_surround_center() {
        let viewport = Viewport::new(LatLng::new(27.0, 34.0), 8.0, Point::new(800.0, 600.0));
        let bounds = viewport.bounds();
        assert!(bounds.validate_viewport().is_ok());
        assert!(bounds.contains(&viewport.center));
        // 800px at zoom 8 is 800 / (256 * 256) of the world
        let expected_span = 800.0 / 65536.0 * 360.0;
        assert!((bounds.max_lng - bounds.min_lng - expected_span).abs() < 1e-9);
    }

    #[test]
    fn test_zoom_range_matches_supported_zoom() {
        let deep = Viewport::new(LatLng::new(27.8, 33.9), 21.0, Point::new(800.0, 600.0));
        assert_eq!(deep.zoom, 21.0);

        let mut viewport = Viewport::default();
        viewport.set_zoom(30.0);
        assert_eq!(viewport.zoom, MAX_SUPPORTED_ZOOM);
        viewport.set_zoom(-1.0);
        assert_eq!(viewport.zoom, 0.0);
    }

    #[test]
    fn test_pan_moves_center() {
        let mut viewport = Viewport::new(LatLng::new(0.0, 0.0), 1.0, Point::new(512.0, 512.0));
        viewport.pan(Point::new(10.0, 0.0));
        assert!(viewport.center.lng > 0.0);
        assert!(viewport.center.lat.abs() < 1e-9);
    }

    #[test]
    fn test_fit_bounds() {
        let mut viewport = Viewport::new(LatLng::new(0.0, 0.0), 2.0, Point::new(800.0, 600.0));
        let target = BoundingBox::new(145.0, 146.0, -17.0, -16.0);
        viewport.fit_bounds(&target, None);

        let visible = viewport.bounds();
        assert!(visible.contains(&target.south_west()));
        assert!(visible.contains(&target.north_east()));
        // one degree fits at zoom 8 (~182px) but not at zoom 10 (~728px tall)
        assert!(viewport.zoom >= 8.0);
    }

    #[test]
    fn test_unlaid_viewport_has_no_camera() {
        let viewport = Viewport::new(LatLng::new(0.0, 0.0), 3.0, Point::new(0.0, 0.0));
        assert!(viewport.camera().is_none());
        assert!(MapSurface::project(&viewport, &LatLng::new(0.0, 0.0)).is_none());
    }
}
