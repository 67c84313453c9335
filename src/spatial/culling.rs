use crate::core::{
    bounds::Bounds,
    geo::{BoundingBox, LatLng, Point},
};

/// Visibility tests used when handing markers to the renderer.
///
/// Geographic tests decide what the camera covers; screen tests add a pixel
/// margin so markers whose icon still overlaps the edge are kept.
pub struct Culling;

impl Culling {
    /// Returns `true` if a coordinate lies inside the geographic viewport.
    pub fn lat_lng_visible(viewport: &BoundingBox, position: &LatLng) -> bool {
        viewport.contains(position)
    }

    /// Returns `true` if a point lies inside the screen rectangle.
    pub fn point_visible(screen: &Bounds, p: &Point) -> bool {
        screen.contains(p)
    }

    /// Returns `true` if a point lies inside the screen rectangle grown by
    /// `margin` pixels on every side.
    pub fn point_visible_with_margin(screen: &Bounds, p: &Point, margin: f64) -> bool {
        if margin <= 0.0 {
            return Self::point_visible(screen, p);
        }
        screen.expanded(margin).contains(p)
    }
}
