//! Seams between the clustering subsystem and its host
//!
//! The engine and scheduler never talk to a map widget directly. Hosts
//! implement [`MapSurface`] and hand it to a
//! [`ViewportAdapter`](crate::adapter::ViewportAdapter).

use crate::core::{
    bounds::Bounds,
    geo::{BoundingBox, LatLng, Point},
    site::Site,
};

/// Camera and projection primitives of the host map
pub trait MapSurface {
    /// Visible extent and zoom, `None` while the map is not initialized
    fn camera(&self) -> Option<(BoundingBox, f64)>;

    /// Container pixel position of a coordinate, `None` while not initialized
    fn project(&self, lat_lng: &LatLng) -> Option<Point>;

    /// Pixel rectangle of the map container
    fn screen_bounds(&self) -> Option<Bounds>;

    /// Moves the camera so `bounds` is fully visible
    fn fit_bounds(&mut self, bounds: &BoundingBox);
}

/// Receives activated sites, typically to fetch their details
pub trait SiteSelectionHandler<P> {
    fn on_site_selected(&mut self, site: &Site<P>);
}

impl<P, F> SiteSelectionHandler<P> for F
where
    F: FnMut(&Site<P>),
{
    fn on_site_selected(&mut self, site: &Site<P>) {
        self(site)
    }
}
