use crate::adapter::{ViewportAdapter, VisibleMarker};
use crate::core::{constants::MARKER_ICON_SIZE, geo::Point};
use crate::input::events::{InputEvent, MarkerEvent};
use crate::traits::{MapSurface, SiteSelectionHandler};

/// What handling a marker event did
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Camera was fitted to a cluster
    ZoomToCluster { cluster_id: String },
    /// Site id was forwarded to the selection handler
    SelectSite { site_id: String },
    /// Nothing was hit, or no handler is registered
    Ignored,
}

/// Finds the marker under `at`. Markers drawn later sit on top, so the last
/// one within `tolerance` pixels wins.
pub fn hit_test<P>(
    markers: &[VisibleMarker<P>],
    at: Point,
    tolerance: f64,
) -> Option<&VisibleMarker<P>> {
    let tolerance_2 = tolerance * tolerance;
    markers
        .iter()
        .rev()
        .find(|marker| marker.screen.distance_squared(&at) <= tolerance_2)
}

/// Routes marker activations to the host camera and the site handler
pub struct InteractionRouter<P> {
    site_handler: Option<Box<dyn SiteSelectionHandler<P>>>,
    hit_tolerance: f64,
}

impl<P> InteractionRouter<P> {
    pub fn new() -> Self {
        Self {
            site_handler: None,
            hit_tolerance: MARKER_ICON_SIZE.0 as f64,
        }
    }

    pub fn with_site_handler(mut self, handler: impl SiteSelectionHandler<P> + 'static) -> Self {
        self.site_handler = Some(Box::new(handler));
        self
    }

    pub fn with_hit_tolerance(mut self, pixels: f64) -> Self {
        self.hit_tolerance = pixels;
        self
    }

    pub fn handle<S: MapSurface>(
        &mut self,
        event: MarkerEvent<P>,
        adapter: &mut ViewportAdapter<S>,
    ) -> Action {
        match event {
            MarkerEvent::ClusterActivated(cluster) => {
                adapter.zoom_to_cluster(&cluster);
                Action::ZoomToCluster {
                    cluster_id: cluster.id,
                }
            }
            MarkerEvent::SiteActivated(site) => match self.site_handler.as_mut() {
                Some(handler) => {
                    handler.on_site_selected(&site);
                    Action::SelectSite {
                        site_id: site.id.clone(),
                    }
                }
                None => {
                    log::debug!("site {} activated without a selection handler", site.id);
                    Action::Ignored
                }
            },
        }
    }

    /// Resolves raw input against the markers currently on screen
    pub fn handle_input<S: MapSurface>(
        &mut self,
        input: InputEvent,
        markers: &[VisibleMarker<P>],
        adapter: &mut ViewportAdapter<S>,
    ) -> Action {
        match input {
            InputEvent::Click { position } => {
                match hit_test(markers, position, self.hit_tolerance) {
                    Some(marker) => self.handle(MarkerEvent::from(marker), adapter),
                    None => Action::Ignored,
                }
            }
        }
    }
}

impl<P> Default for InteractionRouter<P> {
    fn default() -> Self {
        Self::new()
    }
}
