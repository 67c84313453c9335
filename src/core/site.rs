use crate::core::geo::LatLng;
use crate::prelude::HashSet;
use serde::{Deserialize, Serialize};

/// A geo-located dive site.
///
/// Everything except `id` and the coordinates lives in `payload`, which the
/// engine carries through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site<P> {
    pub id: String,
    pub lat: f64,
    pub lng: f64,
    pub payload: P,
}

impl<P> Site<P> {
    pub fn new(id: impl Into<String>, lat: f64, lng: f64, payload: P) -> Self {
        Self {
            id: id.into(),
            lat,
            lng,
            payload,
        }
    }

    pub fn position(&self) -> LatLng {
        LatLng::new(self.lat, self.lng)
    }

    pub fn has_finite_position(&self) -> bool {
        self.position().is_finite()
    }
}

impl Site<()> {
    /// A site without attributes
    pub fn bare(id: impl Into<String>, lat: f64, lng: f64) -> Self {
        Self::new(id, lat, lng, ())
    }
}

/// Drops repeated ids, keeping the first occurrence and the original order.
///
/// Callers feeding overlapping result pages should run this before handing
/// the list to the scheduler.
pub fn dedup_by_id<P>(sites: Vec<Site<P>>) -> Vec<Site<P>> {
    let mut seen = HashSet::default();
    sites
        .into_iter()
        .filter(|site| seen.insert(site.id.clone()))
        .collect()
}
