//! Core constants derived from Leaflet defaults and common web-map conventions.
//! Keeping them in a single place makes it easier to tweak engine-wide magic numbers.

/// Default square tile size in pixels. At zoom 0 the world is one tile wide.
pub const TILE_SIZE: u32 = 256;

/// Latitude limit of the Web Mercator projection.
pub const MAX_LATITUDE: f64 = 85.051_128_779_8;

/// Highest zoom level supported by common slippy-map hosts.
pub const MAX_SUPPORTED_ZOOM: f64 = 22.0;

/// Minimum interval between two viewport-triggered clustering passes.
pub const DEFAULT_THROTTLE_MS: u64 = 100;

/// Default clustering neighbourhood in screen pixels.
pub const DEFAULT_CLUSTER_RADIUS: f64 = 50.0;

/// Zoom at and above which every site renders on its own.
pub const DEFAULT_DECLUSTER_ZOOM: f64 = 12.0;

/// Marker icon default size (regular PNG), used as click tolerance.
pub const MARKER_ICON_SIZE: (u32, u32) = (25, 41);
