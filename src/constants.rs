//! Centralized constants used across the application.
//!
//! This module contains magic numbers and configuration values that are used
//! in multiple places or would benefit from being named constants. Values a
//! user may want to change live in [`crate::config`] instead.

/// Default window width in pixels
pub const DEFAULT_WINDOW_WIDTH: f32 = 1600.0;

/// Default window height in pixels
pub const DEFAULT_WINDOW_HEIGHT: f32 = 900.0;

/// Padding in screen pixels kept around a search result's bounding box
pub const FIT_BOUNDS_PADDING_PX: f32 = 50.0;

/// Radius of the highlight circle drawn around a search result
pub const SEARCH_CIRCLE_RADIUS_M: f64 = 500.0;

/// Marker label used when a clicked point has no usable name
pub const UNNAMED_LOCATION: &str = "Unnamed Location";

/// Record name stored when reverse geocoding a click fails outright
pub const UNKNOWN_LOCATION: &str = "Unknown Location";

/// Default file name offered when exporting saved locations
pub const EXPORT_FILE_NAME: &str = "locations.json";

/// Notice shown when the user exports an empty location list
pub const NOTHING_TO_EXPORT: &str = "No locations to export!";

/// Message shown when a search yields nothing
pub const SEARCH_NOT_FOUND: &str = "Not found";

/// Placeholder text of the search box
pub const SEARCH_PLACEHOLDER: &str = "Search locations...";

/// Maximum number of tile downloads running at once
pub const MAX_TILE_REQUESTS_IN_FLIGHT: usize = 8;

/// Cursor travel in pixels before a left press turns into a pan instead of a click
pub const CLICK_DRAG_THRESHOLD_PX: f32 = 4.0;

/// Screen-space radius of a marker pin head
pub const MARKER_RADIUS_PX: f32 = 7.0;

/// Height of the marker stem below the pin head
pub const MARKER_STEM_PX: f32 = 12.0;
