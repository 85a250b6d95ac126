//! Spherical Web Mercator projection and view fitting.

use bevy::math::DVec2;
use std::f64::consts::PI;

use super::{BoundingBox, LatLng};

/// Width and height of the projected world at zoom 0, in world units.
pub const WORLD_SIZE: f64 = 256.0;

/// Latitude at which the Web Mercator square is cut off.
pub const MAX_MERCATOR_LAT: f64 = 85.051_128_779_806_59;

/// Equatorial circumference used by Web Mercator (2 * PI * 6378137).
pub const EARTH_CIRCUMFERENCE_M: f64 = 40_075_016.685_578_49;

/// Degrees to world units. North is +y, east is +x, (0, 0) maps to the origin.
pub fn project(coords: LatLng) -> DVec2 {
    let lat = coords
        .lat
        .clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT)
        .to_radians();
    let x = coords.lng / 360.0 * WORLD_SIZE;
    let y = (PI / 4.0 + lat / 2.0).tan().ln() / (2.0 * PI) * WORLD_SIZE;
    DVec2::new(x, y)
}

/// World units back to degrees. Longitude is not wrapped.
pub fn unproject(world: DVec2) -> LatLng {
    let lng = world.x / WORLD_SIZE * 360.0;
    let lat = (world.y / WORLD_SIZE * 2.0 * PI).sinh().atan().to_degrees();
    LatLng::new(lat, lng)
}

/// How many world units one meter spans at the given latitude.
pub fn world_units_per_meter(lat: f64) -> f64 {
    let lat = lat.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT).to_radians();
    WORLD_SIZE / (EARTH_CIRCUMFERENCE_M * lat.cos())
}

/// Screen pixels per world unit at a zoom level.
pub fn zoom_scale(zoom: f64) -> f64 {
    2f64.powf(zoom)
}

/// Camera placement produced by [`fit_bounds`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewFit {
    /// View center in world units
    pub center: DVec2,
    /// Whole zoom level
    pub zoom: f64,
}

/// Largest whole zoom level at which `bounds` fits inside `viewport` pixels
/// once `padding` pixels are reserved on every side.
///
/// A zero-area box zooms in as far as allowed.
pub fn fit_bounds(
    bounds: &BoundingBox,
    viewport: DVec2,
    padding: f64,
    min_zoom: f64,
    max_zoom: f64,
) -> ViewFit {
    let south_west = project(bounds.south_west());
    let north_east = project(bounds.north_east());
    let size = (north_east - south_west).abs();
    let available = (viewport - DVec2::splat(padding * 2.0)).max(DVec2::ONE);

    let axis_zoom = |available: f64, extent: f64| {
        if extent > f64::EPSILON {
            (available / extent).log2()
        } else {
            f64::INFINITY
        }
    };

    let zoom = axis_zoom(available.x, size.x)
        .min(axis_zoom(available.y, size.y))
        .floor()
        .clamp(min_zoom, max_zoom);

    ViewFit {
        center: (south_west + north_east) / 2.0,
        zoom,
    }
}
