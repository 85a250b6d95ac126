//! Geographic primitives shared by the map surface, the geocoder and the
//! location pipeline.
//!
//! Coordinates are WGS84 degrees. The map itself works in "world units":
//! spherical Web Mercator at zoom 0, where the whole world is a
//! [`WORLD_SIZE`]-unit square centered on the origin with north pointing up.

mod projection;

pub use projection::{
    fit_bounds, project, unproject, world_units_per_meter, zoom_scale, ViewFit,
    EARTH_CIRCUMFERENCE_M, MAX_MERCATOR_LAT, WORLD_SIZE,
};

use serde::{Deserialize, Serialize};
use std::fmt;

/// A point on the globe in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// True when both components are finite and inside the WGS84 ranges.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    /// Clamp latitude and wrap longitude back into [-180, 180].
    ///
    /// Clicks on a panned map can land outside the canonical longitude range.
    pub fn wrapped(self) -> Self {
        let lng = if (-180.0..=180.0).contains(&self.lng) {
            self.lng
        } else {
            (self.lng + 180.0).rem_euclid(360.0) - 180.0
        };
        Self {
            lat: self.lat.clamp(-90.0, 90.0),
            lng,
        }
    }
}

impl fmt::Display for LatLng {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.lat, self.lng)
    }
}

/// Rectangular region given by its coordinate extremes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl BoundingBox {
    /// Build a box from two latitudes and two longitudes in any order.
    pub fn new(lat_a: f64, lng_a: f64, lat_b: f64, lng_b: f64) -> Self {
        Self {
            south: lat_a.min(lat_b),
            west: lng_a.min(lng_b),
            north: lat_a.max(lat_b),
            east: lng_a.max(lng_b),
        }
    }

    /// A zero-area box around a single point.
    pub fn around(point: LatLng) -> Self {
        Self::new(point.lat, point.lng, point.lat, point.lng)
    }

    pub fn south_west(&self) -> LatLng {
        LatLng::new(self.south, self.west)
    }

    pub fn north_east(&self) -> LatLng {
        LatLng::new(self.north, self.east)
    }

    pub fn contains(&self, point: LatLng) -> bool {
        (self.south..=self.north).contains(&point.lat)
            && (self.west..=self.east).contains(&point.lng)
    }

    pub fn is_valid(&self) -> bool {
        self.south_west().is_valid() && self.north_east().is_valid()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latlng_display_uses_four_decimals() {
        let coords = LatLng::new(51.50073, -0.124_625);
        assert_eq!(coords.to_string(), "51.5007, -0.1246");
    }

    #[test]
    fn test_latlng_validity() {
        assert!(LatLng::new(0.0, 0.0).is_valid());
        assert!(LatLng::new(-90.0, 180.0).is_valid());
        assert!(!LatLng::new(91.0, 0.0).is_valid());
        assert!(!LatLng::new(0.0, -180.5).is_valid());
        assert!(!LatLng::new(f64::NAN, 0.0).is_valid());
    }

    #[test]
    fn test_wrapped_longitude() {
        let wrapped = LatLng::new(10.0, 190.0).wrapped();
        assert!((wrapped.lng - -170.0).abs() < 1e-9);

        let wrapped = LatLng::new(10.0, -540.0).wrapped();
        assert!((wrapped.lng - -180.0).abs() < 1e-9);

        // Values already in range are untouched (including the 180 edge)
        assert_eq!(LatLng::new(5.0, 180.0).wrapped(), LatLng::new(5.0, 180.0));
    }

    #[test]
    fn test_wrapped_clamps_latitude() {
        assert_eq!(LatLng::new(120.0, 0.0).wrapped().lat, 90.0);
        assert_eq!(LatLng::new(-95.0, 0.0).wrapped().lat, -90.0);
    }

    #[test]
    fn test_bounding_box_normalizes_corners() {
        let bbox = BoundingBox::new(52.0, 0.5, 51.0, -0.5);
        assert_eq!(bbox.south, 51.0);
        assert_eq!(bbox.north, 52.0);
        assert_eq!(bbox.west, -0.5);
        assert_eq!(bbox.east, 0.5);
        assert!(bbox.contains(LatLng::new(51.5007, -0.1246)));
        assert!(!bbox.contains(LatLng::new(48.85, 2.35)));
    }

    #[test]
    fn test_bounding_box_around_point() {
        let point = LatLng::new(30.0, 0.0);
        let bbox = BoundingBox::around(point);
        assert_eq!(bbox.south_west(), point);
        assert_eq!(bbox.north_east(), point);
        assert!(bbox.is_valid());
    }
}
