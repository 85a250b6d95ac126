use serde::{Deserialize, Serialize};

use crate::geo::LatLng;

/// How a location entered the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationOrigin {
    Search,
    Click,
}

/// A saved location. Fields are private: a record never changes once made.
///
/// Serialized as `{ "lat", "lng", "name", "type" }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRecord {
    #[serde(rename = "lat")]
    latitude: f64,
    #[serde(rename = "lng")]
    longitude: f64,
    name: String,
    #[serde(rename = "type")]
    origin: LocationOrigin,
}

impl LocationRecord {
    pub fn new(coords: LatLng, name: impl Into<String>, origin: LocationOrigin) -> Self {
        Self {
            latitude: coords.lat,
            longitude: coords.lng,
            name: name.into(),
            origin,
        }
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn coords(&self) -> LatLng {
        LatLng::new(self.latitude, self.longitude)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn origin(&self) -> LocationOrigin {
        self.origin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_json_shape() {
        let record = LocationRecord::new(
            LatLng::new(51.5007, -0.1246),
            "London, UK",
            LocationOrigin::Click,
        );
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(
            json,
            r#"{"lat":51.5007,"lng":-0.1246,"name":"London, UK","type":"click"}"#
        );
    }

    #[test]
    fn test_origin_tags() {
        assert_eq!(
            serde_json::to_string(&LocationOrigin::Search).unwrap(),
            r#""search""#
        );
        let parsed: LocationOrigin = serde_json::from_str(r#""click""#).unwrap();
        assert_eq!(parsed, LocationOrigin::Click);
    }

    #[test]
    fn test_accessors() {
        let record = LocationRecord::new(LatLng::new(30.0, 0.0), "X", LocationOrigin::Search);
        assert_eq!(record.latitude(), 30.0);
        assert_eq!(record.longitude(), 0.0);
        assert_eq!(record.coords(), LatLng::new(30.0, 0.0));
        assert_eq!(record.name(), "X");
        assert_eq!(record.origin(), LocationOrigin::Search);
    }
}
