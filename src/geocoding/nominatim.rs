//! Nominatim HTTP client.
//!
//! Example search response (coordinates and box are strings):
//! ```json
//! [{
//!   "lat": "51.5073219",
//!   "lon": "-0.1276474",
//!   "display_name": "London, Greater London, England, United Kingdom",
//!   "boundingbox": ["51.2867601", "51.6918741", "-0.5103751", "0.3340155"],
//!   "class": "place",
//!   "type": "city"
//! }]
//! ```

use serde::Deserialize;
use std::time::Duration;

use super::{GeocodeError, Geocoder, ReverseGeocode, SearchOptions, SearchResult};
use crate::config::GeocoderSettings;
use crate::geo::{BoundingBox, LatLng};

pub struct NominatimClient {
    agent: ureq::Agent,
    base_url: String,
}

impl NominatimClient {
    pub fn new(settings: &GeocoderSettings) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(settings.timeout_secs.max(1)))
            .user_agent(&settings.user_agent)
            .build();

        Self {
            agent,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn fetch(&self, request: ureq::Request) -> Result<String, GeocodeError> {
        let response = request.call()?;
        Ok(response.into_string()?)
    }
}

impl Geocoder for NominatimClient {
    fn search(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> Result<Vec<SearchResult>, GeocodeError> {
        let mut request = self
            .agent
            .get(&self.endpoint("search"))
            .query("q", query)
            .query("format", "json")
            .query("limit", &options.limit.to_string());

        let country_codes = options.country_codes.trim();
        if !country_codes.is_empty() {
            request = request.query("countrycodes", country_codes);
        }

        parse_search_response(&self.fetch(request)?)
    }

    fn reverse(&self, coords: LatLng) -> Result<ReverseGeocode, GeocodeError> {
        let request = self
            .agent
            .get(&self.endpoint("reverse"))
            .query("format", "json")
            .query("lat", &coords.lat.to_string())
            .query("lon", &coords.lng.to_string());

        parse_reverse_response(&self.fetch(request)?)
    }
}

/// Nominatim encodes numbers as strings; some compatible servers do not.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Coordinate {
    Text(String),
    Number(f64),
}

impl Coordinate {
    fn parse(&self, field: &str) -> Result<f64, GeocodeError> {
        let value = match self {
            Coordinate::Number(n) => *n,
            Coordinate::Text(s) => s.trim().parse::<f64>().map_err(|_| {
                GeocodeError::Parse(format!("invalid {} value '{}'", field, s))
            })?,
        };

        if value.is_finite() {
            Ok(value)
        } else {
            Err(GeocodeError::Parse(format!("non-finite {} value", field)))
        }
    }
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: Coordinate,
    lon: Coordinate,
    #[serde(default)]
    display_name: String,
    /// south, north, west, east
    #[serde(default)]
    boundingbox: Vec<Coordinate>,
    #[serde(default)]
    class: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
}

impl NominatimPlace {
    fn into_result(self) -> Result<SearchResult, GeocodeError> {
        let center = LatLng::new(self.lat.parse("lat")?, self.lon.parse("lon")?);
        if !center.is_valid() {
            return Err(GeocodeError::Parse(format!("coordinates out of range: {}", center)));
        }

        let bbox = match self.boundingbox.as_slice() {
            [south, north, west, east] => BoundingBox::new(
                south.parse("boundingbox")?,
                west.parse("boundingbox")?,
                north.parse("boundingbox")?,
                east.parse("boundingbox")?,
            ),
            _ => BoundingBox::around(center),
        };
        // A box that misses its own center is useless for framing the view
        let bbox = if bbox.is_valid() && bbox.contains(center) {
            bbox
        } else {
            BoundingBox::around(center)
        };

        let category = match (self.class, self.kind) {
            (Some(class), Some(kind)) => Some(format!("{}/{}", class, kind)),
            (class, kind) => class.or(kind),
        };

        Ok(SearchResult {
            center,
            name: self.display_name,
            bbox,
            category,
        })
    }
}

#[derive(Debug, Deserialize)]
struct NominatimReverse {
    #[serde(default)]
    display_name: Option<String>,
    /// Present instead of an address when nothing is found at the point
    #[serde(default)]
    error: Option<String>,
}

/// Parse a search reply. Candidates that cannot be used are logged and
/// skipped; only a malformed reply as a whole is an error.
pub(crate) fn parse_search_response(body: &str) -> Result<Vec<SearchResult>, GeocodeError> {
    let places: Vec<NominatimPlace> = serde_json::from_str(body)?;
    Ok(places
        .into_iter()
        .filter_map(|place| match place.into_result() {
            Ok(result) => Some(result),
            Err(e) => {
                bevy::log::warn!("Skipping search result: {}", e);
                None
            }
        })
        .collect())
}

pub(crate) fn parse_reverse_response(body: &str) -> Result<ReverseGeocode, GeocodeError> {
    let reverse: NominatimReverse = serde_json::from_str(body)?;

    if let Some(reason) = reverse.error {
        bevy::log::debug!("Reverse geocoder found no address: {}", reason);
    }

    Ok(ReverseGeocode {
        display_name: reverse.display_name,
    })
}
