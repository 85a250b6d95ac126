//! Forward and reverse geocoding.
//!
//! The [`Geocoder`] trait is the seam the rest of the application talks to.
//! [`NominatimClient`] implements it over HTTP with `ureq`; calls are blocking
//! and are always made from a background task, never from a system directly.
//!
//! ## Module Structure
//!
//! - [`nominatim`] - HTTP client and response parsing
//! - [`search`] - Search control state, messages and task polling

mod nominatim;
pub mod search;

pub use nominatim::NominatimClient;
pub use search::{SearchRequest, SearchResultSelected, SearchState};

use bevy::prelude::*;
use std::sync::Arc;
use thiserror::Error;

use crate::config::{AppConfig, ConfigLoaded, GeocoderSettings};
use crate::geo::{BoundingBox, LatLng};

/// Errors raised by a geocoding request.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeocodeError {
    /// Connection, DNS, TLS, timeout or body read failure
    #[error("geocoding request failed: {0}")]
    Network(String),
    /// The service answered with a non-success status
    #[error("geocoding service returned HTTP {0}")]
    Status(u16),
    /// The body was not the JSON shape we expect
    #[error("malformed geocoding response: {0}")]
    Parse(String),
}

impl From<ureq::Error> for GeocodeError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(code, _) => GeocodeError::Status(code),
            ureq::Error::Transport(transport) => GeocodeError::Network(transport.to_string()),
        }
    }
}

impl From<std::io::Error> for GeocodeError {
    fn from(err: std::io::Error) -> Self {
        GeocodeError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for GeocodeError {
    fn from(err: serde_json::Error) -> Self {
        GeocodeError::Parse(err.to_string())
    }
}

/// Parameters of a forward search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOptions {
    /// Maximum number of candidates
    pub limit: u8,
    /// Comma separated ISO country codes; empty means worldwide
    pub country_codes: String,
}

impl From<&GeocoderSettings> for SearchOptions {
    fn from(settings: &GeocoderSettings) -> Self {
        Self {
            limit: settings.result_limit.max(1),
            country_codes: settings.country_codes.clone(),
        }
    }
}

/// A place candidate returned by a forward search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub center: LatLng,
    pub name: String,
    pub bbox: BoundingBox,
    /// Place class and type, e.g. "boundary/administrative"
    pub category: Option<String>,
}

/// Result of a reverse lookup. A service may answer without a name.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReverseGeocode {
    pub display_name: Option<String>,
}

/// A geocoding backend.
///
/// Implementations block; callers run them on a task pool.
pub trait Geocoder: Send + Sync {
    /// Free text query to ranked place candidates.
    fn search(&self, query: &str, options: &SearchOptions)
        -> Result<Vec<SearchResult>, GeocodeError>;

    /// Coordinates to a human readable name.
    fn reverse(&self, coords: LatLng) -> Result<ReverseGeocode, GeocodeError>;
}

/// Shared handle to the active geocoder
#[derive(Resource, Clone)]
pub struct GeocoderClient(pub Arc<dyn Geocoder>);

/// Startup system building the HTTP geocoder from the loaded config
fn init_geocoder_client(mut commands: Commands, config: Res<AppConfig>) {
    let settings = &config.data.geocoder;
    info!(
        "Using geocoder at {} (timeout {}s)",
        settings.base_url, settings.timeout_secs
    );
    commands.insert_resource(GeocoderClient(Arc::new(NominatimClient::new(settings))));
}

pub struct GeocodingPlugin;

impl Plugin for GeocodingPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SearchState>()
            .add_message::<SearchRequest>()
            .add_message::<SearchResultSelected>()
            .add_systems(Startup, init_geocoder_client.after(ConfigLoaded))
            .add_systems(
                Update,
                (
                    search::start_search.run_if(on_message::<SearchRequest>),
                    search::poll_search_task,
                )
                    .chain(),
            );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_options_from_settings() {
        let settings = GeocoderSettings {
            country_codes: "fr".to_string(),
            result_limit: 0,
            ..GeocoderSettings::default()
        };
        let options = SearchOptions::from(&settings);
        assert_eq!(options.country_codes, "fr");
        // A zero limit would make every search come back empty
        assert_eq!(options.limit, 1);
    }

    #[test]
    fn test_serde_errors_become_parse_errors() {
        let err = serde_json::from_str::<Vec<u8>>("nope").unwrap_err();
        assert!(matches!(GeocodeError::from(err), GeocodeError::Parse(_)));
    }

    #[test]
    fn test_io_errors_become_network_errors() {
        let err = std::io::Error::new(std::io::ErrorKind::TimedOut, "timed out");
        assert_eq!(
            GeocodeError::from(err),
            GeocodeError::Network("timed out".to_string())
        );
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            GeocodeError::Status(503).to_string(),
            "geocoding service returned HTTP 503"
        );
        assert!(GeocodeError::Parse("eof".into()).to_string().contains("malformed"));
    }
}
