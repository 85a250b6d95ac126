//! Turning a search selection or a resolved map click into a marker and a
//! saved record.
//!
//! Both branches draw first and append last. The click branch never fails:
//! a reverse lookup error degrades the name but the marker and the record
//! are still produced.

use bevy::prelude::*;

use super::{LocationOrigin, LocationRecord, LocationStore};
use crate::constants::{
    FIT_BOUNDS_PADDING_PX, SEARCH_CIRCLE_RADIUS_M, UNKNOWN_LOCATION, UNNAMED_LOCATION,
};
use crate::geo::LatLng;
use crate::geocoding::{GeocodeError, ReverseGeocode, SearchResult};
use crate::map::{CircleStyle, MapSurface, MarkerLabel};

/// Show a selected search result and save it.
///
/// The name is stored exactly as the geocoder returned it, even when empty.
pub fn place_search_result<'a>(
    surface: &mut impl MapSurface,
    store: &'a mut LocationStore,
    result: &SearchResult,
) -> &'a LocationRecord {
    surface.fit_bounds(result.bbox, FIT_BOUNDS_PADDING_PX);
    surface.draw_circle(
        result.center,
        SEARCH_CIRCLE_RADIUS_M,
        CircleStyle::search_highlight(),
    );
    surface.draw_marker(
        result.center,
        MarkerLabel::new(result.name.clone(), result.center),
    );

    store.append(LocationRecord::new(
        result.center,
        result.name.clone(),
        LocationOrigin::Search,
    ))
}

/// Names derived from a reverse lookup outcome
#[derive(Debug, Clone, PartialEq)]
pub struct ClickNaming {
    /// Title of the marker popup
    pub marker_title: String,
    /// Name stored in the record
    pub record_name: String,
}

impl ClickNaming {
    pub fn from_lookup(lookup: &Result<ReverseGeocode, GeocodeError>) -> Self {
        match lookup {
            Ok(reverse) => {
                let name = reverse
                    .display_name
                    .as_deref()
                    .filter(|name| !name.is_empty())
                    .unwrap_or(UNNAMED_LOCATION)
                    .to_string();
                Self {
                    marker_title: name.clone(),
                    record_name: name,
                }
            }
            Err(_) => Self {
                marker_title: UNNAMED_LOCATION.to_string(),
                record_name: UNKNOWN_LOCATION.to_string(),
            },
        }
    }
}

/// Show and save a clicked point once its reverse lookup has finished.
pub fn place_clicked_location<'a>(
    surface: &mut impl MapSurface,
    store: &'a mut LocationStore,
    coords: LatLng,
    lookup: Result<ReverseGeocode, GeocodeError>,
) -> &'a LocationRecord {
    if let Err(ref e) = lookup {
        warn!("Reverse geocode failed for {}: {}", coords, e);
    }

    let naming = ClickNaming::from_lookup(&lookup);
    surface.draw_marker(coords, MarkerLabel::new(naming.marker_title, coords));

    store.append(LocationRecord::new(
        coords,
        naming.record_name,
        LocationOrigin::Click,
    ))
}
