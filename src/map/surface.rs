//! The drawing surface the location pipeline talks to.
//!
//! [`MapSurface`] is deliberately small: fit the view, draw a circle, draw a
//! marker. [`MapDraw`] implements it on top of the ECS by spawning marker and
//! circle entities and queueing [`FitBoundsRequest`]s for the camera.

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use std::fmt;

use super::origin::{anchored_transform, MapAnchor, MapOrigin};
use crate::geo::{project, BoundingBox, LatLng};
use crate::theme;

/// Z of highlight circles (above tiles, below gizmos)
pub const CIRCLE_Z: f32 = 1.0;

/// Z of marker entities
pub const MARKER_Z: f32 = 2.0;

/// Operations the pipeline needs from a map.
pub trait MapSurface {
    /// Move and zoom the view so `bounds` is visible with `padding_px` spare
    /// pixels on each side.
    fn fit_bounds(&mut self, bounds: BoundingBox, padding_px: f32);

    fn draw_circle(&mut self, center: LatLng, radius_meters: f64, style: CircleStyle);

    /// Place a marker and open its popup.
    fn draw_marker(&mut self, at: LatLng, label: MarkerLabel);
}

/// Fill and border of a highlight circle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircleStyle {
    pub border: Color,
    pub fill: Color,
}

impl CircleStyle {
    /// Blue border with a 20% fill, used around search results
    pub fn search_highlight() -> Self {
        Self {
            border: theme::SEARCH_CIRCLE_BORDER,
            fill: theme::SEARCH_CIRCLE_FILL,
        }
    }
}

/// Text of a marker popup: the name plus coordinates to 4 decimal places.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerLabel {
    pub title: String,
    pub coords: LatLng,
}

impl MarkerLabel {
    pub fn new(title: impl Into<String>, coords: LatLng) -> Self {
        Self {
            title: title.into(),
            coords,
        }
    }

    pub fn lat_line(&self) -> String {
        format!("Lat: {:.4}", self.coords.lat)
    }

    pub fn lng_line(&self) -> String {
        format!("Lng: {:.4}", self.coords.lng)
    }
}

impl fmt::Display for MarkerLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {} / {}", self.title, self.lat_line(), self.lng_line())
    }
}

/// A dropped marker. Position lives in the entity's [`MapAnchor`].
#[derive(Component, Debug, Clone)]
pub struct LocationMarker {
    pub label: MarkerLabel,
}

/// A highlight circle measured in meters on the ground
#[derive(Component, Debug, Clone)]
pub struct HighlightCircle {
    pub center: LatLng,
    pub radius_meters: f64,
    pub style: CircleStyle,
}

/// Message asking the camera to frame a bounding box
#[derive(Message, Debug, Clone, Copy)]
pub struct FitBoundsRequest {
    pub bounds: BoundingBox,
    pub padding_px: f32,
}

/// Which marker popup is open. Only one is shown at a time.
#[derive(Resource, Default)]
pub struct MarkerPopups {
    pub open: Option<Entity>,
}

/// ECS-backed [`MapSurface`]
#[derive(SystemParam)]
pub struct MapDraw<'w, 's> {
    pub commands: Commands<'w, 's>,
    fit_requests: MessageWriter<'w, FitBoundsRequest>,
    popups: ResMut<'w, MarkerPopups>,
    origin: Res<'w, MapOrigin>,
}

impl MapSurface for MapDraw<'_, '_> {
    fn fit_bounds(&mut self, bounds: BoundingBox, padding_px: f32) {
        self.fit_requests.write(FitBoundsRequest { bounds, padding_px });
    }

    fn draw_circle(&mut self, center: LatLng, radius_meters: f64, style: CircleStyle) {
        let world = project(center);
        self.commands.spawn((
            HighlightCircle {
                center,
                radius_meters,
                style,
            },
            MapAnchor(world),
            anchored_transform(&self.origin, world, CIRCLE_Z),
        ));
    }

    fn draw_marker(&mut self, at: LatLng, label: MarkerLabel) {
        debug!("Marker: {}", label);
        let world = project(at);
        let entity = self
            .commands
            .spawn((
                LocationMarker { label },
                MapAnchor(world),
                anchored_transform(&self.origin, world, MARKER_Z),
            ))
            .id();
        self.popups.open = Some(entity);
    }
}
