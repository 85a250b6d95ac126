//! The interactive map: camera, base tiles, markers and pointer input.
//!
//! ## Module Structure
//!
//! - [`surface`] - [`MapSurface`] trait and its ECS implementation
//! - [`camera`] - Zoom levels, panning and bounds fitting
//! - [`input`] - Click versus drag detection, marker hits and map clicks
//! - [`tiles`] - Background tile downloads shown as sprites
//! - [`markers`] - Circle meshes and pin gizmos
//! - [`origin`] - Floating render origin for deep zoom precision

pub mod camera;
pub mod input;
mod markers;
pub mod origin;
mod surface;
pub mod tiles;

pub use camera::{MapCamera, MapView, MapZoom};
pub use input::{no_dialog_open, MapClicked, PointerGesture};
pub use origin::{MapAnchor, MapOrigin};
pub use surface::{
    CircleStyle, FitBoundsRequest, HighlightCircle, LocationMarker, MapDraw, MapSurface,
    MarkerLabel, MarkerPopups,
};

use bevy::prelude::*;

use crate::config::ConfigLoaded;

pub struct MapPlugin;

impl Plugin for MapPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<MarkerPopups>()
            .init_resource::<PointerGesture>()
            .init_resource::<tiles::TileCache>()
            .init_resource::<MapOrigin>()
            .add_message::<MapClicked>()
            .add_message::<FitBoundsRequest>()
            .add_systems(
                Startup,
                (camera::spawn_camera, tiles::init_tile_client).after(ConfigLoaded),
            )
            .add_systems(
                Update,
                (
                    input::reset_gesture_on_dialog,
                    input::handle_map_pointer.run_if(no_dialog_open),
                    camera::camera_pan.run_if(no_dialog_open),
                    camera::camera_zoom.run_if(no_dialog_open),
                    camera::apply_fit_bounds,
                    camera::clamp_camera_to_world,
                    origin::rebase_origin,
                    origin::sync_anchored_transforms,
                    camera::apply_camera_zoom,
                    tiles::request_visible_tiles,
                    tiles::poll_tile_tasks,
                )
                    .chain(),
            )
            .add_systems(
                Update,
                (
                    markers::attach_circle_meshes,
                    markers::draw_circle_borders,
                    markers::draw_marker_pins,
                ),
            );
    }
}
