//! Pointer handling on the map: click versus drag, marker hits and map clicks.

use bevy::math::DVec2;
use bevy::prelude::*;
use bevy_egui::EguiContexts;

use super::camera::MapView;
use super::surface::{LocationMarker, MarkerPopups};
use crate::constants::{CLICK_DRAG_THRESHOLD_PX, MARKER_RADIUS_PX, MARKER_STEM_PX};
use crate::geo::{unproject, LatLng, WORLD_SIZE};
use crate::ui::DialogState;

/// Message sent when the user clicks an empty spot on the map
#[derive(Message, Debug, Clone, Copy)]
pub struct MapClicked {
    pub coords: LatLng,
}

/// Left button press in progress on the map
#[derive(Resource, Default)]
pub struct PointerGesture {
    /// Screen position of the press; None when the press began over the UI
    press_origin: Option<Vec2>,
    panning: bool,
}

impl PointerGesture {
    pub fn is_panning(&self) -> bool {
        self.panning
    }

    fn begin(&mut self, at: Option<Vec2>) {
        self.press_origin = at;
        self.panning = false;
    }

    /// Returns true once the pointer has moved far enough to count as a drag
    fn track(&mut self, at: Vec2) -> bool {
        if let Some(origin) = self.press_origin
            && origin.distance(at) > CLICK_DRAG_THRESHOLD_PX
        {
            self.panning = true;
        }
        self.panning
    }

    /// Ends the press. Returns true if it was a click.
    fn finish(&mut self) -> bool {
        let was_click = self.press_origin.is_some() && !self.panning;
        self.press_origin = None;
        self.panning = false;
        was_click
    }
}

/// Run condition: returns true when no modal dialog is open.
pub fn no_dialog_open(dialog_state: Res<DialogState>) -> bool {
    !dialog_state.any_modal_open
}

/// Check if the cursor is over egui UI
pub fn is_cursor_over_ui(contexts: &mut EguiContexts) -> bool {
    contexts
        .ctx_mut()
        .map(|ctx| ctx.is_pointer_over_area())
        .unwrap_or(false)
}

/// World-space center of a marker's pin head
pub fn pin_head_center(marker: Vec2, world_per_pixel: f32) -> Vec2 {
    marker + Vec2::new(0.0, MARKER_STEM_PX * world_per_pixel)
}

/// The marker whose pin head is under `cursor`, nearest first.
pub fn marker_hit(
    markers: impl IntoIterator<Item = (Entity, Vec2)>,
    cursor: Vec2,
    world_per_pixel: f32,
) -> Option<Entity> {
    let reach = (MARKER_RADIUS_PX + 2.0) * world_per_pixel;
    markers
        .into_iter()
        .map(|(entity, pos)| (entity, pin_head_center(pos, world_per_pixel).distance(cursor)))
        .filter(|(_, distance)| *distance <= reach)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(entity, _)| entity)
}

/// True when a world position lies on the single rendered copy of the world
pub fn is_on_world(world: DVec2) -> bool {
    let half = WORLD_SIZE / 2.0;
    world.x.abs() <= half && world.y.abs() <= half
}

/// Turn left button presses into marker selections or map clicks
pub fn handle_map_pointer(
    mouse_button: Res<ButtonInput<MouseButton>>,
    mut gesture: ResMut<PointerGesture>,
    mut contexts: EguiContexts,
    view: MapView,
    markers: Query<(Entity, &Transform), With<LocationMarker>>,
    mut popups: ResMut<MarkerPopups>,
    mut clicks: MessageWriter<MapClicked>,
) {
    let cursor = view.cursor_screen_pos();

    if mouse_button.just_pressed(MouseButton::Left) {
        let origin = if is_cursor_over_ui(&mut contexts) {
            None
        } else {
            cursor
        };
        gesture.begin(origin);
    }

    if mouse_button.pressed(MouseButton::Left)
        && let Some(cursor) = cursor
    {
        gesture.track(cursor);
    }

    if !mouse_button.just_released(MouseButton::Left) || !gesture.finish() {
        return;
    }

    let Some(cursor_pos) = view.cursor_render_pos() else {
        return;
    };

    let scale = view.world_per_pixel();
    let hit = marker_hit(
        markers
            .iter()
            .map(|(entity, transform)| (entity, transform.translation.truncate())),
        cursor_pos,
        scale,
    );
    if let Some(entity) = hit {
        popups.open = Some(entity);
        return;
    }

    popups.open = None;

    let world = view.to_world(cursor_pos);
    if !is_on_world(world) {
        debug!("Ignoring click outside the map at {:?}", world);
        return;
    }

    let coords = unproject(world).wrapped();
    debug!("Map clicked at {}", coords);
    clicks.write(MapClicked { coords });
}

/// Drop a half-finished gesture when a dialog takes over input
pub fn reset_gesture_on_dialog(
    dialog_state: Res<DialogState>,
    mut gesture: ResMut<PointerGesture>,
) {
    if dialog_state.any_modal_open && gesture.press_origin.is_some() {
        gesture.finish();
    }
}
