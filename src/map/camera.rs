//! Map camera: whole-level zoom, panning and bounds fitting.
//!
//! The camera looks at world units (Web Mercator at zoom 0) measured from the
//! [`MapOrigin`]. At zoom level `z` one world unit covers `2^z` screen pixels,
//! so the orthographic scale is `2^-z`.

use bevy::ecs::system::SystemParam;
use bevy::input::mouse::{MouseMotion, MouseScrollUnit, MouseWheel};
use bevy::math::DVec2;
use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use bevy_egui::EguiContexts;

use super::input::{is_cursor_over_ui, PointerGesture};
use super::origin::MapOrigin;
use super::surface::FitBoundsRequest;
use crate::config::AppConfig;
use crate::geo::{self, project, zoom_scale, WORLD_SIZE};

/// Pixel wheel deltas that add up to one zoom level
const PIXELS_PER_ZOOM_LEVEL: f32 = 100.0;

#[derive(Component)]
pub struct MapCamera;

/// Current zoom level of the map camera. Always a whole number.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct MapZoom {
    pub level: f32,
}

impl MapZoom {
    /// World units per screen pixel
    pub fn scale(&self) -> f32 {
        (1.0 / zoom_scale(self.level as f64)) as f32
    }
}

/// Bundled window and camera queries for cursor and viewport math
#[derive(SystemParam)]
pub struct MapView<'w, 's> {
    pub window: Query<'w, 's, &'static Window, With<PrimaryWindow>>,
    pub camera: Query<
        'w,
        's,
        (&'static Camera, &'static GlobalTransform, &'static MapZoom),
        With<MapCamera>,
    >,
    pub origin: Res<'w, MapOrigin>,
}

impl MapView<'_, '_> {
    pub fn cursor_screen_pos(&self) -> Option<Vec2> {
        self.window.single().ok()?.cursor_position()
    }

    /// Render-space position of the cursor, if available
    pub fn cursor_render_pos(&self) -> Option<Vec2> {
        let cursor_pos = self.cursor_screen_pos()?;
        let (camera, transform, _) = self.camera.single().ok()?;
        camera.viewport_to_world_2d(transform, cursor_pos).ok()
    }

    /// Screen position of a render-space point, if it projects into the viewport
    pub fn render_to_screen(&self, render: Vec2) -> Option<Vec2> {
        let (camera, transform, _) = self.camera.single().ok()?;
        camera.world_to_viewport(transform, render.extend(0.0)).ok()
    }

    pub fn to_world(&self, render: Vec2) -> DVec2 {
        self.origin.to_world(render)
    }

    pub fn world_per_pixel(&self) -> f32 {
        self.camera
            .single()
            .map(|(_, _, zoom)| zoom.scale())
            .unwrap_or(1.0)
    }

    /// Visible world rectangle as (min, max)
    pub fn visible_world_rect(&self) -> Option<(Vec2, Vec2)> {
        let window = self.window.single().ok()?;
        let (_, transform, zoom) = self.camera.single().ok()?;
        let half = (window.size() * zoom.scale() / 2.0).as_dvec2();
        let center = self.to_world(transform.translation().truncate());
        Some(((center - half).as_vec2(), (center + half).as_vec2()))
    }
}

pub fn spawn_camera(
    mut commands: Commands,
    mut origin: ResMut<MapOrigin>,
    config: Res<AppConfig>,
) {
    let settings = &config.data.map;
    origin.world = project(settings.initial_center);
    let level = settings.clamp_zoom(settings.initial_zoom as f32);
    info!(
        "Map starting at {} zoom {}",
        settings.initial_center, level
    );

    commands.spawn((
        Camera2d,
        MapCamera,
        MapZoom { level },
        Transform::from_xyz(0.0, 0.0, 1000.0),
    ));
}

/// Pan with the middle button, or with the left button once a drag starts
pub fn camera_pan(
    mouse_button: Res<ButtonInput<MouseButton>>,
    gesture: Res<PointerGesture>,
    mut mouse_motion: MessageReader<MouseMotion>,
    mut camera_query: Query<(&mut Transform, &MapZoom), With<MapCamera>>,
) {
    let dragging = mouse_button.pressed(MouseButton::Middle)
        || (mouse_button.pressed(MouseButton::Left) && gesture.is_panning());
    if !dragging {
        mouse_motion.clear();
        return;
    }

    let Ok((mut transform, zoom)) = camera_query.single_mut() else {
        return;
    };

    for event in mouse_motion.read() {
        let delta = event.delta * zoom.scale();
        transform.translation.x -= delta.x;
        transform.translation.y += delta.y;
    }
}

/// Wheel zoom in whole levels, keeping the point under the cursor fixed
pub fn camera_zoom(
    mut scroll_events: MessageReader<MouseWheel>,
    mut pending: Local<f32>,
    mut contexts: EguiContexts,
    window: Query<&Window, With<PrimaryWindow>>,
    camera: Query<(&Camera, &GlobalTransform), With<MapCamera>>,
    config: Res<AppConfig>,
    mut camera_query: Query<(&mut Transform, &mut MapZoom), With<MapCamera>>,
) {
    if is_cursor_over_ui(&mut contexts) {
        scroll_events.clear();
        return;
    }

    for event in scroll_events.read() {
        *pending += match event.unit {
            MouseScrollUnit::Line => event.y,
            MouseScrollUnit::Pixel => event.y / PIXELS_PER_ZOOM_LEVEL,
        };
    }

    let steps = pending.trunc();
    if steps == 0.0 {
        return;
    }
    *pending -= steps;

    let anchor = window
        .single()
        .ok()
        .and_then(|w| w.cursor_position())
        .zip(camera.single().ok())
        .and_then(|(cursor, (camera, transform))| {
            camera.viewport_to_world_2d(transform, cursor).ok()
        });
    let Ok((mut transform, mut zoom)) = camera_query.single_mut() else {
        return;
    };

    let level = config.data.map.clamp_zoom(zoom.level + steps);
    if level == zoom.level {
        return;
    }

    let old_scale = zoom.scale();
    zoom.level = level;

    if let Some(anchor) = anchor {
        let center = transform.translation.truncate();
        let zoomed = zoom_about(center, anchor, zoom.scale() / old_scale);
        transform.translation.x = zoomed.x;
        transform.translation.y = zoomed.y;
    }
}

/// New view center after scaling around `anchor` by `ratio`.
pub fn zoom_about(center: Vec2, anchor: Vec2, ratio: f32) -> Vec2 {
    anchor + (center - anchor) * ratio
}

pub fn apply_camera_zoom(
    mut camera_query: Query<(&MapZoom, &mut Projection), (With<MapCamera>, Changed<MapZoom>)>,
) {
    for (zoom, mut projection) in camera_query.iter_mut() {
        if let Projection::Orthographic(ref mut ortho) = *projection {
            ortho.scale = zoom.scale();
        }
    }
}

/// Frame the last requested bounding box
pub fn apply_fit_bounds(
    mut requests: MessageReader<FitBoundsRequest>,
    window: Query<&Window, With<PrimaryWindow>>,
    origin: Res<MapOrigin>,
    config: Res<AppConfig>,
    mut camera_query: Query<(&mut Transform, &mut MapZoom), With<MapCamera>>,
) {
    let Some(request) = requests.read().last().copied() else {
        return;
    };
    let Ok(window) = window.single() else {
        return;
    };
    let Ok((mut transform, mut zoom)) = camera_query.single_mut() else {
        return;
    };

    let settings = &config.data.map;
    let fit = geo::fit_bounds(
        &request.bounds,
        window.size().as_dvec2(),
        request.padding_px as f64,
        settings.min_zoom.min(settings.max_zoom) as f64,
        settings.max_zoom.max(settings.min_zoom) as f64,
    );
    debug!(
        "Fitting view to {:?} at zoom {}",
        request.bounds, fit.zoom
    );

    let center = origin.to_render(fit.center);
    transform.translation.x = center.x;
    transform.translation.y = center.y;
    zoom.level = fit.zoom as f32;
}

/// Keep the view center on the world square
pub fn clamp_camera_to_world(
    origin: Res<MapOrigin>,
    mut camera_query: Query<&mut Transform, (With<MapCamera>, Changed<Transform>)>,
) {
    for mut transform in camera_query.iter_mut() {
        let center = origin.to_world(transform.translation.truncate());
        let clamped = clamp_to_world(center);
        if clamped != center {
            let render = origin.to_render(clamped);
            transform.translation.x = render.x;
            transform.translation.y = render.y;
        }
    }
}

/// Nearest point on the world square
pub fn clamp_to_world(world: DVec2) -> DVec2 {
    let half = WORLD_SIZE / 2.0;
    world.clamp(DVec2::splat(-half), DVec2::splat(half))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zoom_scale_halves_per_level() {
        assert_eq!(MapZoom { level: 0.0 }.scale(), 1.0);
        assert_eq!(MapZoom { level: 1.0 }.scale(), 0.5);
        assert_eq!(MapZoom { level: 3.0 }.scale(), 0.125);
    }

    #[test]
    fn test_zoom_about_keeps_anchor_fixed() {
        let center = Vec2::new(10.0, 10.0);
        let anchor = Vec2::new(20.0, 0.0);

        // Zooming in one level halves the distance to the anchor
        let zoomed = zoom_about(center, anchor, 0.5);
        assert_eq!(zoomed, Vec2::new(15.0, 5.0));

        // Zooming about the center leaves it alone
        assert_eq!(zoom_about(center, center, 0.25), center);
    }

    #[test]
    fn test_clamp_to_world() {
        let inside = DVec2::new(100.0, -20.0);
        assert_eq!(clamp_to_world(inside), inside);
        assert_eq!(
            clamp_to_world(DVec2::new(-300.0, 500.0)),
            DVec2::new(-128.0, 128.0)
        );
    }
}
