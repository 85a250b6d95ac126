//! Rendering of highlight circles and marker pins.
//!
//! Circles are sized in meters and scale with the map. Pins keep a constant
//! screen size, so they are redrawn with gizmos every frame.

use bevy::prelude::*;

use super::camera::MapView;
use super::input::pin_head_center;
use super::surface::{HighlightCircle, LocationMarker};
use crate::constants::MARKER_RADIUS_PX;
use crate::geo::world_units_per_meter;
use crate::theme;

/// Radius of a highlight circle in world units at its latitude
pub fn circle_world_radius(circle: &HighlightCircle) -> f32 {
    (circle.radius_meters * world_units_per_meter(circle.center.lat)) as f32
}

/// Give newly drawn circles their filled mesh
pub fn attach_circle_meshes(
    mut commands: Commands,
    circles: Query<(Entity, &HighlightCircle), Added<HighlightCircle>>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<ColorMaterial>>,
) {
    for (entity, circle) in circles.iter() {
        let radius = circle_world_radius(circle);
        commands.entity(entity).insert((
            Mesh2d(meshes.add(Circle::new(radius))),
            MeshMaterial2d(materials.add(ColorMaterial::from(circle.style.fill))),
        ));
    }
}

pub fn draw_circle_borders(
    mut gizmos: Gizmos,
    circles: Query<(&Transform, &HighlightCircle)>,
) {
    for (transform, circle) in circles.iter() {
        gizmos.circle_2d(
            Isometry2d::from_translation(transform.translation.truncate()),
            circle_world_radius(circle),
            circle.style.border,
        );
    }
}

/// Pin with its tip on the marker position
pub fn draw_marker_pins(
    mut gizmos: Gizmos,
    view: MapView,
    markers: Query<&Transform, With<LocationMarker>>,
) {
    let scale = view.world_per_pixel();
    let radius = MARKER_RADIUS_PX * scale;

    for transform in markers.iter() {
        let tip = transform.translation.truncate();
        let head = pin_head_center(tip, scale);

        gizmos.line_2d(tip, head - Vec2::new(0.0, radius), theme::MARKER_PIN);
        gizmos.circle_2d(Isometry2d::from_translation(head), radius, theme::MARKER_PIN);
        gizmos.circle_2d(
            Isometry2d::from_translation(head),
            radius * 0.4,
            theme::MARKER_DOT,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::{LatLng, WORLD_SIZE, EARTH_CIRCUMFERENCE_M};
    use crate::map::CircleStyle;

    #[test]
    fn test_circle_radius_at_equator() {
        let circle = HighlightCircle {
            center: LatLng::new(0.0, 0.0),
            radius_meters: 500.0,
            style: CircleStyle::search_highlight(),
        };
        let expected = (500.0 * WORLD_SIZE / EARTH_CIRCUMFERENCE_M) as f32;
        assert!((circle_world_radius(&circle) - expected).abs() < 1e-6);
    }

    #[test]
    fn test_circle_grows_toward_poles() {
        let at = |lat| HighlightCircle {
            center: LatLng::new(lat, 0.0),
            radius_meters: 500.0,
            style: CircleStyle::search_highlight(),
        };
        // Mercator stretches by 1/cos(lat): twice as large at 60 degrees
        let ratio = circle_world_radius(&at(60.0)) / circle_world_radius(&at(0.0));
        assert!((ratio - 2.0).abs() < 1e-3);
    }
}
