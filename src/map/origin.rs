//! Floating render origin.
//!
//! Map entities keep their Web Mercator position as f64 in [`MapAnchor`].
//! Their `Transform` holds that position minus [`MapOrigin`], so render
//! coordinates stay small around the view and f32 keeps sub-pixel precision
//! at the deepest zoom levels.

use bevy::math::DVec2;
use bevy::prelude::*;

use super::camera::{MapCamera, MapZoom};
use crate::geo::zoom_scale;

/// Screen pixels the camera may drift from the origin before it moves
const REBASE_DISTANCE_PX: f64 = 65_536.0;

/// World position that render coordinates are measured from
#[derive(Resource, Debug, Default, Clone, Copy, PartialEq)]
pub struct MapOrigin {
    pub world: DVec2,
}

impl MapOrigin {
    pub fn to_render(&self, world: DVec2) -> Vec2 {
        (world - self.world).as_vec2()
    }

    pub fn to_world(&self, render: Vec2) -> DVec2 {
        self.world + render.as_dvec2()
    }
}

/// Exact world position of a map entity
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct MapAnchor(pub DVec2);

/// Transform for an anchored entity at depth `z`
pub fn anchored_transform(origin: &MapOrigin, world: DVec2, z: f32) -> Transform {
    Transform::from_translation(origin.to_render(world).extend(z))
}

/// True once a camera `offset` render units from the origin is too far out
pub fn needs_rebase(offset: Vec2, zoom: &MapZoom) -> bool {
    offset.as_dvec2().length() * zoom_scale(zoom.level as f64) > REBASE_DISTANCE_PX
}

/// Move the origin under the camera when it has drifted away
pub fn rebase_origin(
    mut origin: ResMut<MapOrigin>,
    mut camera_query: Query<(&mut Transform, &MapZoom), With<MapCamera>>,
) {
    let Ok((mut transform, zoom)) = camera_query.single_mut() else {
        return;
    };

    let offset = transform.translation.truncate();
    if !needs_rebase(offset, zoom) {
        return;
    }

    origin.world = origin.to_world(offset);
    transform.translation.x = 0.0;
    transform.translation.y = 0.0;
    trace!("Render origin moved to {:?}", origin.world);
}

/// Re-derive transforms of anchored entities that moved or whose origin moved
pub fn sync_anchored_transforms(
    origin: Res<MapOrigin>,
    mut anchored: Query<(Ref<MapAnchor>, &mut Transform)>,
) {
    let origin_moved = origin.is_changed();
    for (anchor, mut transform) in anchored.iter_mut() {
        if !origin_moved && !anchor.is_changed() {
            continue;
        }
        let render = origin.to_render(anchor.0);
        transform.translation.x = render.x;
        transform.translation.y = render.y;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::{project, LatLng};

    #[test]
    fn test_render_offsets_keep_sub_pixel_precision_far_east() {
        // One screen pixel at zoom 18, next to the antimeridian
        let pixel = 1.0 / zoom_scale(18.0);
        let base = project(LatLng::new(10.0, 179.9));
        let origin = MapOrigin { world: base };

        let render = origin.to_render(base + DVec2::new(pixel, 0.0));
        let error_px = (render.x as f64 - pixel) * zoom_scale(18.0);
        assert!(error_px.abs() < 0.01, "error {error_px} px");

        // Without an origin the same point lands a whole f32 step away
        let absolute = (base.x + pixel) as f32 - base.x as f32;
        let naive_error_px = (absolute as f64 - pixel) * zoom_scale(18.0);
        assert!(naive_error_px.abs() > 0.5);
    }

    #[test]
    fn test_origin_round_trip() {
        let origin = MapOrigin {
            world: DVec2::new(100.0, -40.0),
        };
        let world = DVec2::new(100.5, -40.25);
        assert_eq!(origin.to_world(origin.to_render(world)), world);
    }

    #[test]
    fn test_needs_rebase_depends_on_zoom() {
        let offset = Vec2::new(1.0, 0.0);
        // One world unit is 256 px at zoom 8 but 262144 px at zoom 18
        assert!(!needs_rebase(offset, &MapZoom { level: 8.0 }));
        assert!(needs_rebase(offset, &MapZoom { level: 18.0 }));
    }

    #[test]
    fn test_rebase_moves_origin_and_anchored_entities() {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .insert_resource(MapOrigin {
                world: DVec2::new(10.0, 10.0),
            })
            .add_systems(Update, (rebase_origin, sync_anchored_transforms).chain());

        let camera = app
            .world_mut()
            .spawn((
                MapCamera,
                MapZoom { level: 18.0 },
                Transform::from_xyz(2.0, 0.0, 1000.0),
            ))
            .id();
        let marker = app
            .world_mut()
            .spawn((
                MapAnchor(DVec2::new(12.5, 10.0)),
                Transform::from_xyz(2.5, 0.0, 2.0),
            ))
            .id();

        app.update();

        assert_eq!(
            app.world().resource::<MapOrigin>().world,
            DVec2::new(12.0, 10.0)
        );
        let camera_pos = app.world().get::<Transform>(camera).unwrap().translation;
        assert_eq!(camera_pos, Vec3::new(0.0, 0.0, 1000.0));
        let marker_pos = app.world().get::<Transform>(marker).unwrap().translation;
        assert_eq!(marker_pos, Vec3::new(0.5, 0.0, 2.0));
    }

    #[test]
    fn test_small_offsets_leave_origin_alone() {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .init_resource::<MapOrigin>()
            .add_systems(Update, rebase_origin);
        app.world_mut().spawn((
            MapCamera,
            MapZoom { level: 2.0 },
            Transform::from_xyz(50.0, -20.0, 1000.0),
        ));

        app.update();

        assert_eq!(app.world().resource::<MapOrigin>().world, DVec2::ZERO);
    }
}
