//! Raster base map: slippy tiles fetched in the background and shown as sprites.
//!
//! Tiles of the current zoom level that cover the view (plus a one tile
//! margin) are kept. After a zoom change the previous level's sprites stay on
//! screen until every tile of the new level has settled. A tile that fails to
//! load is not requested again for the rest of the session.

use bevy::math::DVec2;
use bevy::prelude::*;
use bevy::render::render_resource::{Extent3d, TextureDimension, TextureFormat};
use bevy::tasks::{IoTaskPool, Task};
use futures_lite::future;
use std::collections::HashMap;
use std::io::Read;
use std::time::Duration;
use thiserror::Error;

use super::camera::{MapCamera, MapView, MapZoom};
use super::origin::{anchored_transform, MapAnchor, MapOrigin};
use crate::config::AppConfig;
use crate::constants::MAX_TILE_REQUESTS_IN_FLIGHT;
use crate::geo::WORLD_SIZE;

/// Tile z, below circles and markers
const TILE_Z: f32 = 0.0;

/// Depth step between zoom levels, so sprites of a finer level draw on top
const TILE_Z_PER_LEVEL: f32 = 0.01;

/// Upper bound on a single tile download
const MAX_TILE_BYTES: u64 = 4 * 1024 * 1024;

const TILE_TIMEOUT: Duration = Duration::from_secs(15);

/// Slippy map tile address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileId {
    pub z: u8,
    pub x: u32,
    pub y: u32,
}

impl TileId {
    /// Number of tiles along each axis at zoom `z`
    pub fn tiles_per_axis(z: u8) -> u32 {
        1 << z.min(31)
    }

    /// Fill a URL template's `{z}`, `{x}` and `{y}` placeholders
    pub fn url(&self, template: &str) -> String {
        template
            .replace("{z}", &self.z.to_string())
            .replace("{x}", &self.x.to_string())
            .replace("{y}", &self.y.to_string())
    }

    /// Edge length in world units
    pub fn world_size(&self) -> f32 {
        (WORLD_SIZE / Self::tiles_per_axis(self.z) as f64) as f32
    }

    /// Center in world units. Row 0 is the northernmost row.
    pub fn world_center(&self) -> DVec2 {
        let size = WORLD_SIZE / Self::tiles_per_axis(self.z) as f64;
        let half_world = WORLD_SIZE / 2.0;
        DVec2::new(
            -half_world + (self.x as f64 + 0.5) * size,
            half_world - (self.y as f64 + 0.5) * size,
        )
    }

    /// True when the tile touches the world rectangle
    pub fn overlaps(&self, min: Vec2, max: Vec2) -> bool {
        let center = self.world_center().as_vec2();
        let half = Vec2::splat(self.world_size() / 2.0);
        let (lo, hi) = (center - half, center + half);
        lo.x < max.x && hi.x > min.x && lo.y < max.y && hi.y > min.y
    }

    fn depth(&self) -> f32 {
        TILE_Z + self.z as f32 * TILE_Z_PER_LEVEL
    }
}

/// Tiles at zoom `z` overlapping the world rectangle, expanded by `margin` tiles.
pub fn visible_tiles(z: u8, min: Vec2, max: Vec2, margin: i64) -> Vec<TileId> {
    let count = TileId::tiles_per_axis(z) as i64;
    let size = WORLD_SIZE / count as f64;
    let half_world = WORLD_SIZE / 2.0;

    let column = |x: f32| ((x as f64 + half_world) / size).floor() as i64;
    let row = |y: f32| ((half_world - y as f64) / size).floor() as i64;

    let x0 = (column(min.x) - margin).max(0);
    let x1 = (column(max.x) + margin).min(count - 1);
    let y0 = (row(max.y) - margin).max(0);
    let y1 = (row(min.y) + margin).min(count - 1);

    if x0 > x1 || y0 > y1 {
        return Vec::new();
    }

    let mut tiles = Vec::with_capacity(((x1 - x0 + 1) * (y1 - y0 + 1)) as usize);
    for y in y0..=y1 {
        for x in x0..=x1 {
            tiles.push(TileId {
                z,
                x: x as u32,
                y: y as u32,
            });
        }
    }
    tiles
}

/// Errors raised while fetching a tile
#[derive(Debug, Error)]
pub enum TileFetchError {
    #[error("tile request failed: {0}")]
    Network(String),
    #[error("tile server returned HTTP {0}")]
    Status(u16),
    #[error("could not decode tile: {0}")]
    Decode(#[from] image::ImageError),
}

impl From<ureq::Error> for TileFetchError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(code, _) => TileFetchError::Status(code),
            ureq::Error::Transport(transport) => TileFetchError::Network(transport.to_string()),
        }
    }
}

impl From<std::io::Error> for TileFetchError {
    fn from(err: std::io::Error) -> Self {
        TileFetchError::Network(err.to_string())
    }
}

/// HTTP agent and URL template for tile downloads
#[derive(Resource, Clone)]
pub struct TileClient {
    agent: ureq::Agent,
    url_template: String,
}

impl TileClient {
    pub fn new(url_template: impl Into<String>, user_agent: &str) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(TILE_TIMEOUT)
            .user_agent(user_agent)
            .build();
        Self {
            agent,
            url_template: url_template.into(),
        }
    }

    /// Download and decode one tile. Blocks; run on a task pool.
    pub fn fetch(&self, tile: TileId) -> Result<Image, TileFetchError> {
        let response = self.agent.get(&tile.url(&self.url_template)).call()?;

        let mut bytes = Vec::new();
        response
            .into_reader()
            .take(MAX_TILE_BYTES)
            .read_to_end(&mut bytes)?;

        decode_tile(&bytes)
    }
}

/// Decode PNG or JPEG bytes into a texture
pub fn decode_tile(bytes: &[u8]) -> Result<Image, TileFetchError> {
    let rgba = image::load_from_memory(bytes)?.into_rgba8();
    let (width, height) = rgba.dimensions();

    Ok(Image::new(
        Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        TextureDimension::D2,
        rgba.into_raw(),
        TextureFormat::Rgba8UnormSrgb,
        default(),
    ))
}

enum TileState {
    Loading(Task<Result<Image, TileFetchError>>),
    Ready(Entity),
    Failed,
}

/// Every tile we know about at the moment
#[derive(Resource, Default)]
pub struct TileCache {
    tiles: HashMap<TileId, TileState>,
}

impl TileCache {
    fn in_flight(&self) -> usize {
        self.tiles
            .values()
            .filter(|state| matches!(state, TileState::Loading(_)))
            .count()
    }

    /// True when every wanted tile has either loaded or failed
    fn is_settled(&self, wanted: &[TileId]) -> bool {
        wanted.iter().all(|tile| {
            matches!(
                self.tiles.get(tile),
                Some(TileState::Ready(_) | TileState::Failed)
            )
        })
    }

    /// Forget tiles that are no longer needed and return the sprites to despawn.
    ///
    /// Sprites of another zoom level that still overlap the view survive until
    /// the wanted level has settled. Dropping a Loading entry drops its task,
    /// which cancels the download. Failed entries stay so the tile is never
    /// requested again.
    fn prune(&mut self, wanted: &[TileId], z: u8, view: (Vec2, Vec2)) -> Vec<Entity> {
        let settled = self.is_settled(wanted);
        let mut despawn = Vec::new();

        self.tiles.retain(|tile, state| {
            let keep = match state {
                TileState::Failed => true,
                _ if wanted.contains(tile) => true,
                TileState::Ready(_) => !settled && tile.z != z && tile.overlaps(view.0, view.1),
                TileState::Loading(_) => false,
            };
            if !keep && let TileState::Ready(entity) = state {
                despawn.push(*entity);
            }
            keep
        });

        despawn
    }
}

/// Marker for tile sprites
#[derive(Component)]
pub struct MapTile;

pub fn init_tile_client(mut commands: Commands, config: Res<AppConfig>) {
    commands.insert_resource(TileClient::new(
        config.data.map.tile_url.clone(),
        &config.data.geocoder.user_agent,
    ));
}

/// Start downloads for visible tiles and forget tiles that left the view
pub fn request_visible_tiles(
    mut commands: Commands,
    view: MapView,
    zoom: Query<&MapZoom, With<MapCamera>>,
    client: Res<TileClient>,
    mut cache: ResMut<TileCache>,
) {
    let Ok(zoom) = zoom.single() else {
        return;
    };
    let Some((min, max)) = view.visible_world_rect() else {
        return;
    };

    let z = zoom.level.max(0.0) as u8;
    let wanted = visible_tiles(z, min, max, 1);

    for entity in cache.prune(&wanted, z, (min, max)) {
        commands.entity(entity).despawn();
    }

    let task_pool = IoTaskPool::get();
    let mut in_flight = cache.in_flight();
    for tile in wanted {
        if in_flight >= MAX_TILE_REQUESTS_IN_FLIGHT {
            break;
        }
        if cache.tiles.contains_key(&tile) {
            continue;
        }

        let client = client.clone();
        let task = task_pool.spawn(async move { client.fetch(tile) });
        cache.tiles.insert(tile, TileState::Loading(task));
        in_flight += 1;
    }
}

/// Turn finished downloads into sprites
pub fn poll_tile_tasks(
    mut commands: Commands,
    mut images: ResMut<Assets<Image>>,
    origin: Res<MapOrigin>,
    mut cache: ResMut<TileCache>,
) {
    for (tile, state) in cache.tiles.iter_mut() {
        let TileState::Loading(task) = state else {
            continue;
        };
        let Some(result) = future::block_on(future::poll_once(task)) else {
            continue;
        };

        *state = match result {
            Ok(image) => {
                let size = tile.world_size();
                let center = tile.world_center();
                let entity = commands
                    .spawn((
                        MapTile,
                        Sprite {
                            image: images.add(image),
                            custom_size: Some(Vec2::splat(size)),
                            ..default()
                        },
                        MapAnchor(center),
                        anchored_transform(&origin, center, tile.depth()),
                    ))
                    .id();
                TileState::Ready(entity)
            }
            Err(e) => {
                warn!("Tile {}/{}/{} failed: {}", tile.z, tile.x, tile.y, e);
                TileState::Failed
            }
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_url_fills_placeholders() {
        let tile = TileId { z: 3, x: 4, y: 2 };
        assert_eq!(
            tile.url("https://tiles.example/{z}/{y}/{x}.png"),
            "https://tiles.example/3/2/4.png"
        );
    }

    #[test]
    fn test_zoom_zero_tile_covers_world() {
        let tile = TileId { z: 0, x: 0, y: 0 };
        assert_eq!(tile.world_size(), 256.0);
        assert_eq!(tile.world_center(), DVec2::ZERO);
    }

    #[test]
    fn test_first_tile_is_north_west() {
        let tile = TileId { z: 1, x: 0, y: 0 };
        assert_eq!(tile.world_size(), 128.0);
        assert_eq!(tile.world_center(), DVec2::new(-64.0, 64.0));
    }

    #[test]
    fn test_visible_tiles_whole_world() {
        let tiles = visible_tiles(1, Vec2::splat(-500.0), Vec2::splat(500.0), 0);
        assert_eq!(tiles.len(), 4);
    }

    #[test]
    fn test_visible_tiles_single_quadrant() {
        // Small view inside the north east quadrant at zoom 1
        let tiles = visible_tiles(1, Vec2::new(10.0, 10.0), Vec2::new(20.0, 20.0), 0);
        assert_eq!(tiles, vec![TileId { z: 1, x: 1, y: 0 }]);
    }

    #[test]
    fn test_visible_tiles_margin_is_clamped() {
        let tiles = visible_tiles(2, Vec2::new(-127.0, 100.0), Vec2::new(-120.0, 120.0), 1);
        // Column 0 and row 0 plus one tile of margin right and down
        assert_eq!(tiles.len(), 4);
        assert!(tiles.iter().all(|t| t.x <= 1 && t.y <= 1));
    }

    #[test]
    fn test_visible_tiles_off_world() {
        let tiles = visible_tiles(2, Vec2::new(0.0, 300.0), Vec2::new(10.0, 400.0), 0);
        assert!(tiles.is_empty());
    }

    #[test]
    fn test_decode_tile_rejects_garbage() {
        assert!(matches!(
            decode_tile(b"not an image"),
            Err(TileFetchError::Decode(_))
        ));
    }

    #[test]
    fn test_decode_tile_png() {
        let mut bytes = Vec::new();
        let img = image::RgbaImage::from_pixel(2, 2, image::Rgba([10, 20, 30, 255]));
        img.write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();

        let tile = decode_tile(&bytes).unwrap();
        assert_eq!(tile.width(), 2);
        assert_eq!(tile.height(), 2);
    }

    fn ready(world: &mut World) -> TileState {
        TileState::Ready(world.spawn_empty().id())
    }

    fn whole_view() -> (Vec2, Vec2) {
        (Vec2::splat(-128.0), Vec2::splat(128.0))
    }

    #[test]
    fn test_tile_overlaps() {
        let tile = TileId { z: 1, x: 1, y: 0 };
        assert!(tile.overlaps(Vec2::new(10.0, 10.0), Vec2::new(20.0, 20.0)));
        assert!(!tile.overlaps(Vec2::new(-20.0, 10.0), Vec2::new(-10.0, 20.0)));
    }

    #[test]
    fn test_finer_levels_draw_on_top() {
        let coarse = TileId { z: 2, x: 0, y: 0 };
        let fine = TileId { z: 3, x: 0, y: 0 };
        assert!(fine.depth() > coarse.depth());
    }

    #[test]
    fn test_old_zoom_sprites_stay_until_new_level_loads() {
        let mut world = World::new();
        let mut cache = TileCache::default();
        let old = TileId { z: 2, x: 1, y: 1 };
        cache.tiles.insert(old, ready(&mut world));

        // Zoomed in to level 3: nothing of the new level has arrived yet
        let wanted = vec![TileId { z: 3, x: 3, y: 3 }];
        let despawned = cache.prune(&wanted, 3, whole_view());
        assert!(despawned.is_empty());
        assert!(cache.tiles.contains_key(&old));

        // Once the new tile is ready the old sprite goes
        cache.tiles.insert(wanted[0], ready(&mut world));
        let despawned = cache.prune(&wanted, 3, whole_view());
        assert_eq!(despawned.len(), 1);
        assert!(!cache.tiles.contains_key(&old));
        assert!(cache.tiles.contains_key(&wanted[0]));
    }

    #[test]
    fn test_failed_tiles_count_as_settled() {
        let mut world = World::new();
        let mut cache = TileCache::default();
        let old = TileId { z: 2, x: 1, y: 1 };
        cache.tiles.insert(old, ready(&mut world));
        let wanted = vec![TileId { z: 3, x: 3, y: 3 }];
        cache.tiles.insert(wanted[0], TileState::Failed);

        assert_eq!(cache.prune(&wanted, 3, whole_view()).len(), 1);
        assert!(cache.tiles.contains_key(&wanted[0]));
    }

    #[test]
    fn test_same_level_tiles_leaving_view_go_at_once() {
        let mut world = World::new();
        let mut cache = TileCache::default();
        let gone = TileId { z: 3, x: 0, y: 0 };
        cache.tiles.insert(gone, ready(&mut world));

        // A wanted tile is still missing, but `gone` is the current level
        let wanted = vec![TileId { z: 3, x: 5, y: 5 }];
        assert_eq!(cache.prune(&wanted, 3, whole_view()).len(), 1);
        assert!(cache.tiles.is_empty());
    }

    #[test]
    fn test_old_zoom_sprites_outside_view_go_at_once() {
        let mut world = World::new();
        let mut cache = TileCache::default();
        // North west quadrant while the view sits in the south east
        let old = TileId { z: 1, x: 0, y: 0 };
        cache.tiles.insert(old, ready(&mut world));

        let view = (Vec2::new(10.0, -20.0), Vec2::new(20.0, -10.0));
        let wanted = visible_tiles(4, view.0, view.1, 0);
        assert_eq!(cache.prune(&wanted, 4, view).len(), 1);
    }
}
