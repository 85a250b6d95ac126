//! Bevy systems driving the location pipeline.
//!
//! A map click spawns a [`ReverseLookupTask`]; the lookup is the only place
//! the pipeline waits. Every frame the finished lookups are resolved in the
//! order they complete, so two racing clicks are stored by resolution order.

use bevy::prelude::*;
use bevy::tasks::{AsyncComputeTaskPool, Task};
use futures_lite::future;

use super::pipeline::{place_clicked_location, place_search_result};
use super::LocationStore;
use crate::geo::LatLng;
use crate::geocoding::{GeocodeError, GeocoderClient, ReverseGeocode, SearchResultSelected};
use crate::map::{MapClicked, MapDraw};

/// Background reverse lookup for a clicked point
#[derive(Component)]
pub struct ReverseLookupTask {
    pub coords: LatLng,
    pub task: Task<Result<ReverseGeocode, GeocodeError>>,
}

/// Shows and saves search results as they are selected
pub fn place_selected_search_results(
    mut selections: MessageReader<SearchResultSelected>,
    mut surface: MapDraw,
    mut store: ResMut<LocationStore>,
) {
    for SearchResultSelected(result) in selections.read() {
        let record = place_search_result(&mut surface, &mut store, result);
        info!(
            "Saved search result '{}' at {}",
            record.name(),
            record.coords()
        );
    }
}

/// Starts a reverse lookup for every map click
pub fn start_reverse_lookups(
    mut commands: Commands,
    mut clicks: MessageReader<MapClicked>,
    client: Res<GeocoderClient>,
) {
    let task_pool = AsyncComputeTaskPool::get();

    for click in clicks.read() {
        let coords = click.coords;
        let geocoder = client.0.clone();
        debug!("Reverse geocoding {}", coords);

        let task = task_pool.spawn(async move { geocoder.reverse(coords) });
        commands.spawn(ReverseLookupTask { coords, task });
    }
}

/// Resolves finished reverse lookups into markers and records
pub fn poll_reverse_lookups(
    mut tasks: Query<(Entity, &mut ReverseLookupTask)>,
    mut surface: MapDraw,
    mut store: ResMut<LocationStore>,
) {
    for (entity, mut lookup) in tasks.iter_mut() {
        if let Some(outcome) = future::block_on(future::poll_once(&mut lookup.task)) {
            let record = place_clicked_location(&mut surface, &mut store, lookup.coords, outcome);
            info!("Saved clicked location '{}' at {}", record.name(), record.coords());

            surface.commands.entity(entity).despawn();
        }
    }
}
