//! Saved locations and the pipeline that produces them.
//!
//! Search selections and resolved map clicks both end in the same place: a
//! marker on the map and a [`LocationRecord`] appended to the
//! [`LocationStore`]. The store can be exported as JSON at any time.
//!
//! ## Module Structure
//!
//! - [`record`] - The saved location type and its JSON shape
//! - [`store`] - Append-only session store
//! - [`pipeline`] - Search and click branches, independent of Bevy scheduling
//! - [`systems`] - Bevy systems feeding the pipeline and polling lookups
//! - [`export`] - Save dialog and JSON file write

pub mod export;
pub mod pipeline;
mod record;
mod store;
pub mod systems;


pub use export::{ExportLocationsRequest, ExportState};
pub use record::{LocationOrigin, LocationRecord};
pub use store::LocationStore;
pub use systems::ReverseLookupTask;

use bevy::prelude::*;

pub struct LocationsPlugin;

impl Plugin for LocationsPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<LocationStore>()
            .init_resource::<ExportState>()
            .add_message::<ExportLocationsRequest>()
            .add_systems(
                Update,
                (
                    systems::place_selected_search_results,
                    systems::start_reverse_lookups,
                    systems::poll_reverse_lookups,
                )
                    .chain()
                    .after(crate::geocoding::search::poll_search_task),
            )
            .add_systems(
                Update,
                (
                    export::handle_export_requests
                        .run_if(on_message::<ExportLocationsRequest>),
                    export::poll_export_dialog,
                    export::poll_export_write,
                )
                    .chain(),
            );
    }
}
