//! Exporting saved locations to a JSON file.
//!
//! The store is serialized when the export is requested, so locations saved
//! while the save dialog is open are not part of that export.

use bevy::prelude::*;
use bevy::tasks::{AsyncComputeTaskPool, IoTaskPool, Task};
use futures_lite::future;
use std::path::{Path, PathBuf};

use super::{LocationRecord, LocationStore};
use crate::config::{AppConfig, UpdateLastExportDirRequest};
use crate::constants::{EXPORT_FILE_NAME, NOTHING_TO_EXPORT};

/// Message to export every saved location
#[derive(Message)]
pub struct ExportLocationsRequest;

/// What an export request turned into
#[derive(Debug, PartialEq)]
pub enum ExportOutcome {
    /// The store is empty; tell the user and write nothing
    NothingToExport,
    /// Serialized document ready to be written
    Ready(String),
}

/// Result of writing an export file
pub struct ExportResult {
    pub path: PathBuf,
    pub success: bool,
    pub error: Option<String>,
}

/// Export dialog and file write progress
#[derive(Resource, Default)]
pub struct ExportState {
    /// Blocking notice (e.g. nothing to export)
    pub notice: Option<String>,
    /// Last export failure, shown until dismissed
    pub error: Option<String>,
    /// Where the last successful export went
    pub last_exported: Option<PathBuf>,
    pending_dialog: Option<Task<Option<PathBuf>>>,
    payload: Option<String>,
    pending_write: Option<Task<ExportResult>>,
}

impl ExportState {
    pub fn is_busy(&self) -> bool {
        self.pending_dialog.is_some() || self.pending_write.is_some()
    }
}

/// Pretty JSON array of records with two-space indentation.
pub fn serialize_locations(records: &[LocationRecord]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(records)
}

/// Snapshot the store into an export document.
pub fn prepare_export(store: &LocationStore) -> Result<ExportOutcome, serde_json::Error> {
    if store.is_empty() {
        return Ok(ExportOutcome::NothingToExport);
    }
    serialize_locations(store.snapshot()).map(ExportOutcome::Ready)
}

/// Write an export document to disk
pub fn write_export(path: PathBuf, json: String) -> ExportResult {
    match std::fs::write(&path, json) {
        Ok(()) => ExportResult {
            path,
            success: true,
            error: None,
        },
        Err(e) => ExportResult {
            error: Some(format!("Failed to write {}: {}", path.display(), e)),
            path,
            success: false,
        },
    }
}

fn export_start_dir(config: &AppConfig) -> PathBuf {
    config
        .data
        .last_export_dir
        .clone()
        .filter(|dir| dir.is_dir())
        .unwrap_or_else(crate::paths::default_export_dir)
}

/// Starts an export: either a "nothing to export" notice or a save dialog
pub fn handle_export_requests(
    mut requests: MessageReader<ExportLocationsRequest>,
    store: Res<LocationStore>,
    config: Res<AppConfig>,
    mut state: ResMut<ExportState>,
) {
    // Several requests in one frame still mean one export
    if requests.read().count() == 0 {
        return;
    }

    if state.is_busy() {
        warn!("Export already in progress");
        return;
    }

    match prepare_export(&store) {
        Ok(ExportOutcome::NothingToExport) => {
            info!("Export requested with no saved locations");
            state.notice = Some(NOTHING_TO_EXPORT.to_string());
        }
        Ok(ExportOutcome::Ready(json)) => {
            debug!("Exporting {} locations", store.len());
            let start_dir = export_start_dir(&config);
            state.payload = Some(json);

            let task_pool = AsyncComputeTaskPool::get();
            state.pending_dialog = Some(task_pool.spawn(async move {
                rfd::AsyncFileDialog::new()
                    .set_title("Export Locations")
                    .set_directory(&start_dir)
                    .set_file_name(EXPORT_FILE_NAME)
                    .add_filter("JSON", &["json"])
                    .save_file()
                    .await
                    .map(|h| h.path().to_path_buf())
            }));
        }
        Err(e) => {
            error!("Failed to serialize locations: {}", e);
            state.error = Some(format!("Failed to serialize locations: {}", e));
        }
    }
}

/// Polls the save dialog and starts the file write once a path is chosen
pub fn poll_export_dialog(mut state: ResMut<ExportState>) {
    let Some(task) = state.pending_dialog.as_mut() else {
        return;
    };

    let Some(choice) = future::block_on(future::poll_once(task)) else {
        return;
    };

    state.pending_dialog = None;
    let payload = state.payload.take();

    let Some(path) = choice else {
        info!("Export cancelled");
        return;
    };

    let Some(json) = payload else {
        warn!("Export dialog finished without a document to write");
        return;
    };

    let task_pool = IoTaskPool::get();
    state.pending_write = Some(task_pool.spawn(async move { write_export(path, json) }));
}

/// Polls the file write and reports the result
pub fn poll_export_write(
    mut state: ResMut<ExportState>,
    mut config_events: MessageWriter<UpdateLastExportDirRequest>,
) {
    let Some(task) = state.pending_write.as_mut() else {
        return;
    };

    let Some(result) = future::block_on(future::poll_once(task)) else {
        return;
    };

    state.pending_write = None;

    if result.success {
        info!("Locations exported to {:?}", result.path);
        state.error = None;
        if let Some(dir) = result.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            config_events.write(UpdateLastExportDirRequest {
                dir: dir.to_path_buf(),
            });
        }
        state.last_exported = Some(result.path);
    } else if let Some(error) = result.error {
        error!("{}", error);
        state.error = Some(error);
    }
}

/// File name shown in the UI for the last export
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(EXPORT_FILE_NAME)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::LatLng;
    use crate::locations::LocationOrigin;

    fn store_with(records: &[(f64, f64, &str, LocationOrigin)]) -> LocationStore {
        let mut store = LocationStore::default();
        for &(lat, lng, name, origin) in records {
            store.append(LocationRecord::new(LatLng::new(lat, lng), name, origin));
        }
        store
    }

    #[test]
    fn test_empty_store_has_nothing_to_export() {
        let store = LocationStore::default();
        assert_eq!(
            prepare_export(&store).unwrap(),
            ExportOutcome::NothingToExport
        );
    }

    #[test]
    fn test_export_round_trips() {
        let store = store_with(&[(30.0, 0.0, "X", LocationOrigin::Click)]);

        let ExportOutcome::Ready(json) = prepare_export(&store).unwrap() else {
            panic!("expected an export document");
        };
        let parsed: Vec<LocationRecord> = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].latitude(), 30.0);
        assert_eq!(parsed[0].longitude(), 0.0);
        assert_eq!(parsed[0].name(), "X");
        assert_eq!(parsed[0].origin(), LocationOrigin::Click);
        assert_eq!(parsed.as_slice(), store.snapshot());
    }

    #[test]
    fn test_export_keeps_order_and_empty_names() {
        let store = store_with(&[
            (51.5, -0.12, "London", LocationOrigin::Search),
            (0.0, 0.0, "", LocationOrigin::Search),
            (48.85, 2.35, "Unknown Location", LocationOrigin::Click),
        ]);

        let ExportOutcome::Ready(json) = prepare_export(&store).unwrap() else {
            panic!("expected an export document");
        };
        let parsed: Vec<LocationRecord> = serde_json::from_str(&json).unwrap();

        let names: Vec<&str> = parsed.iter().map(|r| r.name()).collect();
        assert_eq!(names, ["London", "", "Unknown Location"]);
    }

    #[test]
    fn test_export_format_is_indented_with_stable_field_order() {
        let store = store_with(&[(30.0, 0.0, "X", LocationOrigin::Click)]);
        let json = serialize_locations(store.snapshot()).unwrap();

        let expected = "[\n  {\n    \"lat\": 30.0,\n    \"lng\": 0.0,\n    \"name\": \"X\",\n    \"type\": \"click\"\n  }\n]";
        assert_eq!(json, expected);
    }

    #[test]
    fn test_write_export_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(EXPORT_FILE_NAME);

        let result = write_export(path.clone(), "[]".to_string());

        assert!(result.success);
        assert!(result.error.is_none());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[]");
    }

    #[test]
    fn test_write_export_reports_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join(EXPORT_FILE_NAME);

        let result = write_export(path, "[]".to_string());

        assert!(!result.success);
        assert!(result.error.unwrap().contains("Failed to write"));
    }

    fn export_app(store: LocationStore) -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .insert_resource(store)
            .init_resource::<ExportState>()
            .init_resource::<AppConfig>()
            .add_message::<ExportLocationsRequest>()
            .add_systems(Update, handle_export_requests);
        app
    }

    #[test]
    fn test_export_request_with_empty_store_only_notifies() {
        let mut app = export_app(LocationStore::default());

        app.world_mut().write_message(ExportLocationsRequest);
        app.update();

        let state = app.world().resource::<ExportState>();
        assert_eq!(state.notice.as_deref(), Some("No locations to export!"));
        assert!(!state.is_busy());
        assert!(state.payload.is_none());
        assert!(state.error.is_none());
        assert!(state.last_exported.is_none());
    }

    #[test]
    fn test_no_request_leaves_state_alone() {
        let mut app = export_app(LocationStore::default());
        app.update();

        let state = app.world().resource::<ExportState>();
        assert!(state.notice.is_none());
        assert!(!state.is_busy());
    }

    #[test]
    fn test_export_state_idle_by_default() {
        let state = ExportState::default();
        assert!(!state.is_busy());
        assert!(state.notice.is_none());
    }

    #[test]
    fn test_display_name() {
        assert_eq!(display_name(Path::new("/tmp/trip.json")), "trip.json");
        assert_eq!(display_name(Path::new("/")), EXPORT_FILE_NAME);
    }
}
