use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::geo::LatLng;

/// System set for config loading (other plugins can run after this)
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConfigLoaded;

/// Base map and view limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapSettings {
    /// Raster tile URL with `{z}`, `{x}` and `{y}` placeholders
    pub tile_url: String,
    /// Attribution text required by the tile provider
    pub attribution: String,
    pub min_zoom: u8,
    pub max_zoom: u8,
    /// View center when the application starts
    pub initial_center: LatLng,
    pub initial_zoom: u8,
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            tile_url: "https://server.arcgisonline.com/ArcGIS/rest/services/World_Street_Map/MapServer/tile/{z}/{y}/{x}".to_string(),
            attribution: "© Esri".to_string(),
            min_zoom: 1,
            max_zoom: 18,
            initial_center: LatLng::new(30.0, 0.0),
            initial_zoom: 2,
        }
    }
}

impl MapSettings {
    /// Clamp a zoom level into the configured range.
    pub fn clamp_zoom(&self, zoom: f32) -> f32 {
        let (low, high) = if self.min_zoom <= self.max_zoom {
            (self.min_zoom, self.max_zoom)
        } else {
            (self.max_zoom, self.min_zoom)
        };
        zoom.clamp(low as f32, high as f32)
    }
}

/// Nominatim-compatible geocoding endpoint settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocoderSettings {
    pub base_url: String,
    /// Sent with every request, as required by the Nominatim usage policy
    pub user_agent: String,
    /// Upper bound for a single geocoding request
    pub timeout_secs: u64,
    /// Comma separated ISO country codes; empty searches the whole world
    pub country_codes: String,
    /// Maximum number of search candidates to list
    pub result_limit: u8,
}

impl Default for GeocoderSettings {
    fn default() -> Self {
        Self {
            base_url: "https://nominatim.openstreetmap.org".to_string(),
            user_agent: concat!("mapmarks/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_secs: 10,
            country_codes: String::new(),
            result_limit: 5,
        }
    }
}

/// Application configuration persisted to disk
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfigData {
    #[serde(default)]
    pub map: MapSettings,

    #[serde(default)]
    pub geocoder: GeocoderSettings,

    /// Directory of the last successful export (the save dialog starts there)
    #[serde(default)]
    pub last_export_dir: Option<PathBuf>,
}

/// Runtime configuration resource
#[derive(Resource)]
pub struct AppConfig {
    /// The persisted configuration data
    pub data: AppConfigData,
    /// Path to the config file
    pub config_path: PathBuf,
    /// Whether config needs to be saved (dirty flag)
    pub dirty: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data: AppConfigData::default(),
            config_path: get_config_path(),
            dirty: false,
        }
    }
}

/// Resource to notify user when config was reset to defaults
#[derive(Resource, Default)]
pub struct ConfigResetNotification {
    /// Whether to show the notification dialog
    pub show: bool,
    /// The reason for the reset (parse error, read error, etc.)
    pub reason: Option<String>,
}

/// Message to trigger config save
#[derive(Message)]
pub struct SaveConfigRequest;

/// Message to remember where the last export was written
#[derive(Message)]
pub struct UpdateLastExportDirRequest {
    pub dir: PathBuf,
}

/// Get the path to the config file (platform-appropriate location)
fn get_config_path() -> PathBuf {
    crate::paths::config_file()
}

/// Result of loading config from disk
struct LoadConfigResult {
    data: AppConfigData,
    /// Error message if config was reset to defaults due to an error
    reset_reason: Option<String>,
}

/// Parse config file contents, falling back to defaults on malformed JSON.
fn parse_config(json: &str) -> LoadConfigResult {
    match serde_json::from_str(json) {
        Ok(data) => LoadConfigResult {
            data,
            reset_reason: None,
        },
        Err(e) => {
            warn!("Failed to parse config file: {}", e);
            LoadConfigResult {
                data: AppConfigData::default(),
                reset_reason: Some(format!("Configuration file was corrupted: {}", e)),
            }
        }
    }
}

/// Load configuration from disk
fn load_config(config_path: &std::path::Path) -> LoadConfigResult {
    if !config_path.exists() {
        info!("No config file found, using defaults");
        return LoadConfigResult {
            data: AppConfigData::default(),
            reset_reason: None,
        };
    }

    match std::fs::read_to_string(config_path) {
        Ok(json) => {
            let result = parse_config(&json);
            if result.reset_reason.is_none() {
                info!("Loaded config from {:?}", config_path);
            }
            result
        }
        Err(e) => {
            warn!("Failed to read config file: {}", e);
            LoadConfigResult {
                data: AppConfigData::default(),
                reset_reason: Some(format!("Could not read configuration file: {}", e)),
            }
        }
    }
}

/// Save configuration to disk
fn save_config(config: &AppConfig) {
    match serde_json::to_string_pretty(&config.data) {
        Ok(json) => {
            if let Err(e) = std::fs::write(&config.config_path, json) {
                error!("Failed to save config: {}", e);
            } else {
                info!("Config saved to {:?}", config.config_path);
            }
        }
        Err(e) => {
            error!("Failed to serialize config: {}", e);
        }
    }
}

/// Startup system to load config from disk into the existing resource
fn load_config_system(
    mut config: ResMut<AppConfig>,
    mut reset_notification: ResMut<ConfigResetNotification>,
) {
    let result = load_config(&config.config_path);
    config.data = result.data;
    config.dirty = false;

    // Set notification if config was reset due to an error
    if let Some(reason) = result.reset_reason {
        reset_notification.show = true;
        reset_notification.reason = Some(reason);
    }
}

/// System to save config when requested
fn save_config_system(
    mut events: MessageReader<SaveConfigRequest>,
    mut config: ResMut<AppConfig>,
) {
    for _ in events.read() {
        if config.dirty {
            save_config(&config);
            config.dirty = false;
        }
    }
}

/// System to update the remembered export directory
fn update_last_export_dir_system(
    mut events: MessageReader<UpdateLastExportDirRequest>,
    mut config: ResMut<AppConfig>,
    mut save_events: MessageWriter<SaveConfigRequest>,
) {
    for event in events.read() {
        if config.data.last_export_dir.as_ref() == Some(&event.dir) {
            continue;
        }
        config.data.last_export_dir = Some(event.dir.clone());
        config.dirty = true;
        save_events.write(SaveConfigRequest);
    }
}

pub struct ConfigPlugin;

impl Plugin for ConfigPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<AppConfig>()
            .init_resource::<ConfigResetNotification>()
            .add_message::<SaveConfigRequest>()
            .add_message::<UpdateLastExportDirRequest>()
            .add_systems(Startup, load_config_system.in_set(ConfigLoaded))
            .add_systems(
                Update,
                (
                    update_last_export_dir_system.run_if(on_message::<UpdateLastExportDirRequest>),
                    save_config_system.run_if(on_message::<SaveConfigRequest>),
                )
                    .chain(),
            );
    }
}
