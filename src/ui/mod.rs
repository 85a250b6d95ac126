mod export_panel;
mod popups;
mod search_bar;

use bevy::prelude::*;
use bevy_egui::EguiPrimaryContextPass;

use crate::config::ConfigResetNotification;
use crate::locations::ExportState;

/// Resource that tracks whether any modal dialog is currently open.
/// Map input handlers check this to avoid processing clicks and drags
/// while the user is interacting with a dialog.
#[derive(Resource, Default)]
pub struct DialogState {
    /// True when any modal dialog is open that should block map input
    pub any_modal_open: bool,
}

/// System to aggregate all dialog open states into a single resource.
/// Runs in First schedule before input handlers.
fn update_dialog_state(
    export: Res<ExportState>,
    config_reset: Res<ConfigResetNotification>,
    mut dialog_state: ResMut<DialogState>,
) {
    dialog_state.any_modal_open = export.notice.is_some()
        || export.error.is_some()
        || export.is_busy()
        || config_reset.show;
}

pub struct UiPlugin;

impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<DialogState>()
            .add_systems(
                EguiPrimaryContextPass,
                (
                    // Map overlays first so controls and dialogs draw over them
                    popups::attribution_ui,
                    popups::lookup_status_ui,
                    popups::marker_popup_ui,
                )
                    .chain(),
            )
            .add_systems(
                EguiPrimaryContextPass,
                (search_bar::search_bar_ui, export_panel::export_panel_ui)
                    .after(popups::marker_popup_ui),
            )
            .add_systems(
                EguiPrimaryContextPass,
                (
                    export_panel::export_dialogs_ui,
                    export_panel::config_reset_notification_ui,
                )
                    .after(search_bar::search_bar_ui)
                    .after(export_panel::export_panel_ui),
            )
            .add_systems(Update, export_panel::handle_export_shortcut)
            // Update dialog state at the start of each frame
            .add_systems(First, update_dialog_state);
    }
}
