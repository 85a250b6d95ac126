use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts};

use crate::config::ConfigResetNotification;
use crate::locations::export::display_name;
use crate::locations::{ExportLocationsRequest, ExportState, LocationStore};
use crate::theme::ui::{ERROR_TEXT, HINT_TEXT, PENDING_TEXT, SUCCESS_TEXT};

/// Export button in the top left corner
pub fn export_panel_ui(
    mut contexts: EguiContexts,
    store: Res<LocationStore>,
    state: Res<ExportState>,
    mut requests: MessageWriter<ExportLocationsRequest>,
) -> Result {
    egui::Window::new("Export")
        .title_bar(false)
        .resizable(false)
        .collapsible(false)
        .anchor(egui::Align2::LEFT_TOP, [10.0, 10.0])
        .show(contexts.ctx_mut()?, |ui| {
            ui.horizontal(|ui| {
                let button = ui
                    .add_enabled(!state.is_busy(), egui::Button::new("Export Locations"))
                    .on_hover_text("Save every location as JSON (Ctrl+E)");
                if button.clicked() {
                    requests.write(ExportLocationsRequest);
                }

                let count = store.len();
                let noun = if count == 1 { "location" } else { "locations" };
                ui.colored_label(HINT_TEXT, format!("{} {}", count, noun));
            });

            if state.is_busy() {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.colored_label(PENDING_TEXT, "Exporting...");
                });
            } else if let Some(path) = &state.last_exported {
                ui.colored_label(SUCCESS_TEXT, format!("Saved {}", display_name(path)))
                    .on_hover_text(path.display().to_string());
            }
        });

    Ok(())
}

/// Ctrl+E starts an export unless a text field has focus
pub fn handle_export_shortcut(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut contexts: EguiContexts,
    mut requests: MessageWriter<ExportLocationsRequest>,
) {
    if let Ok(ctx) = contexts.ctx_mut()
        && ctx.wants_keyboard_input()
    {
        return;
    }

    let ctrl = keyboard.pressed(KeyCode::ControlLeft) || keyboard.pressed(KeyCode::ControlRight);
    if ctrl && keyboard.just_pressed(KeyCode::KeyE) {
        requests.write(ExportLocationsRequest);
    }
}

/// Blocking notice and error dialogs for exports
pub fn export_dialogs_ui(mut contexts: EguiContexts, mut state: ResMut<ExportState>) -> Result {
    if let Some(notice) = state.notice.clone() {
        egui::Window::new("Export Locations")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(contexts.ctx_mut()?, |ui| {
                ui.label(notice);
                ui.add_space(10.0);
                if ui.button("OK").clicked() {
                    state.notice = None;
                }
            });
    }

    if let Some(error) = state.error.clone() {
        egui::Window::new("Export Failed")
            .collapsible(false)
            .resizable(true)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(contexts.ctx_mut()?, |ui| {
                egui::ScrollArea::vertical().max_height(200.0).show(ui, |ui| {
                    ui.colored_label(ERROR_TEXT, error);
                });
                ui.add_space(10.0);
                if ui.button("OK").clicked() {
                    state.error = None;
                }
            });
    }

    Ok(())
}

/// Tells the user the config file was unreadable and defaults are in use
pub fn config_reset_notification_ui(
    mut contexts: EguiContexts,
    mut notification: ResMut<ConfigResetNotification>,
) -> Result {
    if !notification.show {
        return Ok(());
    }

    egui::Window::new("Settings Reset")
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(contexts.ctx_mut()?, |ui| {
            ui.label("Your settings could not be loaded and were reset to defaults.");
            if let Some(reason) = &notification.reason {
                ui.add_space(5.0);
                ui.colored_label(ERROR_TEXT, reason);
            }
            ui.add_space(10.0);
            if ui.button("OK").clicked() {
                notification.show = false;
                notification.reason = None;
            }
        });

    Ok(())
}
