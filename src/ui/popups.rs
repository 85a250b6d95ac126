//! Overlays drawn on top of the map: marker popups, attribution and lookup
//! progress.

use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts};

use crate::config::AppConfig;
use crate::constants::MARKER_RADIUS_PX;
use crate::locations::ReverseLookupTask;
use crate::map::input::pin_head_center;
use crate::map::{LocationMarker, MapView, MarkerPopups};
use crate::theme::ui::{ATTRIBUTION_BACKGROUND, ATTRIBUTION_TEXT, PENDING_TEXT};
use crate::theme::{self, bevy_to_egui};

/// Gap between the pin head and the popup, in pixels
const POPUP_GAP_PX: f32 = 4.0;

/// Popup above the selected marker
pub fn marker_popup_ui(
    mut contexts: EguiContexts,
    mut popups: ResMut<MarkerPopups>,
    view: MapView,
    markers: Query<(&Transform, &LocationMarker)>,
) -> Result {
    let Some(entity) = popups.open else {
        return Ok(());
    };
    let Ok((transform, marker)) = markers.get(entity) else {
        popups.open = None;
        return Ok(());
    };

    let scale = view.world_per_pixel();
    let anchor = pin_head_center(transform.translation.truncate(), scale)
        + Vec2::new(0.0, (MARKER_RADIUS_PX + POPUP_GAP_PX) * scale);
    let Some(screen_pos) = view.render_to_screen(anchor) else {
        return Ok(());
    };

    let label = &marker.label;
    let mut close = false;

    egui::Area::new(egui::Id::new("marker_popup"))
        .fixed_pos(egui::pos2(screen_pos.x, screen_pos.y))
        .pivot(egui::Align2::CENTER_BOTTOM)
        .show(contexts.ctx_mut()?, |ui| {
            egui::Frame::popup(ui.style())
                .stroke(egui::Stroke::new(1.0, bevy_to_egui(theme::MARKER_PIN)))
                .show(ui, |ui| {
                    ui.set_max_width(280.0);
                    ui.horizontal(|ui| {
                        ui.label(egui::RichText::new(&label.title).strong());
                        if ui.small_button("x").on_hover_text("Close").clicked() {
                            close = true;
                        }
                    });
                    ui.label(label.lat_line());
                    ui.label(label.lng_line());
                });
        });

    if close {
        popups.open = None;
    }

    Ok(())
}

/// Tile provider attribution in the bottom right corner
pub fn attribution_ui(mut contexts: EguiContexts, config: Res<AppConfig>) -> Result {
    let attribution = &config.data.map.attribution;
    if attribution.is_empty() {
        return Ok(());
    }

    egui::Area::new(egui::Id::new("map_attribution"))
        .anchor(egui::Align2::RIGHT_BOTTOM, [0.0, 0.0])
        .interactable(false)
        .show(contexts.ctx_mut()?, |ui| {
            egui::Frame::NONE
                .fill(ATTRIBUTION_BACKGROUND)
                .inner_margin(egui::Margin::symmetric(6, 2))
                .show(ui, |ui| {
                    ui.label(
                        egui::RichText::new(attribution)
                            .small()
                            .color(ATTRIBUTION_TEXT),
                    );
                });
        });

    Ok(())
}

/// Spinner while reverse lookups are running
pub fn lookup_status_ui(
    mut contexts: EguiContexts,
    lookups: Query<(), With<ReverseLookupTask>>,
) -> Result {
    let pending = lookups.iter().count();
    if pending == 0 {
        return Ok(());
    }

    egui::Area::new(egui::Id::new("lookup_status"))
        .anchor(egui::Align2::LEFT_BOTTOM, [10.0, -10.0])
        .interactable(false)
        .show(contexts.ctx_mut()?, |ui| {
            ui.horizontal(|ui| {
                ui.spinner();
                let noun = if pending == 1 { "location" } else { "locations" };
                ui.colored_label(PENDING_TEXT, format!("Looking up {} {}...", pending, noun));
            });
        });

    Ok(())
}
