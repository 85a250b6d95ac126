use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts};

use crate::constants::SEARCH_PLACEHOLDER;
use crate::geocoding::{SearchRequest, SearchResult, SearchResultSelected, SearchState};
use crate::theme::ui::{ERROR_TEXT, HINT_TEXT, PENDING_TEXT};

const SEARCH_BOX_WIDTH: f32 = 300.0;

/// Search box in the top right corner with its candidate list
pub fn search_bar_ui(
    mut contexts: EguiContexts,
    mut state: ResMut<SearchState>,
    mut requests: MessageWriter<SearchRequest>,
    mut selections: MessageWriter<SearchResultSelected>,
) -> Result {
    let mut chosen: Option<SearchResult> = None;

    egui::Window::new("Search")
        .title_bar(false)
        .resizable(false)
        .collapsible(false)
        .anchor(egui::Align2::RIGHT_TOP, [-10.0, 10.0])
        .default_width(SEARCH_BOX_WIDTH)
        .show(contexts.ctx_mut()?, |ui| {
            ui.set_width(SEARCH_BOX_WIDTH);

            let response = ui.add(
                egui::TextEdit::singleline(&mut state.query)
                    .hint_text(SEARCH_PLACEHOLDER)
                    .desired_width(f32::INFINITY),
            );
            if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                requests.write(SearchRequest {
                    query: state.query.clone(),
                });
            }

            if state.is_searching() {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.colored_label(PENDING_TEXT, "Searching...");
                });
            }

            if let Some(error) = &state.error {
                ui.colored_label(ERROR_TEXT, error);
            }

            if state.results.is_empty() {
                return;
            }

            ui.separator();
            egui::ScrollArea::vertical().max_height(240.0).show(ui, |ui| {
                for result in &state.results {
                    let clicked = ui
                        .selectable_label(false, &result.name)
                        .on_hover_text(result.center.to_string())
                        .clicked();
                    if let Some(category) = &result.category {
                        ui.label(egui::RichText::new(category).small().color(HINT_TEXT));
                    }
                    if clicked {
                        chosen = Some(result.clone());
                    }
                }
            });
        });

    if let Some(result) = chosen {
        state.clear_results();
        selections.write(SearchResultSelected(result));
    }

    Ok(())
}
