//! Centralized color theme for the application.
//!
//! This module provides all colors used throughout the map rendering and UI.
//! Modify values here to change the application's color scheme.

use bevy::prelude::Color;
use bevy_egui::egui;

// ============================================================================
// Map Colors
// ============================================================================

/// Background shown where tiles have not loaded (or outside the world)
pub const MAP_BACKGROUND: Color = Color::srgb(0.67, 0.78, 0.85);

// ============================================================================
// Search Highlight Colors
// ============================================================================

/// Border of the circle drawn around a search result (#3388ff)
pub const SEARCH_CIRCLE_BORDER: Color = Color::srgb(0.2, 0.535, 1.0);

/// Semi-transparent fill of the search result circle (20% opacity)
pub const SEARCH_CIRCLE_FILL: Color = Color::srgba(0.2, 0.535, 1.0, 0.2);

// ============================================================================
// Marker Colors
// ============================================================================

/// Pin head and stem
pub const MARKER_PIN: Color = Color::srgb(0.16, 0.45, 0.87);

/// Inner dot of the pin head
pub const MARKER_DOT: Color = Color::WHITE;

// ============================================================================
// UI Colors (egui)
// ============================================================================

pub mod ui {
    use bevy_egui::egui;

    /// Grey for help/hint text
    pub const HINT_TEXT: egui::Color32 = egui::Color32::GRAY;

    /// Red for error messages
    pub const ERROR_TEXT: egui::Color32 = egui::Color32::RED;

    /// Orange for pending background work
    pub const PENDING_TEXT: egui::Color32 = egui::Color32::from_rgb(255, 165, 0);

    /// Green for completed exports
    pub const SUCCESS_TEXT: egui::Color32 = egui::Color32::from_rgb(0, 200, 0);

    /// Semi-transparent white backdrop for the attribution label
    pub const ATTRIBUTION_BACKGROUND: egui::Color32 =
        egui::Color32::from_rgba_premultiplied(200, 200, 200, 200);

    /// Dark text on the attribution backdrop
    pub const ATTRIBUTION_TEXT: egui::Color32 = egui::Color32::from_rgb(51, 51, 51);
}

// ============================================================================
// Color Conversion Utilities
// ============================================================================

/// Convert a Bevy Color to egui Color32 (preserving alpha)
pub fn bevy_to_egui(color: Color) -> egui::Color32 {
    let srgba = color.to_srgba();
    egui::Color32::from_rgba_unmultiplied(
        (srgba.red * 255.0) as u8,
        (srgba.green * 255.0) as u8,
        (srgba.blue * 255.0) as u8,
        (srgba.alpha * 255.0) as u8,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_circle_border_is_leaflet_blue() {
        let color = bevy_to_egui(SEARCH_CIRCLE_BORDER);
        assert_eq!(color.r(), 0x33);
        assert!((color.g() as i32 - 0x88).abs() <= 1);
        assert_eq!(color.b(), 0xff);
    }

    #[test]
    fn test_search_circle_fill_is_translucent() {
        let fill = SEARCH_CIRCLE_FILL.to_srgba();
        assert!((fill.alpha - 0.2).abs() < f32::EPSILON);
    }
}
