//! Centralized color theme for the application.
//!
//! This module provides all colors used by the fog overlay, the map backdrop and the
//! egui panels. Modify values here to change the application's color scheme.

use bevy::prelude::Color;
use bevy_egui::egui;

// ============================================================================
// Map Backdrop
// ============================================================================

/// Clear color behind the map
pub const BACKGROUND: Color = Color::srgb(0.16, 0.17, 0.19);

/// Semi-transparent grey grid lines
pub const GRID_COLOR: Color = Color::srgba(0.5, 0.5, 0.5, 0.3);

// ============================================================================
// Fog Overlay Colors
// ============================================================================

/// Dashed outline of the shape being drawn
pub const PREVIEW_OUTLINE: Color = Color::srgb(1.0, 1.0, 0.0);

/// Outline drawn around the selected region
pub const SELECTION_COLOR: Color = Color::srgb(0.2, 0.6, 1.0);

/// Quick-pick fog colors for the settings panel
pub fn fog_color_presets() -> [(Color, &'static str); 4] {
    [
        (Color::srgb(0.0, 0.0, 0.0), "Black"),
        (Color::srgb(0.05, 0.05, 0.12), "Night"),
        (Color::srgb(0.35, 0.35, 0.38), "Mist"),
        (Color::srgb(0.18, 0.1, 0.22), "Arcane"),
    ]
}

// ============================================================================
// UI Colors (egui)
// ============================================================================

pub mod ui {
    use bevy_egui::egui;

    /// Green indicator for an active GPU compositor
    pub const GPU_ACTIVE: egui::Color32 = egui::Color32::from_rgb(100, 200, 100);

    /// Light grey for label text
    pub const LABEL_TEXT: egui::Color32 = egui::Color32::LIGHT_GRAY;

    /// Grey for help/hint text
    pub const HINT_TEXT: egui::Color32 = egui::Color32::GRAY;

    /// White for selected button borders
    pub const SELECTED_BORDER: egui::Color32 = egui::Color32::WHITE;

    /// Dark grey for unselected button borders
    pub const UNSELECTED_BORDER: egui::Color32 = egui::Color32::DARK_GRAY;

    /// Red for error messages
    pub const ERROR_TEXT: egui::Color32 = egui::Color32::RED;

    /// Amber for unsaved-changes marker
    pub const UNSAVED_TEXT: egui::Color32 = egui::Color32::from_rgb(230, 170, 60);
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

/// Convert an egui Color32 to Bevy Color
pub fn egui_to_bevy(color: egui::Color32) -> Color {
    let [r, g, b, a] = color.to_srgba_unmultiplied();
    Color::srgba(
        r as f32 / 255.0,
        g as f32 / 255.0,
        b as f32 / 255.0,
        a as f32 / 255.0,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opaque_color_round_trips_through_egui() {
        let color = Color::srgb(1.0, 0.0, 0.0);
        let back = egui_to_bevy(bevy_to_egui(color));
        assert_eq!(back, Color::srgba(1.0, 0.0, 0.0, 1.0));
    }
}
