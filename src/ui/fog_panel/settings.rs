//! Global fog settings editor.

use bevy::prelude::*;
use bevy_egui::egui;

use crate::config::SetDefaultFogSettingsRequest;
use crate::constants::{MAX_EDGE_BLUR, MAX_PATTERN_SCALE, MIN_PATTERN_SCALE};
use crate::engine::FogEngine;
use crate::fog::{FogSettings, PatternKind, RenderQuality};
use crate::theme;

/// Renders the settings section.
///
/// Widgets edit a copy; the engine only sees the result once, sanitized.
pub fn render_settings(
    ui: &mut egui::Ui,
    engine: &mut FogEngine,
    default_events: &mut MessageWriter<SetDefaultFogSettingsRequest>,
) {
    ui.add_space(8.0);
    ui.label(egui::RichText::new("Fog Settings").size(14.0).strong());
    ui.add_space(4.0);

    let mut edited = engine.settings().clone();
    render_settings_widgets(ui, &mut edited);

    if &edited != engine.settings() {
        engine.update_settings(|settings| *settings = edited);
    }

    ui.add_space(4.0);
    if ui
        .button("Save as Defaults")
        .on_hover_text("Use these settings when the application starts")
        .clicked()
    {
        default_events.write(SetDefaultFogSettingsRequest {
            settings: engine.settings().clone(),
        });
    }

    ui.add_space(12.0);
    ui.separator();
}

fn render_settings_widgets(ui: &mut egui::Ui, settings: &mut FogSettings) {
    egui::Grid::new("fog_settings_grid")
        .num_columns(2)
        .spacing([8.0, 6.0])
        .show(ui, |ui| {
            ui.label("Opacity:");
            ui.add(egui::Slider::new(&mut settings.global_opacity, 0.0..=1.0).fixed_decimals(2));
            ui.end_row();

            ui.label("Edge blur:");
            ui.add(egui::Slider::new(&mut settings.edge_blur, 0.0..=MAX_EDGE_BLUR).suffix(" px"));
            ui.end_row();

            ui.label("Quality:");
            egui::ComboBox::from_id_salt("fog_quality_select")
                .selected_text(settings.quality.display_name())
                .show_ui(ui, |ui| {
                    for quality in RenderQuality::all() {
                        ui.selectable_value(&mut settings.quality, *quality, quality.display_name());
                    }
                });
            ui.end_row();

            ui.label("Pattern:");
            egui::ComboBox::from_id_salt("fog_pattern_select")
                .selected_text(settings.pattern.display_name())
                .show_ui(ui, |ui| {
                    for pattern in PatternKind::all() {
                        ui.selectable_value(&mut settings.pattern, *pattern, pattern.display_name());
                    }
                });
            ui.end_row();

            ui.label("Pattern size:");
            ui.add_enabled(
                settings.pattern != PatternKind::Solid,
                egui::Slider::new(
                    &mut settings.pattern_scale,
                    MIN_PATTERN_SCALE..=MAX_PATTERN_SCALE,
                )
                .suffix(" px"),
            );
            ui.end_row();

            ui.label("Transition:");
            ui.add(
                egui::DragValue::new(&mut settings.animation_duration_ms)
                    .range(0.0..=5000.0)
                    .speed(10.0)
                    .suffix(" ms"),
            );
            ui.end_row();
        });

    ui.checkbox(&mut settings.smooth_transitions, "Smooth transitions");

    ui.add_space(4.0);
    ui.horizontal(|ui| {
        ui.label("Color:");
        let mut color = theme::bevy_to_egui(settings.color);
        if ui.color_edit_button_srgba(&mut color).changed() {
            settings.color = theme::egui_to_bevy(color);
        }
    });

    ui.horizontal_wrapped(|ui| {
        for (preset, name) in theme::fog_color_presets() {
            let selected = preset.to_srgba() == settings.color.to_srgba();
            let border = if selected {
                theme::ui::SELECTED_BORDER
            } else {
                theme::ui::UNSELECTED_BORDER
            };
            let button = egui::Button::new("")
                .fill(theme::bevy_to_egui(preset))
                .stroke(egui::Stroke::new(1.5, border))
                .min_size(egui::vec2(24.0, 24.0));
            if ui.add(button).on_hover_text(name).clicked() {
                settings.color = preset;
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_opaque() {
        for (color, name) in theme::fog_color_presets() {
            assert_eq!(color.alpha(), 1.0, "{} should be opaque", name);
        }
    }

    #[test]
    fn test_pattern_scale_limits_match_settings_clamp() {
        let mut settings = FogSettings {
            pattern_scale: MAX_PATTERN_SCALE * 4.0,
            ..default()
        };
        settings.sanitize();
        assert_eq!(settings.pattern_scale, MAX_PATTERN_SCALE);
    }
}
