//! Renderer metrics readout.

use bevy_egui::egui;

use crate::engine::{FogEngine, FogMetrics};
use crate::theme;

pub fn render_metrics(ui: &mut egui::Ui, engine: &FogEngine) {
    let metrics = engine.metrics();

    ui.add_space(8.0);
    egui::CollapsingHeader::new("Metrics")
        .default_open(false)
        .show(ui, |ui| {
            egui::Grid::new("fog_metrics_grid")
                .num_columns(2)
                .spacing([8.0, 2.0])
                .show(ui, |ui| {
                    for (label, value) in metric_rows(&metrics) {
                        ui.label(egui::RichText::new(label).color(theme::ui::LABEL_TEXT));
                        ui.label(value);
                        ui.end_row();
                    }
                });

            if metrics.gpu_active {
                ui.colored_label(theme::ui::GPU_ACTIVE, "GPU compositor active");
            } else {
                ui.label(egui::RichText::new("2D renderer").color(theme::ui::HINT_TEXT));
            }
        });
}

fn metric_rows(metrics: &FogMetrics) -> [(&'static str, String); 6] {
    [
        ("FPS", format!("{:.0}", metrics.fps)),
        ("Regions", metrics.total_regions.to_string()),
        ("Visible", metrics.visible_regions.to_string()),
        ("Animating", metrics.animating.to_string()),
        ("Cached paths", metrics.cache_entries.to_string()),
        ("Pattern tiles", metrics.pattern_tiles.to_string()),
    ]
}
