//! Region controls: bulk actions, the selected region and the region list.

use bevy::prelude::*;
use bevy_egui::egui;

use crate::engine::FogEngine;
use crate::fog::{FogRegion, RegionId, RegionPatch};
use crate::theme;
use crate::ui::file_menu::FileMenuState;

/// Renders the reveal/hide/clear buttons that act on every region.
pub fn render_bulk_actions(
    ui: &mut egui::Ui,
    engine: &mut FogEngine,
    menu_state: &mut FileMenuState,
) {
    ui.add_space(8.0);
    ui.horizontal(|ui| {
        ui.label(egui::RichText::new("Regions").size(14.0).strong());
        let total = engine.region_count();
        let revealed = engine.regions().iter().filter(|r| r.is_revealed()).count();
        ui.label(
            egui::RichText::new(format!("{} of {} revealed", revealed, total))
                .size(12.0)
                .weak(),
        );
    });
    ui.add_space(4.0);

    let has_regions = engine.region_count() > 0;
    ui.horizontal(|ui| {
        if ui
            .add_enabled(has_regions, egui::Button::new("Reveal All"))
            .clicked()
        {
            let changed = engine.reveal_all(true);
            info!("Revealing {} regions", changed);
        }
        if ui
            .add_enabled(has_regions, egui::Button::new("Hide All"))
            .clicked()
        {
            let changed = engine.hide_all(true);
            info!("Hiding {} regions", changed);
        }
        if ui
            .add_enabled(has_regions, egui::Button::new("Clear..."))
            .on_hover_text("Remove every region")
            .clicked()
        {
            menu_state.show_clear_confirmation = true;
        }
    });

    ui.add_space(12.0);
    ui.separator();
}

/// Renders the properties of the selected region, if any.
pub fn render_selected_region(ui: &mut egui::Ui, engine: &mut FogEngine) {
    let Some(region) = engine.selected_region().and_then(|id| engine.region(id)).cloned() else {
        return;
    };
    let id = region.id;

    ui.add_space(8.0);
    ui.label(egui::RichText::new("Selected Region").size(14.0).strong());
    ui.add_space(4.0);

    let mut name = region.name.clone();
    let mut opacity = region.opacity;
    let mut layer = region.layer;

    egui::Grid::new("selected_region_grid")
        .num_columns(2)
        .spacing([8.0, 6.0])
        .show(ui, |ui| {
            ui.label("Name:");
            if ui.text_edit_singleline(&mut name).changed() {
                engine.update_region(
                    id,
                    RegionPatch {
                        name: Some(name.clone()),
                        ..default()
                    },
                );
            }
            ui.end_row();

            ui.label("Shape:");
            ui.label(region.shape.kind().display_name());
            ui.end_row();

            ui.label("Opacity:");
            if ui
                .add(egui::Slider::new(&mut opacity, 0.0..=1.0).fixed_decimals(2))
                .changed()
            {
                engine.update_region(
                    id,
                    RegionPatch {
                        opacity: Some(opacity),
                        ..default()
                    },
                );
            }
            ui.end_row();

            ui.label("Layer:");
            if ui
                .add(egui::DragValue::new(&mut layer).range(-100..=100).speed(0.1))
                .changed()
            {
                engine.update_region(
                    id,
                    RegionPatch {
                        layer: Some(layer),
                        ..default()
                    },
                );
            }
            ui.end_row();
        });

    if engine.is_animating(id) {
        ui.label(egui::RichText::new("Transitioning...").color(theme::ui::HINT_TEXT));
    }

    ui.add_space(4.0);
    ui.horizontal(|ui| {
        if ui.button("Reveal").clicked() {
            engine.reveal_region(id, true);
        }
        if ui.button("Hide").clicked() {
            engine.hide_region(id, true);
        }
        if ui.button("Toggle").clicked() {
            engine.toggle_region(id, true);
        }
        if ui
            .button(egui::RichText::new("Delete").color(theme::ui::ERROR_TEXT))
            .clicked()
        {
            engine.remove_region(id);
        }
    });

    ui.add_space(12.0);
    ui.separator();
}

/// Renders every region as a selectable row, topmost layer first.
pub fn render_region_list(ui: &mut egui::Ui, engine: &mut FogEngine) {
    if engine.region_count() == 0 {
        ui.add_space(8.0);
        ui.label(
            egui::RichText::new("No regions yet. Pick a drawing tool to add one.")
                .color(theme::ui::HINT_TEXT),
        );
        return;
    }

    let selected = engine.selected_region();
    let rows = region_rows(&engine.regions());

    ui.add_space(8.0);
    egui::ScrollArea::vertical()
        .id_salt("fog_region_list")
        .max_height(240.0)
        .show(ui, |ui| {
            for (id, label) in rows {
                let is_selected = selected == Some(id);
                if ui.selectable_label(is_selected, label).clicked() {
                    let target = if is_selected { None } else { Some(id) };
                    engine.select_region(target);
                }
            }
        });

    ui.add_space(12.0);
    ui.separator();
}

fn region_rows(regions: &[&FogRegion]) -> Vec<(RegionId, String)> {
    let mut sorted: Vec<&FogRegion> = regions.to_vec();
    sorted.sort_by(|a, b| {
        b.layer
            .cmp(&a.layer)
            .then_with(|| a.created_at.cmp(&b.created_at))
    });
    sorted
        .into_iter()
        .map(|region| {
            let state = if region.is_revealed() { "revealed" } else { "hidden" };
            let name = if region.name.is_empty() {
                region.shape.kind().display_name()
            } else {
                region.name.as_str()
            };
            (region.id, format!("{} ({})", name, state))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fog::{RegionOptions, ShapeKind};

    #[test]
    fn test_region_rows_put_top_layer_first() {
        let mut engine = FogEngine::default();
        let low = engine
            .create_region(
                ShapeKind::Circle,
                &[Vec2::ZERO, Vec2::new(5.0, 0.0)],
                RegionOptions {
                    name: Some("Cellar".to_string()),
                    ..default()
                },
            )
            .unwrap();
        let high = engine
            .create_region(
                ShapeKind::Rectangle,
                &[Vec2::ZERO, Vec2::new(10.0, 10.0)],
                RegionOptions {
                    name: Some("Tower".to_string()),
                    layer: Some(3),
                    opacity: Some(0.0),
                },
            )
            .unwrap();

        let rows = region_rows(&engine.regions());
        assert_eq!(rows[0], (high, "Tower (revealed)".to_string()));
        assert_eq!(rows[1], (low, "Cellar (hidden)".to_string()));
    }
}
