//! Main fog panel UI orchestration.

use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts};

use crate::config::SetDefaultFogSettingsRequest;
use crate::engine::FogEngine;
use crate::ui::file_menu::FileMenuState;

use super::metrics::render_metrics;
use super::regions::{render_bulk_actions, render_region_list, render_selected_region};
use super::settings::render_settings;

/// Main fog panel UI system.
pub fn fog_panel_ui(
    mut contexts: EguiContexts,
    mut engine: ResMut<FogEngine>,
    mut menu_state: ResMut<FileMenuState>,
    mut default_events: MessageWriter<SetDefaultFogSettingsRequest>,
) -> Result {
    egui::SidePanel::right("fog_panel")
        .default_width(240.0)
        .show(contexts.ctx_mut()?, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                render_settings(ui, &mut engine, &mut default_events);
                render_bulk_actions(ui, &mut engine, &mut menu_state);
                render_selected_region(ui, &mut engine);
                render_region_list(ui, &mut engine);
                render_metrics(ui, &engine);
            });
        });
    Ok(())
}
