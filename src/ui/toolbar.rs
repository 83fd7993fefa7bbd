use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts};

use crate::engine::FogEngine;
use crate::host::{AsyncSnapshotOperation, CurrentSnapshotFile, SnapshotDirtyState};
use crate::theme;
use crate::tools::{DrawingPreview, FogTool};

use super::file_menu::{render_file_menu, FileMenuState};

/// Main toolbar: file menu, tool buttons and the fog toggle
#[allow(clippy::too_many_arguments)]
pub fn toolbar_ui(
    mut contexts: EguiContexts,
    mut engine: ResMut<FogEngine>,
    mut menu_state: ResMut<FileMenuState>,
    current_file: Res<CurrentSnapshotFile>,
    dirty_state: Res<SnapshotDirtyState>,
    async_op: Res<AsyncSnapshotOperation>,
    mut save_events: MessageWriter<crate::host::SaveSnapshotRequest>,
    mut load_events: MessageWriter<crate::host::LoadSnapshotRequest>,
) -> Result {
    egui::TopBottomPanel::top("main_toolbar")
        .frame(
            egui::Frame::side_top_panel(&contexts.ctx_mut()?.style())
                .inner_margin(egui::Margin::symmetric(12, 8)),
        )
        .show(contexts.ctx_mut()?, |ui| {
            ui.horizontal(|ui| {
                ui.spacing_mut().item_spacing.x = 4.0;

                render_file_menu(
                    ui,
                    &mut menu_state,
                    &current_file,
                    async_op.is_busy(),
                    &mut save_events,
                    &mut load_events,
                );

                ui.add_space(8.0);
                ui.separator();
                ui.add_space(8.0);

                // Tool buttons with keyboard shortcuts
                let active = engine.active_tool();
                for tool in FogTool::all() {
                    let button = egui::Button::new(
                        egui::RichText::new(tool_button_label(*tool)).size(14.0).strong(),
                    )
                    .min_size(egui::vec2(0.0, 28.0))
                    .selected(active == *tool);

                    let response = ui.add(button);
                    if response.clicked() {
                        engine.set_tool(*tool);
                    }
                    response.on_hover_text(tool.display_name());
                }

                ui.add_space(8.0);
                ui.separator();
                ui.add_space(8.0);

                let mut enabled = engine.settings().enabled;
                if ui
                    .checkbox(&mut enabled, "Fog")
                    .on_hover_text("Show or hide the fog overlay")
                    .changed()
                {
                    engine.set_enabled(enabled);
                }

                // Right-aligned file status
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let name = current_file
                        .path
                        .as_ref()
                        .and_then(|p| p.file_name())
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_else(|| "Untitled".to_string());
                    if dirty_state.is_dirty {
                        ui.colored_label(theme::ui::UNSAVED_TEXT, "unsaved");
                    }
                    ui.label(egui::RichText::new(name).color(theme::ui::LABEL_TEXT));
                });
            });
        });
    Ok(())
}

/// Hint bar describing how to use the active tool
pub fn tool_hint_ui(mut contexts: EguiContexts, mut engine: ResMut<FogEngine>) -> Result {
    let tool = engine.active_tool();

    egui::TopBottomPanel::top("tool_hints")
        .frame(
            egui::Frame::side_top_panel(&contexts.ctx_mut()?.style())
                .inner_margin(egui::Margin::symmetric(12, 6))
                .fill(egui::Color32::from_rgb(45, 45, 48)),
        )
        .show(contexts.ctx_mut()?, |ui| {
            ui.horizontal(|ui| {
                ui.spacing_mut().item_spacing.x = 6.0;
                ui.label(
                    egui::RichText::new(format!("{}:", tool_button_label(tool)))
                        .color(theme::ui::LABEL_TEXT),
                );
                ui.label(egui::RichText::new(tool_hint(tool)).color(theme::ui::HINT_TEXT));

                if let Some(DrawingPreview::Polyline(points)) = engine.drawing_preview() {
                    // Last point follows the pointer
                    let placed = points.len().saturating_sub(1);
                    ui.add_space(8.0);
                    ui.label(format!("{} points", placed));
                    if ui.button("Finish").clicked() {
                        engine.complete_drawing();
                    }
                    if ui.button("Cancel").clicked() {
                        engine.cancel_interaction();
                    }
                }
            });
        });
    Ok(())
}

fn tool_button_label(tool: FogTool) -> &'static str {
    match tool {
        FogTool::Select => "Select",
        FogTool::Reveal => "Reveal",
        FogTool::Hide => "Hide",
        FogTool::Polygon => "Polygon",
        FogTool::Circle => "Circle",
        FogTool::Rectangle => "Rectangle",
    }
}

fn tool_hint(tool: FogTool) -> &'static str {
    match tool {
        FogTool::Select => "Click a region to select it, drag to move it. Delete removes it.",
        FogTool::Reveal => "Click a region to reveal it.",
        FogTool::Hide => "Click a region to hide it.",
        FogTool::Polygon => {
            "Click to add points, right-click or Enter to finish, Escape to cancel."
        }
        FogTool::Circle => "Drag from the center outwards.",
        FogTool::Rectangle => "Drag from one corner to the opposite corner.",
    }
}
