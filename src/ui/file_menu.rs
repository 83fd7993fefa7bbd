use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts};
use std::path::{Path, PathBuf};

use crate::config::{AppConfig, ConfigResetNotification, MissingSnapshotWarning, SaveConfigRequest};
use crate::constants::DEFAULT_SNAPSHOT_FILE_NAME;
use crate::engine::FogEngine;
use crate::host::{
    AsyncSnapshotOperation, CurrentSnapshotFile, LoadSnapshotRequest, SaveSnapshotRequest,
    SnapshotLoadError, SnapshotSaveError,
};
use crate::theme;

#[derive(Resource, Default)]
pub struct FileMenuState {
    pub show_clear_confirmation: bool,
}

/// Renders the File menu button inside the toolbar
pub fn render_file_menu(
    ui: &mut egui::Ui,
    menu_state: &mut FileMenuState,
    current_file: &CurrentSnapshotFile,
    busy: bool,
    save_events: &mut MessageWriter<SaveSnapshotRequest>,
    load_events: &mut MessageWriter<LoadSnapshotRequest>,
) {
    ui.menu_button("File", |ui| {
        if ui.add_enabled(!busy, egui::Button::new("Save")).clicked() {
            let path = current_file.path.clone().or_else(pick_save_path);
            if let Some(path) = path {
                save_events.write(SaveSnapshotRequest { path });
            }
            ui.close();
        }

        if ui.add_enabled(!busy, egui::Button::new("Save As...")).clicked() {
            if let Some(path) = pick_save_path() {
                save_events.write(SaveSnapshotRequest { path });
            }
            ui.close();
        }

        if ui.add_enabled(!busy, egui::Button::new("Open...")).clicked() {
            if let Some(path) = pick_open_path() {
                load_events.write(LoadSnapshotRequest { path });
            }
            ui.close();
        }

        ui.separator();

        if ui.button("Clear All Regions...").clicked() {
            menu_state.show_clear_confirmation = true;
            ui.close();
        }
    });
}

fn pick_save_path() -> Option<PathBuf> {
    rfd::FileDialog::new()
        .add_filter("Fog snapshot", &["json"])
        .set_directory(crate::paths::snapshots_dir())
        .set_file_name(DEFAULT_SNAPSHOT_FILE_NAME)
        .set_title("Save Fog Snapshot")
        .save_file()
        .map(with_json_extension)
}

fn pick_open_path() -> Option<PathBuf> {
    rfd::FileDialog::new()
        .add_filter("Fog snapshot", &["json"])
        .set_directory(crate::paths::snapshots_dir())
        .set_title("Open Fog Snapshot")
        .pick_file()
}

/// Append `.json` when the user typed a bare file name
fn with_json_extension(path: PathBuf) -> PathBuf {
    if path.extension().is_some() {
        path
    } else {
        path.with_extension("json")
    }
}

/// Shortens long paths from the left so dialogs keep a sane width
fn display_path(path: &Path) -> String {
    let path_str = path.to_string_lossy();
    let chars: Vec<char> = path_str.chars().collect();
    if chars.len() > 50 {
        let tail: String = chars[chars.len() - 47..].iter().collect();
        format!("...{}", tail)
    } else {
        path_str.to_string()
    }
}

/// Renders the dialog windows for file operations (triggered from the toolbar menu)
pub fn file_menu_ui(
    mut contexts: EguiContexts,
    mut menu_state: ResMut<FileMenuState>,
    mut engine: ResMut<FogEngine>,
    mut load_error: ResMut<SnapshotLoadError>,
) -> Result {
    // Clear confirmation dialog
    if menu_state.show_clear_confirmation {
        let count = engine.region_count();
        egui::Window::new("Clear Regions")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(contexts.ctx_mut()?, |ui| {
                ui.label(format!("Remove all {} fog regions? This cannot be undone.", count));
                ui.horizontal(|ui| {
                    if ui.button("Clear").clicked() {
                        let removed = engine.clear_regions();
                        info!("Cleared {} fog regions", removed.len());
                        menu_state.show_clear_confirmation = false;
                    }
                    if ui.button("Cancel").clicked() {
                        menu_state.show_clear_confirmation = false;
                    }
                });
            });
    }

    // Load error dialog
    if let Some(error) = load_error.message.clone() {
        egui::Window::new("Load Error")
            .collapsible(false)
            .resizable(true)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(contexts.ctx_mut()?, |ui| {
                egui::ScrollArea::vertical().max_height(200.0).show(ui, |ui| {
                    ui.colored_label(theme::ui::ERROR_TEXT, &error);
                });
                ui.label("The current fog was left unchanged.");
                if ui.button("OK").clicked() {
                    load_error.message = None;
                }
            });
    }

    Ok(())
}

/// Renders the save error dialog
pub fn save_error_dialog_ui(
    mut contexts: EguiContexts,
    mut save_error: ResMut<SnapshotSaveError>,
) -> Result {
    let Some(error) = save_error.message.clone() else {
        return Ok(());
    };

    egui::Window::new("Save Error")
        .collapsible(false)
        .resizable(true)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(contexts.ctx_mut()?, |ui| {
            egui::ScrollArea::vertical().max_height(200.0).show(ui, |ui| {
                ui.colored_label(theme::ui::ERROR_TEXT, &error);
            });
            if ui.button("OK").clicked() {
                save_error.message = None;
            }
        });

    Ok(())
}

/// Progress modal shown while a snapshot is read or written
pub fn async_operation_modal_ui(
    mut contexts: EguiContexts,
    async_op: Res<AsyncSnapshotOperation>,
) -> Result {
    if !async_op.is_busy() {
        return Ok(());
    }

    let description = async_op
        .operation_description
        .as_deref()
        .unwrap_or("Working...");

    egui::Window::new("Please Wait")
        .collapsible(false)
        .resizable(false)
        .title_bar(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(contexts.ctx_mut()?, |ui| {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label(description);
            });
        });

    Ok(())
}

/// Renders the missing snapshot warning dialog (shown at startup if the last snapshot is gone)
pub fn missing_snapshot_warning_ui(
    mut contexts: EguiContexts,
    mut warning: ResMut<MissingSnapshotWarning>,
    mut config: ResMut<AppConfig>,
    mut save_events: MessageWriter<SaveConfigRequest>,
) -> Result {
    if !warning.show {
        return Ok(());
    }

    egui::Window::new("Snapshot Not Found")
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(contexts.ctx_mut()?, |ui| {
            ui.label("The last fog snapshot no longer exists:");

            if let Some(ref path) = warning.path {
                ui.add_space(5.0);
                ui.label(egui::RichText::new(display_path(path)).weak())
                    .on_hover_text(path.to_string_lossy());
                ui.add_space(10.0);
            }

            ui.horizontal(|ui| {
                if ui.button("OK").clicked() {
                    warning.show = false;
                }

                if ui.button("Clear from history").clicked() {
                    config.data.last_snapshot_path = None;
                    config.dirty = true;
                    save_events.write(SaveConfigRequest);
                    warning.show = false;
                }
            });
        });

    Ok(())
}

/// Tells the user their config file could not be used
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
            ui.label("Your configuration could not be loaded and was reset to defaults.");
            if let Some(ref reason) = notification.reason {
                ui.add_space(5.0);
                ui.label(egui::RichText::new(reason).weak());
            }
            ui.add_space(10.0);
            if ui.button("OK").clicked() {
                notification.show = false;
                notification.reason = None;
            }
        });

    Ok(())
}
