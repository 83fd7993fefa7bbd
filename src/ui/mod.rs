pub mod file_menu;
mod fog_panel;
mod toolbar;

use bevy::prelude::*;
use bevy_egui::EguiPrimaryContextPass;

use crate::config::{ConfigResetNotification, MissingSnapshotWarning};
use crate::host::{AsyncSnapshotOperation, SnapshotLoadError, SnapshotSaveError};

/// Resource that tracks whether any modal dialog is currently open.
/// Fog input handlers check this to avoid drawing on the map
/// while the user is interacting with a dialog.
#[derive(Resource, Default)]
pub struct DialogState {
    /// True when any modal dialog is open that should block fog input
    pub any_modal_open: bool,
}

/// System to aggregate all dialog open states into a single resource.
/// Runs in First schedule before input handlers.
fn update_dialog_state(
    file_menu: Res<file_menu::FileMenuState>,
    missing_snapshot: Res<MissingSnapshotWarning>,
    config_reset: Res<ConfigResetNotification>,
    save_error: Res<SnapshotSaveError>,
    load_error: Res<SnapshotLoadError>,
    async_op: Res<AsyncSnapshotOperation>,
    mut dialog_state: ResMut<DialogState>,
) {
    dialog_state.any_modal_open = file_menu.show_clear_confirmation
        || missing_snapshot.show
        || config_reset.show
        || save_error.message.is_some()
        || load_error.message.is_some()
        || async_op.is_busy();
}

pub struct UiPlugin;

impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<DialogState>()
            .init_resource::<file_menu::FileMenuState>()
            // Side panel must render first so top panels fit beside it
            .add_systems(
                EguiPrimaryContextPass,
                (
                    fog_panel::fog_panel_ui,
                    toolbar::toolbar_ui,
                    toolbar::tool_hint_ui,
                )
                    .chain(),
            )
            .add_systems(
                EguiPrimaryContextPass,
                (
                    // Last: dialogs/overlays
                    file_menu::file_menu_ui,
                    file_menu::save_error_dialog_ui,
                    file_menu::async_operation_modal_ui,
                    file_menu::missing_snapshot_warning_ui,
                    file_menu::config_reset_notification_ui,
                )
                    .after(toolbar::tool_hint_ui),
            )
            // Update dialog state at the start of each frame
            .add_systems(First, update_dialog_state);
    }
}
