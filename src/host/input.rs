//! Feeds the camera and raw input into the fog engine.

use bevy::prelude::*;
use bevy_egui::EguiContexts;

use crate::engine::FogEngine;
use crate::tools::{FogKey, PointerButton};
use crate::ui::DialogState;

use super::params::{CameraParams, is_cursor_over_ui, ui_wants_keyboard};

/// Mirror the camera into the engine viewport
pub fn sync_viewport(camera_params: CameraParams, mut engine: ResMut<FogEngine>) {
    let Some(viewport) = camera_params.fog_viewport() else {
        return;
    };
    if *engine.viewport() != viewport {
        engine.set_viewport(viewport);
    }
}

/// Translate mouse and keyboard input into engine pointer and key calls.
///
/// Positions are converted to fog surface pixels through the current viewport so the
/// engine sees the same coordinates any other surface would hand it.
pub fn handle_fog_input(
    mouse_button: Res<ButtonInput<MouseButton>>,
    keyboard: Res<ButtonInput<KeyCode>>,
    camera_params: CameraParams,
    mut contexts: EguiContexts,
    dialog_state: Option<Res<DialogState>>,
    mut engine: ResMut<FogEngine>,
    mut last_cursor: Local<Option<Vec2>>,
) {
    let modal_open = dialog_state.is_some_and(|d| d.any_modal_open);

    if !modal_open && !ui_wants_keyboard(&mut contexts) {
        for key in keyboard.get_just_pressed() {
            if let Some(key) = FogKey::from_key_code(*key) {
                engine.key_pressed(key);
            }
        }
    }

    let Some(world_pos) = camera_params.cursor_world_pos() else {
        *last_cursor = None;
        return;
    };
    let over_ui = is_cursor_over_ui(&mut contexts);
    let moved = *last_cursor != Some(world_pos);
    *last_cursor = Some(world_pos);

    let screen = engine.viewport().world_to_screen(world_pos);
    let pressed: Vec<_> = mouse_button
        .get_just_pressed()
        .filter_map(|button| PointerButton::from_mouse(*button))
        .collect();
    let released: Vec<_> = mouse_button
        .get_just_released()
        .filter_map(|button| PointerButton::from_mouse(*button))
        .collect();

    dispatch_pointer(
        &mut engine,
        &PointerFrame {
            screen,
            pressed: &pressed,
            released: &released,
            moved,
            presses_allowed: !modal_open && !over_ui,
            over_ui,
        },
    );
}

/// Pointer input gathered for one frame
pub(crate) struct PointerFrame<'a> {
    pub screen: Vec2,
    pub pressed: &'a [PointerButton],
    pub released: &'a [PointerButton],
    pub moved: bool,
    /// False while a dialog is open or the cursor is over a panel
    pub presses_allowed: bool,
    pub over_ui: bool,
}

/// Feed one frame of pointer input to the engine.
///
/// Presses go before moves and releases, so a click that starts and ends within one
/// frame still reaches the engine as down then up.
pub(crate) fn dispatch_pointer(engine: &mut FogEngine, frame: &PointerFrame<'_>) {
    if frame.presses_allowed {
        for button in frame.pressed {
            engine.pointer_down(frame.screen, *button);
        }
    }

    if frame.moved && (engine.is_interacting() || !frame.over_ui) {
        engine.pointer_move(frame.screen);
    }

    // Releases always reach the engine so a drag ending over a panel still finishes
    for button in frame.released {
        engine.pointer_up(frame.screen, *button);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fog::{RegionOptions, ShapeKind};
    use crate::tools::FogTool;

    fn click(engine: &mut FogEngine, screen: Vec2) {
        let buttons = [PointerButton::Primary];
        dispatch_pointer(
            engine,
            &PointerFrame {
                screen,
                pressed: &buttons,
                released: &buttons,
                moved: true,
                presses_allowed: true,
                over_ui: false,
            },
        );
    }

    #[test]
    fn test_click_within_one_frame_ends_the_drag() {
        let mut engine = FogEngine::default();
        let id = engine
            .create_region(
                ShapeKind::Circle,
                &[Vec2::ZERO, Vec2::new(10.0, 0.0)],
                RegionOptions::default(),
            )
            .unwrap();
        engine.set_tool(FogTool::Select);

        click(&mut engine, Vec2::ZERO);
        assert_eq!(engine.selected_region(), Some(id));
        assert!(!engine.is_interacting());

        // Later moves with no button held leave the region where it was
        let before = engine.region(id).unwrap().shape.clone();
        engine.pointer_move(Vec2::new(50.0, 50.0));
        assert_eq!(engine.region(id).unwrap().shape, before);
    }

    #[test]
    fn test_click_within_one_frame_does_not_leave_a_drawing() {
        let mut engine = FogEngine::default();
        engine.set_tool(FogTool::Rectangle);

        click(&mut engine, Vec2::new(5.0, 5.0));
        assert!(!engine.is_interacting());
        assert!(engine.drawing_preview().is_none());
        // Zero-size drag is discarded
        assert_eq!(engine.region_count(), 0);
    }

    #[test]
    fn test_release_over_panel_still_finishes_drawing() {
        let mut engine = FogEngine::default();
        engine.set_tool(FogTool::Rectangle);
        engine.pointer_down(Vec2::ZERO, PointerButton::Primary);

        let released = [PointerButton::Primary];
        dispatch_pointer(
            &mut engine,
            &PointerFrame {
                screen: Vec2::new(40.0, 30.0),
                pressed: &[],
                released: &released,
                moved: true,
                presses_allowed: false,
                over_ui: true,
            },
        );
        assert!(!engine.is_interacting());
        assert_eq!(engine.region_count(), 1);
    }
}
