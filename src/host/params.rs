//! SystemParam bundles shared by the host systems.
//!
//! - [`CameraParams`]: camera and window access for cursor-to-world conversion and the
//!   fog viewport derived from the camera
//! - [`is_cursor_over_ui`]: input gating against egui panels

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use bevy_egui::EguiContexts;

use crate::fog::Viewport;

use super::camera::{CameraZoom, MapCamera};

#[derive(SystemParam)]
pub struct CameraParams<'w, 's> {
    pub window: Query<'w, 's, &'static Window, With<PrimaryWindow>>,
    pub camera: Query<
        'w,
        's,
        (&'static Camera, &'static GlobalTransform, &'static CameraZoom),
        With<MapCamera>,
    >,
}

impl CameraParams<'_, '_> {
    /// Get the world position of the cursor, if available
    pub fn cursor_world_pos(&self) -> Option<Vec2> {
        let window = self.window.single().ok()?;
        let (camera, transform, _) = self.camera.single().ok()?;
        let cursor_pos = window.cursor_position()?;
        camera.viewport_to_world_2d(transform, cursor_pos).ok()
    }

    /// The fog viewport covering what the camera shows.
    ///
    /// The fog surface uses a y-up pixel space anchored at the bottom-left corner of the
    /// window, so `viewport.screen_to_world` lands on Bevy world coordinates.
    pub fn fog_viewport(&self) -> Option<Viewport> {
        let window = self.window.single().ok()?;
        let (_, transform, zoom) = self.camera.single().ok()?;
        let size = window.size();
        if size.x <= 0.0 || size.y <= 0.0 || zoom.scale <= 0.0 {
            return None;
        }

        let origin = transform.translation().truncate() - size * zoom.scale / 2.0;
        Some(Viewport {
            x: origin.x,
            y: origin.y,
            width: size.x,
            height: size.y,
            zoom: 1.0 / zoom.scale,
        })
    }
}

/// Check if the cursor is over egui UI
pub fn is_cursor_over_ui(contexts: &mut EguiContexts) -> bool {
    contexts
        .ctx_mut()
        .map(|ctx| ctx.is_pointer_over_area())
        .unwrap_or(false)
}

/// Check if an egui text field has keyboard focus
pub fn ui_wants_keyboard(contexts: &mut EguiContexts) -> bool {
    contexts
        .ctx_mut()
        .map(|ctx| ctx.wants_keyboard_input())
        .unwrap_or(false)
}
