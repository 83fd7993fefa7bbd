//! Fog authoring tools and the pointer/keyboard state machine that drives them.

mod machine;


use std::fmt;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

pub use machine::{DragState, DrawingPreview, DrawingState, ToolCommand, ToolStateMachine};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FogTool {
    #[default]
    Select,
    Reveal,
    Hide,
    Polygon,
    Circle,
    Rectangle,
}

impl FogTool {
    pub fn display_name(&self) -> &'static str {
        match self {
            FogTool::Select => "Select (1)",
            FogTool::Reveal => "Reveal (2)",
            FogTool::Hide => "Hide (3)",
            FogTool::Polygon => "Polygon (4)",
            FogTool::Circle => "Circle (5)",
            FogTool::Rectangle => "Rectangle (6)",
        }
    }

    pub fn all() -> &'static [FogTool] {
        &[
            FogTool::Select,
            FogTool::Reveal,
            FogTool::Hide,
            FogTool::Polygon,
            FogTool::Circle,
            FogTool::Rectangle,
        ]
    }

    /// Digit key bound to this tool
    pub fn shortcut(&self) -> u8 {
        match self {
            FogTool::Select => 1,
            FogTool::Reveal => 2,
            FogTool::Hide => 3,
            FogTool::Polygon => 4,
            FogTool::Circle => 5,
            FogTool::Rectangle => 6,
        }
    }

    pub fn from_shortcut(digit: u8) -> Option<FogTool> {
        FogTool::all()
            .iter()
            .copied()
            .find(|tool| tool.shortcut() == digit)
    }

    pub fn is_drawing_tool(&self) -> bool {
        matches!(self, FogTool::Polygon | FogTool::Circle | FogTool::Rectangle)
    }
}

impl fmt::Display for FogTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

impl PointerButton {
    pub fn from_mouse(button: MouseButton) -> Option<Self> {
        match button {
            MouseButton::Left => Some(PointerButton::Primary),
            MouseButton::Right => Some(PointerButton::Secondary),
            MouseButton::Middle => Some(PointerButton::Middle),
            _ => None,
        }
    }
}

/// Keys the state machine reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FogKey {
    /// Tool shortcut, 1 to 6
    Digit(u8),
    Escape,
    /// Delete or Backspace
    Delete,
    Enter,
}

impl FogKey {
    pub fn from_key_code(key: KeyCode) -> Option<Self> {
        match key {
            KeyCode::Digit1 | KeyCode::Numpad1 => Some(FogKey::Digit(1)),
            KeyCode::Digit2 | KeyCode::Numpad2 => Some(FogKey::Digit(2)),
            KeyCode::Digit3 | KeyCode::Numpad3 => Some(FogKey::Digit(3)),
            KeyCode::Digit4 | KeyCode::Numpad4 => Some(FogKey::Digit(4)),
            KeyCode::Digit5 | KeyCode::Numpad5 => Some(FogKey::Digit(5)),
            KeyCode::Digit6 | KeyCode::Numpad6 => Some(FogKey::Digit(6)),
            KeyCode::Escape => Some(FogKey::Escape),
            KeyCode::Delete | KeyCode::Backspace => Some(FogKey::Delete),
            KeyCode::Enter | KeyCode::NumpadEnter => Some(FogKey::Enter),
            _ => None,
        }
    }
}
