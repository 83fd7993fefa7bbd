//! Pointer and keyboard state machine for the fog tools.
//!
//! The machine never touches the region store directly: it reads it for hit tests and
//! returns [`ToolCommand`]s that the engine applies.

use bevy::prelude::*;

use crate::constants::MIN_SHAPE_SIZE;
use crate::fog::{RegionId, RegionShape, RegionStore, ShapeKind};

use super::{FogKey, FogTool, PointerButton};

/// Mutation requested by the state machine, applied by the engine
#[derive(Debug, Clone, PartialEq)]
pub enum ToolCommand {
    Create { kind: ShapeKind, points: Vec<Vec2> },
    /// Move a region to an already translated shape
    Translate { id: RegionId, shape: RegionShape },
    Reveal(RegionId),
    Hide(RegionId),
    Remove(RegionId),
    Select(Option<RegionId>),
    SwitchTool(FogTool),
}

/// Points collected by a drawing tool since pointer-down
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrawingState {
    pub points: Vec<Vec2>,
    /// Last pointer position, used for the polygon rubber band
    pub hover: Option<Vec2>,
}

impl DrawingState {
    pub fn is_active(&self) -> bool {
        !self.points.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DragState {
    pub is_dragging: bool,
    pub region: Option<RegionId>,
    pub last_pointer: Vec2,
}

/// Outline of the shape currently being drawn, in world coordinates
#[derive(Debug, Clone, PartialEq)]
pub enum DrawingPreview {
    Shape(RegionShape),
    /// Open polygon: placed vertices followed by the pointer position
    Polyline(Vec<Vec2>),
}

#[derive(Debug, Default)]
pub struct ToolStateMachine {
    tool: FogTool,
    drawing: DrawingState,
    drag: DragState,
    selected: Option<RegionId>,
}

impl ToolStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tool(&self) -> FogTool {
        self.tool
    }

    pub fn selected(&self) -> Option<RegionId> {
        self.selected
    }

    pub fn drawing(&self) -> &DrawingState {
        &self.drawing
    }

    pub fn drag(&self) -> &DragState {
        &self.drag
    }

    /// Whether a drawing or drag is in progress
    pub fn is_busy(&self) -> bool {
        self.drawing.is_active() || self.drag.is_dragging
    }

    /// Switch tools, cancelling in-progress work and clearing the selection.
    ///
    /// Returns false if `tool` was already active.
    pub fn set_tool(&mut self, tool: FogTool) -> bool {
        if tool == self.tool {
            return false;
        }
        self.cancel();
        self.selected = None;
        self.tool = tool;
        true
    }

    /// Drop the in-progress drawing and drag. Returns true if anything was dropped.
    pub fn cancel(&mut self) -> bool {
        let busy = self.is_busy();
        self.drawing = DrawingState::default();
        self.drag = DragState::default();
        busy
    }

    /// Select a region directly (region list, host UI). Returns true if the selection changed.
    pub fn select(&mut self, id: Option<RegionId>) -> bool {
        if self.selected == id {
            return false;
        }
        self.selected = id;
        true
    }

    /// Forget a region that no longer exists. Returns true if it was selected.
    pub fn forget_region(&mut self, id: RegionId) -> bool {
        if self.drag.region == Some(id) {
            self.drag = DragState::default();
        }
        if self.selected == Some(id) {
            self.selected = None;
            return true;
        }
        false
    }

    pub fn pointer_down(
        &mut self,
        world: Vec2,
        button: PointerButton,
        store: &RegionStore,
    ) -> Vec<ToolCommand> {
        match button {
            PointerButton::Primary => {}
            PointerButton::Secondary if self.tool == FogTool::Polygon => return self.complete(),
            PointerButton::Secondary | PointerButton::Middle => return Vec::new(),
        }

        match self.tool {
            FogTool::Select => {
                let hit = store.topmost_at(world);
                if let Some(id) = hit {
                    self.drag = DragState {
                        is_dragging: true,
                        region: Some(id),
                        last_pointer: world,
                    };
                }
                if hit != self.selected {
                    self.selected = hit;
                    return vec![ToolCommand::Select(hit)];
                }
                Vec::new()
            }
            FogTool::Reveal => store
                .regions_at(world)
                .iter()
                .map(|region| ToolCommand::Reveal(region.id))
                .collect(),
            FogTool::Hide => store
                .regions_at(world)
                .iter()
                .map(|region| ToolCommand::Hide(region.id))
                .collect(),
            FogTool::Polygon => {
                self.drawing.points.push(world);
                self.drawing.hover = Some(world);
                Vec::new()
            }
            FogTool::Circle | FogTool::Rectangle => {
                self.drawing = DrawingState {
                    points: vec![world, world],
                    hover: Some(world),
                };
                Vec::new()
            }
        }
    }

    pub fn pointer_move(&mut self, world: Vec2, store: &RegionStore) -> Vec<ToolCommand> {
        if self.drawing.is_active() {
            self.drawing.hover = Some(world);
        }

        match self.tool {
            FogTool::Select if self.drag.is_dragging => {
                let Some(region) = self.drag.region.and_then(|id| store.get(id)) else {
                    return Vec::new();
                };
                let delta = world - self.drag.last_pointer;
                if delta == Vec2::ZERO {
                    return Vec::new();
                }
                self.drag.last_pointer = world;
                vec![ToolCommand::Translate {
                    id: region.id,
                    shape: region.shape.translated(delta),
                }]
            }
            FogTool::Circle | FogTool::Rectangle if self.drawing.points.len() == 2 => {
                self.drawing.points[1] = world;
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    pub fn pointer_up(&mut self, world: Vec2, button: PointerButton) -> Vec<ToolCommand> {
        if button != PointerButton::Primary {
            return Vec::new();
        }

        match self.tool {
            FogTool::Select => {
                self.drag = DragState::default();
                Vec::new()
            }
            FogTool::Circle | FogTool::Rectangle => {
                let drawing = std::mem::take(&mut self.drawing);
                let &[start, _] = drawing.points.as_slice() else {
                    return Vec::new();
                };
                let end = world;
                let kind = if self.tool == FogTool::Circle {
                    ShapeKind::Circle
                } else {
                    ShapeKind::Rectangle
                };

                if is_degenerate(kind, start, end) {
                    debug!("Discarded degenerate {} drag", kind);
                    return Vec::new();
                }
                vec![ToolCommand::Create {
                    kind,
                    points: vec![start, end],
                }]
            }
            _ => Vec::new(),
        }
    }

    pub fn key_pressed(&mut self, key: FogKey) -> Vec<ToolCommand> {
        match key {
            FogKey::Digit(digit) => FogTool::from_shortcut(digit)
                .map(|tool| vec![ToolCommand::SwitchTool(tool)])
                .unwrap_or_default(),
            FogKey::Escape => {
                self.cancel();
                Vec::new()
            }
            FogKey::Delete => {
                let Some(id) = self.drag.region.or(self.selected) else {
                    return Vec::new();
                };
                self.drag = DragState::default();
                self.selected = None;
                vec![ToolCommand::Remove(id), ToolCommand::Select(None)]
            }
            FogKey::Enter => self.complete(),
        }
    }

    /// Finish the polygon being drawn.
    ///
    /// Fewer than three points is a normal interaction (double click, stray right
    /// click) and the drawing is dropped without creating anything.
    pub fn complete(&mut self) -> Vec<ToolCommand> {
        if self.tool != FogTool::Polygon {
            return Vec::new();
        }
        let drawing = std::mem::take(&mut self.drawing);
        if drawing.points.len() < ShapeKind::Polygon.min_points() {
            if drawing.is_active() {
                debug!(
                    "Discarded polygon with {} points",
                    drawing.points.len()
                );
            }
            return Vec::new();
        }
        vec![ToolCommand::Create {
            kind: ShapeKind::Polygon,
            points: drawing.points,
        }]
    }

    pub fn preview(&self) -> Option<DrawingPreview> {
        if !self.drawing.is_active() {
            return None;
        }
        match self.tool {
            FogTool::Circle => {
                RegionShape::from_points(ShapeKind::Circle, &self.drawing.points)
                    .ok()
                    .map(DrawingPreview::Shape)
            }
            FogTool::Rectangle => {
                RegionShape::from_points(ShapeKind::Rectangle, &self.drawing.points)
                    .ok()
                    .map(DrawingPreview::Shape)
            }
            FogTool::Polygon => {
                let mut points = self.drawing.points.clone();
                if let Some(hover) = self.drawing.hover
                    && points.last() != Some(&hover)
                {
                    points.push(hover);
                }
                Some(DrawingPreview::Polyline(points))
            }
            _ => None,
        }
    }
}

/// Drags too small to be intentional
fn is_degenerate(kind: ShapeKind, start: Vec2, end: Vec2) -> bool {
    match kind {
        ShapeKind::Circle => start.distance(end) < MIN_SHAPE_SIZE,
        _ => {
            let size = (end - start).abs();
            size.x < MIN_SHAPE_SIZE || size.y < MIN_SHAPE_SIZE
        }
    }
}
