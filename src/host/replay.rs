//! Gizmo replay of the fog display list.
//!
//! The engine draws into a [`DisplayListSurface`]; this module turns each presented
//! frame into world-space line segments once (fills become horizontal scanlines, the
//! same way the map editor shades fog cells) and redraws the cached segments with
//! gizmos every frame until the engine presents a new list.
//!
//! Edge blur is not reproduced here; a surface with real compositing would apply it.

use bevy::gizmos::config::{GizmoConfigGroup, GizmoConfigStore};
use bevy::prelude::*;

use crate::constants::SCANLINE_SPACING;
use crate::engine::FogEngine;
use crate::fog::Viewport;
use crate::render::{DisplayListSurface, DrawCommand, FillStyle, Paint, ScreenPath, StrokeStyle};

/// Gizmo group for the fog overlay
#[derive(Default, Reflect, GizmoConfigGroup)]
pub struct FogGizmoGroup;

/// Lines slightly wider than the scanline spacing so rows overlap without gaps
pub fn configure_fog_gizmos(mut config_store: ResMut<GizmoConfigStore>) {
    let (config, _) = config_store.config_mut::<FogGizmoGroup>();
    config.line.width = SCANLINE_SPACING + 0.5;
}

/// Line segment in surface or world coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start: Vec2,
    pub end: Vec2,
    pub color: Color,
}

/// Reader side of the engine's surface plus the segments built from its last frame
#[derive(Resource)]
pub struct FogReplay {
    surface: DisplayListSurface,
    generation: u64,
    segments: Vec<Segment>,
}

impl FogReplay {
    pub fn new(surface: DisplayListSurface) -> Self {
        Self {
            surface,
            generation: 0,
            segments: Vec::new(),
        }
    }

    /// Rebuild the world-space segments if the engine presented a new frame
    fn refresh(&mut self, viewport: &Viewport) {
        let generation = self.surface.generation();
        if generation == self.generation {
            return;
        }
        self.generation = generation;

        self.segments.clear();
        for command in self.surface.commands() {
            let screen = match &command {
                DrawCommand::Fill { path, style } => {
                    fill_segments(path, style, Vec2::new(viewport.width, viewport.height))
                }
                DrawCommand::Stroke { path, style } => stroke_segments(path, style),
            };
            self.segments
                .extend(screen.into_iter().map(|segment| Segment {
                    start: viewport.screen_to_world(segment.start),
                    end: viewport.screen_to_world(segment.end),
                    color: segment.color,
                }));
        }
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }
}

pub fn draw_fog_overlay(
    mut gizmos: Gizmos<FogGizmoGroup>,
    mut replay: ResMut<FogReplay>,
    engine: Res<FogEngine>,
) {
    replay.refresh(engine.viewport());
    for segment in &replay.segments {
        gizmos.line_2d(segment.start, segment.end, segment.color);
    }
}

// ============================================================================
// Rasterization helpers (surface pixel space)
// ============================================================================

/// Interior spans of a closed polygon on a horizontal line (even-odd rule)
pub fn scanline_spans(points: &[Vec2], y: f32) -> Vec<(f32, f32)> {
    let mut crossings: Vec<f32> = Vec::new();
    let n = points.len();
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        if (a.y > y) != (b.y > y) {
            crossings.push(a.x + (y - a.y) * (b.x - a.x) / (b.y - a.y));
        }
    }
    crossings.sort_by(f32::total_cmp);
    crossings
        .chunks_exact(2)
        .map(|pair| (pair[0], pair[1]))
        .filter(|(start, end)| end > start)
        .collect()
}

/// Scanline segments filling `path`, clipped to a surface of `surface_size` pixels
pub fn fill_segments(path: &ScreenPath, style: &FillStyle, surface_size: Vec2) -> Vec<Segment> {
    let mut segments = Vec::new();
    if path.points.len() < 3 || style.opacity <= 0.0 {
        return segments;
    }

    let (min_y, max_y) = path
        .points
        .iter()
        .fold((f32::MAX, f32::MIN), |(lo, hi), p| (lo.min(p.y), hi.max(p.y)));
    let max_y = max_y.min(surface_size.y);

    // Stay on the path's scanline grid when skipping rows below the surface
    let mut y = min_y + SCANLINE_SPACING / 2.0;
    if y < 0.0 {
        y += (-y / SCANLINE_SPACING).ceil() * SCANLINE_SPACING;
    }
    while y < max_y {
        let spans = scanline_spans(&path.points, y)
            .into_iter()
            .map(|(start, end)| (start.max(0.0), end.min(surface_size.x)))
            .filter(|(start, end)| end > start);
        for (start, end) in spans {
            match &style.paint {
                Paint::Solid(color) => segments.push(Segment {
                    start: Vec2::new(start, y),
                    end: Vec2::new(end, y),
                    color: color.with_alpha(color.alpha() * style.opacity),
                }),
                Paint::Pattern(tile) => {
                    let [r, g, b, _] = tile.key.rgba;
                    let base = Color::srgb_u8(r, g, b);
                    let sample = |x: f32| tile.alpha_at(Vec2::new(x, y));
                    pattern_runs(start, end, sample, |run_start, run_end, alpha| {
                        segments.push(Segment {
                            start: Vec2::new(run_start, y),
                            end: Vec2::new(run_end, y),
                            color: base.with_alpha(alpha * style.opacity),
                        });
                    });
                }
            }
        }
        y += SCANLINE_SPACING;
    }
    segments
}

/// Split a span into runs of equal sampled alpha, one pixel at a time
fn pattern_runs(
    start: f32,
    end: f32,
    sample: impl Fn(f32) -> f32,
    mut emit: impl FnMut(f32, f32, f32),
) {
    let mut run_start = start;
    let mut run_alpha = sample(start);
    let mut x = start.floor() + 1.0;
    while x < end {
        let alpha = sample(x);
        if alpha != run_alpha {
            if run_alpha > 0.0 {
                emit(run_start, x, run_alpha);
            }
            run_start = x;
            run_alpha = alpha;
        }
        x += 1.0;
    }
    if run_alpha > 0.0 {
        emit(run_start, end, run_alpha);
    }
}

pub fn stroke_segments(path: &ScreenPath, style: &StrokeStyle) -> Vec<Segment> {
    let color = style
        .color
        .with_alpha(style.color.alpha() * style.opacity);
    let mut edges: Vec<(Vec2, Vec2)> = path.points.windows(2).map(|w| (w[0], w[1])).collect();
    if path.closed
        && path.points.len() > 2
        && let (Some(first), Some(last)) = (path.points.first(), path.points.last())
    {
        edges.push((*last, *first));
    }

    let pieces = match style.dash {
        Some(dash) => dash_edges(&edges, dash),
        None => edges,
    };
    pieces
        .into_iter()
        .map(|(start, end)| Segment { start, end, color })
        .collect()
}

/// Cut a polyline into dashes; the dash pattern continues across corners
fn dash_edges(edges: &[(Vec2, Vec2)], [dash, gap]: [f32; 2]) -> Vec<(Vec2, Vec2)> {
    if dash <= 0.0 || gap < 0.0 {
        return edges.to_vec();
    }

    let period = dash + gap;
    let mut pieces = Vec::new();
    let mut phase = 0.0_f32;
    for &(a, b) in edges {
        let length = a.distance(b);
        if length <= f32::EPSILON {
            continue;
        }
        let dir = (b - a) / length;
        let mut t = 0.0;
        while t < length {
            let in_dash = phase < dash;
            let remaining = if in_dash { dash - phase } else { period - phase };
            let step = remaining.min(length - t);
            if in_dash {
                pieces.push((a + dir * t, a + dir * (t + step)));
            }
            t += step;
            phase = (phase + step) % period;
        }
    }
    pieces
}
