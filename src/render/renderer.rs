//! Frame compositor.
//!
//! Each frame queries the spatial index for the viewport and fills the visible regions
//! onto the surface. A dirty flag skips frames where nothing changed. At ultra quality
//! an attached GPU compositor is tried first; a failed attempt draws that frame in 2D.

use bevy::prelude::*;

use crate::constants::{
    PREVIEW_DASH, PREVIEW_OPACITY, PREVIEW_STROKE_WIDTH, SELECTION_STROKE_WIDTH,
};
use crate::fog::{FogSettings, PatternKind, RegionId, RegionStore, Viewport};
use crate::theme;
use crate::tools::DrawingPreview;

use super::cache::{RenderCache, outline_of};
use super::pattern::PatternCache;
use super::stats::FpsCounter;
use super::surface::{
    FillStyle, FogSurface, GpuCompositor, Paint, ScreenPath, ScreenRegion, StrokeStyle,
    SurfaceError,
};

/// Everything a frame needs from the engine
pub struct FrameInput<'a> {
    pub store: &'a RegionStore,
    pub settings: &'a FogSettings,
    pub viewport: &'a Viewport,
    pub preview: Option<DrawingPreview>,
    /// Region outlined as selected
    pub highlight: Option<RegionId>,
    /// A drawing, drag or animation is in progress
    pub busy: bool,
    pub now_ms: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Nothing changed since the last frame
    Skipped,
    /// No surface attached; the frame stays pending
    NoSurface,
    /// The surface rejected a draw call; the frame stays pending
    Failed,
    /// Surface cleared with nothing on it
    Cleared,
    Drawn { regions: usize, gpu: bool },
}

#[derive(Default)]
pub struct FogRenderer {
    dirty: bool,
    cache: RenderCache,
    patterns: PatternCache,
    fps: FpsCounter,
    gpu: Option<Box<dyn GpuCompositor>>,
    gpu_active: bool,
    /// Set once the missing GPU fallback has been logged
    gpu_fallback_logged: bool,
    /// Set while the compositor keeps failing, so the warning is logged once per streak
    gpu_failing: bool,
    pattern_failed: bool,
    visible_regions: usize,
}

impl std::fmt::Debug for FogRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FogRenderer")
            .field("dirty", &self.dirty)
            .field("cache", &self.cache)
            .field("patterns", &self.patterns.len())
            .field("gpu", &self.gpu.as_ref().map(|gpu| gpu.name().to_string()))
            .field("gpu_active", &self.gpu_active)
            .field("visible_regions", &self.visible_regions)
            .finish()
    }
}

impl FogRenderer {
    pub fn new() -> Self {
        Self {
            dirty: true,
            ..default()
        }
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Drop the cached artifacts of one region and schedule a redraw
    pub fn invalidate(&mut self, id: RegionId) {
        self.cache.invalidate(id);
        self.dirty = true;
    }

    /// Drop every cached outline, keeping pattern tiles
    pub fn invalidate_all(&mut self) {
        self.cache.clear();
        self.dirty = true;
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
        self.patterns.clear();
        self.dirty = true;
    }

    pub fn attach_gpu(&mut self, gpu: Option<Box<dyn GpuCompositor>>) {
        match &gpu {
            Some(compositor) => info!("GPU compositor available: {}", compositor.name()),
            None => debug!("No GPU compositor, using 2D path"),
        }
        self.gpu = gpu;
        self.gpu_active = false;
        self.gpu_fallback_logged = false;
        self.gpu_failing = false;
        self.dirty = true;
    }

    /// Release everything tied to a surface
    pub fn reset(&mut self) {
        self.gpu = None;
        self.gpu_active = false;
        self.cache.clear();
        self.patterns.clear();
        self.fps.reset();
        self.visible_regions = 0;
        self.dirty = true;
    }

    pub fn fps(&self) -> f32 {
        self.fps.fps()
    }

    pub fn visible_regions(&self) -> usize {
        self.visible_regions
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }

    pub fn gpu_active(&self) -> bool {
        self.gpu_active
    }

    pub fn has_gpu(&self) -> bool {
        self.gpu.is_some()
    }

    pub fn render(
        &mut self,
        surface: Option<&mut (dyn FogSurface + 'static)>,
        input: FrameInput<'_>,
    ) -> FrameOutcome {
        self.fps.record(input.now_ms);

        if !self.dirty && !input.busy {
            return FrameOutcome::Skipped;
        }
        let Some(surface) = surface else {
            return FrameOutcome::NoSurface;
        };

        match self.draw(surface, &input) {
            Ok(outcome) => {
                self.dirty = false;
                outcome
            }
            Err(e) => {
                warn!("Fog frame failed, will retry: {}", e);
                FrameOutcome::Failed
            }
        }
    }

    fn draw(
        &mut self,
        surface: &mut dyn FogSurface,
        input: &FrameInput<'_>,
    ) -> Result<FrameOutcome, SurfaceError> {
        let settings = input.settings;
        let viewport = input.viewport;

        surface.clear()?;

        if !settings.enabled {
            self.visible_regions = 0;
            self.gpu_active = false;
            surface.present()?;
            return Ok(FrameOutcome::Cleared);
        }

        let regions: Vec<_> = input
            .store
            .query(viewport.world_rect())
            .into_iter()
            .map(|region| (region, region.opacity * settings.global_opacity))
            .filter(|(_, opacity)| *opacity > 0.0)
            .collect();
        self.visible_regions = regions.len();

        if regions.is_empty() && input.preview.is_none() && input.highlight.is_none() {
            self.gpu_active = false;
            surface.present()?;
            return Ok(FrameOutcome::Cleared);
        }

        let quality = settings.quality;
        let mut screen_regions = Vec::with_capacity(regions.len());
        for (region, opacity) in &regions {
            let points = self
                .cache
                .outline(region, quality)
                .iter()
                .map(|p| viewport.world_to_screen(*p))
                .collect();
            screen_regions.push(ScreenRegion {
                id: region.id,
                path: ScreenPath::closed(points),
                opacity: *opacity,
            });
        }

        let gpu = quality.wants_gpu() && self.composite_gpu(&screen_regions, settings);
        if !gpu {
            let paint = self.paint(settings);
            let blur = settings.effective_blur();
            for region in &screen_regions {
                surface.fill_path(
                    &region.path,
                    &FillStyle {
                        paint: paint.clone(),
                        opacity: region.opacity,
                        blur,
                    },
                )?;
            }
        }

        if let Some(region) = input.highlight.and_then(|id| input.store.get(id)) {
            let points = self
                .cache
                .outline(region, quality)
                .iter()
                .map(|p| viewport.world_to_screen(*p))
                .collect();
            surface.stroke_path(
                &ScreenPath::closed(points),
                &StrokeStyle {
                    color: theme::SELECTION_COLOR,
                    opacity: 1.0,
                    width: SELECTION_STROKE_WIDTH,
                    dash: None,
                },
            )?;
        }

        if let Some(preview) = &input.preview {
            let (outline, closed) = match preview {
                DrawingPreview::Shape(shape) => (outline_of(shape, quality.circle_segments()), true),
                DrawingPreview::Polyline(points) => (points.clone(), false),
            };
            let path = ScreenPath {
                points: outline
                    .into_iter()
                    .map(|p| viewport.world_to_screen(p))
                    .collect(),
                closed,
            };
            surface.stroke_path(
                &path,
                &StrokeStyle {
                    color: theme::PREVIEW_OUTLINE,
                    opacity: PREVIEW_OPACITY,
                    width: PREVIEW_STROKE_WIDTH,
                    dash: Some(PREVIEW_DASH),
                },
            )?;
        }

        surface.present()?;
        Ok(FrameOutcome::Drawn {
            regions: screen_regions.len(),
            gpu,
        })
    }

    /// Try the GPU path. Returns false when the 2D path has to draw this frame.
    fn composite_gpu(&mut self, regions: &[ScreenRegion], settings: &FogSettings) -> bool {
        let Some(gpu) = self.gpu.as_mut() else {
            if !self.gpu_fallback_logged {
                warn!("Ultra quality requested but no GPU compositor is available, using 2D path");
                self.gpu_fallback_logged = true;
            }
            self.gpu_active = false;
            return false;
        };

        // A failure only costs this frame; the next frame tries the compositor again
        match gpu.composite(regions, settings) {
            Ok(()) => {
                if self.gpu_failing {
                    info!("GPU compositor {} recovered", gpu.name());
                    self.gpu_failing = false;
                }
                self.gpu_active = true;
                true
            }
            Err(e) => {
                if !self.gpu_failing {
                    warn!("GPU compositor {} failed, drawing this frame in 2D: {}", gpu.name(), e);
                    self.gpu_failing = true;
                } else {
                    debug!("GPU compositor {} still failing: {}", gpu.name(), e);
                }
                self.gpu_active = false;
                false
            }
        }
    }

    fn paint(&mut self, settings: &FogSettings) -> Paint {
        if settings.pattern == PatternKind::Solid {
            return Paint::Solid(settings.color);
        }
        match self
            .patterns
            .get_or_create(settings.pattern, settings.pattern_scale, settings.color)
        {
            Ok(tile) => {
                self.pattern_failed = false;
                Paint::Pattern(tile)
            }
            Err(e) => {
                if !self.pattern_failed {
                    warn!("Falling back to solid fog fill: {}", e);
                    self.pattern_failed = true;
                }
                Paint::Solid(settings.color)
            }
        }
    }
}
