use std::sync::{Arc, Mutex};

use bevy::prelude::*;

use super::*;
use crate::tools::PointerButton;
use crate::fog::{RegionShape, RenderQuality};
use crate::render::{
    DisplayListSurface, DrawCommand, FillStyle, GpuCompositor, ScreenPath, ScreenRegion,
    StrokeStyle, SurfaceError,
};

fn engine_with_surface() -> (FogEngine, DisplayListSurface) {
    let surface = DisplayListSurface::new();
    let mut engine = FogEngine::default();
    engine.initialize(Box::new(surface.clone()));
    (engine, surface)
}

fn record_events(engine: &mut FogEngine) -> Arc<Mutex<Vec<FogEvent>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    engine.subscribe_all(move |event| sink.lock().unwrap().push(event.clone()));
    events
}

fn circle(engine: &mut FogEngine, center: Vec2, radius: f32) -> RegionId {
    engine
        .create_region(
            ShapeKind::Circle,
            &[center, center + Vec2::new(radius, 0.0)],
            RegionOptions::default(),
        )
        .unwrap()
}

fn assert_revealed_tracks_opacity(engine: &FogEngine) {
    for region in engine.regions() {
        assert_eq!(region.is_revealed(), region.opacity < 0.5, "{:?}", region);
    }
}

#[test]
fn test_reveal_without_animation() {
    let mut engine = FogEngine::default();
    let id = circle(&mut engine, Vec2::new(100.0, 100.0), 50.0);
    assert_eq!(engine.region(id).unwrap().opacity, 1.0);

    assert!(engine.reveal_region(id, false));

    let region = engine.region(id).unwrap();
    assert_eq!(region.opacity, 0.0);
    assert!(region.is_revealed());
    assert!(!engine.is_animating(id));
}

#[test]
fn test_animated_reveal_samples_and_completes_once() {
    let mut engine = FogEngine::default();
    let id = circle(&mut engine, Vec2::new(100.0, 100.0), 50.0);
    let events = record_events(&mut engine);

    engine.advance(0.0);
    assert!(engine.reveal_region(id, true));
    assert!(engine.is_animating(id));

    let mut previous = 1.0;
    for t in [100.0, 250.0, 400.0] {
        engine.advance(t);
        let opacity = engine.region(id).unwrap().opacity;
        assert!(opacity > 0.0 && opacity < 1.0, "t={} opacity={}", t, opacity);
        assert!(opacity < previous, "t={} opacity={}", t, opacity);
        previous = opacity;
    }

    engine.advance(500.0);
    engine.advance(600.0);
    assert_eq!(engine.region(id).unwrap().opacity, 0.0);
    assert!(!engine.is_animating(id));

    let events = events.lock().unwrap();
    let completions = events
        .iter()
        .filter(|event| matches!(event, FogEvent::RegionAnimationComplete { id: done, .. } if *done == id))
        .count();
    assert_eq!(completions, 1);
    assert!(events.contains(&FogEvent::RegionRevealed(id)));
}

#[test]
fn test_animation_before_first_advance_starts_at_that_advance() {
    let mut engine = FogEngine::default();
    let id = circle(&mut engine, Vec2::new(100.0, 100.0), 50.0);

    assert!(engine.reveal_region(id, true));
    engine.advance(5_000.0);
    assert!(engine.is_animating(id));
    assert_eq!(engine.region(id).unwrap().opacity, 1.0);

    engine.advance(5_250.0);
    let opacity = engine.region(id).unwrap().opacity;
    assert!(opacity > 0.0 && opacity < 1.0, "opacity={}", opacity);

    engine.advance(5_500.0);
    assert_eq!(engine.region(id).unwrap().opacity, 0.0);
    assert!(!engine.is_animating(id));
}

#[test]
fn test_animation_disabled_by_settings_applies_immediately() {
    let mut engine = FogEngine::default();
    engine.update_settings(|settings| settings.smooth_transitions = false);
    let id = circle(&mut engine, Vec2::ZERO, 10.0);

    engine.reveal_region(id, true);

    assert_eq!(engine.region(id).unwrap().opacity, 0.0);
    assert!(!engine.is_animating(id));
}

#[test]
fn test_hide_twice_emits_once() {
    let mut engine = FogEngine::default();
    let id = circle(&mut engine, Vec2::ZERO, 10.0);
    engine.reveal_region(id, false);
    let events = record_events(&mut engine);

    assert!(engine.hide_region(id, false));
    assert!(engine.hide_region(id, false));

    let hidden = events
        .lock()
        .unwrap()
        .iter()
        .filter(|event| **event == FogEvent::RegionHidden(id))
        .count();
    assert_eq!(hidden, 1);
    assert_eq!(engine.region(id).unwrap().opacity, 1.0);
}

#[test]
fn test_operations_on_missing_region_return_false() {
    let mut engine = FogEngine::default();
    let id = RegionId::new();

    assert!(!engine.reveal_region(id, false));
    assert!(!engine.hide_region(id, true));
    assert!(!engine.toggle_region(id, false));
    assert!(!engine.remove_region(id));
    assert!(!engine.update_region(
        id,
        RegionPatch {
            opacity: Some(0.2),
            ..default()
        }
    ));
    assert!(!engine.animate_opacity(id, 0.0, 100.0));
}

#[test]
fn test_toggle_uses_animation_target() {
    let mut engine = FogEngine::default();
    let id = circle(&mut engine, Vec2::ZERO, 10.0);

    engine.advance(0.0);
    engine.toggle_region(id, true);
    engine.advance(100.0);
    // Still mostly opaque, but heading for revealed
    assert!(engine.region(id).unwrap().opacity > 0.5);

    engine.toggle_region(id, false);
    assert_eq!(engine.region(id).unwrap().opacity, 1.0);
    assert!(!engine.is_animating(id));
}

#[test]
fn test_revealed_flag_holds_after_every_mutator() {
    let mut engine = FogEngine::default();
    let a = circle(&mut engine, Vec2::ZERO, 10.0);
    let b = circle(&mut engine, Vec2::new(100.0, 0.0), 10.0);
    assert_revealed_tracks_opacity(&engine);

    engine.update_region(
        a,
        RegionPatch {
            opacity: Some(0.3),
            ..default()
        },
    );
    assert_revealed_tracks_opacity(&engine);

    engine.toggle_region(b, false);
    assert_revealed_tracks_opacity(&engine);

    engine.advance(0.0);
    engine.hide_all(true);
    for t in [50.0, 250.0, 499.0, 500.0] {
        engine.advance(t);
        assert_revealed_tracks_opacity(&engine);
    }

    engine.reveal_all(false);
    assert_revealed_tracks_opacity(&engine);
    assert!(engine.regions().iter().all(|region| region.opacity == 0.0));
}

#[test]
fn test_remove_cancels_animation_and_selection() {
    let mut engine = FogEngine::default();
    let id = circle(&mut engine, Vec2::ZERO, 10.0);
    engine.pointer_down(Vec2::ZERO, PointerButton::Primary);
    engine.pointer_up(Vec2::ZERO, PointerButton::Primary);
    assert_eq!(engine.selected_region(), Some(id));

    engine.advance(0.0);
    engine.reveal_region(id, true);
    let events = record_events(&mut engine);

    assert!(engine.remove_region(id));

    assert!(!engine.is_animating(id));
    assert_eq!(engine.selected_region(), None);
    let events = events.lock().unwrap();
    assert_eq!(
        events.as_slice(),
        &[FogEvent::RegionRemoved(id), FogEvent::RegionSelected(None)]
    );

    // A stale tick must not resurrect anything
    engine.advance(500.0);
    assert_eq!(engine.region_count(), 0);
}

#[test]
fn test_rejected_nan_region_keeps_export_importable() {
    let mut engine = FogEngine::default();
    circle(&mut engine, Vec2::new(10.0, 20.0), 5.0);
    let result = engine.create_region(
        ShapeKind::Polygon,
        &[Vec2::new(f32::NAN, 0.0), Vec2::new(10.0, 0.0), Vec2::new(0.0, 10.0)],
        RegionOptions::default(),
    );
    assert!(matches!(result, Err(FogError::NonFiniteGeometry { .. })));
    assert_eq!(engine.region_count(), 1);

    let json = engine.export_json().unwrap();
    let mut restored = FogEngine::default();
    assert_eq!(restored.import_json(&json).unwrap(), 1);
}

#[test]
fn test_snapshot_round_trip() {
    let mut engine = FogEngine::default();
    let a = circle(&mut engine, Vec2::new(10.0, 20.0), 5.0);
    engine
        .create_region(
            ShapeKind::Polygon,
            &[Vec2::ZERO, Vec2::new(30.0, 0.0), Vec2::new(15.0, 25.0)],
            RegionOptions {
                name: Some("Cave".to_string()),
                ..default()
            },
        )
        .unwrap();
    engine.reveal_region(a, false);
    engine.update_settings(|settings| {
        settings.global_opacity = 0.75;
        settings.pattern = crate::fog::PatternKind::Dots;
    });
    engine.set_viewport(Viewport {
        x: 40.0,
        y: -10.0,
        zoom: 1.5,
        ..default()
    });
    let json = engine.export_json().unwrap();

    let mut restored = FogEngine::default();
    let events = record_events(&mut restored);
    assert_eq!(restored.import_json(&json).unwrap(), 2);

    let original = engine.export_snapshot();
    let imported = restored.export_snapshot();
    assert_eq!(imported.regions, original.regions);
    assert_eq!(imported.viewport, original.viewport);
    assert_eq!(imported.settings.global_opacity, 0.75);
    assert_eq!(imported.settings.pattern, crate::fog::PatternKind::Dots);
    assert!(restored.region(a).unwrap().is_revealed());
    assert!(
        events
            .lock()
            .unwrap()
            .contains(&FogEvent::DataImported { region_count: 2 })
    );
}

#[test]
fn test_invalid_import_changes_nothing() {
    let mut engine = FogEngine::default();
    let id = circle(&mut engine, Vec2::ZERO, 10.0);
    let before = engine.export_snapshot();

    let mut snapshot = before.clone();
    let duplicate = snapshot.regions[0].clone();
    snapshot.regions.push(duplicate);
    snapshot.settings.global_opacity = 0.1;
    assert!(engine.import_snapshot(snapshot).is_err());

    let mut bad_shape = before.clone();
    bad_shape.regions[0].shape = RegionShape::Polygon {
        points: vec![Vec2::ZERO, Vec2::ONE],
    };
    assert!(engine.import_snapshot(bad_shape).is_err());

    assert!(engine.import_json("{ not json").is_err());
    assert!(engine.import_json(r#"{"version": 99, "regions": []}"#).is_err());

    assert_eq!(engine.export_snapshot(), before);
    assert!(engine.region(id).is_some());
}

#[test]
fn test_clear_regions_reports_ids() {
    let (mut engine, surface) = engine_with_surface();
    let a = circle(&mut engine, Vec2::ZERO, 10.0);
    let b = circle(&mut engine, Vec2::new(50.0, 50.0), 10.0);
    engine.frame(0.0);
    assert_eq!(surface.commands().len(), 2);
    let events = record_events(&mut engine);

    assert_eq!(engine.clear_regions(), vec![a, b]);

    assert_eq!(engine.region_count(), 0);
    assert_eq!(
        events.lock().unwrap().as_slice(),
        &[FogEvent::RegionsCleared(vec![a, b])]
    );
    engine.frame(16.0);
    assert!(surface.commands().is_empty());
}

#[test]
fn test_unsubscribe_stops_delivery() {
    let mut engine = FogEngine::default();
    let count = Arc::new(Mutex::new(0));
    let sink = count.clone();
    let subscription = engine.subscribe(FogEventKind::RegionCreated, move |_| {
        *sink.lock().unwrap() += 1;
    });

    circle(&mut engine, Vec2::ZERO, 10.0);
    assert!(engine.unsubscribe(subscription));
    circle(&mut engine, Vec2::ZERO, 10.0);

    assert_eq!(*count.lock().unwrap(), 1);
    assert!(!engine.unsubscribe(subscription));
}

#[test]
fn test_tool_change_events() {
    let mut engine = FogEngine::default();
    let events = record_events(&mut engine);

    assert!(engine.set_tool(FogTool::Circle));
    assert!(!engine.set_tool(FogTool::Circle));
    engine.key_pressed(FogKey::Digit(6));

    assert_eq!(engine.active_tool(), FogTool::Rectangle);
    assert_eq!(
        events.lock().unwrap().as_slice(),
        &[
            FogEvent::ToolChanged(FogTool::Circle),
            FogEvent::ToolChanged(FogTool::Rectangle),
        ]
    );
}

#[test]
fn test_pointer_input_is_converted_to_world_space() {
    let mut engine = FogEngine::default();
    engine.set_viewport(Viewport {
        x: 100.0,
        y: 100.0,
        zoom: 2.0,
        ..default()
    });
    engine.set_tool(FogTool::Rectangle);

    engine.pointer_down(Vec2::ZERO, PointerButton::Primary);
    engine.pointer_move(Vec2::new(100.0, 100.0));
    assert!(engine.is_interacting());
    engine.pointer_up(Vec2::new(100.0, 100.0), PointerButton::Primary);

    let regions = engine.regions();
    let [region] = regions.as_slice() else {
        panic!("expected one region, got {:?}", regions);
    };
    assert_eq!(
        region.shape,
        RegionShape::Rectangle {
            top_left: Vec2::new(100.0, 100.0),
            bottom_right: Vec2::new(150.0, 150.0),
        }
    );
}

#[test]
fn test_invalid_viewport_is_ignored() {
    let mut engine = FogEngine::default();
    let before = *engine.viewport();

    assert!(!engine.set_viewport(Viewport {
        zoom: 0.0,
        ..default()
    }));
    assert!(!engine.set_viewport(before));
    assert_eq!(*engine.viewport(), before);
}

#[test]
fn test_settings_are_clamped_and_toggle_emits() {
    let mut engine = FogEngine::default();
    let events = record_events(&mut engine);

    assert!(engine.update_settings(|settings| settings.global_opacity = 0.5));
    assert!(engine.update_settings(|settings| settings.global_opacity = 3.0));
    assert_eq!(engine.settings().global_opacity, 1.0);
    assert!(!engine.update_settings(|settings| settings.global_opacity = 1.0));

    assert!(engine.set_enabled(false));
    let events = events.lock().unwrap();
    assert!(events.contains(&FogEvent::FogOfWarToggled(false)));
    assert_eq!(
        events
            .iter()
            .filter(|event| event.kind() == FogEventKind::SettingsUpdated)
            .count(),
        3
    );
}

#[test]
fn test_frames_without_changes_are_skipped() {
    let (mut engine, surface) = engine_with_surface();
    circle(&mut engine, Vec2::new(10.0, 10.0), 5.0);

    assert!(matches!(engine.frame(0.0), FrameOutcome::Drawn { regions: 1, .. }));
    assert_eq!(engine.frame(16.0), FrameOutcome::Skipped);
    assert_eq!(surface.generation(), 1);

    engine.set_viewport(Viewport {
        x: 5.0,
        ..default()
    });
    assert!(matches!(engine.frame(32.0), FrameOutcome::Drawn { .. }));
}

#[test]
fn test_frame_without_surface_is_pending() {
    let mut engine = FogEngine::default();
    circle(&mut engine, Vec2::ZERO, 5.0);
    assert_eq!(engine.frame(0.0), FrameOutcome::NoSurface);
    assert!(!engine.is_initialized());
}

#[test]
fn test_dispose_keeps_regions() {
    let (mut engine, _surface) = engine_with_surface();
    let id = circle(&mut engine, Vec2::ZERO, 5.0);
    engine.advance(0.0);
    engine.reveal_region(id, true);

    engine.dispose();

    assert!(!engine.is_initialized());
    assert!(!engine.is_animating(id));
    assert_eq!(engine.region_count(), 1);
    assert_eq!(engine.frame(16.0), FrameOutcome::NoSurface);
}

// ----------------------------------------------------------------------------
// GPU path
// ----------------------------------------------------------------------------

struct TestGpu {
    /// Number of leading composite calls that fail
    failures: usize,
    calls: Arc<Mutex<usize>>,
}

impl GpuCompositor for TestGpu {
    fn name(&self) -> &str {
        "test"
    }

    fn composite(
        &mut self,
        _regions: &[ScreenRegion],
        _settings: &FogSettings,
    ) -> Result<(), SurfaceError> {
        let mut calls = self.calls.lock().unwrap();
        *calls += 1;
        if *calls <= self.failures {
            Err(SurfaceError::Gpu("device lost".to_string()))
        } else {
            Ok(())
        }
    }
}

/// Recording surface that also hands out a GPU compositor
struct GpuSurface {
    inner: DisplayListSurface,
    gpu: Option<TestGpu>,
}

impl FogSurface for GpuSurface {
    fn clear(&mut self) -> Result<(), SurfaceError> {
        self.inner.clear()
    }

    fn fill_path(&mut self, path: &ScreenPath, style: &FillStyle) -> Result<(), SurfaceError> {
        self.inner.fill_path(path, style)
    }

    fn stroke_path(&mut self, path: &ScreenPath, style: &StrokeStyle) -> Result<(), SurfaceError> {
        self.inner.stroke_path(path, style)
    }

    fn present(&mut self) -> Result<(), SurfaceError> {
        self.inner.present()
    }

    fn acquire_gpu(&mut self) -> Option<Box<dyn GpuCompositor>> {
        self.gpu
            .take()
            .map(|gpu| Box::new(gpu) as Box<dyn GpuCompositor>)
    }
}

fn ultra_engine(gpu: Option<TestGpu>) -> (FogEngine, DisplayListSurface) {
    let inner = DisplayListSurface::new();
    let mut engine = FogEngine::new(
        FogSettings {
            quality: RenderQuality::Ultra,
            ..default()
        },
        IndexConfig::default(),
    );
    engine.initialize(Box::new(GpuSurface {
        inner: inner.clone(),
        gpu,
    }));
    circle(&mut engine, Vec2::new(20.0, 20.0), 10.0);
    (engine, inner)
}

fn fill_count(surface: &DisplayListSurface) -> usize {
    surface
        .commands()
        .iter()
        .filter(|command| matches!(command, DrawCommand::Fill { .. }))
        .count()
}

#[test]
fn test_gpu_path_replaces_2d_fills() {
    let calls = Arc::new(Mutex::new(0));
    let (mut engine, surface) = ultra_engine(Some(TestGpu {
        failures: 0,
        calls: calls.clone(),
    }));

    assert_eq!(
        engine.frame(0.0),
        FrameOutcome::Drawn {
            regions: 1,
            gpu: true
        }
    );
    assert_eq!(fill_count(&surface), 0);
    assert!(engine.metrics().gpu_active);
    assert_eq!(*calls.lock().unwrap(), 1);
}

#[test]
fn test_failing_gpu_falls_back_to_2d_for_that_frame_only() {
    let calls = Arc::new(Mutex::new(0));
    let (mut engine, surface) = ultra_engine(Some(TestGpu {
        failures: 1,
        calls: calls.clone(),
    }));

    assert_eq!(
        engine.frame(0.0),
        FrameOutcome::Drawn {
            regions: 1,
            gpu: false
        }
    );
    assert_eq!(fill_count(&surface), 1);
    assert!(!engine.metrics().gpu_active);

    // The compositor is kept and the next frame tries it again
    engine.update_settings(|settings| settings.global_opacity = 0.5);
    assert_eq!(
        engine.frame(16.0),
        FrameOutcome::Drawn {
            regions: 1,
            gpu: true
        }
    );
    assert_eq!(*calls.lock().unwrap(), 2);
    assert_eq!(fill_count(&surface), 0);
    assert!(engine.metrics().gpu_active);
}

#[test]
fn test_gpu_failing_every_frame_keeps_drawing_2d() {
    let calls = Arc::new(Mutex::new(0));
    let (mut engine, surface) = ultra_engine(Some(TestGpu {
        failures: usize::MAX,
        calls: calls.clone(),
    }));

    for frame in 0..3 {
        engine.update_settings(|settings| settings.global_opacity = 0.5 + frame as f32 * 0.1);
        engine.frame(frame as f64 * 16.0);
        assert_eq!(fill_count(&surface), 1);
    }
    assert_eq!(*calls.lock().unwrap(), 3);
    assert!(!engine.metrics().gpu_active);
}

#[test]
fn test_missing_gpu_uses_2d_path() {
    let (mut engine, surface) = ultra_engine(None);

    assert_eq!(
        engine.frame(0.0),
        FrameOutcome::Drawn {
            regions: 1,
            gpu: false
        }
    );
    assert_eq!(fill_count(&surface), 1);
}

#[test]
fn test_metrics_report_counts() {
    let (mut engine, _surface) = engine_with_surface();
    circle(&mut engine, Vec2::new(10.0, 10.0), 5.0);
    circle(&mut engine, Vec2::new(90_000.0, 90_000.0), 5.0);
    let id = circle(&mut engine, Vec2::new(40.0, 40.0), 5.0);
    engine.frame(0.0);
    engine.reveal_region(id, true);

    let metrics = engine.metrics();
    assert_eq!(metrics.total_regions, 3);
    assert_eq!(metrics.visible_regions, 2);
    assert_eq!(metrics.cache_entries, 2);
    assert_eq!(metrics.animating, 1);
    assert!(!metrics.gpu_active);
}

#[test]
fn test_select_region_directly() {
    let mut engine = FogEngine::default();
    let id = circle(&mut engine, Vec2::ZERO, 5.0);
    let events = record_events(&mut engine);

    assert!(!engine.select_region(Some(RegionId::new())));
    assert!(engine.select_region(Some(id)));
    assert!(!engine.select_region(Some(id)));
    assert_eq!(engine.selected_region(), Some(id));

    // Switching tools clears the selection
    engine.set_tool(FogTool::Polygon);
    assert_eq!(engine.selected_region(), None);
    assert_eq!(
        events.lock().unwrap().as_slice(),
        &[
            FogEvent::RegionSelected(Some(id)),
            FogEvent::ToolChanged(FogTool::Polygon),
            FogEvent::RegionSelected(None),
        ]
    );
}
