//! Bevy integration for the fog engine.
//!
//! The engine is a plain resource driven by systems in a fixed order each frame:
//! camera → viewport feed → input feed → engine frame → gizmo replay → event bridge.
//!
//! ## Module Structure
//!
//! - [`camera`] - Map camera with middle-drag pan and wheel zoom
//! - [`params`] - Camera/window SystemParam and UI input gating
//! - [`input`] - Viewport and pointer/keyboard feed into the engine
//! - [`replay`] - Gizmo replay of the engine's display list
//! - [`events`] - Engine events re-published as Bevy messages
//! - [`persistence`] - Async snapshot save/load

pub mod camera;
pub mod events;
pub mod input;
pub mod params;
pub mod persistence;
pub mod replay;

pub use camera::{CameraZoom, MapCamera};
pub use events::{FogEventMessage, FogEventQueue, SnapshotDirtyState};
pub use persistence::{
    AsyncSnapshotOperation, CurrentSnapshotFile, LoadSnapshotRequest, SaveSnapshotRequest,
    SnapshotLoadError, SnapshotSaveError,
};
pub use replay::{FogGizmoGroup, FogReplay};

use bevy::prelude::*;

use crate::config::{AppConfig, ConfigLoaded};
use crate::engine::FogEngine;
use crate::render::DisplayListSurface;
use crate::theme;

/// Systems that touch the engine, in frame order
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum FogSystems {
    Input,
    Frame,
    Output,
}

/// Build the engine from config and attach the recording surface
fn initialize_engine(mut commands: Commands, config: Res<AppConfig>) {
    let surface = DisplayListSurface::new();
    let mut engine = FogEngine::new(config.data.fog.clone(), config.data.index.clone());
    engine.initialize(Box::new(surface.clone()));

    let mut queue = FogEventQueue::default();
    queue.attach(&mut engine);

    commands.insert_resource(engine);
    commands.insert_resource(queue);
    commands.insert_resource(FogReplay::new(surface));
}

/// Advance transitions and draw the fog for this frame
fn tick_fog_engine(time: Res<Time>, mut engine: ResMut<FogEngine>) {
    engine.frame(time.elapsed_secs_f64() * 1000.0);
}

/// Release the surface and subscribers when the application exits
fn dispose_on_exit(mut exit_events: MessageReader<AppExit>, mut engine: ResMut<FogEngine>) {
    if exit_events.read().next().is_some() {
        info!("Application exiting, disposing fog engine");
        engine.dispose();
    }
}

/// Backdrop grid so revealed and hidden areas are distinguishable
fn draw_backdrop_grid(
    mut gizmos: Gizmos,
    camera_params: params::CameraParams,
) {
    let Some(viewport) = camera_params.fog_viewport() else {
        return;
    };
    let spacing = crate::constants::BACKDROP_GRID_SIZE;
    let rect = viewport.world_rect();

    let mut x = (rect.min.x / spacing).floor() * spacing;
    while x <= rect.max.x {
        gizmos.line_2d(
            Vec2::new(x, rect.min.y),
            Vec2::new(x, rect.max.y),
            theme::GRID_COLOR,
        );
        x += spacing;
    }
    let mut y = (rect.min.y / spacing).floor() * spacing;
    while y <= rect.max.y {
        gizmos.line_2d(
            Vec2::new(rect.min.x, y),
            Vec2::new(rect.max.x, y),
            theme::GRID_COLOR,
        );
        y += spacing;
    }
}

pub struct FogHostPlugin;

impl Plugin for FogHostPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(ClearColor(theme::BACKGROUND))
            .init_resource::<SnapshotDirtyState>()
            .init_resource::<AsyncSnapshotOperation>()
            .init_resource::<CurrentSnapshotFile>()
            .init_resource::<SnapshotLoadError>()
            .init_resource::<SnapshotSaveError>()
            .add_message::<FogEventMessage>()
            .add_message::<SaveSnapshotRequest>()
            .add_message::<LoadSnapshotRequest>()
            .init_gizmo_group::<FogGizmoGroup>()
            .configure_sets(
                Update,
                (FogSystems::Input, FogSystems::Frame, FogSystems::Output).chain(),
            )
            .add_systems(
                Startup,
                (
                    camera::spawn_camera,
                    replay::configure_fog_gizmos,
                    initialize_engine.after(ConfigLoaded),
                ),
            )
            .add_systems(
                Update,
                (
                    camera::camera_pan,
                    camera::camera_zoom,
                    camera::apply_camera_zoom,
                    input::sync_viewport,
                    input::handle_fog_input,
                )
                    .chain()
                    .in_set(FogSystems::Input),
            )
            .add_systems(
                Update,
                (
                    persistence::save_snapshot_system
                        .run_if(on_message::<SaveSnapshotRequest>),
                    persistence::load_snapshot_system
                        .run_if(on_message::<LoadSnapshotRequest>),
                    persistence::poll_save_tasks,
                    persistence::poll_load_tasks,
                    tick_fog_engine,
                )
                    .chain()
                    .in_set(FogSystems::Frame),
            )
            .add_systems(
                Update,
                (
                    replay::draw_fog_overlay,
                    events::forward_fog_events,
                    draw_backdrop_grid,
                )
                    .in_set(FogSystems::Output),
            )
            .add_systems(Last, dispose_on_exit);
    }
}
