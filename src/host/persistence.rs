//! Async snapshot save/load.
//!
//! Serialization and file I/O run on the `IoTaskPool`; results are polled each frame
//! and applied to the engine on the main thread. Errors are kept in resources for the
//! UI to display.

use std::path::PathBuf;

use bevy::prelude::*;
use bevy::tasks::{IoTaskPool, Task};
use futures_lite::future;

use crate::config::UpdateLastSnapshotPathRequest;
use crate::engine::FogEngine;
use crate::fog::FogSnapshot;

use super::events::SnapshotDirtyState;

#[derive(Message)]
pub struct SaveSnapshotRequest {
    pub path: PathBuf,
}

#[derive(Message)]
pub struct LoadSnapshotRequest {
    pub path: PathBuf,
}

#[derive(Resource, Default)]
pub struct SnapshotLoadError {
    pub message: Option<String>,
}

#[derive(Resource, Default)]
pub struct SnapshotSaveError {
    pub message: Option<String>,
}

/// Resource tracking async snapshot I/O for the progress modal
#[derive(Resource, Default)]
pub struct AsyncSnapshotOperation {
    pub is_saving: bool,
    pub is_loading: bool,
    pub operation_description: Option<String>,
}

impl AsyncSnapshotOperation {
    pub fn is_busy(&self) -> bool {
        self.is_saving || self.is_loading
    }
}

/// Resource tracking the snapshot file last saved or loaded
#[derive(Resource, Default)]
pub struct CurrentSnapshotFile {
    pub path: Option<PathBuf>,
}

pub struct SaveResult {
    pub path: PathBuf,
    pub outcome: Result<(), String>,
}

pub struct LoadResult {
    pub path: PathBuf,
    pub outcome: Result<FogSnapshot, String>,
}

#[derive(Component)]
pub struct SaveSnapshotTask(pub Task<SaveResult>);

#[derive(Component)]
pub struct LoadSnapshotTask(pub Task<LoadResult>);

fn file_label(path: &std::path::Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("snapshot")
        .to_string()
}

/// Write a snapshot to disk, creating the parent directory if needed
pub fn write_snapshot(path: &std::path::Path, snapshot: &FogSnapshot) -> Result<(), String> {
    let json = snapshot
        .to_json()
        .map_err(|e| format!("Failed to serialize snapshot: {}", e))?;
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create {:?}: {}", parent, e))?;
    }
    std::fs::write(path, json).map_err(|e| format!("Failed to write file: {}", e))
}

/// Read and validate a snapshot from disk
pub fn read_snapshot(path: &std::path::Path) -> Result<FogSnapshot, String> {
    let json =
        std::fs::read_to_string(path).map_err(|e| format!("Failed to read file: {}", e))?;
    FogSnapshot::from_json(&json).map_err(|e| format!("Invalid fog snapshot: {}", e))
}

/// Starts an async save operation
pub fn save_snapshot_system(
    mut commands: Commands,
    mut events: MessageReader<SaveSnapshotRequest>,
    engine: Res<FogEngine>,
    mut async_op: ResMut<AsyncSnapshotOperation>,
) {
    for event in events.read() {
        if async_op.is_busy() {
            warn!("Snapshot operation already in progress");
            continue;
        }

        let snapshot = engine.export_snapshot();
        let path = event.path.clone();

        async_op.is_saving = true;
        async_op.operation_description = Some(format!("Saving {}...", file_label(&path)));

        let task = IoTaskPool::get().spawn(async move {
            let outcome = write_snapshot(&path, &snapshot);
            SaveResult { path, outcome }
        });
        commands.spawn(SaveSnapshotTask(task));
    }
}

/// Polls save tasks and handles completion
pub fn poll_save_tasks(
    mut commands: Commands,
    mut tasks: Query<(Entity, &mut SaveSnapshotTask)>,
    mut async_op: ResMut<AsyncSnapshotOperation>,
    mut current_file: ResMut<CurrentSnapshotFile>,
    mut dirty_state: ResMut<SnapshotDirtyState>,
    mut save_error: ResMut<SnapshotSaveError>,
    mut config_events: MessageWriter<UpdateLastSnapshotPathRequest>,
) {
    for (entity, mut task) in tasks.iter_mut() {
        let Some(result) = future::block_on(future::poll_once(&mut task.0)) else {
            continue;
        };

        async_op.is_saving = false;
        async_op.operation_description = None;

        match result.outcome {
            Ok(()) => {
                info!("Fog snapshot saved to {:?}", result.path);
                save_error.message = None;
                dirty_state.is_dirty = false;
                current_file.path = Some(result.path.clone());
                config_events.write(UpdateLastSnapshotPathRequest { path: result.path });
            }
            Err(error) => {
                error!("{}", error);
                save_error.message = Some(error);
            }
        }

        commands.entity(entity).despawn();
    }
}

/// Starts an async load operation (file I/O and parsing only)
pub fn load_snapshot_system(
    mut commands: Commands,
    mut events: MessageReader<LoadSnapshotRequest>,
    mut async_op: ResMut<AsyncSnapshotOperation>,
) {
    for event in events.read() {
        if async_op.is_busy() {
            warn!("Snapshot operation already in progress");
            continue;
        }

        let path = event.path.clone();
        async_op.is_loading = true;
        async_op.operation_description = Some(format!("Loading {}...", file_label(&path)));

        let task = IoTaskPool::get().spawn(async move {
            let outcome = read_snapshot(&path);
            LoadResult { path, outcome }
        });
        commands.spawn(LoadSnapshotTask(task));
    }
}

/// Polls load tasks and imports the snapshot into the engine
#[allow(clippy::too_many_arguments)]
pub fn poll_load_tasks(
    mut commands: Commands,
    mut tasks: Query<(Entity, &mut LoadSnapshotTask)>,
    mut async_op: ResMut<AsyncSnapshotOperation>,
    mut engine: ResMut<FogEngine>,
    mut current_file: ResMut<CurrentSnapshotFile>,
    mut dirty_state: ResMut<SnapshotDirtyState>,
    mut load_error: ResMut<SnapshotLoadError>,
    mut config_events: MessageWriter<UpdateLastSnapshotPathRequest>,
) {
    for (entity, mut task) in tasks.iter_mut() {
        let Some(result) = future::block_on(future::poll_once(&mut task.0)) else {
            continue;
        };

        async_op.is_loading = false;
        async_op.operation_description = None;
        load_error.message = None;

        let imported = result
            .outcome
            .and_then(|snapshot| engine.import_snapshot(snapshot).map_err(|e| e.to_string()));

        match imported {
            Ok(count) => {
                info!("Fog snapshot loaded from {:?} ({} regions)", result.path, count);
                dirty_state.is_dirty = false;
                current_file.path = Some(result.path.clone());
                config_events.write(UpdateLastSnapshotPathRequest { path: result.path });
            }
            Err(error) => {
                error!("{}", error);
                load_error.message = Some(error);
            }
        }

        commands.entity(entity).despawn();
    }
}

#[cfg(test)]
mod tests {
    use bevy::prelude::*;

    use super::*;
    use crate::fog::{RegionOptions, ShapeKind};

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("vtt-fog-test-{}", uuid::Uuid::new_v4()))
            .join(name)
    }

    #[test]
    fn test_write_then_read_snapshot() {
        let mut engine = FogEngine::default();
        engine
            .create_region(
                ShapeKind::Circle,
                &[Vec2::ZERO, Vec2::new(5.0, 0.0)],
                RegionOptions::default(),
            )
            .unwrap();
        let snapshot = engine.export_snapshot();
        let path = temp_path("fog.json");

        write_snapshot(&path, &snapshot).unwrap();
        let loaded = read_snapshot(&path).unwrap();
        assert_eq!(loaded, snapshot);

        if let Some(dir) = path.parent() {
            let _ = std::fs::remove_dir_all(dir);
        }
    }

    #[test]
    fn test_read_missing_file_reports_error() {
        let error = read_snapshot(&temp_path("missing.json")).unwrap_err();
        assert!(error.starts_with("Failed to read file"));
    }

    #[test]
    fn test_async_operation_busy_flag() {
        let mut op = AsyncSnapshotOperation::default();
        assert!(!op.is_busy());
        op.is_loading = true;
        assert!(op.is_busy());
    }
}
