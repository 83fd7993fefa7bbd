//! Centralized constants used across the application.
//!
//! This module contains magic numbers and configuration values that are used
//! in multiple places or would benefit from being named constants.

/// Default window width in pixels (also the initial viewport width)
pub const DEFAULT_WINDOW_WIDTH: f32 = 1600.0;

/// Default window height in pixels (also the initial viewport height)
pub const DEFAULT_WINDOW_HEIGHT: f32 = 900.0;

/// Opacity below which a region counts as revealed
pub const REVEALED_THRESHOLD: f32 = 0.5;

/// Default duration of reveal/hide transitions
pub const DEFAULT_ANIMATION_DURATION_MS: f64 = 500.0;

/// Upper bound for the edge blur radius in screen pixels
pub const MAX_EDGE_BLUR: f32 = 64.0;

/// Pattern tile size limits in pixels
pub const MIN_PATTERN_SCALE: f32 = 4.0;
pub const MAX_PATTERN_SCALE: f32 = 128.0;

/// Circle/rectangle drags smaller than this (world units) are discarded
pub const MIN_SHAPE_SIZE: f32 = 1.0;

/// Side of the box used to hit-test a pointer position against the quadtree
pub const HIT_TEST_BOX_SIZE: f32 = 1.0;

/// Quadtree defaults: world extent covered by the root node and split tunables
pub const DEFAULT_WORLD_EXTENT: f32 = 16_384.0;
pub const DEFAULT_QUADTREE_MAX_LEVEL: u32 = 5;
pub const DEFAULT_QUADTREE_MAX_OBJECTS: usize = 10;

/// Rebuild the quadtree after this many removals (0 disables rebuilding)
pub const DEFAULT_REBUILD_AFTER_REMOVALS: usize = 256;

/// Width of the rolling FPS sample window
pub const FPS_SAMPLE_WINDOW_MS: f64 = 1000.0;

/// Opacity and dash pattern of the in-progress drawing outline
pub const PREVIEW_OPACITY: f32 = 0.6;
pub const PREVIEW_DASH: [f32; 2] = [8.0, 6.0];
pub const PREVIEW_STROKE_WIDTH: f32 = 2.0;

/// Outline width of the selected region in screen pixels
pub const SELECTION_STROKE_WIDTH: f32 = 2.0;

/// Current snapshot format version
pub const SNAPSHOT_VERSION: u32 = 1;

/// Camera zoom limits (world units per screen pixel)
pub const MIN_CAMERA_SCALE: f32 = 0.1;
pub const MAX_CAMERA_SCALE: f32 = 10.0;

/// Vertical distance between fill scanlines when replaying fog with gizmos
pub const SCANLINE_SPACING: f32 = 2.0;

/// Spacing of the backdrop grid in world units
pub const BACKDROP_GRID_SIZE: f32 = 70.0;

/// Snapshot file name suggested by the save dialog
pub const DEFAULT_SNAPSHOT_FILE_NAME: &str = "fog.json";
