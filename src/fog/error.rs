//! Error taxonomy for the fog engine.
//!
//! Only failures the host has to act on are represented here. Routine user input
//! mistakes (stray clicks, unknown ids from stale UI) are reported as `false`/`None`
//! by the operations themselves.

use thiserror::Error;

use super::region::ShapeKind;

#[derive(Debug, Error)]
pub enum FogError {
    #[error("{kind} needs at least {required} points, got {got}")]
    InvalidGeometry {
        kind: ShapeKind,
        required: usize,
        got: usize,
    },

    #[error("{kind} has a non-finite coordinate")]
    NonFiniteGeometry { kind: ShapeKind },

    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),

    #[error("malformed snapshot data: {0}")]
    SnapshotFormat(#[from] serde_json::Error),

    #[error("unsupported snapshot version {0}")]
    UnsupportedSnapshotVersion(u32),
}
