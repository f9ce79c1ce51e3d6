/// Error types.
///
/// Gameplay edge cases (bullets leaving view, path wrap, missing pickups)
/// are ordinary control flow and never show up here. These are the
/// conditions that stop a run.

use std::path::PathBuf;

use thiserror::Error;

use crate::domain::tile::TileCode;

#[derive(Debug, Error)]
pub enum SimError {
    /// A resolved sprite code has no sprite: corrupted level or table.
    #[error("tile index error: sprite {code} at ({x}, {y}) on tick {tick}")]
    SpriteOutOfRange { code: TileCode, x: i32, y: i32, tick: u64 },

    #[error("input reader is not initialized")]
    InputNotInitialized,

    #[error(transparent)]
    Level(#[from] LevelError),

    #[error("terminal output failed: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{what}: expected {expected} bytes, got {actual}")]
    BadSize {
        what: String,
        expected: usize,
        actual: usize,
    },

    #[error("expected {expected} levels, got {actual}")]
    LevelCount { expected: usize, actual: usize },
}
