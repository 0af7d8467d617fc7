use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by a preference store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("failed to access preferences file '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse preferences file '{path}': {source}")]
    Parse {
        path: PathBuf,
        source: ron::de::SpannedError,
    },
    #[error("failed to serialize preferences: {0}")]
    Serialize(#[from] ron::Error),
    #[error("no configuration directory available on this platform")]
    NoConfigDir,
    #[error("preference store worker stopped before completing: {0}")]
    WorkerStopped(#[from] tokio::task::JoinError),
}

/// Errors raised by a [`ScaleState`](super::ScaleState).
#[derive(Error, Debug)]
pub enum ScaleError {
    #[error("invalid scale bounds [{min}, {max}]: both must be positive and finite with min < max")]
    InvalidBounds { min: f32, max: f32 },
    #[error("failed to persist font scale: {0}")]
    Storage(#[from] StoreError),
}
