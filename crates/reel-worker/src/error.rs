//! Worker error types.

use std::path::PathBuf;
use thiserror::Error;

use reel_media::MediaError;
use reel_models::{ModelError, SceneFailureKind, SceneId};
use reel_runway::RunwayError;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Scene {scene_id} has no prompt text and no usable fallback at {}", path.display())]
    MissingPrompt { scene_id: SceneId, path: PathBuf },

    #[error("Caption service failed: {0}")]
    Caption(String),

    #[error("Restyle failed: {0}")]
    Restyle(String),

    #[error("Story generation returned no scenes")]
    EmptyStory,

    /// Concatenation failed; nothing was produced for the run.
    #[error("No final video produced: {source}")]
    NoOutput {
        /// Scene that stopped the sequence earlier, if any
        failed_scene: Option<SceneId>,
        #[source]
        source: MediaError,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Runway error: {0}")]
    Runway(#[from] RunwayError),

    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    #[error("Invalid scene list: {0}")]
    Model(#[from] ModelError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    pub fn caption(msg: impl Into<String>) -> Self {
        Self::Caption(msg.into())
    }

    pub fn restyle(msg: impl Into<String>) -> Self {
        Self::Restyle(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// How this error is recorded when it ends a scene.
    ///
    /// Anything raised while generating a scene that is not one of the named
    /// outcomes (transport, API, local I/O) is recorded as `Backend`.
    pub fn scene_failure_kind(&self) -> SceneFailureKind {
        match self {
            WorkerError::MissingPrompt { .. } => SceneFailureKind::MissingPrompt,
            WorkerError::Runway(RunwayError::GenerationFailed { .. }) => {
                SceneFailureKind::GenerationFailed
            }
            WorkerError::Runway(RunwayError::MalformedResult { .. }) => {
                SceneFailureKind::MalformedResult
            }
            WorkerError::Runway(RunwayError::Timeout { .. }) => SceneFailureKind::Timeout,
            WorkerError::Media(MediaError::Decode { .. }) => SceneFailureKind::Decode,
            _ => SceneFailureKind::Backend,
        }
    }

    /// True when the run produced no final video at all.
    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkerError::NoOutput { .. })
    }
}
