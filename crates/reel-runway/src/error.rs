//! Runway client error types.

use std::path::PathBuf;
use thiserror::Error;

use reel_models::SceneId;

pub type RunwayResult<T> = Result<T, RunwayError>;

#[derive(Debug, Error)]
pub enum RunwayError {
    /// Backend reported a terminal failure for the task.
    #[error("Generation failed for scene {scene_id}: {reason}")]
    GenerationFailed { scene_id: SceneId, reason: String },

    /// Backend reported success but the output reference is unusable.
    #[error("Malformed result for scene {scene_id}: {detail}")]
    MalformedResult { scene_id: SceneId, detail: String },

    #[error("Scene {scene_id} did not finish within {waited_secs} seconds")]
    Timeout { scene_id: SceneId, waited_secs: u64 },

    #[error("Runway API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("Download failed: {0}")]
    Download(String),

    #[error("Failed to read seed image {}: {source}", path.display())]
    SeedImage {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RunwayError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn download(msg: impl Into<String>) -> Self {
        Self::Download(msg.into())
    }
}
