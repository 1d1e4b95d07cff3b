//! Story run results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use uuid::Uuid;

use crate::scene::SceneId;

/// Unique identifier for one orchestrator run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub String);

impl RunId {
    /// Generate a new random run ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A generated clip persisted on local disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clip {
    pub scene_id: SceneId,
    /// Local video file
    pub path: PathBuf,
    /// Seed image the clip was generated from
    pub seed_image: PathBuf,
}

/// Why a scene halted the story.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SceneFailureKind {
    /// No prompt text and no usable fallback file
    MissingPrompt,
    /// Backend reported a terminal failure
    GenerationFailed,
    /// Backend reported success with unusable output
    MalformedResult,
    /// Backend never reached a terminal state in time
    Timeout,
    /// Last frame could not be extracted from the clip
    Decode,
    /// Transport, API or local I/O error around the backend
    Backend,
}

impl SceneFailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SceneFailureKind::MissingPrompt => "missing_prompt",
            SceneFailureKind::GenerationFailed => "generation_failed",
            SceneFailureKind::MalformedResult => "malformed_result",
            SceneFailureKind::Timeout => "timeout",
            SceneFailureKind::Decode => "decode",
            SceneFailureKind::Backend => "backend",
        }
    }
}

impl fmt::Display for SceneFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The scene that stopped a run, and the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneFailure {
    pub scene_id: SceneId,
    pub kind: SceneFailureKind,
    pub message: String,
}

/// Outcome of a story run.
///
/// `clips` is always a prefix of the requested scene sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryResult {
    pub run_id: RunId,
    /// Number of scenes the run was asked to produce
    pub requested_scenes: usize,
    /// Clips produced, in ascending scene order
    pub clips: Vec<Clip>,
    /// Concatenated video
    pub final_video: PathBuf,
    /// Scene that halted the run, if any
    pub failure: Option<SceneFailure>,
    /// Scenes never attempted because of the halt
    pub skipped: Vec<SceneId>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl StoryResult {
    /// True when every requested scene produced a clip.
    pub fn is_complete(&self) -> bool {
        self.failure.is_none() && self.clips.len() == self.requested_scenes
    }

    pub fn clip_ids(&self) -> Vec<SceneId> {
        self.clips.iter().map(|c| c.scene_id).collect()
    }

    pub fn failed_scene(&self) -> Option<SceneId> {
        self.failure.as_ref().map(|f| f.scene_id)
    }

    pub fn elapsed_secs(&self) -> f64 {
        (self.finished_at - self.started_at).num_milliseconds() as f64 / 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(clips: usize, requested: usize, failure: Option<SceneFailure>) -> StoryResult {
        let now = Utc::now();
        StoryResult {
            run_id: RunId::new(),
            requested_scenes: requested,
            clips: (1..=clips as u32)
                .map(|i| Clip {
                    scene_id: SceneId(i),
                    path: PathBuf::from(format!("{i}.mp4")),
                    seed_image: PathBuf::from("seed.png"),
                })
                .collect(),
            final_video: PathBuf::from("final_story.mp4"),
            failure,
            skipped: vec![],
            started_at: now,
            finished_at: now,
        }
    }

    #[test]
    fn test_complete_vs_partial() {
        assert!(result(3, 3, None).is_complete());

        let partial = result(
            1,
            3,
            Some(SceneFailure {
                scene_id: SceneId(2),
                kind: SceneFailureKind::GenerationFailed,
                message: "backend failed".into(),
            }),
        );
        assert!(!partial.is_complete());
        assert_eq!(partial.failed_scene(), Some(SceneId(2)));
        assert_eq!(partial.clip_ids(), vec![SceneId(1)]);
    }

    #[test]
    fn test_run_ids_unique() {
        assert_ne!(RunId::new(), RunId::new());
    }
}
