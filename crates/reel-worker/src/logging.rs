//! Structured story logging utilities.
//!
//! Every line carries the run id and story name so interleaved runs can be
//! told apart in aggregated logs.

use tracing::{error, info, warn, Span};

use reel_models::{RunId, SceneId};

/// Logger for one orchestrator run.
#[derive(Debug, Clone)]
pub struct StoryLogger {
    run_id: String,
    story: String,
}

impl StoryLogger {
    /// Create a logger for a run of the named story.
    pub fn new(run_id: &RunId, story: &str) -> Self {
        Self {
            run_id: run_id.to_string(),
            story: story.to_string(),
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(
            run_id = %self.run_id,
            story = %self.story,
            "Story started: {}", message
        );
    }

    /// Log progress on a specific scene.
    pub fn log_scene(&self, scene_id: SceneId, message: &str) {
        info!(
            run_id = %self.run_id,
            story = %self.story,
            scene_id = %scene_id,
            "Scene progress: {}", message
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            run_id = %self.run_id,
            story = %self.story,
            "Story warning: {}", message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            run_id = %self.run_id,
            story = %self.story,
            "Story error: {}", message
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            run_id = %self.run_id,
            story = %self.story,
            "Story completed: {}", message
        );
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn story(&self) -> &str {
        &self.story
    }

    /// Span covering the whole run.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "story",
            run_id = %self.run_id,
            story = %self.story
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_story_logger_creation() {
        let run_id = RunId::new();
        let logger = StoryLogger::new(&run_id, "penguin");

        assert_eq!(logger.run_id(), run_id.as_str());
        assert_eq!(logger.story(), "penguin");
    }
}
