//! Worker configuration.

use std::path::PathBuf;

use reel_models::StoryLayout;

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Root of the data directory tree
    pub base_dir: PathBuf,
    /// Directory layout derived from `base_dir` plus overrides
    pub layout: StoryLayout,
    /// Restyle each source image before animating it
    pub restyle: bool,
    /// Address for the Prometheus exporter; disabled when unset
    pub metrics_addr: Option<String>,
    /// Kill an FFmpeg invocation after this many seconds
    pub ffmpeg_timeout_secs: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        let base_dir = PathBuf::from("./data");
        Self {
            layout: StoryLayout::under(&base_dir),
            base_dir,
            restyle: false,
            metrics_addr: None,
            ffmpeg_timeout_secs: 300,
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let base_dir = std::env::var("STORY_BASE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./data"));

        let mut layout = StoryLayout::under(&base_dir);
        if let Ok(dir) = std::env::var("STORY_PHOTOS_DIR") {
            layout.photos_dir = dir.into();
        }
        if let Ok(dir) = std::env::var("STORY_RESTYLED_DIR") {
            layout.restyled_dir = dir.into();
        }
        if let Ok(dir) = std::env::var("STORY_PROMPTS_DIR") {
            layout.prompts_dir = dir.into();
        }
        if let Ok(dir) = std::env::var("STORY_OUTPUT_DIR") {
            let output: PathBuf = dir.into();
            layout.clips_dir = output.join("videos");
            layout.frames_dir = output.join("frames");
            layout.output_dir = output;
        }

        Self {
            base_dir,
            layout,
            restyle: std::env::var("STORY_RESTYLE")
                .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
            metrics_addr: std::env::var("METRICS_ADDR")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            ffmpeg_timeout_secs: std::env::var("FFMPEG_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(300),
        }
    }

    /// Re-anchor the layout under a different base directory.
    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = base_dir.into();
        self.layout = StoryLayout::under(&self.base_dir);
        self
    }

    pub fn with_photos_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.layout.photos_dir = dir.into();
        self
    }

    pub fn with_restyle(mut self, restyle: bool) -> Self {
        self.restyle = restyle;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout() {
        let config = WorkerConfig::default();
        assert!(!config.restyle);
        assert_eq!(config.layout.photos_dir, PathBuf::from("./data/photos"));
        assert_eq!(
            config.layout.final_video_path(),
            PathBuf::from("./data/stories/final_story.mp4")
        );
    }

    #[test]
    fn test_builder_overrides() {
        let config = WorkerConfig::default()
            .with_base_dir("/srv/reel")
            .with_photos_dir("/mnt/photos")
            .with_restyle(true);
        assert!(config.restyle);
        assert_eq!(config.layout.photos_dir, PathBuf::from("/mnt/photos"));
        assert_eq!(config.layout.clips_dir, PathBuf::from("/srv/reel/stories/videos"));
    }
}
