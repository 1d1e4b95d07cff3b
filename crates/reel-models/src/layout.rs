//! On-disk layout for story artifacts.
//!
//! Every per-scene file is keyed by scene id. Per-image stories get their own
//! subtree via [`StoryLayout::for_story`] so runs never overwrite each other.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::scene::SceneId;

/// File name of the concatenated story video.
pub const FINAL_VIDEO_NAME: &str = "final_story.mp4";
/// Extension of generated clips.
pub const CLIP_EXTENSION: &str = "mp4";
/// Image extensions picked up from the photos directory.
pub const SOURCE_IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp"];

/// Directory configuration for one story (or the shared root).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryLayout {
    /// Source photos
    pub photos_dir: PathBuf,
    /// Restyled (cartoon) images
    pub restyled_dir: PathBuf,
    /// Per-scene prompt files (`<id>.txt`)
    pub prompts_dir: PathBuf,
    /// Per-scene clips (`<id>.mp4`)
    pub clips_dir: PathBuf,
    /// Per-scene last frames (`<id>_last_frame.png`)
    pub frames_dir: PathBuf,
    /// Final merged video
    pub output_dir: PathBuf,
}

impl StoryLayout {
    /// Standard layout under a base directory.
    pub fn under(base: impl AsRef<Path>) -> Self {
        let base = base.as_ref();
        let stories = base.join("stories");
        Self {
            photos_dir: base.join("photos"),
            restyled_dir: base.join("cartoonized_images"),
            prompts_dir: base.join("story_prompts"),
            clips_dir: stories.join("videos"),
            frames_dir: stories.join("frames"),
            output_dir: stories.clone(),
        }
    }

    /// Layout for a single story named `name` (usually the source image stem).
    ///
    /// Photos and restyled images stay shared; everything keyed by scene id
    /// moves into a `name` subdirectory.
    pub fn for_story(&self, name: &str) -> Self {
        Self {
            photos_dir: self.photos_dir.clone(),
            restyled_dir: self.restyled_dir.clone(),
            prompts_dir: self.prompts_dir.join(name),
            clips_dir: self.clips_dir.join(name),
            frames_dir: self.frames_dir.join(name),
            output_dir: self.output_dir.join(name),
        }
    }

    pub fn prompt_path(&self, id: SceneId) -> PathBuf {
        self.prompts_dir.join(format!("{id}.txt"))
    }

    pub fn clip_path(&self, id: SceneId) -> PathBuf {
        self.clips_dir.join(format!("{id}.{CLIP_EXTENSION}"))
    }

    pub fn frame_path(&self, id: SceneId) -> PathBuf {
        self.frames_dir.join(format!("{id}_last_frame.png"))
    }

    pub fn final_video_path(&self) -> PathBuf {
        self.output_dir.join(FINAL_VIDEO_NAME)
    }

    /// Restyled output path for a source image.
    pub fn restyled_path(&self, source: &Path) -> PathBuf {
        let name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image.png".to_string());
        self.restyled_dir.join(format!("cartoon_{name}"))
    }

    /// Directories that must exist before a run writes into them.
    pub fn all_dirs(&self) -> [&Path; 6] {
        [
            &self.photos_dir,
            &self.restyled_dir,
            &self.prompts_dir,
            &self.clips_dir,
            &self.frames_dir,
            &self.output_dir,
        ]
    }
}

impl Default for StoryLayout {
    fn default() -> Self {
        Self::under("data")
    }
}

/// Check whether a path has one of the accepted source image extensions.
pub fn is_source_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let e = e.to_ascii_lowercase();
            SOURCE_IMAGE_EXTENSIONS.contains(&e.as_str())
        })
        .unwrap_or(false)
}
