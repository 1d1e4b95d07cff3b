//! Collaborator seams used by the orchestrator and the photo pipeline.
//!
//! The concrete Runway client and FFmpeg wrappers implement these directly;
//! tests substitute mocks.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use reel_media::{ClipConcatenator, FrameExtractor, MediaResult};
use reel_models::{Scene, SceneId};
use reel_runway::{RunwayClient, RunwayResult};

use crate::error::WorkerResult;

/// Produces one video clip from a seed image and a prompt.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SceneGenerator: Send + Sync {
    /// Generate scene `scene_id` and store the clip at `dest`.
    async fn generate(
        &self,
        scene_id: SceneId,
        seed_image: &Path,
        prompt: &str,
        dest: &Path,
    ) -> RunwayResult<PathBuf>;
}

/// Decodes the final frame of a clip to an image file.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LastFrameExtractor: Send + Sync {
    async fn extract_last_frame(&self, clip: &Path, output: &Path) -> MediaResult<PathBuf>;
}

/// Joins clips in the given order into one video.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ClipMerger: Send + Sync {
    async fn concatenate(&self, clips: &[PathBuf], output: &Path) -> MediaResult<()>;
}

/// Describes images and turns descriptions into scene prompts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CaptionService: Send + Sync {
    /// One-sentence cartoon-style description of the image.
    async fn caption(&self, image: &Path) -> WorkerResult<String>;

    /// Expand a description into an ordered list of scene prompts.
    async fn expand_to_scenes(&self, caption: &str) -> WorkerResult<Vec<Scene>>;
}

/// Restyles an image to match a description.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageRestyler: Send + Sync {
    /// Returns the path of the restyled image.
    async fn restyle(&self, image: &Path, prompt: &str) -> WorkerResult<PathBuf>;
}

#[async_trait]
impl SceneGenerator for RunwayClient {
    async fn generate(
        &self,
        scene_id: SceneId,
        seed_image: &Path,
        prompt: &str,
        dest: &Path,
    ) -> RunwayResult<PathBuf> {
        RunwayClient::generate(self, scene_id, seed_image, prompt, dest).await
    }
}

#[async_trait]
impl LastFrameExtractor for FrameExtractor {
    async fn extract_last_frame(&self, clip: &Path, output: &Path) -> MediaResult<PathBuf> {
        FrameExtractor::extract_last_frame(self, clip, output).await
    }
}

#[async_trait]
impl ClipMerger for ClipConcatenator {
    async fn concatenate(&self, clips: &[PathBuf], output: &Path) -> MediaResult<()> {
        ClipConcatenator::concatenate(self, clips, output).await
    }
}
