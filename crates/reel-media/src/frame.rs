//! Last-frame extraction.
//!
//! The last frame of a scene's clip seeds the next scene, so any failure
//! here is reported as [`MediaError::Decode`] rather than skipped.

use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::command::{FfmpegCommand, FfmpegRunner, FFPROBE_BIN};
use crate::error::{MediaError, MediaResult};
use crate::probe::count_frames_with;

/// Extracts the final frame of a clip as a still image.
#[derive(Debug, Clone)]
pub struct FrameExtractor {
    ffmpeg: FfmpegRunner,
    ffprobe: String,
}

impl Default for FrameExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameExtractor {
    pub fn new() -> Self {
        Self {
            ffmpeg: FfmpegRunner::new(),
            ffprobe: FFPROBE_BIN.to_string(),
        }
    }

    pub fn with_ffmpeg(mut self, runner: FfmpegRunner) -> Self {
        self.ffmpeg = runner;
        self
    }

    pub fn with_ffprobe(mut self, binary: impl Into<String>) -> Self {
        self.ffprobe = binary.into();
        self
    }

    /// Decode the final frame of `clip` and write it to `output`.
    pub async fn extract_last_frame(
        &self,
        clip: impl AsRef<Path>,
        output: impl AsRef<Path>,
    ) -> MediaResult<PathBuf> {
        let clip = clip.as_ref();
        let output = output.as_ref();

        if !clip.exists() {
            return Err(MediaError::decode(clip, "clip file does not exist"));
        }

        let total = count_frames_with(&self.ffprobe, clip)
            .await
            .map_err(|e| MediaError::decode(clip, e.to_string()))?;

        if total == 0 {
            return Err(MediaError::decode(clip, "clip has no decodable frames"));
        }

        let last_index = total - 1;
        debug!(
            clip = %clip.display(),
            total_frames = total,
            last_index = last_index,
            "Extracting last frame"
        );

        if let Some(parent) = output.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // A frame left by an earlier run must not pass the readability check
        match tokio::fs::remove_file(output).await {
            Ok(()) => debug!(frame = %output.display(), "Removed stale frame"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        let cmd = FfmpegCommand::new(clip, output)
            .video_filter(last_frame_filter(last_index))
            .output_args(["-vsync", "vfr"])
            .single_frame();

        self.ffmpeg
            .run(&cmd)
            .await
            .map_err(|e| MediaError::decode(clip, e.to_string()))?;

        let (width, height) = image::image_dimensions(output)
            .map_err(|e| MediaError::decode(clip, format!("extracted frame is not readable: {e}")))?;

        if width == 0 || height == 0 {
            return Err(MediaError::decode(clip, "extracted frame is empty"));
        }

        info!(
            clip = %clip.display(),
            frame = %output.display(),
            width = width,
            height = height,
            "Extracted last frame"
        );

        Ok(output.to_path_buf())
    }
}

/// Filter selecting exactly one frame by decode index.
fn last_frame_filter(index: u64) -> String {
    format!("select=eq(n\\,{index})")
}
