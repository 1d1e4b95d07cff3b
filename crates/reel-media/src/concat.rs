//! Lossless clip concatenation with the FFmpeg concat demuxer.
//!
//! All inputs must share codecs and container parameters; streams are copied,
//! never re-encoded. The manifest lives in a temporary file that is removed on
//! every exit path.

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};

/// Joins clips in order into one video.
#[derive(Debug, Clone, Default)]
pub struct ClipConcatenator {
    ffmpeg: FfmpegRunner,
    /// Where manifests are written; system temp dir when unset
    manifest_dir: Option<PathBuf>,
}

impl ClipConcatenator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ffmpeg(mut self, runner: FfmpegRunner) -> Self {
        self.ffmpeg = runner;
        self
    }

    pub fn with_manifest_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.manifest_dir = Some(dir.into());
        self
    }

    /// Concatenate `clips` in the given order into `output`.
    ///
    /// Paths that no longer exist are skipped. Fails with
    /// [`MediaError::NoClips`] when nothing survives, without touching `output`.
    pub async fn concatenate(&self, clips: &[PathBuf], output: impl AsRef<Path>) -> MediaResult<()> {
        let output = output.as_ref();

        let mut surviving = Vec::with_capacity(clips.len());
        for clip in clips {
            if clip.exists() {
                surviving.push(absolute(clip).await);
            } else {
                warn!(clip = %clip.display(), "Clip missing on disk, leaving it out of the merge");
            }
        }

        if surviving.is_empty() {
            return Err(MediaError::NoClips);
        }

        let manifest = match &self.manifest_dir {
            Some(dir) => {
                tokio::fs::create_dir_all(dir).await?;
                manifest_builder().tempfile_in(dir)?
            }
            None => manifest_builder().tempfile()?,
        };
        tokio::fs::write(manifest.path(), build_manifest(&surviving)).await?;

        debug!(
            manifest = %manifest.path().display(),
            clips = surviving.len(),
            "Wrote concat manifest"
        );

        if let Some(parent) = output.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let cmd = FfmpegCommand::new(manifest.path(), output)
            .concat_demuxer()
            .stream_copy();

        let result = self.ffmpeg.run(&cmd).await;

        // Removes the manifest from disk
        drop(manifest);

        match result {
            Ok(()) => {
                info!(
                    output = %output.display(),
                    clips = surviving.len(),
                    "Merged clips"
                );
                Ok(())
            }
            Err(MediaError::FfmpegFailed {
                message,
                stderr,
                exit_code,
            }) => Err(MediaError::Merge {
                message,
                stderr,
                exit_code,
            }),
            Err(MediaError::Timeout(secs)) => Err(MediaError::Merge {
                message: format!("merge timed out after {secs} seconds"),
                stderr: None,
                exit_code: None,
            }),
            Err(e) => Err(e),
        }
    }
}

fn manifest_builder() -> tempfile::Builder<'static, 'static> {
    let mut builder = tempfile::Builder::new();
    builder.prefix("concat_").suffix(".txt");
    builder
}

async fn absolute(path: &Path) -> PathBuf {
    tokio::fs::canonicalize(path)
        .await
        .unwrap_or_else(|_| path.to_path_buf())
}

/// Build concat demuxer manifest contents, one `file '<path>'` line per clip.
pub fn build_manifest(clips: &[PathBuf]) -> String {
    clips
        .iter()
        .map(|p| format!("file '{}'\n", escape_manifest_path(&p.to_string_lossy())))
        .collect()
}

/// Quote a path for the concat demuxer: `'` becomes `'\''`.
fn escape_manifest_path(path: &str) -> String {
    path.replace('\'', "'\\''")
}
