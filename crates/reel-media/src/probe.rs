//! FFprobe frame counting.

use serde::Deserialize;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use crate::command::{stderr_tail, FFPROBE_BIN};
use crate::error::{MediaError, MediaResult};

/// FFprobe JSON output format.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    /// Frames actually decoded (`-count_frames`)
    nb_read_frames: Option<String>,
    /// Frame count from the container header
    nb_frames: Option<String>,
}

/// Count the decodable frames of the first video stream.
pub async fn count_frames(path: impl AsRef<Path>) -> MediaResult<u64> {
    count_frames_with(FFPROBE_BIN, path).await
}

/// Count frames using a specific ffprobe executable.
pub async fn count_frames_with(ffprobe: &str, path: impl AsRef<Path>) -> MediaResult<u64> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    let program =
        which::which(ffprobe).map_err(|_| MediaError::FfprobeNotFound(ffprobe.to_string()))?;

    let output = Command::new(program)
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-count_frames",
            "-show_entries",
            "stream=nb_read_frames,nb_frames",
            "-print_format",
            "json",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        return Err(MediaError::FfprobeFailed {
            message: "FFprobe failed".to_string(),
            stderr: Some(stderr_tail(&output.stderr)),
        });
    }

    parse_frame_count(&output.stdout)
}

/// Parse ffprobe JSON into a frame count.
///
/// Prefers the decoded count; falls back to the container header.
fn parse_frame_count(stdout: &[u8]) -> MediaResult<u64> {
    let probe: FfprobeOutput = serde_json::from_slice(stdout)?;

    let stream = probe
        .streams
        .first()
        .ok_or_else(|| MediaError::InvalidVideo("No video stream found".to_string()))?;

    let count = stream
        .nb_read_frames
        .as_deref()
        .and_then(|n| n.parse::<u64>().ok())
        .or_else(|| stream.nb_frames.as_deref().and_then(|n| n.parse::<u64>().ok()))
        .unwrap_or(0);

    Ok(count)
}
