//! FFmpeg command builder and runner.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{MediaError, MediaResult};

/// Default FFmpeg executable name.
pub const FFMPEG_BIN: &str = "ffmpeg";
/// Default FFprobe executable name.
pub const FFPROBE_BIN: &str = "ffprobe";

/// Lines of stderr kept in error values.
const STDERR_TAIL_LINES: usize = 20;

/// Builder for FFmpeg commands.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    /// Input file path
    input: PathBuf,
    /// Output file path
    output: PathBuf,
    /// Input arguments (before -i)
    input_args: Vec<String>,
    /// Output arguments (after -i)
    output_args: Vec<String>,
}

impl FfmpegCommand {
    /// Create a new FFmpeg command.
    pub fn new(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            output: output.as_ref().to_path_buf(),
            input_args: Vec::new(),
            output_args: Vec::new(),
        }
    }

    /// Add multiple input arguments.
    pub fn input_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.input_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Add output arguments (after -i).
    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    /// Add multiple output arguments.
    pub fn output_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Read the input as a concat demuxer manifest.
    pub fn concat_demuxer(self) -> Self {
        self.input_args(["-f", "concat", "-safe", "0"])
    }

    /// Copy all streams without re-encoding.
    pub fn stream_copy(self) -> Self {
        self.output_args(["-c", "copy"])
    }

    /// Set video filter.
    pub fn video_filter(self, filter: impl Into<String>) -> Self {
        self.output_arg("-vf").output_arg(filter)
    }

    /// Emit exactly one video frame into a single image file.
    pub fn single_frame(self) -> Self {
        self.output_args(["-frames:v", "1", "-update", "1"])
    }

    /// Build the command arguments.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = vec!["-y".to_string(), "-v".to_string(), "error".to_string()];

        args.extend(self.input_args.clone());

        args.push("-i".to_string());
        args.push(self.input.to_string_lossy().to_string());

        args.extend(self.output_args.clone());

        args.push(self.output.to_string_lossy().to_string());

        args
    }
}

/// Runner for FFmpeg commands.
#[derive(Debug, Clone)]
pub struct FfmpegRunner {
    /// Executable name or path
    binary: String,
    /// Timeout in seconds
    timeout_secs: Option<u64>,
}

impl Default for FfmpegRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl FfmpegRunner {
    /// Create a new runner using `ffmpeg` from PATH.
    pub fn new() -> Self {
        Self {
            binary: FFMPEG_BIN.to_string(),
            timeout_secs: None,
        }
    }

    /// Use a different executable.
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Set timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    /// Run an FFmpeg command, capturing stderr for diagnostics.
    pub async fn run(&self, cmd: &FfmpegCommand) -> MediaResult<()> {
        let program = which::which(&self.binary)
            .map_err(|_| MediaError::FfmpegNotFound(self.binary.clone()))?;

        let args = cmd.build_args();
        debug!("Running FFmpeg: {} {}", self.binary, args.join(" "));

        let child = Command::new(program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let output = match self.timeout_secs {
            Some(secs) => {
                match tokio::time::timeout(Duration::from_secs(secs), child.wait_with_output()).await
                {
                    Ok(result) => result?,
                    Err(_) => {
                        // Dropping the wait future kills the child
                        warn!("FFmpeg timed out after {} seconds, killing process", secs);
                        return Err(MediaError::Timeout(secs));
                    }
                }
            }
            None => child.wait_with_output().await?,
        };

        if output.status.success() {
            Ok(())
        } else {
            let stderr = stderr_tail(&output.stderr);
            Err(MediaError::ffmpeg_failed(
                "FFmpeg exited with non-zero status",
                (!stderr.is_empty()).then_some(stderr),
                output.status.code(),
            ))
        }
    }
}

/// Last few lines of a tool's stderr.
pub(crate) fn stderr_tail(raw: &[u8]) -> String {
    let text = String::from_utf8_lossy(raw);
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}

/// Check if FFmpeg is available.
pub fn check_ffmpeg() -> MediaResult<PathBuf> {
    which::which(FFMPEG_BIN).map_err(|_| MediaError::FfmpegNotFound(FFMPEG_BIN.to_string()))
}

/// Check if FFprobe is available.
pub fn check_ffprobe() -> MediaResult<PathBuf> {
    which::which(FFPROBE_BIN).map_err(|_| MediaError::FfprobeNotFound(FFPROBE_BIN.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concat_command_args() {
        let cmd = FfmpegCommand::new("list.txt", "out.mp4")
            .concat_demuxer()
            .stream_copy();

        let args = cmd.build_args();
        assert_eq!(
            args,
            vec![
                "-y", "-v", "error", "-f", "concat", "-safe", "0", "-i", "list.txt", "-c", "copy",
                "out.mp4"
            ]
        );
    }

    #[test]
    fn test_single_frame_args() {
        let args = FfmpegCommand::new("clip.mp4", "frame.png")
            .video_filter("select=eq(n\\,119)")
            .single_frame()
            .build_args();

        let vf = args.iter().position(|a| a == "-vf").unwrap();
        assert_eq!(args[vf + 1], "select=eq(n\\,119)");
        assert!(args.contains(&"-frames:v".to_string()));
        assert_eq!(args.last().unwrap(), "frame.png");
    }

    #[test]
    fn test_stderr_tail_keeps_last_lines() {
        let raw: String = (0..30).map(|i| format!("line {i}\n")).collect();
        let tail = stderr_tail(raw.as_bytes());
        assert_eq!(tail.lines().count(), STDERR_TAIL_LINES);
        assert!(tail.ends_with("line 29"));
    }

    #[tokio::test]
    async fn test_missing_binary() {
        let runner = FfmpegRunner::new().with_binary("definitely-not-a-real-ffmpeg");
        let err = runner
            .run(&FfmpegCommand::new("a.mp4", "b.mp4"))
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::FfmpegNotFound(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_zero_exit() {
        let runner = FfmpegRunner::new().with_binary("false");
        let err = runner
            .run(&FfmpegCommand::new("a.mp4", "b.mp4"))
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::FfmpegFailed { exit_code: Some(1), .. }));
    }
}
