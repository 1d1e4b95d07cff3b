//! FFmpeg CLI wrapper for story media.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building and a runner with timeouts
//! - Frame counting with FFprobe
//! - Last-frame extraction (the seed for the next scene)
//! - Lossless stream-copy concatenation of scene clips

pub mod command;
pub mod concat;
pub mod error;
pub mod frame;
pub mod probe;

pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use concat::{build_manifest, ClipConcatenator};
pub use error::{MediaError, MediaResult};
pub use frame::FrameExtractor;
pub use probe::{count_frames, count_frames_with};
