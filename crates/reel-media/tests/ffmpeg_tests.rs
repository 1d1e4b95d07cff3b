//! FFmpeg-backed integration tests.
//!
//! Clips are synthesized with the lavfi `testsrc` source.

use std::path::{Path, PathBuf};

use reel_media::{count_frames, ClipConcatenator, FrameExtractor, MediaError};
use tempfile::TempDir;
use tokio::process::Command;

async fn make_clip(path: &Path, frames: u32) {
    let status = Command::new("ffmpeg")
        .args(["-y", "-v", "error", "-f", "lavfi", "-i"])
        .arg("testsrc=size=128x72:rate=24")
        .args(["-frames:v", &frames.to_string(), "-pix_fmt", "yuv420p", "-c:v", "libx264"])
        .arg(path)
        .status()
        .await
        .expect("Failed to spawn ffmpeg");
    assert!(status.success(), "ffmpeg could not synthesize test clip");
}

#[tokio::test]
#[ignore = "requires ffmpeg"]
async fn test_extract_last_frame_from_clip() {
    let dir = TempDir::new().unwrap();
    let clip = dir.path().join("1.mp4");
    make_clip(&clip, 24).await;

    assert_eq!(count_frames(&clip).await.unwrap(), 24);

    let frame = FrameExtractor::new()
        .extract_last_frame(&clip, dir.path().join("frames").join("1_last_frame.png"))
        .await
        .unwrap();

    let (w, h) = image::image_dimensions(&frame).unwrap();
    assert_eq!((w, h), (128, 72));
}

#[tokio::test]
#[ignore = "requires ffmpeg"]
async fn test_corrupt_clip_is_decode_error() {
    let dir = TempDir::new().unwrap();
    let clip = dir.path().join("1.mp4");
    tokio::fs::write(&clip, b"not a video").await.unwrap();

    let err = FrameExtractor::new()
        .extract_last_frame(&clip, dir.path().join("1.png"))
        .await
        .unwrap_err();

    assert!(matches!(err, MediaError::Decode { .. }));
}

#[tokio::test]
#[ignore = "requires ffmpeg"]
async fn test_concatenate_preserves_total_frames() {
    let dir = TempDir::new().unwrap();
    let mut clips: Vec<PathBuf> = Vec::new();
    for id in 1..=3 {
        let clip = dir.path().join(format!("{id}.mp4"));
        make_clip(&clip, 12).await;
        clips.push(clip);
    }

    let output = dir.path().join("final_story.mp4");
    ClipConcatenator::new()
        .concatenate(&clips, &output)
        .await
        .unwrap();

    assert_eq!(count_frames(&output).await.unwrap(), 36);
}
