//! Shared data models for the StoryReel pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Scenes and validated scene lists
//! - Generation job status
//! - Clips and story run results
//! - The on-disk artifact layout

pub mod error;
pub mod job_status;
pub mod layout;
pub mod scene;
pub mod story;

pub use error::{ModelError, ModelResult};
pub use job_status::JobStatus;
pub use layout::{is_source_image, StoryLayout};
pub use scene::{scenes_from_raw, RawScene, Scene, SceneId, SceneList};
pub use story::{Clip, RunId, SceneFailure, SceneFailureKind, StoryResult};
