//! Story orchestration worker.
//!
//! This crate provides:
//! - The scene-by-scene story orchestrator
//! - Collaborator traits and their Runway/FFmpeg adapters
//! - Caption and restyle service clients
//! - The per-photo pipeline driven by the `storyreel` binary

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod openai;
pub mod orchestrator;
pub mod pipeline;
pub mod prompt;
pub mod restyle;
pub mod services;

pub use config::WorkerConfig;
pub use error::{WorkerError, WorkerResult};
pub use logging::StoryLogger;
pub use openai::{OpenAiCaptioner, OpenAiConfig};
pub use orchestrator::StoryOrchestrator;
pub use pipeline::{list_source_images, PhotoOutcome, StoryPipeline};
pub use restyle::{HttpRestyler, RestyleConfig};
pub use services::{CaptionService, ClipMerger, ImageRestyler, LastFrameExtractor, SceneGenerator};
