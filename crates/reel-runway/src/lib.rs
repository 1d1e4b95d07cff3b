//! Runway image-to-video client.
//!
//! Submits one scene at a time as an asynchronous task, polls it to a
//! terminal state, and downloads the resulting clip.

pub mod client;
pub mod encode;
pub mod error;
pub mod types;

pub use client::{RunwayClient, RunwayConfig};
pub use encode::{data_uri, encode_image_file};
pub use error::{RunwayError, RunwayResult};
pub use types::{ImageToVideoRequest, TaskHandle, TaskResponse};
