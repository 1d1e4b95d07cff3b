//! Client for the image restyle sidecar.
//!
//! The sidecar runs a ControlNet-guided diffusion model; this side only
//! ships the source image and the prompt and stores what comes back.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::info;

use reel_models::StoryLayout;

use crate::error::{WorkerError, WorkerResult};
use crate::services::ImageRestyler;

/// Restyle sidecar configuration.
#[derive(Debug, Clone)]
pub struct RestyleConfig {
    pub service_url: String,
    pub steps: u32,
    pub strength: f32,
    pub guidance_scale: f32,
    pub model: String,
    pub controlnet: String,
    pub request_timeout: Duration,
}

impl Default for RestyleConfig {
    fn default() -> Self {
        Self {
            service_url: "http://localhost:8000".to_string(),
            steps: 30,
            strength: 0.6,
            guidance_scale: 9.0,
            model: "lykon/dreamshaper-8".to_string(),
            controlnet: "lllyasviel/sd-controlnet-canny".to_string(),
            request_timeout: Duration::from_secs(300),
        }
    }
}

impl RestyleConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            service_url: std::env::var("RESTYLE_SERVICE_URL").unwrap_or(defaults.service_url),
            steps: std::env::var("RESTYLE_STEPS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.steps),
            strength: std::env::var("RESTYLE_STRENGTH")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.strength),
            guidance_scale: std::env::var("RESTYLE_GUIDANCE_SCALE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.guidance_scale),
            model: std::env::var("RESTYLE_MODEL").unwrap_or(defaults.model),
            controlnet: std::env::var("RESTYLE_CONTROLNET").unwrap_or(defaults.controlnet),
            request_timeout: defaults.request_timeout,
        }
    }
}

#[derive(Debug, Serialize)]
struct RestyleRequest<'a> {
    image_base64: String,
    prompt: &'a str,
    steps: u32,
    strength: f32,
    guidance_scale: f32,
    model: &'a str,
    controlnet: &'a str,
}

#[derive(Debug, Deserialize)]
struct RestyleResponse {
    image_base64: String,
}

/// Restyler backed by the HTTP sidecar.
///
/// Results land in the layout's restyled directory as `cartoon_<file name>`.
pub struct HttpRestyler {
    http: Client,
    config: RestyleConfig,
    layout: StoryLayout,
}

impl HttpRestyler {
    pub fn new(config: RestyleConfig, layout: StoryLayout) -> WorkerResult<Self> {
        let http = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self {
            http,
            config,
            layout,
        })
    }
}

#[async_trait]
impl ImageRestyler for HttpRestyler {
    async fn restyle(&self, image: &Path, prompt: &str) -> WorkerResult<PathBuf> {
        let bytes = tokio::fs::read(image).await?;

        let request = RestyleRequest {
            image_base64: STANDARD.encode(&bytes),
            prompt,
            steps: self.config.steps,
            strength: self.config.strength,
            guidance_scale: self.config.guidance_scale,
            model: &self.config.model,
            controlnet: &self.config.controlnet,
        };

        let url = format!("{}/restyle", self.config.service_url.trim_end_matches('/'));
        let response = self.http.post(&url).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WorkerError::restyle(format!("restyle service returned {status}: {body}")));
        }

        let parsed: RestyleResponse = response.json().await?;
        let restyled = STANDARD
            .decode(parsed.image_base64.trim())
            .map_err(|e| WorkerError::restyle(format!("invalid image payload: {e}")))?;
        if restyled.is_empty() {
            return Err(WorkerError::restyle("restyle service returned an empty image"));
        }

        tokio::fs::create_dir_all(&self.layout.restyled_dir).await?;
        let output = self.layout.restyled_path(image);
        tokio::fs::write(&output, &restyled).await?;

        info!(
            source = %image.display(),
            output = %output.display(),
            steps = self.config.steps,
            "Restyled image"
        );
        Ok(output)
    }
}
