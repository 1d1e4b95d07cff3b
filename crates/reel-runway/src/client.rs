//! Runway HTTP client.
//!
//! Wraps the asynchronous task API: submit an image-to-video task, poll it
//! until it reaches a terminal state, then download the produced video.

use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response};
use tokio::io::AsyncWriteExt;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use url::Url;

use reel_models::{JobStatus, SceneId};

use crate::encode::encode_image_file;
use crate::error::{RunwayError, RunwayResult};
use crate::types::{ImageToVideoRequest, TaskCreated, TaskHandle, TaskResponse};

const DEFAULT_BASE_URL: &str = "https://api.dev.runwayml.com";
const DEFAULT_API_VERSION: &str = "2024-11-06";
const DEFAULT_MODEL: &str = "gen3a_turbo";

/// Configuration for the Runway client.
#[derive(Clone)]
pub struct RunwayConfig {
    /// Base URL of the API
    pub base_url: String,
    /// API secret
    pub api_key: String,
    /// Value of the `X-Runway-Version` header
    pub api_version: String,
    /// Model used for every scene of a run
    pub model: String,
    /// Output aspect ratio, backend default when unset
    pub ratio: Option<String>,
    /// Clip length in seconds, backend default when unset
    pub duration: Option<u32>,
    /// Delay between status polls
    pub poll_interval: Duration,
    /// Upper bound on time spent polling one task; `None` polls forever
    pub max_wait: Option<Duration>,
    /// Per-request timeout
    pub request_timeout: Duration,
}

impl std::fmt::Debug for RunwayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunwayConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("api_version", &self.api_version)
            .field("model", &self.model)
            .field("ratio", &self.ratio)
            .field("duration", &self.duration)
            .field("poll_interval", &self.poll_interval)
            .field("max_wait", &self.max_wait)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl Default for RunwayConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: String::new(),
            api_version: DEFAULT_API_VERSION.to_string(),
            model: DEFAULT_MODEL.to_string(),
            ratio: None,
            duration: None,
            poll_interval: Duration::from_secs(10),
            max_wait: Some(Duration::from_secs(900)),
            request_timeout: Duration::from_secs(60),
        }
    }
}

impl RunwayConfig {
    /// Create config from environment variables.
    ///
    /// `RUNWAY_API_KEY` is required. `RUNWAY_MAX_WAIT_SECS=0` disables the
    /// polling bound.
    pub fn from_env() -> RunwayResult<Self> {
        let api_key = std::env::var("RUNWAY_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| RunwayError::config("RUNWAY_API_KEY not set"))?;

        let defaults = Self::default();

        Ok(Self {
            base_url: std::env::var("RUNWAY_BASE_URL").unwrap_or(defaults.base_url),
            api_key,
            api_version: std::env::var("RUNWAY_API_VERSION").unwrap_or(defaults.api_version),
            model: std::env::var("RUNWAY_MODEL").unwrap_or(defaults.model),
            ratio: std::env::var("RUNWAY_RATIO").ok(),
            duration: std::env::var("RUNWAY_DURATION")
                .ok()
                .and_then(|s| s.parse().ok()),
            poll_interval: Duration::from_secs(
                std::env::var("RUNWAY_POLL_INTERVAL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
            ),
            max_wait: match std::env::var("RUNWAY_MAX_WAIT_SECS")
                .ok()
                .and_then(|s| s.parse::<u64>().ok())
            {
                Some(0) => None,
                Some(secs) => Some(Duration::from_secs(secs)),
                None => defaults.max_wait,
            },
            request_timeout: Duration::from_secs(
                std::env::var("RUNWAY_REQUEST_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(60),
            ),
        })
    }
}

/// Client for the Runway task API.
pub struct RunwayClient {
    http: Client,
    config: RunwayConfig,
}

impl RunwayClient {
    /// Create a new Runway client.
    pub fn new(config: RunwayConfig) -> RunwayResult<Self> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(RunwayError::Network)?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> RunwayResult<Self> {
        Self::new(RunwayConfig::from_env()?)
    }

    pub fn config(&self) -> &RunwayConfig {
        &self.config
    }

    /// Generate one scene: submit, wait, download to `dest`.
    ///
    /// Blocks the caller (asynchronously) until the task is terminal or
    /// `max_wait` elapses.
    pub async fn generate(
        &self,
        scene_id: SceneId,
        seed_image: &Path,
        prompt_text: &str,
        dest: &Path,
    ) -> RunwayResult<PathBuf> {
        let prompt_image = encode_image_file(seed_image).await?;

        info!(
            scene_id = %scene_id,
            seed = %seed_image.display(),
            model = %self.config.model,
            "Submitting scene to Runway"
        );
        let handle = self.submit(prompt_image, prompt_text).await?;

        let task = self.wait_for_completion(scene_id, &handle).await?;

        match task.job_status() {
            JobStatus::Succeeded => {
                let url = task
                    .video_url()
                    .map_err(|detail| RunwayError::MalformedResult { scene_id, detail })?;
                let path = self.download(&url, dest).await?;
                info!(scene_id = %scene_id, path = %path.display(), "Saved scene clip");
                Ok(path)
            }
            _ => Err(RunwayError::GenerationFailed {
                scene_id,
                reason: task.failure_reason(),
            }),
        }
    }

    /// Submit an image-to-video task.
    pub async fn submit(&self, prompt_image: String, prompt_text: &str) -> RunwayResult<TaskHandle> {
        let body = ImageToVideoRequest {
            model: self.config.model.clone(),
            prompt_image,
            prompt_text: prompt_text.to_string(),
            ratio: self.config.ratio.clone(),
            duration: self.config.duration,
        };

        let response = self
            .authorized(self.http.post(self.endpoint("/v1/image_to_video")))
            .json(&body)
            .send()
            .await?;

        let created: TaskCreated = Self::parse_response(response).await?;
        debug!(task_id = %created.id, "Runway task created");
        Ok(TaskHandle(created.id))
    }

    /// Fetch the current state of a task.
    pub async fn poll(&self, handle: &TaskHandle) -> RunwayResult<TaskResponse> {
        let response = self
            .authorized(
                self.http
                    .get(self.endpoint(&format!("/v1/tasks/{}", handle.as_str()))),
            )
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Poll at a fixed interval until the task is terminal.
    pub async fn wait_for_completion(
        &self,
        scene_id: SceneId,
        handle: &TaskHandle,
    ) -> RunwayResult<TaskResponse> {
        let started = Instant::now();
        let mut polls = 0u32;

        loop {
            tokio::time::sleep(self.config.poll_interval).await;

            let task = self.poll(handle).await?;
            polls += 1;
            let status = task.job_status();

            debug!(
                scene_id = %scene_id,
                task_id = %handle,
                backend_status = %task.status,
                progress = ?task.progress,
                polls = polls,
                "Polled Runway task"
            );

            if status.is_terminal() {
                info!(
                    scene_id = %scene_id,
                    task_id = %handle,
                    status = %status,
                    polls = polls,
                    elapsed_secs = started.elapsed().as_secs(),
                    "Runway task finished"
                );
                return Ok(task);
            }

            if let Some(max_wait) = self.config.max_wait {
                if started.elapsed() >= max_wait {
                    warn!(
                        scene_id = %scene_id,
                        task_id = %handle,
                        polls = polls,
                        "Runway task exceeded maximum wait"
                    );
                    return Err(RunwayError::Timeout {
                        scene_id,
                        waited_secs: started.elapsed().as_secs(),
                    });
                }
            }
        }
    }

    /// Stream a produced video to `dest`.
    ///
    /// Writes to `<dest>.part` first so a failed download never leaves a
    /// truncated clip at `dest`.
    pub async fn download(&self, url: &Url, dest: &Path) -> RunwayResult<PathBuf> {
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut response = self.http.get(url.clone()).send().await?;
        if !response.status().is_success() {
            return Err(RunwayError::download(format!(
                "GET {} returned {}",
                url,
                response.status()
            )));
        }

        let part = part_path(dest);
        let mut file = tokio::fs::File::create(&part).await?;
        let mut written = 0u64;

        let streamed: RunwayResult<()> = async {
            while let Some(chunk) = response.chunk().await? {
                file.write_all(&chunk).await?;
                written += chunk.len() as u64;
            }
            file.flush().await?;
            Ok(())
        }
        .await;

        if let Err(e) = streamed {
            let _ = tokio::fs::remove_file(&part).await;
            return Err(e);
        }

        if written == 0 {
            let _ = tokio::fs::remove_file(&part).await;
            return Err(RunwayError::download(format!("GET {url} returned an empty body")));
        }

        tokio::fs::rename(&part, dest).await?;
        debug!(bytes = written, path = %dest.display(), "Downloaded video");
        Ok(dest.to_path_buf())
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .bearer_auth(&self.config.api_key)
            .header("X-Runway-Version", &self.config.api_version)
    }

    /// Parse a JSON body, mapping non-2xx statuses to [`RunwayError::Api`].
    async fn parse_response<T: serde::de::DeserializeOwned>(response: Response) -> RunwayResult<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(RunwayError::Api {
                status: status.as_u16(),
                body,
            });
        }
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}
