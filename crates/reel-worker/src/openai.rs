//! Caption and story prompt client for OpenAI-compatible chat APIs.
//!
//! Captioning is two requests: a plain description of the image, then a
//! rewrite of that description into a cartoon-style illustration prompt.
//! Story expansion asks for a JSON list of scene prompts.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use reel_models::{scenes_from_raw, RawScene, Scene};
use reel_runway::encode_image_file;

use crate::error::{WorkerError, WorkerResult};
use crate::services::CaptionService;

const DESCRIBE_INSTRUCTION: &str =
    "Describe this image in one sentence: the main subject, what surrounds it, and the lighting.";

const CARTOON_INSTRUCTION_TEMPLATE: &str = r#"
Turn this image description into a simple prompt for a cartoon-style illustration.
It should describe the main object, background, and lighting in one sentence.

Example output:
"A cartoon-style illustration of a penguin standing on rocks by the water, with snowy mountains in the background and soft, natural lighting."

Image description: "{caption}"
"#;

const STORY_INSTRUCTION_TEMPLATE: &str = r#"
You're writing three independent animation scene prompts based on the cartoon image: "{caption}".

Each prompt must:
- Be calm, grounded, and simple.
- Include one clear character action (e.g., walking, jumping, turning head).
- Include one small environmental change (e.g., snow falling, wind blowing, clouds drifting).
- Include one camera movement (e.g., slow zoom, gentle pan, upward tilt).
- Avoid any reference to sequence or order (do not say "first", "next", or "finally").
- Be no longer than 1-2 sentences.

Format the result as a JSON list where each object has an "id" and a "prompt" field.

Example output:
[
  {
    "id": 1,
    "prompt": "The penguin turns its head to the side as a gentle wind brushes across the snow and the camera softly pans left."
  },
  {
    "id": 2,
    "prompt": "The penguin walks forward slowly while a few snowflakes begin to fall and the camera zooms in slightly."
  },
  {
    "id": 3,
    "prompt": "The penguin pauses near a rock as a faint light glows behind the mountains and the camera tilts upward."
  }
]
"#;

/// Configuration for the chat client.
#[derive(Clone)]
pub struct OpenAiConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub request_timeout: Duration,
}

impl std::fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            model: "gpt-4o-mini".to_string(),
            request_timeout: Duration::from_secs(60),
        }
    }
}

impl OpenAiConfig {
    /// Create config from environment variables. `OPENAI_API_KEY` is required.
    pub fn from_env() -> WorkerResult<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| WorkerError::config_error("OPENAI_API_KEY not set"))?;

        let defaults = Self::default();
        Ok(Self {
            base_url: std::env::var("OPENAI_BASE_URL").unwrap_or(defaults.base_url),
            api_key,
            model: std::env::var("OPENAI_MODEL").unwrap_or(defaults.model),
            request_timeout: defaults.request_timeout,
        })
    }
}

/// Chat completion request.
#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: Vec<ContentPart>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

/// Chat completion response.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Scene list as returned by the model, bare or wrapped.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ScenePayload {
    List(Vec<RawScene>),
    Wrapped { scenes: Vec<RawScene> },
}

/// Caption service backed by an OpenAI-compatible chat API.
pub struct OpenAiCaptioner {
    http: Client,
    config: OpenAiConfig,
}

impl OpenAiCaptioner {
    pub fn new(config: OpenAiConfig) -> WorkerResult<Self> {
        let http = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self { http, config })
    }

    pub fn from_env() -> WorkerResult<Self> {
        Self::new(OpenAiConfig::from_env()?)
    }

    async fn complete(&self, content: Vec<ContentPart>) -> WorkerResult<String> {
        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![ChatMessage {
                role: "user",
                content,
            }],
        };

        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WorkerError::caption(format!("chat API returned {status}: {body}")));
        }

        let parsed: ChatResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or_else(|| WorkerError::caption("chat API returned no content"))
    }
}

#[async_trait]
impl CaptionService for OpenAiCaptioner {
    async fn caption(&self, image: &Path) -> WorkerResult<String> {
        let data_uri = encode_image_file(image)
            .await
            .map_err(|e| WorkerError::caption(e.to_string()))?;

        let description = self
            .complete(vec![
                ContentPart::Text {
                    text: DESCRIBE_INSTRUCTION.to_string(),
                },
                ContentPart::ImageUrl {
                    image_url: ImageUrl { url: data_uri },
                },
            ])
            .await?;
        debug!(image = %image.display(), description = %description, "Image described");

        let prompt = self
            .complete(vec![ContentPart::Text {
                text: CARTOON_INSTRUCTION_TEMPLATE.replace("{caption}", &description),
            }])
            .await?;
        let prompt = unquote(&prompt).to_string();

        info!(image = %image.display(), prompt = %prompt, "Generated cartoon prompt");
        Ok(prompt)
    }

    async fn expand_to_scenes(&self, caption: &str) -> WorkerResult<Vec<Scene>> {
        let reply = self
            .complete(vec![ContentPart::Text {
                text: STORY_INSTRUCTION_TEMPLATE.replace("{caption}", caption),
            }])
            .await?;

        let scenes = parse_scenes(&reply)?;
        info!(scenes = scenes.len(), "Expanded caption into scenes");
        Ok(scenes)
    }
}

/// Parse a model reply into scenes.
///
/// Accepts a bare JSON list or `{"scenes": [...]}`, optionally inside a
/// Markdown code fence.
pub fn parse_scenes(reply: &str) -> WorkerResult<Vec<Scene>> {
    let body = strip_code_fence(reply);
    let payload: ScenePayload = serde_json::from_str(body)
        .map_err(|e| WorkerError::caption(format!("scene list is not valid JSON: {e}")))?;

    let raw = match payload {
        ScenePayload::List(raw) => raw,
        ScenePayload::Wrapped { scenes } => scenes,
    };
    Ok(scenes_from_raw(raw))
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (e.g. "json") on the opening line
    let rest = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

fn unquote(text: &str) -> &str {
    text.trim()
        .trim_start_matches('"')
        .trim_end_matches('"')
        .trim()
}
