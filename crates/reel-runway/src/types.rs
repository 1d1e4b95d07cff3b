//! Runway API request/response types.

use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

use reel_models::JobStatus;

/// Opaque task identifier returned on submission.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskHandle(pub String);

impl TaskHandle {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Request body for `POST /v1/image_to_video`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageToVideoRequest {
    pub model: String,
    /// Seed image as an HTTPS URL or data URI
    pub prompt_image: String,
    pub prompt_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ratio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
}

/// Response to a task submission.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskCreated {
    pub id: String,
}

/// Task state from `GET /v1/tasks/{id}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResponse {
    pub id: String,
    pub status: String,
    /// Expected to be a list of output URLs; kept raw so malformed
    /// payloads are reported instead of failing deserialization.
    #[serde(default)]
    pub output: Option<serde_json::Value>,
    #[serde(default)]
    pub failure: Option<String>,
    #[serde(default)]
    pub failure_code: Option<String>,
    #[serde(default)]
    pub progress: Option<f64>,
}

impl TaskResponse {
    pub fn job_status(&self) -> JobStatus {
        JobStatus::from_backend(&self.status)
    }

    /// First output URL of a succeeded task.
    ///
    /// Returns a description of the problem when the output is missing,
    /// not a list, empty, blank, or not a valid URL.
    pub fn video_url(&self) -> Result<Url, String> {
        let output = match &self.output {
            None | Some(serde_json::Value::Null) => return Err("output is missing".to_string()),
            Some(v) => v,
        };

        let first = output
            .as_array()
            .ok_or_else(|| format!("output is not a list: {output}"))?
            .first()
            .ok_or_else(|| "output list is empty".to_string())?;

        let raw = first
            .as_str()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| format!("first output entry is not a URL: {first}"))?;

        Url::parse(raw).map_err(|e| format!("invalid output URL {raw:?}: {e}"))
    }

    /// Human-readable failure reason.
    pub fn failure_reason(&self) -> String {
        match (&self.failure, &self.failure_code) {
            (Some(f), Some(code)) => format!("{f} ({code})"),
            (Some(f), None) => f.clone(),
            (None, Some(code)) => code.clone(),
            (None, None) => format!("task ended with status {}", self.status),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(output: serde_json::Value) -> TaskResponse {
        serde_json::from_value(serde_json::json!({
            "id": "task-1",
            "status": "SUCCEEDED",
            "output": output,
        }))
        .unwrap()
    }

    #[test]
    fn test_request_serialization() {
        let req = ImageToVideoRequest {
            model: "gen3a_turbo".into(),
            prompt_image: "data:image/png;base64,AAAA".into(),
            prompt_text: "The penguin waddles forward.".into(),
            ratio: None,
            duration: Some(5),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["promptImage"], "data:image/png;base64,AAAA");
        assert_eq!(json["promptText"], "The penguin waddles forward.");
        assert_eq!(json["duration"], 5);
        assert!(json.get("ratio").is_none());
    }

    #[test]
    fn test_video_url_valid() {
        let t = task(serde_json::json!(["https://cdn.example.com/1.mp4"]));
        assert_eq!(t.video_url().unwrap().as_str(), "https://cdn.example.com/1.mp4");
    }

    #[test]
    fn test_video_url_malformed_shapes() {
        assert!(task(serde_json::json!(null)).video_url().is_err());
        assert!(task(serde_json::json!([])).video_url().is_err());
        assert!(task(serde_json::json!([""])).video_url().is_err());
        assert!(task(serde_json::json!([42])).video_url().is_err());
        assert!(task(serde_json::json!("https://cdn.example.com/1.mp4"))
            .video_url()
            .is_err());
        assert!(task(serde_json::json!(["not a url"])).video_url().is_err());
    }

    #[test]
    fn test_failure_reason() {
        let t: TaskResponse = serde_json::from_value(serde_json::json!({
            "id": "task-1",
            "status": "FAILED",
            "failure": "Content moderation",
            "failureCode": "SAFETY.INPUT.IMAGE"
        }))
        .unwrap();
        assert_eq!(t.failure_reason(), "Content moderation (SAFETY.INPUT.IMAGE)");
        assert_eq!(t.job_status(), JobStatus::Failed);
    }
}
