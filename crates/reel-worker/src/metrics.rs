//! Prometheus metrics for story runs.

use std::net::SocketAddr;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::error::{WorkerError, WorkerResult};

/// Metric names as constants for consistency.
pub mod names {
    pub const SCENES_TOTAL: &str = "reel_scenes_total";
    pub const SCENE_DURATION_SECONDS: &str = "reel_scene_duration_seconds";
    pub const STORIES_TOTAL: &str = "reel_stories_total";
    pub const STORY_DURATION_SECONDS: &str = "reel_story_duration_seconds";
}

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: &str) -> WorkerResult<()> {
    let addr: SocketAddr = addr
        .parse()
        .map_err(|e| WorkerError::config_error(format!("invalid METRICS_ADDR {addr:?}: {e}")))?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| WorkerError::config_error(format!("failed to install metrics exporter: {e}")))
}

/// Record the outcome of one scene (`succeeded` or a failure kind).
pub fn record_scene(outcome: &str, duration_secs: f64) {
    let labels = [("outcome", outcome.to_string())];
    counter!(names::SCENES_TOTAL, &labels).increment(1);
    histogram!(names::SCENE_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record the outcome of one story run (`complete`, `partial` or `no_output`).
pub fn record_story(outcome: &str, duration_secs: f64) {
    let labels = [("outcome", outcome.to_string())];
    counter!(names::STORIES_TOTAL, &labels).increment(1);
    histogram!(names::STORY_DURATION_SECONDS, &labels).record(duration_secs);
}
