//! Story worker binary.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use reel_media::{check_ffmpeg, check_ffprobe, ClipConcatenator, FfmpegRunner, FrameExtractor};
use reel_runway::RunwayClient;
use reel_worker::metrics::init_metrics;
use reel_worker::{HttpRestyler, OpenAiCaptioner, RestyleConfig, StoryPipeline, WorkerConfig};

/// Turn photos into short animated story videos.
#[derive(Debug, Parser)]
#[command(name = "storyreel", version)]
struct Args {
    /// Restyle each photo before animating it
    #[arg(long, alias = "cartoonize")]
    restyle: bool,

    /// Directory of source photos
    #[arg(long)]
    photos_dir: Option<PathBuf>,

    /// Root of the data directory tree
    #[arg(long)]
    base_dir: Option<PathBuf>,

    /// Process a single image instead of the photos directory
    #[arg(long)]
    image: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env().add_directive("reel=info".parse()?);

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    info!("Starting storyreel");

    let mut config = WorkerConfig::from_env();
    if let Some(base_dir) = args.base_dir {
        config = config.with_base_dir(base_dir);
    }
    if let Some(photos_dir) = args.photos_dir {
        config = config.with_photos_dir(photos_dir);
    }
    if args.restyle {
        config = config.with_restyle(true);
    }
    info!("Worker config: {:?}", config);

    if let Some(addr) = &config.metrics_addr {
        init_metrics(addr)?;
        info!(addr = %addr, "Prometheus exporter listening");
    }

    let ffmpeg = check_ffmpeg().context("ffmpeg is required")?;
    let ffprobe = check_ffprobe().context("ffprobe is required")?;
    info!(ffmpeg = %ffmpeg.display(), ffprobe = %ffprobe.display(), "Found media tools");

    for dir in config.layout.all_dirs() {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("failed to create {}", dir.display()))?;
    }

    let runway = RunwayClient::from_env().context("failed to create Runway client")?;
    let captioner = OpenAiCaptioner::from_env().context("failed to create caption client")?;

    let ffmpeg_runner = FfmpegRunner::new().with_timeout(config.ffmpeg_timeout_secs);

    let mut pipeline = StoryPipeline::new(
        Arc::new(captioner),
        Arc::new(runway),
        Arc::new(FrameExtractor::new().with_ffmpeg(ffmpeg_runner.clone())),
        Arc::new(ClipConcatenator::new().with_ffmpeg(ffmpeg_runner)),
        config.layout.clone(),
    );
    if config.restyle {
        let restyler = HttpRestyler::new(RestyleConfig::from_env(), config.layout.clone())
            .context("failed to create restyle client")?;
        pipeline = pipeline.with_restyler(Arc::new(restyler));
    }

    match args.image {
        Some(image) => {
            let story = pipeline.process_image(&image).await?;
            if let Some(failure) = &story.failure {
                warn!(
                    scene_id = %failure.scene_id,
                    kind = %failure.kind,
                    skipped = story.skipped.len(),
                    "Story is partial"
                );
            }
            info!(
                video = %story.final_video.display(),
                elapsed_secs = story.elapsed_secs(),
                "Saved video"
            );
        }
        None => {
            let outcomes = pipeline.process_photos().await?;
            let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
            if failed > 0 {
                error!(failed = failed, total = outcomes.len(), "Some images failed");
            }
            info!(
                processed = outcomes.len() - failed,
                total = outcomes.len(),
                "All images processed"
            );
        }
    }

    Ok(())
}
