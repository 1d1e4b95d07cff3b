//! Story orchestrator.
//!
//! Drives scenes strictly one after another. Each scene is generated from
//! the current seed image; the last frame of its clip becomes the seed for
//! the next scene. The first scene-level failure stops the sequence, and
//! whatever clips exist by then are merged into the final video.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, Instrument};

use reel_models::{Clip, RunId, Scene, SceneFailure, SceneList, StoryLayout, StoryResult};

use crate::error::{WorkerError, WorkerResult};
use crate::logging::StoryLogger;
use crate::metrics;
use crate::prompt::resolve_prompt;
use crate::services::{ClipMerger, LastFrameExtractor, SceneGenerator};

/// Runs a scene list against the generation backend and merges the clips.
pub struct StoryOrchestrator {
    generator: Arc<dyn SceneGenerator>,
    extractor: Arc<dyn LastFrameExtractor>,
    merger: Arc<dyn ClipMerger>,
    layout: StoryLayout,
    story: String,
}

impl StoryOrchestrator {
    pub fn new(
        generator: Arc<dyn SceneGenerator>,
        extractor: Arc<dyn LastFrameExtractor>,
        merger: Arc<dyn ClipMerger>,
        layout: StoryLayout,
    ) -> Self {
        Self {
            generator,
            extractor,
            merger,
            layout,
            story: "story".to_string(),
        }
    }

    /// Name used in logs for this story.
    pub fn with_story_name(mut self, name: impl Into<String>) -> Self {
        self.story = name.into();
        self
    }

    pub fn layout(&self) -> &StoryLayout {
        &self.layout
    }

    /// Run every scene in ascending id order starting from `initial_seed`.
    ///
    /// Returns a partial result when a scene fails after at least one clip
    /// was produced. Fails with [`WorkerError::NoOutput`] when the clips
    /// cannot be merged, including when no clip survived.
    pub async fn run(&self, scenes: &SceneList, initial_seed: PathBuf) -> WorkerResult<StoryResult> {
        let run_id = RunId::new();
        let logger = StoryLogger::new(&run_id, &self.story);
        let span = logger.create_span();

        self.run_scenes(run_id, &logger, scenes, initial_seed)
            .instrument(span)
            .await
    }

    async fn run_scenes(
        &self,
        run_id: RunId,
        logger: &StoryLogger,
        scenes: &SceneList,
        initial_seed: PathBuf,
    ) -> WorkerResult<StoryResult> {
        let started_at = Utc::now();
        let timer = Instant::now();

        logger.log_start(&format!(
            "{} scenes from seed {}",
            scenes.len(),
            initial_seed.display()
        ));

        for dir in [
            &self.layout.clips_dir,
            &self.layout.frames_dir,
            &self.layout.output_dir,
        ] {
            tokio::fs::create_dir_all(dir).await?;
        }

        let mut clips: Vec<Clip> = Vec::with_capacity(scenes.len());
        let mut failure: Option<SceneFailure> = None;
        let mut skipped = Vec::new();
        let mut seed = initial_seed;

        for (index, scene) in scenes.iter().enumerate() {
            let scene_timer = Instant::now();

            match self.run_scene(scene, &seed, logger).await {
                Ok((clip_path, frame)) => {
                    metrics::record_scene("succeeded", scene_timer.elapsed().as_secs_f64());
                    clips.push(Clip {
                        scene_id: scene.id,
                        path: clip_path,
                        seed_image: seed,
                    });
                    seed = frame;
                }
                Err(e) => {
                    let kind = e.scene_failure_kind();
                    metrics::record_scene(kind.as_str(), scene_timer.elapsed().as_secs_f64());
                    logger.log_error(&format!("scene {} failed ({}): {}", scene.id, kind, e));

                    skipped = scenes.as_slice()[index + 1..]
                        .iter()
                        .map(|s| s.id)
                        .collect();
                    if !skipped.is_empty() {
                        logger.log_warning(&format!(
                            "skipping {} remaining scene(s) after scene {}",
                            skipped.len(),
                            scene.id
                        ));
                    }

                    failure = Some(SceneFailure {
                        scene_id: scene.id,
                        kind,
                        message: e.to_string(),
                    });
                    break;
                }
            }
        }

        let final_video = self.layout.final_video_path();
        let clip_paths: Vec<PathBuf> = clips.iter().map(|c| c.path.clone()).collect();

        // The final video only exists when this run merged it
        match tokio::fs::remove_file(&final_video).await {
            Ok(()) => debug!(video = %final_video.display(), "Removed previous final video"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        if let Err(source) = self.merger.concatenate(&clip_paths, &final_video).await {
            logger.log_error(&format!("merge of {} clip(s) failed: {}", clip_paths.len(), source));
            if let Some(stderr) = source.stderr() {
                logger.log_warning(&format!("ffmpeg stderr: {stderr}"));
            }
            metrics::record_story("no_output", timer.elapsed().as_secs_f64());
            return Err(WorkerError::NoOutput {
                failed_scene: failure.as_ref().map(|f| f.scene_id),
                source,
            });
        }

        let result = StoryResult {
            run_id,
            requested_scenes: scenes.len(),
            clips,
            final_video,
            failure,
            skipped,
            started_at,
            finished_at: Utc::now(),
        };

        let outcome = if result.is_complete() { "complete" } else { "partial" };
        metrics::record_story(outcome, timer.elapsed().as_secs_f64());
        logger.log_completion(&format!(
            "{} of {} clips merged into {} ({})",
            result.clips.len(),
            result.requested_scenes,
            result.final_video.display(),
            outcome
        ));

        Ok(result)
    }

    /// Generate one scene and extract the seed for the next.
    async fn run_scene(
        &self,
        scene: &Scene,
        seed: &Path,
        logger: &StoryLogger,
    ) -> WorkerResult<(PathBuf, PathBuf)> {
        let prompt = resolve_prompt(scene, &self.layout).await?;

        logger.log_scene(scene.id, "generating clip");
        let clip = self
            .generator
            .generate(scene.id, seed, &prompt, &self.layout.clip_path(scene.id))
            .await?;

        let frame = self
            .extractor
            .extract_last_frame(&clip, &self.layout.frame_path(scene.id))
            .await?;

        logger.log_scene(
            scene.id,
            &format!("clip {} ready, next seed {}", clip.display(), frame.display()),
        );
        Ok((clip, frame))
    }
}
