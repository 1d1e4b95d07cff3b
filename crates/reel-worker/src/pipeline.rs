//! Per-photo story pipeline.
//!
//! For each source image: caption it, optionally restyle it, expand the
//! caption into scenes, and hand the scenes to a [`StoryOrchestrator`] with
//! a layout private to that image.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{error, info, warn};

use reel_models::{is_source_image, SceneList, StoryLayout, StoryResult};

use crate::error::{WorkerError, WorkerResult};
use crate::orchestrator::StoryOrchestrator;
use crate::prompt::save_scene_prompts;
use crate::services::{CaptionService, ClipMerger, ImageRestyler, LastFrameExtractor, SceneGenerator};

/// Outcome for one source image.
#[derive(Debug)]
pub struct PhotoOutcome {
    pub image: PathBuf,
    pub result: WorkerResult<StoryResult>,
}

/// Wires the collaborators together for whole-photo processing.
pub struct StoryPipeline {
    captioner: Arc<dyn CaptionService>,
    restyler: Option<Arc<dyn ImageRestyler>>,
    generator: Arc<dyn SceneGenerator>,
    extractor: Arc<dyn LastFrameExtractor>,
    merger: Arc<dyn ClipMerger>,
    layout: StoryLayout,
}

impl StoryPipeline {
    pub fn new(
        captioner: Arc<dyn CaptionService>,
        generator: Arc<dyn SceneGenerator>,
        extractor: Arc<dyn LastFrameExtractor>,
        merger: Arc<dyn ClipMerger>,
        layout: StoryLayout,
    ) -> Self {
        Self {
            captioner,
            restyler: None,
            generator,
            extractor,
            merger,
            layout,
        }
    }

    /// Restyle each image before animating it.
    pub fn with_restyler(mut self, restyler: Arc<dyn ImageRestyler>) -> Self {
        self.restyler = Some(restyler);
        self
    }

    pub fn layout(&self) -> &StoryLayout {
        &self.layout
    }

    /// Turn one image into a story video.
    pub async fn process_image(&self, image: &Path) -> WorkerResult<StoryResult> {
        let story = story_name(image);
        info!(image = %image.display(), story = %story, "Processing image");

        let caption = self.captioner.caption(image).await?;

        let seed = match &self.restyler {
            Some(restyler) => restyler.restyle(image, &caption).await?,
            None => image.to_path_buf(),
        };

        let scenes = self.captioner.expand_to_scenes(&caption).await?;
        if scenes.is_empty() {
            return Err(WorkerError::EmptyStory);
        }
        let scenes = SceneList::new(scenes)?;

        let layout = self.layout.for_story(&story);
        save_scene_prompts(&scenes, &layout).await;

        StoryOrchestrator::new(
            Arc::clone(&self.generator),
            Arc::clone(&self.extractor),
            Arc::clone(&self.merger),
            layout,
        )
        .with_story_name(story)
        .run(&scenes, seed)
        .await
    }

    /// Process every source image in the photos directory, one at a time.
    ///
    /// A failing image is logged and does not stop the others.
    pub async fn process_photos(&self) -> WorkerResult<Vec<PhotoOutcome>> {
        let images = list_source_images(&self.layout.photos_dir).await?;
        if images.is_empty() {
            warn!(dir = %self.layout.photos_dir.display(), "No source images found");
        }

        let mut outcomes = Vec::with_capacity(images.len());
        for image in images {
            let result = self.process_image(&image).await;
            match &result {
                Ok(story) => info!(
                    image = %image.display(),
                    video = %story.final_video.display(),
                    clips = story.clips.len(),
                    complete = story.is_complete(),
                    elapsed_secs = story.elapsed_secs(),
                    "Saved story video"
                ),
                Err(e) => error!(image = %image.display(), error = %e, "Failed to process image"),
            }
            outcomes.push(PhotoOutcome { image, result });
        }
        Ok(outcomes)
    }
}

/// Source images in `dir`, sorted by file name.
pub async fn list_source_images(dir: &Path) -> WorkerResult<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut images = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if entry.file_type().await?.is_file() && is_source_image(&path) {
            images.push(path);
        }
    }
    images.sort();
    Ok(images)
}

fn story_name(image: &Path) -> String {
    image
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "story".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use reel_models::{Scene, SceneId};
    use tempfile::TempDir;

    use crate::services::{
        MockCaptionService, MockClipMerger, MockImageRestyler, MockLastFrameExtractor,
        MockSceneGenerator,
    };

    fn captioner(scenes: Vec<Scene>) -> MockCaptionService {
        let mut captioner = MockCaptionService::new();
        captioner
            .expect_caption()
            .returning(|_| Ok("A cartoon penguin on rocks.".to_string()));
        captioner
            .expect_expand_to_scenes()
            .returning(move |_| Ok(scenes.clone()));
        captioner
    }

    fn generator(seeds: Arc<Mutex<Vec<PathBuf>>>) -> MockSceneGenerator {
        let mut generator = MockSceneGenerator::new();
        generator
            .expect_generate()
            .returning(move |_id, seed, _prompt, dest| {
                seeds.lock().unwrap().push(seed.to_path_buf());
                std::fs::write(dest, b"clip").unwrap();
                Ok(dest.to_path_buf())
            });
        generator
    }

    fn extractor() -> MockLastFrameExtractor {
        let mut extractor = MockLastFrameExtractor::new();
        extractor
            .expect_extract_last_frame()
            .returning(|_clip, output| {
                std::fs::write(output, b"frame").unwrap();
                Ok(output.to_path_buf())
            });
        extractor
    }

    fn merger() -> MockClipMerger {
        let mut merger = MockClipMerger::new();
        merger.expect_concatenate().returning(|_clips, output| {
            std::fs::write(output, b"final").unwrap();
            Ok(())
        });
        merger
    }

    fn pipeline(
        layout: StoryLayout,
        captioner: MockCaptionService,
        generator: MockSceneGenerator,
    ) -> StoryPipeline {
        StoryPipeline::new(
            Arc::new(captioner),
            Arc::new(generator),
            Arc::new(extractor()),
            Arc::new(merger()),
            layout,
        )
    }

    fn write_photo(layout: &StoryLayout, name: &str) -> PathBuf {
        std::fs::create_dir_all(&layout.photos_dir).unwrap();
        let path = layout.photos_dir.join(name);
        std::fs::write(&path, b"photo").unwrap();
        path
    }

    #[tokio::test]
    async fn test_empty_story_aborts_before_generation() {
        let dir = TempDir::new().unwrap();
        let layout = StoryLayout::under(dir.path());
        let image = write_photo(&layout, "penguin.png");

        let mut generator = MockSceneGenerator::new();
        generator.expect_generate().never();

        let err = pipeline(layout, captioner(vec![]), generator)
            .process_image(&image)
            .await
            .unwrap_err();
        assert!(matches!(err, WorkerError::EmptyStory));
    }

    #[tokio::test]
    async fn test_duplicate_scene_ids_rejected() {
        let dir = TempDir::new().unwrap();
        let layout = StoryLayout::under(dir.path());
        let image = write_photo(&layout, "penguin.png");

        let mut generator = MockSceneGenerator::new();
        generator.expect_generate().never();

        let scenes = vec![Scene::new(1, "walk"), Scene::new(1, "jump")];
        let err = pipeline(layout, captioner(scenes), generator)
            .process_image(&image)
            .await
            .unwrap_err();
        assert!(matches!(err, WorkerError::Model(_)));
    }

    #[tokio::test]
    async fn test_story_uses_per_image_layout_and_saves_prompts() {
        let dir = TempDir::new().unwrap();
        let layout = StoryLayout::under(dir.path());
        let image = write_photo(&layout, "penguin.png");
        let seeds = Arc::new(Mutex::new(Vec::new()));

        let scenes = vec![Scene::new(1, "walk"), Scene::new(2, "jump")];
        let result = pipeline(layout.clone(), captioner(scenes), generator(seeds.clone()))
            .process_image(&image)
            .await
            .unwrap();

        let story_layout = layout.for_story("penguin");
        assert!(result.is_complete());
        assert_eq!(result.final_video, story_layout.final_video_path());
        assert_eq!(seeds.lock().unwrap()[0], image);
        assert_eq!(
            std::fs::read_to_string(story_layout.prompt_path(SceneId(2))).unwrap(),
            "jump"
        );
    }

    #[tokio::test]
    async fn test_restyled_image_seeds_first_scene() {
        let dir = TempDir::new().unwrap();
        let layout = StoryLayout::under(dir.path());
        let image = write_photo(&layout, "penguin.png");
        let restyled = layout.restyled_path(&image);
        let seeds = Arc::new(Mutex::new(Vec::new()));

        let mut restyler = MockImageRestyler::new();
        let output = restyled.clone();
        restyler
            .expect_restyle()
            .withf(|_image, prompt| prompt == "A cartoon penguin on rocks.")
            .times(1)
            .returning(move |_, _| Ok(output.clone()));

        let result = pipeline(
            layout,
            captioner(vec![Scene::new(1, "walk")]),
            generator(seeds.clone()),
        )
        .with_restyler(Arc::new(restyler))
        .process_image(&image)
        .await
        .unwrap();

        assert_eq!(result.clips[0].seed_image, restyled);
        assert_eq!(*seeds.lock().unwrap(), vec![restyled]);
    }

    #[tokio::test]
    async fn test_process_photos_continues_after_failure() {
        let dir = TempDir::new().unwrap();
        let layout = StoryLayout::under(dir.path());
        write_photo(&layout, "b_penguin.JPG");
        write_photo(&layout, "a_broken.png");
        write_photo(&layout, "notes.txt");

        let mut captioner = MockCaptionService::new();
        captioner.expect_caption().returning(|image| {
            if image.ends_with("a_broken.png") {
                Err(WorkerError::caption("unreadable image"))
            } else {
                Ok("A cartoon penguin.".to_string())
            }
        });
        captioner
            .expect_expand_to_scenes()
            .returning(|_| Ok(vec![Scene::new(1, "walk")]));

        let outcomes = pipeline(layout.clone(), captioner, generator(Arc::default()))
            .process_photos()
            .await
            .unwrap();

        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].image, layout.photos_dir.join("a_broken.png"));
        assert!(matches!(outcomes[0].result, Err(WorkerError::Caption(_))));
        assert_eq!(outcomes[1].image, layout.photos_dir.join("b_penguin.JPG"));
        assert!(outcomes[1].result.as_ref().unwrap().is_complete());
    }

    #[tokio::test]
    async fn test_list_source_images_filters_and_sorts() {
        let dir = TempDir::new().unwrap();
        for name in ["c.webp", "a.jpeg", "b.gif", "readme.md"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(dir.path().join("d.png")).unwrap();

        let images = list_source_images(dir.path()).await.unwrap();
        assert_eq!(
            images,
            vec![dir.path().join("a.jpeg"), dir.path().join("c.webp")]
        );
    }

    #[test]
    fn test_story_name() {
        assert_eq!(story_name(Path::new("/photos/penguin.png")), "penguin");
    }
}
