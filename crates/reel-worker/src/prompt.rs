//! Scene prompt resolution and persistence.

use tracing::{debug, warn};

use reel_models::{Scene, SceneList, StoryLayout};

use crate::error::{WorkerError, WorkerResult};

/// Prompt text for a scene.
///
/// The scene's own prompt wins when it is non-blank; otherwise the fallback
/// file `<prompts_dir>/<id>.txt` is read. A missing, unreadable or blank
/// fallback is a `MissingPrompt` error.
pub async fn resolve_prompt(scene: &Scene, layout: &StoryLayout) -> WorkerResult<String> {
    if let Some(text) = scene.prompt_text() {
        return Ok(text.to_string());
    }

    let path = layout.prompt_path(scene.id);
    match tokio::fs::read_to_string(&path).await {
        Ok(contents) if !contents.trim().is_empty() => {
            debug!(scene_id = %scene.id, path = %path.display(), "Using fallback prompt file");
            Ok(contents.trim().to_string())
        }
        Ok(_) => Err(WorkerError::MissingPrompt {
            scene_id: scene.id,
            path,
        }),
        Err(e) => {
            debug!(scene_id = %scene.id, path = %path.display(), error = %e, "Fallback prompt unreadable");
            Err(WorkerError::MissingPrompt {
                scene_id: scene.id,
                path,
            })
        }
    }
}

/// Write every non-blank scene prompt to its fallback file.
///
/// Failures are logged and skipped. Returns the number of files written.
pub async fn save_scene_prompts(scenes: &SceneList, layout: &StoryLayout) -> usize {
    if let Err(e) = tokio::fs::create_dir_all(&layout.prompts_dir).await {
        warn!(dir = %layout.prompts_dir.display(), error = %e, "Failed to create prompts directory");
        return 0;
    }

    let mut written = 0;
    for scene in scenes {
        let Some(text) = scene.prompt_text() else {
            continue;
        };
        let path = layout.prompt_path(scene.id);
        match tokio::fs::write(&path, text).await {
            Ok(()) => written += 1,
            Err(e) => warn!(scene_id = %scene.id, path = %path.display(), error = %e, "Failed to save scene prompt"),
        }
    }
    written
}

#[cfg(test)]
mod tests {
    use super::*;
    use reel_models::SceneId;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_scene_prompt_wins() {
        let dir = TempDir::new().unwrap();
        let layout = StoryLayout::under(dir.path());
        tokio::fs::create_dir_all(&layout.prompts_dir).await.unwrap();
        tokio::fs::write(layout.prompt_path(SceneId(1)), "from file")
            .await
            .unwrap();

        let prompt = resolve_prompt(&Scene::new(1, "  from scene  "), &layout)
            .await
            .unwrap();
        assert_eq!(prompt, "from scene");
    }

    #[tokio::test]
    async fn test_blank_prompt_uses_fallback_file() {
        let dir = TempDir::new().unwrap();
        let layout = StoryLayout::under(dir.path());
        tokio::fs::create_dir_all(&layout.prompts_dir).await.unwrap();
        tokio::fs::write(layout.prompt_path(SceneId(2)), "The camera tilts upward.\n")
            .await
            .unwrap();

        let prompt = resolve_prompt(&Scene::new(2, "   "), &layout).await.unwrap();
        assert_eq!(prompt, "The camera tilts upward.");
    }

    #[tokio::test]
    async fn test_missing_fallback_is_error() {
        let dir = TempDir::new().unwrap();
        let layout = StoryLayout::under(dir.path());

        let err = resolve_prompt(&Scene::new(3, ""), &layout).await.unwrap_err();
        match err {
            WorkerError::MissingPrompt { scene_id, path } => {
                assert_eq!(scene_id, SceneId(3));
                assert_eq!(path, layout.prompt_path(SceneId(3)));
            }
            other => panic!("expected MissingPrompt, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_blank_fallback_is_error() {
        let dir = TempDir::new().unwrap();
        let layout = StoryLayout::under(dir.path());
        tokio::fs::create_dir_all(&layout.prompts_dir).await.unwrap();
        tokio::fs::write(layout.prompt_path(SceneId(1)), "\n  \n")
            .await
            .unwrap();

        assert!(matches!(
            resolve_prompt(&Scene::new(1, ""), &layout).await,
            Err(WorkerError::MissingPrompt { .. })
        ));
    }

    #[tokio::test]
    async fn test_save_scene_prompts_skips_blank() {
        let dir = TempDir::new().unwrap();
        let layout = StoryLayout::under(dir.path()).for_story("penguin");
        let scenes =
            SceneList::new(vec![Scene::new(1, "walk"), Scene::new(2, " "), Scene::new(3, "jump")])
                .unwrap();

        assert_eq!(save_scene_prompts(&scenes, &layout).await, 2);
        assert_eq!(
            tokio::fs::read_to_string(layout.prompt_path(SceneId(3)))
                .await
                .unwrap(),
            "jump"
        );
        assert!(!layout.prompt_path(SceneId(2)).exists());
    }
}
