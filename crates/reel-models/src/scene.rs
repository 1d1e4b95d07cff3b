//! Scene definitions.
//!
//! A story is an ordered list of scenes. Each scene maps to exactly one
//! generated clip, and its id names every file produced for it.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::error::{ModelError, ModelResult};

/// Scene identifier. Determines processing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SceneId(pub u32);

impl SceneId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for SceneId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// One unit of the story.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scene {
    pub id: SceneId,
    /// Prompt text. May be blank, in which case a stored fallback is used.
    #[serde(default)]
    pub prompt: String,
}

impl Scene {
    pub fn new(id: impl Into<SceneId>, prompt: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            prompt: prompt.into(),
        }
    }

    /// Prompt text with surrounding whitespace removed, or `None` when blank.
    pub fn prompt_text(&self) -> Option<&str> {
        let trimmed = self.prompt.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }
}

/// Scene entry as returned by a prompt service.
///
/// Services return either `{"id": 1, "prompt": "..."}` objects (id optional)
/// or bare prompt strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawScene {
    Entry {
        #[serde(default)]
        id: Option<u32>,
        #[serde(default)]
        prompt: String,
    },
    Text(String),
}

impl RawScene {
    /// Resolve into a [`Scene`]; `position` is the 0-based list index used
    /// when the entry carries no id.
    pub fn into_scene(self, position: usize) -> Scene {
        let fallback_id = position as u32 + 1;
        match self {
            RawScene::Entry { id, prompt } => Scene::new(id.unwrap_or(fallback_id), prompt),
            RawScene::Text(prompt) => Scene::new(fallback_id, prompt),
        }
    }
}

/// Convert a raw service response into scenes, assigning positional ids.
pub fn scenes_from_raw(raw: Vec<RawScene>) -> Vec<Scene> {
    raw.into_iter()
        .enumerate()
        .map(|(i, r)| r.into_scene(i))
        .collect()
}

/// Validated, id-ordered list of scenes.
///
/// Non-empty, ids positive and unique, sorted ascending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SceneList(Vec<Scene>);

impl SceneList {
    pub fn new(mut scenes: Vec<Scene>) -> ModelResult<Self> {
        if scenes.is_empty() {
            return Err(ModelError::EmptySceneList);
        }

        let mut seen = HashSet::with_capacity(scenes.len());
        for scene in &scenes {
            if scene.id.get() == 0 {
                return Err(ModelError::InvalidSceneId(scene.id));
            }
            if !seen.insert(scene.id) {
                return Err(ModelError::DuplicateSceneId(scene.id));
            }
        }

        scenes.sort_by_key(|s| s.id);
        Ok(Self(scenes))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Scene> {
        self.0.iter()
    }

    pub fn ids(&self) -> Vec<SceneId> {
        self.0.iter().map(|s| s.id).collect()
    }

    pub fn as_slice(&self) -> &[Scene] {
        &self.0
    }
}

impl<'a> IntoIterator for &'a SceneList {
    type Item = &'a Scene;
    type IntoIter = std::slice::Iter<'a, Scene>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl TryFrom<Vec<Scene>> for SceneList {
    type Error = ModelError;

    fn try_from(scenes: Vec<Scene>) -> ModelResult<Self> {
        Self::new(scenes)
    }
}
