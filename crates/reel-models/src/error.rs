//! Model validation errors.

use thiserror::Error;

use crate::scene::SceneId;

pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Scene list is empty")]
    EmptySceneList,

    #[error("Duplicate scene id: {0}")]
    DuplicateSceneId(SceneId),

    #[error("Scene ids start at 1, got {0}")]
    InvalidSceneId(SceneId),
}
