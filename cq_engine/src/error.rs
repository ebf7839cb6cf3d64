use std::io;
use std::path::PathBuf;

use cq_state::{SceneId, StoreError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("scene not found: {0}")]
    UnknownScene(SceneId),
    #[error("scene load already in progress, ignoring request for {0}")]
    SceneLoadInProgress(SceneId),
    #[error("no save found in slot {0}")]
    NoSave(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("failed to read config {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
