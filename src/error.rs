use crate::store::SceneId;
use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the batching pass and its collaborators.
#[derive(Error, Debug)]
pub enum BatchError {
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to serialize {what}: {source}")]
    Serialize {
        what: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Malformed geometry: {0}")]
    Decode(String),
    #[error("Scene unit not found: {0}")]
    SceneNotFound(SceneId),
    #[error("Invalid scene document: {0}")]
    InvalidDocument(String),
    #[error("Invalid hierarchy edit: {0}")]
    InvalidHierarchy(String),
    #[error("Node '{node}' is owned by a nested prefab instance; unpack it first")]
    PrefabOwned { node: String },
    #[error("Missing asset: {0}")]
    MissingAsset(String),
}

pub type BatchResult<T> = Result<T, BatchError>;
