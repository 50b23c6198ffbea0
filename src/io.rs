use crate::error::{BatchError, BatchResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

pub(crate) fn load_string(path: &Path) -> BatchResult<String> {
    std::fs::read_to_string(path).map_err(|source| BatchError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Write `contents`, creating missing parent directories.
pub(crate) fn store_string(path: &Path, contents: &str) -> BatchResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|source| BatchError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }

    std::fs::write(path, contents).map_err(|source| BatchError::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn load_json<T: DeserializeOwned>(path: &Path) -> BatchResult<T> {
    let contents = load_string(path)?;
    serde_json::from_str(&contents).map_err(|source| BatchError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn store_json<T: Serialize>(path: &Path, value: &T) -> BatchResult<()> {
    let contents = serde_json::to_string_pretty(value).map_err(|source| BatchError::Serialize {
        what: path.display().to_string(),
        source,
    })?;
    store_string(path, &contents)
}
