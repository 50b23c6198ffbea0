//! Collaborators of the batching pass: where scene units come from and
//! where generated meshes go.

pub mod json;
pub mod memory;

pub use crate::asset::AssetRef;
pub use json::{JsonAssetStore, JsonSceneStore};
pub use memory::{MemoryAssetStore, MemorySceneStore};

use crate::asset::Mesh;
use crate::error::BatchResult;
use crate::scene::Scene;
use crate::settings::BatchSettings;
use serde::{Deserialize, Serialize};
use std::fmt;

/// File suffix of serialized scene units.
pub const SCENE_EXTENSION: &str = ".scene.json";
/// File suffix of standalone mesh assets.
pub const MESH_EXTENSION: &str = ".mesh.json";

/// Project-relative, `/`-separated path identifying one scene unit.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SceneId(pub String);

impl SceneId {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into().replace('\\', "/"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name without directory and scene suffix.
    pub fn stem(&self) -> &str {
        let file = self.0.rsplit('/').next().unwrap_or(&self.0);
        file.strip_suffix(SCENE_EXTENSION)
            .or_else(|| file.rsplit_once('.').map(|(stem, _)| stem))
            .unwrap_or(file)
    }

    /// Directory part, empty for a top-level unit.
    pub fn dir(&self) -> &str {
        self.0.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
    }
}

impl fmt::Display for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which scene units a run should process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneQuery {
    pub search_folders: Vec<String>,
    pub name_filter: String,
}

impl SceneQuery {
    pub fn from_settings(settings: &BatchSettings) -> Self {
        Self {
            search_folders: settings.search_folders.clone(),
            name_filter: settings.name_filter.clone(),
        }
    }

    pub fn matches(&self, id: &SceneId) -> bool {
        let in_folder = self.search_folders.iter().any(|folder| {
            let folder = folder.trim_end_matches('/');
            folder.is_empty() || id.as_str().starts_with(&format!("{}/", folder))
        });
        in_folder && id.stem().contains(&self.name_filter)
    }
}

/// Loads, persists and releases editable scene units.
pub trait SceneStore {
    /// Scene units matching `query`, in a stable order.
    fn discover(&self, query: &SceneQuery) -> BatchResult<Vec<SceneId>>;

    fn load(&mut self, id: &SceneId) -> BatchResult<Scene>;

    fn save(&mut self, scene: &Scene, id: &SceneId) -> BatchResult<()>;

    /// Release the in-memory copy of a unit.
    fn unload(&mut self, scene: Scene);
}

/// Persists generated meshes as standalone, referenceable assets.
pub trait AssetStore {
    /// `path_hint` is a project-relative path without extension.
    fn persist_mesh(&mut self, mesh: &Mesh, path_hint: &str) -> BatchResult<AssetRef>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scene_id_splits_dir_and_stem() {
        let id = SceneId::new("Assets\\Content\\prefab_mesh_rocks.scene.json");
        assert_eq!(id.as_str(), "Assets/Content/prefab_mesh_rocks.scene.json");
        assert_eq!(id.dir(), "Assets/Content");
        assert_eq!(id.stem(), "prefab_mesh_rocks");

        let top = SceneId::new("loose.scene.json");
        assert_eq!(top.dir(), "");
        assert_eq!(top.stem(), "loose");
    }

    #[test]
    fn query_matches_folder_and_name_filter() {
        let query = SceneQuery {
            search_folders: vec!["Assets/Content".into()],
            name_filter: "prefab_mesh_".into(),
        };

        assert!(query.matches(&SceneId::new("Assets/Content/a/prefab_mesh_1.scene.json")));
        assert!(!query.matches(&SceneId::new("Assets/Other/prefab_mesh_1.scene.json")));
        assert!(!query.matches(&SceneId::new("Assets/Content/props.scene.json")));
        assert!(!query.matches(&SceneId::new("Assets/ContentX/prefab_mesh_1.scene.json")));
    }
}
