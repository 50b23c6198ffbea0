use super::{AssetRef, AssetStore, SceneId, SceneQuery, SceneStore, MESH_EXTENSION, SCENE_EXTENSION};
use crate::asset::Mesh;
use crate::error::{BatchError, BatchResult};
use crate::io;
use crate::scene::{MeshData, Scene, SceneDocument};
use std::path::{Path, PathBuf};

/// Scene units stored as `*.scene.json` files under a project directory.
/// Meshes linked to standalone assets are saved by reference.
pub struct JsonSceneStore {
    root: PathBuf,
}

impl JsonSceneStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_of(&self, id: &SceneId) -> PathBuf {
        self.root.join(id.as_str())
    }

    fn relative_id(&self, path: &Path) -> Option<SceneId> {
        let relative = path.strip_prefix(&self.root).ok()?;
        let parts: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        Some(SceneId::new(parts.join("/")))
    }

    fn collect_scenes(&self, dir: &Path, query: &SceneQuery, found: &mut Vec<SceneId>) -> BatchResult<()> {
        let entries = std::fs::read_dir(dir).map_err(|source| BatchError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        for entry in entries {
            let entry = entry.map_err(|source| BatchError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
            let path = entry.path();
            if path.is_dir() {
                self.collect_scenes(&path, query, found)?;
                continue;
            }

            let is_scene = path
                .file_name()
                .map(|name| name.to_string_lossy().ends_with(SCENE_EXTENSION))
                .unwrap_or(false);
            if !is_scene {
                continue;
            }

            if let Some(id) = self.relative_id(&path) {
                if id.stem().contains(&query.name_filter) {
                    found.push(id);
                }
            }
        }

        Ok(())
    }
}

impl SceneStore for JsonSceneStore {
    fn discover(&self, query: &SceneQuery) -> BatchResult<Vec<SceneId>> {
        let mut found = Vec::new();

        for folder in &query.search_folders {
            let dir = self.root.join(folder);
            if !dir.is_dir() {
                log::warn!("Search folder {:?} does not exist; skipping", dir);
                continue;
            }
            self.collect_scenes(&dir, query, &mut found)?;
        }

        found.sort();
        found.dedup();
        log::debug!("Discovered {} scene units under {:?}", found.len(), self.root);
        Ok(found)
    }

    fn load(&mut self, id: &SceneId) -> BatchResult<Scene> {
        let path = self.path_of(id);
        if !path.is_file() {
            return Err(BatchError::SceneNotFound(id.clone()));
        }

        let document: SceneDocument = io::load_json(&path)?;
        let root = self.root.clone();
        document.into_scene(|asset| load_mesh_asset(&root, asset))
    }

    fn save(&mut self, scene: &Scene, id: &SceneId) -> BatchResult<()> {
        let document = SceneDocument::from_scene(scene, false);
        io::store_json(&self.path_of(id), &document)?;
        log::debug!("Saved scene unit {}", id);
        Ok(())
    }

    fn unload(&mut self, scene: Scene) {
        log::trace!("Unloaded scene '{}'", scene.name());
    }
}

/// Writes generated meshes as `<hint>.mesh.json` under the project directory.
pub struct JsonAssetStore {
    root: PathBuf,
}

impl JsonAssetStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl AssetStore for JsonAssetStore {
    fn persist_mesh(&mut self, mesh: &Mesh, path_hint: &str) -> BatchResult<AssetRef> {
        let asset = AssetRef::new(format!("{}{}", path_hint, MESH_EXTENSION));
        io::store_json(&self.root.join(asset.as_str()), &MeshData::encode(mesh))?;
        log::debug!(
            "Wrote mesh asset {} ({} vertices)",
            asset,
            mesh.vertex_count()
        );
        Ok(asset)
    }
}

/// Read a standalone mesh asset relative to the project root.
pub fn load_mesh_asset(root: &Path, asset: &AssetRef) -> BatchResult<Mesh> {
    let path = root.join(asset.as_str());
    if !path.is_file() {
        return Err(BatchError::MissingAsset(asset.to_string()));
    }
    let data: MeshData = io::load_json(&path)?;
    data.decode()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::primitives;
    use tempfile::tempdir;

    fn query() -> SceneQuery {
        SceneQuery {
            search_folders: vec!["Assets/Content".into()],
            name_filter: "prefab_mesh_".into(),
        }
    }

    #[test]
    fn discover_walks_folders_recursively_and_filters_by_name() {
        let dir = tempdir().expect("temp dir");
        let mut store = JsonSceneStore::new(dir.path());

        for id in [
            "Assets/Content/b/prefab_mesh_b.scene.json",
            "Assets/Content/prefab_mesh_a.scene.json",
            "Assets/Content/props.scene.json",
            "Assets/Other/prefab_mesh_c.scene.json",
        ] {
            let id = SceneId::new(id);
            store.save(&Scene::new(id.stem()), &id).expect("save");
        }
        io::store_string(&dir.path().join("Assets/Content/prefab_mesh_notes.txt"), "x").unwrap();

        let found = store.discover(&query()).expect("discover");
        assert_eq!(
            found,
            vec![
                SceneId::new("Assets/Content/b/prefab_mesh_b.scene.json"),
                SceneId::new("Assets/Content/prefab_mesh_a.scene.json"),
            ]
        );
    }

    #[test]
    fn missing_search_folder_yields_nothing() {
        let dir = tempdir().expect("temp dir");
        let store = JsonSceneStore::new(dir.path());
        assert!(store.discover(&query()).expect("discover").is_empty());
    }

    #[test]
    fn persisted_mesh_is_resolved_on_load() {
        let dir = tempdir().expect("temp dir");
        let mut store = JsonSceneStore::new(dir.path());
        let mut assets = JsonAssetStore::new(dir.path());
        let id = SceneId::new("Assets/Content/prefab_mesh_a.scene.json");

        let mut scene = Scene::new("prefab_mesh_a");
        let grid = primitives::grid_mesh(2, 2);
        let asset = assets
            .persist_mesh(&grid, "Assets/Content/prefab_mesh_a_Stone")
            .expect("persist");
        let handle = scene.assets.meshes.insert(grid.clone());
        scene.assets.link_mesh(handle, asset.clone());
        let root = scene.root();
        crate::scene::NodeBuilder::new(&mut scene)
            .with_mesh(handle)
            .child_of(root)
            .spawn();

        store.save(&scene, &id).expect("save");
        let saved = std::fs::read_to_string(store.path_of(&id)).unwrap();
        assert!(saved.contains("prefab_mesh_a_Stone.mesh.json"));
        assert!(!saved.contains("\"vertices\""));

        let mut loaded = store.load(&id).expect("load");
        let nodes = loaded.render_nodes();
        assert_eq!(nodes.len(), 1);
        assert_eq!(loaded.assets.meshes.get(nodes[0].mesh), Some(&grid));
        assert_eq!(loaded.assets.mesh_ref(nodes[0].mesh), Some(&asset));
    }

    #[test]
    fn dangling_asset_reference_is_reported() {
        let dir = tempdir().expect("temp dir");
        let err = load_mesh_asset(dir.path(), &AssetRef::new("nope.mesh.json")).unwrap_err();
        assert!(matches!(err, BatchError::MissingAsset(_)));
    }

    #[test]
    fn corrupt_scene_file_is_a_parse_error() {
        let dir = tempdir().expect("temp dir");
        let mut store = JsonSceneStore::new(dir.path());
        let id = SceneId::new("Assets/Content/prefab_mesh_bad.scene.json");
        io::store_string(&store.path_of(&id), "{ not json").unwrap();

        assert!(matches!(store.load(&id), Err(BatchError::Parse { .. })));
    }
}
