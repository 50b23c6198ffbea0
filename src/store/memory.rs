use super::{AssetRef, AssetStore, SceneId, SceneQuery, SceneStore, MESH_EXTENSION};
use crate::asset::Mesh;
use crate::error::{BatchError, BatchResult};
use crate::scene::{Scene, SceneDocument};
use std::collections::BTreeMap;

/// Scene units held as serialized documents in memory. Every load rebuilds
/// the scene from its document, so a save/load cycle behaves like the
/// on-disk store.
#[derive(Default)]
pub struct MemorySceneStore {
    documents: BTreeMap<SceneId, SceneDocument>,
    saves: BTreeMap<SceneId, usize>,
    open: usize,
}

impl MemorySceneStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: SceneId, scene: &Scene) {
        self.documents
            .insert(id, SceneDocument::from_scene(scene, true));
    }

    pub fn document(&self, id: &SceneId) -> Option<&SceneDocument> {
        self.documents.get(id)
    }

    /// How many times `id` has been saved.
    pub fn save_count(&self, id: &SceneId) -> usize {
        self.saves.get(id).copied().unwrap_or(0)
    }

    /// Scenes loaded and not yet unloaded.
    pub fn open_scenes(&self) -> usize {
        self.open
    }
}

impl SceneStore for MemorySceneStore {
    fn discover(&self, query: &SceneQuery) -> BatchResult<Vec<SceneId>> {
        Ok(self
            .documents
            .keys()
            .filter(|id| query.matches(id))
            .cloned()
            .collect())
    }

    fn load(&mut self, id: &SceneId) -> BatchResult<Scene> {
        let document = self
            .documents
            .get(id)
            .cloned()
            .ok_or_else(|| BatchError::SceneNotFound(id.clone()))?;
        let scene = document.into_scene(|asset| Err(BatchError::MissingAsset(asset.to_string())))?;
        self.open += 1;
        Ok(scene)
    }

    fn save(&mut self, scene: &Scene, id: &SceneId) -> BatchResult<()> {
        self.documents
            .insert(id.clone(), SceneDocument::from_scene(scene, true));
        *self.saves.entry(id.clone()).or_default() += 1;
        log::trace!("Saved scene unit {}", id);
        Ok(())
    }

    fn unload(&mut self, scene: Scene) {
        self.open = self.open.saturating_sub(1);
        log::trace!("Unloaded scene '{}'", scene.name());
    }
}

/// Generated meshes kept in memory, addressed by their would-be path.
#[derive(Default)]
pub struct MemoryAssetStore {
    meshes: Vec<(AssetRef, Mesh)>,
}

impl MemoryAssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    pub fn get(&self, asset: &AssetRef) -> Option<&Mesh> {
        self.meshes
            .iter()
            .find(|(r, _)| r == asset)
            .map(|(_, mesh)| mesh)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(AssetRef, Mesh)> {
        self.meshes.iter()
    }
}

impl AssetStore for MemoryAssetStore {
    fn persist_mesh(&mut self, mesh: &Mesh, path_hint: &str) -> BatchResult<AssetRef> {
        let asset = AssetRef::new(format!("{}{}", path_hint, MESH_EXTENSION));
        self.meshes.retain(|(r, _)| *r != asset);
        self.meshes.push((asset.clone(), mesh.clone()));
        Ok(asset)
    }
}
