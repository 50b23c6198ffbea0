pub mod cache;
pub mod handle;
pub mod material;
pub mod mesh;
pub mod primitives;
pub mod vertex;

pub use cache::AssetCache;
pub use handle::Handle;
pub use material::{Material, MaterialFlags};
pub use mesh::{Indices, Mesh};
pub use vertex::Vertex;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Project-relative reference to a persisted asset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetRef(pub String);

impl AssetRef {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Geometry and materials owned by one scene.
pub struct Assets {
    pub meshes: AssetCache<Mesh>,
    pub materials: AssetCache<Material>,
    mesh_refs: HashMap<Handle<Mesh>, AssetRef>,
}

impl Assets {
    pub fn new() -> Self {
        Self {
            meshes: AssetCache::new(),
            materials: AssetCache::new(),
            mesh_refs: HashMap::new(),
        }
    }

    /// Record that `mesh` is backed by a standalone asset file.
    pub fn link_mesh(&mut self, mesh: Handle<Mesh>, asset: AssetRef) {
        self.mesh_refs.insert(mesh, asset);
    }

    pub fn mesh_ref(&self, mesh: Handle<Mesh>) -> Option<&AssetRef> {
        self.mesh_refs.get(&mesh)
    }
}

impl Default for Assets {
    fn default() -> Self {
        Self::new()
    }
}
