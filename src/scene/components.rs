// scene/components.rs
// hecs components making up the editable scene hierarchy

use crate::asset::{Handle, Material, Mesh};
use crate::scene::Transform;
use glam::Mat4;
use serde::{Deserialize, Serialize};

// ============================================================================
// Core Components
// ============================================================================

/// Local transform relative to the parent node
#[derive(Debug, Clone, Copy)]
pub struct TransformComponent(pub Transform);

/// Local-to-world matrix (computed from hierarchy)
#[derive(Debug, Clone, Copy)]
pub struct WorldTransform(pub Mat4);

/// Geometry drawn by this node
#[derive(Debug, Clone, Copy)]
pub struct MeshComponent(pub Handle<Mesh>);

/// How a renderer takes part in shadow rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShadowCasting {
    /// Visible, casts and receives shadows
    On,
    /// Visible, casts no shadows
    Off,
    /// Invisible shadow proxy
    ShadowsOnly,
    /// Casts from both faces; not handled by the batcher
    TwoSided,
}

impl Default for ShadowCasting {
    fn default() -> Self {
        ShadowCasting::On
    }
}

/// Renderer settings of a mesh node. Only the first material slot is
/// considered when batching.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshRenderer {
    pub materials: Vec<Handle<Material>>,
    pub shadow_casting: ShadowCasting,
}

impl MeshRenderer {
    pub fn new(material: Handle<Material>, shadow_casting: ShadowCasting) -> Self {
        Self {
            materials: vec![material],
            shadow_casting,
        }
    }

    pub fn primary_material(&self) -> Option<Handle<Material>> {
        self.materials.first().copied()
    }
}

/// Render layer index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layer(pub u32);

// ============================================================================
// Ownership / bookkeeping
// ============================================================================

/// Marks the root of a nested prefab instance. Nodes at or below it belong to
/// the external template and cannot be restructured until unpacked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefabInstance {
    pub source: String,
}

/// Marks a node produced by the batcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Batched;

#[derive(Debug, Clone)]
pub struct Name(pub String);

impl Name {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

// ============================================================================
// Hierarchy Components
// ============================================================================

/// Parent entity reference
#[derive(Debug, Clone, Copy)]
pub struct Parent(pub hecs::Entity);

/// List of children entities
#[derive(Debug, Clone)]
pub struct Children(pub Vec<hecs::Entity>);
