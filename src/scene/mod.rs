// scene/mod.rs

pub mod builder;
pub mod components;
pub mod document;
pub(crate) mod internal;
pub mod scene;
pub mod transform;

pub use builder::NodeBuilder;
pub use document::{MeshData, SceneDocument};
pub use scene::{RenderNode, Scene};
pub use transform::Transform;

pub use components::{
    Batched, Children, Layer, MeshComponent, MeshRenderer, Name, Parent, PrefabInstance,
    ShadowCasting, TransformComponent, WorldTransform,
};
