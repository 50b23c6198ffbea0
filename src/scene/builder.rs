// scene/builder.rs
// Fluent helper for spawning scene nodes

use super::components::*;
use super::internal::hierarchy;
use super::Scene;
use crate::asset::{Handle, Material, Mesh};
use crate::scene::Transform;

/// Helper for building nodes with a fluent API.
/// Structural ownership checks are not applied here; the builder is how
/// loaders reconstruct hierarchies, prefab instances included.
pub struct NodeBuilder<'s> {
    scene: &'s mut Scene,
    builder: hecs::EntityBuilder,
    transform: Transform,
    parent: Option<hecs::Entity>,
}

impl<'s> NodeBuilder<'s> {
    pub fn new(scene: &'s mut Scene) -> Self {
        Self {
            scene,
            builder: hecs::EntityBuilder::new(),
            transform: Transform::IDENTITY,
            parent: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.builder.add(Name::new(name));
        self
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_mesh(mut self, mesh: Handle<Mesh>) -> Self {
        self.builder.add(MeshComponent(mesh));
        self
    }

    /// Single-material renderer
    pub fn with_renderer(mut self, material: Handle<Material>, shadow_casting: ShadowCasting) -> Self {
        self.builder.add(MeshRenderer::new(material, shadow_casting));
        self
    }

    pub fn with_materials(mut self, materials: Vec<Handle<Material>>, shadow_casting: ShadowCasting) -> Self {
        self.builder.add(MeshRenderer {
            materials,
            shadow_casting,
        });
        self
    }

    pub fn with_layer(mut self, layer: u32) -> Self {
        self.builder.add(Layer(layer));
        self
    }

    pub fn prefab_instance(mut self, source: impl Into<String>) -> Self {
        self.builder.add(PrefabInstance {
            source: source.into(),
        });
        self
    }

    pub fn batched(mut self) -> Self {
        self.builder.add(Batched);
        self
    }

    pub fn child_of(mut self, parent: hecs::Entity) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn spawn(mut self) -> hecs::Entity {
        self.builder.add(TransformComponent(self.transform));
        let entity = self.scene.world.spawn(self.builder.build());
        if let Some(parent) = self.parent {
            hierarchy::attach(&mut self.scene.world, entity, parent);
        }
        entity
    }
}
