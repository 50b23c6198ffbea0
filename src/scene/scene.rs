use super::components::*;
use super::internal::{hierarchy, transforms};
use crate::asset::{Assets, Handle, Mesh};
use crate::error::{BatchError, BatchResult};
use crate::scene::Transform;
use glam::Mat4;
use hecs::{Entity, World};

/// A node carrying renderable geometry, as found by [`Scene::render_nodes`].
#[derive(Debug, Clone)]
pub struct RenderNode {
    pub node: Entity,
    pub mesh: Handle<Mesh>,
    pub vertex_count: usize,
    /// Local-to-world matrix of the node
    pub world: Mat4,
    pub renderer: Option<MeshRenderer>,
}

/// An editable scene unit: one root node and everything under it.
pub struct Scene {
    pub world: World,
    pub assets: Assets,
    name: String,
    root: Entity,
}

impl Scene {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let mut world = World::new();
        let root = world.spawn((
            Name::new(name.clone()),
            TransformComponent(Transform::IDENTITY),
        ));

        Self {
            world,
            assets: Assets::default(),
            name,
            root,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> Entity {
        self.root
    }

    pub fn contains(&self, node: Entity) -> bool {
        self.world.contains(node)
    }

    pub fn node_name(&self, node: Entity) -> Option<String> {
        self.world.get::<&Name>(node).ok().map(|n| n.0.clone())
    }

    pub fn parent(&self, node: Entity) -> Option<Entity> {
        self.world.get::<&Parent>(node).ok().map(|p| p.0)
    }

    pub fn children(&self, node: Entity) -> Vec<Entity> {
        self.world
            .get::<&Children>(node)
            .map(|c| c.0.clone())
            .unwrap_or_default()
    }

    pub fn local_transform(&self, node: Entity) -> Option<Transform> {
        self.world.get::<&TransformComponent>(node).ok().map(|t| t.0)
    }

    pub fn set_local_transform(&mut self, node: Entity, transform: Transform) {
        if self.world.insert_one(node, TransformComponent(transform)).is_err() {
            log::warn!("Cannot set transform on missing node {:?}", node);
        }
    }

    pub fn world_matrix(&self, node: Entity) -> Mat4 {
        transforms::world_matrix(&self.world, node)
    }

    /// Create a detached node with an identity transform.
    pub fn create_node(&mut self, name: impl Into<String>) -> Entity {
        let name = name.into();
        let node = self
            .world
            .spawn((Name::new(name.clone()), TransformComponent(Transform::IDENTITY)));
        log::trace!("Created node '{}' ({:?})", name, node);
        node
    }

    /// Move `node` under `new_parent`, keeping its local transform.
    pub fn reparent(&mut self, node: Entity, new_parent: Entity) -> BatchResult<()> {
        if !self.contains(node) || !self.contains(new_parent) {
            return Err(BatchError::InvalidHierarchy(format!(
                "cannot reparent {:?} under {:?}: node missing",
                node, new_parent
            )));
        }
        if hierarchy::is_ancestor(&self.world, node, new_parent) {
            return Err(BatchError::InvalidHierarchy(format!(
                "cannot reparent {:?} under its own descendant {:?}",
                node, new_parent
            )));
        }
        self.ensure_editable(node)?;
        self.ensure_editable(new_parent)?;

        hierarchy::attach(&mut self.world, node, new_parent);
        log::trace!("Reparented {:?} under {:?}", node, new_parent);
        Ok(())
    }

    /// Destroy `node` and its descendants. A node that no longer exists is a
    /// no-op and yields `Ok(false)`.
    pub fn destroy_node(&mut self, node: Entity) -> BatchResult<bool> {
        if !self.contains(node) {
            log::trace!("Node {:?} already destroyed", node);
            return Ok(false);
        }
        if node == self.root {
            return Err(BatchError::InvalidHierarchy(
                "the scene root cannot be destroyed".into(),
            ));
        }
        self.ensure_editable(node)?;

        Ok(hierarchy::despawn_recursive(&mut self.world, node))
    }

    pub fn is_prefab_owned(&self, node: Entity) -> bool {
        hierarchy::is_prefab_owned(&self.world, node)
    }

    /// Completely unpack every nested prefab instance under the root,
    /// turning their contents into plain editable nodes. Returns the number
    /// of instances unpacked.
    pub fn unpack_all(&mut self) -> usize {
        let instances: Vec<Entity> = hierarchy::subtree(&self.world, self.root)
            .into_iter()
            .filter(|&e| self.world.get::<&PrefabInstance>(e).is_ok())
            .collect();

        for &instance in &instances {
            if let Ok(prefab) = self.world.remove_one::<PrefabInstance>(instance) {
                log::trace!("Unpacked prefab instance {:?} ({})", instance, prefab.source);
            }
        }

        instances.len()
    }

    /// Leaf render nodes under the root in depth-first discovery order,
    /// excluding nodes produced by an earlier batching pass. Nodes whose
    /// mesh handle does not resolve are skipped. The root itself is never
    /// listed since it cannot be removed.
    pub fn render_nodes(&mut self) -> Vec<RenderNode> {
        transforms::propagate_transforms(&mut self.world);

        let mut nodes = Vec::new();
        for entity in hierarchy::subtree(&self.world, self.root) {
            if entity == self.root || self.world.get::<&Batched>(entity).is_ok() {
                continue;
            }
            let mesh = match self.world.get::<&MeshComponent>(entity) {
                Ok(mesh) => mesh.0,
                Err(_) => continue,
            };
            let vertex_count = match self.assets.meshes.get(mesh) {
                Some(m) => m.vertex_count(),
                None => {
                    log::warn!(
                        "Node '{}' references missing mesh {:?}; skipping",
                        self.node_name(entity).unwrap_or_default(),
                        mesh
                    );
                    continue;
                }
            };
            let world = self
                .world
                .get::<&WorldTransform>(entity)
                .map(|wt| wt.0)
                .unwrap_or_else(|_| transforms::world_matrix(&self.world, entity));
            let renderer = self.world.get::<&MeshRenderer>(entity).ok().map(|r| (*r).clone());

            nodes.push(RenderNode {
                node: entity,
                mesh,
                vertex_count,
                world,
                renderer,
            });
        }

        nodes
    }

    /// Number of mesh-carrying nodes under the root, batched or not.
    pub fn draw_call_count(&self) -> usize {
        hierarchy::subtree(&self.world, self.root)
            .into_iter()
            .filter(|&e| self.world.get::<&MeshComponent>(e).is_ok())
            .count()
    }

    /// Every node under the root in depth-first order, root first.
    pub fn nodes(&self) -> Vec<Entity> {
        hierarchy::subtree(&self.world, self.root)
    }

    pub(crate) fn from_parts(name: String, world: World, assets: Assets, root: Entity) -> Self {
        Self {
            world,
            assets,
            name,
            root,
        }
    }

    fn ensure_editable(&self, node: Entity) -> BatchResult<()> {
        if self.is_prefab_owned(node) {
            return Err(BatchError::PrefabOwned {
                node: self.node_name(node).unwrap_or_else(|| format!("{:?}", node)),
            });
        }
        Ok(())
    }
}
