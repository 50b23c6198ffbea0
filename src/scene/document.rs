//! Serialized form of a scene unit.
//!
//! Nodes are stored in depth-first order with the root first, so every
//! parent index points at an earlier entry. Geometry is stored as base64 of
//! the packed vertex and index buffers.

use super::components::*;
use super::internal::hierarchy;
use super::{NodeBuilder, Scene, Transform};
use crate::asset::{AssetRef, Handle, Indices, Material, Mesh, Vertex};
use crate::error::{BatchError, BatchResult};
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneDocument {
    pub name: String,
    #[serde(default)]
    pub materials: Vec<Material>,
    #[serde(default)]
    pub meshes: Vec<MeshEntry>,
    #[serde(default)]
    pub nodes: Vec<NodeDocument>,
}

/// A mesh used by the scene: embedded geometry, a reference to a standalone
/// mesh asset, or both.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeshEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset: Option<AssetRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<MeshData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshData {
    pub name: String,
    pub vertices: String,
    pub indices: IndexData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "format", content = "data", rename_all = "snake_case")]
pub enum IndexData {
    U16(String),
    U32(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeDocument {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<usize>,
    #[serde(default)]
    pub transform: TransformData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mesh: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub renderer: Option<RendererDocument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layer: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefab: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub batched: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RendererDocument {
    #[serde(default)]
    pub materials: Vec<usize>,
    #[serde(default)]
    pub shadow_casting: ShadowCasting,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TransformData {
    pub translation: [f32; 3],
    pub rotation: [f32; 4],
    pub scale: [f32; 3],
}

impl Default for TransformData {
    fn default() -> Self {
        Transform::IDENTITY.into()
    }
}

impl From<Transform> for TransformData {
    fn from(t: Transform) -> Self {
        Self {
            translation: t.translation.to_array(),
            rotation: t.rotation.to_array(),
            scale: t.scale.to_array(),
        }
    }
}

impl From<TransformData> for Transform {
    fn from(t: TransformData) -> Self {
        Transform::from_trs(
            Vec3::from(t.translation),
            Quat::from_array(t.rotation).normalize(),
            Vec3::from(t.scale),
        )
    }
}

impl MeshData {
    pub fn encode(mesh: &Mesh) -> Self {
        let indices = match mesh.indices() {
            Indices::U16(indices) => IndexData::U16(base64::encode(bytemuck::cast_slice::<u16, u8>(indices))),
            Indices::U32(indices) => IndexData::U32(base64::encode(bytemuck::cast_slice::<u32, u8>(indices))),
        };

        Self {
            name: mesh.name.clone(),
            vertices: base64::encode(bytemuck::cast_slice::<Vertex, u8>(mesh.vertices())),
            indices,
        }
    }

    pub fn decode(&self) -> BatchResult<Mesh> {
        let vertex_bytes = decode_base64(&self.vertices, &self.name)?;
        if vertex_bytes.len() % Vertex::STRIDE != 0 {
            return Err(BatchError::Decode(format!(
                "mesh '{}': vertex buffer of {} bytes is not a multiple of {}",
                self.name,
                vertex_bytes.len(),
                Vertex::STRIDE
            )));
        }
        let vertices: Vec<Vertex> = bytemuck::pod_collect_to_vec(vertex_bytes.as_slice());

        let indices = match &self.indices {
            IndexData::U16(data) => {
                let bytes = decode_base64(data, &self.name)?;
                check_index_bytes(&self.name, bytes.len(), 2)?;
                Indices::U16(bytemuck::pod_collect_to_vec(bytes.as_slice()))
            }
            IndexData::U32(data) => {
                let bytes = decode_base64(data, &self.name)?;
                check_index_bytes(&self.name, bytes.len(), 4)?;
                Indices::U32(bytemuck::pod_collect_to_vec(bytes.as_slice()))
            }
        };

        if let Some(bad) = indices.iter().find(|&i| i as usize >= vertices.len()) {
            return Err(BatchError::Decode(format!(
                "mesh '{}': index {} out of range for {} vertices",
                self.name,
                bad,
                vertices.len()
            )));
        }

        Ok(Mesh::from_parts(self.name.clone(), vertices, indices))
    }
}

fn decode_base64(data: &str, mesh: &str) -> BatchResult<Vec<u8>> {
    base64::decode(data).map_err(|err| BatchError::Decode(format!("mesh '{}': {}", mesh, err)))
}

fn check_index_bytes(mesh: &str, len: usize, width: usize) -> BatchResult<()> {
    if len % width != 0 {
        return Err(BatchError::Decode(format!(
            "mesh '{}': index buffer of {} bytes is not a multiple of {}",
            mesh, len, width
        )));
    }
    Ok(())
}

impl SceneDocument {
    /// Capture the subtree under the scene root. Only meshes and materials
    /// still referenced by a node are written. When `embed_linked` is false,
    /// meshes backed by an asset file are written as references only.
    pub fn from_scene(scene: &Scene, embed_linked: bool) -> Self {
        let order = hierarchy::subtree(&scene.world, scene.root());
        let node_index: HashMap<hecs::Entity, usize> =
            order.iter().enumerate().map(|(i, &e)| (e, i)).collect();

        let mut mesh_slots: HashMap<Handle<Mesh>, usize> = HashMap::new();
        let mut material_slots: HashMap<Handle<Material>, usize> = HashMap::new();
        let mut meshes = Vec::new();
        let mut materials = Vec::new();
        let mut nodes = Vec::with_capacity(order.len());

        for &entity in &order {
            let world = &scene.world;

            let mesh = world.get::<&MeshComponent>(entity).ok().and_then(|m| {
                let handle = m.0;
                if let Some(&slot) = mesh_slots.get(&handle) {
                    return Some(slot);
                }
                let geometry = scene.assets.meshes.get(handle)?;
                let asset = scene.assets.mesh_ref(handle).cloned();
                let data = if asset.is_some() && !embed_linked {
                    None
                } else {
                    Some(MeshData::encode(geometry))
                };
                let slot = meshes.len();
                meshes.push(MeshEntry { asset, data });
                mesh_slots.insert(handle, slot);
                Some(slot)
            });

            let renderer = world.get::<&MeshRenderer>(entity).ok().map(|r| {
                let slots = r
                    .materials
                    .iter()
                    .filter_map(|&handle| {
                        if let Some(&slot) = material_slots.get(&handle) {
                            return Some(slot);
                        }
                        let material = scene.assets.materials.get(handle)?;
                        let slot = materials.len();
                        materials.push(material.clone());
                        material_slots.insert(handle, slot);
                        Some(slot)
                    })
                    .collect();
                RendererDocument {
                    materials: slots,
                    shadow_casting: r.shadow_casting,
                }
            });

            nodes.push(NodeDocument {
                name: world
                    .get::<&Name>(entity)
                    .map(|n| n.0.clone())
                    .unwrap_or_default(),
                parent: world
                    .get::<&Parent>(entity)
                    .ok()
                    .and_then(|p| node_index.get(&p.0).copied())
                    .filter(|_| entity != scene.root()),
                transform: world
                    .get::<&TransformComponent>(entity)
                    .map(|t| t.0)
                    .unwrap_or_default()
                    .into(),
                mesh,
                renderer,
                layer: world.get::<&Layer>(entity).ok().map(|l| l.0),
                prefab: world
                    .get::<&PrefabInstance>(entity)
                    .ok()
                    .map(|p| p.source.clone()),
                batched: world.get::<&Batched>(entity).is_ok(),
            });
        }

        Self {
            name: scene.name().to_string(),
            materials,
            meshes,
            nodes,
        }
    }

    /// Rebuild an editable scene. `resolve` loads geometry for mesh entries
    /// that only carry an asset reference.
    pub fn into_scene<F>(self, mut resolve: F) -> BatchResult<Scene>
    where
        F: FnMut(&AssetRef) -> BatchResult<Mesh>,
    {
        let mut nodes = self.nodes.into_iter();
        let root_doc = nodes
            .next()
            .ok_or_else(|| BatchError::InvalidDocument(format!("scene '{}' has no root node", self.name)))?;
        if root_doc.parent.is_some() {
            return Err(BatchError::InvalidDocument("root node must not have a parent".into()));
        }

        let mut scene = Scene::new(self.name.clone());

        let mut mesh_handles = Vec::with_capacity(self.meshes.len());
        for (index, entry) in self.meshes.into_iter().enumerate() {
            let geometry = match (&entry.data, &entry.asset) {
                (Some(data), _) => data.decode()?,
                (None, Some(asset)) => resolve(asset)?,
                (None, None) => {
                    return Err(BatchError::InvalidDocument(format!(
                        "mesh entry {} has neither data nor asset",
                        index
                    )))
                }
            };
            let handle = scene.assets.meshes.insert(geometry);
            if let Some(asset) = entry.asset {
                scene.assets.link_mesh(handle, asset);
            }
            mesh_handles.push(handle);
        }

        let material_handles: Vec<Handle<Material>> = self
            .materials
            .into_iter()
            .map(|m| scene.assets.materials.insert(m))
            .collect();

        let root = scene.root();
        scene.set_local_transform(root, root_doc.transform.into());
        apply_node_components(&mut scene, root, &root_doc, &mesh_handles, &material_handles)?;

        let mut entities = vec![root];
        for (offset, doc) in nodes.enumerate() {
            let index = offset + 1;
            let parent = match doc.parent {
                Some(p) if p < index => entities[p],
                Some(p) => {
                    return Err(BatchError::InvalidDocument(format!(
                        "node {} ('{}') references parent {} that does not precede it",
                        index, doc.name, p
                    )))
                }
                None => {
                    return Err(BatchError::InvalidDocument(format!(
                        "node {} ('{}') has no parent; only the root may be parentless",
                        index, doc.name
                    )))
                }
            };

            let entity = NodeBuilder::new(&mut scene)
                .with_name(doc.name.clone())
                .with_transform(doc.transform.into())
                .child_of(parent)
                .spawn();
            apply_node_components(&mut scene, entity, &doc, &mesh_handles, &material_handles)?;
            entities.push(entity);
        }

        Ok(scene)
    }
}

fn apply_node_components(
    scene: &mut Scene,
    entity: hecs::Entity,
    doc: &NodeDocument,
    meshes: &[Handle<Mesh>],
    materials: &[Handle<Material>],
) -> BatchResult<()> {
    let world = &mut scene.world;

    if let Some(mesh) = doc.mesh {
        let handle = *meshes.get(mesh).ok_or_else(|| {
            BatchError::InvalidDocument(format!("node '{}' references missing mesh {}", doc.name, mesh))
        })?;
        world.insert_one(entity, MeshComponent(handle)).ok();
    }

    if let Some(renderer) = &doc.renderer {
        let handles = renderer
            .materials
            .iter()
            .map(|&m| {
                materials.get(m).copied().ok_or_else(|| {
                    BatchError::InvalidDocument(format!(
                        "node '{}' references missing material {}",
                        doc.name, m
                    ))
                })
            })
            .collect::<BatchResult<Vec<_>>>()?;
        world
            .insert_one(
                entity,
                MeshRenderer {
                    materials: handles,
                    shadow_casting: renderer.shadow_casting,
                },
            )
            .ok();
    }

    if let Some(layer) = doc.layer {
        world.insert_one(entity, Layer(layer)).ok();
    }
    if let Some(source) = &doc.prefab {
        world.insert_one(entity, PrefabInstance { source: source.clone() }).ok();
    }
    if doc.batched {
        world.insert_one(entity, Batched).ok();
    }

    Ok(())
}
