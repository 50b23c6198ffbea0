use super::ShadowMode;
use crate::asset::{Handle, Material, Mesh};
use crate::scene::RenderNode;
use glam::Mat4;

/// A render node accepted for batching.
#[derive(Debug, Clone)]
pub struct MeshInstance {
    pub node: hecs::Entity,
    pub mesh: Handle<Mesh>,
    pub vertex_count: usize,
    pub world: Mat4,
    pub material: Handle<Material>,
    pub shadow_mode: ShadowMode,
}

/// Mesh instances partitioned by shadow mode, each list in discovery order.
#[derive(Debug, Default)]
pub struct ShadowClasses {
    pub cast_and_receive: Vec<MeshInstance>,
    pub cast_only: Vec<MeshInstance>,
    pub no_cast: Vec<MeshInstance>,
}

impl ShadowClasses {
    pub fn get(&self, mode: ShadowMode) -> &[MeshInstance] {
        match mode {
            ShadowMode::CastAndReceive => &self.cast_and_receive,
            ShadowMode::CastOnly => &self.cast_only,
            ShadowMode::NoCast => &self.no_cast,
        }
    }

    fn get_mut(&mut self, mode: ShadowMode) -> &mut Vec<MeshInstance> {
        match mode {
            ShadowMode::CastAndReceive => &mut self.cast_and_receive,
            ShadowMode::CastOnly => &mut self.cast_only,
            ShadowMode::NoCast => &mut self.no_cast,
        }
    }

    /// Non-empty classes in processing order.
    pub fn into_non_empty(self) -> Vec<(ShadowMode, Vec<MeshInstance>)> {
        let mut classes = self;
        ShadowMode::ALL
            .into_iter()
            .map(|mode| (mode, std::mem::take(classes.get_mut(mode))))
            .filter(|(_, instances)| !instances.is_empty())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.cast_and_receive.len() + self.cast_only.len() + self.no_cast.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Split render nodes by shadow mode. Nodes without a renderer, with an
/// unhandled shadow flag, or without a material are left out.
pub fn classify(nodes: Vec<RenderNode>) -> ShadowClasses {
    let mut classes = ShadowClasses::default();

    for node in nodes {
        let renderer = match node.renderer {
            Some(renderer) => renderer,
            None => {
                log::debug!("Node {:?} has a mesh but no renderer; excluded", node.node);
                continue;
            }
        };

        let shadow_mode = match ShadowMode::from_casting(renderer.shadow_casting) {
            Some(mode) => mode,
            None => {
                log::debug!(
                    "Node {:?} uses unsupported shadow casting {:?}; excluded",
                    node.node,
                    renderer.shadow_casting
                );
                continue;
            }
        };

        let material = match renderer.primary_material() {
            Some(material) => material,
            None => {
                log::warn!("Node {:?} has a renderer without materials; excluded", node.node);
                continue;
            }
        };

        classes.get_mut(shadow_mode).push(MeshInstance {
            node: node.node,
            mesh: node.mesh,
            vertex_count: node.vertex_count,
            world: node.world,
            material,
            shadow_mode,
        });
    }

    classes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{MeshRenderer, ShadowCasting};

    fn render_node(world: &mut hecs::World, renderer: Option<MeshRenderer>) -> RenderNode {
        RenderNode {
            node: world.spawn(()),
            mesh: Handle::new(0),
            vertex_count: 24,
            world: Mat4::IDENTITY,
            renderer,
        }
    }

    #[test]
    fn classes_partition_input_in_order() {
        let mut world = hecs::World::new();
        let material = Handle::new(0);
        let flags = [
            ShadowCasting::On,
            ShadowCasting::Off,
            ShadowCasting::ShadowsOnly,
            ShadowCasting::On,
            ShadowCasting::Off,
            ShadowCasting::On,
        ];
        let nodes: Vec<RenderNode> = flags
            .iter()
            .map(|&flag| render_node(&mut world, Some(MeshRenderer::new(material, flag))))
            .collect();
        let ids: Vec<hecs::Entity> = nodes.iter().map(|n| n.node).collect();

        let classes = classify(nodes);

        let picked = |mode| classes.get(mode).iter().map(|i| i.node).collect::<Vec<_>>();
        assert_eq!(picked(ShadowMode::CastAndReceive), vec![ids[0], ids[3], ids[5]]);
        assert_eq!(picked(ShadowMode::NoCast), vec![ids[1], ids[4]]);
        assert_eq!(picked(ShadowMode::CastOnly), vec![ids[2]]);
        assert_eq!(classes.len(), flags.len());
        assert!(classes
            .get(ShadowMode::CastOnly)
            .iter()
            .all(|i| i.shadow_mode == ShadowMode::CastOnly));
    }

    #[test]
    fn unrecognised_or_missing_renderers_are_excluded() {
        let mut world = hecs::World::new();
        let nodes = vec![
            render_node(&mut world, None),
            render_node(
                &mut world,
                Some(MeshRenderer::new(Handle::new(0), ShadowCasting::TwoSided)),
            ),
            render_node(
                &mut world,
                Some(MeshRenderer {
                    materials: Vec::new(),
                    shadow_casting: ShadowCasting::On,
                }),
            ),
        ];

        assert!(classify(nodes).is_empty());
    }

    #[test]
    fn empty_input_gives_empty_classes() {
        let classes = classify(Vec::new());
        assert!(classes.is_empty());
        assert!(classes.into_non_empty().is_empty());
    }

    #[test]
    fn non_empty_classes_follow_processing_order() {
        let mut world = hecs::World::new();
        let nodes = vec![
            render_node(&mut world, Some(MeshRenderer::new(Handle::new(0), ShadowCasting::Off))),
            render_node(&mut world, Some(MeshRenderer::new(Handle::new(0), ShadowCasting::ShadowsOnly))),
        ];

        let modes: Vec<ShadowMode> = classify(nodes)
            .into_non_empty()
            .into_iter()
            .map(|(mode, _)| mode)
            .collect();
        assert_eq!(modes, vec![ShadowMode::CastOnly, ShadowMode::NoCast]);
    }
}
