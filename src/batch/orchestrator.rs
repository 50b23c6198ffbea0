use super::{classify, combine_meshes, group_by_material, pack_bins, CombinePart, MeshInstance, ShadowMode};
use crate::asset::{AssetRef, Handle, Material, Mesh};
use crate::error::{BatchError, BatchResult};
use crate::scene::{NodeBuilder, Scene, Transform};
use crate::settings::{BatchSettings, FailurePolicy};
use crate::store::{AssetStore, SceneId, SceneQuery, SceneStore};
use glam::Mat4;
use hecs::Entity;
use std::collections::HashSet;
use log::{debug, error, info, trace, warn};

/// What happened to one scene unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitOutcome {
    /// Nothing eligible for batching; the unit was left untouched.
    Skipped,
    /// Dry run: bins were computed but nothing was written.
    Planned,
    Batched,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitReport {
    pub unit: SceneId,
    pub outcome: UnitOutcome,
    pub source_nodes: usize,
    pub result_nodes: usize,
    pub assets_written: usize,
    pub bins: usize,
    pub draw_calls_before: usize,
    pub draw_calls_after: usize,
}

impl UnitReport {
    fn untouched(unit: SceneId, outcome: UnitOutcome, draw_calls: usize) -> Self {
        Self {
            unit,
            outcome,
            source_nodes: 0,
            result_nodes: 0,
            assets_written: 0,
            bins: 0,
            draw_calls_before: draw_calls,
            draw_calls_after: draw_calls,
        }
    }
}

/// Per-unit reports of a run, in processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub units: Vec<UnitReport>,
}

impl RunReport {
    fn count(&self, pred: impl Fn(&UnitOutcome) -> bool) -> usize {
        self.units.iter().filter(|u| pred(&u.outcome)).count()
    }

    pub fn batched(&self) -> usize {
        self.count(|o| *o == UnitOutcome::Batched)
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| *o == UnitOutcome::Skipped)
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, UnitOutcome::Failed(_)))
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }

    pub fn assets_written(&self) -> usize {
        self.units.iter().map(|u| u.assets_written).sum()
    }

    /// Draw calls removed across all units (planned or performed).
    pub fn draw_calls_saved(&self) -> usize {
        self.units
            .iter()
            .map(|u| u.draw_calls_before.saturating_sub(u.draw_calls_after))
            .sum()
    }
}

/// Changes applied to a scene by [`MeshBatcher::batch_scene`].
#[derive(Debug, Clone, Default)]
pub struct SceneBatch {
    /// Bin-result nodes, in creation order
    pub result_nodes: Vec<Entity>,
    /// Wrappers created for material groups that needed several bins
    pub wrapper_nodes: Vec<Entity>,
    pub source_nodes: usize,
    pub assets_written: Vec<AssetRef>,
    pub bins: usize,
}

impl SceneBatch {
    pub fn is_empty(&self) -> bool {
        self.bins == 0
    }
}

/// Bins of one material group within one shadow class.
struct GroupPlan {
    mode: ShadowMode,
    material: Handle<Material>,
    wrapper: Option<String>,
    bins: Vec<BinPlan>,
}

struct BinPlan {
    name: String,
    asset_hint: String,
    instances: Vec<MeshInstance>,
}

enum Geometry {
    /// Lone instance: its mesh is kept, its world placement moves to the node.
    Reuse { mesh: Handle<Mesh>, transform: Transform },
    Merged(Mesh),
}

/// Drives the batching pass over scene units.
pub struct MeshBatcher {
    settings: BatchSettings,
}

impl MeshBatcher {
    pub fn new(settings: BatchSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &BatchSettings {
        &self.settings
    }

    /// Batch every unit the scene store discovers for the configured query.
    pub fn run_all<S, A>(&self, scenes: &mut S, assets: &mut A) -> BatchResult<RunReport>
    where
        S: SceneStore,
        A: AssetStore,
    {
        let units = scenes.discover(&SceneQuery::from_settings(&self.settings))?;
        info!("Batching {} scene unit(s)", units.len());

        let mut report = RunReport::default();
        for id in units {
            let result = self.run_unit(scenes, assets, &id);
            self.record(&mut report, id, result)?;
        }

        info!(
            "Batched {} unit(s), skipped {}, failed {}; {} asset(s) written, {} draw call(s) removed",
            report.batched(),
            report.skipped(),
            report.failed(),
            report.assets_written(),
            report.draw_calls_saved()
        );
        Ok(report)
    }

    /// Report what [`run_all`](Self::run_all) would do without writing anything.
    pub fn plan_all<S: SceneStore>(&self, scenes: &mut S) -> BatchResult<RunReport> {
        let units = scenes.discover(&SceneQuery::from_settings(&self.settings))?;
        info!("Planning {} scene unit(s)", units.len());

        let mut report = RunReport::default();
        for id in units {
            let result = self.plan_unit(scenes, &id);
            self.record(&mut report, id, result)?;
        }

        info!(
            "Plan: {} bin(s) from {} source node(s), {} draw call(s) removable",
            report.units.iter().map(|u| u.bins).sum::<usize>(),
            report.units.iter().map(|u| u.source_nodes).sum::<usize>(),
            report.draw_calls_saved()
        );
        Ok(report)
    }

    fn record(
        &self,
        report: &mut RunReport,
        id: SceneId,
        result: BatchResult<UnitReport>,
    ) -> BatchResult<()> {
        match result {
            Ok(unit) => report.units.push(unit),
            Err(err) => {
                error!("Scene unit {} failed: {}", id, err);
                match self.settings.failure_policy {
                    FailurePolicy::Abort => return Err(err),
                    FailurePolicy::Skip => report.units.push(UnitReport::untouched(
                        id,
                        UnitOutcome::Failed(err.to_string()),
                        0,
                    )),
                }
            }
        }
        Ok(())
    }

    /// Load, unpack, batch, save and release one scene unit. The unit is
    /// only saved once every edit succeeded.
    pub fn run_unit<S, A>(&self, scenes: &mut S, assets: &mut A, id: &SceneId) -> BatchResult<UnitReport>
    where
        S: SceneStore,
        A: AssetStore,
    {
        let mut scene = scenes.load(id)?;
        let draw_calls_before = scene.draw_call_count();

        if scene.render_nodes().is_empty() {
            info!("{}: no render nodes to batch", id);
            scenes.unload(scene);
            return Ok(UnitReport::untouched(id.clone(), UnitOutcome::Skipped, draw_calls_before));
        }

        let unpacked = scene.unpack_all();
        if unpacked > 0 && self.settings.reload_after_unpack {
            debug!("{}: unpacked {} prefab instance(s); reloading", id, unpacked);
            let saved = scenes.save(&scene, id);
            scenes.unload(scene);
            saved?;
            scene = scenes.load(id)?;
        }

        let batch = match self.batch_scene(&mut scene, assets, id) {
            Ok(batch) => batch,
            Err(err) => {
                scenes.unload(scene);
                return Err(err);
            }
        };

        if batch.is_empty() {
            info!("{}: nothing eligible after unpacking", id);
            scenes.unload(scene);
            return Ok(UnitReport::untouched(id.clone(), UnitOutcome::Skipped, draw_calls_before));
        }

        let draw_calls_after = scene.draw_call_count();
        let saved = scenes.save(&scene, id);
        scenes.unload(scene);
        saved?;

        info!(
            "{}: merged {} node(s) into {} bin(s), draw calls {} -> {}",
            id, batch.source_nodes, batch.bins, draw_calls_before, draw_calls_after
        );

        Ok(UnitReport {
            unit: id.clone(),
            outcome: UnitOutcome::Batched,
            source_nodes: batch.source_nodes,
            result_nodes: batch.result_nodes.len(),
            assets_written: batch.assets_written.len(),
            bins: batch.bins,
            draw_calls_before,
            draw_calls_after,
        })
    }

    /// Compute the bins of one unit and release it unchanged.
    pub fn plan_unit<S: SceneStore>(&self, scenes: &mut S, id: &SceneId) -> BatchResult<UnitReport> {
        let mut scene = scenes.load(id)?;
        let draw_calls_before = scene.draw_call_count();
        let plans = self.plan(&mut scene, id);
        scenes.unload(scene);

        let bins: usize = plans.iter().map(|g| g.bins.len()).sum();
        if bins == 0 {
            return Ok(UnitReport::untouched(id.clone(), UnitOutcome::Skipped, draw_calls_before));
        }

        let source_nodes: usize = plans
            .iter()
            .flat_map(|g| &g.bins)
            .map(|b| b.instances.len())
            .sum();
        let assets_written = plans
            .iter()
            .flat_map(|g| &g.bins)
            .filter(|b| b.instances.len() > 1)
            .count();

        info!("{}: {} node(s) would merge into {} bin(s)", id, source_nodes, bins);

        Ok(UnitReport {
            unit: id.clone(),
            outcome: UnitOutcome::Planned,
            source_nodes,
            result_nodes: bins,
            assets_written,
            bins,
            draw_calls_before,
            draw_calls_after: draw_calls_before.saturating_sub(source_nodes) + bins,
        })
    }

    /// Merge the eligible render nodes of an already loaded scene.
    ///
    /// All geometry is built before the first asset is persisted, and all
    /// assets are persisted before the scene is edited. Source nodes are
    /// destroyed once every result node is attached.
    pub fn batch_scene<A: AssetStore>(
        &self,
        scene: &mut Scene,
        assets: &mut A,
        id: &SceneId,
    ) -> BatchResult<SceneBatch> {
        let plans = self.plan(scene, id);
        let mut batch = SceneBatch::default();
        if plans.is_empty() {
            return Ok(batch);
        }

        let root = scene.root();
        check_editable(scene, &plans)?;

        let root_world = scene.world_matrix(root);
        if root_world.determinant().abs() <= f32::EPSILON {
            return Err(BatchError::InvalidHierarchy(format!(
                "scene root of {} has a singular transform",
                id
            )));
        }
        let root_inv = root_world.inverse();

        let mut built = Vec::with_capacity(plans.len());
        for group in &plans {
            let geometry = group
                .bins
                .iter()
                .map(|bin| self.build_geometry(&*scene, bin, root_inv))
                .collect::<BatchResult<Vec<_>>>()?;
            built.push(geometry);
        }

        let mut resolved = Vec::with_capacity(plans.len());
        for (group, geometry) in plans.iter().zip(built) {
            let mut meshes = Vec::with_capacity(geometry.len());
            for (bin, geometry) in group.bins.iter().zip(geometry) {
                let placed = match geometry {
                    Geometry::Reuse { mesh, transform } => (mesh, transform),
                    Geometry::Merged(mesh) => {
                        let asset = assets.persist_mesh(&mesh, &bin.asset_hint)?;
                        debug!(
                            "Persisted {} ({} vertices, {} source nodes)",
                            asset,
                            mesh.vertex_count(),
                            bin.instances.len()
                        );
                        let handle = scene.assets.meshes.insert(mesh);
                        scene.assets.link_mesh(handle, asset.clone());
                        batch.assets_written.push(asset);
                        (handle, Transform::IDENTITY)
                    }
                };
                meshes.push(placed);
            }
            resolved.push(meshes);
        }

        let mut sources = Vec::new();
        for (group, meshes) in plans.iter().zip(resolved) {
            let parent = match &group.wrapper {
                Some(name) => {
                    let wrapper = NodeBuilder::new(scene)
                        .with_name(name.clone())
                        .with_layer(self.settings.result_layer)
                        .batched()
                        .spawn();
                    scene.reparent(wrapper, root)?;
                    batch.wrapper_nodes.push(wrapper);
                    wrapper
                }
                None => root,
            };

            for (bin, (mesh, transform)) in group.bins.iter().zip(meshes) {
                let node = NodeBuilder::new(scene)
                    .with_name(bin.name.clone())
                    .with_transform(transform)
                    .with_mesh(mesh)
                    .with_renderer(group.material, group.mode.casting())
                    .with_layer(self.settings.result_layer)
                    .batched()
                    .spawn();
                scene.reparent(node, parent)?;
                trace!("Attached '{}' ({:?}) under {:?}", bin.name, node, parent);

                batch.result_nodes.push(node);
                batch.bins += 1;
                sources.extend(bin.instances.iter().map(|i| i.node));
            }
        }

        batch.source_nodes = sources.len();
        for node in sources {
            scene.destroy_node(node)?;
        }

        Ok(batch)
    }

    fn plan(&self, scene: &mut Scene, id: &SceneId) -> Vec<GroupPlan> {
        let classes = classify(scene.render_nodes());
        let limit = self.settings.vertex_limit;
        let mut plans = Vec::new();
        let mut hints = HashSet::new();

        for (mode, instances) in classes.into_non_empty() {
            let prefix = self.settings.prefixes.get(mode);
            let groups = group_by_material(instances);
            let several_groups = groups.len() > 1;

            for group in groups {
                let material_name = scene
                    .assets
                    .materials
                    .get(group.material)
                    .map(|m| m.display_name().to_string())
                    .unwrap_or_else(|| "Material".to_string());

                let bins = pack_bins(group.instances, limit, |i| i.vertex_count);
                let several_bins = bins.len() > 1;

                let wrapper = several_bins.then(|| format!("{}{}", prefix, material_name));
                let bins = bins
                    .into_iter()
                    .enumerate()
                    .map(|(index, bin)| {
                        debug!(
                            "{}: {:?} bin {} of '{}' holds {} node(s), {} vertices",
                            id,
                            mode,
                            index,
                            material_name,
                            bin.len(),
                            bin.vertex_count
                        );
                        let name = if several_bins {
                            format!("{}{}_{}", prefix, material_name, index)
                        } else if several_groups {
                            format!("{}{}", prefix, material_name)
                        } else {
                            format!("{}{}", prefix, scene.name())
                        };
                        BinPlan {
                            name,
                            asset_hint: unique_hint(
                                &mut hints,
                                asset_hint(id, scene.name(), &material_name, mode, index),
                            ),
                            instances: bin.items,
                        }
                    })
                    .collect();

                plans.push(GroupPlan {
                    mode,
                    material: group.material,
                    wrapper,
                    bins,
                });
            }
        }

        plans
    }

    fn build_geometry(&self, scene: &Scene, bin: &BinPlan, root_inv: Mat4) -> BatchResult<Geometry> {
        if let [only] = bin.instances.as_slice() {
            let (transform, exact) = placement(root_inv * only.world);
            if !exact {
                warn!(
                    "'{}' sits under a sheared hierarchy; its placement loses the shear",
                    bin.name
                );
            }
            return Ok(Geometry::Reuse {
                mesh: only.mesh,
                transform,
            });
        }

        let parts = bin
            .instances
            .iter()
            .map(|instance| {
                let mesh = scene
                    .assets
                    .meshes
                    .get(instance.mesh)
                    .ok_or_else(|| BatchError::MissingAsset(format!("mesh {:?}", instance.mesh)))?;
                Ok(CombinePart {
                    mesh,
                    transform: root_inv * instance.world,
                })
            })
            .collect::<BatchResult<Vec<_>>>()?;

        Ok(Geometry::Merged(combine_meshes(
            bin.name.clone(),
            &parts,
            self.settings.vertex_limit,
        )))
    }
}

/// Every source must be removable and every result parent editable before
/// anything is written.
fn check_editable(scene: &Scene, plans: &[GroupPlan]) -> BatchResult<()> {
    let root = scene.root();
    let sources = plans
        .iter()
        .flat_map(|g| &g.bins)
        .flat_map(|b| b.instances.iter().map(|i| i.node));

    for node in sources {
        if node == root {
            return Err(BatchError::InvalidHierarchy(
                "the scene root cannot be merged away".into(),
            ));
        }
        if !scene.contains(node) {
            return Err(BatchError::InvalidHierarchy(format!(
                "source node {:?} no longer exists",
                node
            )));
        }
    }

    let sources = plans
        .iter()
        .flat_map(|g| &g.bins)
        .flat_map(|b| b.instances.iter().map(|i| i.node));
    if let Some(owned) = std::iter::once(root)
        .chain(sources)
        .find(|&node| scene.is_prefab_owned(node))
    {
        return Err(BatchError::PrefabOwned {
            node: scene.node_name(owned).unwrap_or_else(|| format!("{:?}", owned)),
        });
    }

    Ok(())
}

/// Local transform for a reused mesh, and whether it reproduces `local`
/// exactly. TRS cannot carry shear.
fn placement(local: Mat4) -> (Transform, bool) {
    let transform = Transform::from_matrix(local);
    let exact = transform.matrix().abs_diff_eq(local, 1e-4);
    (transform, exact)
}

/// Project-relative path, without extension, for a merged mesh.
fn asset_hint(id: &SceneId, scene: &str, material: &str, mode: ShadowMode, bin: usize) -> String {
    let file = format!("{}_{}_{}_{}", scene, material, mode.label(), bin);
    match id.dir() {
        "" => file,
        dir => format!("{}/{}", dir, file),
    }
}

/// Materials sharing a display name would otherwise collide on disk.
fn unique_hint(taken: &mut HashSet<String>, base: String) -> String {
    let mut hint = base.clone();
    let mut suffix = 1;
    while !taken.insert(hint.clone()) {
        hint = format!("{}_{}", base, suffix);
        suffix += 1;
    }
    hint
}
