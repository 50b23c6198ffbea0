use super::MeshInstance;
use crate::asset::{Handle, Material};
use std::collections::{HashMap, VecDeque};

/// Instances of one shadow class sharing the same material handle.
#[derive(Debug, Clone)]
pub struct MaterialGroup {
    pub material: Handle<Material>,
    pub instances: Vec<MeshInstance>,
}

/// Bucket instances by material identity. Buckets come out in the order
/// their material was first seen; instances keep their relative order.
pub fn group_by_material(instances: Vec<MeshInstance>) -> Vec<MaterialGroup> {
    let mut groups: Vec<MaterialGroup> = Vec::new();
    let mut lookup: HashMap<Handle<Material>, usize> = HashMap::new();

    for instance in instances {
        let index = *lookup.entry(instance.material).or_insert_with(|| {
            groups.push(MaterialGroup {
                material: instance.material,
                instances: Vec::new(),
            });
            groups.len() - 1
        });
        groups[index].instances.push(instance);
    }

    groups
}

/// Items destined to be merged into one mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct Bin<T> {
    pub items: Vec<T>,
    pub vertex_count: usize,
}

impl<T> Bin<T> {
    fn seeded(item: T, vertex_count: usize) -> Self {
        Self {
            items: vec![item],
            vertex_count,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_singleton(&self) -> bool {
        self.items.len() == 1
    }
}

/// Greedy bin filling.
///
/// The first unplaced item seeds a bin unconditionally. Every remaining
/// unplaced item is then tried in order and joins the bin if the running
/// total stays strictly below `vertex_limit`; items that do not fit stay
/// unplaced, in order, and are offered to the next bin. An item at or above
/// the limit on its own therefore always ends up alone in its bin.
pub fn pack_bins<T, F>(items: Vec<T>, vertex_limit: usize, vertex_count: F) -> Vec<Bin<T>>
where
    F: Fn(&T) -> usize,
{
    let mut bins = Vec::new();
    let mut unplaced: VecDeque<T> = items.into();

    while let Some(seed) = unplaced.pop_front() {
        let seed_count = vertex_count(&seed);
        let mut bin = Bin::seeded(seed, seed_count);
        let mut skipped = VecDeque::with_capacity(unplaced.len());

        while let Some(item) = unplaced.pop_front() {
            let count = vertex_count(&item);
            if bin.vertex_count + count < vertex_limit {
                bin.vertex_count += count;
                bin.items.push(item);
            } else {
                skipped.push_back(item);
            }
        }

        log::trace!(
            "Sealed bin with {} items / {} vertices, {} left",
            bin.items.len(),
            bin.vertex_count,
            skipped.len()
        );
        bins.push(bin);
        unplaced = skipped;
    }

    bins
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::{ShadowMode, VERTEX_LIMIT};
    use glam::Mat4;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    fn pack(counts: &[usize]) -> Vec<Vec<usize>> {
        pack_bins(counts.to_vec(), VERTEX_LIMIT, |&c| c)
            .into_iter()
            .map(|bin| bin.items)
            .collect()
    }

    #[test]
    fn overflowing_item_moves_to_next_bin() {
        assert_eq!(pack(&[40_000, 30_000, 4_000]), vec![vec![40_000], vec![30_000, 4_000]]);
    }

    #[test]
    fn skipped_items_do_not_stop_the_scan() {
        // 30000 overflows the first bin but the later 5000 still fits there
        assert_eq!(
            pack(&[40_000, 30_000, 5_000, 25_000]),
            vec![vec![40_000, 5_000], vec![30_000, 25_000]]
        );
    }

    #[test]
    fn limit_is_strict() {
        assert_eq!(pack(&[65_000, 536]), vec![vec![65_000], vec![536]]);
        assert_eq!(pack(&[65_000, 535]), vec![vec![65_000, 535]]);
    }

    #[test]
    fn oversized_item_is_a_singleton() {
        assert_eq!(
            pack(&[10, 70_000, 20, VERTEX_LIMIT]),
            vec![vec![10, 20], vec![70_000], vec![VERTEX_LIMIT]]
        );
    }

    #[test]
    fn empty_input_gives_no_bins() {
        assert!(pack(&[]).is_empty());
    }

    #[test]
    fn random_inputs_keep_bin_invariants() {
        let mut rng = SmallRng::seed_from_u64(0x5eed);

        for _ in 0..200 {
            let len = rng.gen_range(0..40);
            let items: Vec<(usize, usize)> = (0..len)
                .map(|id| (id, rng.gen_range(1..50_000)))
                .collect();

            let bins = pack_bins(items.clone(), VERTEX_LIMIT, |&(_, c)| c);

            let mut seen: Vec<usize> = bins
                .iter()
                .flat_map(|bin| bin.items.iter().map(|&(id, _)| id))
                .collect();
            seen.sort_unstable();
            assert_eq!(seen, (0..len).collect::<Vec<_>>());

            for bin in &bins {
                assert!(!bin.is_empty());
                let total: usize = bin.items.iter().map(|&(_, c)| c).sum();
                assert_eq!(total, bin.vertex_count);
                assert!(total < VERTEX_LIMIT);
                // relative input order survives inside a bin
                assert!(bin.items.windows(2).all(|w| w[0].0 < w[1].0));
            }
        }
    }

    fn instance(world: &mut hecs::World, material: usize) -> MeshInstance {
        MeshInstance {
            node: world.spawn(()),
            mesh: Handle::new(0),
            vertex_count: 24,
            world: Mat4::IDENTITY,
            material: Handle::new(material),
            shadow_mode: ShadowMode::CastAndReceive,
        }
    }

    #[test]
    fn groups_follow_first_seen_material_order() {
        let mut world = hecs::World::new();
        let instances: Vec<MeshInstance> = [2, 0, 2, 1, 0]
            .iter()
            .map(|&m| instance(&mut world, m))
            .collect();
        let nodes: Vec<hecs::Entity> = instances.iter().map(|i| i.node).collect();

        let groups = group_by_material(instances);

        let materials: Vec<usize> = groups.iter().map(|g| g.material.index()).collect();
        assert_eq!(materials, vec![2, 0, 1]);
        let members: Vec<hecs::Entity> = groups[0].instances.iter().map(|i| i.node).collect();
        assert_eq!(members, vec![nodes[0], nodes[2]]);
        assert_eq!(groups[1].instances.len(), 2);
        assert_eq!(groups[2].instances.len(), 1);
    }
}
