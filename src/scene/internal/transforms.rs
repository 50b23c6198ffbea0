use crate::scene::components::{Children, Parent, TransformComponent, WorldTransform};
use glam::Mat4;
use hecs::World;

pub(crate) fn propagate_transforms(world: &mut World) {
    let roots: Vec<hecs::Entity> = world
        .query::<&TransformComponent>()
        .without::<&Parent>()
        .iter()
        .map(|(entity, _)| entity)
        .collect();

    log::trace!("Propagating transforms from {} root entities", roots.len());

    let mut stack: Vec<(hecs::Entity, Mat4)> = Vec::new();

    for root in roots {
        stack.push((root, Mat4::IDENTITY));

        while let Some((entity, parent_world)) = stack.pop() {
            let local = match world.get::<&TransformComponent>(entity) {
                Ok(t) => t.0.matrix(),
                Err(_) => {
                    log::trace!("Entity {:?} has no TransformComponent, skipping", entity);
                    continue;
                }
            };

            let world_matrix = parent_world * local;

            let mut has_world_transform = false;
            if let Ok(mut wt) = world.get::<&mut WorldTransform>(entity) {
                wt.0 = world_matrix;
                has_world_transform = true;
            }

            if !has_world_transform {
                if let Err(e) = world.insert_one(entity, WorldTransform(world_matrix)) {
                    log::error!(
                        "Failed to insert WorldTransform for entity {:?}: {:?}",
                        entity,
                        e
                    );
                    continue;
                }
            }

            if let Ok(children) = world.get::<&Children>(entity) {
                for &child in children.0.iter().rev() {
                    stack.push((child, world_matrix));
                }
            }
        }
    }
}

/// Local-to-world matrix of a single entity, walking up the parent chain.
pub(crate) fn world_matrix(world: &World, entity: hecs::Entity) -> Mat4 {
    let mut matrix = Mat4::IDENTITY;
    let mut current = Some(entity);

    while let Some(e) = current {
        if let Ok(local) = world.get::<&TransformComponent>(e) {
            matrix = local.0.matrix() * matrix;
        }
        current = world.get::<&Parent>(e).ok().map(|p| p.0);
    }

    matrix
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::components::Name;
    use crate::scene::transform::Transform;
    use glam::{Quat, Vec3};

    fn spawn_pair(world: &mut World, parent_tr: Transform, child_tr: Transform) -> (hecs::Entity, hecs::Entity) {
        let parent = world.spawn((Name::new("Parent"), TransformComponent(parent_tr)));
        let child = world.spawn((Name::new("Child"), TransformComponent(child_tr), Parent(parent)));
        world.insert_one(parent, Children(vec![child])).ok();
        (parent, child)
    }

    #[test]
    fn test_transform_propagation_simple() {
        let mut world = World::new();
        let (parent, child) = spawn_pair(
            &mut world,
            Transform::from_translation(Vec3::new(5.0, 0.0, 0.0)),
            Transform::from_translation(Vec3::new(2.0, 0.0, 0.0)),
        );

        propagate_transforms(&mut world);

        let parent_world = world.get::<&WorldTransform>(parent).unwrap();
        assert!(parent_world
            .0
            .transform_point3(Vec3::ZERO)
            .abs_diff_eq(Vec3::new(5.0, 0.0, 0.0), 1e-6));

        let child_world = world.get::<&WorldTransform>(child).unwrap();
        assert!(child_world
            .0
            .transform_point3(Vec3::ZERO)
            .abs_diff_eq(Vec3::new(7.0, 0.0, 0.0), 1e-6));
    }

    #[test]
    fn test_transform_propagation_rotation() {
        let mut world = World::new();
        let (_, child) = spawn_pair(
            &mut world,
            Transform::from_trs(
                Vec3::ZERO,
                Quat::from_rotation_y(std::f32::consts::FRAC_PI_2),
                Vec3::ONE,
            ),
            Transform::from_translation(Vec3::new(1.0, 0.0, 0.0)),
        );

        propagate_transforms(&mut world);

        let child_world = world.get::<&WorldTransform>(child).unwrap();
        assert!(child_world
            .0
            .transform_point3(Vec3::ZERO)
            .abs_diff_eq(Vec3::new(0.0, 0.0, -1.0), 1e-5));
    }

    #[test]
    fn world_matrix_matches_propagation() {
        let mut world = World::new();
        let (_, child) = spawn_pair(
            &mut world,
            Transform::from_trs(Vec3::new(1.0, 2.0, 3.0), Quat::from_rotation_x(0.3), Vec3::splat(2.0)),
            Transform::from_trs(Vec3::new(-1.0, 0.0, 4.0), Quat::from_rotation_z(1.1), Vec3::ONE),
        );

        propagate_transforms(&mut world);

        let propagated = world.get::<&WorldTransform>(child).unwrap().0;
        assert!(world_matrix(&world, child).abs_diff_eq(propagated, 1e-5));
    }
}
