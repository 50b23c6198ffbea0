use crate::scene::components::{Children, Parent, PrefabInstance};
use hecs::{Entity, World};

/// Remove `child` from its current parent's `Children` list, if any.
pub(crate) fn detach(world: &mut World, child: Entity) {
    let old_parent = match world.remove_one::<Parent>(child) {
        Ok(parent) => parent.0,
        Err(_) => return,
    };

    if let Ok(mut children) = world.get::<&mut Children>(old_parent) {
        children.0.retain(|&c| c != child);
    }
}

/// Make `child` the last child of `parent`. Does not check for cycles.
pub(crate) fn attach(world: &mut World, child: Entity, parent: Entity) {
    detach(world, child);

    world.insert_one(child, Parent(parent)).ok();

    let has_children = world.get::<&Children>(parent).is_ok();
    if has_children {
        if let Ok(mut children) = world.get::<&mut Children>(parent) {
            children.0.push(child);
        }
    } else {
        world.insert_one(parent, Children(vec![child])).ok();
    }
}

pub(crate) fn is_ancestor(world: &World, ancestor: Entity, entity: Entity) -> bool {
    let mut current = Some(entity);
    while let Some(e) = current {
        if e == ancestor {
            return true;
        }
        current = world.get::<&Parent>(e).ok().map(|p| p.0);
    }
    false
}

/// True when `entity` or one of its ancestors is a nested prefab instance.
pub(crate) fn is_prefab_owned(world: &World, entity: Entity) -> bool {
    let mut current = Some(entity);
    while let Some(e) = current {
        if world.get::<&PrefabInstance>(e).is_ok() {
            return true;
        }
        current = world.get::<&Parent>(e).ok().map(|p| p.0);
    }
    false
}

/// Depth-first pre-order walk of the subtree rooted at `root`, children in order.
pub(crate) fn subtree(world: &World, root: Entity) -> Vec<Entity> {
    let mut order = Vec::new();
    let mut stack = vec![root];

    while let Some(entity) = stack.pop() {
        if !world.contains(entity) {
            continue;
        }
        order.push(entity);
        if let Ok(children) = world.get::<&Children>(entity) {
            stack.extend(children.0.iter().rev().copied());
        }
    }

    order
}

/// Despawn `entity` and all its descendants. Returns false if `entity` was
/// already gone.
pub(crate) fn despawn_recursive(world: &mut World, entity: Entity) -> bool {
    if !world.contains(entity) {
        return false;
    }

    detach(world, entity);

    for e in subtree(world, entity) {
        if let Err(err) = world.despawn(e) {
            log::trace!("Entity {:?} already despawned: {:?}", e, err);
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::components::Name;

    fn chain(world: &mut World) -> (Entity, Entity, Entity) {
        let a = world.spawn((Name::new("A"),));
        let b = world.spawn((Name::new("B"),));
        let c = world.spawn((Name::new("C"),));
        attach(world, b, a);
        attach(world, c, b);
        (a, b, c)
    }

    #[test]
    fn attach_moves_child_between_parents() {
        let mut world = World::new();
        let (a, b, c) = chain(&mut world);

        attach(&mut world, c, a);

        assert_eq!(world.get::<&Children>(a).unwrap().0, vec![b, c]);
        assert!(world.get::<&Children>(b).unwrap().0.is_empty());
        assert_eq!(world.get::<&Parent>(c).unwrap().0, a);
    }

    #[test]
    fn despawn_recursive_removes_subtree_and_tolerates_repeats() {
        let mut world = World::new();
        let (a, b, c) = chain(&mut world);

        assert!(despawn_recursive(&mut world, b));
        assert!(!world.contains(c));
        assert!(world.get::<&Children>(a).unwrap().0.is_empty());

        assert!(!despawn_recursive(&mut world, c));
        assert!(!despawn_recursive(&mut world, b));
    }

    #[test]
    fn prefab_ownership_is_inherited() {
        let mut world = World::new();
        let (a, b, c) = chain(&mut world);
        world
            .insert_one(b, PrefabInstance { source: "rock.prefab".into() })
            .unwrap();

        assert!(!is_prefab_owned(&world, a));
        assert!(is_prefab_owned(&world, b));
        assert!(is_prefab_owned(&world, c));
        assert!(is_ancestor(&world, a, c));
        assert!(!is_ancestor(&world, c, a));
    }

    #[test]
    fn subtree_is_preorder() {
        let mut world = World::new();
        let (a, b, c) = chain(&mut world);
        let d = world.spawn((Name::new("D"),));
        attach(&mut world, d, a);

        assert_eq!(subtree(&world, a), vec![a, b, c, d]);
    }
}
