use crate::asset::{Mesh, Vertex};
use glam::{Mat3, Mat4};
use rayon::prelude::*;

/// One input of a merge: source geometry and the matrix taking it into the
/// destination frame.
#[derive(Debug, Clone, Copy)]
pub struct CombinePart<'a> {
    pub mesh: &'a Mesh,
    pub transform: Mat4,
}

/// Concatenate the parts into one mesh, baking each part's transform into
/// its vertices. The result is meant to be drawn with an identity transform
/// in the destination frame.
///
/// # Panics
///
/// Panics if the total vertex count exceeds `vertex_limit`; callers must
/// only hand over packed bins.
pub fn combine_meshes(name: impl Into<String>, parts: &[CombinePart<'_>], vertex_limit: usize) -> Mesh {
    let total_vertices: usize = parts.iter().map(|p| p.mesh.vertex_count()).sum();
    assert!(
        total_vertices <= vertex_limit,
        "merge of {} vertices exceeds the limit of {}",
        total_vertices,
        vertex_limit
    );

    let baked: Vec<(Vec<Vertex>, Vec<u32>)> = parts.par_iter().map(bake_part).collect();

    let total_indices: usize = baked.iter().map(|(_, indices)| indices.len()).sum();
    let mut vertices = Vec::with_capacity(total_vertices);
    let mut indices = Vec::with_capacity(total_indices);

    for (part_vertices, part_indices) in baked {
        let base = vertices.len() as u32;
        indices.extend(part_indices.into_iter().map(|i| base + i));
        vertices.extend(part_vertices);
    }

    Mesh::from_vertices(name, vertices, indices)
}

fn bake_part(part: &CombinePart<'_>) -> (Vec<Vertex>, Vec<u32>) {
    let m = part.transform;
    let linear = Mat3::from_mat4(m);
    let det = linear.determinant();
    let normal_matrix = if det.abs() > f32::EPSILON {
        linear.inverse().transpose()
    } else {
        linear
    };

    let vertices = part
        .mesh
        .vertices()
        .iter()
        .map(|v| Vertex {
            pos: m.transform_point3(v.position()).to_array(),
            normal: (normal_matrix * v.normal()).normalize_or_zero().to_array(),
            uv: v.uv,
        })
        .collect();

    let mut indices: Vec<u32> = part.mesh.indices().iter().collect();
    // Mirroring transforms turn faces inside out; restore the winding
    if det < 0.0 {
        for tri in indices.chunks_exact_mut(3) {
            tri.swap(1, 2);
        }
    }

    (vertices, indices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::primitives::{cube_mesh, grid_mesh};
    use crate::batch::VERTEX_LIMIT;
    use glam::{Quat, Vec3};

    fn face_normal(mesh: &Mesh, tri: usize) -> Vec3 {
        let idx: Vec<u32> = mesh.indices().iter().skip(tri * 3).take(3).collect();
        let p = |i: u32| mesh.vertices()[i as usize].position();
        (p(idx[1]) - p(idx[0])).cross(p(idx[2]) - p(idx[0]))
    }

    #[test]
    fn merged_vertices_match_transformed_sources() {
        let cube = cube_mesh();
        let grid = grid_mesh(2, 3);
        let a = Mat4::from_translation(Vec3::new(10.0, 0.0, 0.0));
        let b = Mat4::from_scale_rotation_translation(
            Vec3::splat(2.0),
            Quat::from_rotation_y(0.8),
            Vec3::new(0.0, -3.0, 1.0),
        );

        let merged = combine_meshes(
            "merged",
            &[
                CombinePart { mesh: &cube, transform: a },
                CombinePart { mesh: &grid, transform: b },
            ],
            VERTEX_LIMIT,
        );

        assert_eq!(merged.vertex_count(), cube.vertex_count() + grid.vertex_count());
        assert_eq!(merged.index_count(), cube.index_count() + grid.index_count());
        assert!(merged.indices().is_u16());

        for (i, v) in cube.vertices().iter().enumerate() {
            let expected = a.transform_point3(v.position());
            assert!(merged.vertices()[i].position().abs_diff_eq(expected, 1e-5));
        }
        let offset = cube.vertex_count();
        for (i, v) in grid.vertices().iter().enumerate() {
            let expected = b.transform_point3(v.position());
            assert!(merged.vertices()[offset + i].position().abs_diff_eq(expected, 1e-4));
            assert_eq!(merged.vertices()[offset + i].uv, v.uv);
        }

        // second part's indices are rebased past the first part's vertices
        let first_grid_index = merged.indices().iter().nth(cube.index_count()).unwrap();
        assert_eq!(first_grid_index as usize, offset);
    }

    #[test]
    fn normals_follow_non_uniform_scale() {
        let grid = grid_mesh(1, 1);
        let squash = Mat4::from_rotation_z(std::f32::consts::FRAC_PI_4)
            * Mat4::from_scale(Vec3::new(4.0, 1.0, 1.0));

        let merged = combine_meshes("m", &[CombinePart { mesh: &grid, transform: squash }], VERTEX_LIMIT);

        let n = merged.vertices()[0].normal();
        assert!((n.length() - 1.0).abs() < 1e-5);
        // normal stays perpendicular to the transformed surface
        let geometric = face_normal(&merged, 0).normalize();
        assert!(n.abs_diff_eq(geometric, 1e-4));
    }

    #[test]
    fn mirrored_parts_keep_outward_winding() {
        let grid = grid_mesh(1, 1);
        let mirror = Mat4::from_scale(Vec3::new(-1.0, 1.0, 1.0));

        let merged = combine_meshes("m", &[CombinePart { mesh: &grid, transform: mirror }], VERTEX_LIMIT);

        assert!(face_normal(&merged, 0).y > 0.0);
        assert!(merged.vertices()[0].normal().abs_diff_eq(Vec3::Y, 1e-6));
    }

    #[test]
    fn inputs_are_not_mutated() {
        let cube = cube_mesh();
        let before = cube.clone();
        combine_meshes(
            "m",
            &[CombinePart { mesh: &cube, transform: Mat4::from_scale(Vec3::splat(3.0)) }],
            VERTEX_LIMIT,
        );
        assert_eq!(cube, before);
    }

    #[test]
    #[should_panic(expected = "exceeds the limit")]
    fn oversized_merge_is_rejected() {
        let grid = grid_mesh(9, 9); // 100 vertices
        combine_meshes(
            "m",
            &[
                CombinePart { mesh: &grid, transform: Mat4::IDENTITY },
                CombinePart { mesh: &grid, transform: Mat4::IDENTITY },
            ],
            150,
        );
    }
}
