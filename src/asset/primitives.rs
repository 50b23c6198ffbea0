use super::mesh::Mesh;
use super::vertex::{v, Vertex};

/// Unit cube centred on the origin, 24 vertices / 12 triangles, CCW outward.
pub fn cube_mesh() -> Mesh {
    let face = |normal: [f32; 3], corners: [[f32; 3]; 4]| -> [Vertex; 4] {
        let uvs = [[0.0, 1.0], [0.0, 0.0], [1.0, 0.0], [1.0, 1.0]];
        [
            v(corners[0], normal, uvs[0]),
            v(corners[1], normal, uvs[1]),
            v(corners[2], normal, uvs[2]),
            v(corners[3], normal, uvs[3]),
        ]
    };

    let faces = [
        // +X
        face(
            [1.0, 0.0, 0.0],
            [[0.5, -0.5, -0.5], [0.5, 0.5, -0.5], [0.5, 0.5, 0.5], [0.5, -0.5, 0.5]],
        ),
        // -X
        face(
            [-1.0, 0.0, 0.0],
            [[-0.5, -0.5, 0.5], [-0.5, 0.5, 0.5], [-0.5, 0.5, -0.5], [-0.5, -0.5, -0.5]],
        ),
        // +Y
        face(
            [0.0, 1.0, 0.0],
            [[-0.5, 0.5, -0.5], [-0.5, 0.5, 0.5], [0.5, 0.5, 0.5], [0.5, 0.5, -0.5]],
        ),
        // -Y
        face(
            [0.0, -1.0, 0.0],
            [[-0.5, -0.5, 0.5], [-0.5, -0.5, -0.5], [0.5, -0.5, -0.5], [0.5, -0.5, 0.5]],
        ),
        // +Z
        face(
            [0.0, 0.0, 1.0],
            [[0.5, -0.5, 0.5], [0.5, 0.5, 0.5], [-0.5, 0.5, 0.5], [-0.5, -0.5, 0.5]],
        ),
        // -Z
        face(
            [0.0, 0.0, -1.0],
            [[-0.5, -0.5, -0.5], [-0.5, 0.5, -0.5], [0.5, 0.5, -0.5], [0.5, -0.5, -0.5]],
        ),
    ];

    let vertices: Vec<Vertex> = faces.iter().flatten().copied().collect();
    let indices = (0..6u32)
        .flat_map(|f| {
            let o = f * 4;
            [o, o + 1, o + 2, o, o + 2, o + 3]
        })
        .collect();

    Mesh::from_vertices("Cube", vertices, indices)
}

/// Flat grid in the XZ plane facing +Y with `(cols + 1) * (rows + 1)` vertices.
pub fn grid_mesh(cols: u32, rows: u32) -> Mesh {
    let cols = cols.max(1);
    let rows = rows.max(1);

    let mut vertices = Vec::with_capacity(((cols + 1) * (rows + 1)) as usize);
    for row in 0..=rows {
        for col in 0..=cols {
            let u = col as f32 / cols as f32;
            let t = row as f32 / rows as f32;
            vertices.push(v([u - 0.5, 0.0, t - 0.5], [0.0, 1.0, 0.0], [u, t]));
        }
    }

    let mut indices = Vec::with_capacity((cols * rows * 6) as usize);
    for row in 0..rows {
        for col in 0..cols {
            let current = row * (cols + 1) + col;
            let next = current + cols + 1;

            indices.extend_from_slice(&[current, next, current + 1]);
            indices.extend_from_slice(&[current + 1, next, next + 1]);
        }
    }

    Mesh::from_vertices(format!("Grid{}x{}", cols, rows), vertices, indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_counts_look_right() {
        let cube = cube_mesh();
        assert_eq!(cube.vertex_count(), 24);
        assert_eq!(cube.index_count(), 36);
    }

    #[test]
    fn grid_vertex_count_is_exact() {
        assert_eq!(grid_mesh(199, 199).vertex_count(), 40_000);
        assert_eq!(grid_mesh(1, 1).triangle_count(), 2);
    }

    #[test]
    fn grid_triangles_face_up() {
        let grid = grid_mesh(1, 1);
        let positions: Vec<_> = grid.vertices().iter().map(|vx| vx.position()).collect();
        let tri: Vec<u32> = grid.indices().iter().take(3).collect();
        let (a, b, c) = (
            positions[tri[0] as usize],
            positions[tri[1] as usize],
            positions[tri[2] as usize],
        );
        assert!((b - a).cross(c - a).y > 0.0);
    }
}
