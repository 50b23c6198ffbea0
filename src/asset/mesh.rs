use super::vertex::Vertex;

/// Index storage of a mesh. Meshes addressing at most 65536 vertices use
/// 16-bit indices; larger source meshes keep 32-bit indices.
#[derive(Clone, Debug, PartialEq)]
pub enum Indices {
    U16(Vec<u16>),
    U32(Vec<u32>),
}

impl Indices {
    /// Pick the narrowest format able to address `vertex_count` vertices.
    pub fn for_vertex_count(vertex_count: usize, indices: Vec<u32>) -> Self {
        if vertex_count <= u16::MAX as usize + 1 {
            Indices::U16(indices.into_iter().map(|i| i as u16).collect())
        } else {
            Indices::U32(indices)
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Indices::U16(indices) => indices.len(),
            Indices::U32(indices) => indices.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> Box<dyn Iterator<Item = u32> + '_> {
        match self {
            Indices::U16(indices) => Box::new(indices.iter().map(|&i| u32::from(i))),
            Indices::U32(indices) => Box::new(indices.iter().copied()),
        }
    }

    pub fn is_u16(&self) -> bool {
        matches!(self, Indices::U16(_))
    }
}

/// Static triangle-list geometry resident in memory.
#[derive(Clone, Debug, PartialEq)]
pub struct Mesh {
    pub name: String,
    vertices: Vec<Vertex>,
    indices: Indices,
}

impl Mesh {
    pub fn from_vertices(name: impl Into<String>, vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        let indices = Indices::for_vertex_count(vertices.len(), indices);
        Self {
            name: name.into(),
            vertices,
            indices,
        }
    }

    pub fn from_parts(name: impl Into<String>, vertices: Vec<Vertex>, indices: Indices) -> Self {
        Self {
            name: name.into(),
            vertices,
            indices,
        }
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &Indices {
        &self.indices
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::vertex::v;

    #[test]
    fn small_meshes_use_u16_indices() {
        let vertices = vec![v([0.0; 3], [0.0, 1.0, 0.0], [0.0; 2]); 3];
        let mesh = Mesh::from_vertices("tri", vertices, vec![0, 1, 2]);
        assert!(mesh.indices().is_u16());
        assert_eq!(mesh.triangle_count(), 1);
    }

    #[test]
    fn u16_boundary_is_inclusive_of_65536_vertices() {
        assert!(Indices::for_vertex_count(65_536, vec![65_535]).is_u16());
        assert!(!Indices::for_vertex_count(65_537, vec![65_536]).is_u16());
    }

    #[test]
    fn iter_widens_u16_indices() {
        let indices = Indices::U16(vec![0, 7, 65_535]);
        assert_eq!(indices.iter().collect::<Vec<_>>(), vec![0, 7, 65_535]);
    }
}
