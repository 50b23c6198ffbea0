use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug, PartialEq)]
pub struct Vertex {
    pub pos: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    /// Byte size of one packed vertex as stored in mesh asset files.
    pub const STRIDE: usize = std::mem::size_of::<Vertex>();

    pub fn position(&self) -> Vec3 {
        Vec3::from(self.pos)
    }

    pub fn normal(&self) -> Vec3 {
        Vec3::from(self.normal)
    }

    pub fn uv(&self) -> Vec2 {
        Vec2::from(self.uv)
    }
}

#[inline]
pub fn v(pos: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Vertex {
    Vertex { pos, normal, uv }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stride_matches_packed_layout() {
        // 3 + 3 + 2 floats, no padding
        assert_eq!(Vertex::STRIDE, 8 * std::mem::size_of::<f32>());
        assert_eq!(bytemuck::bytes_of(&v([0.0; 3], [0.0; 3], [0.0; 2])).len(), Vertex::STRIDE);
    }
}
