//! CPU-side geometry.

use glam::{Vec2, Vec3};
use inflight_rhi::vertex::Vertex;

/// Indexed triangle list with 16-bit indices.
#[derive(Clone, Debug, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u16>,
}

impl MeshData {
    /// Unit quad in the XY plane facing +Z, counter-clockwise.
    pub fn quad() -> Self {
        let vertices = vec![
            Vertex::new(Vec3::new(-0.5, -0.5, 0.0), Vec2::new(0.0, 0.0)),
            Vertex::new(Vec3::new(0.5, -0.5, 0.0), Vec2::new(1.0, 0.0)),
            Vertex::new(Vec3::new(0.5, 0.5, 0.0), Vec2::new(1.0, 1.0)),
            Vertex::new(Vec3::new(-0.5, 0.5, 0.0), Vec2::new(0.0, 1.0)),
        ];

        Self {
            vertices,
            indices: vec![0, 1, 2, 2, 3, 0],
        }
    }

    #[inline]
    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }

    /// Every index refers to an existing vertex and the list is whole triangles.
    pub fn is_valid(&self) -> bool {
        !self.indices.is_empty()
            && self.indices.len() % 3 == 0
            && self
                .indices
                .iter()
                .all(|&i| (i as usize) < self.vertices.len())
    }
}
