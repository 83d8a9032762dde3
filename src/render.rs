//! Interleaved render buffers produced by [`Shape::gen_geometry`](crate::shape::Shape::gen_geometry).

use bytemuck::{Pod, Zeroable};
use nalgebra::{Point3, Vector3};

/// Render vertex with position and normal.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct RenderVertex {
    /// World-space position.
    pub position: [f32; 3],
    /// World-space unit normal.
    pub normal: [f32; 3],
}

impl RenderVertex {
    /// Build from double-precision position and normal.
    pub fn new(p: &Point3<f64>, n: &Vector3<f64>) -> Self {
        Self {
            position: [p.x as f32, p.y as f32, p.z as f32],
            normal: [n.x as f32, n.y as f32, n.z as f32],
        }
    }
}

/// Indexed triangle geometry ready for upload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShapeGeometry {
    /// Interleaved vertices.
    pub vertices: Vec<RenderVertex>,
    /// Triangle list indices into `vertices`.
    pub indices: Vec<u32>,
    /// RGBA colour.
    pub colour: [f32; 4],
}

impl ShapeGeometry {
    /// Empty geometry with the given colour.
    pub fn new(colour: [f32; 4]) -> Self {
        Self {
            vertices: Vec::new(),
            indices: Vec::new(),
            colour,
        }
    }

    /// Append a vertex and return its index.
    pub fn push_vertex(&mut self, p: &Point3<f64>, n: &Vector3<f64>) -> u32 {
        self.vertices.push(RenderVertex::new(p, n));
        (self.vertices.len() - 1) as u32
    }

    /// Append a triangle.
    pub fn push_triangle(&mut self, a: u32, b: u32, c: u32) {
        self.indices.extend_from_slice(&[a, b, c]);
    }

    /// Number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Vertex buffer contents.
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Index buffer contents.
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_views() {
        let mut geo = ShapeGeometry::new([1.0, 0.0, 0.0, 1.0]);
        let a = geo.push_vertex(&Point3::origin(), &Vector3::z());
        let b = geo.push_vertex(&Point3::new(1.0, 0.0, 0.0), &Vector3::z());
        let c = geo.push_vertex(&Point3::new(0.0, 1.0, 0.0), &Vector3::z());
        geo.push_triangle(a, b, c);

        assert_eq!(std::mem::size_of::<RenderVertex>(), 24);
        assert_eq!(geo.vertex_bytes().len(), 3 * 24);
        assert_eq!(geo.index_bytes().len(), 12);
        assert_eq!(geo.triangle_count(), 1);
    }
}
