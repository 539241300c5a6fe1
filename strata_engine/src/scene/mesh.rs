/// CPU-side mesh data uploaded once into the backend's vertex/index buffers

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// Vertex layout shared with the pipeline: three `vec3` attributes, 36-byte stride
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 3],
}

impl Vertex {
    /// Byte stride of one vertex
    pub const STRIDE: u32 = std::mem::size_of::<Vertex>() as u32;
    /// Byte offsets of position, normal, color
    pub const ATTRIBUTE_OFFSETS: [u32; 3] = [0, 12, 24];
}

/// Vertices plus 32-bit triangle-list indices
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Unit cube centered on the origin, one flat-shaded quad per face
    ///
    /// Front faces wind counter-clockwise seen from outside.
    pub fn cube() -> Self {
        let faces = [
            (Vec3::X, Vec3::NEG_Z),
            (Vec3::NEG_X, Vec3::Z),
            (Vec3::Y, Vec3::X),
            (Vec3::NEG_Y, Vec3::X),
            (Vec3::Z, Vec3::X),
            (Vec3::NEG_Z, Vec3::NEG_X),
        ];

        let mut mesh = Self::default();
        for (normal, u) in faces {
            let v = normal.cross(u);
            let base = mesh.vertices.len() as u32;
            // Faces are tinted by their normal so orientation stays readable
            let color = (normal * 0.35 + Vec3::splat(0.65)).to_array();
            for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
                let position = (normal + u * su + v * sv) * 0.5;
                mesh.vertices.push(Vertex {
                    position: position.to_array(),
                    normal: normal.to_array(),
                    color,
                });
            }
            mesh.indices.extend([base, base + 1, base + 2, base + 2, base + 3, base]);
        }
        mesh
    }

    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }
}

#[cfg(test)]
#[path = "mesh_tests.rs"]
mod tests;
