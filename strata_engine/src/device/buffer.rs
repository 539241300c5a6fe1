/// Buffer trait and the mesh buffers consumed by recording jobs

use std::any::Any;
use std::sync::Arc;

/// Usage of a GPU buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferUsage {
    Vertex,
    Index,
}

/// GPU buffer
pub trait Buffer: Send + Sync {
    /// Size in bytes
    fn size(&self) -> u64;

    /// Usage the buffer was created for
    fn usage(&self) -> BufferUsage;

    /// Downcast support for backends
    fn as_any(&self) -> &dyn Any;
}

/// Vertex + 32-bit index buffers of one mesh
#[derive(Clone)]
pub struct MeshBuffers {
    pub vertex_buffer: Arc<dyn Buffer>,
    pub index_buffer: Arc<dyn Buffer>,
    pub index_count: u32,
}

impl MeshBuffers {
    /// Build from buffers, deriving the index count from the index buffer size
    pub fn new(vertex_buffer: Arc<dyn Buffer>, index_buffer: Arc<dyn Buffer>) -> Self {
        let index_count = (index_buffer.size() / std::mem::size_of::<u32>() as u64) as u32;
        Self { vertex_buffer, index_buffer, index_count }
    }
}
