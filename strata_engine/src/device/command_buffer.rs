/// CommandBuffer trait - records GPU commands, primary or secondary

use std::any::Any;
use std::sync::Arc;
use bitflags::bitflags;
use crate::error::Result;
use crate::device::{Buffer, Framebuffer, Pipeline, RenderPass};

/// Opaque command buffer handle, passed to submits and `execute_commands`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommandBufferHandle(pub u64);

/// Command buffer level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandBufferLevel {
    /// Submitted directly to a queue
    Primary,
    /// Executed from a primary buffer inside a render pass
    Secondary,
}

/// How the commands of a subpass are provided
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubpassContents {
    /// Recorded directly in the primary buffer
    Inline,
    /// Recorded in secondary buffers and executed from the primary
    SecondaryCommandBuffers,
}

bitflags! {
    /// Usage flags given when a buffer begins recording
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CommandBufferUsage: u32 {
        const ONE_TIME_SUBMIT = 1 << 0;
        /// Secondary buffer lives entirely inside a render pass
        const RENDER_PASS_CONTINUE = 1 << 1;
        const SIMULTANEOUS_USE = 1 << 2;
    }
}

/// Render pass state a secondary buffer continues
#[derive(Clone)]
pub struct InheritanceInfo {
    pub render_pass: Arc<dyn RenderPass>,
    pub framebuffer: Arc<dyn Framebuffer>,
    pub subpass: u32,
}

/// Viewport
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

impl Viewport {
    /// Full-extent viewport with depth range [0, 1]
    pub fn from_extent(width: u32, height: u32) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: width as f32,
            height: height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        }
    }
}

/// 2D rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect2D {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect2D {
    pub fn from_extent(width: u32, height: u32) -> Self {
        Self { x: 0, y: 0, width, height }
    }
}

/// Clear value for an attachment
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClearValue {
    /// Color clear value (RGBA)
    Color([f32; 4]),
    /// Depth/stencil clear value
    DepthStencil { depth: f32, stencil: u32 },
}

/// One command buffer allocated from a [`CommandPool`](crate::device::CommandPool)
///
/// Recording methods fail with `BackendError` when the buffer is not recording.
pub trait CommandBuffer: Send {
    /// Handle used to reference this buffer from submits and primaries
    fn handle(&self) -> CommandBufferHandle;

    /// Level the buffer was allocated with
    fn level(&self) -> CommandBufferLevel;

    /// Begin recording
    ///
    /// Secondary buffers must receive `inheritance`; primaries ignore it.
    fn begin(&mut self, usage: CommandBufferUsage, inheritance: Option<&InheritanceInfo>) -> Result<()>;

    /// End recording
    fn end(&mut self) -> Result<()>;

    /// Return the buffer to its initial state
    fn reset(&mut self) -> Result<()>;

    /// Begin a render pass (primary buffers only)
    fn begin_render_pass(
        &mut self,
        render_pass: &Arc<dyn RenderPass>,
        framebuffer: &Arc<dyn Framebuffer>,
        clear_values: &[ClearValue],
        contents: SubpassContents,
    ) -> Result<()>;

    /// End the current render pass
    fn end_render_pass(&mut self) -> Result<()>;

    /// Set the dynamic viewport
    fn set_viewport(&mut self, viewport: Viewport) -> Result<()>;

    /// Set the dynamic scissor rectangle
    fn set_scissor(&mut self, scissor: Rect2D) -> Result<()>;

    /// Bind a graphics pipeline
    fn bind_pipeline(&mut self, pipeline: &Arc<dyn Pipeline>) -> Result<()>;

    /// Bind a vertex buffer at binding 0
    fn bind_vertex_buffer(&mut self, buffer: &Arc<dyn Buffer>, offset: u64) -> Result<()>;

    /// Bind a 32-bit index buffer
    fn bind_index_buffer(&mut self, buffer: &Arc<dyn Buffer>, offset: u64) -> Result<()>;

    /// Upload push constants to the vertex stage of the bound pipeline
    fn push_constants(&mut self, offset: u32, data: &[u8]) -> Result<()>;

    /// Draw indexed primitives (one instance)
    fn draw_indexed(&mut self, index_count: u32, first_index: u32, vertex_offset: i32) -> Result<()>;

    /// Execute secondary buffers, in order, from this primary buffer
    fn execute_commands(&mut self, secondaries: &[CommandBufferHandle]) -> Result<()>;

    /// Downcast support for backends
    fn as_any(&self) -> &dyn Any;
}
