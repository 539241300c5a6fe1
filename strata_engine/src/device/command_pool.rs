/// CommandPool trait - allocation context for command buffers

use std::any::Any;
use bitflags::bitflags;
use crate::error::Result;
use crate::device::{CommandBuffer, CommandBufferLevel};

bitflags! {
    /// Creation flags of a command pool
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CommandPoolFlags: u32 {
        /// Buffers are short-lived and re-recorded often
        const TRANSIENT = 1 << 0;
        /// Buffers can be reset individually (required to re-begin them)
        const RESET_COMMAND_BUFFER = 1 << 1;
    }
}

/// Command pool bound to one queue family
///
/// Destroying the pool (through [`GraphicsDevice::destroy_command_pool`] or by
/// dropping it) frees every buffer allocated from it. Buffers must be dropped
/// first and must not be referenced by pending GPU work at that point.
///
/// [`GraphicsDevice::destroy_command_pool`]: crate::device::GraphicsDevice::destroy_command_pool
pub trait CommandPool: Send {
    /// Queue family the pool was created for
    fn queue_family_index(&self) -> u32;

    /// Allocate `count` command buffers of `level`
    fn allocate_buffers(
        &mut self,
        level: CommandBufferLevel,
        count: u32,
    ) -> Result<Vec<Box<dyn CommandBuffer>>>;

    /// Reset every buffer allocated from the pool
    fn reset(&mut self) -> Result<()>;

    /// Downcast support for backends
    fn as_any_mut(&mut self) -> &mut dyn Any;
}
