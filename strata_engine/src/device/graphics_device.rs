/// GraphicsDevice trait - logical device, queues and object creation

use crate::error::Result;
use crate::device::{CommandBufferHandle, CommandPool, CommandPoolFlags, Fence, Semaphore};

/// Opaque queue handle returned by [`GraphicsDevice::queue`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QueueHandle(pub u64);

/// One queue submission
///
/// Submission waits on `wait_semaphores` at the color attachment output stage,
/// signals `signal_semaphores` when the GPU finishes, then signals `fence`.
pub struct SubmitInfo<'a> {
    pub command_buffers: &'a [CommandBufferHandle],
    pub wait_semaphores: &'a [&'a dyn Semaphore],
    pub signal_semaphores: &'a [&'a dyn Semaphore],
    pub fence: Option<&'a dyn Fence>,
}

/// Logical device created on the primary physical device
///
/// Selecting the physical device and negotiating its capabilities happen in the
/// backend before this object exists.
pub trait GraphicsDevice: Send + Sync {
    /// Queue family supporting graphics + transfer, `None` when no device qualified
    fn primary_queue_family(&self) -> Option<u32>;

    /// Fetch a queue of the primary family by index
    fn queue(&self, index: u32) -> Result<QueueHandle>;

    /// Create a command pool bound to `queue_family_index`
    fn create_command_pool(
        &self,
        flags: CommandPoolFlags,
        queue_family_index: u32,
    ) -> Result<Box<dyn CommandPool>>;

    /// Destroy a command pool created by this device, freeing its buffers
    fn destroy_command_pool(&self, pool: Box<dyn CommandPool>) -> Result<()>;

    /// Create a fence, optionally already signaled
    fn create_fence(&self, signaled: bool) -> Result<Box<dyn Fence>>;

    /// Create an unsignaled binary semaphore
    fn create_semaphore(&self) -> Result<Box<dyn Semaphore>>;

    /// Submit command buffers to `queue`
    fn submit(&self, queue: QueueHandle, info: &SubmitInfo<'_>) -> Result<()>;

    /// Block until `queue` has no pending work
    fn queue_wait_idle(&self, queue: QueueHandle) -> Result<()>;

    /// Block until the whole device is idle
    fn wait_idle(&self) -> Result<()>;
}
