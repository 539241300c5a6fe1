/// Buffer - Vulkan implementation of the Buffer trait

use ash::vk;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};
use gpu_allocator::MemoryLocation;
use std::any::Any;
use std::sync::Arc;
use strata_engine::strata::{Error, Result};
use strata_engine::strata::device::{Buffer, BufferUsage};
use strata_engine::{engine_err, engine_error};

use crate::vulkan_context::GpuContext;

/// Host-visible vertex or index buffer, filled once at creation
pub struct VulkanBuffer {
    ctx: Arc<GpuContext>,
    pub(crate) buffer: vk::Buffer,
    allocation: Option<Allocation>,
    size: u64,
    usage: BufferUsage,
}

impl VulkanBuffer {
    /// Create a buffer of `data.len()` bytes and copy `data` into it
    pub fn with_data(ctx: Arc<GpuContext>, usage: BufferUsage, data: &[u8]) -> Result<Self> {
        if data.is_empty() {
            return Err(Error::InvalidConfiguration(format!("{:?} buffer data is empty", usage)));
        }
        let size = data.len() as u64;
        let vk_usage = match usage {
            BufferUsage::Vertex => vk::BufferUsageFlags::VERTEX_BUFFER,
            BufferUsage::Index => vk::BufferUsageFlags::INDEX_BUFFER,
        };

        unsafe {
            let create_info = vk::BufferCreateInfo::default()
                .size(size)
                .usage(vk_usage)
                .sharing_mode(vk::SharingMode::EXCLUSIVE);

            let buffer = ctx.device.create_buffer(&create_info, None).map_err(|e| {
                engine_err!("strata::vulkan", "Failed to create buffer of size {} bytes: {:?}", size, e)
            })?;

            // From here on, Drop releases the buffer and any allocation
            let mut vulkan_buffer = Self {
                ctx: Arc::clone(&ctx),
                buffer,
                allocation: None,
                size,
                usage,
            };

            let requirements = ctx.device.get_buffer_memory_requirements(buffer);
            let allocation = {
                let mut allocator = ctx.allocator.lock().map_err(|_| {
                    engine_err!("strata::vulkan", "GPU allocator mutex poisoned")
                })?;
                allocator
                    .allocate(&AllocationCreateDesc {
                        name: match usage {
                            BufferUsage::Vertex => "vertex_buffer",
                            BufferUsage::Index => "index_buffer",
                        },
                        requirements,
                        location: MemoryLocation::CpuToGpu,
                        linear: true,
                        allocation_scheme: AllocationScheme::GpuAllocatorManaged,
                    })
                    .map_err(|e| {
                        let size_mb = requirements.size as f64 / (1024.0 * 1024.0);
                        engine_error!("strata::vulkan", "Out of GPU memory for buffer (required: {:.2} MB)", size_mb);
                        Error::BackendError(format!("Buffer allocation failed: {}", e))
                    })?
            };

            let allocation = vulkan_buffer.allocation.insert(allocation);

            ctx.device
                .bind_buffer_memory(buffer, allocation.memory(), allocation.offset())
                .map_err(|e| engine_err!("strata::vulkan", "Failed to bind buffer memory: {:?}", e))?;

            let mapped_ptr = allocation
                .mapped_ptr()
                .ok_or_else(|| engine_err!("strata::vulkan", "Buffer memory is not CPU-accessible"))?
                .as_ptr() as *mut u8;
            std::ptr::copy_nonoverlapping(data.as_ptr(), mapped_ptr, data.len());

            Ok(vulkan_buffer)
        }
    }
}

impl Buffer for VulkanBuffer {
    fn size(&self) -> u64 {
        self.size
    }

    fn usage(&self) -> BufferUsage {
        self.usage
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for VulkanBuffer {
    fn drop(&mut self) {
        unsafe {
            if let Some(allocation) = self.allocation.take() {
                // Don't panic if lock fails - we still need to destroy the buffer
                if let Ok(mut allocator) = self.ctx.allocator.lock() {
                    allocator.free(allocation).ok();
                }
            }
            self.ctx.device.destroy_buffer(self.buffer, None);
        }
    }
}

/// Raw buffer behind a trait object created by this backend
pub(crate) fn vk_buffer(buffer: &dyn Buffer) -> Result<vk::Buffer> {
    buffer
        .as_any()
        .downcast_ref::<VulkanBuffer>()
        .map(|b| b.buffer)
        .ok_or_else(|| engine_err!("strata::vulkan", "Buffer was not created by the Vulkan backend"))
}
