/*!
# Strata Engine - Vulkan Backend

Vulkan implementation of the `strata_engine` device traits.

This crate uses Ash for the Vulkan bindings and gpu-allocator for buffer memory.
Every object holds an `Arc<GpuContext>`, so the logical device and instance are
destroyed only after the last object created from them is gone.

```no_run
use strata_engine::strata::{EngineConfig, FrameOrchestrator};
use strata_engine::strata::scene::MeshData;
use strata_engine_renderer_vulkan::create_render_backend;
# fn demo(window: &winit::window::Window) -> strata_engine::strata::Result<()> {
let config = EngineConfig::default();
let backend = create_render_backend(window, &config, &MeshData::cube())?;
let mut orchestrator = FrameOrchestrator::new(config);
orchestrator.initialize(backend)?;
# Ok(())
# }
```
*/

mod vulkan_context;
mod vulkan_convert;
mod vulkan_device;
mod vulkan_command;
mod vulkan_sync;
mod vulkan_swapchain;
mod vulkan_render_pass;
mod vulkan_pipeline;
mod vulkan_buffer;
mod vulkan_backend;
mod debug;

pub use vulkan_context::GpuContext;
pub use vulkan_device::VulkanGraphicsDevice;
pub use vulkan_swapchain::VulkanDisplay;
pub use vulkan_render_pass::{VulkanRenderPass, VulkanFramebuffer};
pub use vulkan_pipeline::VulkanPipeline;
pub use vulkan_buffer::VulkanBuffer;
pub use vulkan_command::{VulkanCommandPool, VulkanCommandBuffer};
pub use vulkan_sync::{VulkanFence, VulkanSemaphore};
pub use vulkan_backend::{create_render_backend, VERTEX_SHADER_FILE, FRAGMENT_SHADER_FILE};

// Re-export debug utilities
pub use debug::{get_validation_stats, print_validation_stats_report, ValidationStats};
