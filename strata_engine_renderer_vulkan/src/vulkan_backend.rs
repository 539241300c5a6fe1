/// Assembles the Vulkan objects the frame orchestrator needs

use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use std::sync::Arc;
use strata_engine::strata::{EngineConfig, RenderBackend, Result};
use strata_engine::strata::device::{Buffer, BufferUsage, MeshBuffers};
use strata_engine::strata::scene::MeshData;
use strata_engine::engine_info;

use crate::vulkan_buffer::VulkanBuffer;
use crate::vulkan_device::VulkanGraphicsDevice;
use crate::vulkan_pipeline::VulkanPipeline;
use crate::vulkan_render_pass::VulkanRenderPass;
use crate::vulkan_swapchain::VulkanDisplay;

/// Compiled vertex shader looked up in `EngineConfig::shader_directory`
pub const VERTEX_SHADER_FILE: &str = "default_vertex_shader.spv";

/// Compiled fragment shader looked up in `EngineConfig::shader_directory`
pub const FRAGMENT_SHADER_FILE: &str = "default_fragment_shader.spv";

/// Create device, display, render pass, pipeline and mesh buffers for `window`
///
/// The swapchain starts at `config.window_width` x `config.window_height`
/// (clamped to what the surface allows).
///
/// # Errors
///
/// - `NoPrimaryDevice` when no GPU has a graphics + transfer queue family
/// - `PresentationUnsupportedForQueueFamily` when that family cannot present
/// - `InvalidResourcePath` when a shader file is missing
pub fn create_render_backend<W: HasDisplayHandle + HasWindowHandle>(
    window: &W,
    config: &EngineConfig,
    mesh: &MeshData,
) -> Result<RenderBackend> {
    let device = VulkanGraphicsDevice::new(window, config)?;
    let ctx = Arc::clone(device.context());

    let display = VulkanDisplay::new(
        &device,
        window,
        config.window_width,
        config.window_height,
        config.vsync,
    )?;

    let render_pass = VulkanRenderPass::new(Arc::clone(&ctx), display.format())?;
    let pipeline = VulkanPipeline::new(
        Arc::clone(&ctx),
        &render_pass,
        &config.shader_path(VERTEX_SHADER_FILE),
        &config.shader_path(FRAGMENT_SHADER_FILE),
    )?;

    let vertex_buffer: Arc<dyn Buffer> = Arc::new(VulkanBuffer::with_data(
        Arc::clone(&ctx),
        BufferUsage::Vertex,
        mesh.vertex_bytes(),
    )?);
    let index_buffer: Arc<dyn Buffer> = Arc::new(VulkanBuffer::with_data(
        Arc::clone(&ctx),
        BufferUsage::Index,
        mesh.index_bytes(),
    )?);

    engine_info!(
        "strata::vulkan",
        "Render backend ready on {} ({} vertices, {} indices)",
        device.device_name(),
        mesh.vertices.len(),
        mesh.index_count()
    );

    Ok(RenderBackend {
        device: Arc::new(device),
        display: Box::new(display),
        render_pass: Arc::new(render_pass),
        pipeline: Arc::new(pipeline),
        mesh: MeshBuffers::new(vertex_buffer, index_buffer),
    })
}
