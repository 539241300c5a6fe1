/// CommandPool and CommandBuffer - Vulkan implementations

use ash::vk;
use ash::vk::Handle;
use std::any::Any;
use std::sync::Arc;
use strata_engine::strata::{Error, Result};
use strata_engine::strata::device::{
    Buffer, ClearValue, CommandBuffer, CommandBufferHandle, CommandBufferLevel, CommandBufferUsage,
    CommandPool, CommandPoolFlags, Framebuffer, InheritanceInfo, Pipeline, Rect2D, RenderPass,
    SubpassContents, Viewport,
};
use strata_engine::engine_err;

use crate::vulkan_buffer::vk_buffer;
use crate::vulkan_context::GpuContext;
use crate::vulkan_convert::{
    clear_value_to_vk, command_buffer_level_to_vk, command_buffer_usage_to_vk,
    command_pool_flags_to_vk, rect_to_vk, subpass_contents_to_vk, viewport_to_vk,
};
use crate::vulkan_pipeline::VulkanPipeline;
use crate::vulkan_render_pass::{VulkanFramebuffer, VulkanRenderPass};

/// Vulkan command pool
///
/// Destroying the pool frees every buffer allocated from it.
pub struct VulkanCommandPool {
    ctx: Arc<GpuContext>,
    pub(crate) command_pool: vk::CommandPool,
    flags: CommandPoolFlags,
    queue_family_index: u32,
}

impl VulkanCommandPool {
    pub(crate) fn new(ctx: Arc<GpuContext>, flags: CommandPoolFlags, queue_family_index: u32) -> Result<Self> {
        let create_info = vk::CommandPoolCreateInfo::default()
            .queue_family_index(queue_family_index)
            .flags(command_pool_flags_to_vk(flags));

        let command_pool = unsafe {
            ctx.device
                .create_command_pool(&create_info, None)
                .map_err(|e| engine_err!("strata::vulkan", "Failed to create command pool: {:?}", e))?
        };

        Ok(Self { ctx, command_pool, flags, queue_family_index })
    }

    /// Destroy the pool now instead of on drop
    pub(crate) fn destroy(&mut self) {
        if self.command_pool != vk::CommandPool::null() {
            unsafe {
                self.ctx.device.destroy_command_pool(self.command_pool, None);
            }
            self.command_pool = vk::CommandPool::null();
        }
    }
}

impl CommandPool for VulkanCommandPool {
    fn queue_family_index(&self) -> u32 {
        self.queue_family_index
    }

    fn allocate_buffers(
        &mut self,
        level: CommandBufferLevel,
        count: u32,
    ) -> Result<Vec<Box<dyn CommandBuffer>>> {
        if self.command_pool == vk::CommandPool::null() {
            return Err(Error::InvalidState("Command pool already destroyed".to_string()));
        }

        let allocate_info = vk::CommandBufferAllocateInfo::default()
            .command_pool(self.command_pool)
            .level(command_buffer_level_to_vk(level))
            .command_buffer_count(count);

        let command_buffers = unsafe {
            self.ctx
                .device
                .allocate_command_buffers(&allocate_info)
                .map_err(|e| {
                    engine_err!("strata::vulkan", "Failed to allocate {} {:?} command buffers: {:?}", count, level, e)
                })?
        };

        let resettable = self.flags.contains(CommandPoolFlags::RESET_COMMAND_BUFFER);
        Ok(command_buffers
            .into_iter()
            .map(|command_buffer| {
                Box::new(VulkanCommandBuffer {
                    ctx: Arc::clone(&self.ctx),
                    command_buffer,
                    level,
                    resettable,
                    is_recording: false,
                    in_render_pass: false,
                    bound_pipeline_layout: None,
                }) as Box<dyn CommandBuffer>
            })
            .collect())
    }

    fn reset(&mut self) -> Result<()> {
        unsafe {
            self.ctx
                .device
                .reset_command_pool(self.command_pool, vk::CommandPoolResetFlags::empty())
                .map_err(|e| engine_err!("strata::vulkan", "Failed to reset command pool: {:?}", e))
        }
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl Drop for VulkanCommandPool {
    fn drop(&mut self) {
        self.destroy();
    }
}

/// Vulkan command buffer, primary or secondary
///
/// Freed together with its pool; dropping it alone does nothing.
pub struct VulkanCommandBuffer {
    ctx: Arc<GpuContext>,
    command_buffer: vk::CommandBuffer,
    level: CommandBufferLevel,
    resettable: bool,
    is_recording: bool,
    /// Primary inside a render pass, or secondary continuing one
    in_render_pass: bool,
    /// Currently bound pipeline layout (for push constants)
    bound_pipeline_layout: Option<vk::PipelineLayout>,
}

impl VulkanCommandBuffer {
    /// Get the underlying Vulkan command buffer
    pub fn command_buffer(&self) -> vk::CommandBuffer {
        self.command_buffer
    }

    fn require_recording(&self) -> Result<()> {
        if !self.is_recording {
            return Err(Error::BackendError("Command buffer not recording".to_string()));
        }
        Ok(())
    }

    fn require_render_pass(&self) -> Result<()> {
        self.require_recording()?;
        if !self.in_render_pass {
            return Err(Error::BackendError("Command buffer not inside a render pass".to_string()));
        }
        Ok(())
    }
}

fn downcast_render_pass(render_pass: &Arc<dyn RenderPass>) -> Result<vk::RenderPass> {
    render_pass
        .as_any()
        .downcast_ref::<VulkanRenderPass>()
        .map(|rp| rp.render_pass)
        .ok_or_else(|| engine_err!("strata::vulkan", "Render pass was not created by the Vulkan backend"))
}

fn downcast_framebuffer(framebuffer: &Arc<dyn Framebuffer>) -> Result<vk::Framebuffer> {
    framebuffer
        .as_any()
        .downcast_ref::<VulkanFramebuffer>()
        .map(|fb| fb.framebuffer)
        .ok_or_else(|| engine_err!("strata::vulkan", "Framebuffer was not created by the Vulkan backend"))
}

impl CommandBuffer for VulkanCommandBuffer {
    fn handle(&self) -> CommandBufferHandle {
        CommandBufferHandle(self.command_buffer.as_raw())
    }

    fn level(&self) -> CommandBufferLevel {
        self.level
    }

    fn begin(&mut self, usage: CommandBufferUsage, inheritance: Option<&InheritanceInfo>) -> Result<()> {
        if self.is_recording {
            return Err(Error::BackendError("Command buffer already recording".to_string()));
        }

        let inheritance = match (self.level, inheritance) {
            (CommandBufferLevel::Secondary, None) => return Err(Error::MissingInheritance),
            (CommandBufferLevel::Secondary, Some(info)) => Some((
                downcast_render_pass(&info.render_pass)?,
                downcast_framebuffer(&info.framebuffer)?,
                info.subpass,
            )),
            (CommandBufferLevel::Primary, _) => None,
        };

        unsafe {
            if self.resettable {
                self.ctx
                    .device
                    .reset_command_buffer(self.command_buffer, vk::CommandBufferResetFlags::empty())
                    .map_err(|e| engine_err!("strata::vulkan", "Failed to reset command buffer: {:?}", e))?;
            }

            let inheritance_info = match inheritance {
                Some((render_pass, framebuffer, subpass)) => vk::CommandBufferInheritanceInfo::default()
                    .render_pass(render_pass)
                    .framebuffer(framebuffer)
                    .subpass(subpass),
                None => vk::CommandBufferInheritanceInfo::default(),
            };

            let mut begin_info = vk::CommandBufferBeginInfo::default()
                .flags(command_buffer_usage_to_vk(usage));
            if self.level == CommandBufferLevel::Secondary {
                begin_info = begin_info.inheritance_info(&inheritance_info);
            }

            self.ctx
                .device
                .begin_command_buffer(self.command_buffer, &begin_info)
                .map_err(|e| engine_err!("strata::vulkan", "Failed to begin command buffer: {:?}", e))?;
        }

        self.is_recording = true;
        self.in_render_pass = self.level == CommandBufferLevel::Secondary
            && usage.contains(CommandBufferUsage::RENDER_PASS_CONTINUE);
        self.bound_pipeline_layout = None;
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        self.require_recording()?;

        unsafe {
            self.ctx
                .device
                .end_command_buffer(self.command_buffer)
                .map_err(|e| engine_err!("strata::vulkan", "Failed to end command buffer: {:?}", e))?;
        }

        self.is_recording = false;
        self.in_render_pass = false;
        Ok(())
    }

    fn reset(&mut self) -> Result<()> {
        if !self.resettable {
            return Err(Error::InvalidState(
                "Command pool was not created with RESET_COMMAND_BUFFER".to_string(),
            ));
        }

        unsafe {
            self.ctx
                .device
                .reset_command_buffer(self.command_buffer, vk::CommandBufferResetFlags::empty())
                .map_err(|e| engine_err!("strata::vulkan", "Failed to reset command buffer: {:?}", e))?;
        }

        self.is_recording = false;
        self.in_render_pass = false;
        self.bound_pipeline_layout = None;
        Ok(())
    }

    fn begin_render_pass(
        &mut self,
        render_pass: &Arc<dyn RenderPass>,
        framebuffer: &Arc<dyn Framebuffer>,
        clear_values: &[ClearValue],
        contents: SubpassContents,
    ) -> Result<()> {
        self.require_recording()?;
        if self.level != CommandBufferLevel::Primary {
            return Err(Error::BackendError("Render passes begin in primary buffers only".to_string()));
        }
        if self.in_render_pass {
            return Err(Error::BackendError("Already inside a render pass".to_string()));
        }

        let (width, height) = framebuffer.extent();
        let vk_clear_values: Vec<vk::ClearValue> = clear_values.iter().map(clear_value_to_vk).collect();
        let begin_info = vk::RenderPassBeginInfo::default()
            .render_pass(downcast_render_pass(render_pass)?)
            .framebuffer(downcast_framebuffer(framebuffer)?)
            .render_area(rect_to_vk(Rect2D::from_extent(width, height)))
            .clear_values(&vk_clear_values);

        unsafe {
            self.ctx.device.cmd_begin_render_pass(
                self.command_buffer,
                &begin_info,
                subpass_contents_to_vk(contents),
            );
        }

        self.in_render_pass = true;
        Ok(())
    }

    fn end_render_pass(&mut self) -> Result<()> {
        self.require_render_pass()?;
        if self.level != CommandBufferLevel::Primary {
            return Err(Error::BackendError("Render passes end in primary buffers only".to_string()));
        }

        unsafe {
            self.ctx.device.cmd_end_render_pass(self.command_buffer);
        }

        self.in_render_pass = false;
        Ok(())
    }

    fn set_viewport(&mut self, viewport: Viewport) -> Result<()> {
        self.require_recording()?;
        unsafe {
            self.ctx
                .device
                .cmd_set_viewport(self.command_buffer, 0, &[viewport_to_vk(viewport)]);
        }
        Ok(())
    }

    fn set_scissor(&mut self, scissor: Rect2D) -> Result<()> {
        self.require_recording()?;
        unsafe {
            self.ctx
                .device
                .cmd_set_scissor(self.command_buffer, 0, &[rect_to_vk(scissor)]);
        }
        Ok(())
    }

    fn bind_pipeline(&mut self, pipeline: &Arc<dyn Pipeline>) -> Result<()> {
        self.require_recording()?;

        let vk_pipeline = pipeline
            .as_any()
            .downcast_ref::<VulkanPipeline>()
            .ok_or_else(|| engine_err!("strata::vulkan", "Pipeline was not created by the Vulkan backend"))?;

        unsafe {
            self.ctx.device.cmd_bind_pipeline(
                self.command_buffer,
                vk::PipelineBindPoint::GRAPHICS,
                vk_pipeline.pipeline,
            );
        }

        self.bound_pipeline_layout = Some(vk_pipeline.pipeline_layout);
        Ok(())
    }

    fn bind_vertex_buffer(&mut self, buffer: &Arc<dyn Buffer>, offset: u64) -> Result<()> {
        self.require_recording()?;
        let vk_buf = vk_buffer(buffer.as_ref())?;
        unsafe {
            self.ctx
                .device
                .cmd_bind_vertex_buffers(self.command_buffer, 0, &[vk_buf], &[offset]);
        }
        Ok(())
    }

    fn bind_index_buffer(&mut self, buffer: &Arc<dyn Buffer>, offset: u64) -> Result<()> {
        self.require_recording()?;
        let vk_buf = vk_buffer(buffer.as_ref())?;
        unsafe {
            self.ctx.device.cmd_bind_index_buffer(
                self.command_buffer,
                vk_buf,
                offset,
                vk::IndexType::UINT32,
            );
        }
        Ok(())
    }

    fn push_constants(&mut self, offset: u32, data: &[u8]) -> Result<()> {
        self.require_recording()?;

        let layout = self
            .bound_pipeline_layout
            .ok_or_else(|| Error::BackendError("No pipeline bound (required for push constants)".to_string()))?;

        unsafe {
            self.ctx.device.cmd_push_constants(
                self.command_buffer,
                layout,
                vk::ShaderStageFlags::VERTEX,
                offset,
                data,
            );
        }
        Ok(())
    }

    fn draw_indexed(&mut self, index_count: u32, first_index: u32, vertex_offset: i32) -> Result<()> {
        self.require_render_pass()?;
        unsafe {
            self.ctx.device.cmd_draw_indexed(
                self.command_buffer,
                index_count,
                1,
                first_index,
                vertex_offset,
                0,
            );
        }
        Ok(())
    }

    fn execute_commands(&mut self, secondaries: &[CommandBufferHandle]) -> Result<()> {
        self.require_render_pass()?;
        if self.level != CommandBufferLevel::Primary {
            return Err(Error::BackendError("Only primary buffers execute secondaries".to_string()));
        }
        if secondaries.is_empty() {
            return Ok(());
        }

        let vk_secondaries: Vec<vk::CommandBuffer> = secondaries
            .iter()
            .map(|handle| vk::CommandBuffer::from_raw(handle.0))
            .collect();

        unsafe {
            self.ctx
                .device
                .cmd_execute_commands(self.command_buffer, &vk_secondaries);
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
