/// Pipeline - Vulkan graphics pipeline for the mesh vertex layout
///
/// Vertex input matches `Vertex` (position, normal, color; 36-byte stride),
/// viewport and scissor are dynamic, and one vertex-stage push-constant range
/// carries the per-object `PushConstantData`.

use ash::vk;
use std::any::Any;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use strata_engine::strata::{Error, Result};
use strata_engine::strata::device::Pipeline;
use strata_engine::strata::scene::{Vertex, PUSH_CONSTANT_SIZE};
use strata_engine::{engine_err, engine_error};

use crate::vulkan_context::GpuContext;
use crate::vulkan_render_pass::VulkanRenderPass;

/// Vulkan graphics pipeline and its layout
pub struct VulkanPipeline {
    ctx: Arc<GpuContext>,
    pub(crate) pipeline: vk::Pipeline,
    pub(crate) pipeline_layout: vk::PipelineLayout,
    push_constant_size: u32,
}

/// Shader module destroyed when it goes out of scope
struct ShaderModule<'a> {
    device: &'a ash::Device,
    module: vk::ShaderModule,
}

impl<'a> ShaderModule<'a> {
    fn load(device: &'a ash::Device, path: &Path) -> Result<Self> {
        let mut file = File::open(path).map_err(|e| {
            engine_error!("strata::vulkan", "Failed to open shader {}: {}", path.display(), e);
            Error::InvalidResourcePath(path.display().to_string())
        })?;
        let code = ash::util::read_spv(&mut file).map_err(|e| {
            engine_error!("strata::vulkan", "Shader {} is not valid SPIR-V: {}", path.display(), e);
            Error::InvalidResourcePath(path.display().to_string())
        })?;

        let create_info = vk::ShaderModuleCreateInfo::default().code(&code);
        let module = unsafe {
            device
                .create_shader_module(&create_info, None)
                .map_err(|e| engine_err!("strata::vulkan", "Failed to create shader module {}: {:?}", path.display(), e))?
        };

        Ok(Self { device, module })
    }
}

impl Drop for ShaderModule<'_> {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_shader_module(self.module, None);
        }
    }
}

pub(crate) fn vertex_bindings() -> [vk::VertexInputBindingDescription; 1] {
    [vk::VertexInputBindingDescription {
        binding: 0,
        stride: Vertex::STRIDE,
        input_rate: vk::VertexInputRate::VERTEX,
    }]
}

pub(crate) fn vertex_attributes() -> [vk::VertexInputAttributeDescription; 3] {
    let [position, normal, color] = Vertex::ATTRIBUTE_OFFSETS;
    [
        vk::VertexInputAttributeDescription {
            location: 0,
            binding: 0,
            format: vk::Format::R32G32B32_SFLOAT,
            offset: position,
        },
        vk::VertexInputAttributeDescription {
            location: 1,
            binding: 0,
            format: vk::Format::R32G32B32_SFLOAT,
            offset: normal,
        },
        vk::VertexInputAttributeDescription {
            location: 2,
            binding: 0,
            format: vk::Format::R32G32B32_SFLOAT,
            offset: color,
        },
    ]
}

impl VulkanPipeline {
    /// Build the pipeline from two SPIR-V files
    ///
    /// Missing or unreadable shader files fail with `InvalidResourcePath`.
    pub fn new(
        ctx: Arc<GpuContext>,
        render_pass: &VulkanRenderPass,
        vertex_shader_path: &Path,
        fragment_shader_path: &Path,
    ) -> Result<Self> {
        let device = &ctx.device;
        let vertex_shader = ShaderModule::load(device, vertex_shader_path)?;
        let fragment_shader = ShaderModule::load(device, fragment_shader_path)?;

        let push_constant_size = PUSH_CONSTANT_SIZE as u32;
        let push_constant_ranges = [vk::PushConstantRange {
            stage_flags: vk::ShaderStageFlags::VERTEX,
            offset: 0,
            size: push_constant_size,
        }];
        let layout_info = vk::PipelineLayoutCreateInfo::default()
            .push_constant_ranges(&push_constant_ranges);

        let pipeline_layout = unsafe {
            device
                .create_pipeline_layout(&layout_info, None)
                .map_err(|e| engine_err!("strata::vulkan", "Failed to create pipeline layout: {:?}", e))?
        };

        let shader_stages = [
            vk::PipelineShaderStageCreateInfo::default()
                .stage(vk::ShaderStageFlags::VERTEX)
                .module(vertex_shader.module)
                .name(c"main"),
            vk::PipelineShaderStageCreateInfo::default()
                .stage(vk::ShaderStageFlags::FRAGMENT)
                .module(fragment_shader.module)
                .name(c"main"),
        ];

        let bindings = vertex_bindings();
        let attributes = vertex_attributes();
        let vertex_input_state = vk::PipelineVertexInputStateCreateInfo::default()
            .vertex_binding_descriptions(&bindings)
            .vertex_attribute_descriptions(&attributes);

        let input_assembly_state = vk::PipelineInputAssemblyStateCreateInfo::default()
            .topology(vk::PrimitiveTopology::TRIANGLE_LIST)
            .primitive_restart_enable(false);

        // Counts only; the values are set per command buffer
        let viewport_state = vk::PipelineViewportStateCreateInfo::default()
            .viewport_count(1)
            .scissor_count(1);

        let rasterization_state = vk::PipelineRasterizationStateCreateInfo::default()
            .depth_clamp_enable(false)
            .rasterizer_discard_enable(false)
            .polygon_mode(vk::PolygonMode::FILL)
            .line_width(1.0)
            .cull_mode(vk::CullModeFlags::BACK)
            .front_face(vk::FrontFace::COUNTER_CLOCKWISE)
            .depth_bias_enable(false);

        let multisample_state = vk::PipelineMultisampleStateCreateInfo::default()
            .sample_shading_enable(false)
            .rasterization_samples(vk::SampleCountFlags::TYPE_1);

        let color_blend_attachments = [vk::PipelineColorBlendAttachmentState::default()
            .color_write_mask(vk::ColorComponentFlags::RGBA)
            .blend_enable(false)];
        let color_blend_state = vk::PipelineColorBlendStateCreateInfo::default()
            .logic_op_enable(false)
            .attachments(&color_blend_attachments);

        let dynamic_states = [vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR];
        let dynamic_state = vk::PipelineDynamicStateCreateInfo::default()
            .dynamic_states(&dynamic_states);

        let pipeline_info = vk::GraphicsPipelineCreateInfo::default()
            .stages(&shader_stages)
            .vertex_input_state(&vertex_input_state)
            .input_assembly_state(&input_assembly_state)
            .viewport_state(&viewport_state)
            .rasterization_state(&rasterization_state)
            .multisample_state(&multisample_state)
            .color_blend_state(&color_blend_state)
            .dynamic_state(&dynamic_state)
            .layout(pipeline_layout)
            .render_pass(render_pass.render_pass)
            .subpass(0);

        let pipelines = unsafe {
            device.create_graphics_pipelines(vk::PipelineCache::null(), &[pipeline_info], None)
        };
        let pipeline = match pipelines {
            Ok(pipelines) => pipelines[0],
            Err((_, e)) => {
                unsafe {
                    device.destroy_pipeline_layout(pipeline_layout, None);
                }
                return Err(engine_err!("strata::vulkan", "Failed to create graphics pipeline: {:?}", e));
            }
        };

        // Shader modules are no longer needed once the pipeline exists
        drop(vertex_shader);
        drop(fragment_shader);

        Ok(Self {
            ctx,
            pipeline,
            pipeline_layout,
            push_constant_size,
        })
    }
}

impl Pipeline for VulkanPipeline {
    fn push_constant_size(&self) -> u32 {
        self.push_constant_size
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for VulkanPipeline {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_pipeline(self.pipeline, None);
            self.ctx.device.destroy_pipeline_layout(self.pipeline_layout, None);
        }
    }
}

#[cfg(test)]
#[path = "vulkan_pipeline_tests.rs"]
mod tests;
