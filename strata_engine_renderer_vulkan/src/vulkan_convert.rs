/// Conversions between engine types and Vulkan types, plus swapchain choices
///
/// Everything here is pure so it can be tested without a GPU.

use ash::vk;
use std::ffi::CString;
use strata_engine::strata::{Error, Result};
use strata_engine::strata::device::{
    ClearValue, CommandBufferLevel, CommandBufferUsage, CommandPoolFlags, Rect2D,
    SubpassContents, Viewport,
};

// ===== COMMAND OBJECTS =====

pub(crate) fn command_pool_flags_to_vk(flags: CommandPoolFlags) -> vk::CommandPoolCreateFlags {
    let mut vk_flags = vk::CommandPoolCreateFlags::empty();
    if flags.contains(CommandPoolFlags::TRANSIENT) {
        vk_flags |= vk::CommandPoolCreateFlags::TRANSIENT;
    }
    if flags.contains(CommandPoolFlags::RESET_COMMAND_BUFFER) {
        vk_flags |= vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER;
    }
    vk_flags
}

pub(crate) fn command_buffer_level_to_vk(level: CommandBufferLevel) -> vk::CommandBufferLevel {
    match level {
        CommandBufferLevel::Primary => vk::CommandBufferLevel::PRIMARY,
        CommandBufferLevel::Secondary => vk::CommandBufferLevel::SECONDARY,
    }
}

pub(crate) fn command_buffer_usage_to_vk(usage: CommandBufferUsage) -> vk::CommandBufferUsageFlags {
    let mut vk_flags = vk::CommandBufferUsageFlags::empty();
    if usage.contains(CommandBufferUsage::ONE_TIME_SUBMIT) {
        vk_flags |= vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT;
    }
    if usage.contains(CommandBufferUsage::RENDER_PASS_CONTINUE) {
        vk_flags |= vk::CommandBufferUsageFlags::RENDER_PASS_CONTINUE;
    }
    if usage.contains(CommandBufferUsage::SIMULTANEOUS_USE) {
        vk_flags |= vk::CommandBufferUsageFlags::SIMULTANEOUS_USE;
    }
    vk_flags
}

pub(crate) fn subpass_contents_to_vk(contents: SubpassContents) -> vk::SubpassContents {
    match contents {
        SubpassContents::Inline => vk::SubpassContents::INLINE,
        SubpassContents::SecondaryCommandBuffers => vk::SubpassContents::SECONDARY_COMMAND_BUFFERS,
    }
}

pub(crate) fn clear_value_to_vk(value: &ClearValue) -> vk::ClearValue {
    match value {
        ClearValue::Color(color) => vk::ClearValue {
            color: vk::ClearColorValue { float32: *color },
        },
        ClearValue::DepthStencil { depth, stencil } => vk::ClearValue {
            depth_stencil: vk::ClearDepthStencilValue {
                depth: *depth,
                stencil: *stencil,
            },
        },
    }
}

pub(crate) fn viewport_to_vk(viewport: Viewport) -> vk::Viewport {
    vk::Viewport {
        x: viewport.x,
        y: viewport.y,
        width: viewport.width,
        height: viewport.height,
        min_depth: viewport.min_depth,
        max_depth: viewport.max_depth,
    }
}

pub(crate) fn rect_to_vk(rect: Rect2D) -> vk::Rect2D {
    vk::Rect2D {
        offset: vk::Offset2D { x: rect.x, y: rect.y },
        extent: vk::Extent2D { width: rect.width, height: rect.height },
    }
}

// ===== SWAPCHAIN CHOICES =====

/// Prefer B8G8R8A8_UNORM; a lone UNDEFINED entry means any format is accepted
pub(crate) fn choose_surface_format(formats: &[vk::SurfaceFormatKHR]) -> vk::SurfaceFormatKHR {
    let preferred = vk::SurfaceFormatKHR {
        format: vk::Format::B8G8R8A8_UNORM,
        color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
    };

    match formats {
        [] => preferred,
        [only] if only.format == vk::Format::UNDEFINED => preferred,
        _ => formats
            .iter()
            .copied()
            .find(|f| f.format == vk::Format::B8G8R8A8_UNORM)
            .unwrap_or(formats[0]),
    }
}

/// FIFO with vsync; otherwise IMMEDIATE, then MAILBOX, then FIFO
pub(crate) fn choose_present_mode(modes: &[vk::PresentModeKHR], vsync: bool) -> vk::PresentModeKHR {
    if vsync {
        return vk::PresentModeKHR::FIFO;
    }
    [vk::PresentModeKHR::IMMEDIATE, vk::PresentModeKHR::MAILBOX]
        .into_iter()
        .find(|mode| modes.contains(mode))
        .unwrap_or(vk::PresentModeKHR::FIFO)
}

/// One image more than the minimum, capped by the maximum (0 = unbounded)
pub(crate) fn choose_image_count(capabilities: &vk::SurfaceCapabilitiesKHR) -> u32 {
    let desired = capabilities.min_image_count + 1;
    if capabilities.max_image_count > 0 {
        desired.min(capabilities.max_image_count)
    } else {
        desired
    }
}

/// Surface extent, or the requested size clamped to the surface limits
pub(crate) fn choose_extent(capabilities: &vk::SurfaceCapabilitiesKHR, width: u32, height: u32) -> vk::Extent2D {
    if capabilities.current_extent.width != u32::MAX {
        return capabilities.current_extent;
    }
    vk::Extent2D {
        width: width.clamp(
            capabilities.min_image_extent.width,
            capabilities.max_image_extent.width,
        ),
        height: height.clamp(
            capabilities.min_image_extent.height,
            capabilities.max_image_extent.height,
        ),
    }
}

// ===== NAMES =====

/// Convert layer/extension names for the Vulkan create infos
pub(crate) fn to_cstrings(names: &[String]) -> Result<Vec<CString>> {
    names
        .iter()
        .map(|name| {
            CString::new(name.as_str()).map_err(|_| {
                Error::InitializationFailed(format!("Name contains a NUL byte: {:?}", name))
            })
        })
        .collect()
}

/// Split `wanted` into the names present in `available` and the missing ones
pub(crate) fn partition_available(wanted: &[String], available: &[String]) -> (Vec<String>, Vec<String>) {
    wanted
        .iter()
        .cloned()
        .partition(|name| available.iter().any(|a| a == name))
}

#[cfg(test)]
#[path = "vulkan_convert_tests.rs"]
mod tests;
