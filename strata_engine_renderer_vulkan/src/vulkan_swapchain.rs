/// Display - swapchain implementation of the Display trait
///
/// Owns the window surface, the swapchain and one image view per image.
/// Recreation on resize replaces the swapchain and views; framebuffers built
/// from the old views must be dropped by the caller first.

use ash::vk;
use ash::vk::Handle;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use std::sync::Arc;
use strata_engine::strata::{Error, Result};
use strata_engine::strata::device::{Display, Framebuffer, QueueHandle, RenderPass, Semaphore};
use strata_engine::{engine_debug, engine_err, engine_error, engine_info, engine_warn};

use crate::vulkan_context::GpuContext;
use crate::vulkan_convert::{choose_extent, choose_image_count, choose_present_mode, choose_surface_format};
use crate::vulkan_device::VulkanGraphicsDevice;
use crate::vulkan_render_pass::{VulkanFramebuffer, VulkanRenderPass};
use crate::vulkan_sync::vk_semaphore;

/// Window surface plus swapchain
pub struct VulkanDisplay {
    ctx: Arc<GpuContext>,
    surface: vk::SurfaceKHR,
    swapchain_loader: ash::khr::swapchain::Device,
    swapchain: vk::SwapchainKHR,
    image_views: Vec<vk::ImageView>,
    format: vk::SurfaceFormatKHR,
    extent: vk::Extent2D,
    present_mode: vk::PresentModeKHR,
}

impl VulkanDisplay {
    /// Create the surface for `window` and a swapchain of `width` x `height`
    ///
    /// Fails with `PresentationUnsupportedForQueueFamily` when the device's
    /// primary queue family cannot present to the surface.
    pub fn new<W: HasDisplayHandle + HasWindowHandle>(
        device: &VulkanGraphicsDevice,
        window: &W,
        width: u32,
        height: u32,
        vsync: bool,
    ) -> Result<Self> {
        let ctx = Arc::clone(device.context());

        let display_handle = window.display_handle().map_err(|e| {
            engine_error!("strata::vulkan", "Failed to get display handle: {}", e);
            Error::InitializationFailed(format!("Failed to get display handle: {}", e))
        })?;
        let window_handle = window.window_handle().map_err(|e| {
            engine_error!("strata::vulkan", "Failed to get window handle: {}", e);
            Error::InitializationFailed(format!("Failed to get window handle: {}", e))
        })?;

        let surface = unsafe {
            ash_window::create_surface(
                &ctx.instance.entry,
                &ctx.instance.instance,
                display_handle.as_raw(),
                window_handle.as_raw(),
                None,
            )
            .map_err(|e| {
                engine_error!("strata::vulkan", "Failed to create surface: {:?}", e);
                Error::InitializationFailed(format!("Failed to create surface: {:?}", e))
            })?
        };

        let supported = unsafe {
            ctx.surface_loader
                .get_physical_device_surface_support(ctx.physical_device, ctx.queue_family, surface)
                .unwrap_or(false)
        };
        if !supported {
            unsafe {
                ctx.surface_loader.destroy_surface(surface, None);
            }
            engine_error!(
                "strata::vulkan",
                "Queue family {} cannot present to the window surface",
                ctx.queue_family
            );
            return Err(Error::PresentationUnsupportedForQueueFamily(ctx.queue_family));
        }

        let swapchain_loader = ash::khr::swapchain::Device::new(&ctx.instance.instance, &ctx.device);

        let (format, present_mode) = unsafe {
            let formats = ctx
                .surface_loader
                .get_physical_device_surface_formats(ctx.physical_device, surface)
                .unwrap_or_default();
            let modes = ctx
                .surface_loader
                .get_physical_device_surface_present_modes(ctx.physical_device, surface)
                .unwrap_or_default();
            (choose_surface_format(&formats), choose_present_mode(&modes, vsync))
        };

        // Drop destroys the surface if the swapchain cannot be built
        let mut display = Self {
            ctx,
            surface,
            swapchain_loader,
            swapchain: vk::SwapchainKHR::null(),
            image_views: Vec::new(),
            format,
            extent: vk::Extent2D { width, height },
            present_mode,
        };
        display.build_swapchain(width, height)?;

        engine_info!(
            "strata::vulkan",
            "Display ready: {}x{}, {} images, {:?}, {:?}",
            display.extent.width,
            display.extent.height,
            display.image_views.len(),
            display.format.format,
            display.present_mode
        );
        Ok(display)
    }

    /// Format of the swapchain images (render passes must match it)
    pub fn format(&self) -> vk::Format {
        self.format.format
    }

    /// Create a swapchain for the requested size, retiring the current one
    fn build_swapchain(&mut self, width: u32, height: u32) -> Result<()> {
        unsafe {
            let capabilities = self
                .ctx
                .surface_loader
                .get_physical_device_surface_capabilities(self.ctx.physical_device, self.surface)
                .map_err(|e| engine_err!("strata::vulkan", "Failed to get surface capabilities: {:?}", e))?;

            let extent = choose_extent(&capabilities, width, height);
            let image_count = choose_image_count(&capabilities);
            let old_swapchain = self.swapchain;

            let create_info = vk::SwapchainCreateInfoKHR::default()
                .surface(self.surface)
                .min_image_count(image_count)
                .image_format(self.format.format)
                .image_color_space(self.format.color_space)
                .image_extent(extent)
                .image_array_layers(1)
                .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
                .image_sharing_mode(vk::SharingMode::EXCLUSIVE)
                .pre_transform(capabilities.current_transform)
                .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
                .present_mode(self.present_mode)
                .clipped(true)
                .old_swapchain(old_swapchain);

            let swapchain = self
                .swapchain_loader
                .create_swapchain(&create_info, None)
                .map_err(|e| engine_err!("strata::vulkan", "Failed to create swapchain: {:?}", e))?;

            self.destroy_image_views();
            if old_swapchain != vk::SwapchainKHR::null() {
                self.swapchain_loader.destroy_swapchain(old_swapchain, None);
            }
            self.swapchain = swapchain;
            self.extent = extent;

            let images = self
                .swapchain_loader
                .get_swapchain_images(swapchain)
                .map_err(|e| engine_err!("strata::vulkan", "Failed to get swapchain images: {:?}", e))?;

            for image in images {
                let create_info = vk::ImageViewCreateInfo::default()
                    .image(image)
                    .view_type(vk::ImageViewType::TYPE_2D)
                    .format(self.format.format)
                    .components(vk::ComponentMapping {
                        r: vk::ComponentSwizzle::IDENTITY,
                        g: vk::ComponentSwizzle::IDENTITY,
                        b: vk::ComponentSwizzle::IDENTITY,
                        a: vk::ComponentSwizzle::IDENTITY,
                    })
                    .subresource_range(vk::ImageSubresourceRange {
                        aspect_mask: vk::ImageAspectFlags::COLOR,
                        base_mip_level: 0,
                        level_count: 1,
                        base_array_layer: 0,
                        layer_count: 1,
                    });
                let view = self
                    .ctx
                    .device
                    .create_image_view(&create_info, None)
                    .map_err(|e| engine_err!("strata::vulkan", "Failed to create swapchain image view: {:?}", e))?;
                self.image_views.push(view);
            }
        }
        Ok(())
    }

    fn destroy_image_views(&mut self) {
        for view in self.image_views.drain(..) {
            unsafe {
                self.ctx.device.destroy_image_view(view, None);
            }
        }
    }
}

impl Display for VulkanDisplay {
    fn acquire_next_image(&mut self, signal: &dyn Semaphore) -> Result<u32> {
        let semaphore = vk_semaphore(signal)?;
        unsafe {
            let (image_index, suboptimal) = self
                .swapchain_loader
                .acquire_next_image(self.swapchain, u64::MAX, semaphore, vk::Fence::null())
                .map_err(|e| {
                    if e == vk::Result::ERROR_OUT_OF_DATE_KHR {
                        engine_err!("strata::vulkan", "Swapchain out of date during acquire")
                    } else {
                        engine_err!("strata::vulkan", "Failed to acquire next swapchain image: {:?}", e)
                    }
                })?;
            if suboptimal {
                engine_debug!("strata::vulkan", "Acquired image {} from a suboptimal swapchain", image_index);
            }
            Ok(image_index)
        }
    }

    fn present(&mut self, queue: QueueHandle, image_index: u32, wait: &dyn Semaphore) -> Result<bool> {
        let wait_semaphores = [vk_semaphore(wait)?];
        let swapchains = [self.swapchain];
        let image_indices = [image_index];
        let present_info = vk::PresentInfoKHR::default()
            .wait_semaphores(&wait_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);

        match unsafe { self.swapchain_loader.queue_present(vk::Queue::from_raw(queue.0), &present_info) } {
            Ok(suboptimal) => Ok(suboptimal),
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => {
                engine_warn!("strata::vulkan", "Swapchain out of date during present");
                Ok(true)
            }
            Err(e) => Err(engine_err!("strata::vulkan", "Failed to present image {}: {:?}", image_index, e)),
        }
    }

    fn extent(&self) -> (u32, u32) {
        (self.extent.width, self.extent.height)
    }

    fn image_count(&self) -> u32 {
        self.image_views.len() as u32
    }

    fn recreate(&mut self, width: u32, height: u32) -> Result<()> {
        unsafe {
            self.ctx
                .device
                .device_wait_idle()
                .map_err(|e| engine_err!("strata::vulkan", "Failed to wait idle before swapchain recreation: {:?}", e))?;
        }
        self.build_swapchain(width, height)?;
        engine_info!(
            "strata::vulkan",
            "Swapchain recreated: {}x{}",
            self.extent.width,
            self.extent.height
        );
        Ok(())
    }

    fn create_framebuffers(&self, render_pass: &Arc<dyn RenderPass>) -> Result<Vec<Arc<dyn Framebuffer>>> {
        let vk_render_pass = render_pass
            .as_any()
            .downcast_ref::<VulkanRenderPass>()
            .ok_or_else(|| engine_err!("strata::vulkan", "Render pass was not created by the Vulkan backend"))?;

        self.image_views
            .iter()
            .map(|&view| {
                VulkanFramebuffer::new(Arc::clone(&self.ctx), vk_render_pass, view, self.extent)
                    .map(|fb| Arc::new(fb) as Arc<dyn Framebuffer>)
            })
            .collect()
    }
}

impl Drop for VulkanDisplay {
    fn drop(&mut self) {
        self.destroy_image_views();
        unsafe {
            if self.swapchain != vk::SwapchainKHR::null() {
                self.swapchain_loader.destroy_swapchain(self.swapchain, None);
            }
            self.ctx.surface_loader.destroy_surface(self.surface, None);
        }
    }
}
