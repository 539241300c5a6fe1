/// VulkanGraphicsDevice - instance, primary physical device and logical device
///
/// Creation follows the usual order: load the loader, create the instance with
/// the surface extensions plus the configured ones, attach the debug messenger
/// when validation is compiled in and requested, pick the first physical device
/// with a graphics + transfer queue family, then create the logical device with
/// every queue of that family.

use ash::vk;
use ash::vk::Handle;
use gpu_allocator::vulkan::{Allocator, AllocatorCreateDesc};
use raw_window_handle::HasDisplayHandle;
use std::ffi::{c_char, CStr};
use std::sync::Arc;
use strata_engine::strata::{EngineConfig, Error, Result};
use strata_engine::strata::device::{
    CommandPool, CommandPoolFlags, Fence, GraphicsDevice, QueueHandle, Semaphore, SubmitInfo,
};
use strata_engine::{engine_err, engine_error, engine_info, engine_warn};

use crate::vulkan_command::VulkanCommandPool;
use crate::vulkan_context::{GpuContext, VulkanInstance};
use crate::vulkan_convert::{partition_available, to_cstrings};
use crate::vulkan_sync::{vk_fence, vk_semaphore, VulkanFence, VulkanSemaphore};

/// Queue capabilities the primary device must expose in one family
pub(crate) const PRIMARY_QUEUE_FLAGS: vk::QueueFlags =
    vk::QueueFlags::from_raw(vk::QueueFlags::GRAPHICS.as_raw() | vk::QueueFlags::TRANSFER.as_raw());

/// First queue family supporting graphics + transfer, and its queue count
pub(crate) fn find_primary_queue_family(families: &[vk::QueueFamilyProperties]) -> Option<(u32, u32)> {
    families
        .iter()
        .enumerate()
        .find(|(_, family)| family.queue_count > 0 && family.queue_flags.contains(PRIMARY_QUEUE_FLAGS))
        .map(|(index, family)| (index as u32, family.queue_count))
}

/// Vulkan implementation of [`GraphicsDevice`]
pub struct VulkanGraphicsDevice {
    ctx: Arc<GpuContext>,
    device_name: String,
}

impl VulkanGraphicsDevice {
    /// Create the instance and the logical device on the primary physical device
    ///
    /// `display` only provides the platform surface extensions; the surface
    /// itself is created by [`VulkanDisplay`](crate::VulkanDisplay).
    pub fn new<W: HasDisplayHandle>(display: &W, config: &EngineConfig) -> Result<Self> {
        let instance = Self::create_instance(display, config)?;

        unsafe {
            let physical_devices = instance.instance.enumerate_physical_devices().map_err(|e| {
                engine_error!("strata::vulkan", "Failed to enumerate physical devices: {:?}", e);
                Error::InitializationFailed(format!("Failed to enumerate physical devices: {:?}", e))
            })?;

            // First device exposing a graphics + transfer family becomes the primary device
            let primary = physical_devices.into_iter().find_map(|physical_device| {
                let families = instance
                    .instance
                    .get_physical_device_queue_family_properties(physical_device);
                find_primary_queue_family(&families).map(|(family, count)| (physical_device, family, count))
            });
            let Some((physical_device, queue_family, queue_count)) = primary else {
                engine_error!("strata::vulkan", "No physical device exposes a graphics + transfer queue family");
                return Err(Error::NoPrimaryDevice);
            };

            let properties = instance.instance.get_physical_device_properties(physical_device);
            let device_name = CStr::from_ptr(properties.device_name.as_ptr())
                .to_string_lossy()
                .into_owned();

            let available_extensions: Vec<String> = instance
                .instance
                .enumerate_device_extension_properties(physical_device)
                .unwrap_or_default()
                .iter()
                .map(|ext| CStr::from_ptr(ext.extension_name.as_ptr()).to_string_lossy().into_owned())
                .collect();
            let (device_extensions, missing) =
                partition_available(&config.wanted_device_extensions, &available_extensions);
            if !missing.is_empty() {
                engine_error!("strata::vulkan", "Missing device extensions: {:?}", missing);
                return Err(Error::InitializationFailed(format!(
                    "Device {} lacks extensions {:?}",
                    device_name, missing
                )));
            }
            let device_extensions = to_cstrings(&device_extensions)?;
            let device_extension_ptrs: Vec<*const c_char> =
                device_extensions.iter().map(|name| name.as_ptr()).collect();

            let queue_priorities = vec![1.0_f32; queue_count as usize];
            let queue_create_infos = [vk::DeviceQueueCreateInfo::default()
                .queue_family_index(queue_family)
                .queue_priorities(&queue_priorities)];

            let device_create_info = vk::DeviceCreateInfo::default()
                .queue_create_infos(&queue_create_infos)
                .enabled_extension_names(&device_extension_ptrs);

            let device = instance
                .instance
                .create_device(physical_device, &device_create_info, None)
                .map_err(|e| {
                    engine_error!("strata::vulkan", "Failed to create logical device: {:?}", e);
                    Error::InitializationFailed(format!("Failed to create device: {:?}", e))
                })?;

            let allocator = match Allocator::new(&AllocatorCreateDesc {
                instance: instance.instance.clone(),
                device: device.clone(),
                physical_device,
                debug_settings: Default::default(),
                buffer_device_address: false,
                allocation_sizes: Default::default(),
            }) {
                Ok(allocator) => allocator,
                Err(e) => {
                    device.destroy_device(None);
                    engine_error!("strata::vulkan", "Failed to create GPU allocator: {:?}", e);
                    return Err(Error::InitializationFailed(format!("Failed to create allocator: {:?}", e)));
                }
            };

            engine_info!(
                "strata::vulkan",
                "Primary device: {} (queue family {}, {} queue(s))",
                device_name,
                queue_family,
                queue_count
            );

            let ctx = Arc::new(GpuContext::new(
                instance,
                physical_device,
                device,
                allocator,
                queue_family,
                queue_count,
            ));

            Ok(Self { ctx, device_name })
        }
    }

    fn create_instance<W: HasDisplayHandle>(display: &W, config: &EngineConfig) -> Result<VulkanInstance> {
        unsafe {
            let entry = ash::Entry::load().map_err(|e| {
                engine_error!("strata::vulkan", "Failed to load Vulkan library: {:?}", e);
                Error::InitializationFailed(format!("Failed to load Vulkan library: {:?}", e))
            })?;

            let app_name = to_cstrings(std::slice::from_ref(&config.app_name))?;
            let app_info = vk::ApplicationInfo::default()
                .application_name(&app_name[0])
                .application_version(vk::make_api_version(0, 1, 0, 0))
                .engine_name(c"Strata")
                .engine_version(vk::make_api_version(0, 0, 1, 0))
                .api_version(vk::API_VERSION_1_2);

            let display_handle = display.display_handle().map_err(|e| {
                engine_error!("strata::vulkan", "Failed to get display handle: {}", e);
                Error::InitializationFailed(format!("Failed to get display handle: {}", e))
            })?;
            let mut extension_ptrs: Vec<*const c_char> =
                ash_window::enumerate_required_extensions(display_handle.as_raw())
                    .map_err(|e| {
                        engine_error!("strata::vulkan", "Failed to get required extensions: {}", e);
                        Error::InitializationFailed(format!("Failed to get required extensions: {}", e))
                    })?
                    .to_vec();

            let extra_extensions = to_cstrings(&config.wanted_instance_extensions)?;
            extension_ptrs.extend(extra_extensions.iter().map(|name| name.as_ptr()));

            let validation = cfg!(feature = "vulkan-validation") && config.enable_validation;
            if validation {
                extension_ptrs.push(ash::ext::debug_utils::NAME.as_ptr());
            }

            // Layers the loader does not know are skipped with a warning
            let layers = if validation {
                let available: Vec<String> = entry
                    .enumerate_instance_layer_properties()
                    .unwrap_or_default()
                    .iter()
                    .map(|layer| CStr::from_ptr(layer.layer_name.as_ptr()).to_string_lossy().into_owned())
                    .collect();
                let (found, missing) = partition_available(&config.wanted_layers, &available);
                if !missing.is_empty() {
                    engine_warn!("strata::vulkan", "Instance layers not available: {:?}", missing);
                }
                to_cstrings(&found)?
            } else {
                Vec::new()
            };
            let layer_ptrs: Vec<*const c_char> = layers.iter().map(|name| name.as_ptr()).collect();

            let create_info = vk::InstanceCreateInfo::default()
                .application_info(&app_info)
                .enabled_layer_names(&layer_ptrs)
                .enabled_extension_names(&extension_ptrs);

            let instance = entry.create_instance(&create_info, None).map_err(|e| {
                engine_error!("strata::vulkan", "Failed to create Vulkan instance: {:?}", e);
                Error::InitializationFailed(format!("Failed to create instance: {:?}", e))
            })?;

            let mut vulkan_instance = VulkanInstance {
                entry,
                instance,
                debug_utils_loader: None,
                debug_messenger: None,
            };

            if validation {
                let debug_utils = ash::ext::debug_utils::Instance::new(&vulkan_instance.entry, &vulkan_instance.instance);
                crate::debug::reset_validation_tracking();

                let debug_info = vk::DebugUtilsMessengerCreateInfoEXT::default()
                    .message_severity(
                        vk::DebugUtilsMessageSeverityFlagsEXT::ERROR
                            | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING,
                    )
                    .message_type(
                        vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                            | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                            | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
                    )
                    .pfn_user_callback(Some(crate::debug::vulkan_debug_callback));

                let messenger = debug_utils
                    .create_debug_utils_messenger(&debug_info, None)
                    .map_err(|e| {
                        engine_error!("strata::vulkan", "Failed to create debug messenger: {:?}", e);
                        Error::InitializationFailed(format!("Failed to create debug messenger: {:?}", e))
                    })?;

                vulkan_instance.debug_utils_loader = Some(debug_utils);
                vulkan_instance.debug_messenger = Some(messenger);
            }

            Ok(vulkan_instance)
        }
    }

    /// Shared context, for creating backend objects
    pub fn context(&self) -> &Arc<GpuContext> {
        &self.ctx
    }

    /// Name reported by the physical device
    pub fn device_name(&self) -> &str {
        &self.device_name
    }
}

impl GraphicsDevice for VulkanGraphicsDevice {
    fn primary_queue_family(&self) -> Option<u32> {
        Some(self.ctx.queue_family)
    }

    fn queue(&self, index: u32) -> Result<QueueHandle> {
        if index >= self.ctx.queue_count {
            return Err(engine_err!(
                "strata::vulkan",
                "Queue index {} out of range (family {} has {} queue(s))",
                index,
                self.ctx.queue_family,
                self.ctx.queue_count
            ));
        }
        let queue = unsafe { self.ctx.device.get_device_queue(self.ctx.queue_family, index) };
        Ok(QueueHandle(queue.as_raw()))
    }

    fn create_command_pool(
        &self,
        flags: CommandPoolFlags,
        queue_family_index: u32,
    ) -> Result<Box<dyn CommandPool>> {
        Ok(Box::new(VulkanCommandPool::new(Arc::clone(&self.ctx), flags, queue_family_index)?))
    }

    fn destroy_command_pool(&self, mut pool: Box<dyn CommandPool>) -> Result<()> {
        let vulkan_pool = pool
            .as_any_mut()
            .downcast_mut::<VulkanCommandPool>()
            .ok_or_else(|| engine_err!("strata::vulkan", "Command pool was not created by the Vulkan backend"))?;
        vulkan_pool.destroy();
        Ok(())
    }

    fn create_fence(&self, signaled: bool) -> Result<Box<dyn Fence>> {
        Ok(Box::new(VulkanFence::new(Arc::clone(&self.ctx), signaled)?))
    }

    fn create_semaphore(&self) -> Result<Box<dyn Semaphore>> {
        Ok(Box::new(VulkanSemaphore::new(Arc::clone(&self.ctx))?))
    }

    fn submit(&self, queue: QueueHandle, info: &SubmitInfo<'_>) -> Result<()> {
        let command_buffers: Vec<vk::CommandBuffer> = info
            .command_buffers
            .iter()
            .map(|handle| vk::CommandBuffer::from_raw(handle.0))
            .collect();
        let wait_semaphores = info
            .wait_semaphores
            .iter()
            .map(|s| vk_semaphore(*s))
            .collect::<Result<Vec<_>>>()?;
        let wait_stages = vec![vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT; wait_semaphores.len()];
        let signal_semaphores = info
            .signal_semaphores
            .iter()
            .map(|s| vk_semaphore(*s))
            .collect::<Result<Vec<_>>>()?;
        let fence = match info.fence {
            Some(fence) => vk_fence(fence)?,
            None => vk::Fence::null(),
        };

        let submit_info = vk::SubmitInfo::default()
            .command_buffers(&command_buffers)
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .signal_semaphores(&signal_semaphores);

        unsafe {
            self.ctx
                .device
                .queue_submit(vk::Queue::from_raw(queue.0), &[submit_info], fence)
                .map_err(|e| engine_err!("strata::vulkan", "Failed to submit commands to GPU queue: {:?}", e))
        }
    }

    fn queue_wait_idle(&self, queue: QueueHandle) -> Result<()> {
        unsafe {
            self.ctx
                .device
                .queue_wait_idle(vk::Queue::from_raw(queue.0))
                .map_err(|e| engine_err!("strata::vulkan", "Failed to wait for queue idle: {:?}", e))
        }
    }

    fn wait_idle(&self) -> Result<()> {
        unsafe {
            self.ctx
                .device
                .device_wait_idle()
                .map_err(|e| engine_err!("strata::vulkan", "Failed to wait for device idle: {:?}", e))
        }
    }
}

#[cfg(test)]
#[path = "vulkan_device_tests.rs"]
mod tests;
