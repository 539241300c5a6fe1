/// GpuContext - Shared Vulkan state for every backend object
///
/// Contains everything needed for GPU operations:
/// - Instance (plus the debug messenger when validation is on)
/// - Physical device and the logical device created on it
/// - Allocator for buffer memory
/// - Primary queue family and the number of queues created in it

use ash::vk;
use gpu_allocator::vulkan::Allocator;
use std::mem::ManuallyDrop;
use std::sync::Mutex;

/// Vulkan instance with its loader and optional debug messenger
///
/// Destroys the messenger then the instance when dropped.
pub(crate) struct VulkanInstance {
    pub entry: ash::Entry,
    pub instance: ash::Instance,
    pub debug_utils_loader: Option<ash::ext::debug_utils::Instance>,
    pub debug_messenger: Option<vk::DebugUtilsMessengerEXT>,
}

impl Drop for VulkanInstance {
    fn drop(&mut self) {
        unsafe {
            if let (Some(loader), Some(messenger)) =
                (&self.debug_utils_loader, self.debug_messenger.take())
            {
                loader.destroy_debug_utils_messenger(messenger, None);
            }
            self.instance.destroy_instance(None);
        }
    }
}

/// Shared GPU context for all Vulkan objects.
///
/// Shared through `Arc` by pools, fences, buffers, pipelines and the display.
/// Dropping the last reference frees the allocator, destroys the logical device,
/// and then the instance.
pub struct GpuContext {
    /// Vulkan logical device
    pub device: ash::Device,

    /// GPU memory allocator, dropped before the device is destroyed
    pub allocator: ManuallyDrop<Mutex<Allocator>>,

    /// Physical device the logical device was created on
    pub physical_device: vk::PhysicalDevice,

    /// Queue family supporting graphics + transfer
    pub queue_family: u32,

    /// Queues created in `queue_family`
    pub queue_count: u32,

    pub(crate) surface_loader: ash::khr::surface::Instance,

    pub(crate) instance: VulkanInstance,
}

impl GpuContext {
    pub(crate) fn new(
        instance: VulkanInstance,
        physical_device: vk::PhysicalDevice,
        device: ash::Device,
        allocator: Allocator,
        queue_family: u32,
        queue_count: u32,
    ) -> Self {
        let surface_loader = ash::khr::surface::Instance::new(&instance.entry, &instance.instance);
        Self {
            device,
            allocator: ManuallyDrop::new(Mutex::new(allocator)),
            physical_device,
            queue_family,
            queue_count,
            surface_loader,
            instance,
        }
    }
}

impl Drop for GpuContext {
    fn drop(&mut self) {
        unsafe {
            // Idle before anything goes away; errors here cannot be reported
            self.device.device_wait_idle().ok();

            // Allocator releases its memory blocks through the device
            ManuallyDrop::drop(&mut self.allocator);

            self.device.destroy_device(None);
        }
        // `instance` is dropped after this body runs
    }
}
