/// Display trait - presentable images of the window surface

use std::sync::Arc;
use crate::error::Result;
use crate::device::{Framebuffer, QueueHandle, RenderPass, Semaphore};

/// Swapchain-backed presentation target
///
/// The display is recreated wholesale on resize; framebuffers created from it
/// must be rebuilt afterwards.
pub trait Display: Send {
    /// Acquire the next image, signaling `signal` once it is ready
    ///
    /// Returns the image index. No CPU wait happens here.
    fn acquire_next_image(&mut self, signal: &dyn Semaphore) -> Result<u32>;

    /// Present `image_index` on `queue` after `wait` is signaled
    ///
    /// Returns `true` when the swapchain is suboptimal and should be recreated.
    fn present(&mut self, queue: QueueHandle, image_index: u32, wait: &dyn Semaphore) -> Result<bool>;

    /// Current image extent (width, height)
    fn extent(&self) -> (u32, u32);

    /// Number of images in the swapchain
    fn image_count(&self) -> u32;

    /// Recreate the swapchain for a new window size
    fn recreate(&mut self, width: u32, height: u32) -> Result<()>;

    /// One framebuffer per swapchain image, compatible with `render_pass`
    fn create_framebuffers(&self, render_pass: &Arc<dyn RenderPass>) -> Result<Vec<Arc<dyn Framebuffer>>>;
}
