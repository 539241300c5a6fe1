/// RenderPass and Framebuffer traits

use std::any::Any;

/// Render pass with a single color subpass
pub trait RenderPass: Send + Sync {
    /// Number of color attachments
    fn color_attachment_count(&self) -> u32;

    /// Downcast support for backends
    fn as_any(&self) -> &dyn Any;
}

/// Render target bound to one swapchain image
pub trait Framebuffer: Send + Sync {
    /// Extent (width, height)
    fn extent(&self) -> (u32, u32);

    /// Downcast support for backends
    fn as_any(&self) -> &dyn Any;
}
