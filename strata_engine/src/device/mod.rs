/// Device module - traits the core uses to talk to the GPU backend

// Module declarations
pub mod graphics_device;
pub mod command_pool;
pub mod command_buffer;
pub mod sync;
pub mod display;
pub mod render_pass;
pub mod pipeline;
pub mod buffer;

// Re-export everything from graphics_device.rs
pub use graphics_device::*;

// Re-export from other modules
pub use command_pool::*;
pub use command_buffer::*;
pub use sync::*;
pub use display::*;
pub use render_pass::*;
pub use pipeline::*;
pub use buffer::*;

// Mock graphics device for tests (no GPU required)
#[cfg(test)]
pub mod mock_device;
