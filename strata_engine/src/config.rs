//! Engine configuration
//!
//! [`EngineConfig`] is built once at startup (usually `EngineConfig::default()`
//! plus a few overrides) and handed to the orchestrator and the backend. Nothing
//! in the engine reads configuration from global state.

use std::path::PathBuf;
use std::thread;
use crate::error::{Error, Result};

/// Default fence wait slice before the orchestrator logs a timeout and retries
pub const DEFAULT_FENCE_TIMEOUT_NS: u64 = 100_000_000;

/// Default number of consecutive fence timeouts tolerated before a frame fails
pub const DEFAULT_MAX_FENCE_TIMEOUTS: u32 = 50;

/// Explicit configuration for one engine instance
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Application name reported to the graphics driver
    pub app_name: String,

    /// Initial window width in pixels
    pub window_width: u32,

    /// Initial window height in pixels
    pub window_height: u32,

    /// Vertical field of view used by the demo camera
    pub camera_fov_degrees: f32,

    /// Number of worker threads recording secondary command buffers
    pub worker_count: usize,

    /// Drawable objects owned by each worker
    pub objects_per_worker: usize,

    /// Frame slots cycled by the orchestrator
    pub max_frames_in_flight: usize,

    /// Timeout of a single fence wait attempt, in nanoseconds
    pub fence_timeout_ns: u64,

    /// Consecutive fence timeouts after which the frame is treated as lost
    pub max_fence_timeouts: u32,

    /// Drain the graphics queue after every present
    pub wait_queue_idle_after_present: bool,

    /// FIFO presentation when true, IMMEDIATE (or MAILBOX) otherwise
    pub vsync: bool,

    /// Enable the debug messenger (also requires the `vulkan-validation` feature)
    pub enable_validation: bool,

    /// Instance layers to enable when available
    pub wanted_layers: Vec<String>,

    /// Instance extensions on top of the ones the window surface needs
    pub wanted_instance_extensions: Vec<String>,

    /// Device extensions to enable
    pub wanted_device_extensions: Vec<String>,

    /// Clear color of the single color attachment (RGBA)
    pub clear_color: [f32; 4],

    /// Seed for object placement and animation jitter
    pub object_seed: u64,

    /// Directory holding the compiled SPIR-V shaders
    pub shader_directory: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let worker_count = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);

        Self {
            app_name: "Strata".to_string(),
            window_width: 1920,
            window_height: 1080,
            camera_fov_degrees: 90.0,
            worker_count,
            objects_per_worker: 1,
            max_frames_in_flight: 2,
            fence_timeout_ns: DEFAULT_FENCE_TIMEOUT_NS,
            max_fence_timeouts: DEFAULT_MAX_FENCE_TIMEOUTS,
            wait_queue_idle_after_present: true,
            vsync: false,
            enable_validation: cfg!(debug_assertions),
            wanted_layers: vec!["VK_LAYER_KHRONOS_validation".to_string()],
            wanted_instance_extensions: Vec::new(),
            wanted_device_extensions: vec!["VK_KHR_swapchain".to_string()],
            clear_color: [0.25, 0.25, 0.25, 1.0],
            object_seed: 0x5712_a7a0,
            shader_directory: PathBuf::from("shaders"),
        }
    }
}

impl EngineConfig {
    /// Check that every count the orchestrator sizes arrays with is non-zero
    pub fn validate(&self) -> Result<()> {
        if self.worker_count == 0 {
            return Err(Error::InvalidConfiguration("worker_count must be at least 1".to_string()));
        }
        if self.objects_per_worker == 0 {
            return Err(Error::InvalidConfiguration(
                "objects_per_worker must be at least 1".to_string(),
            ));
        }
        if self.max_frames_in_flight == 0 {
            return Err(Error::InvalidConfiguration(
                "max_frames_in_flight must be at least 1".to_string(),
            ));
        }
        if self.window_width == 0 || self.window_height == 0 {
            return Err(Error::InvalidConfiguration(format!(
                "window size {}x{} is empty",
                self.window_width, self.window_height
            )));
        }
        if self.fence_timeout_ns == 0 {
            return Err(Error::InvalidConfiguration("fence_timeout_ns must be non-zero".to_string()));
        }
        if self.max_fence_timeouts == 0 {
            return Err(Error::InvalidConfiguration(
                "max_fence_timeouts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Total number of drawable objects across all workers
    pub fn total_objects(&self) -> usize {
        self.worker_count * self.objects_per_worker
    }

    /// Secondary buffers each worker allocates (one per object per frame slot)
    pub fn secondary_buffers_per_worker(&self) -> usize {
        self.objects_per_worker * self.max_frames_in_flight
    }

    /// Path of a compiled shader inside `shader_directory`
    pub fn shader_path(&self, file_name: &str) -> PathBuf {
        self.shader_directory.join(file_name)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
