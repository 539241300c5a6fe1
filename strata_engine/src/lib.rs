/*!
# Strata Engine

Core types for the Strata real-time renderer.

This crate holds the platform-agnostic part of the engine: the frame orchestrator,
the worker thread pool that records secondary command buffers in parallel, the
command recorder abstraction, per-frame synchronization, and the per-object
transform updater that produces push constants.

GPU access goes through the trait seam in [`device`](strata::device). The Vulkan
implementation lives in the `strata_engine_renderer_vulkan` crate.

## Architecture

- **ThreadPool**: persistent workers, one job queue per worker, batch `wait()`
- **CommandRecorder**: one command pool + N primary or secondary buffers
- **FrameSync**: fence + acquire/render semaphores for one frame slot
- **DrawableObject**: per-object transform state and push-constant payload
- **FrameOrchestrator**: the render loop tying everything together
*/

// Internal modules
mod error;
mod engine;
mod config;
pub mod log;
pub mod device;
pub mod thread_pool;
pub mod command_recorder;
pub mod frame_sync;
pub mod scene;
pub mod frame_orchestrator;

// Main strata namespace module
pub mod strata {
    // Error types
    pub use crate::error::{Error, Result};

    // Logging facade
    pub use crate::engine::Engine;

    // Explicit engine configuration
    pub use crate::config::EngineConfig;

    // Core subsystems
    pub use crate::thread_pool::{ThreadPool, ThreadPoolState};
    pub use crate::command_recorder::{CommandRecorder, RecorderState, SharedCommandPool};
    pub use crate::frame_sync::FrameSync;
    pub use crate::frame_orchestrator::{
        FrameOrchestrator, FrameStats, OrchestratorState, RenderBackend,
    };

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
    }

    // GPU trait seam
    pub mod device {
        pub use crate::device::*;
    }

    // Objects, camera input
    pub mod scene {
        pub use crate::scene::*;
    }
}

// Re-export math library at crate root
pub use glam;
