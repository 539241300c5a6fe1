/// Camera matrices and the per-frame input source that produces them

use glam::Mat4;

/// View + projection for one frame, plus the time since the previous frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraMatrices {
    pub view: Mat4,
    pub projection: Mat4,
    /// Seconds elapsed since the previous frame
    pub delta_seconds: f32,
}

impl Default for CameraMatrices {
    fn default() -> Self {
        Self {
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            delta_seconds: 1.0 / 60.0,
        }
    }
}

impl CameraMatrices {
    /// `projection * view`, the part of the MVP shared by every object
    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }
}

/// Source of window events and camera matrices driving [`FrameOrchestrator::run`]
///
/// [`FrameOrchestrator::run`]: crate::frame_orchestrator::FrameOrchestrator::run
pub trait FrameInput {
    /// True once the window asked to close
    fn should_close(&self) -> bool;

    /// Pump pending window/input events
    fn poll(&mut self);

    /// Camera state to use for the next frame
    fn camera(&self) -> CameraMatrices;

    /// New framebuffer size, if the window was resized since the last call
    fn take_resize(&mut self) -> Option<(u32, u32)> {
        None
    }
}
