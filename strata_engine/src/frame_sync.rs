//! Per-frame-slot synchronization objects
//!
//! One fence gates CPU reuse of the slot's command buffers; the acquire semaphore
//! orders rendering after image acquisition; the render semaphore orders
//! presentation after rendering.

use crate::device::{Fence, FenceStatus, GraphicsDevice, Semaphore};
use crate::error::{Error, Result};
use crate::{engine_bail, engine_trace, engine_warn};

/// Fence + acquire/render semaphores of one frame slot
pub struct FrameSync {
    fence: Option<Box<dyn Fence>>,
    acquire_semaphore: Option<Box<dyn Semaphore>>,
    render_semaphore: Option<Box<dyn Semaphore>>,
}

impl FrameSync {
    /// Create the fence signaled and both semaphores unsignaled
    ///
    /// The fence starts signaled so the first wait on a fresh slot returns at once.
    pub fn initialize(device: &dyn GraphicsDevice) -> Result<Self> {
        let fence = device.create_fence(true)?;
        let acquire_semaphore = device.create_semaphore()?;
        let render_semaphore = device.create_semaphore()?;

        Ok(Self {
            fence: Some(fence),
            acquire_semaphore: Some(acquire_semaphore),
            render_semaphore: Some(render_semaphore),
        })
    }

    /// Wait for the fence, retrying every `timeout_ns` until it signals
    ///
    /// Timeouts are expected under load and only logged, up to `max_timeouts`
    /// in a row. Past that the GPU is considered lost and an error is returned,
    /// as is any other wait failure. Returns the number of timeouts observed.
    pub fn wait_for_fence(&self, timeout_ns: u64, max_timeouts: u32) -> Result<u32> {
        let fence = self.fence()?;
        let mut timeouts = 0u32;
        loop {
            match fence.wait(timeout_ns)? {
                FenceStatus::Signaled => {
                    if timeouts > 0 {
                        engine_trace!("strata::FrameSync", "Fence signaled after {} timeouts", timeouts);
                    }
                    return Ok(timeouts);
                }
                FenceStatus::Timeout => {
                    timeouts += 1;
                    if timeouts >= max_timeouts {
                        engine_bail!(
                            "strata::FrameSync",
                            "Frame fence never signaled ({} waits of {} ns)",
                            timeouts,
                            timeout_ns
                        );
                    }
                    engine_warn!(
                        "strata::FrameSync",
                        "Frame fence wait timed out after {} ns (attempt {}), retrying",
                        timeout_ns,
                        timeouts
                    );
                }
            }
        }
    }

    /// Return the fence to unsignaled, right before it is handed to a submit
    pub fn reset_fence(&self) -> Result<()> {
        self.fence()?.reset()
    }

    pub fn fence(&self) -> Result<&dyn Fence> {
        self.fence.as_deref().ok_or_else(Self::released)
    }

    pub fn acquire_semaphore(&self) -> Result<&dyn Semaphore> {
        self.acquire_semaphore.as_deref().ok_or_else(Self::released)
    }

    pub fn render_semaphore(&self) -> Result<&dyn Semaphore> {
        self.render_semaphore.as_deref().ok_or_else(Self::released)
    }

    pub fn is_initialized(&self) -> bool {
        self.fence.is_some()
    }

    /// Destroy the fence and semaphores; later calls do nothing
    pub fn deinitialize(&mut self) {
        self.fence = None;
        self.acquire_semaphore = None;
        self.render_semaphore = None;
    }

    fn released() -> Error {
        Error::InvalidState("frame sync objects already destroyed".to_string())
    }
}

#[cfg(test)]
#[path = "frame_sync_tests.rs"]
mod tests;
