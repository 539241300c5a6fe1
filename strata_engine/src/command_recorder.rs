//! Command recorder: one command pool plus a fixed set of buffers
//!
//! A recorder is tagged primary or secondary and owns (or attaches to) exactly one
//! command pool. Buffers are addressed by index; an index outside the allocated
//! range is a programming error and panics.

use std::sync::{Arc, Mutex};
use crate::device::{
    CommandBuffer, CommandBufferHandle, CommandBufferLevel, CommandBufferUsage, CommandPool,
    CommandPoolFlags, GraphicsDevice, InheritanceInfo,
};
use crate::error::{Error, Result};
use crate::{engine_debug, engine_error, engine_warn};

/// Command pool shared between several recorders
pub type SharedCommandPool = Arc<Mutex<Box<dyn CommandPool>>>;

/// Lifecycle of a [`CommandRecorder`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    NotInitialized,
    Initialized,
    Deinitialized,
}

/// Recording state of one buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferState {
    /// Allocated or reset, nothing recorded
    Initial,
    /// Between begin and end
    Recording,
    /// Ended, ready to submit or execute
    Executable,
}

enum PoolOwnership {
    /// Destroyed by this recorder on deinitialize
    Private(Box<dyn CommandPool>),
    /// Owned by the caller; only detached on deinitialize
    Shared(SharedCommandPool),
}

/// Pool + buffers bound to one queue family
pub struct CommandRecorder {
    state: RecorderState,
    level: CommandBufferLevel,
    pool: Option<PoolOwnership>,
    buffers: Vec<Box<dyn CommandBuffer>>,
    buffer_states: Vec<BufferState>,
}

impl CommandRecorder {
    pub fn new() -> Self {
        Self {
            state: RecorderState::NotInitialized,
            level: CommandBufferLevel::Primary,
            pool: None,
            buffers: Vec::new(),
            buffer_states: Vec::new(),
        }
    }

    /// Create (or attach to) a command pool and allocate `buffer_count` buffers of `level`
    ///
    /// With `shared_pool` set, buffers are allocated from that pool and `pool_flags`
    /// is ignored.
    ///
    /// # Errors
    ///
    /// - `InvalidState` if the recorder was already initialized
    /// - `InvalidConfiguration` if `buffer_count` does not fit in a `u32`
    /// - backend errors from pool creation or allocation
    pub fn initialize(
        &mut self,
        device: &dyn GraphicsDevice,
        pool_flags: CommandPoolFlags,
        queue_family_index: u32,
        level: CommandBufferLevel,
        buffer_count: usize,
        shared_pool: Option<SharedCommandPool>,
    ) -> Result<()> {
        if self.state != RecorderState::NotInitialized {
            return Err(Error::InvalidState(format!(
                "initialize called on a {:?} command recorder",
                self.state
            )));
        }

        let count = u32::try_from(buffer_count).map_err(|_| {
            Error::InvalidConfiguration(format!(
                "command buffer count {} does not fit in u32",
                buffer_count
            ))
        })?;
        let (pool, buffers) = match shared_pool {
            Some(shared) => {
                let buffers = {
                    let mut pool = shared.lock().map_err(|_| {
                        Error::BackendError("Shared command pool lock poisoned".to_string())
                    })?;
                    pool.allocate_buffers(level, count)?
                };
                (PoolOwnership::Shared(shared), buffers)
            }
            None => {
                let mut pool = device.create_command_pool(pool_flags, queue_family_index)?;
                let buffers = pool.allocate_buffers(level, count)?;
                (PoolOwnership::Private(pool), buffers)
            }
        };

        if buffers.len() != buffer_count {
            engine_error!(
                "strata::CommandRecorder",
                "Pool returned {} buffers, {} requested",
                buffers.len(),
                buffer_count
            );
            return Err(Error::BackendError("Command buffer allocation came back short".to_string()));
        }

        self.level = level;
        self.buffer_states = vec![BufferState::Initial; buffers.len()];
        self.buffers = buffers;
        self.pool = Some(pool);
        self.state = RecorderState::Initialized;

        engine_debug!(
            "strata::CommandRecorder",
            "Allocated {} {:?} command buffers on queue family {}",
            buffer_count,
            level,
            queue_family_index
        );
        Ok(())
    }

    /// Open recording on buffer `index`
    ///
    /// Secondary buffers continue the render pass described by `inheritance`,
    /// which is mandatory for them.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    ///
    /// # Errors
    ///
    /// - `MissingInheritance` for a secondary buffer without inheritance info
    /// - `InvalidState` if not initialized, on level mismatch, or if already recording
    pub fn begin_buffer(
        &mut self,
        level: CommandBufferLevel,
        inheritance: Option<&InheritanceInfo>,
        index: usize,
    ) -> Result<()> {
        self.require_initialized("begin_buffer")?;
        self.check_index(index);

        if level != self.level {
            return Err(Error::InvalidState(format!(
                "{:?} begin requested on a {:?} recorder",
                level, self.level
            )));
        }
        if self.buffer_states[index] == BufferState::Recording {
            return Err(Error::InvalidState(format!("command buffer {} is already recording", index)));
        }

        let usage = match level {
            CommandBufferLevel::Primary => CommandBufferUsage::ONE_TIME_SUBMIT,
            CommandBufferLevel::Secondary => {
                if inheritance.is_none() {
                    return Err(Error::MissingInheritance);
                }
                CommandBufferUsage::RENDER_PASS_CONTINUE | CommandBufferUsage::ONE_TIME_SUBMIT
            }
        };

        self.buffers[index].begin(usage, inheritance)?;
        self.buffer_states[index] = BufferState::Recording;
        Ok(())
    }

    /// Close recording on buffer `index`
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn end_buffer(&mut self, index: usize) -> Result<()> {
        self.require_initialized("end_buffer")?;
        self.check_index(index);

        if self.buffer_states[index] != BufferState::Recording {
            return Err(Error::InvalidState(format!(
                "command buffer {} is not recording ({:?})",
                index, self.buffer_states[index]
            )));
        }

        self.buffers[index].end()?;
        self.buffer_states[index] = BufferState::Executable;
        Ok(())
    }

    /// Return buffer `index` to its initial state; no-op if it was never recorded
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn reset_buffer(&mut self, index: usize) -> Result<()> {
        self.require_initialized("reset_buffer")?;
        self.check_index(index);

        if self.buffer_states[index] == BufferState::Initial {
            return Ok(());
        }

        self.buffers[index].reset()?;
        self.buffer_states[index] = BufferState::Initial;
        Ok(())
    }

    /// Buffer `index`, for recording commands between begin and end
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn recording_buffer(&mut self, index: usize) -> Result<&mut dyn CommandBuffer> {
        self.check_index(index);
        if self.buffer_states[index] != BufferState::Recording {
            return Err(Error::InvalidState(format!("command buffer {} is not recording", index)));
        }
        Ok(self.buffers[index].as_mut())
    }

    /// Handle of buffer `index`
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn handle(&self, index: usize) -> CommandBufferHandle {
        self.check_index(index);
        self.buffers[index].handle()
    }

    /// Recording state of buffer `index`
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn buffer_state(&self, index: usize) -> BufferState {
        self.check_index(index);
        self.buffer_states[index]
    }

    pub fn state(&self) -> RecorderState {
        self.state
    }

    pub fn level(&self) -> CommandBufferLevel {
        self.level
    }

    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }

    /// Release the buffers and destroy the private pool (a shared pool is only detached)
    ///
    /// The caller must make sure no buffer of this recorder is still used by
    /// pending GPU work. A second call is a no-op and only logs a warning.
    pub fn deinitialize(&mut self, device: &dyn GraphicsDevice) -> Result<()> {
        match self.state {
            RecorderState::Deinitialized => {
                engine_warn!("strata::CommandRecorder", "deinitialize called twice; ignoring");
                return Ok(());
            }
            RecorderState::NotInitialized => {
                self.state = RecorderState::Deinitialized;
                return Ok(());
            }
            RecorderState::Initialized => {}
        }

        if let Some(index) = self.buffer_states.iter().position(|s| *s == BufferState::Recording) {
            engine_warn!(
                "strata::CommandRecorder",
                "Deinitializing while command buffer {} is still recording",
                index
            );
        }

        // Buffers first, then the pool that frees them
        self.buffers.clear();
        self.buffer_states.clear();
        self.state = RecorderState::Deinitialized;
        match self.pool.take() {
            Some(PoolOwnership::Private(pool)) => device.destroy_command_pool(pool),
            Some(PoolOwnership::Shared(_)) | None => Ok(()),
        }
    }

    fn check_index(&self, index: usize) {
        assert!(
            index < self.buffers.len(),
            "command buffer index {} out of range (recorder has {} buffers)",
            index,
            self.buffers.len()
        );
    }

    fn require_initialized(&self, operation: &str) -> Result<()> {
        if self.state != RecorderState::Initialized {
            return Err(Error::InvalidState(format!(
                "{} called on a {:?} command recorder",
                operation, self.state
            )));
        }
        Ok(())
    }
}

impl Default for CommandRecorder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "command_recorder_tests.rs"]
mod tests;
