//! Frame orchestrator: the render loop
//!
//! Per frame, on the main thread:
//!
//! 1. wait for the slot's fence (retrying on timeout), then reset it
//! 2. acquire a swapchain image (signals the acquire semaphore)
//! 3. begin the slot's primary buffer and a render pass with secondary contents
//! 4. fan out one recording job per object to the object's worker
//! 5. wait for the batch, collect secondary handles in (worker, object) order
//! 6. execute them into the primary, end the pass and the buffer
//! 7. submit (wait acquire, signal render, fence) and present (wait render)
//! 8. optionally drain the queue, advance the slot, pull new camera matrices
//!
//! Each worker owns one secondary recorder and its objects. Only jobs running on
//! that worker lock them, so the per-worker mutex is never contended.

use std::sync::{Arc, Mutex, PoisonError};
use crate::command_recorder::CommandRecorder;
use crate::config::EngineConfig;
use crate::device::{
    ClearValue, CommandBufferHandle, CommandBufferLevel, CommandPoolFlags, Display, Framebuffer,
    GraphicsDevice, InheritanceInfo, MeshBuffers, Pipeline, QueueHandle, Rect2D, RenderPass,
    SubmitInfo, SubpassContents, Viewport,
};
use crate::error::{Error, Result};
use crate::frame_sync::FrameSync;
use crate::scene::{CameraMatrices, DrawableObject, FrameInput, ObjectSpawner, PUSH_CONSTANT_SIZE};
use crate::thread_pool::ThreadPool;
use crate::{engine_debug, engine_error, engine_info, engine_trace, engine_warn};

const SOURCE: &str = "strata::FrameOrchestrator";

/// GPU collaborators created by the backend before the orchestrator starts
pub struct RenderBackend {
    pub device: Arc<dyn GraphicsDevice>,
    pub display: Box<dyn Display>,
    pub render_pass: Arc<dyn RenderPass>,
    pub pipeline: Arc<dyn Pipeline>,
    pub mesh: MeshBuffers,
}

/// Lifecycle of a [`FrameOrchestrator`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrchestratorState {
    NotInitialized,
    Running,
    /// Waiting for the GPU and destroying resources
    Draining,
    Deinitialized,
    /// A frame failed; only `deinitialize` is accepted
    Failed,
}

/// What one call to [`FrameOrchestrator::render_frame`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameStats {
    /// Frames rendered before this one
    pub frame_number: u64,
    /// Frame slot used
    pub slot: usize,
    /// Swapchain image rendered to
    pub image_index: u32,
    /// Secondary buffers executed into the primary
    pub secondary_count: usize,
    /// Fence wait attempts that timed out before the slot became free
    pub fence_timeouts: u32,
    /// Present reported a suboptimal swapchain
    pub suboptimal: bool,
}

/// Resources handed over by the backend, torn down in a fixed order
struct GpuResources {
    device: Arc<dyn GraphicsDevice>,
    queue: QueueHandle,
    display: Box<dyn Display>,
    render_pass: Arc<dyn RenderPass>,
    framebuffers: Vec<Arc<dyn Framebuffer>>,
    pipeline: Arc<dyn Pipeline>,
    mesh: MeshBuffers,
}

/// Secondary recorder and objects owned by one worker thread
struct WorkerState {
    recorder: CommandRecorder,
    objects: Vec<DrawableObject>,
}

/// Read-only frame data shared by every recording job of one frame
struct FrameContext {
    slot: usize,
    objects_per_worker: usize,
    inheritance: InheritanceInfo,
    pipeline: Arc<dyn Pipeline>,
    mesh: MeshBuffers,
    extent: (u32, u32),
    camera: CameraMatrices,
    failures: Mutex<Vec<Error>>,
}

impl FrameContext {
    fn report(&self, error: Error) {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(error);
    }

    fn first_failure(&self) -> Option<Error> {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .next()
    }
}

/// Records the secondary buffer of one object
struct RecordJob {
    worker_index: usize,
    object_index: usize,
    index_count: u32,
    context: Arc<FrameContext>,
}

impl RecordJob {
    fn run(self, worker: &Mutex<WorkerState>) {
        if let Err(e) = self.record(worker) {
            engine_error!(
                SOURCE,
                "Recording object {} on worker {} failed: {}",
                self.object_index,
                self.worker_index,
                e
            );
            self.context.report(e);
        }
    }

    fn record(&self, worker: &Mutex<WorkerState>) -> Result<()> {
        let mut state = worker
            .lock()
            .map_err(|_| Error::UnexpectedError(format!("worker {} state poisoned", self.worker_index)))?;
        let WorkerState { recorder, objects } = &mut *state;
        let ctx = &self.context;

        let object = &mut objects[self.object_index];
        object.update(ctx.camera.delta_seconds, &ctx.camera);

        let index = ctx.slot * ctx.objects_per_worker + self.object_index;
        recorder.begin_buffer(CommandBufferLevel::Secondary, Some(&ctx.inheritance), index)?;

        let (width, height) = ctx.extent;
        let cmd = recorder.recording_buffer(index)?;
        cmd.set_viewport(Viewport::from_extent(width, height))?;
        cmd.set_scissor(Rect2D::from_extent(width, height))?;
        // Hidden objects still get an (empty) secondary so the executed count stays fixed
        if object.visible {
            cmd.bind_pipeline(&ctx.pipeline)?;
            cmd.bind_vertex_buffer(&ctx.mesh.vertex_buffer, 0)?;
            cmd.bind_index_buffer(&ctx.mesh.index_buffer, 0)?;
            cmd.push_constants(0, object.push_constants().as_bytes())?;
            cmd.draw_indexed(self.index_count, 0, 0)?;
        }

        recorder.end_buffer(index)
    }
}

/// Owns the frame loop and every per-frame resource
pub struct FrameOrchestrator {
    state: OrchestratorState,
    config: EngineConfig,
    resources: Option<GpuResources>,
    pool: ThreadPool,
    workers: Vec<Arc<Mutex<WorkerState>>>,
    primary: CommandRecorder,
    frame_syncs: Vec<FrameSync>,
    frame_index: usize,
    frame_number: u64,
    camera: CameraMatrices,
}

impl FrameOrchestrator {
    /// Create an orchestrator; nothing is allocated until [`initialize`](Self::initialize)
    pub fn new(config: EngineConfig) -> Self {
        Self {
            state: OrchestratorState::NotInitialized,
            config,
            resources: None,
            pool: ThreadPool::new(),
            workers: Vec::new(),
            primary: CommandRecorder::new(),
            frame_syncs: Vec::new(),
            frame_index: 0,
            frame_number: 0,
            camera: CameraMatrices::default(),
        }
    }

    // ===== LIFECYCLE =====

    /// Take ownership of the backend objects and build the frame resources
    ///
    /// On failure every resource created so far is destroyed again.
    ///
    /// # Errors
    ///
    /// - `NoPrimaryDevice` if the device has no graphics + transfer queue family
    /// - `InvalidConfiguration` for zero counts in the config
    /// - `InitializationFailed` if the pipeline push-constant range has the wrong size
    pub fn initialize(&mut self, backend: RenderBackend) -> Result<()> {
        if self.state != OrchestratorState::NotInitialized {
            return Err(Error::InvalidState(format!("initialize called while {:?}", self.state)));
        }

        match self.build(backend) {
            Ok(()) => {
                self.state = OrchestratorState::Running;
                engine_info!(
                    SOURCE,
                    "Running with {} workers x {} objects, {} frames in flight",
                    self.config.worker_count,
                    self.config.objects_per_worker,
                    self.config.max_frames_in_flight
                );
                Ok(())
            }
            Err(e) => {
                engine_error!(SOURCE, "Initialization failed: {}", e);
                self.release_resources();
                self.state = OrchestratorState::Deinitialized;
                Err(e)
            }
        }
    }

    fn build(&mut self, backend: RenderBackend) -> Result<()> {
        self.config.validate()?;

        let RenderBackend { device, display, render_pass, pipeline, mesh } = backend;

        let queue_family = device.primary_queue_family().ok_or_else(|| {
            engine_error!(SOURCE, "No device exposes a graphics + transfer queue family");
            Error::NoPrimaryDevice
        })?;
        let queue = device.queue(0)?;

        if pipeline.push_constant_size() as usize != PUSH_CONSTANT_SIZE {
            return Err(Error::InitializationFailed(format!(
                "pipeline push constant range is {} bytes, expected {}",
                pipeline.push_constant_size(),
                PUSH_CONSTANT_SIZE
            )));
        }

        let resources = self.resources.insert(GpuResources {
            device,
            queue,
            display,
            render_pass,
            framebuffers: Vec::new(),
            pipeline,
            mesh,
        });
        resources.framebuffers = resources.display.create_framebuffers(&resources.render_pass)?;
        let device = Arc::clone(&resources.device);

        for _ in 0..self.config.max_frames_in_flight {
            self.frame_syncs.push(FrameSync::initialize(device.as_ref())?);
        }

        self.primary.initialize(
            device.as_ref(),
            CommandPoolFlags::RESET_COMMAND_BUFFER,
            queue_family,
            CommandBufferLevel::Primary,
            self.config.max_frames_in_flight,
            None,
        )?;

        self.pool.set_thread_count(self.config.worker_count)?;

        let mut spawner = ObjectSpawner::new(self.config.object_seed);
        for worker_index in 0..self.config.worker_count {
            let mut recorder = CommandRecorder::new();
            let result = recorder.initialize(
                device.as_ref(),
                CommandPoolFlags::RESET_COMMAND_BUFFER,
                queue_family,
                CommandBufferLevel::Secondary,
                self.config.secondary_buffers_per_worker(),
                None,
            );
            let objects = spawner.spawn_for_worker(worker_index, self.config.objects_per_worker);
            // Pushed even on failure so release_resources deinitializes it
            self.workers.push(Arc::new(Mutex::new(WorkerState { recorder, objects })));
            result?;
        }

        engine_debug!(
            SOURCE,
            "Created {} framebuffers, {} frame sync sets",
            self.resources.as_ref().map_or(0, |r| r.framebuffers.len()),
            self.frame_syncs.len()
        );
        Ok(())
    }

    /// Wait for the GPU, then destroy everything in reverse order of creation
    ///
    /// Order: pipeline, framebuffers, render pass, command recorders, frame sync
    /// objects, display, worker threads, mesh buffers, device. A second call is a
    /// no-op.
    pub fn deinitialize(&mut self) -> Result<()> {
        match self.state {
            OrchestratorState::Deinitialized => return Ok(()),
            OrchestratorState::Draining => {
                return Err(Error::InvalidState("deinitialize re-entered while draining".to_string()));
            }
            OrchestratorState::NotInitialized | OrchestratorState::Running | OrchestratorState::Failed => {}
        }

        self.state = OrchestratorState::Draining;
        let drained = match &self.resources {
            Some(resources) => resources.device.wait_idle(),
            None => Ok(()),
        };
        if let Err(e) = &drained {
            engine_error!(SOURCE, "Device wait idle failed during teardown: {}", e);
        }

        self.release_resources();
        self.state = OrchestratorState::Deinitialized;
        engine_info!(SOURCE, "Deinitialized after {} frames", self.frame_number);
        drained
    }

    fn release_resources(&mut self) {
        let Some(resources) = self.resources.take() else {
            self.pool.shutdown();
            return;
        };
        let GpuResources { device, queue: _, display, render_pass, mut framebuffers, pipeline, mesh } =
            resources;

        drop(pipeline);
        framebuffers.clear();
        drop(render_pass);

        for (index, worker) in self.workers.drain(..).enumerate() {
            let mut state = worker.lock().unwrap_or_else(PoisonError::into_inner);
            if let Err(e) = state.recorder.deinitialize(device.as_ref()) {
                engine_warn!(SOURCE, "Worker {} recorder teardown failed: {}", index, e);
            }
        }
        if let Err(e) = self.primary.deinitialize(device.as_ref()) {
            engine_warn!(SOURCE, "Primary recorder teardown failed: {}", e);
        }

        for sync in &mut self.frame_syncs {
            sync.deinitialize();
        }
        self.frame_syncs.clear();

        drop(display);
        self.pool.shutdown();
        drop(mesh);
        drop(device);
    }

    // ===== FRAME =====

    /// Render one frame
    ///
    /// Any error is fatal: the orchestrator moves to `Failed`, later frames are
    /// refused with `InvalidState`, and the caller is expected to deinitialize.
    /// A suboptimal present recreates the display at its current extent.
    pub fn render_frame(&mut self) -> Result<FrameStats> {
        if self.state != OrchestratorState::Running {
            return Err(Error::InvalidState(format!("render_frame called while {:?}", self.state)));
        }

        let result = self.record_and_present().and_then(|stats| {
            if stats.suboptimal {
                self.recreate_display()?;
            }
            Ok(stats)
        });
        if let Err(e) = &result {
            engine_error!(SOURCE, "Frame {} failed: {}", self.frame_number, e);
            self.state = OrchestratorState::Failed;
        }
        result
    }

    fn record_and_present(&mut self) -> Result<FrameStats> {
        let slot = self.frame_index;
        let objects_per_worker = self.config.objects_per_worker;
        let resources = self
            .resources
            .as_mut()
            .ok_or_else(|| Error::InvalidState("no GPU resources".to_string()))?;
        let sync = &self.frame_syncs[slot];

        // Slot k's buffers are only touched after its previous submission completed
        let fence_timeouts =
            sync.wait_for_fence(self.config.fence_timeout_ns, self.config.max_fence_timeouts)?;
        sync.reset_fence()?;

        let image_index = resources.display.acquire_next_image(sync.acquire_semaphore()?)?;
        let framebuffer = resources
            .framebuffers
            .get(image_index as usize)
            .cloned()
            .ok_or_else(|| {
                Error::UnexpectedError(format!(
                    "swapchain image {} has no framebuffer ({} available)",
                    image_index,
                    resources.framebuffers.len()
                ))
            })?;

        self.primary.begin_buffer(CommandBufferLevel::Primary, None, slot)?;
        self.primary.recording_buffer(slot)?.begin_render_pass(
            &resources.render_pass,
            &framebuffer,
            &[ClearValue::Color(self.config.clear_color)],
            SubpassContents::SecondaryCommandBuffers,
        )?;

        let context = Arc::new(FrameContext {
            slot,
            objects_per_worker,
            inheritance: InheritanceInfo {
                render_pass: Arc::clone(&resources.render_pass),
                framebuffer: Arc::clone(&framebuffer),
                subpass: 0,
            },
            pipeline: Arc::clone(&resources.pipeline),
            mesh: resources.mesh.clone(),
            extent: framebuffer.extent(),
            camera: self.camera,
            failures: Mutex::new(Vec::new()),
        });

        for (worker_index, worker) in self.workers.iter().enumerate() {
            for object_index in 0..objects_per_worker {
                let job = RecordJob {
                    worker_index,
                    object_index,
                    index_count: resources.mesh.index_count,
                    context: Arc::clone(&context),
                };
                let worker = Arc::clone(worker);
                self.pool.add_job_on(worker_index, move || job.run(&worker))?;
            }
        }

        // No submission before every recording job of the frame is done
        self.pool.wait()?;
        if let Some(error) = context.first_failure() {
            return Err(error);
        }
        drop(context);

        let secondaries = collect_secondaries(&self.workers, slot, objects_per_worker)?;

        {
            let cmd = self.primary.recording_buffer(slot)?;
            cmd.execute_commands(&secondaries)?;
            cmd.end_render_pass()?;
        }
        self.primary.end_buffer(slot)?;

        let command_buffers = [self.primary.handle(slot)];
        let wait_semaphores = [sync.acquire_semaphore()?];
        let signal_semaphores = [sync.render_semaphore()?];
        resources.device.submit(
            resources.queue,
            &SubmitInfo {
                command_buffers: &command_buffers,
                wait_semaphores: &wait_semaphores,
                signal_semaphores: &signal_semaphores,
                fence: Some(sync.fence()?),
            },
        )?;

        let suboptimal = resources
            .display
            .present(resources.queue, image_index, sync.render_semaphore()?)?;
        if suboptimal {
            engine_warn!(SOURCE, "Swapchain is suboptimal for the current surface, recreating");
        }

        if self.config.wait_queue_idle_after_present {
            resources.device.queue_wait_idle(resources.queue)?;
        }

        let stats = FrameStats {
            frame_number: self.frame_number,
            slot,
            image_index,
            secondary_count: secondaries.len(),
            fence_timeouts,
            suboptimal,
        };
        engine_trace!(SOURCE, "Frame {} done: {:?}", self.frame_number, stats);

        self.frame_index = (slot + 1) % self.config.max_frames_in_flight;
        self.frame_number += 1;
        Ok(stats)
    }

    /// Camera used by the next frame's object updates
    pub fn set_camera(&mut self, camera: CameraMatrices) {
        self.camera = camera;
    }

    fn recreate_display(&mut self) -> Result<()> {
        let (width, height) = self
            .resources
            .as_ref()
            .map(|r| r.display.extent())
            .ok_or_else(|| Error::InvalidState("no GPU resources".to_string()))?;
        self.resize(width, height)
    }

    /// Recreate the display and its framebuffers for a new window size
    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        if self.state != OrchestratorState::Running {
            return Err(Error::InvalidState(format!("resize called while {:?}", self.state)));
        }
        let resources = self
            .resources
            .as_mut()
            .ok_or_else(|| Error::InvalidState("no GPU resources".to_string()))?;

        resources.device.wait_idle()?;
        resources.framebuffers.clear();
        resources.display.recreate(width, height)?;
        resources.framebuffers = resources.display.create_framebuffers(&resources.render_pass)?;

        engine_info!(SOURCE, "Resized to {}x{}", width, height);
        Ok(())
    }

    /// Render until `input` reports the window closed, then deinitialize
    ///
    /// On a fatal frame error the orchestrator still tears down (best effort)
    /// before the error is returned. Returns the number of frames rendered.
    pub fn run(&mut self, input: &mut dyn FrameInput) -> Result<u64> {
        self.set_camera(input.camera());

        while !input.should_close() {
            input.poll();
            if input.should_close() {
                break;
            }

            if let Some((width, height)) = input.take_resize() {
                if let Err(e) = self.resize(width, height) {
                    let _ = self.deinitialize();
                    return Err(e);
                }
            }

            if let Err(e) = self.render_frame() {
                let _ = self.deinitialize();
                return Err(e);
            }
            self.set_camera(input.camera());
        }

        let frames = self.frame_number;
        self.deinitialize()?;
        Ok(frames)
    }

    // ===== ACCESSORS =====

    pub fn state(&self) -> OrchestratorState {
        self.state
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Slot the next frame will use
    pub fn frame_index(&self) -> usize {
        self.frame_index
    }

    /// Frames rendered so far
    pub fn frame_number(&self) -> u64 {
        self.frame_number
    }

    /// Snapshot of the objects owned by `worker_index`
    ///
    /// # Panics
    ///
    /// Panics if `worker_index` is out of range.
    pub fn objects(&self, worker_index: usize) -> Vec<DrawableObject> {
        let state = self.workers[worker_index]
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        state.objects.clone()
    }
}

impl Drop for FrameOrchestrator {
    fn drop(&mut self) {
        if matches!(self.state, OrchestratorState::Running | OrchestratorState::Failed) {
            engine_warn!(SOURCE, "Dropped while {:?}; deinitializing", self.state);
            let _ = self.deinitialize();
        }
    }
}

/// Secondary handles of `slot`, worker-major then object-minor
fn collect_secondaries(
    workers: &[Arc<Mutex<WorkerState>>],
    slot: usize,
    objects_per_worker: usize,
) -> Result<Vec<CommandBufferHandle>> {
    let mut handles = Vec::with_capacity(workers.len() * objects_per_worker);
    for (worker_index, worker) in workers.iter().enumerate() {
        let state = worker
            .lock()
            .map_err(|_| Error::UnexpectedError(format!("worker {} state poisoned", worker_index)))?;
        for object_index in 0..objects_per_worker {
            handles.push(state.recorder.handle(slot * objects_per_worker + object_index));
        }
    }
    Ok(handles)
}

#[cfg(test)]
#[path = "frame_orchestrator_tests.rs"]
mod tests;
