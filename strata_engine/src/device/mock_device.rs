/// Mock graphics device for unit tests (no GPU required)
///
/// Every mock object shares one [`MockShared`] and appends what it does to an
/// ordered event log, so tests can assert call order across the whole frame.
/// Fence waits can be scripted to time out or fail. Unscripted waits follow the
/// fence state: signaled at creation when asked, by a successful submit, and
/// cleared by a reset. An unsignaled fence times out on every wait.

use std::any::Any;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use crate::device::{
    Buffer, BufferUsage, ClearValue, CommandBuffer, CommandBufferHandle, CommandBufferLevel,
    CommandBufferUsage, CommandPool, CommandPoolFlags, Display, Fence, FenceStatus, Framebuffer,
    GraphicsDevice, InheritanceInfo, Pipeline, QueueHandle, Rect2D, RenderPass, Semaphore,
    SubmitInfo, SubpassContents, Viewport,
};
use crate::error::{Error, Result};

// ============================================================================
// Event log
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum MockEvent {
    CreatePool { pool: u64, flags: CommandPoolFlags, queue_family: u32 },
    Allocate { pool: u64, level: CommandBufferLevel, handles: Vec<CommandBufferHandle> },
    CreateFence { fence: u64, signaled: bool },
    CreateSemaphore { semaphore: u64 },
    FenceWait { fence: u64, status: FenceStatus },
    FenceReset { fence: u64 },
    Acquire { image_index: u32, semaphore: u64 },
    Begin { buffer: CommandBufferHandle, level: CommandBufferLevel, inherited: bool },
    End { buffer: CommandBufferHandle },
    Reset { buffer: CommandBufferHandle },
    BeginRenderPass { buffer: CommandBufferHandle, contents: SubpassContents },
    EndRenderPass { buffer: CommandBufferHandle },
    PushConstants { buffer: CommandBufferHandle, data: Vec<u8> },
    DrawIndexed { buffer: CommandBufferHandle, index_count: u32 },
    Execute { buffer: CommandBufferHandle, secondaries: Vec<CommandBufferHandle> },
    Submit {
        command_buffers: Vec<CommandBufferHandle>,
        wait_semaphores: Vec<u64>,
        signal_semaphores: Vec<u64>,
        fence: Option<u64>,
    },
    Present { image_index: u32, wait_semaphore: u64 },
    QueueWaitIdle,
    DeviceWaitIdle,
    RecreateDisplay { width: u32, height: u32 },
    Destroy(String),
}

/// State shared by every mock object of one test
pub struct MockShared {
    events: Mutex<Vec<MockEvent>>,
    next_id: AtomicU64,
    fence_script: Mutex<VecDeque<Result<FenceStatus>>>,
    fail_submit: AtomicBool,
    suboptimal_present: AtomicBool,
}

impl MockShared {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            events: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            fence_script: Mutex::new(VecDeque::new()),
            fail_submit: AtomicBool::new(false),
            suboptimal_present: AtomicBool::new(false),
        })
    }

    pub fn record(&self, event: MockEvent) {
        self.events.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<MockEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn clear_events(&self) {
        self.events.lock().unwrap().clear();
    }

    /// Results returned, in order, by the next fence waits (then the fence state)
    pub fn script_fence_waits(&self, results: Vec<Result<FenceStatus>>) {
        self.fence_script.lock().unwrap().extend(results);
    }

    pub fn fail_next_submit(&self) {
        self.fail_submit.store(true, Ordering::SeqCst);
    }

    /// Report the next present as suboptimal
    pub fn suboptimal_next_present(&self) {
        self.suboptimal_present.store(true, Ordering::SeqCst);
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Destroy events, in order, without the surrounding frame traffic
    pub fn destroyed(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                MockEvent::Destroy(name) => Some(name),
                _ => None,
            })
            .collect()
    }
}

fn fence_id(fence: &dyn Fence) -> u64 {
    fence.as_any().downcast_ref::<MockFence>().map(|f| f.id).unwrap_or(0)
}

fn semaphore_id(semaphore: &dyn Semaphore) -> u64 {
    semaphore.as_any().downcast_ref::<MockSemaphore>().map(|s| s.id).unwrap_or(0)
}

// ============================================================================
// Mock Device
// ============================================================================

pub struct MockDevice {
    pub shared: Arc<MockShared>,
    pub queue_family: Option<u32>,
}

impl MockDevice {
    pub fn new(shared: Arc<MockShared>) -> Self {
        Self { shared, queue_family: Some(0) }
    }

    /// Device on which no queue family qualified as primary
    pub fn without_primary_queue(shared: Arc<MockShared>) -> Self {
        Self { shared, queue_family: None }
    }
}

impl GraphicsDevice for MockDevice {
    fn primary_queue_family(&self) -> Option<u32> {
        self.queue_family
    }

    fn queue(&self, index: u32) -> Result<QueueHandle> {
        Ok(QueueHandle(1000 + index as u64))
    }

    fn create_command_pool(
        &self,
        flags: CommandPoolFlags,
        queue_family_index: u32,
    ) -> Result<Box<dyn CommandPool>> {
        let id = self.shared.next_id();
        self.shared.record(MockEvent::CreatePool { pool: id, flags, queue_family: queue_family_index });
        Ok(Box::new(MockCommandPool {
            id,
            queue_family_index,
            shared: Arc::clone(&self.shared),
        }))
    }

    fn destroy_command_pool(&self, pool: Box<dyn CommandPool>) -> Result<()> {
        // MockCommandPool records its own Destroy event
        drop(pool);
        Ok(())
    }

    fn create_fence(&self, signaled: bool) -> Result<Box<dyn Fence>> {
        let id = self.shared.next_id();
        self.shared.record(MockEvent::CreateFence { fence: id, signaled });
        Ok(Box::new(MockFence {
            id,
            signaled: AtomicBool::new(signaled),
            shared: Arc::clone(&self.shared),
        }))
    }

    fn create_semaphore(&self) -> Result<Box<dyn Semaphore>> {
        let id = self.shared.next_id();
        self.shared.record(MockEvent::CreateSemaphore { semaphore: id });
        Ok(Box::new(MockSemaphore { id, shared: Arc::clone(&self.shared) }))
    }

    fn submit(&self, _queue: QueueHandle, info: &SubmitInfo<'_>) -> Result<()> {
        if self.shared.fail_submit.swap(false, Ordering::SeqCst) {
            return Err(Error::BackendError("mock submit failure".to_string()));
        }
        self.shared.record(MockEvent::Submit {
            command_buffers: info.command_buffers.to_vec(),
            wait_semaphores: info.wait_semaphores.iter().map(|s| semaphore_id(*s)).collect(),
            signal_semaphores: info.signal_semaphores.iter().map(|s| semaphore_id(*s)).collect(),
            fence: info.fence.map(fence_id),
        });
        if let Some(fence) = info.fence.and_then(|f| f.as_any().downcast_ref::<MockFence>()) {
            fence.signaled.store(true, Ordering::SeqCst);
        }
        Ok(())
    }

    fn queue_wait_idle(&self, _queue: QueueHandle) -> Result<()> {
        self.shared.record(MockEvent::QueueWaitIdle);
        Ok(())
    }

    fn wait_idle(&self) -> Result<()> {
        self.shared.record(MockEvent::DeviceWaitIdle);
        Ok(())
    }
}

impl Drop for MockDevice {
    fn drop(&mut self) {
        self.shared.record(MockEvent::Destroy("device".to_string()));
    }
}

// ============================================================================
// Mock CommandPool / CommandBuffer
// ============================================================================

pub struct MockCommandPool {
    pub id: u64,
    queue_family_index: u32,
    shared: Arc<MockShared>,
}

impl CommandPool for MockCommandPool {
    fn queue_family_index(&self) -> u32 {
        self.queue_family_index
    }

    fn allocate_buffers(
        &mut self,
        level: CommandBufferLevel,
        count: u32,
    ) -> Result<Vec<Box<dyn CommandBuffer>>> {
        let mut handles = Vec::with_capacity(count as usize);
        let mut buffers: Vec<Box<dyn CommandBuffer>> = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let handle = CommandBufferHandle(self.shared.next_id());
            handles.push(handle);
            buffers.push(Box::new(MockCommandBuffer::new(handle, level, Arc::clone(&self.shared))));
        }
        self.shared.record(MockEvent::Allocate { pool: self.id, level, handles });
        Ok(buffers)
    }

    fn reset(&mut self) -> Result<()> {
        Ok(())
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl Drop for MockCommandPool {
    fn drop(&mut self) {
        self.shared.record(MockEvent::Destroy(format!("pool#{}", self.id)));
    }
}

pub struct MockCommandBuffer {
    handle: CommandBufferHandle,
    level: CommandBufferLevel,
    shared: Arc<MockShared>,
    is_recording: bool,
    in_render_pass: bool,
}

impl MockCommandBuffer {
    pub fn new(handle: CommandBufferHandle, level: CommandBufferLevel, shared: Arc<MockShared>) -> Self {
        Self { handle, level, shared, is_recording: false, in_render_pass: false }
    }

    fn check_recording(&self) -> Result<()> {
        if !self.is_recording {
            return Err(Error::BackendError("Command buffer not recording".to_string()));
        }
        Ok(())
    }
}

impl CommandBuffer for MockCommandBuffer {
    fn handle(&self) -> CommandBufferHandle {
        self.handle
    }

    fn level(&self) -> CommandBufferLevel {
        self.level
    }

    fn begin(&mut self, _usage: CommandBufferUsage, inheritance: Option<&InheritanceInfo>) -> Result<()> {
        if self.is_recording {
            return Err(Error::BackendError("Command buffer already recording".to_string()));
        }
        if self.level == CommandBufferLevel::Secondary && inheritance.is_none() {
            return Err(Error::MissingInheritance);
        }
        self.is_recording = true;
        self.shared.record(MockEvent::Begin {
            buffer: self.handle,
            level: self.level,
            inherited: inheritance.is_some(),
        });
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        self.check_recording()?;
        if self.in_render_pass {
            return Err(Error::BackendError("Render pass not ended".to_string()));
        }
        self.is_recording = false;
        self.shared.record(MockEvent::End { buffer: self.handle });
        Ok(())
    }

    fn reset(&mut self) -> Result<()> {
        self.is_recording = false;
        self.in_render_pass = false;
        self.shared.record(MockEvent::Reset { buffer: self.handle });
        Ok(())
    }

    fn begin_render_pass(
        &mut self,
        _render_pass: &Arc<dyn RenderPass>,
        _framebuffer: &Arc<dyn Framebuffer>,
        _clear_values: &[ClearValue],
        contents: SubpassContents,
    ) -> Result<()> {
        self.check_recording()?;
        self.in_render_pass = true;
        self.shared.record(MockEvent::BeginRenderPass { buffer: self.handle, contents });
        Ok(())
    }

    fn end_render_pass(&mut self) -> Result<()> {
        self.check_recording()?;
        self.in_render_pass = false;
        self.shared.record(MockEvent::EndRenderPass { buffer: self.handle });
        Ok(())
    }

    fn set_viewport(&mut self, _viewport: Viewport) -> Result<()> {
        self.check_recording()
    }

    fn set_scissor(&mut self, _scissor: Rect2D) -> Result<()> {
        self.check_recording()
    }

    fn bind_pipeline(&mut self, _pipeline: &Arc<dyn Pipeline>) -> Result<()> {
        self.check_recording()
    }

    fn bind_vertex_buffer(&mut self, _buffer: &Arc<dyn Buffer>, _offset: u64) -> Result<()> {
        self.check_recording()
    }

    fn bind_index_buffer(&mut self, _buffer: &Arc<dyn Buffer>, _offset: u64) -> Result<()> {
        self.check_recording()
    }

    fn push_constants(&mut self, _offset: u32, data: &[u8]) -> Result<()> {
        self.check_recording()?;
        self.shared.record(MockEvent::PushConstants { buffer: self.handle, data: data.to_vec() });
        Ok(())
    }

    fn draw_indexed(&mut self, index_count: u32, _first_index: u32, _vertex_offset: i32) -> Result<()> {
        self.check_recording()?;
        self.shared.record(MockEvent::DrawIndexed { buffer: self.handle, index_count });
        Ok(())
    }

    fn execute_commands(&mut self, secondaries: &[CommandBufferHandle]) -> Result<()> {
        self.check_recording()?;
        self.shared.record(MockEvent::Execute { buffer: self.handle, secondaries: secondaries.to_vec() });
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Mock Fence / Semaphore
// ============================================================================

pub struct MockFence {
    pub id: u64,
    signaled: AtomicBool,
    shared: Arc<MockShared>,
}

impl MockFence {
    pub fn is_signaled(&self) -> bool {
        self.signaled.load(Ordering::SeqCst)
    }
}

impl Fence for MockFence {
    fn wait(&self, _timeout_ns: u64) -> Result<FenceStatus> {
        let scripted = self.shared.fence_script.lock().unwrap().pop_front();
        let status = match scripted {
            Some(result) => result?,
            None if self.is_signaled() => FenceStatus::Signaled,
            None => FenceStatus::Timeout,
        };
        self.shared.record(MockEvent::FenceWait { fence: self.id, status });
        Ok(status)
    }

    fn reset(&self) -> Result<()> {
        self.signaled.store(false, Ordering::SeqCst);
        self.shared.record(MockEvent::FenceReset { fence: self.id });
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for MockFence {
    fn drop(&mut self) {
        self.shared.record(MockEvent::Destroy(format!("fence#{}", self.id)));
    }
}

pub struct MockSemaphore {
    pub id: u64,
    shared: Arc<MockShared>,
}

impl Semaphore for MockSemaphore {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for MockSemaphore {
    fn drop(&mut self) {
        self.shared.record(MockEvent::Destroy(format!("semaphore#{}", self.id)));
    }
}

// ============================================================================
// Mock Display / RenderPass / Framebuffer / Pipeline / Buffer
// ============================================================================

pub struct MockDisplay {
    shared: Arc<MockShared>,
    width: u32,
    height: u32,
    image_count: u32,
    next_image: u32,
}

impl MockDisplay {
    pub fn new(shared: Arc<MockShared>, width: u32, height: u32, image_count: u32) -> Self {
        Self { shared, width, height, image_count, next_image: 0 }
    }
}

impl Display for MockDisplay {
    fn acquire_next_image(&mut self, signal: &dyn Semaphore) -> Result<u32> {
        let image_index = self.next_image;
        self.next_image = (self.next_image + 1) % self.image_count;
        self.shared.record(MockEvent::Acquire { image_index, semaphore: semaphore_id(signal) });
        Ok(image_index)
    }

    fn present(&mut self, _queue: QueueHandle, image_index: u32, wait: &dyn Semaphore) -> Result<bool> {
        self.shared.record(MockEvent::Present { image_index, wait_semaphore: semaphore_id(wait) });
        Ok(self.shared.suboptimal_present.swap(false, Ordering::SeqCst))
    }

    fn extent(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn image_count(&self) -> u32 {
        self.image_count
    }

    fn recreate(&mut self, width: u32, height: u32) -> Result<()> {
        self.width = width;
        self.height = height;
        self.next_image = 0;
        self.shared.record(MockEvent::RecreateDisplay { width, height });
        Ok(())
    }

    fn create_framebuffers(&self, _render_pass: &Arc<dyn RenderPass>) -> Result<Vec<Arc<dyn Framebuffer>>> {
        Ok((0..self.image_count)
            .map(|_| {
                Arc::new(MockFramebuffer {
                    extent: (self.width, self.height),
                    shared: Arc::clone(&self.shared),
                }) as Arc<dyn Framebuffer>
            })
            .collect())
    }
}

impl Drop for MockDisplay {
    fn drop(&mut self) {
        self.shared.record(MockEvent::Destroy("display".to_string()));
    }
}

pub struct MockRenderPass {
    pub shared: Arc<MockShared>,
}

impl RenderPass for MockRenderPass {
    fn color_attachment_count(&self) -> u32 {
        1
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for MockRenderPass {
    fn drop(&mut self) {
        self.shared.record(MockEvent::Destroy("render_pass".to_string()));
    }
}

pub struct MockFramebuffer {
    extent: (u32, u32),
    shared: Arc<MockShared>,
}

impl Framebuffer for MockFramebuffer {
    fn extent(&self) -> (u32, u32) {
        self.extent
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for MockFramebuffer {
    fn drop(&mut self) {
        self.shared.record(MockEvent::Destroy("framebuffer".to_string()));
    }
}

pub struct MockPipeline {
    pub shared: Arc<MockShared>,
    pub push_constant_size: u32,
}

impl Pipeline for MockPipeline {
    fn push_constant_size(&self) -> u32 {
        self.push_constant_size
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for MockPipeline {
    fn drop(&mut self) {
        self.shared.record(MockEvent::Destroy("pipeline".to_string()));
    }
}

pub struct MockBuffer {
    pub shared: Arc<MockShared>,
    pub size: u64,
    pub usage: BufferUsage,
}

impl Buffer for MockBuffer {
    fn size(&self) -> u64 {
        self.size
    }

    fn usage(&self) -> BufferUsage {
        self.usage
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for MockBuffer {
    fn drop(&mut self) {
        let name = match self.usage {
            BufferUsage::Vertex => "vertex_buffer",
            BufferUsage::Index => "index_buffer",
        };
        self.shared.record(MockEvent::Destroy(name.to_string()));
    }
}

#[cfg(test)]
#[path = "mock_device_tests.rs"]
mod tests;
