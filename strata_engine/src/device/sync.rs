/// Fence and Semaphore traits

use std::any::Any;
use crate::error::Result;

/// Outcome of a bounded fence wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FenceStatus {
    /// The fence was signaled before the timeout
    Signaled,
    /// The timeout elapsed first; the wait may be retried
    Timeout,
}

/// CPU-visible GPU completion signal
pub trait Fence: Send + Sync {
    /// Wait up to `timeout_ns` nanoseconds for the fence to signal
    ///
    /// A timeout is reported as `Ok(FenceStatus::Timeout)`, any other failure as `Err`.
    fn wait(&self, timeout_ns: u64) -> Result<FenceStatus>;

    /// Return the fence to the unsignaled state
    fn reset(&self) -> Result<()>;

    /// Downcast support for backends
    fn as_any(&self) -> &dyn Any;
}

/// GPU-side ordering signal between queue operations
pub trait Semaphore: Send + Sync {
    /// Downcast support for backends
    fn as_any(&self) -> &dyn Any;
}
