/// Pipeline trait - graphics pipeline with a push-constant range

use std::any::Any;

/// Graphics pipeline
pub trait Pipeline: Send + Sync {
    /// Size in bytes of the vertex-stage push-constant range
    fn push_constant_size(&self) -> u32;

    /// Downcast support for backends
    fn as_any(&self) -> &dyn Any;
}
