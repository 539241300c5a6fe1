//! Error types for the Strata engine
//!
//! Every fallible engine operation returns [`Result`]. Graphics API failures are
//! fatal for the frame that hit them; callers propagate them with `?` up to the
//! render loop, which tears down and exits.

use std::fmt;

/// Result type for Strata engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Strata engine errors
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Generic failure with no more specific category
    UnexpectedError(String),

    /// The selected queue family cannot present to the window surface
    PresentationUnsupportedForQueueFamily(u32),

    /// A shader or asset path does not exist or cannot be read
    InvalidResourcePath(String),

    /// Graphics API call failed (create, submit, present, ...)
    BackendError(String),

    /// A subsystem failed to initialize
    InitializationFailed(String),

    /// No physical device exposes a graphics + transfer queue family
    NoPrimaryDevice,

    /// Operation not allowed in the current lifecycle state
    InvalidState(String),

    /// Secondary command buffer begun without inheritance info
    MissingInheritance,

    /// Number of jobs that panicked during the last thread pool batch
    JobPanicked(usize),

    /// Configuration value out of range
    InvalidConfiguration(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnexpectedError(msg) => write!(f, "Unexpected error: {}", msg),
            Error::PresentationUnsupportedForQueueFamily(family) => {
                write!(f, "Presentation not supported for queue family {}", family)
            }
            Error::InvalidResourcePath(path) => write!(f, "Invalid resource path: {}", path),
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::NoPrimaryDevice => write!(f, "No primary graphics device available"),
            Error::InvalidState(msg) => write!(f, "Invalid state: {}", msg),
            Error::MissingInheritance => {
                write!(f, "Secondary command buffer requires inheritance info")
            }
            Error::JobPanicked(count) => write!(f, "{} job(s) panicked in the last batch", count),
            Error::InvalidConfiguration(msg) => write!(f, "Invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
