//! Unit tests for error.rs

use crate::error::{Error, Result};

#[test]
fn test_display_backend_error() {
    let error = Error::BackendError("vkQueueSubmit failed".to_string());
    assert_eq!(error.to_string(), "Backend error: vkQueueSubmit failed");
}

#[test]
fn test_display_presentation_unsupported() {
    let error = Error::PresentationUnsupportedForQueueFamily(2);
    assert_eq!(error.to_string(), "Presentation not supported for queue family 2");
}

#[test]
fn test_display_invalid_resource_path() {
    let error = Error::InvalidResourcePath("shaders/missing.spv".to_string());
    assert_eq!(error.to_string(), "Invalid resource path: shaders/missing.spv");
}

#[test]
fn test_display_job_panicked() {
    assert_eq!(Error::JobPanicked(3).to_string(), "3 job(s) panicked in the last batch");
}

#[test]
fn test_display_unit_variants() {
    assert_eq!(Error::NoPrimaryDevice.to_string(), "No primary graphics device available");
    assert_eq!(
        Error::MissingInheritance.to_string(),
        "Secondary command buffer requires inheritance info"
    );
}

#[test]
fn test_error_is_std_error() {
    let error: Box<dyn std::error::Error> = Box::new(Error::UnexpectedError("boom".to_string()));
    assert_eq!(error.to_string(), "Unexpected error: boom");
}

#[test]
fn test_question_mark_propagation() {
    fn inner() -> Result<u32> {
        Err(Error::InvalidState("not initialized".to_string()))
    }

    fn outer() -> Result<u32> {
        let value = inner()?;
        Ok(value + 1)
    }

    assert_eq!(outer(), Err(Error::InvalidState("not initialized".to_string())));
}
