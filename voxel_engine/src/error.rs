//! Error types for the Voxel engine
//!
//! Every GPU failure that leaves the device context unusable surfaces as an
//! `Error`. Recoverable presentation states (out-of-date, suboptimal) are not
//! errors; they are reported through `SwapchainStatus`.

use std::fmt;

use crate::graphics_device::MemoryProperties;

/// Result type for Voxel engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Voxel engine errors
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Backend-specific error (Vulkan call failure, lost device, ...)
    BackendError(String),

    /// Out of GPU memory
    OutOfMemory,

    /// Invalid resource (buffer, pipeline, shader module, ...)
    InvalidResource(String),

    /// Initialization failed (instance, device, swapchain, subsystems)
    InitializationFailed(String),

    /// None of the candidate formats is supported by the device
    UnsupportedFormat(String),

    /// No memory type matches the requested filter and property flags
    NoCompatibleMemoryType {
        type_filter: u32,
        properties: MemoryProperties,
    },

    /// A bounded fence wait expired
    Timeout(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::UnsupportedFormat(msg) => write!(f, "Unsupported format: {}", msg),
            Error::NoCompatibleMemoryType { type_filter, properties } => write!(
                f,
                "No compatible memory type (filter: {:#b}, properties: {:?})",
                type_filter, properties
            ),
            Error::Timeout(msg) => write!(f, "Timed out: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
