//! RHI-specific error types.

use thiserror::Error;

/// RHI-specific error type.
#[derive(Error, Debug)]
pub enum RhiError {
    /// Vulkan API error
    #[error("Vulkan error: {0}")]
    VulkanError(#[from] ash::vk::Result),

    /// Failed to load Vulkan library
    #[error("Failed to load Vulkan: {0}")]
    LoadingError(#[from] ash::LoadingError),

    /// GPU allocator error
    #[error("Allocator error: {0}")]
    AllocatorError(#[from] gpu_allocator::AllocationError),

    /// No suitable GPU found
    #[error("No suitable GPU found")]
    NoSuitableGpu,

    /// Shader module could not be loaded
    #[error("Shader error: {0}")]
    ShaderError(String),

    /// Surface creation or query error
    #[error("Surface error: {0}")]
    SurfaceError(String),

    /// Swapchain error
    #[error("Swapchain error: {0}")]
    SwapchainError(String),

    /// Invalid handle error
    #[error("Invalid handle: {0}")]
    InvalidHandle(String),

    /// Pipeline creation error
    #[error("Pipeline error: {0}")]
    PipelineError(String),

    /// No format or memory type satisfies the request
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Resource creation or mapping error
    #[error("Resource error: {0}")]
    Resource(String),
}

impl RhiError {
    /// The Vulkan result behind this error, `ERROR_UNKNOWN` for non-Vulkan
    /// failures.
    pub fn vk_result(&self) -> ash::vk::Result {
        match self {
            RhiError::VulkanError(result) => *result,
            _ => ash::vk::Result::ERROR_UNKNOWN,
        }
    }
}

/// Result type alias for RHI operations.
pub type RhiResult<T> = std::result::Result<T, RhiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vk_result() {
        let err = RhiError::from(ash::vk::Result::ERROR_DEVICE_LOST);
        assert_eq!(err.vk_result(), ash::vk::Result::ERROR_DEVICE_LOST);
        assert_eq!(
            RhiError::ShaderError("bad".to_string()).vk_result(),
            ash::vk::Result::ERROR_UNKNOWN
        );
    }
}
