//! Vulkan abstraction layer (Render Hardware Interface).
//!
//! Thin RAII wrappers over `ash`. Every wrapper holds an `Arc<Device>` and
//! destroys its handle on drop. It covers:
//! - Instance, physical device selection and logical device creation
//! - Swapchain negotiation and presentation
//! - Fences and semaphores
//! - Buffers, images, samplers and textures
//! - Render pass, framebuffers, descriptors, pipeline and shaders
//! - Command pools and command recording

mod error;

pub mod buffer;
pub mod command;
pub mod descriptor;
pub mod device;
pub mod image;
pub mod instance;
pub mod physical_device;
pub mod pipeline;
pub mod render_pass;
pub mod sampler;
pub mod shader;
pub mod swapchain;
pub mod sync;
pub mod texture;
pub mod vertex;

pub use error::{RhiError, RhiResult};

// Re-export ash types that users might need
pub use ash::vk;
