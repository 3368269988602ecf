//! Platform layer: winit window, Vulkan surface and keyboard state.
//!
//! The renderer only sees the window through [`FramebufferSource`], which
//! keeps it testable without a display.

mod framebuffer;
mod input;
mod window;

pub use framebuffer::{FramebufferSource, wait_for_nonzero_size};
pub use input::{InputState, KeyCode};
pub use window::{Surface, Window, get_required_extensions};

// Re-export winit types that users might need
pub use winit::event::WindowEvent;
pub use winit::event_loop::{ActiveEventLoop, EventLoop};
