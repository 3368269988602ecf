//! What the frame loop needs to know about the window.

use tracing::debug;

/// Drawable size, event waiting and a consume-once resize flag.
pub trait FramebufferSource {
    /// Current drawable size in pixels. `(0, 0)` while minimized.
    fn framebuffer_size(&self) -> (u32, u32);

    /// Blocks until the windowing system may have something new to report.
    fn wait_events(&mut self);

    /// Returns whether a resize was reported since the last call, and clears it.
    fn take_resized(&mut self) -> bool;
}

/// Blocks in [`FramebufferSource::wait_events`] until both dimensions are
/// non-zero, then returns the size.
pub fn wait_for_nonzero_size(source: &mut dyn FramebufferSource) -> (u32, u32) {
    let mut size = source.framebuffer_size();
    if size.0 == 0 || size.1 == 0 {
        debug!("Framebuffer is {}x{}, waiting for a drawable size", size.0, size.1);
    }
    while size.0 == 0 || size.1 == 0 {
        source.wait_events();
        size = source.framebuffer_size();
    }
    size
}
