//! Hook for UI drawn on top of the scene.

use ash::vk;

/// Something drawn inside the scene's render pass after every mesh.
///
/// `new_frame` runs once per tick before any recording, after the slot's
/// fence has been waited on. `draw` records into the open render pass.
pub trait Overlay {
    fn new_frame(&mut self);

    fn draw(&mut self, command_buffer: vk::CommandBuffer);
}
