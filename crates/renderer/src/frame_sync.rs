//! Per-slot synchronization for frames in flight.
//!
//! The frame sync set implements a "frames in flight" pattern where several
//! frames can be processed concurrently:
//!
//! 1. While the GPU renders the frame in slot N, the CPU prepares slot N+1
//! 2. Each slot has its own fence and semaphores to avoid contention
//! 3. The slot's fence keeps the CPU from touching resources still in use
//!
//! # Synchronization Flow
//!
//! ```text
//! 1. Wait on completion fence (CPU waits for previous use of this slot)
//! 2. Acquire swapchain image (signals image_acquired)
//! 3. Write uniforms and record commands
//! 4. Reset the completion fence and submit:
//!    - Wait on image_acquired
//!    - Signal render_complete
//!    - Signal the completion fence
//! 5. Present (waits on render_complete)
//! ```

use std::sync::Arc;

use ash::vk;
use inflight_rhi::device::Device;
use inflight_rhi::sync::SlotPrimitives;
use inflight_rhi::{RhiError, RhiResult};
use tracing::{debug, info};

use crate::frame_loop::{SlotSync, SubmitQueue};

/// Fence and semaphores for every frame slot.
///
/// # Thread Safety
///
/// Not meant to be shared; it should only be accessed from the thread that
/// drives the frame loop.
pub struct FrameSyncSet {
    device: Arc<Device>,
    slots: Vec<SlotPrimitives>,
}

impl FrameSyncSet {
    /// Creates `frames_in_flight` slots with signaled fences.
    ///
    /// # Errors
    ///
    /// Returns an error if `frames_in_flight` is zero or any object cannot be
    /// created. Construction failures are fatal; nothing is retried.
    pub fn new(device: Arc<Device>, frames_in_flight: usize) -> RhiResult<Self> {
        if frames_in_flight == 0 {
            return Err(RhiError::Resource(
                "At least one frame in flight is required".to_string(),
            ));
        }

        let slots = Self::create_slots(&device, frames_in_flight)?;

        info!(
            "Frame sync set created with {} frames in flight",
            frames_in_flight
        );

        Ok(Self { device, slots })
    }

    fn create_slots(device: &Arc<Device>, count: usize) -> RhiResult<Vec<SlotPrimitives>> {
        (0..count)
            .map(|i| {
                let slot = SlotPrimitives::new(device.clone())?;
                debug!("Created sync objects for slot {}", i);
                Ok(slot)
            })
            .collect()
    }

    fn slot(&self, slot: usize) -> &SlotPrimitives {
        &self.slots[slot]
    }
}

impl SlotSync for FrameSyncSet {
    #[inline]
    fn frames_in_flight(&self) -> usize {
        self.slots.len()
    }

    fn wait(&self, slot: usize, timeout: u64) -> RhiResult<()> {
        self.slot(slot).completion().wait(timeout)
    }

    fn reset(&self, slot: usize) -> RhiResult<()> {
        self.slot(slot).completion().reset()
    }

    #[inline]
    fn acquire_wait_handle(&self, slot: usize) -> vk::Semaphore {
        self.slot(slot).image_acquired().handle()
    }

    #[inline]
    fn render_done_handle(&self, slot: usize) -> vk::Semaphore {
        self.slot(slot).render_complete().handle()
    }

    #[inline]
    fn completion_fence(&self, slot: usize) -> vk::Fence {
        self.slot(slot).completion().handle()
    }

    /// Waits for the device, then replaces every slot.
    ///
    /// A semaphore left signaled by an abandoned acquire cannot be waited on
    /// again, so all of them are rebuilt together with the fences.
    fn recreate(&mut self) -> RhiResult<()> {
        self.device.wait_idle()?;

        let count = self.slots.len();
        self.slots.clear();
        self.slots = Self::create_slots(&self.device, count)?;

        debug!("Recreated sync objects for {} slot(s)", count);
        Ok(())
    }
}

/// Submits frames to the device's graphics queue.
pub struct GraphicsQueue {
    device: Arc<Device>,
}

impl GraphicsQueue {
    pub fn new(device: Arc<Device>) -> Self {
        Self { device }
    }
}

impl SubmitQueue for GraphicsQueue {
    fn submit(
        &self,
        command_buffer: vk::CommandBuffer,
        wait: vk::Semaphore,
        signal: vk::Semaphore,
        fence: vk::Fence,
    ) -> Result<(), vk::Result> {
        let wait_semaphores = [wait];
        let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let signal_semaphores = [signal];
        let command_buffers = [command_buffer];

        let submit_info = vk::SubmitInfo::default()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores);

        unsafe {
            self.device
                .handle()
                .queue_submit(self.device.graphics_queue(), &[submit_info], fence)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_sync_types_are_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<FrameSyncSet>();
        assert_send_sync::<GraphicsQueue>();
    }
}
