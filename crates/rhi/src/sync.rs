//! Synchronization primitives.
//!
//! - [`Semaphore`] orders work between queue operations (acquire, submit, present).
//! - [`Fence`] lets the host observe that a submission has finished.
//! - [`SlotPrimitives`] bundles the three objects one frame slot needs.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use inflight_rhi::device::Device;
//! use inflight_rhi::sync::{Fence, Semaphore};
//!
//! # fn example(device: Arc<Device>) -> Result<(), inflight_rhi::RhiError> {
//! let image_acquired = Semaphore::new(device.clone())?;
//!
//! // Created signaled so the very first wait returns immediately.
//! let completion = Fence::new(device.clone(), true)?;
//! completion.wait(u64::MAX)?;
//! completion.reset()?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use ash::vk;
use tracing::debug;

use crate::device::Device;
use crate::error::RhiResult;

/// Binary semaphore for queue-to-queue ordering.
pub struct Semaphore {
    device: Arc<Device>,
    semaphore: vk::Semaphore,
}

impl Semaphore {
    /// Creates an unsignaled semaphore.
    ///
    /// # Errors
    ///
    /// Returns an error if semaphore creation fails.
    pub fn new(device: Arc<Device>) -> RhiResult<Self> {
        let create_info = vk::SemaphoreCreateInfo::default();
        let semaphore = unsafe { device.handle().create_semaphore(&create_info, None)? };
        Ok(Self { device, semaphore })
    }

    /// Returns the Vulkan semaphore handle.
    #[inline]
    pub fn handle(&self) -> vk::Semaphore {
        self.semaphore
    }
}

impl Drop for Semaphore {
    fn drop(&mut self) {
        unsafe {
            self.device.handle().destroy_semaphore(self.semaphore, None);
        }
    }
}

/// Fence the host can block on.
///
/// A fence must not be reset while a pending submission still references it.
pub struct Fence {
    device: Arc<Device>,
    fence: vk::Fence,
}

impl Fence {
    /// Creates a fence.
    ///
    /// # Arguments
    ///
    /// * `device` - The logical device
    /// * `signaled` - Start in the signaled state. Per-slot fences use this so
    ///   the first wait on a never-submitted slot does not block.
    ///
    /// # Errors
    ///
    /// Returns an error if fence creation fails.
    pub fn new(device: Arc<Device>, signaled: bool) -> RhiResult<Self> {
        let flags = if signaled {
            vk::FenceCreateFlags::SIGNALED
        } else {
            vk::FenceCreateFlags::empty()
        };

        let create_info = vk::FenceCreateInfo::default().flags(flags);
        let fence = unsafe { device.handle().create_fence(&create_info, None)? };

        Ok(Self { device, fence })
    }

    /// Returns the Vulkan fence handle.
    #[inline]
    pub fn handle(&self) -> vk::Fence {
        self.fence
    }

    /// Blocks until the fence is signaled or `timeout` nanoseconds pass.
    ///
    /// # Errors
    ///
    /// Returns `vk::Result::TIMEOUT` wrapped in [`RhiError`](crate::RhiError)
    /// when the timeout expires, or any other failure of the wait.
    pub fn wait(&self, timeout: u64) -> RhiResult<()> {
        let fences = [self.fence];
        unsafe {
            self.device
                .handle()
                .wait_for_fences(&fences, true, timeout)?
        };
        Ok(())
    }

    /// Returns the fence to the unsignaled state.
    ///
    /// # Errors
    ///
    /// Returns an error if the reset fails.
    pub fn reset(&self) -> RhiResult<()> {
        let fences = [self.fence];
        unsafe { self.device.handle().reset_fences(&fences)? };
        Ok(())
    }
}

impl Drop for Fence {
    fn drop(&mut self) {
        unsafe {
            self.device.handle().destroy_fence(self.fence, None);
        }
    }
}

/// The synchronization objects owned by one frame slot.
///
/// ```text
/// wait(completion) -> acquire(signal image_acquired)
///   -> submit(wait image_acquired, signal render_complete + completion)
///   -> present(wait render_complete)
/// ```
pub struct SlotPrimitives {
    image_acquired: Semaphore,
    render_complete: Semaphore,
    completion: Fence,
}

impl SlotPrimitives {
    /// Creates the semaphores and a signaled completion fence.
    ///
    /// # Errors
    ///
    /// Returns an error if any object cannot be created. Objects created
    /// before the failure are released on return.
    pub fn new(device: Arc<Device>) -> RhiResult<Self> {
        let image_acquired = Semaphore::new(device.clone())?;
        let render_complete = Semaphore::new(device.clone())?;
        let completion = Fence::new(device, true)?;

        debug!("Created frame slot synchronization primitives");

        Ok(Self {
            image_acquired,
            render_complete,
            completion,
        })
    }

    /// Signaled by acquire, waited on by the submission.
    #[inline]
    pub fn image_acquired(&self) -> &Semaphore {
        &self.image_acquired
    }

    /// Signaled by the submission, waited on by present.
    #[inline]
    pub fn render_complete(&self) -> &Semaphore {
        &self.render_complete
    }

    /// Signaled when the slot's last submission has finished on the GPU.
    #[inline]
    pub fn completion(&self) -> &Fence {
        &self.completion
    }
}
