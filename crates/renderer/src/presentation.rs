//! Swapchain images, the shared depth attachment and their framebuffers.
//!
//! The whole set is rebuilt together whenever the surface goes stale. While
//! the window is minimized a rebuild blocks until it has a drawable size
//! again, so a zero-sized swapchain is never requested.

use std::sync::Arc;

use ash::vk;
use inflight_platform::{FramebufferSource, Surface, wait_for_nonzero_size};
use inflight_rhi::device::Device;
use inflight_rhi::image::Image;
use inflight_rhi::render_pass::{Framebuffer, RenderPass};
use inflight_rhi::swapchain::{SurfacePlan, Swapchain, SwapchainSupportDetails};
use inflight_rhi::{RhiError, RhiResult};
use tracing::{debug, info};

use crate::frame_loop::{Presenter, SurfaceStatus};

/// Everything sized to the current surface extent.
struct SurfaceTargets {
    // Field order is drop order: framebuffers reference the views below.
    framebuffers: Vec<Framebuffer>,
    depth: Image,
    swapchain: Swapchain,
}

/// The presentable side of the renderer.
///
/// Owns the render pass so the color attachment format always matches the
/// swapchain it is used with.
pub struct PresentationSurface {
    targets: Option<SurfaceTargets>,
    render_pass: Arc<RenderPass>,
    device: Arc<Device>,
    surface_loader: ash::khr::surface::Instance,
    swapchain_loader: ash::khr::swapchain::Device,
    surface: vk::SurfaceKHR,
    prefer_mailbox: bool,
}

impl PresentationSurface {
    /// Builds the swapchain, depth attachment, render pass and framebuffers.
    ///
    /// # Arguments
    ///
    /// * `device` - The logical device
    /// * `instance` - Instance the swapchain loader is created from
    /// * `surface` - Window surface; must outlive the returned value
    /// * `window` - Size source, waited on while minimized
    /// * `prefer_mailbox` - Use MAILBOX presentation when available
    ///
    /// # Errors
    ///
    /// Returns an error if no depth format is supported or any object
    /// cannot be created.
    pub fn new(
        device: Arc<Device>,
        instance: &ash::Instance,
        surface: &Surface,
        window: &mut dyn FramebufferSource,
        prefer_mailbox: bool,
    ) -> RhiResult<Self> {
        let swapchain_loader = ash::khr::swapchain::Device::new(instance, device.handle());
        let surface_loader = surface.loader().clone();
        let surface = surface.handle();

        let plan = plan_for_window(window, prefer_mailbox, || {
            SwapchainSupportDetails::query(device.physical_device(), surface, &surface_loader)
        })?;

        let depth_format = device.find_depth_format()?;
        let render_pass = Arc::new(RenderPass::new(
            device.clone(),
            plan.surface_format.format,
            depth_format,
        )?);

        let mut presentation = Self {
            targets: None,
            render_pass,
            device,
            surface_loader,
            swapchain_loader,
            surface,
            prefer_mailbox,
        };
        presentation.targets = Some(presentation.build_targets(&plan)?);

        info!(
            "Presentation surface ready: {}x{}, {} images",
            plan.extent.width,
            plan.extent.height,
            presentation.image_count()
        );

        Ok(presentation)
    }

    #[inline]
    pub fn render_pass(&self) -> &Arc<RenderPass> {
        &self.render_pass
    }

    /// Number of swapchain images, independent of the frames in flight.
    pub fn image_count(&self) -> usize {
        self.targets
            .as_ref()
            .map_or(0, |targets| targets.swapchain.image_count())
    }

    fn build_targets(&self, plan: &SurfacePlan) -> RhiResult<SurfaceTargets> {
        if plan.surface_format.format != self.render_pass.color_format() {
            return Err(RhiError::SwapchainError(format!(
                "Surface format changed from {:?} to {:?}",
                self.render_pass.color_format(),
                plan.surface_format.format
            )));
        }

        let swapchain = Swapchain::new(
            self.device.clone(),
            self.swapchain_loader.clone(),
            self.surface,
            plan,
        )?;

        let depth = Image::new_depth(
            self.device.clone(),
            swapchain.extent(),
            self.render_pass.depth_format(),
        )?;

        let framebuffers = swapchain
            .image_views()
            .iter()
            .map(|&view| {
                Framebuffer::new(
                    self.device.clone(),
                    &self.render_pass,
                    &[view, depth.view()],
                    swapchain.extent(),
                )
            })
            .collect::<RhiResult<Vec<_>>>()?;

        debug!(
            "Created {} framebuffers at {}x{}",
            framebuffers.len(),
            swapchain.extent().width,
            swapchain.extent().height
        );

        Ok(SurfaceTargets {
            framebuffers,
            depth,
            swapchain,
        })
    }
}

impl Presenter for PresentationSurface {
    fn extent(&self) -> vk::Extent2D {
        self.targets
            .as_ref()
            .map_or(vk::Extent2D::default(), |targets| targets.swapchain.extent())
    }

    fn framebuffer(&self, image_index: u32) -> Option<vk::Framebuffer> {
        self.targets
            .as_ref()?
            .framebuffers
            .get(image_index as usize)
            .map(Framebuffer::handle)
    }

    fn acquire(&mut self, timeout: u64, image_acquired: vk::Semaphore) -> (u32, SurfaceStatus) {
        // A failed rebuild leaves no targets; report stale so it is retried.
        let Some(targets) = &self.targets else {
            return (0, SurfaceStatus::Stale);
        };

        match targets.swapchain.acquire_next_image(timeout, image_acquired) {
            Ok((image_index, suboptimal)) => {
                (image_index, SurfaceStatus::from_result(Ok(suboptimal)))
            }
            Err(e) => (0, SurfaceStatus::from_result(Err(e))),
        }
    }

    fn present(&mut self, image_index: u32, render_done: vk::Semaphore) -> SurfaceStatus {
        let Some(targets) = &self.targets else {
            return SurfaceStatus::Stale;
        };

        SurfaceStatus::from_result(targets.swapchain.present(
            self.device.present_queue(),
            image_index,
            render_done,
        ))
    }

    fn recreate(&mut self, window: &mut dyn FramebufferSource) -> RhiResult<()> {
        let plan = plan_for_window(window, self.prefer_mailbox, || {
            self.device.wait_idle()?;
            self.targets = None;
            SwapchainSupportDetails::query(
                self.device.physical_device(),
                self.surface,
                &self.surface_loader,
            )
        })?;

        self.targets = Some(self.build_targets(&plan)?);
        Ok(())
    }
}

/// Waits for a drawable window size, then negotiates swapchain settings.
///
/// `query` runs only after the size is non-zero, so nothing it creates or
/// destroys can observe a minimized window.
///
/// # Errors
///
/// Returns the failure of `query` or of [`SurfacePlan::negotiate`].
pub fn plan_for_window<F>(
    window: &mut dyn FramebufferSource,
    prefer_mailbox: bool,
    query: F,
) -> RhiResult<SurfacePlan>
where
    F: FnOnce() -> RhiResult<SwapchainSupportDetails>,
{
    let size = wait_for_nonzero_size(window);
    let support = query()?;
    SurfacePlan::negotiate(&support, size, prefer_mailbox)
}
