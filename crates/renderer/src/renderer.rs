//! Top-level renderer.
//!
//! This module provides the [`Renderer`] struct that creates every Vulkan
//! object, builds the default scene and drives one [`FrameLoop`] tick per
//! call to [`Renderer::render_frame`].

use std::mem::ManuallyDrop;
use std::sync::Arc;

use tracing::{error, info};

use inflight_core::RendererConfig;
use inflight_platform::{Surface, Window};
use inflight_resources::{MeshData, default_scene};
use inflight_rhi::command::CommandPool;
use inflight_rhi::device::Device;
use inflight_rhi::instance::Instance;
use inflight_rhi::physical_device::select_physical_device;
use inflight_rhi::{RhiError, RhiResult};
use inflight_scene::{Camera, Transform};

use crate::frame_loop::{FrameLoop, TickOutcome};
use crate::frame_resources::FrameResourceSet;
use crate::frame_sync::{FrameSyncSet, GraphicsQueue};
use crate::mesh::MeshGeometry;
use crate::mesh_pipeline::MeshPipeline;
use crate::overlay::Overlay;
use crate::presentation::PresentationSurface;
use crate::recorder::SceneRecorder;
use crate::scene::{CameraObject, Mesh, Scene};

/// The concrete frame loop driven by [`Renderer`].
type SurfaceFrameLoop = FrameLoop<FrameSyncSet, PresentationSurface, GraphicsQueue>;

/// Owns every Vulkan object and the scene drawn with them.
///
/// # Resource Destruction Order
///
/// Vulkan objects must be destroyed children first:
/// 1. Wait for all GPU work to complete
/// 2. Scene uniforms, mesh buffers and textures, pipeline, descriptor pool
///    and layouts (the recorder)
/// 3. Framebuffers, depth image, swapchain, render pass, then the sync set
///    (the frame loop)
/// 4. Command pool
/// 5. Window surface
/// 6. Device
/// 7. Instance
///
/// ManuallyDrop is used to ensure this order.
pub struct Renderer {
    recorder: ManuallyDrop<SceneRecorder>,
    frame_loop: ManuallyDrop<SurfaceFrameLoop>,
    command_pool: ManuallyDrop<CommandPool>,
    surface: ManuallyDrop<Surface>,
    device: ManuallyDrop<Arc<Device>>,
    instance: ManuallyDrop<Instance>,
}

impl Renderer {
    /// Creates a renderer for `window` and uploads the default scene.
    ///
    /// Blocks while the window is minimized, since no swapchain can be
    /// created for a zero-sized surface.
    ///
    /// # Arguments
    ///
    /// * `window` - The window to render to
    /// * `config` - Frame pacing, presentation, debug and asset settings
    ///
    /// # Errors
    ///
    /// Returns an error if any Vulkan object cannot be created or a shader
    /// cannot be loaded. Missing textures are not errors; they are replaced
    /// by a placeholder.
    pub fn new(window: &mut Window, config: &RendererConfig) -> RhiResult<Self> {
        let frames_in_flight = config.graphics.frames_in_flight;

        info!(
            "Initializing Vulkan renderer ({} frames in flight)",
            frames_in_flight
        );

        let extensions = window
            .required_extensions()
            .map_err(|e| RhiError::SurfaceError(e.to_string()))?;
        let instance = Instance::new(
            &config.window.title,
            &extensions,
            config.debug.validation_layers,
        )?;

        let surface = window
            .create_surface(instance.entry(), instance.handle())
            .map_err(|e| RhiError::SurfaceError(e.to_string()))?;

        let physical_device_info =
            select_physical_device(instance.handle(), surface.handle(), surface.loader())?;
        let device = Device::new(&instance, &physical_device_info)?;

        let presentation = PresentationSurface::new(
            device.clone(),
            instance.handle(),
            &surface,
            window,
            config.graphics.prefer_mailbox,
        )?;

        let sync = FrameSyncSet::new(device.clone(), frames_in_flight)?;
        let queue = GraphicsQueue::new(device.clone());

        let graphics_family = device
            .queue_families()
            .graphics_family
            .ok_or(RhiError::NoSuitableGpu)?;
        let command_pool = CommandPool::new(device.clone(), graphics_family)?;
        let command_buffers = command_pool.allocate_command_buffers(frames_in_flight as u32)?;

        let descriptors = default_scene();
        let pipeline = MeshPipeline::new(
            device.clone(),
            presentation.render_pass(),
            config,
            descriptors.len(),
            frames_in_flight,
        )?;

        let camera_uniforms = FrameResourceSet::new(
            &device,
            pipeline.descriptor_pool(),
            pipeline.camera_layout(),
            frames_in_flight,
        )?;
        let camera = CameraObject::new(Camera::new(), camera_uniforms);

        let quad = MeshData::quad();
        let mut meshes = Vec::with_capacity(descriptors.len());
        let mut geometry = Vec::with_capacity(descriptors.len());
        for descriptor in descriptors {
            let textures = descriptor.material.load(&config.assets.texture_dir);
            let mesh_geometry = MeshGeometry::new(&device, &quad, &textures)?;

            let uniforms = FrameResourceSet::new(
                &device,
                pipeline.descriptor_pool(),
                pipeline.mesh_layout(),
                frames_in_flight,
            )?;
            mesh_geometry.write_texture_descriptors(&device, uniforms.descriptor_sets());

            let transform = Transform::new().with_position(descriptor.position);
            meshes.push(Mesh::new(descriptor.name, transform, uniforms));
            geometry.push(mesh_geometry);
        }

        let mesh_count = meshes.len();
        let recorder = SceneRecorder::new(
            device.clone(),
            Scene::new(camera, meshes),
            geometry,
            pipeline,
            presentation.render_pass().clone(),
            command_buffers,
            config.graphics.clear_color,
        )?;

        let frame_loop = FrameLoop::new(
            sync,
            presentation,
            queue,
            config.graphics.fence_timeout_ns,
        );

        info!(
            "Renderer initialized: {} swapchain images, {} frames in flight, {} meshes",
            frame_loop.surface().image_count(),
            frames_in_flight,
            mesh_count
        );

        Ok(Self {
            recorder: ManuallyDrop::new(recorder),
            frame_loop: ManuallyDrop::new(frame_loop),
            command_pool: ManuallyDrop::new(command_pool),
            surface: ManuallyDrop::new(surface),
            device: ManuallyDrop::new(device),
            instance: ManuallyDrop::new(instance),
        })
    }

    /// Runs one frame loop tick.
    ///
    /// # Errors
    ///
    /// Returns an error only when surface or sync recreation fails. It has
    /// already been logged, and the next call retries it.
    pub fn render_frame(&mut self, window: &mut Window) -> RhiResult<TickOutcome> {
        self.frame_loop.tick(window, &mut *self.recorder)
    }

    pub fn scene(&self) -> &Scene {
        self.recorder.scene()
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        self.recorder.scene_mut()
    }

    /// Installs or removes the UI drawn after the meshes.
    pub fn set_overlay(&mut self, overlay: Option<Box<dyn Overlay>>) {
        self.recorder.set_overlay(overlay);
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        // Wait for all GPU work to complete before destroying resources
        if let Err(e) = self.device.wait_idle() {
            error!(
                "Failed to wait for device idle during renderer drop: {:?}",
                e
            );
        }

        // SAFETY: each field is dropped exactly once, here, and never used
        // afterwards. Every child object is gone before its parent.
        unsafe {
            ManuallyDrop::drop(&mut self.recorder);
            ManuallyDrop::drop(&mut self.frame_loop);
            ManuallyDrop::drop(&mut self.command_pool);
            ManuallyDrop::drop(&mut self.surface);
            ManuallyDrop::drop(&mut self.device);
            ManuallyDrop::drop(&mut self.instance);
        }

        info!("Renderer destroyed");
    }
}
