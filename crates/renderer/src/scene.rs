//! Drawable objects and their per-slot uniforms.

use ash::vk;
use inflight_rhi::RhiResult;
use inflight_rhi::buffer::Buffer;
use inflight_scene::{Camera, Transform, aspect_ratio};

use crate::frame_resources::{FrameResourceSet, UniformBlock};
use crate::ubo::{CameraUbo, MeshUbo};

/// The camera plus its view/projection uniforms (set 0).
pub struct CameraObject<B = Buffer> {
    pub camera: Camera,
    uniforms: FrameResourceSet<CameraUbo, B>,
}

impl<B: UniformBlock> CameraObject<B> {
    pub fn new(camera: Camera, uniforms: FrameResourceSet<CameraUbo, B>) -> Self {
        Self { camera, uniforms }
    }

    /// Writes view and projection for a target of size `extent`.
    pub fn write_uniforms(&mut self, slot: usize, extent: vk::Extent2D) -> RhiResult<()> {
        let aspect = aspect_ratio(extent.width, extent.height);
        let ubo = CameraUbo::from_camera(&self.camera, aspect);
        self.uniforms.write(slot, &ubo)
    }

    #[inline]
    pub fn bind_descriptor(&self, slot: usize) -> vk::DescriptorSet {
        self.uniforms.bind_descriptor(slot)
    }

    #[inline]
    pub fn uniforms(&self) -> &FrameResourceSet<CameraUbo, B> {
        &self.uniforms
    }
}

/// A placed mesh and its model-matrix uniforms (set 1).
///
/// Geometry and textures live in [`MeshGeometry`](crate::mesh::MeshGeometry);
/// this half is the part that changes every frame.
pub struct Mesh<B = Buffer> {
    name: String,
    pub transform: Transform,
    uniforms: FrameResourceSet<MeshUbo, B>,
}

impl<B: UniformBlock> Mesh<B> {
    pub fn new(
        name: impl Into<String>,
        transform: Transform,
        uniforms: FrameResourceSet<MeshUbo, B>,
    ) -> Self {
        Self {
            name: name.into(),
            transform,
            uniforms,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn write_uniforms(&mut self, slot: usize) -> RhiResult<()> {
        let ubo = MeshUbo::from_transform(&self.transform);
        self.uniforms.write(slot, &ubo)
    }

    #[inline]
    pub fn bind_descriptor(&self, slot: usize) -> vk::DescriptorSet {
        self.uniforms.bind_descriptor(slot)
    }

    #[inline]
    pub fn uniforms(&self) -> &FrameResourceSet<MeshUbo, B> {
        &self.uniforms
    }
}

/// Everything that is drawn, in draw order.
pub struct Scene<B = Buffer> {
    camera: CameraObject<B>,
    meshes: Vec<Mesh<B>>,
}

impl<B: UniformBlock> Scene<B> {
    pub fn new(camera: CameraObject<B>, meshes: Vec<Mesh<B>>) -> Self {
        Self { camera, meshes }
    }

    /// Writes the camera and every mesh into `slot`.
    ///
    /// The slot's previous GPU work must have completed.
    pub fn write_uniforms(&mut self, slot: usize, extent: vk::Extent2D) -> RhiResult<()> {
        self.camera.write_uniforms(slot, extent)?;
        for mesh in &mut self.meshes {
            mesh.write_uniforms(slot)?;
        }
        Ok(())
    }

    pub fn camera(&self) -> &CameraObject<B> {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera.camera
    }

    pub fn meshes(&self) -> &[Mesh<B>] {
        &self.meshes
    }

    pub fn meshes_mut(&mut self) -> &mut [Mesh<B>] {
        &mut self.meshes
    }
}
