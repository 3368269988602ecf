//! Writes scene uniforms and records the per-slot draw commands.

use std::sync::Arc;

use ash::vk;
use inflight_rhi::command::{CommandBuffer, clear_values, full_scissor, full_viewport};
use inflight_rhi::device::Device;
use inflight_rhi::render_pass::RenderPass;
use inflight_rhi::{RhiError, RhiResult};

use crate::frame_loop::{FrameRecorder, FrameTarget};
use crate::frame_resources::UniformBlock;
use crate::mesh::MeshGeometry;
use crate::mesh_pipeline::MeshPipeline;
use crate::overlay::Overlay;
use crate::scene::Scene;

/// Descriptor sets and geometry index for one indexed draw.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DrawCall {
    pub mesh: usize,
    /// Camera set (0) followed by the mesh set (1), both for the same slot.
    pub descriptor_sets: [vk::DescriptorSet; 2],
}

/// Draws for `slot`, in scene order.
pub fn draw_list<B: UniformBlock>(scene: &Scene<B>, slot: usize) -> Vec<DrawCall> {
    let camera_set = scene.camera().bind_descriptor(slot);
    scene
        .meshes()
        .iter()
        .enumerate()
        .map(|(mesh, object)| DrawCall {
            mesh,
            descriptor_sets: [camera_set, object.bind_descriptor(slot)],
        })
        .collect()
}

/// The renderer's [`FrameRecorder`]: one pipeline, one draw per mesh.
pub struct SceneRecorder {
    // Field order is drop order.
    overlay: Option<Box<dyn Overlay>>,
    scene: Scene,
    geometry: Vec<MeshGeometry>,
    pipeline: MeshPipeline,
    render_pass: Arc<RenderPass>,
    command_buffers: Vec<vk::CommandBuffer>,
    clear_values: [vk::ClearValue; 2],
    device: Arc<Device>,
}

impl SceneRecorder {
    /// # Errors
    ///
    /// Returns [`RhiError::Resource`] if `geometry` does not pair up with
    /// the scene's meshes, or there is no command buffer per slot.
    pub fn new(
        device: Arc<Device>,
        scene: Scene,
        geometry: Vec<MeshGeometry>,
        pipeline: MeshPipeline,
        render_pass: Arc<RenderPass>,
        command_buffers: Vec<vk::CommandBuffer>,
        clear_color: [f32; 4],
    ) -> RhiResult<Self> {
        if geometry.len() != scene.meshes().len() {
            return Err(RhiError::Resource(format!(
                "{} geometries for {} meshes",
                geometry.len(),
                scene.meshes().len()
            )));
        }

        let frames_in_flight = scene.camera().uniforms().frames_in_flight();
        if command_buffers.len() != frames_in_flight {
            return Err(RhiError::Resource(format!(
                "{} command buffers for {} frames in flight",
                command_buffers.len(),
                frames_in_flight
            )));
        }

        Ok(Self {
            overlay: None,
            scene,
            geometry,
            pipeline,
            render_pass,
            command_buffers,
            clear_values: clear_values(clear_color),
            device,
        })
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn set_overlay(&mut self, overlay: Option<Box<dyn Overlay>>) {
        self.overlay = overlay;
    }
}

impl FrameRecorder for SceneRecorder {
    fn update(&mut self, target: &FrameTarget) -> RhiResult<()> {
        if let Some(overlay) = &mut self.overlay {
            overlay.new_frame();
        }
        self.scene.write_uniforms(target.slot, target.extent)
    }

    fn record(&mut self, target: &FrameTarget) -> RhiResult<vk::CommandBuffer> {
        let cmd = CommandBuffer::from_handle(
            self.device.clone(),
            self.command_buffers[target.slot],
        );

        cmd.reset()?;
        cmd.begin()?;
        cmd.begin_render_pass(
            self.render_pass.handle(),
            target.framebuffer,
            target.extent,
            &self.clear_values,
        );
        cmd.set_viewport(&full_viewport(target.extent));
        cmd.set_scissor(&full_scissor(target.extent));
        cmd.bind_graphics_pipeline(self.pipeline.pipeline().handle());

        for draw in draw_list(&self.scene, target.slot) {
            let geometry = &self.geometry[draw.mesh];
            cmd.bind_vertex_buffer(geometry.vertex_buffer());
            cmd.bind_index_buffer(geometry.index_buffer(), vk::IndexType::UINT16);
            cmd.bind_descriptor_sets(self.pipeline.layout().handle(), &draw.descriptor_sets);
            cmd.draw_indexed(geometry.index_count());
        }

        if let Some(overlay) = &mut self.overlay {
            overlay.draw(cmd.handle());
        }

        cmd.end_render_pass();
        cmd.end()?;

        Ok(cmd.handle())
    }
}

#[cfg(test)]
mod tests {
    use inflight_scene::{Camera, Transform};

    use super::*;
    use crate::frame_resources::FrameResourceSet;
    use crate::scene::{CameraObject, Mesh};
    use crate::testing::{EventLog, HostBlock};

    fn slot_sets(base: u64, frames: usize) -> Vec<vk::DescriptorSet> {
        use ash::vk::Handle;
        (0..frames as u64)
            .map(|slot| vk::DescriptorSet::from_raw(base + slot))
            .collect()
    }

    fn uniforms<T: bytemuck::Pod>(
        log: &EventLog,
        name: &str,
        base: u64,
    ) -> FrameResourceSet<T, HostBlock> {
        let blocks = (0..2)
            .map(|slot| HostBlock::new(log.clone(), name, slot))
            .collect();
        FrameResourceSet::from_parts(blocks, slot_sets(base, 2)).unwrap()
    }

    fn scene(mesh_count: usize) -> Scene<HostBlock> {
        let log = EventLog::default();
        let camera = CameraObject::new(Camera::new(), uniforms(&log, "camera", 0x100));
        let meshes = (0..mesh_count)
            .map(|i| {
                let name = format!("mesh{}", i);
                let base = 0x200 + 0x10 * i as u64;
                Mesh::new(name.clone(), Transform::new(), uniforms(&log, &name, base))
            })
            .collect();
        Scene::new(camera, meshes)
    }

    #[test]
    fn test_draw_list_pairs_camera_with_each_mesh() {
        let scene = scene(3);

        for slot in 0..2 {
            let draws = draw_list(&scene, slot);
            assert_eq!(draws.len(), 3);
            for (i, draw) in draws.iter().enumerate() {
                assert_eq!(draw.mesh, i);
                assert_eq!(draw.descriptor_sets[0], scene.camera().bind_descriptor(slot));
                assert_eq!(draw.descriptor_sets[1], scene.meshes()[i].bind_descriptor(slot));
            }
        }
    }

    #[test]
    fn test_draw_list_uses_only_the_current_slot() {
        use ash::vk::Handle;

        let scene = scene(2);
        let draws = draw_list(&scene, 1);
        for draw in draws {
            for set in draw.descriptor_sets {
                assert_eq!(set.as_raw() & 0xf, 1);
            }
        }
    }

    #[test]
    fn test_empty_scene_draws_nothing() {
        assert!(draw_list(&scene(0), 0).is_empty());
    }
}
