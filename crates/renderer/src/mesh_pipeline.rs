//! The single graphics pipeline every mesh is drawn with.
//!
//! # Descriptor Sets
//!
//! | Set | Binding | Type | Stage | Content |
//! |-----|---------|------|-------|---------|
//! | 0 | 0 | uniform buffer | vertex | [`CameraUbo`](crate::ubo::CameraUbo) |
//! | 1 | 0 | uniform buffer | vertex | [`MeshUbo`](crate::ubo::MeshUbo) |
//! | 1 | 1 | combined image sampler | fragment | base color |
//! | 1 | 2 | combined image sampler | fragment | roughness |
//! | 1 | 3 | combined image sampler | fragment | metallic |

use std::sync::Arc;

use ash::vk;
use inflight_core::RendererConfig;
use inflight_rhi::RhiResult;
use inflight_rhi::descriptor::{
    DescriptorBindingBuilder, DescriptorPool, DescriptorSetLayout, PoolBudget,
};
use inflight_rhi::device::Device;
use inflight_rhi::pipeline::{
    ColorBlendAttachment, CompareOp, CullMode, FrontFace, GraphicsPipelineBuilder, Pipeline,
    PipelineLayout,
};
use inflight_rhi::render_pass::RenderPass;
use inflight_rhi::shader::{Shader, ShaderStage};
use inflight_rhi::vertex::Vertex;
use tracing::info;

pub const VERTEX_SHADER: &str = "mesh.vert.spv";
pub const FRAGMENT_SHADER: &str = "mesh.frag.spv";

/// Bindings of the three material textures in the mesh set.
pub const TEXTURE_BINDINGS: [u32; 3] = [1, 2, 3];

pub fn camera_bindings() -> [vk::DescriptorSetLayoutBinding<'static>; 1] {
    [DescriptorBindingBuilder::uniform_buffer(
        0,
        vk::ShaderStageFlags::VERTEX,
    )]
}

pub fn mesh_bindings() -> [vk::DescriptorSetLayoutBinding<'static>; 4] {
    [
        DescriptorBindingBuilder::uniform_buffer(0, vk::ShaderStageFlags::VERTEX),
        DescriptorBindingBuilder::combined_image_sampler(
            TEXTURE_BINDINGS[0],
            vk::ShaderStageFlags::FRAGMENT,
        ),
        DescriptorBindingBuilder::combined_image_sampler(
            TEXTURE_BINDINGS[1],
            vk::ShaderStageFlags::FRAGMENT,
        ),
        DescriptorBindingBuilder::combined_image_sampler(
            TEXTURE_BINDINGS[2],
            vk::ShaderStageFlags::FRAGMENT,
        ),
    ]
}

/// Pool capacity for one camera set and `mesh_count` mesh sets per slot.
pub fn pool_budget(mesh_count: usize, frames_in_flight: usize) -> PoolBudget {
    let frames = frames_in_flight as u32;
    let mut budget = PoolBudget::new();
    budget
        .reserve(&camera_bindings(), frames)
        .reserve(&mesh_bindings(), mesh_count as u32 * frames);
    budget
}

/// Pipeline, layouts and the descriptor pool the scene allocates from.
pub struct MeshPipeline {
    // Field order is drop order.
    pipeline: Pipeline,
    layout: PipelineLayout,
    descriptor_pool: DescriptorPool,
    camera_layout: DescriptorSetLayout,
    mesh_layout: DescriptorSetLayout,
}

impl MeshPipeline {
    /// Loads the mesh shaders and builds the pipeline for `render_pass`.
    ///
    /// # Arguments
    ///
    /// * `device` - The logical device
    /// * `render_pass` - Render pass the pipeline draws in (subpass 0)
    /// * `config` - Supplies the shader directory
    /// * `mesh_count` - Meshes the descriptor pool must hold sets for
    /// * `frames_in_flight` - Sets per object
    ///
    /// # Errors
    ///
    /// Returns [`RhiError::ShaderError`](inflight_rhi::RhiError::ShaderError)
    /// if a shader file is missing or malformed, or any Vulkan error from
    /// object creation.
    pub fn new(
        device: Arc<Device>,
        render_pass: &RenderPass,
        config: &RendererConfig,
        mesh_count: usize,
        frames_in_flight: usize,
    ) -> RhiResult<Self> {
        let camera_layout = DescriptorSetLayout::new(device.clone(), &camera_bindings())?;
        let mesh_layout = DescriptorSetLayout::new(device.clone(), &mesh_bindings())?;

        let descriptor_pool =
            pool_budget(mesh_count, frames_in_flight).build(device.clone())?;

        let layout = PipelineLayout::new(
            device.clone(),
            &[camera_layout.handle(), mesh_layout.handle()],
        )?;

        let vertex_shader = Shader::from_spirv_file(
            device.clone(),
            &config.shader_path(VERTEX_SHADER),
            ShaderStage::Vertex,
        )?;
        let fragment_shader = Shader::from_spirv_file(
            device.clone(),
            &config.shader_path(FRAGMENT_SHADER),
            ShaderStage::Fragment,
        )?;

        // Shader modules are only needed until the pipeline exists.
        let pipeline = GraphicsPipelineBuilder::new()
            .vertex_shader(&vertex_shader)
            .fragment_shader(&fragment_shader)
            .vertex_binding(Vertex::binding_description())
            .vertex_attributes(&Vertex::attribute_descriptions())
            .cull_mode(CullMode::Back)
            .front_face(FrontFace::CounterClockwise)
            .depth_test_enable(true)
            .depth_write_enable(true)
            .depth_compare_op(CompareOp::Less)
            .color_blend_attachment(ColorBlendAttachment::alpha_blend())
            .render_pass(render_pass, 0)
            .build(device, &layout)?;

        info!(
            "Mesh pipeline created ({} meshes x {} frames in flight)",
            mesh_count, frames_in_flight
        );

        Ok(Self {
            pipeline,
            layout,
            descriptor_pool,
            camera_layout,
            mesh_layout,
        })
    }

    #[inline]
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    #[inline]
    pub fn layout(&self) -> &PipelineLayout {
        &self.layout
    }

    #[inline]
    pub fn descriptor_pool(&self) -> &DescriptorPool {
        &self.descriptor_pool
    }

    #[inline]
    pub fn camera_layout(&self) -> &DescriptorSetLayout {
        &self.camera_layout
    }

    #[inline]
    pub fn mesh_layout(&self) -> &DescriptorSetLayout {
        &self.mesh_layout
    }
}
