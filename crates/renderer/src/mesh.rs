//! GPU-resident geometry and material textures of a mesh.

use std::sync::Arc;

use ash::vk;
use inflight_resources::{MaterialTextures, MeshData, TextureData};
use inflight_rhi::RhiResult;
use inflight_rhi::buffer::{Buffer, BufferUsage};
use inflight_rhi::descriptor::update_descriptor_sets;
use inflight_rhi::device::Device;
use inflight_rhi::texture::Texture;
use tracing::debug;

use crate::mesh_pipeline::TEXTURE_BINDINGS;

/// Device-local vertex and index buffers plus the three material textures.
///
/// Nothing here changes after upload, so one copy serves every frame slot.
pub struct MeshGeometry {
    vertex_buffer: Buffer,
    index_buffer: Buffer,
    index_count: u32,
    textures: [Texture; 3],
}

impl MeshGeometry {
    /// Uploads `data` and `material`, blocking until the copies finish.
    ///
    /// # Errors
    ///
    /// Returns an error if a buffer or texture cannot be created or uploaded.
    pub fn new(
        device: &Arc<Device>,
        data: &MeshData,
        material: &MaterialTextures,
    ) -> RhiResult<Self> {
        let vertex_buffer = Buffer::new_device_local(
            device.clone(),
            BufferUsage::Vertex,
            bytemuck::cast_slice(&data.vertices),
        )?;
        let index_buffer = Buffer::new_device_local(
            device.clone(),
            BufferUsage::Index,
            bytemuck::cast_slice(&data.indices),
        )?;

        let upload = |texture: &TextureData| {
            Texture::from_rgba8(device.clone(), texture.width, texture.height, &texture.pixels)
        };
        let [base_color, roughness, metallic] = material.in_binding_order();
        let textures = [upload(base_color)?, upload(roughness)?, upload(metallic)?];

        debug!(
            "Uploaded mesh: {} vertices, {} indices",
            data.vertices.len(),
            data.index_count()
        );

        Ok(Self {
            vertex_buffer,
            index_buffer,
            index_count: data.index_count(),
            textures,
        })
    }

    /// Points bindings 1-3 of every set in `sets` at this mesh's textures.
    pub fn write_texture_descriptors(&self, device: &Device, sets: &[vk::DescriptorSet]) {
        let infos = self.textures.each_ref().map(|texture| [texture.descriptor_info()]);
        let writes = texture_writes(sets, &infos);
        update_descriptor_sets(device, &writes);
    }

    #[inline]
    pub fn vertex_buffer(&self) -> vk::Buffer {
        self.vertex_buffer.handle()
    }

    #[inline]
    pub fn index_buffer(&self) -> vk::Buffer {
        self.index_buffer.handle()
    }

    #[inline]
    pub fn index_count(&self) -> u32 {
        self.index_count
    }
}

/// One combined-image-sampler write per set and texture binding.
fn texture_writes<'a>(
    sets: &[vk::DescriptorSet],
    infos: &'a [[vk::DescriptorImageInfo; 1]; 3],
) -> Vec<vk::WriteDescriptorSet<'a>> {
    sets.iter()
        .flat_map(|&set| {
            TEXTURE_BINDINGS.into_iter().zip(infos).map(move |(binding, info)| {
                vk::WriteDescriptorSet::default()
                    .dst_set(set)
                    .dst_binding(binding)
                    .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
                    .image_info(info)
            })
        })
        .collect()
}
