//! Sampled textures uploaded from RGBA8 pixels.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use inflight_rhi::device::Device;
//! use inflight_rhi::texture::Texture;
//!
//! # fn example(device: Arc<Device>) -> Result<(), inflight_rhi::RhiError> {
//! let white = [255u8; 4];
//! let texture = Texture::from_rgba8(device, 1, 1, &white)?;
//! let info = texture.descriptor_info();
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use ash::vk;
use tracing::debug;

use crate::buffer::{Buffer, BufferUsage};
use crate::device::Device;
use crate::error::{RhiError, RhiResult};
use crate::image::{Image, record_layout_transition};
use crate::sampler::Sampler;

/// Color format every texture is stored in.
pub const TEXTURE_FORMAT: vk::Format = vk::Format::R8G8B8A8_SRGB;

/// Device-local image in `SHADER_READ_ONLY_OPTIMAL` layout with its sampler.
pub struct Texture {
    image: Image,
    sampler: Sampler,
}

impl Texture {
    /// Uploads `pixels` (tightly packed RGBA8 rows) into a new texture.
    ///
    /// Blocks until the upload has finished on the GPU.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `pixels` does not hold exactly `width * height * 4` bytes
    /// - Image, staging buffer or sampler creation fails
    /// - The upload submission fails
    pub fn from_rgba8(
        device: Arc<Device>,
        width: u32,
        height: u32,
        pixels: &[u8],
    ) -> RhiResult<Self> {
        let expected = rgba8_len(width, height);
        if pixels.len() != expected {
            return Err(RhiError::Resource(format!(
                "texture {}x{} needs {} bytes, got {}",
                width,
                height,
                expected,
                pixels.len()
            )));
        }

        let extent = vk::Extent2D { width, height };
        let image = Image::new_sampled(device.clone(), extent, TEXTURE_FORMAT)?;
        let staging = Buffer::new_with_data(device.clone(), BufferUsage::Staging, pixels)?;

        let mut recorded = Ok(());
        device.immediate_submit(|cmd| {
            recorded = record_upload(&device, cmd, &staging, &image);
        })?;
        recorded?;

        let sampler = Sampler::new_linear_repeat(device)?;

        debug!("Uploaded {}x{} texture", width, height);

        Ok(Self { image, sampler })
    }

    /// Binding info for a combined image sampler descriptor.
    pub fn descriptor_info(&self) -> vk::DescriptorImageInfo {
        vk::DescriptorImageInfo::default()
            .image_layout(vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL)
            .image_view(self.image.view())
            .sampler(self.sampler.handle())
    }

    #[inline]
    pub fn extent(&self) -> vk::Extent2D {
        self.image.extent()
    }
}

fn record_upload(
    device: &Device,
    cmd: vk::CommandBuffer,
    staging: &Buffer,
    image: &Image,
) -> RhiResult<()> {
    record_layout_transition(
        device,
        cmd,
        image.handle(),
        vk::ImageLayout::UNDEFINED,
        vk::ImageLayout::TRANSFER_DST_OPTIMAL,
    )?;

    let extent = image.extent();
    let region = vk::BufferImageCopy::default()
        .buffer_offset(0)
        .buffer_row_length(0)
        .buffer_image_height(0)
        .image_subresource(
            vk::ImageSubresourceLayers::default()
                .aspect_mask(vk::ImageAspectFlags::COLOR)
                .mip_level(0)
                .base_array_layer(0)
                .layer_count(1),
        )
        .image_offset(vk::Offset3D::default())
        .image_extent(vk::Extent3D {
            width: extent.width,
            height: extent.height,
            depth: 1,
        });

    unsafe {
        device.handle().cmd_copy_buffer_to_image(
            cmd,
            staging.handle(),
            image.handle(),
            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
            &[region],
        );
    }

    record_layout_transition(
        device,
        cmd,
        image.handle(),
        vk::ImageLayout::TRANSFER_DST_OPTIMAL,
        vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
    )
}

/// Byte length of a tightly packed RGBA8 image.
#[inline]
pub fn rgba8_len(width: u32, height: u32) -> usize {
    width as usize * height as usize * 4
}
