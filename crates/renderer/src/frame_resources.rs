//! Per-slot uniform storage bound through descriptor sets.
//!
//! Each frame slot gets its own persistently mapped block and its own
//! descriptor set, so writing slot `i` never touches memory the GPU may still
//! be reading for another slot.

use std::marker::PhantomData;
use std::sync::Arc;

use ash::vk;
use bytemuck::Pod;
use inflight_rhi::buffer::{Buffer, BufferUsage};
use inflight_rhi::descriptor::{
    DescriptorPool, DescriptorSetLayout, update_descriptor_sets, whole_buffer_info,
};
use inflight_rhi::device::Device;
use inflight_rhi::{RhiError, RhiResult};
use tracing::debug;

/// Binding of the uniform block in every set that holds one.
pub const UNIFORM_BINDING: u32 = 0;

/// Host-writable memory backing one slot's uniform data.
pub trait UniformBlock {
    /// Overwrites the block from offset 0.
    fn write_bytes(&mut self, bytes: &[u8]) -> RhiResult<()>;
}

impl UniformBlock for Buffer {
    fn write_bytes(&mut self, bytes: &[u8]) -> RhiResult<()> {
        self.write_data(0, bytes)
    }
}

/// One uniform block and descriptor set per frame slot, holding a `T`.
pub struct FrameResourceSet<T, B = Buffer> {
    blocks: Vec<B>,
    descriptor_sets: Vec<vk::DescriptorSet>,
    _marker: PhantomData<T>,
}

impl<T: Pod> FrameResourceSet<T, Buffer> {
    /// Allocates `frames_in_flight` uniform buffers and sets from `pool`.
    ///
    /// Binding 0 of every set points at that slot's buffer; the caller
    /// fills any other bindings of `layout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the pool is exhausted or a buffer cannot be
    /// created.
    pub fn new(
        device: &Arc<Device>,
        pool: &DescriptorPool,
        layout: &DescriptorSetLayout,
        frames_in_flight: usize,
    ) -> RhiResult<Self> {
        let layouts = vec![layout.handle(); frames_in_flight];
        let descriptor_sets = pool.allocate(&layouts)?;

        let size = std::mem::size_of::<T>() as vk::DeviceSize;
        let blocks = (0..frames_in_flight)
            .map(|_| Buffer::new(device.clone(), BufferUsage::Uniform, size))
            .collect::<RhiResult<Vec<_>>>()?;

        let buffer_infos: Vec<[vk::DescriptorBufferInfo; 1]> = blocks
            .iter()
            .map(|buffer| [whole_buffer_info(buffer.handle())])
            .collect();
        let writes: Vec<vk::WriteDescriptorSet> = descriptor_sets
            .iter()
            .zip(&buffer_infos)
            .map(|(&set, info)| {
                vk::WriteDescriptorSet::default()
                    .dst_set(set)
                    .dst_binding(UNIFORM_BINDING)
                    .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
                    .buffer_info(info)
            })
            .collect();
        update_descriptor_sets(device, &writes);

        debug!(
            "Created {} uniform slot(s) of {} bytes",
            frames_in_flight, size
        );

        Self::from_parts(blocks, descriptor_sets)
    }
}

impl<T: Pod, B: UniformBlock> FrameResourceSet<T, B> {
    /// Pairs already created blocks with their descriptor sets, slot by slot.
    ///
    /// # Errors
    ///
    /// Returns [`RhiError::Resource`] if the counts differ or are zero.
    pub fn from_parts(blocks: Vec<B>, descriptor_sets: Vec<vk::DescriptorSet>) -> RhiResult<Self> {
        if blocks.is_empty() || blocks.len() != descriptor_sets.len() {
            return Err(RhiError::Resource(format!(
                "{} uniform block(s) for {} descriptor set(s)",
                blocks.len(),
                descriptor_sets.len()
            )));
        }

        Ok(Self {
            blocks,
            descriptor_sets,
            _marker: PhantomData,
        })
    }

    /// Copies `value` into the slot's block.
    ///
    /// Not synchronized: the slot's previous GPU work must have completed.
    pub fn write(&mut self, slot: usize, value: &T) -> RhiResult<()> {
        self.blocks[slot].write_bytes(bytemuck::bytes_of(value))
    }

    /// Descriptor set to bind when drawing with `slot`.
    #[inline]
    pub fn bind_descriptor(&self, slot: usize) -> vk::DescriptorSet {
        self.descriptor_sets[slot]
    }

    #[inline]
    pub fn descriptor_sets(&self) -> &[vk::DescriptorSet] {
        &self.descriptor_sets
    }

    #[inline]
    pub fn frames_in_flight(&self) -> usize {
        self.blocks.len()
    }

    #[inline]
    pub fn block(&self, slot: usize) -> &B {
        &self.blocks[slot]
    }
}
