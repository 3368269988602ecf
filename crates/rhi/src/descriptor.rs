//! Descriptor set layouts, pools and set updates.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use ash::vk;
//! use inflight_rhi::device::Device;
//! use inflight_rhi::descriptor::{DescriptorBindingBuilder, DescriptorPool, DescriptorSetLayout};
//!
//! # fn example(device: Arc<Device>) -> Result<(), inflight_rhi::RhiError> {
//! let binding = DescriptorBindingBuilder::uniform_buffer(0, vk::ShaderStageFlags::VERTEX);
//! let layout = DescriptorSetLayout::new(device.clone(), &[binding])?;
//!
//! let pool_size = vk::DescriptorPoolSize::default()
//!     .ty(vk::DescriptorType::UNIFORM_BUFFER)
//!     .descriptor_count(2);
//! let pool = DescriptorPool::new(device, 2, &[pool_size])?;
//!
//! // One set per frame slot
//! let sets = pool.allocate(&[layout.handle(); 2])?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use ash::vk;
use tracing::debug;

use crate::device::Device;
use crate::error::{RhiError, RhiResult};

/// Descriptor set layout wrapper.
///
/// Immutable after creation; share it through `Arc` when several owners
/// allocate sets against it.
pub struct DescriptorSetLayout {
    device: Arc<Device>,
    layout: vk::DescriptorSetLayout,
    binding_count: usize,
}

impl DescriptorSetLayout {
    /// Creates a new descriptor set layout.
    ///
    /// # Arguments
    ///
    /// * `device` - The logical device
    /// * `bindings` - Array of binding descriptions
    ///
    /// # Errors
    ///
    /// Returns an error if layout creation fails.
    pub fn new(
        device: Arc<Device>,
        bindings: &[vk::DescriptorSetLayoutBinding],
    ) -> RhiResult<Self> {
        let create_info = vk::DescriptorSetLayoutCreateInfo::default().bindings(bindings);

        let layout = unsafe {
            device
                .handle()
                .create_descriptor_set_layout(&create_info, None)?
        };

        debug!(
            "Created descriptor set layout with {} binding(s)",
            bindings.len()
        );

        Ok(Self {
            device,
            layout,
            binding_count: bindings.len(),
        })
    }

    /// Returns the Vulkan descriptor set layout handle.
    #[inline]
    pub fn handle(&self) -> vk::DescriptorSetLayout {
        self.layout
    }

    #[inline]
    pub fn binding_count(&self) -> usize {
        self.binding_count
    }
}

impl Drop for DescriptorSetLayout {
    fn drop(&mut self) {
        unsafe {
            self.device
                .handle()
                .destroy_descriptor_set_layout(self.layout, None);
        }
    }
}

/// Fixed-capacity descriptor pool.
///
/// Sets are never freed individually; they live as long as the pool.
pub struct DescriptorPool {
    device: Arc<Device>,
    pool: vk::DescriptorPool,
    max_sets: u32,
}

impl DescriptorPool {
    /// Creates a new descriptor pool.
    ///
    /// # Arguments
    ///
    /// * `device` - The logical device
    /// * `max_sets` - Maximum number of descriptor sets that can be allocated
    /// * `pool_sizes` - Array of pool sizes for each descriptor type
    ///
    /// # Errors
    ///
    /// Returns an error if `max_sets` is zero or pool creation fails.
    pub fn new(
        device: Arc<Device>,
        max_sets: u32,
        pool_sizes: &[vk::DescriptorPoolSize],
    ) -> RhiResult<Self> {
        if max_sets == 0 {
            return Err(RhiError::Resource(
                "Descriptor pool needs room for at least one set".to_string(),
            ));
        }

        let create_info = vk::DescriptorPoolCreateInfo::default()
            .max_sets(max_sets)
            .pool_sizes(pool_sizes);

        let pool = unsafe { device.handle().create_descriptor_pool(&create_info, None)? };

        debug!(
            "Created descriptor pool: max_sets={}, pool_sizes={}",
            max_sets,
            pool_sizes.len()
        );

        Ok(Self {
            device,
            pool,
            max_sets,
        })
    }

    /// Allocates one descriptor set per entry in `layouts`.
    ///
    /// # Errors
    ///
    /// Returns an error if allocation fails (e.g., pool exhausted).
    pub fn allocate(
        &self,
        layouts: &[vk::DescriptorSetLayout],
    ) -> RhiResult<Vec<vk::DescriptorSet>> {
        let alloc_info = vk::DescriptorSetAllocateInfo::default()
            .descriptor_pool(self.pool)
            .set_layouts(layouts);

        let sets = unsafe { self.device.handle().allocate_descriptor_sets(&alloc_info)? };

        debug!("Allocated {} descriptor set(s)", sets.len());

        Ok(sets)
    }

    #[inline]
    pub fn handle(&self) -> vk::DescriptorPool {
        self.pool
    }

    #[inline]
    pub fn max_sets(&self) -> u32 {
        self.max_sets
    }
}

impl Drop for DescriptorPool {
    fn drop(&mut self) {
        unsafe {
            self.device
                .handle()
                .destroy_descriptor_pool(self.pool, None);
        }
        debug!("Destroyed descriptor pool");
    }
}

/// Accumulates per-type descriptor counts for a pool.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PoolBudget {
    sizes: Vec<(vk::DescriptorType, u32)>,
    max_sets: u32,
}

impl PoolBudget {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves `sets` sets, each holding the descriptors of `bindings`.
    pub fn reserve(&mut self, bindings: &[vk::DescriptorSetLayoutBinding], sets: u32) -> &mut Self {
        for binding in bindings {
            let count = binding.descriptor_count * sets;
            match self
                .sizes
                .iter_mut()
                .find(|(ty, _)| *ty == binding.descriptor_type)
            {
                Some((_, total)) => *total += count,
                None => self.sizes.push((binding.descriptor_type, count)),
            }
        }
        self.max_sets += sets;
        self
    }

    /// Descriptor count reserved for `ty`.
    pub fn count(&self, ty: vk::DescriptorType) -> u32 {
        self.sizes
            .iter()
            .find(|(t, _)| *t == ty)
            .map_or(0, |(_, count)| *count)
    }

    #[inline]
    pub fn max_sets(&self) -> u32 {
        self.max_sets
    }

    pub fn pool_sizes(&self) -> Vec<vk::DescriptorPoolSize> {
        self.sizes
            .iter()
            .map(|&(ty, count)| {
                vk::DescriptorPoolSize::default()
                    .ty(ty)
                    .descriptor_count(count)
            })
            .collect()
    }

    /// Creates a pool with exactly the reserved capacity.
    ///
    /// # Errors
    ///
    /// Returns an error if nothing was reserved or pool creation fails.
    pub fn build(&self, device: Arc<Device>) -> RhiResult<DescriptorPool> {
        DescriptorPool::new(device, self.max_sets, &self.pool_sizes())
    }
}

/// Applies descriptor writes to their sets.
pub fn update_descriptor_sets(device: &Device, writes: &[vk::WriteDescriptorSet]) {
    if writes.is_empty() {
        return;
    }

    unsafe {
        device.handle().update_descriptor_sets(writes, &[]);
    }
}

/// Whole-buffer binding info.
#[inline]
pub fn whole_buffer_info(buffer: vk::Buffer) -> vk::DescriptorBufferInfo {
    vk::DescriptorBufferInfo::default()
        .buffer(buffer)
        .offset(0)
        .range(vk::WHOLE_SIZE)
}

/// Shorthand constructors for single-descriptor layout bindings.
///
/// ```no_run
/// use ash::vk;
/// use inflight_rhi::descriptor::DescriptorBindingBuilder;
///
/// let bindings = [
///     DescriptorBindingBuilder::uniform_buffer(0, vk::ShaderStageFlags::VERTEX),
///     DescriptorBindingBuilder::combined_image_sampler(1, vk::ShaderStageFlags::FRAGMENT),
/// ];
/// ```
pub struct DescriptorBindingBuilder;

impl DescriptorBindingBuilder {
    #[inline]
    pub fn uniform_buffer(
        binding: u32,
        stage_flags: vk::ShaderStageFlags,
    ) -> vk::DescriptorSetLayoutBinding<'static> {
        vk::DescriptorSetLayoutBinding::default()
            .binding(binding)
            .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
            .descriptor_count(1)
            .stage_flags(stage_flags)
    }

    #[inline]
    pub fn combined_image_sampler(
        binding: u32,
        stage_flags: vk::ShaderStageFlags,
    ) -> vk::DescriptorSetLayoutBinding<'static> {
        vk::DescriptorSetLayoutBinding::default()
            .binding(binding)
            .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
            .descriptor_count(1)
            .stage_flags(stage_flags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_binding_builder_uniform_buffer() {
        let binding = DescriptorBindingBuilder::uniform_buffer(0, vk::ShaderStageFlags::VERTEX);
        assert_eq!(binding.binding, 0);
        assert_eq!(binding.descriptor_type, vk::DescriptorType::UNIFORM_BUFFER);
        assert_eq!(binding.descriptor_count, 1);
        assert_eq!(binding.stage_flags, vk::ShaderStageFlags::VERTEX);
    }

    #[test]
    fn test_descriptor_binding_builder_combined_image_sampler() {
        let binding =
            DescriptorBindingBuilder::combined_image_sampler(2, vk::ShaderStageFlags::FRAGMENT);
        assert_eq!(binding.binding, 2);
        assert_eq!(
            binding.descriptor_type,
            vk::DescriptorType::COMBINED_IMAGE_SAMPLER
        );
        assert_eq!(binding.stage_flags, vk::ShaderStageFlags::FRAGMENT);
    }

    #[test]
    fn test_whole_buffer_info() {
        let info = whole_buffer_info(vk::Buffer::null());
        assert_eq!(info.offset, 0);
        assert_eq!(info.range, vk::WHOLE_SIZE);
    }

    #[test]
    fn test_pool_budget_merges_types() {
        let camera = [DescriptorBindingBuilder::uniform_buffer(
            0,
            vk::ShaderStageFlags::VERTEX,
        )];
        let mesh = [
            DescriptorBindingBuilder::uniform_buffer(0, vk::ShaderStageFlags::VERTEX),
            DescriptorBindingBuilder::combined_image_sampler(1, vk::ShaderStageFlags::FRAGMENT),
            DescriptorBindingBuilder::combined_image_sampler(2, vk::ShaderStageFlags::FRAGMENT),
            DescriptorBindingBuilder::combined_image_sampler(3, vk::ShaderStageFlags::FRAGMENT),
        ];

        // 3 meshes, 2 frames in flight
        let mut budget = PoolBudget::new();
        budget.reserve(&camera, 2).reserve(&mesh, 6);

        assert_eq!(budget.count(vk::DescriptorType::UNIFORM_BUFFER), 8);
        assert_eq!(budget.count(vk::DescriptorType::COMBINED_IMAGE_SAMPLER), 18);
        assert_eq!(budget.count(vk::DescriptorType::STORAGE_BUFFER), 0);
        assert_eq!(budget.max_sets(), 8);
        assert_eq!(budget.pool_sizes().len(), 2);
    }

    #[test]
    fn test_empty_budget() {
        let budget = PoolBudget::new();
        assert_eq!(budget.max_sets(), 0);
        assert!(budget.pool_sizes().is_empty());
    }
}
