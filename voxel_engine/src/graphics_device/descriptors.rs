/// Descriptor set layouts, pools and writers
///
/// RAII wrappers over the descriptor handles of a `GraphicsDevice`, each with a
/// builder. `DescriptorWriter` validates writes against the layout's bindings
/// before anything reaches the device.

use std::collections::BTreeMap;

use crate::engine_error;
use crate::error::{Error, Result};
use crate::graphics_device::command::ShaderStages;
use crate::graphics_device::descriptor::{
    DescriptorBinding, DescriptorBufferInfo, DescriptorPoolSize, DescriptorType, DescriptorWrite,
};
use crate::graphics_device::graphics_device::GraphicsDevice;

/// Default `max_sets` of a pool builder
pub const DEFAULT_MAX_SETS: u32 = 1000;

// ============================================================================
// Set layout
// ============================================================================

pub struct DescriptorSetLayoutBuilder<'d, D: GraphicsDevice> {
    device: &'d D,
    bindings: BTreeMap<u32, DescriptorBinding>,
    duplicate: Option<u32>,
}

impl<'d, D: GraphicsDevice> DescriptorSetLayoutBuilder<'d, D> {
    pub fn new(device: &'d D) -> Self {
        Self { device, bindings: BTreeMap::new(), duplicate: None }
    }

    pub fn add_binding(
        mut self,
        binding: u32,
        descriptor_type: DescriptorType,
        stages: ShaderStages,
        count: u32,
    ) -> Self {
        let entry = DescriptorBinding { binding, descriptor_type, stages, count };
        if self.bindings.insert(binding, entry).is_some() {
            self.duplicate.get_or_insert(binding);
        }
        self
    }

    /// Fails if a binding number was added twice
    pub fn build(self) -> Result<DescriptorSetLayout<'d, D>> {
        if let Some(binding) = self.duplicate {
            engine_error!("voxel::Descriptors", "Binding {} already in use", binding);
            return Err(Error::InvalidResource(format!("binding {} already in use", binding)));
        }
        let bindings: Vec<DescriptorBinding> = self.bindings.values().copied().collect();
        let layout = self.device.create_descriptor_set_layout(&bindings)?;
        Ok(DescriptorSetLayout { device: self.device, layout, bindings: self.bindings })
    }
}

pub struct DescriptorSetLayout<'d, D: GraphicsDevice> {
    device: &'d D,
    layout: D::DescriptorSetLayout,
    bindings: BTreeMap<u32, DescriptorBinding>,
}

impl<'d, D: GraphicsDevice> DescriptorSetLayout<'d, D> {
    pub fn builder(device: &'d D) -> DescriptorSetLayoutBuilder<'d, D> {
        DescriptorSetLayoutBuilder::new(device)
    }

    pub fn handle(&self) -> D::DescriptorSetLayout {
        self.layout
    }

    pub fn binding(&self, binding: u32) -> Option<&DescriptorBinding> {
        self.bindings.get(&binding)
    }
}

impl<D: GraphicsDevice> Drop for DescriptorSetLayout<'_, D> {
    fn drop(&mut self) {
        self.device.destroy_descriptor_set_layout(self.layout);
    }
}

// ============================================================================
// Pool
// ============================================================================

pub struct DescriptorPoolBuilder<'d, D: GraphicsDevice> {
    device: &'d D,
    pool_sizes: Vec<DescriptorPoolSize>,
    max_sets: u32,
    free_individual_sets: bool,
}

impl<'d, D: GraphicsDevice> DescriptorPoolBuilder<'d, D> {
    pub fn new(device: &'d D) -> Self {
        Self {
            device,
            pool_sizes: Vec::new(),
            max_sets: DEFAULT_MAX_SETS,
            free_individual_sets: false,
        }
    }

    pub fn add_pool_size(mut self, descriptor_type: DescriptorType, count: u32) -> Self {
        self.pool_sizes.push(DescriptorPoolSize { descriptor_type, count });
        self
    }

    pub fn max_sets(mut self, max_sets: u32) -> Self {
        self.max_sets = max_sets;
        self
    }

    /// Allow `DescriptorPool::free_sets`
    pub fn free_individual_sets(mut self, enabled: bool) -> Self {
        self.free_individual_sets = enabled;
        self
    }

    pub fn build(self) -> Result<DescriptorPool<'d, D>> {
        let pool = self.device.create_descriptor_pool(
            self.max_sets,
            &self.pool_sizes,
            self.free_individual_sets,
        )?;
        Ok(DescriptorPool {
            device: self.device,
            pool,
            free_individual_sets: self.free_individual_sets,
        })
    }
}

pub struct DescriptorPool<'d, D: GraphicsDevice> {
    device: &'d D,
    pool: D::DescriptorPool,
    free_individual_sets: bool,
}

impl<'d, D: GraphicsDevice> DescriptorPool<'d, D> {
    pub fn builder(device: &'d D) -> DescriptorPoolBuilder<'d, D> {
        DescriptorPoolBuilder::new(device)
    }

    pub fn handle(&self) -> D::DescriptorPool {
        self.pool
    }

    pub fn allocate(&self, layout: &DescriptorSetLayout<'_, D>) -> Result<D::DescriptorSet> {
        self.device.allocate_descriptor_set(self.pool, layout.handle())
    }

    pub fn free_sets(&self, sets: &[D::DescriptorSet]) -> Result<()> {
        if !self.free_individual_sets {
            return Err(Error::InvalidResource(
                "pool was not created with free_individual_sets".to_string(),
            ));
        }
        self.device.free_descriptor_sets(self.pool, sets)
    }

    /// Return every set allocated from this pool
    pub fn reset(&self) -> Result<()> {
        self.device.reset_descriptor_pool(self.pool)
    }
}

impl<D: GraphicsDevice> Drop for DescriptorPool<'_, D> {
    fn drop(&mut self) {
        self.device.destroy_descriptor_pool(self.pool);
    }
}

// ============================================================================
// Writer
// ============================================================================

/// Collects buffer writes for one set, checked against `layout`
pub struct DescriptorWriter<'a, 'd, D: GraphicsDevice> {
    layout: &'a DescriptorSetLayout<'d, D>,
    pool: &'a DescriptorPool<'d, D>,
    writes: Vec<DescriptorWrite<D::Buffer>>,
}

impl<'a, 'd, D: GraphicsDevice> DescriptorWriter<'a, 'd, D> {
    pub fn new(layout: &'a DescriptorSetLayout<'d, D>, pool: &'a DescriptorPool<'d, D>) -> Self {
        Self { layout, pool, writes: Vec::new() }
    }

    /// Queue a write of `info` to a single-descriptor `binding`
    pub fn write_buffer(mut self, binding: u32, info: DescriptorBufferInfo<D::Buffer>) -> Result<Self> {
        let description = self.layout.binding(binding).ok_or_else(|| {
            Error::InvalidResource(format!("layout does not contain binding {}", binding))
        })?;
        if description.count != 1 {
            return Err(Error::InvalidResource(format!(
                "binding {} expects {} descriptors",
                binding, description.count
            )));
        }
        self.writes.push(DescriptorWrite {
            binding,
            descriptor_type: description.descriptor_type,
            buffer_info: info,
        });
        Ok(self)
    }

    /// Allocate a set from the pool and apply the queued writes
    pub fn build(self) -> Result<D::DescriptorSet> {
        let set = self.pool.allocate(self.layout)?;
        self.overwrite(set);
        Ok(set)
    }

    /// Apply the queued writes to an existing set
    pub fn overwrite(&self, set: D::DescriptorSet) {
        self.pool.device.update_descriptor_set(set, &self.writes);
    }
}

#[cfg(test)]
#[path = "descriptors_tests.rs"]
mod tests;
