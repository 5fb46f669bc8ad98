/// Descriptor value types

use crate::graphics_device::command::ShaderStages;

/// Descriptor kinds the engine binds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescriptorType {
    UniformBuffer,
    StorageBuffer,
    CombinedImageSampler,
}

/// One binding of a descriptor set layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescriptorBinding {
    pub binding: u32,
    pub descriptor_type: DescriptorType,
    pub stages: ShaderStages,
    pub count: u32,
}

/// Capacity of one descriptor type in a pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescriptorPoolSize {
    pub descriptor_type: DescriptorType,
    pub count: u32,
}

/// Buffer range bound to a descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescriptorBufferInfo<B> {
    pub buffer: B,
    pub offset: u64,
    pub range: u64,
}

/// A pending buffer write into a descriptor set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescriptorWrite<B> {
    pub binding: u32,
    pub descriptor_type: DescriptorType,
    pub buffer_info: DescriptorBufferInfo<B>,
}
