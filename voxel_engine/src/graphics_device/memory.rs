//! Memory types, buffer usage and memory-type selection

use bitflags::bitflags;

use crate::engine_error;
use crate::error::{Error, Result};

bitflags! {
    /// Memory property flags (mirror of the Vulkan memory property bits the engine uses)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MemoryProperties: u32 {
        const DEVICE_LOCAL = 1 << 0;
        const HOST_VISIBLE = 1 << 1;
        const HOST_COHERENT = 1 << 2;
        const HOST_CACHED = 1 << 3;
        const LAZILY_ALLOCATED = 1 << 4;
    }
}

bitflags! {
    /// How a buffer will be used
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct BufferUsage: u32 {
        const TRANSFER_SRC = 1 << 0;
        const TRANSFER_DST = 1 << 1;
        const UNIFORM = 1 << 2;
        const STORAGE = 1 << 3;
        const INDEX = 1 << 4;
        const VERTEX = 1 << 5;
    }
}

/// One entry of the device's memory type table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryType {
    pub properties: MemoryProperties,
    pub heap_index: u32,
}

/// First memory type allowed by `type_filter` whose flags contain `properties`
///
/// Bit `i` of `type_filter` allows `memory_types[i]`.
pub fn find_memory_type(
    memory_types: &[MemoryType],
    type_filter: u32,
    properties: MemoryProperties,
) -> Result<u32> {
    memory_types
        .iter()
        .enumerate()
        .take(32)
        .find(|(i, memory_type)| {
            type_filter & (1 << i) != 0 && memory_type.properties.contains(properties)
        })
        .map(|(i, _)| i as u32)
        .ok_or_else(|| {
            engine_error!(
                "voxel::Device",
                "Failed to find a suitable memory type (filter: {:#b}, properties: {:?})",
                type_filter,
                properties
            );
            Error::NoCompatibleMemoryType { type_filter, properties }
        })
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
