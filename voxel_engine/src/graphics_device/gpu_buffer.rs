/// GpuBuffer - a device buffer holding `instance_count` aligned instances
///
/// Instances are laid out `alignment_size` bytes apart so each one can be
/// bound on its own (uniform buffers need `minUniformBufferOffsetAlignment`).
/// The buffer and its memory are released when the value is dropped.

use bytemuck::Pod;

use crate::error::{Error, Result};
use crate::graphics_device::descriptor::DescriptorBufferInfo;
use crate::graphics_device::graphics_device::GraphicsDevice;
use crate::graphics_device::memory::{BufferUsage, MemoryProperties};

/// Round `instance_size` up to a multiple of `min_offset_alignment`
///
/// `min_offset_alignment` must be zero or a power of two; zero means no alignment.
pub fn alignment(instance_size: u64, min_offset_alignment: u64) -> u64 {
    if min_offset_alignment > 0 {
        (instance_size + min_offset_alignment - 1) & !(min_offset_alignment - 1)
    } else {
        instance_size
    }
}

pub struct GpuBuffer<'d, D: GraphicsDevice> {
    device: &'d D,
    buffer: D::Buffer,
    memory: D::DeviceMemory,
    instance_size: u64,
    instance_count: u32,
    alignment_size: u64,
    buffer_size: u64,
    usage: BufferUsage,
    memory_properties: MemoryProperties,
}

impl<'d, D: GraphicsDevice> GpuBuffer<'d, D> {
    pub fn new(
        device: &'d D,
        instance_size: u64,
        instance_count: u32,
        usage: BufferUsage,
        memory_properties: MemoryProperties,
        min_offset_alignment: u64,
    ) -> Result<Self> {
        if instance_size == 0 || instance_count == 0 {
            return Err(Error::InvalidResource(format!(
                "buffer of {} instances of {} bytes",
                instance_count, instance_size
            )));
        }
        let alignment_size = alignment(instance_size, min_offset_alignment);
        let buffer_size = alignment_size * instance_count as u64;
        let (buffer, memory) = device.create_buffer(buffer_size, usage, memory_properties)?;

        Ok(Self {
            device,
            buffer,
            memory,
            instance_size,
            instance_count,
            alignment_size,
            buffer_size,
            usage,
            memory_properties,
        })
    }

    /// Copy `data` into the buffer at byte `offset`
    pub fn write_to_buffer(&self, data: &[u8], offset: u64) -> Result<()> {
        if offset + data.len() as u64 > self.buffer_size {
            return Err(Error::InvalidResource(format!(
                "write of {} bytes at offset {} overflows buffer of {} bytes",
                data.len(),
                offset,
                self.buffer_size
            )));
        }
        self.device.write_memory(self.memory, offset, data)
    }

    /// Write one instance; `data` must fit in `instance_size`
    pub fn write_to_index(&self, data: &[u8], index: u32) -> Result<()> {
        if index >= self.instance_count || data.len() as u64 > self.instance_size {
            return Err(Error::InvalidResource(format!(
                "instance {} ({} bytes) out of range ({} x {} bytes)",
                index,
                data.len(),
                self.instance_count,
                self.instance_size
            )));
        }
        self.write_to_buffer(data, self.index_offset(index))
    }

    /// Write one `Pod` value as instance `index`
    pub fn write_value<T: Pod>(&self, value: &T, index: u32) -> Result<()> {
        self.write_to_index(bytemuck::bytes_of(value), index)
    }

    /// Write a slice of `Pod` values starting at byte 0
    pub fn write_slice<T: Pod>(&self, values: &[T]) -> Result<()> {
        self.write_to_buffer(bytemuck::cast_slice(values), 0)
    }

    pub fn flush(&self, size: u64, offset: u64) -> Result<()> {
        self.device.flush_memory(self.memory, offset, size)
    }

    pub fn flush_all(&self) -> Result<()> {
        self.flush(self.buffer_size, 0)
    }

    pub fn flush_index(&self, index: u32) -> Result<()> {
        self.flush(self.alignment_size, self.index_offset(index))
    }

    pub fn descriptor_info(&self, size: u64, offset: u64) -> DescriptorBufferInfo<D::Buffer> {
        DescriptorBufferInfo { buffer: self.buffer, offset, range: size }
    }

    /// Descriptor covering instance `index` only
    pub fn descriptor_info_for_index(&self, index: u32) -> DescriptorBufferInfo<D::Buffer> {
        self.descriptor_info(self.alignment_size, self.index_offset(index))
    }

    fn index_offset(&self, index: u32) -> u64 {
        index as u64 * self.alignment_size
    }

    pub fn buffer(&self) -> D::Buffer {
        self.buffer
    }

    pub fn memory(&self) -> D::DeviceMemory {
        self.memory
    }

    pub fn instance_size(&self) -> u64 {
        self.instance_size
    }

    pub fn instance_count(&self) -> u32 {
        self.instance_count
    }

    pub fn alignment_size(&self) -> u64 {
        self.alignment_size
    }

    pub fn buffer_size(&self) -> u64 {
        self.buffer_size
    }

    pub fn usage(&self) -> BufferUsage {
        self.usage
    }

    pub fn memory_properties(&self) -> MemoryProperties {
        self.memory_properties
    }
}

impl<D: GraphicsDevice> Drop for GpuBuffer<'_, D> {
    fn drop(&mut self) {
        self.device.destroy_buffer(self.buffer, self.memory);
    }
}

#[cfg(test)]
#[path = "gpu_buffer_tests.rs"]
mod tests;
