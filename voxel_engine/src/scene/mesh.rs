/// Mesh - device-local vertex buffer and optional index buffer
///
/// Geometry is uploaded once through a host-visible staging buffer and a
/// single-time copy; the staging buffer is released before `new` returns.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

use crate::error::{Error, Result};
use crate::graphics_device::{
    BufferUsage, Format, GpuBuffer, GraphicsDevice, IndexType, MemoryProperties, VertexAttribute,
    VertexBinding,
};

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct Vertex {
    pub position: Vec3,
    pub color: Vec3,
}

impl Vertex {
    pub fn new(position: Vec3, color: Vec3) -> Self {
        Self { position, color }
    }

    pub fn bindings() -> Vec<VertexBinding> {
        vec![VertexBinding {
            binding: 0,
            stride: std::mem::size_of::<Vertex>() as u32,
        }]
    }

    /// location 0 = position, location 1 = color
    pub fn attributes() -> Vec<VertexAttribute> {
        vec![
            VertexAttribute {
                location: 0,
                binding: 0,
                format: Format::R32G32B32_SFLOAT,
                offset: std::mem::offset_of!(Vertex, position) as u32,
            },
            VertexAttribute {
                location: 1,
                binding: 0,
                format: Format::R32G32B32_SFLOAT,
                offset: std::mem::offset_of!(Vertex, color) as u32,
            },
        ]
    }
}

pub struct Mesh<'d, D: GraphicsDevice> {
    device: &'d D,
    vertex_buffer: GpuBuffer<'d, D>,
    vertex_count: u32,
    index_buffer: Option<GpuBuffer<'d, D>>,
    index_count: u32,
}

impl<'d, D: GraphicsDevice> Mesh<'d, D> {
    /// Upload `vertices` and, when `indices` is not empty, an index buffer
    pub fn new(device: &'d D, vertices: &[Vertex], indices: &[u32]) -> Result<Self> {
        if vertices.len() < 3 {
            return Err(Error::InvalidResource(format!(
                "mesh needs at least 3 vertices, got {}",
                vertices.len()
            )));
        }
        let vertex_buffer = upload(device, vertices, BufferUsage::VERTEX)?;
        let index_buffer = if indices.is_empty() {
            None
        } else {
            Some(upload(device, indices, BufferUsage::INDEX)?)
        };

        Ok(Self {
            device,
            vertex_buffer,
            vertex_count: vertices.len() as u32,
            index_buffer,
            index_count: indices.len() as u32,
        })
    }

    /// Bind the vertex buffer at binding 0 and the index buffer if there is one
    pub fn bind(&self, command_buffer: D::CommandBuffer) {
        self.device
            .cmd_bind_vertex_buffers(command_buffer, 0, &[self.vertex_buffer.buffer()], &[0]);
        if let Some(index_buffer) = &self.index_buffer {
            self.device
                .cmd_bind_index_buffer(command_buffer, index_buffer.buffer(), 0, IndexType::U32);
        }
    }

    /// Indexed draw when the mesh has indices, plain draw otherwise
    pub fn draw(&self, command_buffer: D::CommandBuffer) {
        if self.index_buffer.is_some() {
            self.device
                .cmd_draw_indexed(command_buffer, self.index_count, 1, 0, 0, 0);
        } else {
            self.device.cmd_draw(command_buffer, self.vertex_count, 1, 0, 0);
        }
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    pub fn has_index_buffer(&self) -> bool {
        self.index_buffer.is_some()
    }

    pub fn vertex_buffer(&self) -> D::Buffer {
        self.vertex_buffer.buffer()
    }

    pub fn index_buffer(&self) -> Option<D::Buffer> {
        self.index_buffer.as_ref().map(GpuBuffer::buffer)
    }
}

fn upload<'d, D: GraphicsDevice, T: Pod>(
    device: &'d D,
    data: &[T],
    usage: BufferUsage,
) -> Result<GpuBuffer<'d, D>> {
    let instance_size = std::mem::size_of::<T>() as u64;
    let instance_count = data.len() as u32;

    let staging = GpuBuffer::new(
        device,
        instance_size,
        instance_count,
        BufferUsage::TRANSFER_SRC,
        MemoryProperties::HOST_VISIBLE | MemoryProperties::HOST_COHERENT,
        0,
    )?;
    staging.write_slice(data)?;

    let buffer = GpuBuffer::new(
        device,
        instance_size,
        instance_count,
        usage | BufferUsage::TRANSFER_DST,
        MemoryProperties::DEVICE_LOCAL,
        0,
    )?;
    device.copy_buffer(staging.buffer(), buffer.buffer(), buffer.buffer_size())?;
    Ok(buffer)
}

#[cfg(test)]
#[path = "mesh_tests.rs"]
mod tests;
