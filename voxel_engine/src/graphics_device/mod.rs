//! Backend-agnostic GPU device abstraction
//!
//! The `GraphicsDevice` trait and the plain value types exchanged with it.
//! Backends live in separate crates; tests use `MockGraphicsDevice`.

pub mod command;
pub mod descriptor;
pub mod descriptors;
pub mod format;
pub mod gpu_buffer;
pub mod graphics_device;
pub mod memory;
pub mod pipeline;
pub mod surface;

#[cfg(test)]
pub mod mock_graphics_device;

pub use command::{ClearValue, ImageAspect, ImageDesc, ImageUsage, IndexType, Rect2D, ShaderStages, Viewport};
pub use descriptor::{DescriptorBinding, DescriptorBufferInfo, DescriptorPoolSize, DescriptorType, DescriptorWrite};
pub use descriptors::{DescriptorPool, DescriptorPoolBuilder, DescriptorSetLayout, DescriptorSetLayoutBuilder, DescriptorWriter};
pub use format::{
    ColorSpace, Format, FormatFeatures, FormatProperties, ImageTiling, SurfaceFormat,
    DEPTH_FORMAT_CANDIDATES,
};
pub use gpu_buffer::GpuBuffer;
pub use graphics_device::{GpuHandle, GraphicsDevice};
pub use memory::{BufferUsage, MemoryProperties, MemoryType};
pub use pipeline::{
    CompareOp, CullMode, FrontFace, PipelineConfig, PipelineDesc, PolygonMode, PrimitiveTopology,
    PushConstantRange, VertexAttribute, VertexBinding,
};
pub use surface::{
    AcquireOutcome, Extent2D, PresentMode, SurfaceCapabilities, SwapchainDesc, SwapchainStatus,
};
