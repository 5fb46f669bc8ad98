/// Conversions between engine value types and their `ash::vk` counterparts
///
/// Pure functions with no device access, so they are unit tested without a GPU.

use std::time::Duration;

use ash::vk;
use voxel_engine::voxel::device::{
    BufferUsage, ColorSpace, CompareOp, CullMode, DescriptorType, Extent2D, Format,
    FormatFeatures, FrontFace, ImageTiling, ImageUsage, IndexType, MemoryProperties, PolygonMode,
    PresentMode, PrimitiveTopology, ShaderStages, SurfaceCapabilities, SurfaceFormat,
};
use voxel_engine::voxel::Error;
use voxel_engine::{engine_err, engine_error};

// ============================================================================
// Formats
// ============================================================================

pub(crate) fn format_to_vk(format: Format) -> vk::Format {
    match format {
        Format::Undefined => vk::Format::UNDEFINED,
        Format::B8G8R8A8_UNORM => vk::Format::B8G8R8A8_UNORM,
        Format::B8G8R8A8_SRGB => vk::Format::B8G8R8A8_SRGB,
        Format::R8G8B8A8_UNORM => vk::Format::R8G8B8A8_UNORM,
        Format::R8G8B8A8_SRGB => vk::Format::R8G8B8A8_SRGB,
        Format::R32G32_SFLOAT => vk::Format::R32G32_SFLOAT,
        Format::R32G32B32_SFLOAT => vk::Format::R32G32B32_SFLOAT,
        Format::R32G32B32A32_SFLOAT => vk::Format::R32G32B32A32_SFLOAT,
        Format::D16_UNORM => vk::Format::D16_UNORM,
        Format::D32_SFLOAT => vk::Format::D32_SFLOAT,
        Format::D32_SFLOAT_S8_UINT => vk::Format::D32_SFLOAT_S8_UINT,
        Format::D24_UNORM_S8_UINT => vk::Format::D24_UNORM_S8_UINT,
        Format::Other(raw) => vk::Format::from_raw(raw),
    }
}

pub(crate) fn format_from_vk(format: vk::Format) -> Format {
    match format {
        vk::Format::UNDEFINED => Format::Undefined,
        vk::Format::B8G8R8A8_UNORM => Format::B8G8R8A8_UNORM,
        vk::Format::B8G8R8A8_SRGB => Format::B8G8R8A8_SRGB,
        vk::Format::R8G8B8A8_UNORM => Format::R8G8B8A8_UNORM,
        vk::Format::R8G8B8A8_SRGB => Format::R8G8B8A8_SRGB,
        vk::Format::R32G32_SFLOAT => Format::R32G32_SFLOAT,
        vk::Format::R32G32B32_SFLOAT => Format::R32G32B32_SFLOAT,
        vk::Format::R32G32B32A32_SFLOAT => Format::R32G32B32A32_SFLOAT,
        vk::Format::D16_UNORM => Format::D16_UNORM,
        vk::Format::D32_SFLOAT => Format::D32_SFLOAT,
        vk::Format::D32_SFLOAT_S8_UINT => Format::D32_SFLOAT_S8_UINT,
        vk::Format::D24_UNORM_S8_UINT => Format::D24_UNORM_S8_UINT,
        other => Format::Other(other.as_raw()),
    }
}

pub(crate) fn color_space_to_vk(color_space: ColorSpace) -> vk::ColorSpaceKHR {
    match color_space {
        ColorSpace::SrgbNonlinear => vk::ColorSpaceKHR::SRGB_NONLINEAR,
        ColorSpace::Other(raw) => vk::ColorSpaceKHR::from_raw(raw),
    }
}

pub(crate) fn surface_format_from_vk(format: vk::SurfaceFormatKHR) -> SurfaceFormat {
    let color_space = match format.color_space {
        vk::ColorSpaceKHR::SRGB_NONLINEAR => ColorSpace::SrgbNonlinear,
        other => ColorSpace::Other(other.as_raw()),
    };
    SurfaceFormat { format: format_from_vk(format.format), color_space }
}

pub(crate) fn format_features_from_vk(flags: vk::FormatFeatureFlags) -> FormatFeatures {
    let mut features = FormatFeatures::empty();
    let pairs = [
        (vk::FormatFeatureFlags::SAMPLED_IMAGE, FormatFeatures::SAMPLED_IMAGE),
        (vk::FormatFeatureFlags::COLOR_ATTACHMENT, FormatFeatures::COLOR_ATTACHMENT),
        (vk::FormatFeatureFlags::DEPTH_STENCIL_ATTACHMENT, FormatFeatures::DEPTH_STENCIL_ATTACHMENT),
        (vk::FormatFeatureFlags::TRANSFER_SRC, FormatFeatures::TRANSFER_SRC),
        (vk::FormatFeatureFlags::TRANSFER_DST, FormatFeatures::TRANSFER_DST),
    ];
    for (vk_flag, feature) in pairs {
        if flags.contains(vk_flag) {
            features |= feature;
        }
    }
    features
}

pub(crate) fn image_tiling_to_vk(tiling: ImageTiling) -> vk::ImageTiling {
    match tiling {
        ImageTiling::Linear => vk::ImageTiling::LINEAR,
        ImageTiling::Optimal => vk::ImageTiling::OPTIMAL,
    }
}

// ============================================================================
// Presentation
// ============================================================================

pub(crate) fn present_mode_to_vk(mode: PresentMode) -> vk::PresentModeKHR {
    match mode {
        PresentMode::Immediate => vk::PresentModeKHR::IMMEDIATE,
        PresentMode::Mailbox => vk::PresentModeKHR::MAILBOX,
        PresentMode::Fifo => vk::PresentModeKHR::FIFO,
        PresentMode::FifoRelaxed => vk::PresentModeKHR::FIFO_RELAXED,
    }
}

/// `None` for modes the engine never selects (shared refresh modes)
pub(crate) fn present_mode_from_vk(mode: vk::PresentModeKHR) -> Option<PresentMode> {
    match mode {
        vk::PresentModeKHR::IMMEDIATE => Some(PresentMode::Immediate),
        vk::PresentModeKHR::MAILBOX => Some(PresentMode::Mailbox),
        vk::PresentModeKHR::FIFO => Some(PresentMode::Fifo),
        vk::PresentModeKHR::FIFO_RELAXED => Some(PresentMode::FifoRelaxed),
        _ => None,
    }
}

pub(crate) fn extent_to_vk(extent: Extent2D) -> vk::Extent2D {
    vk::Extent2D { width: extent.width, height: extent.height }
}

fn extent_from_vk(extent: vk::Extent2D) -> Extent2D {
    Extent2D::new(extent.width, extent.height)
}

/// A current extent of `u32::MAX` means the window decides, reported as `None`
pub(crate) fn surface_capabilities_from_vk(caps: &vk::SurfaceCapabilitiesKHR) -> SurfaceCapabilities {
    let current_extent = if caps.current_extent.width == u32::MAX {
        None
    } else {
        Some(extent_from_vk(caps.current_extent))
    };
    SurfaceCapabilities {
        min_image_count: caps.min_image_count,
        max_image_count: caps.max_image_count,
        current_extent,
        min_image_extent: extent_from_vk(caps.min_image_extent),
        max_image_extent: extent_from_vk(caps.max_image_extent),
    }
}

/// Vulkan timeouts are nanoseconds, `u64::MAX` meaning forever
pub(crate) fn timeout_to_nanos(timeout: Option<Duration>) -> u64 {
    match timeout {
        Some(duration) => u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX),
        None => u64::MAX,
    }
}

/// Engine error for a failed Vulkan call, logged under `what`
pub(crate) fn error_from_vk(what: &str, result: vk::Result) -> Error {
    match result {
        vk::Result::ERROR_OUT_OF_HOST_MEMORY | vk::Result::ERROR_OUT_OF_DEVICE_MEMORY => {
            engine_error!("voxel::vulkan", "{}: {:?}", what, result);
            Error::OutOfMemory
        }
        vk::Result::TIMEOUT | vk::Result::NOT_READY => {
            engine_error!("voxel::vulkan", "{}: timed out", what);
            Error::Timeout(what.to_string())
        }
        _ => engine_err!("voxel::vulkan", "{}: {:?}", what, result),
    }
}

// ============================================================================
// Memory and usage flags
// ============================================================================

pub(crate) fn memory_properties_from_vk(flags: vk::MemoryPropertyFlags) -> MemoryProperties {
    let mut properties = MemoryProperties::empty();
    let pairs = [
        (vk::MemoryPropertyFlags::DEVICE_LOCAL, MemoryProperties::DEVICE_LOCAL),
        (vk::MemoryPropertyFlags::HOST_VISIBLE, MemoryProperties::HOST_VISIBLE),
        (vk::MemoryPropertyFlags::HOST_COHERENT, MemoryProperties::HOST_COHERENT),
        (vk::MemoryPropertyFlags::HOST_CACHED, MemoryProperties::HOST_CACHED),
        (vk::MemoryPropertyFlags::LAZILY_ALLOCATED, MemoryProperties::LAZILY_ALLOCATED),
    ];
    for (vk_flag, property) in pairs {
        if flags.contains(vk_flag) {
            properties |= property;
        }
    }
    properties
}

pub(crate) fn buffer_usage_to_vk(usage: BufferUsage) -> vk::BufferUsageFlags {
    let mut flags = vk::BufferUsageFlags::empty();
    let pairs = [
        (BufferUsage::TRANSFER_SRC, vk::BufferUsageFlags::TRANSFER_SRC),
        (BufferUsage::TRANSFER_DST, vk::BufferUsageFlags::TRANSFER_DST),
        (BufferUsage::UNIFORM, vk::BufferUsageFlags::UNIFORM_BUFFER),
        (BufferUsage::STORAGE, vk::BufferUsageFlags::STORAGE_BUFFER),
        (BufferUsage::INDEX, vk::BufferUsageFlags::INDEX_BUFFER),
        (BufferUsage::VERTEX, vk::BufferUsageFlags::VERTEX_BUFFER),
    ];
    for (usage_flag, vk_flag) in pairs {
        if usage.contains(usage_flag) {
            flags |= vk_flag;
        }
    }
    flags
}

pub(crate) fn image_usage_to_vk(usage: ImageUsage) -> vk::ImageUsageFlags {
    let mut flags = vk::ImageUsageFlags::empty();
    let pairs = [
        (ImageUsage::TRANSFER_SRC, vk::ImageUsageFlags::TRANSFER_SRC),
        (ImageUsage::TRANSFER_DST, vk::ImageUsageFlags::TRANSFER_DST),
        (ImageUsage::SAMPLED, vk::ImageUsageFlags::SAMPLED),
        (ImageUsage::COLOR_ATTACHMENT, vk::ImageUsageFlags::COLOR_ATTACHMENT),
        (ImageUsage::DEPTH_STENCIL_ATTACHMENT, vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT),
    ];
    for (usage_flag, vk_flag) in pairs {
        if usage.contains(usage_flag) {
            flags |= vk_flag;
        }
    }
    flags
}

pub(crate) fn shader_stages_to_vk(stages: ShaderStages) -> vk::ShaderStageFlags {
    let mut flags = vk::ShaderStageFlags::empty();
    if stages.contains(ShaderStages::VERTEX) {
        flags |= vk::ShaderStageFlags::VERTEX;
    }
    if stages.contains(ShaderStages::FRAGMENT) {
        flags |= vk::ShaderStageFlags::FRAGMENT;
    }
    flags
}

pub(crate) fn descriptor_type_to_vk(descriptor_type: DescriptorType) -> vk::DescriptorType {
    match descriptor_type {
        DescriptorType::UniformBuffer => vk::DescriptorType::UNIFORM_BUFFER,
        DescriptorType::StorageBuffer => vk::DescriptorType::STORAGE_BUFFER,
        DescriptorType::CombinedImageSampler => vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
    }
}

pub(crate) fn index_type_to_vk(index_type: IndexType) -> vk::IndexType {
    match index_type {
        IndexType::U16 => vk::IndexType::UINT16,
        IndexType::U32 => vk::IndexType::UINT32,
    }
}

// ============================================================================
// Pipeline state
// ============================================================================

pub(crate) fn topology_to_vk(topology: PrimitiveTopology) -> vk::PrimitiveTopology {
    match topology {
        PrimitiveTopology::PointList => vk::PrimitiveTopology::POINT_LIST,
        PrimitiveTopology::LineList => vk::PrimitiveTopology::LINE_LIST,
        PrimitiveTopology::TriangleList => vk::PrimitiveTopology::TRIANGLE_LIST,
        PrimitiveTopology::TriangleStrip => vk::PrimitiveTopology::TRIANGLE_STRIP,
    }
}

pub(crate) fn polygon_mode_to_vk(mode: PolygonMode) -> vk::PolygonMode {
    match mode {
        PolygonMode::Fill => vk::PolygonMode::FILL,
        PolygonMode::Line => vk::PolygonMode::LINE,
    }
}

pub(crate) fn cull_mode_to_vk(mode: CullMode) -> vk::CullModeFlags {
    match mode {
        CullMode::None => vk::CullModeFlags::NONE,
        CullMode::Front => vk::CullModeFlags::FRONT,
        CullMode::Back => vk::CullModeFlags::BACK,
    }
}

pub(crate) fn front_face_to_vk(face: FrontFace) -> vk::FrontFace {
    match face {
        FrontFace::Clockwise => vk::FrontFace::CLOCKWISE,
        FrontFace::CounterClockwise => vk::FrontFace::COUNTER_CLOCKWISE,
    }
}

pub(crate) fn compare_op_to_vk(op: CompareOp) -> vk::CompareOp {
    match op {
        CompareOp::Never => vk::CompareOp::NEVER,
        CompareOp::Less => vk::CompareOp::LESS,
        CompareOp::LessOrEqual => vk::CompareOp::LESS_OR_EQUAL,
        CompareOp::Always => vk::CompareOp::ALWAYS,
    }
}

#[cfg(test)]
#[path = "vulkan_format_tests.rs"]
mod tests;
