/// Command-recording and image value types

use bitflags::bitflags;

use crate::graphics_device::format::{Format, ImageTiling};
use crate::graphics_device::surface::Extent2D;

/// Viewport dimensions and depth range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

impl Viewport {
    /// Full-extent viewport with depth range 0..1
    pub fn from_extent(extent: Extent2D) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: extent.width as f32,
            height: extent.height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        }
    }
}

/// 2D rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect2D {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect2D {
    pub fn from_extent(extent: Extent2D) -> Self {
        Self { x: 0, y: 0, width: extent.width, height: extent.height }
    }
}

/// Clear value for one render pass attachment
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClearValue {
    Color([f32; 4]),
    DepthStencil { depth: f32, stencil: u32 },
}

/// Index buffer element type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexType {
    U16,
    U32,
}

bitflags! {
    /// Shader stages that can read push constants or descriptors
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ShaderStages: u32 {
        const VERTEX = 1 << 0;
        const FRAGMENT = 1 << 1;
    }
}

bitflags! {
    /// How an image will be used
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ImageUsage: u32 {
        const TRANSFER_SRC = 1 << 0;
        const TRANSFER_DST = 1 << 1;
        const SAMPLED = 1 << 2;
        const COLOR_ATTACHMENT = 1 << 3;
        const DEPTH_STENCIL_ATTACHMENT = 1 << 4;
    }
}

/// Which aspect an image view exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageAspect {
    Color,
    Depth,
}

/// Parameters for a 2D image with its own memory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageDesc {
    pub extent: Extent2D,
    pub format: Format,
    pub tiling: ImageTiling,
    pub usage: ImageUsage,
    pub mip_levels: u32,
    pub array_layers: u32,
}

impl ImageDesc {
    /// Single-mip depth attachment with optimal tiling
    pub fn depth_attachment(extent: Extent2D, format: Format) -> Self {
        Self {
            extent,
            format,
            tiling: ImageTiling::Optimal,
            usage: ImageUsage::DEPTH_STENCIL_ATTACHMENT,
            mip_levels: 1,
            array_layers: 1,
        }
    }
}
