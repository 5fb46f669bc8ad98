//! Image formats and format-support queries

use bitflags::bitflags;

use crate::error::{Error, Result};
use crate::engine_error;

/// Pixel / vertex attribute formats used by the engine
///
/// Formats reported by the driver that the engine has no name for are kept
/// as `Other(raw)` so they can be passed back unchanged.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Undefined,
    B8G8R8A8_UNORM,
    B8G8R8A8_SRGB,
    R8G8B8A8_UNORM,
    R8G8B8A8_SRGB,
    R32G32_SFLOAT,
    R32G32B32_SFLOAT,
    R32G32B32A32_SFLOAT,
    D16_UNORM,
    D32_SFLOAT,
    D32_SFLOAT_S8_UINT,
    D24_UNORM_S8_UINT,
    Other(i32),
}

impl Format {
    pub fn is_depth(self) -> bool {
        matches!(
            self,
            Format::D16_UNORM
                | Format::D32_SFLOAT
                | Format::D32_SFLOAT_S8_UINT
                | Format::D24_UNORM_S8_UINT
        )
    }

    pub fn has_stencil(self) -> bool {
        matches!(self, Format::D32_SFLOAT_S8_UINT | Format::D24_UNORM_S8_UINT)
    }
}

/// Surface color space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorSpace {
    SrgbNonlinear,
    Other(i32),
}

/// A (format, color space) pair supported by the presentation surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceFormat {
    pub format: Format,
    pub color_space: ColorSpace,
}

/// Image tiling mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageTiling {
    Linear,
    Optimal,
}

bitflags! {
    /// Format capabilities reported per tiling mode
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FormatFeatures: u32 {
        const SAMPLED_IMAGE = 1 << 0;
        const COLOR_ATTACHMENT = 1 << 1;
        const DEPTH_STENCIL_ATTACHMENT = 1 << 2;
        const TRANSFER_SRC = 1 << 3;
        const TRANSFER_DST = 1 << 4;
    }
}

/// Features a format supports under each tiling mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FormatProperties {
    pub linear_tiling_features: FormatFeatures,
    pub optimal_tiling_features: FormatFeatures,
}

/// Depth formats in order of preference
pub const DEPTH_FORMAT_CANDIDATES: [Format; 3] = [
    Format::D32_SFLOAT,
    Format::D32_SFLOAT_S8_UINT,
    Format::D24_UNORM_S8_UINT,
];

/// Pick the first candidate whose properties contain `features` under `tiling`
///
/// `properties` is queried once per candidate, in order.
pub fn find_supported_format<F>(
    candidates: &[Format],
    tiling: ImageTiling,
    features: FormatFeatures,
    mut properties: F,
) -> Result<Format>
where
    F: FnMut(Format) -> FormatProperties,
{
    for &format in candidates {
        let props = properties(format);
        let supported = match tiling {
            ImageTiling::Linear => props.linear_tiling_features,
            ImageTiling::Optimal => props.optimal_tiling_features,
        };
        if supported.contains(features) {
            return Ok(format);
        }
    }

    engine_error!(
        "voxel::Device",
        "No supported format among {:?} (tiling: {:?}, features: {:?})",
        candidates,
        tiling,
        features
    );
    Err(Error::UnsupportedFormat(format!(
        "none of {:?} supports {:?} with {:?} tiling",
        candidates, features, tiling
    )))
}
