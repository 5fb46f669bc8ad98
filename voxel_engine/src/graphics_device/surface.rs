//! Presentation surface types and swapchain parameter selection

use crate::engine_error;
use crate::error::{Error, Result};
use crate::graphics_device::format::{ColorSpace, Format, SurfaceFormat};

/// Size of a 2D surface in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Extent2D {
    pub width: u32,
    pub height: u32,
}

impl Extent2D {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// True when either side is zero (minimized window)
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

/// Presentation modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PresentMode {
    Immediate,
    Mailbox,
    /// Always available
    Fifo,
    FifoRelaxed,
}

/// Surface limits reported by the presentation engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceCapabilities {
    pub min_image_count: u32,
    /// 0 means no upper limit
    pub max_image_count: u32,
    /// `None` when the surface size is determined by the swapchain extent
    pub current_extent: Option<Extent2D>,
    pub min_image_extent: Extent2D,
    pub max_image_extent: Extent2D,
}

/// Parameters for creating the driver-side swapchain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapchainDesc {
    pub surface_format: SurfaceFormat,
    pub present_mode: PresentMode,
    pub extent: Extent2D,
    pub min_image_count: u32,
}

/// Result of a successful present (or of a present the surface rejected as stale)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapchainStatus {
    Success,
    /// The image was presented but the swapchain no longer matches the surface
    Suboptimal,
    /// The swapchain can no longer present to the surface
    OutOfDate,
}

/// Result of asking the presentation engine for the next image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireOutcome {
    Acquired { image_index: u32, suboptimal: bool },
    OutOfDate,
}

impl AcquireOutcome {
    pub fn status(&self) -> SwapchainStatus {
        match self {
            AcquireOutcome::Acquired { suboptimal: false, .. } => SwapchainStatus::Success,
            AcquireOutcome::Acquired { suboptimal: true, .. } => SwapchainStatus::Suboptimal,
            AcquireOutcome::OutOfDate => SwapchainStatus::OutOfDate,
        }
    }

    pub fn image_index(&self) -> Option<u32> {
        match self {
            AcquireOutcome::Acquired { image_index, .. } => Some(*image_index),
            AcquireOutcome::OutOfDate => None,
        }
    }
}

// ============================================================================
// Selection
// ============================================================================

/// Prefer 8-bit BGRA UNORM in the sRGB-nonlinear color space, else the first reported format
pub fn choose_surface_format(available: &[SurfaceFormat]) -> Result<SurfaceFormat> {
    let preferred = SurfaceFormat {
        format: Format::B8G8R8A8_UNORM,
        color_space: ColorSpace::SrgbNonlinear,
    };
    if available.contains(&preferred) {
        return Ok(preferred);
    }
    available.first().copied().ok_or_else(|| {
        engine_error!("voxel::Swapchain", "Surface reports no formats");
        Error::InitializationFailed("Surface reports no formats".to_string())
    })
}

/// Use `preferred` when the surface supports it, otherwise FIFO
pub fn choose_present_mode(available: &[PresentMode], preferred: PresentMode) -> PresentMode {
    if available.contains(&preferred) {
        preferred
    } else {
        PresentMode::Fifo
    }
}

/// The surface's current extent, or the window extent clamped to the surface limits
pub fn choose_extent(capabilities: &SurfaceCapabilities, window_extent: Extent2D) -> Extent2D {
    match capabilities.current_extent {
        Some(extent) => extent,
        None => Extent2D {
            width: window_extent.width.clamp(
                capabilities.min_image_extent.width,
                capabilities.max_image_extent.width,
            ),
            height: window_extent.height.clamp(
                capabilities.min_image_extent.height,
                capabilities.max_image_extent.height,
            ),
        },
    }
}

/// One image more than the minimum, capped by the maximum when there is one
pub fn choose_image_count(capabilities: &SurfaceCapabilities) -> u32 {
    let count = capabilities.min_image_count + 1;
    if capabilities.max_image_count > 0 {
        count.min(capabilities.max_image_count)
    } else {
        count
    }
}

#[cfg(test)]
#[path = "surface_tests.rs"]
mod tests;
