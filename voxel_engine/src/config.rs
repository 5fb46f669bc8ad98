/// RendererConfig - settings read by the device, swapchain and renderer

use std::time::Duration;

use crate::graphics_device::PresentMode;

/// Frame slots that can be recorded while the GPU works on earlier ones
pub const MAX_FRAMES_IN_FLIGHT: usize = 2;

#[derive(Debug, Clone, PartialEq)]
pub struct RendererConfig {
    /// Application name reported to the driver
    pub app_name: String,
    pub app_version: (u32, u32, u32),
    /// Enable validation layers (also requires the backend's validation feature)
    pub enable_validation: bool,
    /// Used when the surface supports it, otherwise FIFO
    pub preferred_present_mode: PresentMode,
    /// Upper bound for every fence wait and image acquire; `None` waits forever
    pub fence_timeout: Option<Duration>,
    /// Swapchain render pass clear color (RGBA)
    pub clear_color: [f32; 4],
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            app_name: "Voxel Application".to_string(),
            app_version: (0, 1, 0),
            enable_validation: cfg!(debug_assertions),
            preferred_present_mode: PresentMode::Mailbox,
            fence_timeout: None,
            clear_color: [0.1, 0.1, 0.1, 1.0],
        }
    }
}

impl RendererConfig {
    pub fn with_app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = name.into();
        self
    }

    pub fn with_fence_timeout(mut self, timeout: Duration) -> Self {
        self.fence_timeout = Some(timeout);
        self
    }

    pub fn with_present_mode(mut self, mode: PresentMode) -> Self {
        self.preferred_present_mode = mode;
        self
    }
}
