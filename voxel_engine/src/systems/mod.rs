//! Render systems
//!
//! Each system owns one graphics pipeline and records its draws into the
//! swapchain render pass of the current frame.

mod point_light_system;
mod simple_render_system;
mod system_pipeline;

pub use point_light_system::{PointLightPushConstants, PointLightSystem};
pub use simple_render_system::{SimplePushConstants, SimpleRenderSystem};
pub use system_pipeline::{ShaderSet, SystemPipeline};
