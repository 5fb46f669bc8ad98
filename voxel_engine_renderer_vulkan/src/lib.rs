/*!
# Voxel Engine - Vulkan Backend

`GraphicsDevice` implementation on top of `ash`.

`VulkanDevice` owns the instance, the window surface, the logical device and
its command pool. The frame core in `voxel_engine` (swapchain, renderer,
render systems) borrows it for its whole lifetime.

```no_run
use voxel_engine::voxel::RendererConfig;
use voxel_engine::window::DesktopWindow;
use voxel_engine_renderer_vulkan::VulkanDevice;

# fn main() -> voxel_engine::voxel::Result<()> {
let window = DesktopWindow::new("Voxel", 800, 600)?;
let device = VulkanDevice::new(&window, &RendererConfig::default())?;
# Ok(())
# }
```
*/

mod debug;
mod vulkan_device;
mod vulkan_format;
mod vulkan_graphics_device;
mod vulkan_shader;

pub use debug::{get_validation_stats, print_validation_stats_report, ValidationStats};
pub use vulkan_device::{QueueFamilyIndices, VulkanDevice};
pub use vulkan_shader::{load_spirv, spirv_from_bytes};
