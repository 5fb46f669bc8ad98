/*!
# Voxel Engine

Core of a small real-time Vulkan renderer: the GPU device abstraction,
the swapchain state machine, the frame coordinator and the render systems
that record draws for a scene of game objects and point lights.

## Architecture

- **GraphicsDevice**: backend-agnostic device trait (Vulkan lives in
  `voxel_engine_renderer_vulkan`)
- **Swapchain**: presentable images, depth buffers, render pass, framebuffers
  and per-frame synchronization
- **Renderer**: the begin / record / end frame protocol and swapchain recreation
- **Systems**: `SimpleRenderSystem` and `PointLightSystem` command recording
- **Scene**: game objects, transforms and the mesh arena

Every object that holds GPU resources borrows the device (`&'d D`), so the
device outlives them by construction.
*/

// Internal modules
mod engine;
mod error;
pub mod camera;
pub mod config;
pub mod graphics_device;
pub mod input;
pub mod log;
pub mod renderer;
pub mod scene;
pub mod swapchain;
pub mod systems;
pub mod utils;
pub mod window;

// Main voxel namespace module
pub mod voxel {
    // Error types
    pub use crate::error::{Error, Result};

    // Engine singleton (global logger)
    pub use crate::engine::Engine;

    pub use crate::config::{RendererConfig, MAX_FRAMES_IN_FLIGHT};

    // Logging sub-module (types only; the engine_* macros are exported at the crate root)
    pub mod log {
        pub use crate::log::{DefaultLogger, LogEntry, LogSeverity, Logger};
    }

    pub mod device {
        pub use crate::graphics_device::*;
    }

    pub mod render {
        pub use crate::renderer::*;
        pub use crate::swapchain::*;
        pub use crate::systems::*;
    }

    pub mod scene {
        pub use crate::camera::Camera;
        pub use crate::scene::*;
    }
}

// Re-export math library at crate root
pub use glam;
