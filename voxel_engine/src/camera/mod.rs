//! Camera module - projection and view matrices in Vulkan clip space.

mod camera;

pub use camera::Camera;
