/// Per-frame data handed to render systems

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec4};

use crate::camera::Camera;
use crate::graphics_device::GraphicsDevice;

/// Capacity of the point-light array in `GlobalUbo`
pub const MAX_LIGHTS: usize = 10;

/// Everything a render system needs to record one frame
pub struct FrameInfo<'a, D: GraphicsDevice> {
    /// Frame-in-flight slot; selects the per-frame uniform buffer and descriptor set
    pub frame_index: usize,
    /// Seconds since the previous frame
    pub frame_time: f32,
    pub command_buffer: D::CommandBuffer,
    pub camera: &'a Camera,
    pub global_descriptor_set: D::DescriptorSet,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct PointLight {
    /// xyz = world position, w unused
    pub position: Vec4,
    /// rgb = color, w = intensity
    pub color: Vec4,
}

/// Uniform block bound at set 0, binding 0 (std140)
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GlobalUbo {
    pub projection: Mat4,
    pub view: Mat4,
    pub inverse_view: Mat4,
    /// rgb = ambient color, w = intensity
    pub ambient_light_color: Vec4,
    pub point_lights: [PointLight; MAX_LIGHTS],
    pub num_lights: u32,
    pub _padding: [u32; 3],
}

impl Default for GlobalUbo {
    fn default() -> Self {
        Self {
            projection: Mat4::IDENTITY,
            view: Mat4::IDENTITY,
            inverse_view: Mat4::IDENTITY,
            ambient_light_color: Vec4::new(1.0, 1.0, 1.0, 0.02),
            point_lights: [PointLight::default(); MAX_LIGHTS],
            num_lights: 0,
            _padding: [0; 3],
        }
    }
}

impl GlobalUbo {
    /// Copy the camera matrices into the block
    pub fn set_camera(&mut self, camera: &Camera) {
        self.projection = *camera.projection_matrix();
        self.view = *camera.view_matrix();
        self.inverse_view = *camera.inverse_view_matrix();
    }
}
