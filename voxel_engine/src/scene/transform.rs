/// Transform - translation, uniform scale and Euler rotation of a game object
///
/// Rotation is in radians and applied as Tait-Bryan angles in Y (yaw),
/// X (pitch), Z (roll) order.

use glam::{EulerRot, Mat4, Quat, Vec3};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub scale: f32,
    pub rotation: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            scale: 1.0,
            rotation: Vec3::ZERO,
        }
    }
}

impl Transform {
    pub fn from_translation(translation: Vec3) -> Self {
        Self { translation, ..Self::default() }
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_rotation(mut self, rotation: Vec3) -> Self {
        self.rotation = rotation;
        self
    }

    fn quat(&self) -> Quat {
        Quat::from_euler(EulerRot::YXZ, self.rotation.y, self.rotation.x, self.rotation.z)
    }

    /// Model matrix: translate * rotate * scale
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(Vec3::splat(self.scale), self.quat(), self.translation)
    }
}

#[cfg(test)]
#[path = "transform_tests.rs"]
mod tests;
