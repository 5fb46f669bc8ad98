/// Camera - projection and view matrices for Vulkan clip space.
///
/// Clip space has +Y pointing down and depth in 0..1. The view basis is
/// right-handed with +Z forward: `set_view_yxz` with zero angles looks down +Z.

use glam::{Mat4, Vec3, Vec4};

#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    projection_matrix: Mat4,
    view_matrix: Mat4,
    inverse_view_matrix: Mat4,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

impl Camera {
    /// Identity projection and view
    pub fn new() -> Self {
        Self {
            projection_matrix: Mat4::IDENTITY,
            view_matrix: Mat4::IDENTITY,
            inverse_view_matrix: Mat4::IDENTITY,
        }
    }

    // ===== PROJECTION =====

    pub fn set_orthographic_projection(
        &mut self,
        left: f32,
        right: f32,
        top: f32,
        bottom: f32,
        near: f32,
        far: f32,
    ) {
        let mut m = Mat4::IDENTITY;
        m.x_axis.x = 2.0 / (right - left);
        m.y_axis.y = 2.0 / (bottom - top);
        m.z_axis.z = 1.0 / (far - near);
        m.w_axis.x = -(right + left) / (right - left);
        m.w_axis.y = -(bottom + top) / (bottom - top);
        m.w_axis.z = -near / (far - near);
        self.projection_matrix = m;
    }

    /// Perspective projection; `fov_y` in radians, `aspect` = width / height
    pub fn set_perspective_projection(&mut self, fov_y: f32, aspect: f32, near: f32, far: f32) {
        debug_assert!(aspect.abs() > f32::EPSILON, "Perspective aspect ratio cannot be zero");
        let tan_half_fov_y = (fov_y / 2.0).tan();
        self.projection_matrix = Mat4::from_cols(
            Vec4::new(1.0 / (aspect * tan_half_fov_y), 0.0, 0.0, 0.0),
            Vec4::new(0.0, -1.0 / tan_half_fov_y, 0.0, 0.0),
            Vec4::new(0.0, 0.0, far / (far - near), 1.0),
            Vec4::new(0.0, 0.0, -(far * near) / (far - near), 0.0),
        );
    }

    // ===== VIEW =====

    /// Look from `position` along `direction`
    pub fn set_view_direction(&mut self, position: Vec3, direction: Vec3, up: Vec3) {
        let w = direction.normalize();
        let u = up.cross(w).normalize();
        let v = w.cross(u);
        self.set_view_basis(position, u, v, w);
    }

    /// Look from `position` at `target`; they must differ
    pub fn set_view_target(&mut self, position: Vec3, target: Vec3, up: Vec3) {
        self.set_view_direction(position, target - position, up);
    }

    /// View from Euler angles: `rotation.y` is yaw, `rotation.x` is pitch (radians)
    pub fn set_view_yxz(&mut self, position: Vec3, rotation: Vec3) {
        let (yaw, pitch) = (rotation.y, rotation.x);
        let forward = Vec3::new(yaw.sin() * pitch.cos(), pitch.sin(), yaw.cos() * pitch.cos()).normalize();
        let right = Vec3::Y.cross(forward).normalize();
        let up = forward.cross(right);
        self.set_view_basis(position, right, up, forward);
    }

    fn set_view_basis(&mut self, position: Vec3, u: Vec3, v: Vec3, w: Vec3) {
        self.view_matrix = Mat4::from_cols(
            Vec4::new(u.x, v.x, w.x, 0.0),
            Vec4::new(u.y, v.y, w.y, 0.0),
            Vec4::new(u.z, v.z, w.z, 0.0),
            Vec4::new(-u.dot(position), -v.dot(position), -w.dot(position), 1.0),
        );
        // Orthonormal basis: the inverse is the basis itself plus the position
        self.inverse_view_matrix = Mat4::from_cols(
            u.extend(0.0),
            v.extend(0.0),
            w.extend(0.0),
            position.extend(1.0),
        );
    }

    // ===== GETTERS =====

    pub fn projection_matrix(&self) -> &Mat4 {
        &self.projection_matrix
    }

    pub fn view_matrix(&self) -> &Mat4 {
        &self.view_matrix
    }

    /// Camera-to-world transform
    pub fn inverse_view_matrix(&self) -> &Mat4 {
        &self.inverse_view_matrix
    }

    /// World-space camera position
    pub fn position(&self) -> Vec3 {
        self.inverse_view_matrix.w_axis.truncate()
    }

    /// Combined view-projection matrix (projection * view).
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix * self.view_matrix
    }
}

#[cfg(test)]
#[path = "camera_tests.rs"]
mod tests;
