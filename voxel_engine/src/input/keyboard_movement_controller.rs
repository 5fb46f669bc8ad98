/// KeyboardMovementController - free-flying movement of a transform from held keys
///
/// Moves in the XZ plane relative to the current yaw; E/Q move along world
/// up. Arrow keys turn: left/right change yaw, up/down change pitch.

use glam::Vec3;
use winit::keyboard::KeyCode;

use crate::scene::Transform;
use crate::window::DesktopWindow;

/// Pitch limit in radians (about 85 degrees)
pub const MAX_PITCH: f32 = 1.5;

/// Source of "is this key held" queries
pub trait KeyState {
    fn is_key_pressed(&self, key: KeyCode) -> bool;
}

impl KeyState for DesktopWindow {
    fn is_key_pressed(&self, key: KeyCode) -> bool {
        DesktopWindow::is_key_pressed(self, key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyMappings {
    pub move_left: KeyCode,
    pub move_right: KeyCode,
    pub move_forward: KeyCode,
    pub move_backward: KeyCode,
    pub move_up: KeyCode,
    pub move_down: KeyCode,
    pub look_left: KeyCode,
    pub look_right: KeyCode,
    pub look_up: KeyCode,
    pub look_down: KeyCode,
}

impl Default for KeyMappings {
    fn default() -> Self {
        Self {
            move_left: KeyCode::KeyA,
            move_right: KeyCode::KeyD,
            move_forward: KeyCode::KeyW,
            move_backward: KeyCode::KeyS,
            move_up: KeyCode::KeyE,
            move_down: KeyCode::KeyQ,
            look_left: KeyCode::ArrowLeft,
            look_right: KeyCode::ArrowRight,
            look_up: KeyCode::ArrowUp,
            look_down: KeyCode::ArrowDown,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeyboardMovementController {
    pub keys: KeyMappings,
    /// Units per second
    pub move_speed: f32,
    /// Radians per second
    pub look_speed: f32,
}

impl Default for KeyboardMovementController {
    fn default() -> Self {
        Self {
            keys: KeyMappings::default(),
            move_speed: 3.0,
            look_speed: 1.5,
        }
    }
}

impl KeyboardMovementController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one frame of input to `transform`
    pub fn move_in_plane_xz<K: KeyState + ?Sized>(&self, keys: &K, dt: f32, transform: &mut Transform) {
        let axis = |positive: KeyCode, negative: KeyCode| {
            keys.is_key_pressed(positive) as i32 as f32 - keys.is_key_pressed(negative) as i32 as f32
        };

        let rotate = Vec3::new(
            axis(self.keys.look_up, self.keys.look_down),
            axis(self.keys.look_right, self.keys.look_left),
            0.0,
        );
        if rotate.length_squared() > f32::EPSILON {
            transform.rotation += rotate.normalize() * self.look_speed * dt;
        }

        transform.rotation.x = transform.rotation.x.clamp(-MAX_PITCH, MAX_PITCH);
        transform.rotation.y = transform.rotation.y.rem_euclid(std::f32::consts::TAU);

        let yaw = transform.rotation.y;
        let forward = Vec3::new(yaw.sin(), 0.0, yaw.cos());
        let right = Vec3::Y.cross(forward).normalize();

        let movement = forward * axis(self.keys.move_forward, self.keys.move_backward)
            + right * axis(self.keys.move_right, self.keys.move_left)
            + Vec3::Y * axis(self.keys.move_up, self.keys.move_down);
        if movement.length_squared() > f32::EPSILON {
            transform.translation += movement.normalize() * self.move_speed * dt;
        }
    }
}

#[cfg(test)]
#[path = "keyboard_movement_controller_tests.rs"]
mod tests;
