//! Keyboard input for moving the viewer

mod keyboard_movement_controller;

pub use keyboard_movement_controller::{KeyMappings, KeyState, KeyboardMovementController, MAX_PITCH};
pub use winit::keyboard::KeyCode;
