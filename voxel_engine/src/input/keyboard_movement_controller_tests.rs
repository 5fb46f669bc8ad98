use glam::Vec3;
use rustc_hash::FxHashSet;
use super::*;

const EPS: f32 = 1e-5;

#[derive(Default)]
struct HeldKeys(FxHashSet<KeyCode>);

impl HeldKeys {
    fn with(keys: &[KeyCode]) -> Self {
        Self(keys.iter().copied().collect())
    }
}

impl KeyState for HeldKeys {
    fn is_key_pressed(&self, key: KeyCode) -> bool {
        self.0.contains(&key)
    }
}

// ============================================================================
// Movement
// ============================================================================

#[test]
fn test_no_keys_leaves_transform_unchanged() {
    let controller = KeyboardMovementController::new();
    let mut transform = Transform::from_translation(Vec3::new(1.0, 2.0, 3.0));
    controller.move_in_plane_xz(&HeldKeys::default(), 0.016, &mut transform);
    assert_eq!(transform, Transform::from_translation(Vec3::new(1.0, 2.0, 3.0)));
}

#[test]
fn test_forward_moves_along_yaw() {
    let controller = KeyboardMovementController::new();
    let mut transform = Transform::default();
    controller.move_in_plane_xz(&HeldKeys::with(&[KeyCode::KeyW]), 1.0, &mut transform);
    assert!(transform.translation.abs_diff_eq(Vec3::new(0.0, 0.0, 3.0), EPS));

    let mut turned = Transform::default().with_rotation(Vec3::new(0.0, std::f32::consts::FRAC_PI_2, 0.0));
    controller.move_in_plane_xz(&HeldKeys::with(&[KeyCode::KeyW]), 1.0, &mut turned);
    assert!(turned.translation.abs_diff_eq(Vec3::new(3.0, 0.0, 0.0), EPS));
}

#[test]
fn test_diagonal_movement_is_normalized() {
    let controller = KeyboardMovementController::new();
    let mut transform = Transform::default();
    controller.move_in_plane_xz(&HeldKeys::with(&[KeyCode::KeyW, KeyCode::KeyD]), 0.5, &mut transform);

    assert!((transform.translation.length() - 1.5).abs() < EPS);
    assert!(transform.translation.x > 0.0 && transform.translation.z > 0.0);
}

#[test]
fn test_up_moves_along_world_y() {
    let controller = KeyboardMovementController::new();
    let mut transform = Transform::default();
    controller.move_in_plane_xz(&HeldKeys::with(&[KeyCode::KeyE]), 1.0, &mut transform);
    assert!(transform.translation.abs_diff_eq(Vec3::new(0.0, 3.0, 0.0), EPS));
}

#[test]
fn test_opposite_keys_cancel() {
    let controller = KeyboardMovementController::new();
    let mut transform = Transform::default();
    controller.move_in_plane_xz(&HeldKeys::with(&[KeyCode::KeyW, KeyCode::KeyS]), 1.0, &mut transform);
    assert_eq!(transform.translation, Vec3::ZERO);
}

// ============================================================================
// Looking
// ============================================================================

#[test]
fn test_pitch_is_clamped() {
    let controller = KeyboardMovementController::new();
    let mut transform = Transform::default().with_rotation(Vec3::new(1.4, 0.0, 0.0));
    controller.move_in_plane_xz(&HeldKeys::with(&[KeyCode::ArrowUp]), 1.0, &mut transform);
    assert_eq!(transform.rotation.x, MAX_PITCH);

    controller.move_in_plane_xz(&HeldKeys::with(&[KeyCode::ArrowDown]), 10.0, &mut transform);
    assert_eq!(transform.rotation.x, -MAX_PITCH);
}

#[test]
fn test_yaw_wraps_into_full_turn() {
    let controller = KeyboardMovementController::new();
    let mut transform = Transform::default().with_rotation(Vec3::new(0.0, 6.2, 0.0));
    controller.move_in_plane_xz(&HeldKeys::with(&[KeyCode::ArrowRight]), 0.1, &mut transform);
    assert!((transform.rotation.y - (6.35 - std::f32::consts::TAU)).abs() < 1e-4);

    let mut transform = Transform::default();
    controller.move_in_plane_xz(&HeldKeys::with(&[KeyCode::ArrowLeft]), 0.1, &mut transform);
    assert!((transform.rotation.y - (std::f32::consts::TAU - 0.15)).abs() < 1e-4);
}

#[test]
fn test_custom_mappings() {
    let controller = KeyboardMovementController {
        keys: KeyMappings { move_forward: KeyCode::KeyI, ..KeyMappings::default() },
        ..KeyboardMovementController::default()
    };
    let mut transform = Transform::default();
    controller.move_in_plane_xz(&HeldKeys::with(&[KeyCode::KeyW]), 1.0, &mut transform);
    assert_eq!(transform.translation, Vec3::ZERO);
    controller.move_in_plane_xz(&HeldKeys::with(&[KeyCode::KeyI]), 1.0, &mut transform);
    assert!(transform.translation.z > 0.0);
}
