//! Unit tests for fps_camera.rs

use strata_engine::glam::{Vec3, Vec4};
use super::*;

fn approx(a: Vec3, b: Vec3) -> bool {
    (a - b).length() < 1e-4
}

#[test]
fn test_default_camera_looks_down_negative_z() {
    let camera = FpsCamera::new(Vec3::ZERO, 90.0);
    assert!(approx(camera.front(), Vec3::NEG_Z));
}

#[test]
fn test_pitch_is_clamped() {
    let mut camera = FpsCamera::new(Vec3::ZERO, 90.0);
    camera.look(0.0, -10_000.0);
    assert_eq!(camera.pitch, PITCH_LIMIT);
    camera.look(0.0, 10_000.0);
    assert_eq!(camera.pitch, -PITCH_LIMIT);
}

#[test]
fn test_mouse_sensitivity() {
    let mut camera = FpsCamera::new(Vec3::ZERO, 90.0);
    camera.look(50.0, 0.0);
    assert!((camera.yaw - (-90.0 + 50.0 * MOUSE_SENSITIVITY)).abs() < 1e-5);
}

#[test]
fn test_forward_moves_at_camera_speed() {
    let mut camera = FpsCamera::new(Vec3::ZERO, 90.0);
    camera.advance(MoveKeys { forward: true, ..Default::default() }, 0.5);
    assert!(approx(camera.position, Vec3::new(0.0, 0.0, -CAMERA_SPEED * 0.5)));
}

#[test]
fn test_strafe_right() {
    let mut camera = FpsCamera::new(Vec3::ZERO, 90.0);
    camera.advance(MoveKeys { right: true, ..Default::default() }, 0.1);
    assert!(approx(camera.position, Vec3::new(CAMERA_SPEED * 0.1, 0.0, 0.0)));
}

#[test]
fn test_opposite_keys_cancel() {
    let mut camera = FpsCamera::new(Vec3::new(1.0, 2.0, 3.0), 90.0);
    let keys = MoveKeys { forward: true, backward: true, left: true, right: true };
    camera.advance(keys, 1.0);
    assert!(approx(camera.position, Vec3::new(1.0, 2.0, 3.0)));
}

#[test]
fn test_projection_flips_y() {
    let camera = FpsCamera::new(Vec3::ZERO, 90.0);
    let projection = camera.projection(1.0);

    // A point above the view axis lands in negative clip Y
    let clip = projection * Vec4::new(0.0, 1.0, -10.0, 1.0);
    assert!(clip.y / clip.w < 0.0);

    // Near plane maps to depth 0, far plane to depth 1
    let near = projection * Vec4::new(0.0, 0.0, -NEAR_PLANE, 1.0);
    let far = projection * Vec4::new(0.0, 0.0, -FAR_PLANE, 1.0);
    assert!((near.z / near.w).abs() < 1e-5);
    assert!((far.z / far.w - 1.0).abs() < 1e-4);
}

#[test]
fn test_matrices_bundle() {
    let camera = FpsCamera::new(Vec3::new(0.0, 0.0, 5.0), 90.0);
    let matrices = camera.matrices(16.0 / 9.0, 0.016);
    assert_eq!(matrices.view, camera.view());
    assert_eq!(matrices.projection, camera.projection(16.0 / 9.0));
    assert_eq!(matrices.delta_seconds, 0.016);
}
