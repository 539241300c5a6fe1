//! Unit tests for object.rs and spawner.rs

use crate::scene::{
    wrap, CameraMatrices, DrawableObject, ObjectSpawner, PushConstantData, ANIMATION_PHASE_STEP,
    PUSH_CONSTANT_SIZE,
};
use glam::{Mat4, Vec3};

fn camera() -> CameraMatrices {
    CameraMatrices {
        view: Mat4::look_at_rh(Vec3::new(0.0, 2.0, 10.0), Vec3::ZERO, Vec3::Y),
        projection: Mat4::perspective_rh(90f32.to_radians(), 16.0 / 9.0, 1.0, 1000.0),
        delta_seconds: 1.0 / 60.0,
    }
}

// ============================================================================
// PUSH CONSTANT LAYOUT
// ============================================================================

#[test]
fn test_push_constant_layout_is_76_bytes() {
    assert_eq!(std::mem::size_of::<PushConstantData>(), PUSH_CONSTANT_SIZE);

    let data = PushConstantData { mvp: [1.0; 16], color: [0.1, 0.2, 0.3] };
    let bytes = data.as_bytes();
    assert_eq!(bytes.len(), 76);
    // Color starts right after the 64-byte matrix
    assert_eq!(&bytes[64..68], &0.1f32.to_ne_bytes());
}

// ============================================================================
// WRAPPING
// ============================================================================

#[test]
fn test_wrap_keeps_values_in_range() {
    assert_eq!(wrap(1.0, 1.0), 0.0);
    assert_eq!(wrap(360.0, 360.0), 0.0);
    assert!((wrap(370.0, 360.0) - 10.0).abs() < 1e-4);
    assert!((wrap(-10.0, 360.0) - 350.0).abs() < 1e-4);
    assert!(wrap(-1e-9, 1.0) < 1.0);
}

#[test]
fn test_delta_t_starting_at_one_never_reaches_one() {
    let camera = camera();
    let mut object = DrawableObject::new(Vec3::ZERO, Vec3::ONE, 7);
    object.delta_t = 1.0;
    object.bob_amplitude = 1.0;

    let mut wrapped_once = false;
    let mut previous = object.delta_t;
    for _ in 0..(3.0 / ANIMATION_PHASE_STEP) as usize {
        object.update(camera.delta_seconds, &camera);
        assert!(object.delta_t >= 0.0 && object.delta_t < 1.0, "delta_t = {}", object.delta_t);
        if object.delta_t < previous {
            wrapped_once = true;
        }
        previous = object.delta_t;
    }
    assert!(wrapped_once);
}

#[test]
fn test_rotation_advances_by_speed_and_wraps() {
    let camera = camera();
    let mut object = DrawableObject::new(Vec3::ZERO, Vec3::ONE, 1);
    object.rotation.y = 350.0;
    object.rotation_speed = 30.0;

    object.update(0.5, &camera);
    assert!((object.rotation.y - 5.0).abs() < 1e-3);
}

// ============================================================================
// MVP ORDER
// ============================================================================

#[test]
fn test_push_constants_hold_projection_view_model() {
    let camera = camera();
    let model = Mat4::from_translation(Vec3::new(3.0, -1.0, 2.0)) * Mat4::from_rotation_y(0.7);

    let mut object = DrawableObject::new(Vec3::ZERO, Vec3::new(0.5, 0.25, 1.0), 3);
    object.set_model(model);
    object.write_push_constants(&camera);

    let expected = camera.projection * camera.view * model;
    assert_eq!(object.push_constants().mvp, expected.to_cols_array());
    assert_eq!(object.push_constants().color, [0.5, 0.25, 1.0]);

    // Any other order gives a different matrix for this input
    let wrong = model * camera.view * camera.projection;
    assert_ne!(object.push_constants().mvp_matrix(), wrong);
}

#[test]
fn test_update_uses_its_own_model_matrix() {
    let camera = camera();
    let mut object = DrawableObject::new(Vec3::new(1.0, 0.0, -5.0), Vec3::ONE, 11);
    object.rotation_speed = 45.0;
    object.bob_amplitude = 0.5;

    object.update(camera.delta_seconds, &camera);

    let expected = camera.projection * camera.view * object.model();
    assert_eq!(object.push_constants().mvp, expected.to_cols_array());
}

#[test]
fn test_static_object_model_is_translate_and_scale() {
    let mut object = DrawableObject::new(Vec3::new(2.0, 0.0, 0.0), Vec3::ONE, 5);
    object.scale = Vec3::splat(2.0);
    object.delta_t = 1.0 - ANIMATION_PHASE_STEP;

    // Phase wraps to exactly 0, rotation speed is 0, no bob, no jitter
    object.update(1.0, &CameraMatrices::default());

    let expected = Mat4::from_translation(Vec3::new(2.0, 0.0, 0.0)) * Mat4::from_scale(Vec3::splat(2.0));
    assert!(object.model().abs_diff_eq(expected, 1e-4));
}

#[test]
fn test_jitter_stays_within_range() {
    let camera = camera();
    let mut object = DrawableObject::new(Vec3::new(0.0, 4.0, 0.0), Vec3::ONE, 99);
    object.bob_amplitude = 1.0;
    object.jitter_range = 0.1;

    for _ in 0..500 {
        object.update(camera.delta_seconds, &camera);
        let offset = object.position.y - object.base_position.y;
        assert!(offset.abs() <= 1.1 + 1e-4);
        assert_eq!(object.position.x, 0.0);
    }
}

// ============================================================================
// SPAWNER
// ============================================================================

#[test]
fn test_spawner_is_deterministic() {
    let a = ObjectSpawner::new(42).spawn_for_worker(1, 3);
    let b = ObjectSpawner::new(42).spawn_for_worker(1, 3);

    assert_eq!(a.len(), 3);
    for (x, y) in a.iter().zip(b.iter()) {
        assert_eq!(x.base_position, y.base_position);
        assert_eq!(x.color, y.color);
        assert_eq!(x.rotation_speed, y.rotation_speed);
    }
}

#[test]
fn test_spawned_objects_are_valid() {
    let mut spawner = ObjectSpawner::new(7);
    for worker in 0..4 {
        for object in spawner.spawn_for_worker(worker, 5) {
            assert!(object.delta_t >= 0.0 && object.delta_t < 1.0);
            assert!(object.rotation_dir == 1.0 || object.rotation_dir == -1.0);
            assert!(object.visible);
            assert!(object.scale.x > 0.0);
        }
    }
}
