//! Integration tests for object placement and push-constant generation
//!
//! No GPU required.
//!
//! Run with: cargo test --test scene_integration_tests

use strata_engine::glam::{Mat4, Vec3, Vec4};
use strata_engine::strata::scene::{
    CameraMatrices, MeshData, ObjectSpawner, Vertex, PUSH_CONSTANT_SIZE,
};

fn camera() -> CameraMatrices {
    CameraMatrices {
        view: Mat4::look_at_rh(Vec3::new(0.0, 5.0, 25.0), Vec3::new(0.0, 0.0, -20.0), Vec3::Y),
        projection: Mat4::perspective_rh(90f32.to_radians(), 16.0 / 9.0, 1.0, 1000.0),
        delta_seconds: 1.0 / 60.0,
    }
}

// ============================================================================
// SPAWN + UPDATE
// ============================================================================

#[test]
fn test_integration_same_seed_same_frames() {
    let camera = camera();
    let mut a = ObjectSpawner::new(99).spawn_for_worker(0, 8);
    let mut b = ObjectSpawner::new(99).spawn_for_worker(0, 8);

    for _ in 0..30 {
        for (x, y) in a.iter_mut().zip(b.iter_mut()) {
            x.update(camera.delta_seconds, &camera);
            y.update(camera.delta_seconds, &camera);
        }
    }

    for (x, y) in a.iter().zip(b.iter()) {
        assert_eq!(x.push_constants(), y.push_constants());
    }
}

#[test]
fn test_integration_push_constants_match_camera_and_model() {
    let camera = camera();
    let mut object = ObjectSpawner::new(1).spawn(0);
    object.update(camera.delta_seconds, &camera);

    let data = object.push_constants();
    assert_eq!(data.as_bytes().len(), PUSH_CONSTANT_SIZE);
    assert_eq!(data.color, object.color.to_array());

    let expected = camera.view_projection() * object.model();
    assert!(data.mvp_matrix().abs_diff_eq(expected, 1e-4));

    // The object's origin lands where the model translation says
    let origin = data.mvp_matrix() * Vec4::W;
    let expected_origin = camera.view_projection() * object.position.extend(1.0);
    assert!(origin.abs_diff_eq(expected_origin, 1e-3));
}

#[test]
fn test_integration_workers_get_disjoint_positions() {
    let mut spawner = ObjectSpawner::new(5);
    let first = spawner.spawn_for_worker(0, 4);
    let second = spawner.spawn_for_worker(1, 4);

    for a in &first {
        for b in &second {
            assert!(a.base_position.distance(b.base_position) > 0.1);
        }
    }
}

#[test]
fn test_integration_cube_mesh_layout() {
    let mesh = MeshData::cube();
    assert_eq!(mesh.vertex_bytes().len(), mesh.vertices.len() * Vertex::STRIDE as usize);
    assert_eq!(mesh.index_bytes().len(), mesh.index_count() as usize * 4);
    assert_eq!(mesh.index_count() % 3, 0);
}
