//! Unit tests for window_input.rs
//!
//! Event handling is tested through `InputState`; no window is created.

use winit::keyboard::KeyCode;
use super::*;

#[test]
fn test_resize_is_reported_once() {
    let mut state = InputState::new(800, 600);
    assert_eq!(state.take_resize(), None);

    state.on_resize(1024, 768);
    assert_eq!(state.size, (1024, 768));
    assert_eq!(state.take_resize(), Some((1024, 768)));
    assert_eq!(state.take_resize(), None);
}

#[test]
fn test_minimized_resize_is_held_back() {
    let mut state = InputState::new(800, 600);
    state.on_resize(0, 0);
    assert_eq!(state.take_resize(), None);

    state.on_resize(640, 480);
    assert_eq!(state.take_resize(), Some((640, 480)));
}

#[test]
fn test_aspect_handles_empty_size() {
    assert_eq!(InputState::new(1920, 1080).aspect(), 1920.0 / 1080.0);
    assert_eq!(InputState::new(0, 0).aspect(), 1.0);
}

#[test]
fn test_first_cursor_position_has_no_delta() {
    let mut state = InputState::new(800, 600);
    state.on_cursor(100.0, 100.0);
    assert_eq!(state.mouse_delta, (0.0, 0.0));

    state.on_cursor(110.0, 95.0);
    state.on_cursor(115.0, 90.0);
    assert_eq!(state.mouse_delta, (15.0, -10.0));
}

#[test]
fn test_movement_keys() {
    let mut state = InputState::new(800, 600);
    state.on_key(KeyCode::KeyW, true);
    state.on_key(KeyCode::KeyD, true);
    assert!(state.keys.forward && state.keys.right);

    state.on_key(KeyCode::KeyW, false);
    assert!(!state.keys.forward);
    assert!(!state.close_requested);
}

#[test]
fn test_escape_requests_close() {
    let mut state = InputState::new(800, 600);
    state.on_key(KeyCode::Escape, false);
    assert!(!state.close_requested);
    state.on_key(KeyCode::Escape, true);
    assert!(state.close_requested);
}
