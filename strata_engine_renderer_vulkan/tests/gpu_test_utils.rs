#![allow(dead_code)]
//! GPU test utilities - one hidden window shared by every GPU test
//!
//! winit refuses to create a second event loop in the same process, so the
//! window is created once and its event loop is leaked to keep it valid.

use std::sync::OnceLock;
use strata_engine::strata::EngineConfig;
use winit::event_loop::EventLoop;
use winit::window::Window;

// Platform-specific imports for EventLoop threading
#[cfg(target_os = "windows")]
use winit::platform::windows::EventLoopBuilderExtWindows;
#[cfg(target_os = "linux")]
use winit::platform::x11::EventLoopBuilderExtX11;

/// Global Window (kept alive for the whole test process)
static GPU_WINDOW: OnceLock<Window> = OnceLock::new();

pub const TEST_WIDTH: u32 = 800;
pub const TEST_HEIGHT: u32 = 600;

/// Shared hidden test window
pub fn test_window() -> &'static Window {
    GPU_WINDOW.get_or_init(|| {
        let (window, event_loop) = create_test_window();

        // Leak EventLoop intentionally to keep Window valid
        std::mem::forget(event_loop);
        window
    })
}

/// Config sized to the test window, validation off
pub fn test_config() -> EngineConfig {
    EngineConfig {
        window_width: TEST_WIDTH,
        window_height: TEST_HEIGHT,
        worker_count: 2,
        enable_validation: false,
        vsync: true,
        ..EngineConfig::default()
    }
}

/// Create a hidden window; test threads are not the main thread, hence any_thread
#[allow(deprecated)]
fn create_test_window() -> (Window, EventLoop<()>) {
    let event_loop = {
        #[cfg(any(target_os = "windows", target_os = "linux"))]
        {
            EventLoop::builder().with_any_thread(true).build().unwrap()
        }
        #[cfg(not(any(target_os = "windows", target_os = "linux")))]
        {
            EventLoop::builder().build().unwrap()
        }
    };

    let window_attrs = Window::default_attributes()
        .with_title("Strata GPU Test Window")
        .with_inner_size(winit::dpi::PhysicalSize::new(TEST_WIDTH, TEST_HEIGHT))
        .with_visible(false); // Hidden window for tests

    let window = event_loop.create_window(window_attrs).unwrap();
    (window, event_loop)
}
