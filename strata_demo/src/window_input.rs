//! winit window feeding the frame loop
//!
//! The orchestrator owns the loop, so events are pumped once per frame with
//! `pump_app_events` instead of handing control to `EventLoop::run_app`.

use std::time::{Duration, Instant};
use strata_engine::glam::Vec3;
use strata_engine::strata::{EngineConfig, Error, Result};
use strata_engine::strata::scene::{CameraMatrices, FrameInput};
use strata_engine::{engine_debug, engine_error, engine_info};
use winit::application::ApplicationHandler;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::window::{Window, WindowId};

use crate::fps_camera::{FpsCamera, MoveKeys};

/// Where the camera starts, looking at the object rings
const CAMERA_START: Vec3 = Vec3::new(0.0, 6.0, 30.0);

/// Event-derived state, updated by the winit callbacks
#[derive(Debug, Default)]
pub(crate) struct InputState {
    pub keys: MoveKeys,
    cursor: Option<(f64, f64)>,
    pub mouse_delta: (f32, f32),
    pub close_requested: bool,
    pub size: (u32, u32),
    pending_resize: Option<(u32, u32)>,
}

impl InputState {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: (width, height),
            ..Default::default()
        }
    }

    pub fn on_resize(&mut self, width: u32, height: u32) {
        self.size = (width, height);
        self.pending_resize = Some((width, height));
    }

    /// Latest non-empty size since the last call (minimized windows report 0x0)
    pub fn take_resize(&mut self) -> Option<(u32, u32)> {
        match self.pending_resize {
            Some((w, h)) if w > 0 && h > 0 => self.pending_resize.take(),
            _ => None,
        }
    }

    pub fn on_cursor(&mut self, x: f64, y: f64) {
        if let Some((last_x, last_y)) = self.cursor {
            self.mouse_delta.0 += (x - last_x) as f32;
            self.mouse_delta.1 += (y - last_y) as f32;
        }
        self.cursor = Some((x, y));
    }

    pub fn on_key(&mut self, key: KeyCode, pressed: bool) {
        match key {
            KeyCode::KeyW => self.keys.forward = pressed,
            KeyCode::KeyS => self.keys.backward = pressed,
            KeyCode::KeyA => self.keys.left = pressed,
            KeyCode::KeyD => self.keys.right = pressed,
            KeyCode::Escape if pressed => self.close_requested = true,
            _ => {}
        }
    }

    pub fn aspect(&self) -> f32 {
        let (width, height) = self.size;
        if width == 0 || height == 0 {
            1.0
        } else {
            width as f32 / height as f32
        }
    }
}

impl ApplicationHandler for InputState {
    fn resumed(&mut self, _event_loop: &ActiveEventLoop) {}

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                engine_info!("strata::demo", "Close requested");
                self.close_requested = true;
            }
            WindowEvent::Resized(size) => {
                engine_debug!("strata::demo", "Window resized to {}x{}", size.width, size.height);
                self.on_resize(size.width, size.height);
            }
            WindowEvent::CursorMoved { position, .. } => self.on_cursor(position.x, position.y),
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key) = event.physical_key {
                    self.on_key(key, event.state == ElementState::Pressed);
                }
            }
            _ => {}
        }
    }
}

/// Window, event loop and camera implementing [`FrameInput`]
pub struct WindowInput {
    event_loop: EventLoop<()>,
    window: Window,
    state: InputState,
    camera: FpsCamera,
    last_frame: Instant,
    delta_seconds: f32,
}

impl WindowInput {
    #[allow(deprecated)]
    pub fn new(config: &EngineConfig) -> Result<Self> {
        let event_loop = EventLoop::new().map_err(|e| {
            engine_error!("strata::demo", "Failed to create event loop: {}", e);
            Error::InitializationFailed(format!("Failed to create event loop: {}", e))
        })?;

        let window_attrs = Window::default_attributes()
            .with_title(config.app_name.clone())
            .with_inner_size(winit::dpi::PhysicalSize::new(config.window_width, config.window_height));
        let window = event_loop.create_window(window_attrs).map_err(|e| {
            engine_error!("strata::demo", "Failed to create window: {}", e);
            Error::InitializationFailed(format!("Failed to create window: {}", e))
        })?;

        let size = window.inner_size();
        Ok(Self {
            event_loop,
            window,
            state: InputState::new(size.width, size.height),
            camera: FpsCamera::new(CAMERA_START, config.camera_fov_degrees),
            last_frame: Instant::now(),
            delta_seconds: 1.0 / 60.0,
        })
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    /// Current drawable size in pixels
    pub fn size(&self) -> (u32, u32) {
        self.state.size
    }
}

impl FrameInput for WindowInput {
    fn should_close(&self) -> bool {
        self.state.close_requested
    }

    fn poll(&mut self) {
        if let PumpStatus::Exit(code) = self
            .event_loop
            .pump_app_events(Some(Duration::ZERO), &mut self.state)
        {
            engine_info!("strata::demo", "Event loop exited with code {}", code);
            self.state.close_requested = true;
        }

        let now = Instant::now();
        self.delta_seconds = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;

        let (dx, dy) = std::mem::take(&mut self.state.mouse_delta);
        self.camera.look(dx, dy);
        self.camera.advance(self.state.keys, self.delta_seconds);
    }

    fn camera(&self) -> CameraMatrices {
        self.camera.matrices(self.state.aspect(), self.delta_seconds)
    }

    fn take_resize(&mut self) -> Option<(u32, u32)> {
        self.state.take_resize()
    }
}

#[cfg(test)]
#[path = "window_input_tests.rs"]
mod tests;
