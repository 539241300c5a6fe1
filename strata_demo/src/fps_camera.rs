//! First-person camera steered by WASD and the mouse

use strata_engine::glam::{Mat4, Vec3};
use strata_engine::strata::scene::CameraMatrices;

/// Units per second
pub const CAMERA_SPEED: f32 = 50.0;
/// Degrees per pixel of mouse motion
pub const MOUSE_SENSITIVITY: f32 = 0.2;
/// Pitch limit in degrees, keeps the view from flipping over
pub const PITCH_LIMIT: f32 = 89.0;
pub const NEAR_PLANE: f32 = 1.0;
pub const FAR_PLANE: f32 = 1000.0;

/// Movement keys held during a frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoveKeys {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
}

#[derive(Debug, Clone)]
pub struct FpsCamera {
    pub position: Vec3,
    /// Degrees, -90 looks down -Z
    pub yaw: f32,
    /// Degrees, clamped to `±PITCH_LIMIT`
    pub pitch: f32,
    pub fov_degrees: f32,
}

impl FpsCamera {
    pub fn new(position: Vec3, fov_degrees: f32) -> Self {
        Self {
            position,
            yaw: -90.0,
            pitch: 0.0,
            fov_degrees,
        }
    }

    /// Unit view direction
    pub fn front(&self) -> Vec3 {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        Vec3::new(yaw.cos() * pitch.cos(), pitch.sin(), yaw.sin() * pitch.cos()).normalize()
    }

    /// Apply a mouse offset in pixels (`dy` positive = cursor moved down)
    pub fn look(&mut self, dx: f32, dy: f32) {
        self.yaw += dx * MOUSE_SENSITIVITY;
        self.pitch = (self.pitch - dy * MOUSE_SENSITIVITY).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    /// Move along the view direction and its horizontal right vector
    pub fn advance(&mut self, keys: MoveKeys, delta_seconds: f32) {
        let step = CAMERA_SPEED * delta_seconds;
        let front = self.front();
        let right = front.cross(Vec3::Y).normalize();

        if keys.forward {
            self.position += front * step;
        }
        if keys.backward {
            self.position -= front * step;
        }
        if keys.left {
            self.position -= right * step;
        }
        if keys.right {
            self.position += right * step;
        }
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.front(), Vec3::Y)
    }

    /// Zero-to-one depth perspective with Y flipped for Vulkan clip space
    pub fn projection(&self, aspect: f32) -> Mat4 {
        let mut projection = Mat4::perspective_rh(
            self.fov_degrees.to_radians(),
            aspect,
            NEAR_PLANE,
            FAR_PLANE,
        );
        projection.y_axis.y *= -1.0;
        projection
    }

    pub fn matrices(&self, aspect: f32, delta_seconds: f32) -> CameraMatrices {
        CameraMatrices {
            view: self.view(),
            projection: self.projection(aspect),
            delta_seconds,
        }
    }
}

#[cfg(test)]
#[path = "fps_camera_tests.rs"]
mod tests;
