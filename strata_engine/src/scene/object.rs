/// Drawable object state and its push-constant payload
///
/// Each object belongs to exactly one worker and is only mutated from that
/// worker's recording jobs.

use std::f32::consts::TAU;
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use crate::scene::CameraMatrices;

/// Advance of the animation phase per frame
pub const ANIMATION_PHASE_STEP: f32 = 0.005;

/// Byte size of [`PushConstantData`]; must match the vertex shader block
pub const PUSH_CONSTANT_SIZE: usize = 76;

/// Vertex-stage push constants: `mat4 mvp; vec3 color;`
///
/// Column-major matrix followed by the color, no padding (76 bytes).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct PushConstantData {
    pub mvp: [f32; 16],
    pub color: [f32; 3],
}

const _: () = assert!(std::mem::size_of::<PushConstantData>() == PUSH_CONSTANT_SIZE);

impl PushConstantData {
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }

    pub fn mvp_matrix(&self) -> Mat4 {
        Mat4::from_cols_array(&self.mvp)
    }
}

/// Wrap `value` into `[0, period)`
///
/// `rem_euclid` can round up to `period` for tiny negative inputs, which is
/// folded back to zero.
pub fn wrap(value: f32, period: f32) -> f32 {
    let wrapped = value.rem_euclid(period);
    if wrapped >= period { 0.0 } else { wrapped }
}

/// Per-object transform and animation state
#[derive(Debug, Clone)]
pub struct DrawableObject {
    /// Rest position the animation oscillates around
    pub base_position: Vec3,
    /// Position of the last update
    pub position: Vec3,
    /// Euler angles in degrees; only `y` is animated
    pub rotation: Vec3,
    /// Degrees per second around Y
    pub rotation_speed: f32,
    /// +1.0 or -1.0
    pub rotation_dir: f32,
    pub scale: Vec3,
    /// Animation phase in `[0, 1)`
    pub delta_t: f32,
    pub color: Vec3,
    pub visible: bool,
    /// Height of the vertical oscillation
    pub bob_amplitude: f32,
    /// Half-width of the per-frame vertical jitter
    pub jitter_range: f32,
    model: Mat4,
    push_constants: PushConstantData,
    rng: StdRng,
}

impl DrawableObject {
    /// Object at rest at `position` with unit scale, no rotation and no animation
    pub fn new(position: Vec3, color: Vec3, seed: u64) -> Self {
        let mut object = Self {
            base_position: position,
            position,
            rotation: Vec3::ZERO,
            rotation_speed: 0.0,
            rotation_dir: 1.0,
            scale: Vec3::ONE,
            delta_t: 0.0,
            color,
            visible: true,
            bob_amplitude: 0.0,
            jitter_range: 0.0,
            model: Mat4::IDENTITY,
            push_constants: PushConstantData::zeroed(),
            rng: StdRng::seed_from_u64(seed),
        };
        object.model = object.compose_model();
        object.push_constants.color = color.to_array();
        object
    }

    /// Advance the animation by one frame and rebuild the push constants
    ///
    /// Order of operations: rotation, phase, position, model matrix, then
    /// `mvp = projection * view * model`.
    pub fn update(&mut self, frame_delta_seconds: f32, camera: &CameraMatrices) {
        self.rotation.y = wrap(self.rotation.y + self.rotation_speed * frame_delta_seconds, 360.0);
        self.delta_t = wrap(self.delta_t + ANIMATION_PHASE_STEP, 1.0);

        let jitter = if self.jitter_range > 0.0 {
            self.rng.gen_range(-self.jitter_range..=self.jitter_range)
        } else {
            0.0
        };
        let offset = (self.delta_t * TAU).sin() * self.bob_amplitude + jitter;
        self.position = self.base_position + Vec3::Y * offset;

        self.model = self.compose_model();
        self.write_push_constants(camera);
    }

    /// Recompute the push constants from the current model matrix
    pub fn write_push_constants(&mut self, camera: &CameraMatrices) {
        let mvp = camera.projection * camera.view * self.model;
        self.push_constants = PushConstantData {
            mvp: mvp.to_cols_array(),
            color: self.color.to_array(),
        };
    }

    /// Override the model matrix (bypasses the animation)
    pub fn set_model(&mut self, model: Mat4) {
        self.model = model;
    }

    pub fn model(&self) -> Mat4 {
        self.model
    }

    pub fn push_constants(&self) -> &PushConstantData {
        &self.push_constants
    }

    /// translate * rotate_y(rotation) * rotate_x(phase) * scale
    fn compose_model(&self) -> Mat4 {
        let spin = (self.rotation.y * self.rotation_dir).to_radians();
        let tumble = (self.delta_t * 360.0 * self.rotation_dir).to_radians();
        Mat4::from_translation(self.position)
            * Mat4::from_rotation_y(spin)
            * Mat4::from_rotation_x(tumble)
            * Mat4::from_scale(self.scale)
    }
}

#[cfg(test)]
#[path = "object_tests.rs"]
mod tests;
