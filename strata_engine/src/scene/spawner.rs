/// Seeded placement of the drawable objects owned by each worker

use std::f32::consts::TAU;
use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use crate::scene::DrawableObject;

/// Builds object arrays; the same seed always yields the same scene
pub struct ObjectSpawner {
    rng: StdRng,
    /// Radius of the ring objects are placed on
    pub ring_radius: f32,
    /// Distance between consecutive rings
    pub ring_spacing: f32,
    /// Objects per ring
    pub ring_capacity: usize,
}

impl ObjectSpawner {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            ring_radius: 12.0,
            ring_spacing: 8.0,
            ring_capacity: 16,
        }
    }

    /// Objects for worker `worker_index`, placed after the objects of lower workers
    pub fn spawn_for_worker(&mut self, worker_index: usize, count: usize) -> Vec<DrawableObject> {
        (0..count)
            .map(|i| self.spawn(worker_index * count + i))
            .collect()
    }

    /// One object at global slot `global_index`
    pub fn spawn(&mut self, global_index: usize) -> DrawableObject {
        let ring = global_index / self.ring_capacity;
        let angle = (global_index % self.ring_capacity) as f32 / self.ring_capacity as f32 * TAU;
        let radius = self.ring_radius + ring as f32 * self.ring_spacing;
        let position = Vec3::new(angle.cos() * radius, 0.0, -angle.sin() * radius - 20.0);

        let color = Vec3::new(
            self.rng.gen_range(0.2..1.0),
            self.rng.gen_range(0.2..1.0),
            self.rng.gen_range(0.2..1.0),
        );

        let mut object = DrawableObject::new(position, color, self.rng.gen());
        object.rotation.y = self.rng.gen_range(0.0..360.0);
        object.rotation_speed = self.rng.gen_range(15.0..90.0);
        object.rotation_dir = if self.rng.gen_bool(0.5) { 1.0 } else { -1.0 };
        object.scale = Vec3::splat(self.rng.gen_range(0.5..1.5));
        object.delta_t = self.rng.gen_range(0.0..1.0);
        object.bob_amplitude = self.rng.gen_range(0.5..2.0);
        object.jitter_range = 0.05;
        object
    }
}
