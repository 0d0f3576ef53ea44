//! Camera rig: smoothed follow with decaying shake

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::game::tuning::CameraTuning;
use crate::game::{frames, smoothing};

/// Offsets below this snap to zero once a shake has run out
const SETTLE_EPSILON: f32 = 0.01;

#[derive(Debug, Clone)]
pub struct CameraRig {
    position: Vec2,
    shake_intensity: f32,
    shake_timer: f32,
    shake_offset: Vec2,
    rng: ChaCha8Rng,
}

impl CameraRig {
    pub fn new(focus: Vec2, seed: u64) -> Self {
        Self {
            position: focus,
            shake_intensity: 0.0,
            shake_timer: 0.0,
            shake_offset: Vec2::ZERO,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Jump straight to a focus point (scene changes)
    pub fn snap_to(&mut self, focus: Vec2) {
        self.position = focus;
    }

    /// Start a shake; a weaker request never cuts a stronger one short
    pub fn shake(&mut self, intensity: f32, duration: f32) {
        self.shake_intensity = self.shake_intensity.max(intensity);
        self.shake_timer = self.shake_timer.max(duration);
    }

    pub fn update(&mut self, target: Vec2, dt: f32, tuning: &CameraTuning) {
        let alpha = smoothing(tuning.follow_factor, dt);
        self.position += (target - self.position) * alpha;

        let decay = tuning.shake_decay.powf(frames(dt));
        if self.shake_timer > 0.0 {
            self.shake_timer = (self.shake_timer - dt.max(0.0)).max(0.0);
            let i = self.shake_intensity;
            self.shake_offset = if i > 0.0 {
                Vec2::new(self.rng.gen_range(-i..=i), self.rng.gen_range(-i..=i))
            } else {
                Vec2::ZERO
            };
            self.shake_intensity *= decay;
        } else {
            // Ease out of the last offset instead of popping back
            self.shake_intensity = 0.0;
            self.shake_offset *= decay;
            if self.shake_offset.length() < SETTLE_EPSILON {
                self.shake_offset = Vec2::ZERO;
            }
        }
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn shake_offset(&self) -> Vec2 {
        self.shake_offset
    }

    pub fn is_shaking(&self) -> bool {
        self.shake_timer > 0.0
    }

    /// Where rendering should centre this frame
    pub fn view(&self) -> Vec2 {
        self.position + self.shake_offset
    }
}
