//! Charge-based variable power kicks

use glam::Vec2;
use rand::Rng;

use super::ball::Ball;
use super::tuning::{BallTuning, KickTuning};
use super::PlayerId;

/// Kick power for a charge held `charge_secs` seconds
///
/// A tap gives `min_power`; holding saturates at `max_power`.
pub fn kick_power(charge_secs: f32, tuning: &KickTuning) -> f32 {
    if charge_secs >= tuning.full_charge_secs() {
        return tuning.max_power;
    }
    (tuning.min_power + charge_secs.max(0.0) * tuning.charge_rate)
        .clamp(tuning.min_power, tuning.max_power)
}

/// A connected kick, ready to apply and send
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Kick {
    pub velocity: Vec2,
    pub power: f32,
    pub spin: f32,
}

impl Kick {
    /// Optimistically apply to a ball copy
    pub fn apply(&self, ball: &mut Ball, kicker: PlayerId, now: f64, tuning: &BallTuning) {
        ball.set_velocity(self.velocity, tuning);
        ball.spin = self.spin;
        ball.attribute(kicker, now);
    }

    /// Camera shake `(intensity, seconds)` for powerful kicks
    pub fn shake(&self, tuning: &KickTuning) -> Option<(f32, f32)> {
        (self.power > tuning.shake_threshold)
            .then(|| (self.power * tuning.shake_per_power, tuning.shake_duration))
    }
}

/// Result of releasing the kick control
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KickOutcome {
    Kicked(Kick),
    /// Nothing was charging
    NotCharging,
    CoolingDown,
    OutOfRange,
}

/// Per-player kick state machine: Idle -> Charging -> Resolved | Rejected
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct KickState {
    charge_start: Option<f64>,
    cooldown_until: f64,
    /// The ball has been within reach at some point during this charge
    reached_ball: bool,
}

impl KickState {
    pub fn is_charging(&self) -> bool {
        self.charge_start.is_some()
    }

    pub fn cooldown_until(&self) -> f64 {
        self.cooldown_until
    }

    /// Kick control pressed; ignored (not queued) while cooling down
    pub fn begin_charge(&mut self, now: f64) -> bool {
        if now < self.cooldown_until || self.is_charging() {
            return false;
        }
        self.charge_start = Some(now);
        self.reached_ball = false;
        true
    }

    /// Drop any charge in progress
    pub fn cancel(&mut self) {
        self.charge_start = None;
        self.reached_ball = false;
    }

    /// Charge progress in percent for the HUD
    pub fn charge_percent(&self, now: f64, tuning: &KickTuning) -> f32 {
        let Some(start) = self.charge_start else {
            return 0.0;
        };
        let power = kick_power((now - start) as f32, tuning);
        ((power - tuning.min_power) / (tuning.max_power - tuning.min_power) * 100.0).min(100.0)
    }

    /// Per-frame range tracking while charging
    ///
    /// Returns true when the charge was force-cleared because the player
    /// walked out of range after having been in range.
    pub fn track_range(&mut self, distance_to_ball: f32, tuning: &KickTuning) -> bool {
        if !self.is_charging() {
            return false;
        }
        if distance_to_ball <= tuning.distance {
            self.reached_ball = true;
            false
        } else if self.reached_ball {
            self.cancel();
            true
        } else {
            false
        }
    }

    /// Kick control released
    ///
    /// Always clears the charge. On success the cooldown starts and the kick
    /// points along `facing`.
    pub fn release<R: Rng>(
        &mut self,
        now: f64,
        player_position: Vec2,
        facing: Vec2,
        ball: &Ball,
        tuning: &KickTuning,
        rng: &mut R,
    ) -> KickOutcome {
        let Some(start) = self.charge_start.take() else {
            return KickOutcome::NotCharging;
        };
        self.reached_ball = false;

        if now < self.cooldown_until {
            return KickOutcome::CoolingDown;
        }
        if player_position.distance(ball.position) > tuning.distance {
            return KickOutcome::OutOfRange;
        }
        let Some(direction) = facing.try_normalize() else {
            return KickOutcome::OutOfRange;
        };

        let power = kick_power((now - start) as f32, tuning);
        let spin = if tuning.spin_range > 0.0 {
            rng.gen_range(-tuning.spin_range..tuning.spin_range)
        } else {
            0.0
        };
        self.cooldown_until = now + tuning.cooldown as f64;

        KickOutcome::Kicked(Kick {
            velocity: direction * power,
            power,
            spin,
        })
    }
}
