//! Player movement: acceleration, speed caps, friction and pitch bounds

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::frames;
use super::tuning::{FieldTuning, PlayerTuning};

/// Directional intent from up to four boolean axes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveIntent {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl MoveIntent {
    /// Unit-ish direction; diagonals are scaled by 1/sqrt(2)
    pub fn direction(&self) -> Vec2 {
        let mut dir = Vec2::ZERO;
        if self.up {
            dir.y -= 1.0;
        }
        if self.down {
            dir.y += 1.0;
        }
        if self.left {
            dir.x -= 1.0;
        }
        if self.right {
            dir.x += 1.0;
        }
        if dir.x != 0.0 && dir.y != 0.0 {
            dir *= std::f32::consts::FRAC_1_SQRT_2;
        }
        dir
    }

    pub fn is_idle(&self) -> bool {
        self.direction() == Vec2::ZERO
    }

    /// Intent pointing from `from` toward `to`, ignoring a small dead zone
    pub fn toward(from: Vec2, to: Vec2, dead_zone: f32) -> Self {
        let delta = to - from;
        Self {
            up: delta.y < -dead_zone,
            down: delta.y > dead_zone,
            left: delta.x < -dead_zone,
            right: delta.x > dead_zone,
        }
    }
}

/// Kinematic state of a player
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Body {
    pub position: Vec2,
    pub velocity: Vec2,
    /// Last non-zero movement direction, used for facing and kick aim
    pub facing: Vec2,
}

impl Body {
    pub fn at(position: Vec2, facing: Vec2) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            facing: facing.try_normalize().unwrap_or(Vec2::X),
        }
    }

    pub fn is_moving(&self) -> bool {
        self.velocity != Vec2::ZERO
    }
}

/// Movement integrator for players
pub struct MovementSystem;

impl MovementSystem {
    /// Advance a body by `dt` seconds
    ///
    /// `direction` comes from [`MoveIntent::direction`] (or an analog stick
    /// with length <= 1). Returns the distance travelled this step.
    pub fn step(
        body: &mut Body,
        direction: Vec2,
        sprint_allowed: bool,
        dt: f32,
        player: &PlayerTuning,
        field: &FieldTuning,
    ) -> f32 {
        let frames = frames(dt);
        let direction = direction.clamp_length_max(1.0);

        if direction != Vec2::ZERO {
            body.velocity += direction * player.acceleration * frames;

            let max_speed = if sprint_allowed {
                player.sprint_speed
            } else {
                player.base_speed
            };
            body.velocity = body.velocity.clamp_length_max(max_speed);

            if let Some(facing) = direction.try_normalize() {
                body.facing = facing;
            }
        } else {
            body.velocity *= player.friction.powf(frames);
            if body.velocity.x.abs() < player.stop_epsilon {
                body.velocity.x = 0.0;
            }
            if body.velocity.y.abs() < player.stop_epsilon {
                body.velocity.y = 0.0;
            }
        }

        let start = body.position;
        let mut next = body.position + body.velocity * frames;

        // Inelastic stop at the lines
        if next.x < field.min_x() || next.x > field.max_x() {
            next.x = next.x.clamp(field.min_x(), field.max_x());
            body.velocity.x = 0.0;
        }
        if next.y < field.min_y() || next.y > field.max_y() {
            next.y = next.y.clamp(field.min_y(), field.max_y());
            body.velocity.y = 0.0;
        }

        body.position = next;
        start.distance(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Tuning;

    const DT: f32 = 1.0 / 60.0;

    fn center_body() -> Body {
        Body::at(Tuning::default().field.center(), Vec2::X)
    }

    #[test]
    fn diagonal_intent_is_normalized() {
        let intent = MoveIntent {
            up: true,
            right: true,
            ..Default::default()
        };
        assert!((intent.direction().length() - 1.0).abs() < 1e-6);
        assert!(MoveIntent::default().is_idle());
    }

    #[test]
    fn opposite_keys_cancel() {
        let intent = MoveIntent {
            left: true,
            right: true,
            ..Default::default()
        };
        assert!(intent.is_idle());
    }

    #[test]
    fn speed_is_capped_by_sprint_state() {
        let t = Tuning::default();
        let mut body = center_body();
        for _ in 0..120 {
            MovementSystem::step(&mut body, Vec2::X, false, DT, &t.player, &t.field);
        }
        assert!((body.velocity.length() - t.player.base_speed).abs() < 1e-4);

        for _ in 0..120 {
            MovementSystem::step(&mut body, Vec2::X, true, DT, &t.player, &t.field);
        }
        assert!(body.velocity.length() <= t.player.sprint_speed + 1e-4);
        assert!(body.velocity.length() > t.player.base_speed);
    }

    #[test]
    fn friction_snaps_to_rest_and_keeps_facing() {
        let t = Tuning::default();
        let mut body = center_body();
        body.velocity = Vec2::new(0.0, -0.8);
        body.facing = Vec2::new(0.0, -1.0);

        for _ in 0..200 {
            MovementSystem::step(&mut body, Vec2::ZERO, false, DT, &t.player, &t.field);
        }
        assert_eq!(body.velocity, Vec2::ZERO);
        assert_eq!(body.facing, Vec2::new(0.0, -1.0));
    }

    #[test]
    fn wall_hit_zeroes_that_component() {
        let t = Tuning::default();
        let mut body = Body::at(Vec2::new(t.field.max_x() - 0.1, 300.0), Vec2::X);
        body.velocity = Vec2::new(0.8, 0.5);

        MovementSystem::step(&mut body, Vec2::ZERO, false, DT, &t.player, &t.field);
        assert_eq!(body.position.x, t.field.max_x());
        assert_eq!(body.velocity.x, 0.0);
        assert!(body.velocity.y > 0.0);
    }

    #[test]
    fn variable_dt_covers_similar_ground() {
        let t = Tuning::default();
        let mut fine = center_body();
        let mut coarse = center_body();
        fine.velocity = Vec2::new(0.8, 0.0);
        coarse.velocity = Vec2::new(0.8, 0.0);

        for _ in 0..4 {
            MovementSystem::step(&mut fine, Vec2::X, false, DT, &t.player, &t.field);
        }
        MovementSystem::step(&mut coarse, Vec2::X, false, DT * 4.0, &t.player, &t.field);
        assert!((fine.position.x - coarse.position.x).abs() < 0.01);
    }

    #[test]
    fn toward_builds_intent_from_offset() {
        let intent = MoveIntent::toward(Vec2::ZERO, Vec2::new(10.0, -10.0), 1.0);
        assert!(intent.right && intent.up);
        assert!(!intent.left && !intent.down);
        assert!(MoveIntent::toward(Vec2::ZERO, Vec2::new(0.5, 0.5), 1.0).is_idle());
    }
}
