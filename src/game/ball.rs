//! Ball physics and goal detection

use glam::Vec2;

use super::tuning::{BallTuning, FieldTuning};
use super::{frames, PlayerId, Team};
use crate::ws::protocol::BallState;

/// The match ball
///
/// The server owns the authoritative copy; clients advance a display copy with
/// the same [`BallPhysics::step`] and overwrite it from snapshots.
#[derive(Debug, Clone, PartialEq)]
pub struct Ball {
    pub position: Vec2,
    pub velocity: Vec2,
    /// Cosmetic curve factor, carried through the network untouched
    pub spin: f32,
    pub last_kicked_by: Option<PlayerId>,
    /// Seconds on the owner's clock
    pub last_kick_time: f64,
    /// Set on the first tick a goal is detected, cleared only by reset
    goal_latched: bool,
}

/// A ball crossing of a goal mouth
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GoalScored {
    pub team: Team,
    pub scored_by: Option<PlayerId>,
}

impl Ball {
    pub fn at_center(field: &FieldTuning) -> Self {
        Self {
            position: field.center(),
            velocity: Vec2::ZERO,
            spin: 0.0,
            last_kicked_by: None,
            last_kick_time: 0.0,
            goal_latched: false,
        }
    }

    /// Back to the centre spot at rest; re-arms goal detection
    pub fn reset(&mut self, field: &FieldTuning) {
        *self = Self::at_center(field);
    }

    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }

    pub fn is_resting(&self) -> bool {
        self.velocity == Vec2::ZERO
    }

    pub fn goal_latched(&self) -> bool {
        self.goal_latched
    }

    /// Set velocity, capped at the ball's max speed
    pub fn set_velocity(&mut self, velocity: Vec2, tuning: &BallTuning) {
        self.velocity = velocity.clamp_length_max(tuning.max_speed);
    }

    /// Record who touched the ball last
    pub fn attribute(&mut self, player: PlayerId, now: f64) {
        self.last_kicked_by = Some(player);
        self.last_kick_time = now;
    }

    /// Replace local state with an authoritative sample
    ///
    /// No merge: the server always wins. The goal latch is kept while the
    /// sample still sits behind a goal line, so a local copy resting in the
    /// net does not fire again.
    pub fn overwrite(&mut self, state: &BallState, field: &FieldTuning) {
        self.position = Vec2::new(state.x, state.y);
        self.velocity = Vec2::new(state.vx, state.vy);
        self.spin = state.spin;
        self.last_kicked_by = state.last_kicked_by;
        if (field.min_x()..=field.max_x()).contains(&state.x) {
            self.goal_latched = false;
        }
    }

    pub fn to_state(&self) -> BallState {
        BallState {
            x: self.position.x,
            y: self.position.y,
            vx: self.velocity.x,
            vy: self.velocity.y,
            spin: self.spin,
            last_kicked_by: self.last_kicked_by,
        }
    }
}

/// Ball integrator
pub struct BallPhysics;

impl BallPhysics {
    /// Advance the ball by `dt` seconds
    ///
    /// Friction is one multiplicative factor per reference frame. The ball
    /// bounces off the lines outside the goal mouths, passes through the
    /// mouths and is caught by the net. Returns a goal exactly once per
    /// crossing.
    pub fn step(
        ball: &mut Ball,
        dt: f32,
        tuning: &BallTuning,
        field: &FieldTuning,
    ) -> Option<GoalScored> {
        let frames = frames(dt);
        let was_in_net = Self::behind_goal_line(ball.position.x, field);

        ball.velocity = ball.velocity.clamp_length_max(tuning.max_speed);
        ball.velocity *= tuning.friction.powf(frames);
        if ball.velocity.length() < tuning.stop_epsilon {
            ball.velocity = Vec2::ZERO;
        }

        ball.position += ball.velocity * frames;

        if was_in_net {
            Self::confine_to_net(ball, tuning, field);
        } else {
            Self::bounce_off_lines(ball, tuning, field);
            if Self::behind_goal_line(ball.position.x, field) {
                Self::confine_to_net(ball, tuning, field);
            }
        }

        Self::detect_goal(ball, field)
    }

    fn behind_goal_line(x: f32, field: &FieldTuning) -> bool {
        x < field.min_x() || x > field.max_x()
    }

    fn bounce_off_lines(ball: &mut Ball, tuning: &BallTuning, field: &FieldTuning) {
        let r = tuning.radius;
        let restitution = tuning.wall_restitution;

        if ball.position.y < field.min_y() + r {
            ball.position.y = field.min_y() + r;
            ball.velocity.y = ball.velocity.y.abs() * restitution;
        } else if ball.position.y > field.max_y() - r {
            ball.position.y = field.max_y() - r;
            ball.velocity.y = -ball.velocity.y.abs() * restitution;
        }

        // Goal lines reflect only outside the mouth
        if field.in_goal_mouth(ball.position.y) {
            return;
        }
        if ball.position.x < field.min_x() + r {
            ball.position.x = field.min_x() + r;
            ball.velocity.x = ball.velocity.x.abs() * restitution;
        } else if ball.position.x > field.max_x() - r {
            ball.position.x = field.max_x() - r;
            ball.velocity.x = -ball.velocity.x.abs() * restitution;
        }
    }

    /// Keep a ball that is behind a goal line inside the net
    fn confine_to_net(ball: &mut Ball, tuning: &BallTuning, field: &FieldTuning) {
        let r = tuning.radius;
        let center_y = field.height / 2.0;
        let half_mouth = (field.goal_width / 2.0 - r).max(0.0);

        let (low, high) = (center_y - half_mouth, center_y + half_mouth);
        if ball.position.y < low || ball.position.y > high {
            ball.position.y = ball.position.y.clamp(low, high);
            ball.velocity.y = 0.0;
        }

        let back_left = field.min_x() - field.goal_depth + r;
        let back_right = field.max_x() + field.goal_depth - r;
        if ball.position.x < back_left {
            ball.position.x = back_left;
            ball.velocity.x = 0.0;
        } else if ball.position.x > back_right {
            ball.position.x = back_right;
            ball.velocity.x = 0.0;
        }
    }

    fn detect_goal(ball: &mut Ball, field: &FieldTuning) -> Option<GoalScored> {
        if ball.goal_latched || !field.in_goal_mouth(ball.position.y) {
            return None;
        }

        let team = if ball.position.x > field.max_x() {
            Team::Blue
        } else if ball.position.x < field.min_x() {
            Team::Red
        } else {
            return None;
        };

        ball.goal_latched = true;
        Some(GoalScored {
            team,
            scored_by: ball.last_kicked_by,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Tuning;
    use proptest::prelude::*;
    use uuid::Uuid;

    const DT: f32 = 1.0 / 60.0;

    #[test]
    fn friction_decays_geometrically() {
        let t = Tuning::default();
        let mut ball = Ball::at_center(&t.field);
        ball.velocity = Vec2::new(3.0, 0.0);

        for _ in 0..10 {
            BallPhysics::step(&mut ball, DT, &t.ball, &t.field);
        }
        let expected = 3.0 * t.ball.friction.powi(10);
        assert!((ball.speed() - expected).abs() < 1e-4);
    }

    #[test]
    fn right_goal_scores_once_for_blue() {
        let t = Tuning::default();
        let scorer = Uuid::new_v4();
        let mut ball = Ball::at_center(&t.field);
        ball.attribute(scorer, 0.0);
        ball.velocity = Vec2::new(10.0, 0.0);

        let mut goals = Vec::new();
        for _ in 0..300 {
            if let Some(goal) = BallPhysics::step(&mut ball, DT, &t.ball, &t.field) {
                goals.push(goal);
            }
        }

        assert_eq!(
            goals,
            vec![GoalScored {
                team: Team::Blue,
                scored_by: Some(scorer)
            }]
        );
        assert!(ball.position.x > t.field.max_x());
        assert!(ball.position.x <= t.field.max_x() + t.field.goal_depth);
    }

    #[test]
    fn left_goal_scores_for_red() {
        let t = Tuning::default();
        let mut ball = Ball::at_center(&t.field);
        ball.velocity = Vec2::new(-12.0, 0.0);

        let goal = (0..300).find_map(|_| BallPhysics::step(&mut ball, DT, &t.ball, &t.field));
        assert_eq!(goal.map(|g| g.team), Some(Team::Red));
    }

    #[test]
    fn reset_rearms_detection() {
        let t = Tuning::default();
        let mut ball = Ball::at_center(&t.field);
        ball.position = Vec2::new(t.field.max_x() - 1.0, 300.0);
        ball.velocity = Vec2::new(5.0, 0.0);
        assert!(BallPhysics::step(&mut ball, DT, &t.ball, &t.field).is_some());
        assert!(ball.goal_latched());

        ball.reset(&t.field);
        assert!(!ball.goal_latched());
        assert_eq!(ball.position, t.field.center());
        assert!(ball.is_resting());
    }

    #[test]
    fn bounces_off_line_outside_mouth() {
        let t = Tuning::default();
        let mut ball = Ball::at_center(&t.field);
        ball.position = Vec2::new(t.field.max_x() - t.ball.radius - 1.0, 100.0);
        ball.velocity = Vec2::new(6.0, 0.0);

        let goal = BallPhysics::step(&mut ball, DT, &t.ball, &t.field);
        assert!(goal.is_none());
        assert!(ball.velocity.x < 0.0);
        assert!(ball.position.x <= t.field.max_x() - t.ball.radius);
    }

    #[test]
    fn bounces_off_touch_line() {
        let t = Tuning::default();
        let mut ball = Ball::at_center(&t.field);
        ball.position = Vec2::new(400.0, t.field.min_y() + t.ball.radius + 1.0);
        ball.velocity = Vec2::new(0.0, -6.0);

        BallPhysics::step(&mut ball, DT, &t.ball, &t.field);
        assert!(ball.velocity.y > 0.0);
        assert!(ball.velocity.y <= 6.0 * t.ball.wall_restitution);
    }

    #[test]
    fn overwrite_takes_server_values() {
        let t = Tuning::default();
        let kicker = Uuid::new_v4();
        let mut ball = Ball::at_center(&t.field);
        let state = BallState {
            x: 120.0,
            y: 200.0,
            vx: -3.0,
            vy: 1.5,
            spin: 0.1,
            last_kicked_by: Some(kicker),
        };
        ball.overwrite(&state, &t.field);
        assert_eq!(ball.to_state(), state);
    }

    #[test]
    fn overwrite_keeps_latch_while_ball_sits_in_the_net() {
        let t = Tuning::default();
        let mut ball = Ball::at_center(&t.field);
        ball.position = Vec2::new(t.field.max_x() - 1.0, 300.0);
        ball.velocity = Vec2::new(5.0, 0.0);
        assert!(BallPhysics::step(&mut ball, DT, &t.ball, &t.field).is_some());

        let in_net = BallState {
            x: t.field.max_x() + 4.0,
            y: 300.0,
            vx: 1.0,
            vy: 0.0,
            ..BallState::default()
        };
        ball.overwrite(&in_net, &t.field);
        assert!(ball.goal_latched());
        for _ in 0..30 {
            assert!(BallPhysics::step(&mut ball, DT, &t.ball, &t.field).is_none());
        }

        let back_in_play = BallState {
            x: 400.0,
            y: 300.0,
            ..BallState::default()
        };
        ball.overwrite(&back_in_play, &t.field);
        assert!(!ball.goal_latched());
    }

    proptest! {
        #[test]
        fn speed_never_grows_without_kicks(vx in -20.0f32..20.0, vy in -20.0f32..20.0, ticks in 1usize..200) {
            let t = Tuning::default();
            let mut ball = Ball::at_center(&t.field);
            ball.velocity = Vec2::new(vx, vy);
            let mut previous = ball.speed();
            for _ in 0..ticks {
                BallPhysics::step(&mut ball, DT, &t.ball, &t.field);
                prop_assert!(ball.speed() <= previous + 1e-4);
                previous = ball.speed();
            }
        }
    }
}
