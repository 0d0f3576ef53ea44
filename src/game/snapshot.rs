//! Snapshot cadence and building for authoritative broadcasts

use crate::ws::protocol::ServerMsg;

use super::ball::Ball;
use super::r#match::MatchSession;

/// Decides when the ground broadcasts ball and match state
///
/// Rates are per second against the simulation tick rate. Each tick adds the
/// rate to a credit and a send spends one tick rate's worth, so 20/s at
/// 30 TPS sends on two ticks out of every three.
pub struct SnapshotBuilder {
    tick_rate: u32,
    ball_rate: u32,
    ball_credit: u32,
    state_rate: u32,
    state_credit: u32,
    force_ball: bool,
    /// A resting ball is sent once, then suppressed until it moves again
    rest_sent: bool,
}

impl SnapshotBuilder {
    pub fn new(tick_rate: u32, ball_rate: u32, state_rate: u32) -> Self {
        let tick_rate = tick_rate.max(1);
        Self {
            tick_rate,
            ball_rate: ball_rate.clamp(1, tick_rate),
            ball_credit: 0,
            state_rate: state_rate.clamp(1, tick_rate),
            state_credit: 0,
            force_ball: false,
            rest_sent: false,
        }
    }

    /// Check if it's time to send a ball snapshot
    pub fn should_send_ball(&mut self, ball: &Ball) -> bool {
        self.ball_credit += self.ball_rate;

        if self.force_ball {
            self.force_ball = false;
            self.ball_credit = 0;
            self.rest_sent = ball.is_resting();
            return true;
        }

        if self.ball_credit < self.tick_rate {
            return false;
        }
        self.ball_credit -= self.tick_rate;

        if ball.is_resting() {
            if self.rest_sent {
                return false;
            }
            self.rest_sent = true;
        } else {
            self.rest_sent = false;
        }
        true
    }

    /// Check if it's time to send aggregate match state
    pub fn should_send_state(&mut self) -> bool {
        self.state_credit += self.state_rate;
        if self.state_credit >= self.tick_rate {
            self.state_credit -= self.tick_rate;
            true
        } else {
            false
        }
    }

    /// Force a ball snapshot on next check (kicks, goals, resets)
    pub fn force_next(&mut self) {
        self.force_ball = true;
    }

    pub fn build_ball(&self, tick: u64, ball: &Ball) -> ServerMsg {
        ServerMsg::BallUpdate {
            tick,
            ball: ball.to_state(),
        }
    }

    pub fn build_state(&self, tick: u64, session: &MatchSession, ball: &Ball) -> ServerMsg {
        ServerMsg::GameState {
            epoch: session.epoch(),
            tick,
            ball: ball.to_state(),
            score: session.score(),
            is_playing: session.is_playing(),
            match_time: session.time_remaining(),
            phase: session.phase(),
        }
    }
}
