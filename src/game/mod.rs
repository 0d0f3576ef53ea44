//! Football simulation modules

pub mod ball;
pub mod collision;
pub mod ground;
pub mod kick;
pub mod r#match;
pub mod movement;
pub mod snapshot;
pub mod stamina;
pub mod tuning;

pub use ball::{Ball, GoalScored};
pub use ground::{GroundHandle, GroundServer, GroundStatus};
pub use r#match::{MatchPhase, MatchSession, MatchTransition, Score};
pub use tuning::Tuning;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ws::protocol::ClientMsg;

/// Stable player identity assigned per connection
pub type PlayerId = Uuid;

/// Frame rate that per-frame speeds and factors are expressed against
pub const REFERENCE_FPS: f32 = 60.0;

/// Convert elapsed seconds into reference frames
pub fn frames(dt: f32) -> f32 {
    dt.max(0.0) * REFERENCE_FPS
}

/// Blend weight for exponential smoothing with a per-frame `factor`
///
/// Equals `factor` for exactly one reference frame, and composes correctly
/// for any split of the same elapsed time.
pub fn smoothing(factor: f32, dt: f32) -> f32 {
    1.0 - (1.0 - factor.clamp(0.0, 1.0)).powf(frames(dt))
}

/// Team assignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Team {
    Red,
    Blue,
}

impl Team {
    /// Unit x direction of the goal this team attacks
    ///
    /// Blue scores in the right goal, Red in the left one.
    pub fn attack_sign(self) -> f32 {
        match self {
            Team::Blue => 1.0,
            Team::Red => -1.0,
        }
    }

    pub fn opponent(self) -> Team {
        match self {
            Team::Red => Team::Blue,
            Team::Blue => Team::Red,
        }
    }
}

/// Intent received from a connection, queued for the ground task
#[derive(Debug, Clone)]
pub struct PlayerInput {
    pub player_id: PlayerId,
    pub msg: ClientMsg,
    pub received_at: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smoothing_equals_factor_for_one_frame() {
        let alpha = smoothing(0.2, 1.0 / REFERENCE_FPS);
        assert!((alpha - 0.2).abs() < 1e-5);
    }

    #[test]
    fn smoothing_composes_over_split_frames() {
        let whole = smoothing(0.2, 2.0 / REFERENCE_FPS);
        let half = smoothing(0.2, 1.0 / REFERENCE_FPS);
        let remaining = (1.0 - half) * (1.0 - half);
        assert!(((1.0 - whole) - remaining).abs() < 1e-5);
    }

    #[test]
    fn teams_attack_opposite_goals() {
        assert_eq!(Team::Red.opponent(), Team::Blue);
        assert!(Team::Blue.attack_sign() > 0.0);
        assert!(Team::Red.attack_sign() < 0.0);
    }
}
