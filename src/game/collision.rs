//! Player/ball contact

use glam::Vec2;

use super::ball::Ball;
use super::tuning::{BallTuning, KickTuning, PlayerTuning};

/// Optimistic ball state produced by a contact
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub ball_position: Vec2,
    pub ball_velocity: Vec2,
}

/// Check whether a player overlaps the ball
pub fn touching(player_position: Vec2, ball: &Ball, player: &PlayerTuning, tuning: &BallTuning) -> bool {
    player_position.distance_squared(ball.position) < (player.radius + tuning.radius).powi(2)
}

/// Resolve contact between the local player and the ball
///
/// Hands a fraction of the player's velocity to the ball and pushes the ball
/// out along the separation vector by the overlap depth. `fallback_normal` is
/// used when both centres coincide.
pub fn resolve_player_ball(
    player_position: Vec2,
    player_velocity: Vec2,
    fallback_normal: Vec2,
    ball: &mut Ball,
    player: &PlayerTuning,
    ball_tuning: &BallTuning,
    kick: &KickTuning,
) -> Option<Contact> {
    if !touching(player_position, ball, player, ball_tuning) {
        return None;
    }

    let contact_distance = player.radius + ball_tuning.radius;
    let offset = ball.position - player_position;
    let distance = offset.length();
    let normal = offset
        .try_normalize()
        .or_else(|| fallback_normal.try_normalize())
        .unwrap_or(Vec2::X);

    let overlap = contact_distance - distance;
    ball.position += normal * overlap;
    ball.set_velocity(ball.velocity + player_velocity * kick.momentum_transfer, ball_tuning);

    Some(Contact {
        ball_position: ball.position,
        ball_velocity: ball.velocity,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Tuning;

    #[test]
    fn no_contact_when_apart() {
        let t = Tuning::default();
        let mut ball = Ball::at_center(&t.field);
        let player = ball.position - Vec2::new(30.0, 0.0);
        let before = ball.clone();

        let contact = resolve_player_ball(
            player,
            Vec2::new(1.0, 0.0),
            Vec2::X,
            &mut ball,
            &t.player,
            &t.ball,
            &t.kick,
        );
        assert!(contact.is_none());
        assert_eq!(ball, before);
    }

    #[test]
    fn contact_transfers_momentum_and_separates() {
        let t = Tuning::default();
        let mut ball = Ball::at_center(&t.field);
        let player = ball.position - Vec2::new(20.0, 0.0);

        let contact = resolve_player_ball(
            player,
            Vec2::new(1.0, 0.0),
            Vec2::X,
            &mut ball,
            &t.player,
            &t.ball,
            &t.kick,
        )
        .expect("contact");

        assert!((contact.ball_velocity.x - t.kick.momentum_transfer).abs() < 1e-6);
        let separation = ball.position.distance(player);
        assert!((separation - (t.player.radius + t.ball.radius)).abs() < 1e-4);
    }

    #[test]
    fn coincident_centres_use_fallback() {
        let t = Tuning::default();
        let mut ball = Ball::at_center(&t.field);
        let player = ball.position;

        resolve_player_ball(
            player,
            Vec2::ZERO,
            Vec2::new(0.0, 1.0),
            &mut ball,
            &t.player,
            &t.ball,
            &t.kick,
        )
        .expect("contact");
        assert!(ball.position.y > player.y);
        assert!((ball.position.x - player.x).abs() < 1e-6);
    }
}
