//! The locally controlled player

use glam::Vec2;

use crate::game::kick::KickState;
use crate::game::movement::{Body, MovementSystem};
use crate::game::stamina::Stamina;
use crate::game::{PlayerId, Team, Tuning};

/// Per-session counters for the HUD and reward hooks
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LocalStats {
    pub kicks: u32,
    pub goals: u32,
    /// Distance covered in world units
    pub distance: f32,
}

/// Local player: self-authoritative for movement
#[derive(Debug, Clone)]
pub struct LocalPlayer {
    pub id: PlayerId,
    pub name: String,
    pub team: Team,
    pub body: Body,
    pub stamina: Stamina,
    pub kick: KickState,
    pub stats: LocalStats,
}

impl LocalPlayer {
    /// Spawn facing the goal the team attacks
    pub fn spawn(id: PlayerId, name: String, team: Team, position: Vec2, tuning: &Tuning) -> Self {
        Self {
            id,
            name,
            team,
            body: Body::at(position, Vec2::new(team.attack_sign(), 0.0)),
            stamina: Stamina::full(&tuning.stamina),
            kick: KickState::default(),
            stats: LocalStats::default(),
        }
    }

    /// Stamina then movement for one frame; returns distance travelled
    pub fn update(&mut self, direction: Vec2, wants_sprint: bool, dt: f32, tuning: &Tuning) -> f32 {
        let moving = direction != Vec2::ZERO;
        let sprint_allowed = self
            .stamina
            .update(dt, wants_sprint && moving, &tuning.stamina);

        let travelled = MovementSystem::step(
            &mut self.body,
            direction,
            sprint_allowed,
            dt,
            &tuning.player,
            &tuning.field,
        );
        self.stats.distance += travelled;
        travelled
    }
}
