//! Gameplay constants for the football ground
//!
//! Speeds and accelerations are per reference frame (see [`super::REFERENCE_FPS`]);
//! rates, delays and durations are in seconds.

use glam::Vec2;

/// Pitch geometry
#[derive(Debug, Clone, Copy)]
pub struct FieldTuning {
    pub width: f32,
    pub height: f32,
    /// Distance from the canvas edge to the touch/goal lines
    pub padding: f32,
    /// Opening of each goal mouth along y
    pub goal_width: f32,
    /// How far the net extends behind the goal line
    pub goal_depth: f32,
}

impl FieldTuning {
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }

    pub fn min_x(&self) -> f32 {
        self.padding
    }

    pub fn max_x(&self) -> f32 {
        self.width - self.padding
    }

    pub fn min_y(&self) -> f32 {
        self.padding
    }

    pub fn max_y(&self) -> f32 {
        self.height - self.padding
    }

    /// True when `y` lies inside the goal mouth band
    pub fn in_goal_mouth(&self, y: f32) -> bool {
        (y - self.height / 2.0).abs() <= self.goal_width / 2.0
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PlayerTuning {
    pub base_speed: f32,
    pub sprint_speed: f32,
    pub acceleration: f32,
    /// Velocity multiplier per frame when there is no intent
    pub friction: f32,
    /// Velocity components below this snap to zero
    pub stop_epsilon: f32,
    pub radius: f32,
}

#[derive(Debug, Clone, Copy)]
pub struct BallTuning {
    pub radius: f32,
    /// Velocity multiplier per frame
    pub friction: f32,
    pub max_speed: f32,
    /// Speed kept after bouncing off a touch line
    pub wall_restitution: f32,
    pub stop_epsilon: f32,
}

#[derive(Debug, Clone, Copy)]
pub struct KickTuning {
    pub min_power: f32,
    pub max_power: f32,
    /// Max player-to-ball distance for a kick to connect
    pub distance: f32,
    /// Power gained per second of charge
    pub charge_rate: f32,
    pub cooldown: f32,
    /// Spin is drawn uniformly from `-spin_range..spin_range`
    pub spin_range: f32,
    /// Kicks harder than this shake the camera
    pub shake_threshold: f32,
    pub shake_per_power: f32,
    pub shake_duration: f32,
    /// Fraction of player velocity handed to the ball on contact
    pub momentum_transfer: f32,
}

impl KickTuning {
    /// Charge time after which power saturates
    pub fn full_charge_secs(&self) -> f32 {
        (self.max_power - self.min_power) / self.charge_rate
    }
}

#[derive(Debug, Clone, Copy)]
pub struct StaminaTuning {
    pub max: f32,
    pub drain_rate: f32,
    pub regen_rate: f32,
    pub regen_delay: f32,
    pub min_to_sprint: f32,
}

#[derive(Debug, Clone, Copy)]
pub struct NetTuning {
    /// Outbound position cadence while moving
    pub position_interval: f32,
    /// Outbound position cadence while idle
    pub heartbeat_interval: f32,
    pub interpolation_factor: f32,
    /// Remote players silent for longer are dropped on the client
    pub liveness_window: f32,
    /// Players silent for longer are evicted by the server
    pub server_idle_timeout: f32,
}

#[derive(Debug, Clone, Copy)]
pub struct CameraTuning {
    pub follow_factor: f32,
    pub shake_decay: f32,
    pub goal_shake: f32,
    pub goal_shake_duration: f32,
    pub contact_shake: f32,
    pub contact_shake_duration: f32,
}

#[derive(Debug, Clone, Copy)]
pub struct MatchTuning {
    pub duration: f32,
    pub celebration: f32,
    pub countdown: f32,
    pub rematch_delay: f32,
    pub max_players: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct SceneTuning {
    pub portal_center: Vec2,
    pub portal_radius: f32,
    pub transition_duration: f32,
    pub ground_spawn: Vec2,
    pub fallback_overworld: Vec2,
}

/// Every tunable the simulation reads
#[derive(Debug, Clone, Copy)]
pub struct Tuning {
    pub field: FieldTuning,
    pub player: PlayerTuning,
    pub ball: BallTuning,
    pub kick: KickTuning,
    pub stamina: StaminaTuning,
    pub net: NetTuning,
    pub camera: CameraTuning,
    pub matches: MatchTuning,
    pub scene: SceneTuning,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            field: FieldTuning {
                width: 800.0,
                height: 600.0,
                padding: 50.0,
                goal_width: 80.0,
                goal_depth: 25.0,
            },
            player: PlayerTuning {
                base_speed: 0.8,
                sprint_speed: 1.3,
                acceleration: 0.05,
                friction: 0.90,
                stop_epsilon: 0.01,
                radius: 15.0,
            },
            ball: BallTuning {
                radius: 10.0,
                friction: 0.985,
                max_speed: 20.0,
                wall_restitution: 0.7,
                stop_epsilon: 0.01,
            },
            kick: KickTuning {
                min_power: 5.0,
                max_power: 18.0,
                distance: 45.0,
                charge_rate: 15.0,
                cooldown: 0.3,
                spin_range: 0.15,
                shake_threshold: 12.0,
                shake_per_power: 0.3,
                shake_duration: 0.2,
                momentum_transfer: 0.6,
            },
            stamina: StaminaTuning {
                max: 100.0,
                drain_rate: 25.0,
                regen_rate: 15.0,
                regen_delay: 1.0,
                min_to_sprint: 10.0,
            },
            net: NetTuning {
                position_interval: 0.033,
                heartbeat_interval: 1.0,
                interpolation_factor: 0.2,
                liveness_window: 5.0,
                server_idle_timeout: 30.0,
            },
            camera: CameraTuning {
                follow_factor: 0.08,
                shake_decay: 0.9,
                goal_shake: 15.0,
                goal_shake_duration: 0.5,
                contact_shake: 2.0,
                contact_shake_duration: 0.05,
            },
            matches: MatchTuning {
                duration: 300.0,
                celebration: 3.0,
                countdown: 3.0,
                rematch_delay: 10.0,
                max_players: 22,
            },
            scene: SceneTuning {
                portal_center: Vec2::new(1350.0, 800.0),
                portal_radius: 160.0,
                transition_duration: 0.35,
                ground_spawn: Vec2::new(400.0, 300.0),
                fallback_overworld: Vec2::new(1150.0, 500.0),
            },
        }
    }
}
