//! Moving between the overworld and the football ground

use glam::Vec2;

use crate::game::tuning::SceneTuning;

/// Which way a transition is heading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Heading {
    In,
    Out,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SceneState {
    Outside,
    Transitioning { heading: Heading, elapsed: f32 },
    Inside,
}

/// Completed transitions the host must act on
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SceneEvent {
    /// Now on the ground; place the player at `spawn` and join
    Entered { spawn: Vec2 },
    /// Back in the overworld at the saved position
    Exited { restore: Vec2 },
}

#[derive(Debug, Clone)]
pub struct SceneController {
    state: SceneState,
    overworld_position: Option<Vec2>,
    tuning: SceneTuning,
}

impl SceneController {
    pub fn new(tuning: SceneTuning) -> Self {
        Self {
            state: SceneState::Outside,
            overworld_position: None,
            tuning,
        }
    }

    pub fn state(&self) -> SceneState {
        self.state
    }

    pub fn is_inside(&self) -> bool {
        self.state == SceneState::Inside
    }

    pub fn near_portal(&self, position: Vec2) -> bool {
        position.distance(self.tuning.portal_center) <= self.tuning.portal_radius
    }

    /// Start entering from the overworld; only next to the portal
    pub fn enter(&mut self, position: Vec2) -> bool {
        if self.state != SceneState::Outside || !self.near_portal(position) {
            return false;
        }
        self.overworld_position = Some(position);
        self.state = SceneState::Transitioning {
            heading: Heading::In,
            elapsed: 0.0,
        };
        true
    }

    /// Resume on the ground with no saved overworld position (reconnects)
    pub fn start_inside(&mut self) {
        self.state = SceneState::Inside;
        self.overworld_position = None;
    }

    /// Start leaving the ground
    pub fn exit(&mut self) -> bool {
        if self.state != SceneState::Inside {
            return false;
        }
        self.state = SceneState::Transitioning {
            heading: Heading::Out,
            elapsed: 0.0,
        };
        true
    }

    pub fn update(&mut self, dt: f32) -> Option<SceneEvent> {
        let SceneState::Transitioning { heading, elapsed } = self.state else {
            return None;
        };

        let elapsed = elapsed + dt.max(0.0);
        if elapsed < self.tuning.transition_duration {
            self.state = SceneState::Transitioning { heading, elapsed };
            return None;
        }

        match heading {
            Heading::In => {
                self.state = SceneState::Inside;
                Some(SceneEvent::Entered {
                    spawn: self.tuning.ground_spawn,
                })
            }
            Heading::Out => {
                self.state = SceneState::Outside;
                let restore = self
                    .overworld_position
                    .take()
                    .unwrap_or(self.tuning.fallback_overworld);
                Some(SceneEvent::Exited { restore })
            }
        }
    }

    /// Fade progress in [0, 1]; zero when not transitioning
    pub fn progress(&self) -> f32 {
        match self.state {
            SceneState::Transitioning { elapsed, .. } if self.tuning.transition_duration > 0.0 => {
                (elapsed / self.tuning.transition_duration).clamp(0.0, 1.0)
            }
            _ => 0.0,
        }
    }

    /// Input is ignored only while a transition runs
    pub fn blocks_input(&self) -> bool {
        matches!(self.state, SceneState::Transitioning { .. })
    }
}
