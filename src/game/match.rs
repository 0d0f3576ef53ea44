//! Match session state: phase, score and timers

use serde::{Deserialize, Serialize};

use super::ball::GoalScored;
use super::tuning::MatchTuning;
use super::Team;

/// Match phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPhase {
    /// Nobody has kicked off yet
    #[default]
    Waiting,
    /// Short countdown before kick-off
    Countdown,
    /// Ball in play, clock running
    Playing,
    /// Control frozen after a goal
    GoalCelebration,
    /// Time is up; terminal for this session
    Ended,
}

/// Goals per team
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub red: u32,
    pub blue: u32,
}

impl Score {
    pub fn get(&self, team: Team) -> u32 {
        match team {
            Team::Red => self.red,
            Team::Blue => self.blue,
        }
    }

    pub fn add_goal(&mut self, team: Team) {
        match team {
            Team::Red => self.red += 1,
            Team::Blue => self.blue += 1,
        }
    }

    /// Per-team max, so a late or reordered sample never lowers a count
    pub fn merge(&mut self, other: Score) {
        self.red = self.red.max(other.red);
        self.blue = self.blue.max(other.blue);
    }
}

/// Phase changes the owner must react to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchTransition {
    /// Play starts (from Waiting or Countdown)
    KickOff,
    /// Celebration over; reset the ball to the centre spot
    Restart,
    /// Match clock reached zero
    FullTime,
}

/// One match between the players on the ground
#[derive(Debug, Clone)]
pub struct MatchSession {
    epoch: u32,
    phase: MatchPhase,
    score: Score,
    time_remaining: f32,
    /// Countdown or celebration time left
    phase_timer: f32,
    last_goal: Option<GoalScored>,
    tuning: MatchTuning,
}

impl MatchSession {
    pub fn new(epoch: u32, tuning: MatchTuning) -> Self {
        Self {
            epoch,
            phase: MatchPhase::Waiting,
            score: Score::default(),
            time_remaining: tuning.duration,
            phase_timer: 0.0,
            last_goal: None,
            tuning,
        }
    }

    pub fn epoch(&self) -> u32 {
        self.epoch
    }

    pub fn phase(&self) -> MatchPhase {
        self.phase
    }

    pub fn score(&self) -> Score {
        self.score
    }

    pub fn time_remaining(&self) -> f32 {
        self.time_remaining
    }

    pub fn last_goal(&self) -> Option<GoalScored> {
        self.last_goal
    }

    /// Player control and ball play are live
    pub fn is_playing(&self) -> bool {
        self.phase == MatchPhase::Playing
    }

    /// Waiting -> Countdown
    pub fn begin_countdown(&mut self) -> bool {
        if self.phase != MatchPhase::Waiting {
            return false;
        }
        self.phase = MatchPhase::Countdown;
        self.phase_timer = self.tuning.countdown;
        true
    }

    /// Waiting | Countdown -> Playing
    pub fn start(&mut self) -> bool {
        if !matches!(self.phase, MatchPhase::Waiting | MatchPhase::Countdown) {
            return false;
        }
        self.phase = MatchPhase::Playing;
        self.phase_timer = 0.0;
        true
    }

    /// Authoritative goal detection (server side)
    ///
    /// Only counts while playing. Returns the updated score.
    pub fn record_goal(&mut self, goal: GoalScored) -> Option<Score> {
        if self.phase != MatchPhase::Playing {
            return None;
        }
        self.score.add_goal(goal.team);
        self.celebrate(goal);
        Some(self.score)
    }

    /// Apply a `goal:scored` broadcast (client side)
    ///
    /// Applied in delivery order; the score is taken from the server.
    pub fn apply_goal(&mut self, goal: GoalScored, score: Score) {
        self.score.merge(score);
        if self.phase != MatchPhase::Ended {
            self.celebrate(goal);
        }
    }

    /// Apply an aggregate `game:state` broadcast (client side)
    pub fn apply_state(
        &mut self,
        phase: MatchPhase,
        is_playing: bool,
        time_remaining: f32,
        score: Score,
    ) -> Option<MatchTransition> {
        if self.phase == MatchPhase::Ended {
            return None;
        }
        self.score.merge(score);
        self.time_remaining = time_remaining.max(0.0);

        if phase == MatchPhase::Ended {
            self.phase = MatchPhase::Ended;
            return Some(MatchTransition::FullTime);
        }
        if is_playing {
            let kick_off = matches!(self.phase, MatchPhase::Waiting | MatchPhase::Countdown);
            self.phase = MatchPhase::Playing;
            return kick_off.then_some(MatchTransition::KickOff);
        }

        match phase {
            MatchPhase::GoalCelebration if self.phase != MatchPhase::GoalCelebration => {
                self.phase = MatchPhase::GoalCelebration;
                self.phase_timer = self.tuning.celebration;
            }
            MatchPhase::Countdown if self.phase != MatchPhase::Countdown => {
                self.phase = MatchPhase::Countdown;
                self.phase_timer = self.tuning.countdown;
            }
            MatchPhase::Waiting => self.phase = MatchPhase::Waiting,
            _ => {}
        }
        None
    }

    /// Advance timers by `dt` seconds
    pub fn tick(&mut self, dt: f32) -> Option<MatchTransition> {
        let dt = dt.max(0.0);
        match self.phase {
            MatchPhase::Waiting | MatchPhase::Ended => None,
            MatchPhase::Countdown => {
                self.phase_timer -= dt;
                if self.phase_timer <= 0.0 {
                    self.start();
                    Some(MatchTransition::KickOff)
                } else {
                    None
                }
            }
            MatchPhase::Playing => {
                self.time_remaining = (self.time_remaining - dt).max(0.0);
                if self.time_remaining <= 0.0 {
                    self.phase = MatchPhase::Ended;
                    Some(MatchTransition::FullTime)
                } else {
                    None
                }
            }
            MatchPhase::GoalCelebration => {
                self.phase_timer -= dt;
                if self.phase_timer <= 0.0 {
                    self.phase = MatchPhase::Playing;
                    self.phase_timer = 0.0;
                    Some(MatchTransition::Restart)
                } else {
                    None
                }
            }
        }
    }

    fn celebrate(&mut self, goal: GoalScored) {
        self.phase = MatchPhase::GoalCelebration;
        self.phase_timer = self.tuning.celebration;
        self.last_goal = Some(goal);
    }
}
