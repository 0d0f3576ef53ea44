//! Authoritative football ground and tick loop

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::interval;
use tracing::{debug, info, warn};

use crate::util::time::{
    tick_delta, unix_millis, GAME_STATE_TPS, SIMULATION_TPS, SNAPSHOT_TPS, TICK_DURATION_MICROS,
};
use crate::ws::protocol::{ClientMsg, PlayerInfo, ServerMsg};

use super::ball::{Ball, BallPhysics};
use super::r#match::{MatchPhase, MatchSession, MatchTransition, Score};
use super::snapshot::SnapshotBuilder;
use super::tuning::Tuning;
use super::{PlayerId, PlayerInput, Team};

/// Who an outbound message is addressed to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    All,
    Only(PlayerId),
    AllExcept(PlayerId),
}

impl Recipient {
    pub fn includes(&self, id: PlayerId) -> bool {
        match self {
            Recipient::All => true,
            Recipient::Only(target) => *target == id,
            Recipient::AllExcept(skip) => *skip != id,
        }
    }
}

/// Addressed message on the ground's broadcast channel
#[derive(Debug, Clone)]
pub struct Outbound {
    pub to: Recipient,
    pub msg: ServerMsg,
}

/// Summary published for health checks
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroundStatus {
    pub players: usize,
    pub phase: MatchPhase,
    pub score: Score,
    pub epoch: u32,
}

/// Player state on the ground (authoritative copy of what clients report)
#[derive(Debug, Clone)]
pub struct GroundPlayer {
    pub id: PlayerId,
    pub name: String,
    pub team: Team,
    pub position: Vec2,
    pub velocity: Vec2,
    /// Highest accepted position sequence
    pub last_seq: u64,
    /// Unix millis of the last message from this player
    pub last_seen: u64,
}

impl GroundPlayer {
    pub fn info(&self) -> PlayerInfo {
        PlayerInfo {
            id: self.id,
            name: self.name.clone(),
            team: self.team,
            x: self.position.x,
            y: self.position.y,
        }
    }
}

/// Trust boundary for client-reported intents
///
/// Every position, kick and contact passes through here before touching
/// authoritative state. Validation (speed checks, reach checks) belongs in an
/// implementation of this trait.
pub trait IntentGate: Send {
    fn admit_position(&mut self, player: &GroundPlayer, position: Vec2, velocity: Vec2) -> bool;

    fn admit_kick(
        &mut self,
        player: &GroundPlayer,
        ball: &Ball,
        velocity: Vec2,
        power: f32,
        spin: f32,
    ) -> bool;

    fn admit_touch(&mut self, player: &GroundPlayer, ball: &Ball, position: Vec2, velocity: Vec2) -> bool;
}

/// Trusts cooperative clients; ball speeds are still capped by [`Ball::set_velocity`]
#[derive(Debug, Default, Clone, Copy)]
pub struct CooperativeGate;

impl IntentGate for CooperativeGate {
    fn admit_position(&mut self, _player: &GroundPlayer, position: Vec2, velocity: Vec2) -> bool {
        position.is_finite() && velocity.is_finite()
    }

    fn admit_kick(
        &mut self,
        _player: &GroundPlayer,
        _ball: &Ball,
        velocity: Vec2,
        power: f32,
        spin: f32,
    ) -> bool {
        velocity.is_finite() && power.is_finite() && spin.is_finite()
    }

    fn admit_touch(&mut self, _player: &GroundPlayer, _ball: &Ball, position: Vec2, velocity: Vec2) -> bool {
        position.is_finite() && velocity.is_finite()
    }
}

/// Ground state (owned by the ground task)
pub struct GroundState {
    pub session: MatchSession,
    pub ball: Ball,
    pub players: HashMap<PlayerId, GroundPlayer>,
    pub tick: u64,
    /// Epoch of the most recent session
    pub epoch: u32,
    /// Seconds spent in the Ended phase
    pub ended_for: f32,
    pub rng: ChaCha8Rng,
}

impl GroundState {
    pub fn new(tuning: &Tuning, seed: u64) -> Self {
        Self {
            session: MatchSession::new(0, tuning.matches),
            ball: Ball::at_center(&tuning.field),
            players: HashMap::new(),
            tick: 0,
            epoch: 0,
            ended_for: 0.0,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Pick the team with fewer players, red on ties
    pub fn balanced_team(&self) -> Team {
        let red = self.players.values().filter(|p| p.team == Team::Red).count();
        let blue = self.players.len() - red;
        if red <= blue {
            Team::Red
        } else {
            Team::Blue
        }
    }

    /// Spawn in the half the team defends, with a little vertical jitter
    pub fn spawn_position(&mut self, team: Team, tuning: &Tuning) -> Vec2 {
        let field = &tuning.field;
        let x = field.width * (0.5 - 0.25 * team.attack_sign());
        let y = field.height / 2.0 + self.rng.gen_range(-50.0..50.0);
        Vec2::new(x, y)
    }

    /// Seconds on the ground clock
    pub fn clock(&self) -> f64 {
        self.tick as f64 / SIMULATION_TPS as f64
    }
}

/// Handle to the running ground
#[derive(Clone)]
pub struct GroundHandle {
    pub input_tx: mpsc::Sender<PlayerInput>,
    pub outbound_tx: broadcast::Sender<Outbound>,
    pub status_rx: watch::Receiver<GroundStatus>,
}

impl GroundHandle {
    pub fn subscribe(&self) -> broadcast::Receiver<Outbound> {
        self.outbound_tx.subscribe()
    }

    pub fn status(&self) -> GroundStatus {
        self.status_rx.borrow().clone()
    }
}

/// The authoritative football ground
pub struct GroundServer {
    state: GroundState,
    tuning: Tuning,
    input_rx: mpsc::Receiver<PlayerInput>,
    outbound_tx: broadcast::Sender<Outbound>,
    status_tx: watch::Sender<GroundStatus>,
    snapshot_builder: SnapshotBuilder,
    gate: Box<dyn IntentGate>,
}

impl GroundServer {
    /// Create a new ground
    pub fn new(tuning: Tuning, seed: u64) -> (Self, GroundHandle) {
        let (input_tx, input_rx) = mpsc::channel(256);
        let (outbound_tx, _) = broadcast::channel(256);
        let (status_tx, status_rx) = watch::channel(GroundStatus::default());

        let handle = GroundHandle {
            input_tx,
            outbound_tx: outbound_tx.clone(),
            status_rx,
        };

        let server = Self {
            state: GroundState::new(&tuning, seed),
            tuning,
            input_rx,
            outbound_tx,
            status_tx,
            snapshot_builder: SnapshotBuilder::new(SIMULATION_TPS, SNAPSHOT_TPS, GAME_STATE_TPS),
            gate: Box::new(CooperativeGate),
        };

        (server, handle)
    }

    /// Replace the trust boundary
    pub fn with_gate(mut self, gate: impl IntentGate + 'static) -> Self {
        self.gate = Box::new(gate);
        self
    }

    /// Run the authoritative tick loop until every input sender is dropped
    pub async fn run(mut self) {
        info!("Football ground open");

        let mut tick_interval = interval(Duration::from_micros(TICK_DURATION_MICROS));
        tick_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tick_interval.tick().await;

            // Drain input queue; inputs are applied between ticks only
            if !self.process_inputs() {
                break;
            }

            self.run_tick();
            self.publish_status();
        }

        info!("Football ground closed");
    }

    /// Process all pending inputs. Returns false once the channel is closed.
    fn process_inputs(&mut self) -> bool {
        loop {
            match self.input_rx.try_recv() {
                Ok(input) => self.handle_input(input),
                Err(mpsc::error::TryRecvError::Empty) => return true,
                Err(mpsc::error::TryRecvError::Disconnected) => return false,
            }
        }
    }

    fn handle_input(&mut self, input: PlayerInput) {
        let id = input.player_id;
        if let Some(player) = self.state.players.get_mut(&id) {
            player.last_seen = input.received_at;
        }

        match input.msg {
            ClientMsg::Join { name, team } => self.handle_join(id, name, team, input.received_at),
            ClientMsg::Position { seq, x, y, vx, vy } => {
                self.handle_position(id, seq, Vec2::new(x, y), Vec2::new(vx, vy))
            }
            ClientMsg::Kick { vx, vy, power, spin } => {
                self.handle_kick(id, Vec2::new(vx, vy), power, spin)
            }
            ClientMsg::BallTouch { x, y, vx, vy } => {
                self.handle_touch(id, Vec2::new(x, y), Vec2::new(vx, vy))
            }
            ClientMsg::Leave => self.handle_leave(id, "left"),
            ClientMsg::Ping { t } => self.send(Recipient::Only(id), ServerMsg::Pong { t }),
        }
    }

    /// Handle player join request
    fn handle_join(&mut self, id: PlayerId, name: Option<String>, team: Option<Team>, now: u64) {
        if self.state.players.contains_key(&id) {
            warn!(player_id = %id, "Player already on the ground");
            self.send(
                Recipient::Only(id),
                ServerMsg::Error {
                    code: "already_joined".to_string(),
                    message: "Already on the ground".to_string(),
                },
            );
            return;
        }

        if self.state.players.len() >= self.tuning.matches.max_players {
            self.send(
                Recipient::Only(id),
                ServerMsg::Error {
                    code: "ground_full".to_string(),
                    message: "Ground is full".to_string(),
                },
            );
            return;
        }

        if self.state.players.is_empty() {
            self.start_new_session();
        }

        let team = team.unwrap_or_else(|| self.state.balanced_team());
        let position = self.state.spawn_position(team, &self.tuning);
        let player = GroundPlayer {
            id,
            name: name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| format!("Player_{}", &id.to_string()[..8])),
            team,
            position,
            velocity: Vec2::ZERO,
            last_seq: 0,
            last_seen: now,
        };
        let info = player.info();
        self.state.players.insert(id, player);

        info!(
            player_id = %id,
            team = ?team,
            player_count = self.state.players.len(),
            "Player joined ground"
        );

        // Notify everyone else of the new player
        self.send(Recipient::AllExcept(id), ServerMsg::PlayerJoined { player: info });

        // Bring the new player up to date
        let players = self.state.players.values().map(GroundPlayer::info).collect();
        self.send(Recipient::Only(id), ServerMsg::PlayersList { players });
        let state = self.state_msg();
        self.send(Recipient::Only(id), state);
        let ball = self
            .snapshot_builder
            .build_ball(self.state.tick, &self.state.ball);
        self.send(Recipient::Only(id), ball);
    }

    /// Handle a throttled position report
    fn handle_position(&mut self, id: PlayerId, seq: u64, position: Vec2, velocity: Vec2) {
        let Some(player) = self.state.players.get_mut(&id) else {
            return;
        };

        if seq <= player.last_seq {
            debug!(player_id = %id, seq, last_seq = player.last_seq, "Dropping stale position");
            return;
        }
        if !self.gate.admit_position(player, position, velocity) {
            debug!(player_id = %id, "Position refused by gate");
            return;
        }

        player.last_seq = seq;
        player.position = position;
        player.velocity = velocity;

        self.send(
            Recipient::AllExcept(id),
            ServerMsg::PlayerMoved {
                id,
                seq,
                x: position.x,
                y: position.y,
                vx: velocity.x,
                vy: velocity.y,
            },
        );
    }

    /// Handle a kick intent
    fn handle_kick(&mut self, id: PlayerId, velocity: Vec2, power: f32, spin: f32) {
        if !self.state.session.is_playing() {
            debug!(player_id = %id, "Kick ignored outside play");
            return;
        }
        let Some(player) = self.state.players.get(&id) else {
            return;
        };
        if !self.gate.admit_kick(player, &self.state.ball, velocity, power, spin) {
            debug!(player_id = %id, "Kick refused by gate");
            return;
        }

        let now = self.state.clock();
        let ball = &mut self.state.ball;
        ball.set_velocity(velocity, &self.tuning.ball);
        ball.spin = spin.clamp(-self.tuning.kick.spin_range, self.tuning.kick.spin_range);
        ball.attribute(id, now);
        self.snapshot_builder.force_next();

        debug!(player_id = %id, power, "Kick applied");
    }

    /// Handle an optimistic body contact
    fn handle_touch(&mut self, id: PlayerId, position: Vec2, velocity: Vec2) {
        if !self.state.session.is_playing() {
            return;
        }
        let Some(player) = self.state.players.get(&id) else {
            return;
        };
        if !self.gate.admit_touch(player, &self.state.ball, position, velocity) {
            debug!(player_id = %id, "Contact refused by gate");
            return;
        }

        let now = self.state.clock();
        let ball = &mut self.state.ball;
        ball.position = position;
        ball.set_velocity(velocity, &self.tuning.ball);
        ball.attribute(id, now);
        self.snapshot_builder.force_next();
    }

    /// Handle player leave
    fn handle_leave(&mut self, id: PlayerId, reason: &str) {
        if self.state.players.remove(&id).is_none() {
            return;
        }

        self.send(Recipient::All, ServerMsg::PlayerLeft { id });
        info!(
            player_id = %id,
            reason,
            player_count = self.state.players.len(),
            "Player left ground"
        );

        if self.state.players.is_empty() {
            self.reset_session();
        }
    }

    /// Run a single simulation tick
    fn run_tick(&mut self) {
        self.state.tick += 1;
        let dt = tick_delta();

        match self.state.session.tick(dt) {
            Some(MatchTransition::KickOff) => {
                info!(epoch = self.state.session.epoch(), "Kick-off");
                self.broadcast_state();
            }
            Some(MatchTransition::Restart) => {
                self.state.ball.reset(&self.tuning.field);
                self.snapshot_builder.force_next();
                self.broadcast_state();
            }
            Some(MatchTransition::FullTime) => {
                let score = self.state.session.score();
                info!(
                    epoch = self.state.session.epoch(),
                    red = score.red,
                    blue = score.blue,
                    "Full time"
                );
                self.state.ended_for = 0.0;
                self.broadcast_state();
            }
            None => {}
        }

        match self.state.session.phase() {
            MatchPhase::Playing | MatchPhase::GoalCelebration => self.update_ball(dt),
            MatchPhase::Ended => {
                self.state.ended_for += dt;
                if self.state.ended_for >= self.tuning.matches.rematch_delay
                    && !self.state.players.is_empty()
                {
                    self.start_new_session();
                }
            }
            MatchPhase::Waiting | MatchPhase::Countdown => {}
        }

        self.evict_idle_players();

        if self.snapshot_builder.should_send_ball(&self.state.ball) {
            let msg = self
                .snapshot_builder
                .build_ball(self.state.tick, &self.state.ball);
            self.send(Recipient::All, msg);
        }
        if self.snapshot_builder.should_send_state() {
            self.broadcast_state();
        }
    }

    /// Advance the authoritative ball and score goals
    fn update_ball(&mut self, dt: f32) {
        let Some(goal) =
            BallPhysics::step(&mut self.state.ball, dt, &self.tuning.ball, &self.tuning.field)
        else {
            return;
        };

        let Some(score) = self.state.session.record_goal(goal) else {
            return;
        };

        info!(
            team = ?goal.team,
            scored_by = ?goal.scored_by,
            red = score.red,
            blue = score.blue,
            "Goal scored"
        );

        self.send(
            Recipient::All,
            ServerMsg::GoalScored {
                epoch: self.state.session.epoch(),
                team: goal.team,
                score,
                scored_by: goal.scored_by,
            },
        );
        self.snapshot_builder.force_next();
    }

    /// Remove players that stopped talking without closing their socket
    fn evict_idle_players(&mut self) {
        let timeout_ms = (self.tuning.net.server_idle_timeout * 1000.0) as u64;
        let now = unix_millis();
        let idle: Vec<PlayerId> = self
            .state
            .players
            .values()
            .filter(|p| now.saturating_sub(p.last_seen) > timeout_ms)
            .map(|p| p.id)
            .collect();

        for id in idle {
            self.handle_leave(id, "timeout");
        }
    }

    /// Replace the current session with a fresh one and start the countdown
    fn start_new_session(&mut self) {
        self.state.epoch += 1;
        self.state.session = MatchSession::new(self.state.epoch, self.tuning.matches);
        self.state.session.begin_countdown();
        self.state.ball.reset(&self.tuning.field);
        self.state.ended_for = 0.0;
        self.snapshot_builder.force_next();

        info!(epoch = self.state.epoch, "New session");
        self.broadcast_state();
    }

    /// Back to defaults once the ground is empty
    fn reset_session(&mut self) {
        self.state.session = MatchSession::new(self.state.epoch, self.tuning.matches);
        self.state.ball.reset(&self.tuning.field);
        self.state.ended_for = 0.0;
        info!(epoch = self.state.epoch, "Ground empty, session reset");
    }

    fn state_msg(&self) -> ServerMsg {
        self.snapshot_builder
            .build_state(self.state.tick, &self.state.session, &self.state.ball)
    }

    fn broadcast_state(&mut self) {
        let msg = self.state_msg();
        self.send(Recipient::All, msg);
    }

    fn send(&self, to: Recipient, msg: ServerMsg) {
        // No receivers just means nobody is connected
        let _ = self.outbound_tx.send(Outbound { to, msg });
    }

    fn publish_status(&self) {
        let status = GroundStatus {
            players: self.state.players.len(),
            phase: self.state.session.phase(),
            score: self.state.session.score(),
            epoch: self.state.session.epoch(),
        };
        self.status_tx.send_if_modified(|current| {
            if *current == status {
                false
            } else {
                *current = status;
                true
            }
        });
    }
}
