//! Client-side simulation engine
//!
//! [`ClientSim`] owns one client's full copy of the ground: the local player,
//! remote players, a display copy of the ball and the match session. Network
//! messages are queued with [`ClientSim::push_message`] at any time and applied
//! at the start of the next [`ClientSim::frame`], never mid-frame.

pub mod camera;
pub mod local;
pub mod scene;
pub mod sync;

use glam::Vec2;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::VecDeque;
use tracing::{debug, info, warn};

use crate::game::ball::{Ball, BallPhysics, GoalScored};
use crate::game::collision::resolve_player_ball;
use crate::game::kick::KickOutcome;
use crate::game::movement::MoveIntent;
use crate::game::r#match::{MatchPhase, MatchSession, MatchTransition, Score};
use crate::game::{PlayerId, Team, Tuning};
use crate::ws::protocol::{BallState, ClientMsg, PlayerInfo, ServerMsg};

use camera::CameraRig;
use local::{LocalPlayer, LocalStats};
use sync::SyncLayer;

/// Controls sampled by the host for one frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameInput {
    pub movement: MoveIntent,
    pub sprint: bool,
    /// Kick control held; charge starts on press and fires on release
    pub kick: bool,
}

/// Things that happened during a frame, for rendering and reward hooks
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    Welcomed { id: PlayerId },
    Joined { team: Team, position: Vec2 },
    PlayerJoined { id: PlayerId },
    PlayerLeft { id: PlayerId },
    Kicked { power: f32 },
    Contact,
    /// Authoritative goal; `local_scorer` is the reward hook
    Goal {
        team: Team,
        scored_by: Option<PlayerId>,
        local_scorer: bool,
    },
    NewSession { epoch: u32 },
    KickOff,
    Restart,
    FullTime { score: Score },
    ServerError { code: String, message: String },
}

/// What a frame produced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameOutput {
    /// Intents to send, in order
    pub outbound: Vec<ClientMsg>,
    pub events: Vec<ClientEvent>,
}

/// Read-only HUD data for the local player
#[derive(Debug, Clone, PartialEq)]
pub struct LocalView {
    pub id: PlayerId,
    pub team: Team,
    pub position: Vec2,
    pub velocity: Vec2,
    pub facing: Vec2,
    pub stamina: f32,
    pub sprinting: bool,
    pub charge_percent: f32,
    pub stats: LocalStats,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RemoteView {
    pub id: PlayerId,
    pub name: String,
    pub team: Team,
    pub position: Vec2,
}

/// Per-frame snapshot for rendering
#[derive(Debug, Clone, PartialEq)]
pub struct FrameView {
    pub local: Option<LocalView>,
    pub remotes: Vec<RemoteView>,
    pub ball: BallState,
    pub epoch: u32,
    pub score: Score,
    pub phase: MatchPhase,
    pub time_remaining: f32,
    pub camera: Vec2,
    pub shake_offset: Vec2,
    pub rtt_ms: Option<f64>,
}

/// One client's simulation
pub struct ClientSim {
    tuning: Tuning,
    /// Seconds accumulated from frame deltas
    now: f64,
    id: Option<PlayerId>,
    joining: bool,
    local: Option<LocalPlayer>,
    ball: Ball,
    session: MatchSession,
    sync: SyncLayer,
    camera: CameraRig,
    inbox: VecDeque<ServerMsg>,
    events: Vec<ClientEvent>,
    kick_held: bool,
    rng: ChaCha8Rng,
}

impl ClientSim {
    pub fn new(tuning: Tuning, seed: u64) -> Self {
        Self {
            now: 0.0,
            id: None,
            joining: false,
            local: None,
            ball: Ball::at_center(&tuning.field),
            session: MatchSession::new(0, tuning.matches),
            sync: SyncLayer::new(),
            camera: CameraRig::new(tuning.field.center(), seed.wrapping_add(1)),
            inbox: VecDeque::new(),
            events: Vec::new(),
            kick_held: false,
            rng: ChaCha8Rng::seed_from_u64(seed),
            tuning,
        }
    }

    pub fn id(&self) -> Option<PlayerId> {
        self.id
    }

    pub fn local(&self) -> Option<&LocalPlayer> {
        self.local.as_ref()
    }

    pub fn ball(&self) -> &Ball {
        &self.ball
    }

    pub fn session(&self) -> &MatchSession {
        &self.session
    }

    pub fn sync(&self) -> &SyncLayer {
        &self.sync
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn now(&self) -> f64 {
        self.now
    }

    /// Queue an inbound message for the next frame
    pub fn push_message(&mut self, msg: ServerMsg) {
        self.inbox.push_back(msg);
    }

    /// Ask to join the ground; the local player appears once the server lists it
    pub fn join_ground(&mut self, name: Option<String>, team: Option<Team>) -> bool {
        if self.local.is_some() || self.joining {
            return false;
        }
        self.joining = true;
        self.sync.queue(ClientMsg::Join { name, team });
        true
    }

    /// Leave the ground and drop everything tied to it
    pub fn leave_ground(&mut self) -> bool {
        if self.local.is_none() && !self.joining {
            return false;
        }
        self.reset_ground();
        self.sync.queue(ClientMsg::Leave);
        true
    }

    /// Connection lost: tear down the session; nothing in flight is retried
    pub fn on_disconnect(&mut self) {
        self.reset_ground();
        self.inbox.clear();
        self.id = None;
        self.events.clear();
        info!("Disconnected, ground state cleared");
    }

    /// Advance one render frame of `dt` seconds
    pub fn frame(&mut self, dt: f32, input: &FrameInput) -> FrameOutput {
        let dt = dt.max(0.0);
        self.now += dt as f64;

        while let Some(msg) = self.inbox.pop_front() {
            self.handle_message(msg);
        }

        self.update_local(dt, input);

        if let Some(goal) =
            BallPhysics::step(&mut self.ball, dt, &self.tuning.ball, &self.tuning.field)
        {
            debug!(team = ?goal.team, "Discarding locally detected goal");
        }

        if let Some(transition) = self.session.tick(dt) {
            self.on_transition(transition);
        }

        self.sync.interpolate(dt, &self.tuning.net);
        for id in self.sync.prune(self.now, &self.tuning.net) {
            self.events.push(ClientEvent::PlayerLeft { id });
        }

        let focus = self
            .local
            .as_ref()
            .map_or(self.tuning.field.center(), |p| p.body.position);
        self.camera.update(focus, dt, &self.tuning.camera);

        if self.id.is_some() {
            let now_ms = self.now_ms();
            self.sync.maybe_ping(dt, now_ms);
        }

        FrameOutput {
            outbound: self.sync.drain_outbox(),
            events: std::mem::take(&mut self.events),
        }
    }

    pub fn view(&self) -> FrameView {
        let local = self.local.as_ref().map(|p| LocalView {
            id: p.id,
            team: p.team,
            position: p.body.position,
            velocity: p.body.velocity,
            facing: p.body.facing,
            stamina: p.stamina.value(),
            sprinting: p.stamina.is_sprinting(),
            charge_percent: p.kick.charge_percent(self.now, &self.tuning.kick),
            stats: p.stats,
        });
        let mut remotes: Vec<RemoteView> = self
            .sync
            .remotes()
            .map(|r| RemoteView {
                id: r.id,
                name: r.name.clone(),
                team: r.team,
                position: r.position,
            })
            .collect();
        remotes.sort_by_key(|r| r.id);

        FrameView {
            local,
            remotes,
            ball: self.ball.to_state(),
            epoch: self.session.epoch(),
            score: self.session.score(),
            phase: self.session.phase(),
            time_remaining: self.session.time_remaining(),
            camera: self.camera.view(),
            shake_offset: self.camera.shake_offset(),
            rtt_ms: self.sync.rtt_ms(),
        }
    }

    fn now_ms(&self) -> u64 {
        (self.now * 1000.0) as u64
    }

    /// Movement, kick and contact for the local player
    fn update_local(&mut self, dt: f32, input: &FrameInput) {
        let pressed = input.kick && !self.kick_held;
        let released = !input.kick && self.kick_held;
        self.kick_held = input.kick;

        let Some(player) = self.local.as_mut() else {
            return;
        };
        let tuning = &self.tuning;
        let live = self.session.is_playing();

        let direction = if live {
            input.movement.direction()
        } else {
            Vec2::ZERO
        };
        player.update(direction, input.sprint && live, dt, tuning);

        if !live {
            player.kick.cancel();
        } else {
            if pressed {
                player.kick.begin_charge(self.now);
            }
            let distance = player.body.position.distance(self.ball.position);
            if player.kick.track_range(distance, &tuning.kick) {
                debug!("Kick charge cleared, ball out of reach");
            }
            if released {
                let outcome = player.kick.release(
                    self.now,
                    player.body.position,
                    player.body.facing,
                    &self.ball,
                    &tuning.kick,
                    &mut self.rng,
                );
                if let KickOutcome::Kicked(kick) = outcome {
                    kick.apply(&mut self.ball, player.id, self.now, &tuning.ball);
                    player.stats.kicks += 1;
                    if let Some((intensity, secs)) = kick.shake(&tuning.kick) {
                        self.camera.shake(intensity, secs);
                    }
                    self.sync.queue(ClientMsg::Kick {
                        vx: self.ball.velocity.x,
                        vy: self.ball.velocity.y,
                        power: kick.power,
                        spin: kick.spin,
                    });
                    self.events.push(ClientEvent::Kicked { power: kick.power });
                }
            }

            if let Some(contact) = resolve_player_ball(
                player.body.position,
                player.body.velocity,
                player.body.facing,
                &mut self.ball,
                &tuning.player,
                &tuning.ball,
                &tuning.kick,
            ) {
                self.ball.attribute(player.id, self.now);
                self.camera
                    .shake(tuning.camera.contact_shake, tuning.camera.contact_shake_duration);
                self.sync.queue(ClientMsg::BallTouch {
                    x: contact.ball_position.x,
                    y: contact.ball_position.y,
                    vx: contact.ball_velocity.x,
                    vy: contact.ball_velocity.y,
                });
                self.events.push(ClientEvent::Contact);
            }
        }

        self.sync.throttle_position(&player.body, dt, &tuning.net);
    }

    /// Dispatch one inbound message by tag
    fn handle_message(&mut self, msg: ServerMsg) {
        match msg {
            ServerMsg::Welcome { id, .. } => {
                self.id = Some(id);
                self.events.push(ClientEvent::Welcomed { id });
            }
            ServerMsg::PlayerJoined { player } => self.on_player_joined(&player),
            ServerMsg::PlayerLeft { id } => {
                if self.sync.remove_remote(id) {
                    self.events.push(ClientEvent::PlayerLeft { id });
                }
            }
            ServerMsg::PlayerMoved {
                id,
                seq,
                x,
                y,
                vx,
                vy,
            } => {
                // Our own movement is never taken from an echo
                if Some(id) != self.id {
                    self.sync
                        .apply_moved(id, seq, Vec2::new(x, y), Vec2::new(vx, vy), self.now);
                }
            }
            ServerMsg::PlayersList { players } => {
                for player in &players {
                    self.on_player_joined(player);
                }
            }
            ServerMsg::BallUpdate { tick, ball } => {
                if self.sync.accept_ball_tick(tick) {
                    self.ball.overwrite(&ball, &self.tuning.field);
                }
            }
            ServerMsg::GoalScored {
                epoch,
                team,
                score,
                scored_by,
            } => {
                if self.track_epoch(epoch) {
                    self.on_goal(GoalScored { team, scored_by }, score);
                }
            }
            ServerMsg::GameState {
                epoch,
                tick,
                ball,
                score,
                is_playing,
                match_time,
                phase,
            } => {
                if !self.sync.accept_state_tick(tick) || !self.track_epoch(epoch) {
                    return;
                }
                if self.sync.accept_ball_tick(tick) {
                    self.ball.overwrite(&ball, &self.tuning.field);
                }
                if let Some(transition) =
                    self.session
                        .apply_state(phase, is_playing, match_time, score)
                {
                    self.on_transition(transition);
                }
            }
            ServerMsg::Pong { t } => {
                let now_ms = self.now_ms();
                self.sync.record_pong(t, now_ms);
            }
            ServerMsg::Error { code, message } => {
                warn!(%code, %message, "Server rejected request");
                if code == "ground_full" {
                    self.joining = false;
                }
                self.events.push(ClientEvent::ServerError { code, message });
            }
        }
    }

    fn on_player_joined(&mut self, player: &PlayerInfo) {
        if Some(player.id) != self.id {
            self.sync.upsert_remote(player, self.now);
            self.events.push(ClientEvent::PlayerJoined { id: player.id });
            return;
        }
        if self.local.is_some() {
            return;
        }

        let position = Vec2::new(player.x, player.y);
        self.local = Some(LocalPlayer::spawn(
            player.id,
            player.name.clone(),
            player.team,
            position,
            &self.tuning,
        ));
        self.joining = false;
        self.camera.snap_to(position);
        info!(player_id = %player.id, team = ?player.team, "Joined ground");
        self.events.push(ClientEvent::Joined {
            team: player.team,
            position,
        });
    }

    /// Returns false for messages from an older session
    fn track_epoch(&mut self, epoch: u32) -> bool {
        let current = self.session.epoch();
        if epoch < current {
            debug!(epoch, current, "Dropping message from an old session");
            return false;
        }
        if epoch > current {
            self.session = MatchSession::new(epoch, self.tuning.matches);
            self.events.push(ClientEvent::NewSession { epoch });
        }
        true
    }

    fn on_goal(&mut self, goal: GoalScored, score: Score) {
        self.session.apply_goal(goal, score);
        self.camera.shake(
            self.tuning.camera.goal_shake,
            self.tuning.camera.goal_shake_duration,
        );

        let local_scorer = goal.scored_by.is_some() && goal.scored_by == self.id;
        if let Some(player) = self.local.as_mut() {
            player.kick.cancel();
            if local_scorer {
                player.stats.goals += 1;
            }
        }

        self.events.push(ClientEvent::Goal {
            team: goal.team,
            scored_by: goal.scored_by,
            local_scorer,
        });
    }

    fn on_transition(&mut self, transition: MatchTransition) {
        match transition {
            MatchTransition::KickOff => self.events.push(ClientEvent::KickOff),
            MatchTransition::Restart => {
                self.ball.reset(&self.tuning.field);
                self.events.push(ClientEvent::Restart);
            }
            MatchTransition::FullTime => {
                if let Some(player) = self.local.as_mut() {
                    player.kick.cancel();
                }
                self.events.push(ClientEvent::FullTime {
                    score: self.session.score(),
                });
            }
        }
    }

    fn reset_ground(&mut self) {
        self.local = None;
        self.joining = false;
        self.kick_held = false;
        self.sync.clear();
        self.session = MatchSession::new(0, self.tuning.matches);
        self.ball.reset(&self.tuning.field);
        self.camera.snap_to(self.tuning.field.center());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    const DT: f32 = 1.0 / 60.0;

    fn info(id: PlayerId, team: Team, x: f32, y: f32) -> PlayerInfo {
        PlayerInfo {
            id,
            name: "p".into(),
            team,
            x,
            y,
        }
    }

    fn state(epoch: u32, tick: u64, phase: MatchPhase, score: Score, ball: BallState) -> ServerMsg {
        ServerMsg::GameState {
            epoch,
            tick,
            ball,
            score,
            is_playing: phase == MatchPhase::Playing,
            match_time: 200.0,
            phase,
        }
    }

    fn center_ball() -> BallState {
        BallState {
            x: 400.0,
            y: 300.0,
            ..BallState::default()
        }
    }

    /// Welcomed, joined as Blue at `spawn`, session 1 playing
    fn joined_sim(spawn: Vec2) -> (ClientSim, PlayerId) {
        let mut sim = ClientSim::new(Tuning::default(), 11);
        let id = Uuid::new_v4();
        sim.push_message(ServerMsg::Welcome { id, server_time: 0 });
        sim.join_ground(None, Some(Team::Blue));
        sim.push_message(ServerMsg::PlayersList {
            players: vec![info(id, Team::Blue, spawn.x, spawn.y)],
        });
        sim.push_message(state(1, 1, MatchPhase::Playing, Score::default(), center_ball()));
        sim.frame(DT, &FrameInput::default());
        (sim, id)
    }

    #[test]
    fn join_creates_local_player_from_server_listing() {
        let mut sim = ClientSim::new(Tuning::default(), 1);
        let id = Uuid::new_v4();
        sim.push_message(ServerMsg::Welcome { id, server_time: 0 });
        assert!(sim.join_ground(Some("me".into()), None));
        assert!(!sim.join_ground(None, None));

        let out = sim.frame(DT, &FrameInput::default());
        assert_eq!(
            out.outbound,
            vec![ClientMsg::Join {
                name: Some("me".into()),
                team: None
            }]
        );
        assert!(sim.local().is_none());

        sim.push_message(ServerMsg::PlayersList {
            players: vec![info(id, Team::Red, 600.0, 310.0), info(Uuid::new_v4(), Team::Blue, 200.0, 300.0)],
        });
        let out = sim.frame(DT, &FrameInput::default());
        let local = sim.local().expect("local player");
        assert_eq!(local.team, Team::Red);
        assert_eq!(local.body.facing, Vec2::NEG_X);
        assert_eq!(sim.sync().remotes().count(), 1);
        assert!(out.events.iter().any(|e| matches!(e, ClientEvent::Joined { team: Team::Red, .. })));
    }

    #[test]
    fn own_echo_never_moves_local_player() {
        let (mut sim, id) = joined_sim(Vec2::new(200.0, 300.0));
        sim.push_message(ServerMsg::PlayerMoved {
            id,
            seq: 99,
            x: 700.0,
            y: 500.0,
            vx: 0.0,
            vy: 0.0,
        });
        sim.frame(DT, &FrameInput::default());
        assert_eq!(sim.local().map(|p| p.body.position), Some(Vec2::new(200.0, 300.0)));
    }

    #[test]
    fn local_goal_waits_for_server() {
        let (mut sim, id) = joined_sim(Vec2::new(200.0, 300.0));
        sim.push_message(ServerMsg::BallUpdate {
            tick: 2,
            ball: BallState {
                x: 745.0,
                y: 300.0,
                vx: 10.0,
                vy: 0.0,
                spin: 0.0,
                last_kicked_by: Some(id),
            },
        });
        sim.frame(DT, &FrameInput::default());
        sim.frame(DT, &FrameInput::default());
        assert!(sim.ball().position.x > 750.0);
        assert_eq!(sim.session().score(), Score::default());
        assert!(sim.session().is_playing());

        sim.push_message(ServerMsg::GoalScored {
            epoch: 1,
            team: Team::Blue,
            score: Score { red: 0, blue: 1 },
            scored_by: Some(id),
        });
        let out = sim.frame(DT, &FrameInput::default());
        assert_eq!(sim.session().score(), Score { red: 0, blue: 1 });
        assert_eq!(sim.session().phase(), MatchPhase::GoalCelebration);
        assert_eq!(sim.local().map(|p| p.stats.goals), Some(1));
        assert!(out.events.contains(&ClientEvent::Goal {
            team: Team::Blue,
            scored_by: Some(id),
            local_scorer: true,
        }));
        assert!(sim.view().shake_offset != Vec2::ZERO);

        // Celebration ends locally with the ball back on the spot
        let mut restarted = false;
        for _ in 0..200 {
            let out = sim.frame(DT, &FrameInput::default());
            restarted |= out.events.contains(&ClientEvent::Restart);
        }
        assert!(restarted);
        assert_eq!(sim.ball().position, Vec2::new(400.0, 300.0));
    }

    #[test]
    fn charged_kick_is_sent_and_applied() {
        let (mut sim, _id) = joined_sim(Vec2::new(370.0, 300.0));
        let hold = FrameInput {
            kick: true,
            ..FrameInput::default()
        };

        let mut outbound = Vec::new();
        for _ in 0..120 {
            outbound.extend(sim.frame(DT, &hold).outbound);
        }
        assert!(sim.view().local.map(|l| l.charge_percent) == Some(100.0));
        let out = sim.frame(DT, &FrameInput::default());
        outbound.extend(out.outbound);

        let kick = outbound.iter().find_map(|m| match m {
            ClientMsg::Kick { vx, vy, power, .. } => Some((*vx, *vy, *power)),
            _ => None,
        });
        assert_eq!(kick, Some((18.0, 0.0, 18.0)));
        assert!(out.events.contains(&ClientEvent::Kicked { power: 18.0 }));
        assert!(sim.ball().velocity.x > 17.0);
        assert_eq!(sim.local().map(|p| p.stats.kicks), Some(1));
        assert!(sim.local().is_some_and(|p| !p.kick.is_charging()));
    }

    #[test]
    fn kick_out_of_range_is_silent() {
        let (mut sim, _id) = joined_sim(Vec2::new(200.0, 300.0));
        let hold = FrameInput {
            kick: true,
            ..FrameInput::default()
        };
        sim.frame(DT, &hold);
        let out = sim.frame(DT, &FrameInput::default());
        assert!(!out.outbound.iter().any(|m| matches!(m, ClientMsg::Kick { .. })));
        assert!(sim.local().is_some_and(|p| !p.kick.is_charging()));
    }

    #[test]
    fn walking_into_ball_sends_touch() {
        let (mut sim, _id) = joined_sim(Vec2::new(360.0, 300.0));
        let run = FrameInput {
            movement: MoveIntent {
                right: true,
                ..MoveIntent::default()
            },
            ..FrameInput::default()
        };
        let mut touched = false;
        for _ in 0..120 {
            let out = sim.frame(DT, &run);
            touched |= out
                .outbound
                .iter()
                .any(|m| matches!(m, ClientMsg::BallTouch { .. }));
        }
        assert!(touched);
        assert!(sim.ball().position.x > 400.0);
    }

    #[test]
    fn out_of_order_remote_positions() {
        let (mut sim, _id) = joined_sim(Vec2::new(200.0, 300.0));
        let other = Uuid::new_v4();
        sim.push_message(ServerMsg::PlayerJoined {
            player: info(other, Team::Red, 600.0, 300.0),
        });
        let moved = |seq, x| ServerMsg::PlayerMoved {
            id: other,
            seq,
            x,
            y: 300.0,
            vx: 0.0,
            vy: 0.0,
        };
        sim.push_message(moved(2, 500.0));
        sim.push_message(moved(1, 550.0));
        sim.frame(DT, &FrameInput::default());
        assert_eq!(sim.sync().remote(other).map(|r| r.target.x), Some(500.0));
    }

    #[test]
    fn new_epoch_replaces_session_and_old_epoch_is_ignored() {
        let (mut sim, _id) = joined_sim(Vec2::new(200.0, 300.0));
        sim.push_message(state(1, 5, MatchPhase::Playing, Score { red: 2, blue: 1 }, center_ball()));
        sim.frame(DT, &FrameInput::default());
        assert_eq!(sim.session().score(), Score { red: 2, blue: 1 });

        sim.push_message(state(2, 6, MatchPhase::Countdown, Score::default(), center_ball()));
        let out = sim.frame(DT, &FrameInput::default());
        assert!(out.events.contains(&ClientEvent::NewSession { epoch: 2 }));
        assert_eq!(sim.session().score(), Score::default());
        assert_eq!(sim.session().phase(), MatchPhase::Countdown);

        sim.push_message(ServerMsg::GoalScored {
            epoch: 1,
            team: Team::Red,
            score: Score { red: 3, blue: 1 },
            scored_by: None,
        });
        sim.frame(DT, &FrameInput::default());
        assert_eq!(sim.session().score(), Score::default());
    }

    #[test]
    fn stale_ball_snapshot_is_dropped() {
        let (mut sim, _id) = joined_sim(Vec2::new(200.0, 300.0));
        let at = |x| BallState {
            x,
            y: 300.0,
            ..BallState::default()
        };
        sim.push_message(ServerMsg::BallUpdate { tick: 10, ball: at(500.0) });
        sim.push_message(ServerMsg::BallUpdate { tick: 8, ball: at(300.0) });
        sim.frame(DT, &FrameInput::default());
        assert_eq!(sim.ball().position.x, 500.0);
    }

    #[test]
    fn stale_match_state_is_ignored() {
        let (mut sim, _id) = joined_sim(Vec2::new(200.0, 300.0));
        sim.push_message(state(1, 40, MatchPhase::Playing, Score { red: 1, blue: 0 }, center_ball()));
        sim.push_message(state(1, 10, MatchPhase::Countdown, Score::default(), center_ball()));
        sim.frame(DT, &FrameInput::default());

        assert_eq!(sim.session().phase(), MatchPhase::Playing);
        assert_eq!(sim.session().score(), Score { red: 1, blue: 0 });
    }

    #[test]
    fn disconnect_clears_everything() {
        let (mut sim, _id) = joined_sim(Vec2::new(200.0, 300.0));
        sim.push_message(ServerMsg::PlayerJoined {
            player: info(Uuid::new_v4(), Team::Red, 600.0, 300.0),
        });
        sim.frame(DT, &FrameInput::default());

        sim.on_disconnect();
        assert!(sim.local().is_none());
        assert!(sim.id().is_none());
        assert_eq!(sim.sync().remotes().count(), 0);
        assert_eq!(sim.session().phase(), MatchPhase::Waiting);
        let out = sim.frame(DT, &FrameInput::default());
        assert!(out.outbound.is_empty());
    }

    #[test]
    fn leave_sends_leave_and_drops_charge() {
        let (mut sim, _id) = joined_sim(Vec2::new(370.0, 300.0));
        sim.frame(
            DT,
            &FrameInput {
                kick: true,
                ..FrameInput::default()
            },
        );
        assert!(sim.leave_ground());
        let out = sim.frame(DT, &FrameInput::default());
        assert_eq!(out.outbound, vec![ClientMsg::Leave]);
        assert!(sim.local().is_none());
        assert!(!sim.leave_ground());
    }

    #[test]
    fn pong_reports_round_trip() {
        let (mut sim, _id) = joined_sim(Vec2::new(200.0, 300.0));
        let mut ping = None;
        for _ in 0..150 {
            let out = sim.frame(DT, &FrameInput::default());
            ping = ping.or(out.outbound.iter().find_map(|m| match m {
                ClientMsg::Ping { t } => Some(*t),
                _ => None,
            }));
        }
        let t = ping.expect("ping sent");
        sim.push_message(ServerMsg::Pong { t });
        sim.frame(DT, &FrameInput::default());
        assert!(sim.view().rtt_ms.is_some_and(|rtt| rtt >= 0.0 && rtt < 1000.0));
    }
}
