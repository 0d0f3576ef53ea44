//! Network sync layer: remote players, outbound throttling and ordering

use glam::Vec2;
use std::collections::HashMap;
use tracing::debug;

use crate::game::movement::Body;
use crate::game::tuning::NetTuning;
use crate::game::{smoothing, PlayerId, Team};
use crate::ws::protocol::{ClientMsg, PlayerInfo};

/// How often the client measures round-trip time
pub const PING_INTERVAL_SECS: f32 = 2.0;

/// A player driven by someone else's client
#[derive(Debug, Clone, PartialEq)]
pub struct RemotePlayer {
    pub id: PlayerId,
    pub name: String,
    pub team: Team,
    /// Last authoritative sample
    pub target: Vec2,
    /// Smoothed display position
    pub position: Vec2,
    pub velocity: Vec2,
    pub last_seq: u64,
    /// Client clock seconds of the last message about this player
    pub last_heard: f64,
}

impl RemotePlayer {
    fn from_info(info: &PlayerInfo, now: f64) -> Self {
        let at = Vec2::new(info.x, info.y);
        Self {
            id: info.id,
            name: info.name.clone(),
            team: info.team,
            target: at,
            position: at,
            velocity: Vec2::ZERO,
            last_seq: 0,
            last_heard: now,
        }
    }
}

/// Client half of the sync protocol
#[derive(Debug, Default)]
pub struct SyncLayer {
    remotes: HashMap<PlayerId, RemotePlayer>,
    outbox: Vec<ClientMsg>,
    next_seq: u64,
    since_position: f32,
    last_sent: Option<(Vec2, Vec2)>,
    since_ping: f32,
    last_ball_tick: Option<u64>,
    last_state_tick: Option<u64>,
    rtt_ms: Option<f64>,
}

impl SyncLayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn remotes(&self) -> impl Iterator<Item = &RemotePlayer> {
        self.remotes.values()
    }

    pub fn remote(&self, id: PlayerId) -> Option<&RemotePlayer> {
        self.remotes.get(&id)
    }

    pub fn rtt_ms(&self) -> Option<f64> {
        self.rtt_ms
    }

    /// Queue an intent for the next flush
    pub fn queue(&mut self, msg: ClientMsg) {
        self.outbox.push(msg);
    }

    pub fn drain_outbox(&mut self) -> Vec<ClientMsg> {
        std::mem::take(&mut self.outbox)
    }

    /// Emit the local position on a fixed cadence
    ///
    /// Every `position_interval` while the body moves or changed since the
    /// last send, otherwise a heartbeat every `heartbeat_interval`.
    pub fn throttle_position(&mut self, body: &Body, dt: f32, tuning: &NetTuning) -> bool {
        self.since_position += dt.max(0.0);

        let changed = self
            .last_sent
            .map_or(true, |(pos, vel)| pos != body.position || vel != body.velocity);
        let interval = if body.is_moving() || changed {
            tuning.position_interval
        } else {
            tuning.heartbeat_interval
        };
        if self.since_position < interval {
            return false;
        }

        self.since_position = 0.0;
        self.next_seq += 1;
        self.last_sent = Some((body.position, body.velocity));
        self.queue(ClientMsg::Position {
            seq: self.next_seq,
            x: body.position.x,
            y: body.position.y,
            vx: body.velocity.x,
            vy: body.velocity.y,
        });
        true
    }

    /// Queue a ping when one is due
    pub fn maybe_ping(&mut self, dt: f32, now_ms: u64) {
        self.since_ping += dt.max(0.0);
        if self.since_ping >= PING_INTERVAL_SECS {
            self.since_ping = 0.0;
            self.queue(ClientMsg::Ping { t: now_ms });
        }
    }

    pub fn record_pong(&mut self, sent_ms: u64, now_ms: u64) {
        self.rtt_ms = Some(now_ms.saturating_sub(sent_ms) as f64);
    }

    /// Add or refresh a remote player from a join or list entry
    pub fn upsert_remote(&mut self, info: &PlayerInfo, now: f64) {
        self.remotes
            .entry(info.id)
            .and_modify(|remote| {
                remote.name = info.name.clone();
                remote.team = info.team;
                remote.last_heard = now;
            })
            .or_insert_with(|| RemotePlayer::from_info(info, now));
    }

    /// Apply a relayed position; returns false when dropped
    pub fn apply_moved(&mut self, id: PlayerId, seq: u64, position: Vec2, velocity: Vec2, now: f64) -> bool {
        let Some(remote) = self.remotes.get_mut(&id) else {
            debug!(player_id = %id, "Position for unknown player");
            return false;
        };
        if seq <= remote.last_seq {
            debug!(player_id = %id, seq, last_seq = remote.last_seq, "Dropping stale position");
            return false;
        }

        remote.last_seq = seq;
        remote.target = position;
        remote.velocity = velocity;
        remote.last_heard = now;
        true
    }

    pub fn remove_remote(&mut self, id: PlayerId) -> bool {
        self.remotes.remove(&id).is_some()
    }

    /// Exponential smoothing of every display position toward its target
    pub fn interpolate(&mut self, dt: f32, tuning: &NetTuning) {
        let alpha = smoothing(tuning.interpolation_factor, dt);
        for remote in self.remotes.values_mut() {
            remote.position += (remote.target - remote.position) * alpha;
        }
    }

    /// Drop remote players not heard from within the liveness window
    pub fn prune(&mut self, now: f64, tuning: &NetTuning) -> Vec<PlayerId> {
        let window = tuning.liveness_window as f64;
        let stale: Vec<PlayerId> = self
            .remotes
            .values()
            .filter(|remote| now - remote.last_heard > window)
            .map(|remote| remote.id)
            .collect();
        for id in &stale {
            self.remotes.remove(id);
            debug!(player_id = %id, "Remote player timed out");
        }
        stale
    }

    /// Accept a ball sample only if it is not older than the newest applied
    pub fn accept_ball_tick(&mut self, tick: u64) -> bool {
        if self.last_ball_tick.is_some_and(|last| tick < last) {
            debug!(tick, "Dropping stale ball state");
            return false;
        }
        self.last_ball_tick = Some(tick);
        true
    }

    /// Accept aggregate match state only if it is not older than the newest applied
    pub fn accept_state_tick(&mut self, tick: u64) -> bool {
        if self.last_state_tick.is_some_and(|last| tick < last) {
            debug!(tick, "Dropping stale match state");
            return false;
        }
        self.last_state_tick = Some(tick);
        true
    }

    /// Forget everything tied to the current ground session
    pub fn clear(&mut self) {
        self.remotes.clear();
        self.outbox.clear();
        self.since_position = 0.0;
        self.last_sent = None;
        self.last_ball_tick = None;
        self.last_state_tick = None;
    }
}
