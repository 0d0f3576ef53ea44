//! WebSocket protocol message definitions
//! These are the wire types for client-server communication

use serde::{Deserialize, Serialize};

use crate::game::{MatchPhase, PlayerId, Score, Team};

/// Messages sent from client to server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum ClientMsg {
    /// Enter the ground; the server picks a team when none is given
    #[serde(rename = "join")]
    Join {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        team: Option<Team>,
    },

    /// Throttled local player state
    #[serde(rename = "position")]
    Position {
        /// Increases with every send; stale packets are dropped by it
        seq: u64,
        x: f32,
        y: f32,
        vx: f32,
        vy: f32,
    },

    /// A connected kick, already applied optimistically by the sender
    #[serde(rename = "kick")]
    Kick { vx: f32, vy: f32, power: f32, spin: f32 },

    /// Optimistic ball state after a body contact
    #[serde(rename = "ball:touch")]
    BallTouch { x: f32, y: f32, vx: f32, vy: f32 },

    /// Leave the ground
    #[serde(rename = "leave")]
    Leave,

    /// Ping for latency measurement
    #[serde(rename = "ping")]
    Ping {
        /// Client timestamp
        t: u64,
    },
}

/// Messages sent from server to client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum ServerMsg {
    /// First message on every connection
    #[serde(rename = "welcome")]
    Welcome { id: PlayerId, server_time: u64 },

    #[serde(rename = "player:joined")]
    PlayerJoined { player: PlayerInfo },

    #[serde(rename = "player:left")]
    PlayerLeft { id: PlayerId },

    /// Relayed position of another player
    #[serde(rename = "player:moved")]
    PlayerMoved {
        id: PlayerId,
        seq: u64,
        x: f32,
        y: f32,
        vx: f32,
        vy: f32,
    },

    /// Everyone on the ground, sent to a player right after joining
    #[serde(rename = "players:list")]
    PlayersList { players: Vec<PlayerInfo> },

    /// Authoritative ball sample
    #[serde(rename = "ball:update")]
    BallUpdate {
        /// Server tick the sample was taken at
        tick: u64,
        ball: BallState,
    },

    #[serde(rename = "goal:scored")]
    GoalScored {
        epoch: u32,
        team: Team,
        score: Score,
        scored_by: Option<PlayerId>,
    },

    /// Aggregate match state
    #[serde(rename = "game:state")]
    GameState {
        epoch: u32,
        tick: u64,
        ball: BallState,
        score: Score,
        is_playing: bool,
        /// Seconds remaining on the match clock
        match_time: f32,
        phase: MatchPhase,
    },

    /// Pong response
    #[serde(rename = "pong")]
    Pong {
        /// Echo back client timestamp
        t: u64,
    },

    /// Error message
    #[serde(rename = "error")]
    Error { code: String, message: String },
}

impl ServerMsg {
    /// Wire tag, for logs
    pub fn kind(&self) -> &'static str {
        match self {
            ServerMsg::Welcome { .. } => "welcome",
            ServerMsg::PlayerJoined { .. } => "player:joined",
            ServerMsg::PlayerLeft { .. } => "player:left",
            ServerMsg::PlayerMoved { .. } => "player:moved",
            ServerMsg::PlayersList { .. } => "players:list",
            ServerMsg::BallUpdate { .. } => "ball:update",
            ServerMsg::GoalScored { .. } => "goal:scored",
            ServerMsg::GameState { .. } => "game:state",
            ServerMsg::Pong { .. } => "pong",
            ServerMsg::Error { .. } => "error",
        }
    }
}

/// Player info for join/list broadcasts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub id: PlayerId,
    pub name: String,
    pub team: Team,
    pub x: f32,
    pub y: f32,
}

/// Ball state on the wire
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BallState {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    #[serde(default)]
    pub spin: f32,
    #[serde(default)]
    pub last_kicked_by: Option<PlayerId>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    #[test]
    fn client_messages_use_wire_tags() {
        let msg: ClientMsg = serde_json::from_value(json!({
            "type": "position", "seq": 4, "x": 1.0, "y": 2.0, "vx": 0.5, "vy": 0.0
        }))
        .expect("parse");
        assert_eq!(
            msg,
            ClientMsg::Position {
                seq: 4,
                x: 1.0,
                y: 2.0,
                vx: 0.5,
                vy: 0.0
            }
        );

        let join: ClientMsg = serde_json::from_value(json!({ "type": "join" })).expect("parse");
        assert_eq!(join, ClientMsg::Join { name: None, team: None });

        let touch = serde_json::to_value(ClientMsg::BallTouch {
            x: 1.0,
            y: 1.0,
            vx: 0.0,
            vy: 0.0,
        })
        .expect("serialize");
        assert_eq!(touch["type"], "ball:touch");
    }

    #[test]
    fn server_messages_use_camel_case_fields() {
        let scorer = Uuid::new_v4();
        let value = serde_json::to_value(ServerMsg::GoalScored {
            epoch: 1,
            team: Team::Blue,
            score: Score { red: 0, blue: 1 },
            scored_by: Some(scorer),
        })
        .expect("serialize");
        assert_eq!(value["type"], "goal:scored");
        assert_eq!(value["team"], "blue");
        assert_eq!(value["scoredBy"], scorer.to_string());
        assert_eq!(value["score"]["blue"], 1);

        let state = serde_json::to_value(ServerMsg::GameState {
            epoch: 1,
            tick: 9,
            ball: BallState::default(),
            score: Score::default(),
            is_playing: true,
            match_time: 120.0,
            phase: MatchPhase::Playing,
        })
        .expect("serialize");
        assert_eq!(state["isPlaying"], true);
        assert_eq!(state["matchTime"], 120.0);
        assert_eq!(state["phase"], "playing");
        assert!(state["ball"].get("lastKickedBy").is_some());
    }

    #[test]
    fn kind_matches_serialized_tag() {
        let msg = ServerMsg::PlayerLeft { id: Uuid::new_v4() };
        let value = serde_json::to_value(&msg).expect("serialize");
        assert_eq!(value["type"], msg.kind());
    }
}
