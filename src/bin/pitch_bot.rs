//! Headless bot - drives the client engine against a running server
//!
//! Walks through the overworld portal, joins the ground, chases the ball and
//! charges kicks toward the goal its team attacks.

use anyhow::Context;
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use glam::Vec2;
use std::env;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::{interval, MissedTickBehavior};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use pitch_sync::client::scene::{SceneController, SceneEvent};
use pitch_sync::client::{ClientEvent, ClientSim, FrameInput};
use pitch_sync::game::movement::MoveIntent;
use pitch_sync::game::{Team, Tuning};
use pitch_sync::init_tracing;
use pitch_sync::util::time::Timer;
use pitch_sync::ws::protocol::{ClientMsg, ServerMsg};

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

/// Render-rate frame cadence
const FRAME: Duration = Duration::from_millis(16);
/// Overworld walking speed, units per second
const WALK_SPEED: f32 = 240.0;
/// How long the bot holds a kick
const CHARGE_SECS: f64 = 0.4;

struct BotConfig {
    url: String,
    name: String,
    team: Option<Team>,
    log_level: String,
}

impl BotConfig {
    fn from_env() -> anyhow::Result<Self> {
        let team = match env::var("PITCH_BOT_TEAM").ok().as_deref() {
            None | Some("") => None,
            Some("red") => Some(Team::Red),
            Some("blue") => Some(Team::Blue),
            Some(other) => anyhow::bail!("PITCH_BOT_TEAM must be red or blue, got {other:?}"),
        };

        Ok(Self {
            url: env::var("PITCH_SERVER_URL").unwrap_or_else(|_| "ws://127.0.0.1:8080/ws".to_string()),
            name: env::var("PITCH_BOT_NAME").unwrap_or_else(|_| "pitch-bot".to_string()),
            team,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

/// Decides the bot's controls each frame
#[derive(Debug, Default)]
struct Brain {
    charge_started: Option<f64>,
}

impl Brain {
    fn play(&mut self, sim: &ClientSim) -> FrameInput {
        let Some(me) = sim.local() else {
            return FrameInput::default();
        };
        if !sim.session().is_playing() {
            self.charge_started = None;
            return FrameInput::default();
        }

        let t = sim.tuning();
        let ball = sim.ball().position;
        let position = me.body.position;

        let goal_x = if me.team.attack_sign() > 0.0 {
            t.field.max_x()
        } else {
            t.field.min_x()
        };
        let aim = (Vec2::new(goal_x, t.field.height / 2.0) - ball).normalize_or_zero();

        // Line up behind the ball, facing the goal
        let approach = ball - aim * (t.player.radius + t.ball.radius + 4.0);
        let movement = MoveIntent::toward(position, approach, 4.0);

        let distance = position.distance(ball);
        let sprint = distance > 120.0 && me.stamina.value() > 30.0;
        let in_reach = distance <= t.kick.distance;

        let kick = match self.charge_started {
            Some(start) if sim.now() - start < CHARGE_SECS && in_reach => true,
            Some(_) => {
                self.charge_started = None;
                false
            }
            None if in_reach && me.body.facing.dot(aim) > 0.5 => {
                self.charge_started = Some(sim.now());
                true
            }
            None => false,
        };

        FrameInput {
            movement,
            sprint,
            kick,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = BotConfig::from_env()?;
    init_tracing(&config.log_level, false);

    let (ws, _) = connect_async(config.url.as_str())
        .await
        .with_context(|| format!("connecting to {}", config.url))?;
    info!(url = %config.url, "Connected");
    let (mut sink, mut stream) = ws.split();

    let tuning = Tuning::default();
    let mut sim = ClientSim::new(tuning, rand::random());
    let mut scene = SceneController::new(tuning.scene);
    let mut brain = Brain::default();
    let mut overworld = tuning.scene.fallback_overworld;

    let mut frames = interval(FRAME);
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut timer = Timer::new();

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            incoming = stream.next() => match incoming {
                Some(Ok(Message::Text(text))) => match serde_json::from_str::<ServerMsg>(&text) {
                    Ok(msg) => sim.push_message(msg),
                    Err(e) => warn!(error = %e, "Failed to parse server message"),
                },
                Some(Ok(Message::Close(_))) | None => {
                    sim.on_disconnect();
                    info!("Server closed the connection");
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    sim.on_disconnect();
                    return Err(e).context("websocket read");
                }
            },
            _ = frames.tick() => {
                let dt = timer.lap();

                match scene.update(dt) {
                    Some(SceneEvent::Entered { spawn }) => {
                        debug!(?spawn, "Entered the ground");
                        sim.join_ground(Some(config.name.clone()), config.team);
                    }
                    Some(SceneEvent::Exited { restore }) => overworld = restore,
                    None => {}
                }

                let input = if scene.is_inside() {
                    brain.play(&sim)
                } else {
                    if !scene.blocks_input() {
                        let to_portal = tuning.scene.portal_center - overworld;
                        overworld += to_portal.clamp_length_max(WALK_SPEED * dt);
                        scene.enter(overworld);
                    }
                    FrameInput::default()
                };

                let out = sim.frame(dt, &input);
                for event in out.events {
                    log_event(&event);
                }
                send_all(&mut sink, out.outbound).await?;
            }
            _ = &mut shutdown => {
                info!("Leaving the ground");
                if sim.leave_ground() {
                    let out = sim.frame(0.0, &FrameInput::default());
                    send_all(&mut sink, out.outbound).await?;
                }
                sink.close().await.ok();
                break;
            }
        }
    }

    Ok(())
}

async fn send_all(sink: &mut WsSink, outbound: Vec<ClientMsg>) -> anyhow::Result<()> {
    for msg in outbound {
        let json = serde_json::to_string(&msg)?;
        sink.send(Message::Text(json))
            .await
            .context("websocket write")?;
    }
    Ok(())
}

fn log_event(event: &ClientEvent) {
    match event {
        ClientEvent::Joined { team, position } => info!(?team, ?position, "Joined"),
        ClientEvent::Goal {
            team,
            local_scorer: true,
            ..
        } => info!(?team, "Scored"),
        ClientEvent::Goal { team, .. } => info!(?team, "Goal"),
        ClientEvent::FullTime { score } => info!(red = score.red, blue = score.blue, "Full time"),
        ClientEvent::ServerError { code, message } => warn!(%code, %message, "Server error"),
        other => debug!(?other, "Event"),
    }
}
