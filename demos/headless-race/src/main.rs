//! Runs one race against bots without any network layer and prints the
//! standings.
//!
//! ```bash
//! RUST_LOG=dashrun_room=debug cargo run -p headless-race -- [config.json]
//! ```
//!
//! The local player is steered by the same jump heuristic the bots use,
//! fed only from what a real client sees: the `game-start` seed (from which
//! it regenerates the course) and the per-tick snapshots.

use std::path::Path;

use dashrun::prelude::*;
use dashrun::room::ParticipantSnapshot;
use dashrun::rules::{
    Body, BotBrain, BotParams, GameStats, Obstacle, ObstacleSettings, PhysicsParams, Seed,
    generate_obstacles,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::mpsc;

// ---------------------------------------------------------------------------
// Pilot
// ---------------------------------------------------------------------------

struct Pilot {
    me: ParticipantId,
    stats: GameStats,
    obstacles: Vec<Obstacle>,
    physics: PhysicsParams,
    params: BotParams,
    brain: BotBrain,
    rng: StdRng,
}

impl Pilot {
    fn new(
        me: ParticipantId,
        stats: GameStats,
        seed: Seed,
        settings: &ObstacleSettings,
        finish_distance: f64,
        no_obstacles: bool,
        room: &RoomConfig,
    ) -> Self {
        Self {
            me,
            stats,
            obstacles: generate_obstacles(seed, settings, finish_distance, no_obstacles),
            physics: room.physics.clone(),
            params: room.bots.clone(),
            brain: BotBrain::with_skill(1.0),
            rng: StdRng::seed_from_u64(u64::from(seed)),
        }
    }

    fn should_jump(&mut self, snapshots: &[ParticipantSnapshot]) -> bool {
        let Some(snap) = snapshots.iter().find(|s| s.id == self.me) else {
            return false;
        };
        let body = Body {
            distance: snap.distance as f64,
            y: snap.y,
            velocity_y: 0.0,
            airborne: snap.is_jumping,
            alive: snap.is_alive,
        };
        self.brain.decide(
            &body,
            &self.stats,
            &self.obstacles,
            &self.physics,
            &self.params,
            &mut self.rng,
        )
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args().nth(1);
    let config = ServerConfig::load(path.as_deref().map(Path::new))?;
    dashrun::logging::init(&config.log_filter)?;

    let room_config = config.room;
    let (results_tx, mut results_rx) = mpsc::unbounded_channel();
    let engine = Engine::builder()
        .room_config(room_config.clone())
        .results(results_tx)
        .build(HandshakeAuthenticator);

    let player = PlayerId(1);
    let me = ParticipantId::Player(player);
    let (tx, mut rx) = mpsc::unbounded_channel();
    engine
        .connect(player, Credentials::new("headless", "demo-spirit"), tx)
        .await?;
    engine
        .handle_event(player, ClientEvent::JoinQueue(GameType::new(RoomConfig::DEFAULT_GAME_TYPE)))
        .await?;

    let mut pilot: Option<Pilot> = None;
    while let Some(event) = rx.recv().await {
        match event {
            ServerEvent::QueueStatus { players_needed, .. } => {
                println!("queued, waiting for {players_needed} more (bots fill in after {} ms)", room_config.bots.fill_timeout_ms);
            }
            ServerEvent::MatchFound {
                room_id, bots_count, ..
            } => {
                println!("matched into {room_id} with {bots_count} bots");
                engine.handle_event(player, ClientEvent::PlayerReady).await?;
            }
            ServerEvent::GameCountdown { count } => println!("{count}..."),
            ServerEvent::GameStart {
                seed,
                players,
                finish_distance,
                no_obstacles,
                obstacle_settings,
            } => {
                let stats = players
                    .iter()
                    .find(|p| p.id == me)
                    .map_or(room_config.default_stats, |p| p.stats);
                let p = Pilot::new(
                    me,
                    stats,
                    seed,
                    &obstacle_settings,
                    finish_distance,
                    no_obstacles,
                    &room_config,
                );
                println!("go! seed {seed}, {} obstacles to {finish_distance}", p.obstacles.len());
                pilot = Some(p);
            }
            ServerEvent::GameState { players, .. } => {
                if pilot.as_mut().is_some_and(|p| p.should_jump(&players)) {
                    engine
                        .handle_event(player, ClientEvent::PlayerInput(PlayerInput::jump()))
                        .await?;
                }
            }
            ServerEvent::PlayerEliminated {
                player_id, distance, ..
            } => println!("{player_id} crashed at {distance}"),
            ServerEvent::GameEnd { results, rewards } => {
                println!();
                println!("{:<6} {:<16} {:>8}", "place", "runner", "distance");
                for r in &results {
                    let tag = if r.is_bot { " (bot)" } else { "" };
                    println!("{:<6} {:<16} {:>8}", r.place, format!("{}{tag}", r.participant), r.distance);
                }
                for reward in &rewards {
                    println!(
                        "{} earns {} coins, {} xp{}",
                        reward.player_id,
                        reward.currency,
                        reward.experience,
                        if reward.bonus_capsule { " and a capsule" } else { "" },
                    );
                }
                break;
            }
            _ => {}
        }
    }

    // Wait for the room to be released before exiting.
    let _ = results_rx.recv().await;
    engine.disconnect(player).await;
    Ok(())
}
