//! Game rules for Dashrun races.
//!
//! Everything in this crate is synchronous and free of I/O. The room layer
//! owns the state; these modules only compute.
//!
//! # Key items
//!
//! - [`generate_obstacles`]: seed → obstacle field, reproducible bit-for-bit
//!   by any client running the same [`Lcg`]
//! - [`Body`] / [`PhysicsParams`]: the single movement and collision path
//!   shared by humans and bots
//! - [`BotBrain`]: per-tick jump decision for AI participants
//! - [`rank`] / [`calculate_rewards`]: final standings and reward intents

mod bot;
mod error;
mod obstacles;
mod physics;
mod rng;
mod scoring;
mod stats;

pub use bot::{BotBrain, BotParams, StatRange};
pub use error::StatsError;
pub use obstacles::{Obstacle, ObstacleKind, ObstacleSettings, generate_obstacles};
pub use physics::{
    Body, GROUND_Y, JumpDescription, PhysicsParams, SpeedDescription, StatsDescription,
};
pub use rng::{Lcg, Seed};
pub use scoring::{Finisher, Placement, Reward, calculate_rewards, rank};
pub use stats::{GameStats, SpiritAttributes, StatBounds, StatKind, StatsPatch};
