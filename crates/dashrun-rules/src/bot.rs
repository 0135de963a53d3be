//! AI participants.
//!
//! A bot looks ahead for the nearest ground obstacle, works out where it has
//! to leave the ground to be at the top of its arc over the obstacle's
//! leading edge, and remembers that trigger distance until it gets there.
//! Lower skill means more random error in the trigger.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{Body, GameStats, Obstacle, PhysicsParams};

/// Inclusive integer range a bot stat is rolled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatRange {
    pub min: u32,
    pub max: u32,
}

impl StatRange {
    pub fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    fn roll<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let (lo, hi) = if self.min <= self.max {
            (self.min, self.max)
        } else {
            (self.max, self.min)
        };
        f64::from(rng.random_range(lo..=hi))
    }
}

/// Bot behaviour and bot-fill settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotParams {
    /// Fill short-handed queues with bots after `fill_timeout_ms`.
    pub enabled: bool,
    pub fill_timeout_ms: u64,
    pub skill_min: f64,
    pub skill_max: f64,
    /// How far ahead a bot notices obstacles.
    pub reaction_distance: f64,
    /// Full width of the trigger error at skill 0.
    pub reaction_variance: f64,
    /// Seconds from take-off to apex that bots plan with.
    pub time_to_apex: f64,
    pub speed: StatRange,
    pub jump: StatRange,
    pub names: Vec<String>,
}

impl Default for BotParams {
    fn default() -> Self {
        Self {
            enabled: true,
            fill_timeout_ms: 5_000,
            skill_min: 0.5,
            skill_max: 0.95,
            reaction_distance: 300.0,
            reaction_variance: 40.0,
            time_to_apex: 0.4,
            speed: StatRange::new(6, 14),
            jump: StatRange::new(6, 14),
            names: ["Blitz", "Comet", "Dash", "Ember", "Flick", "Gale", "Hopper", "Jolt"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl BotParams {
    /// Random integer stats inside the configured ranges.
    pub fn roll_stats<R: Rng + ?Sized>(&self, rng: &mut R) -> GameStats {
        GameStats {
            speed: self.speed.roll(rng),
            jump: self.jump.roll(rng),
        }
    }

    /// Display name for the `n`th bot ever created.
    pub fn name_for(&self, n: u64) -> String {
        if self.names.is_empty() {
            return format!("Bot {n}");
        }
        let idx = (n % self.names.len() as u64) as usize;
        self.names[idx].clone()
    }
}

/// Decision state of one bot. Lives alongside the bot's [`Body`].
#[derive(Debug, Clone, PartialEq)]
pub struct BotBrain {
    skill: f64,
    trigger: Option<f64>,
}

impl BotBrain {
    /// Samples a skill level uniformly in `[skill_min, skill_max]`.
    pub fn spawn<R: Rng + ?Sized>(params: &BotParams, rng: &mut R) -> Self {
        let span = (params.skill_max - params.skill_min).max(0.0);
        Self::with_skill(params.skill_min + rng.random::<f64>() * span)
    }

    pub fn with_skill(skill: f64) -> Self {
        Self {
            skill: skill.clamp(0.0, 1.0),
            trigger: None,
        }
    }

    pub fn skill(&self) -> f64 {
        self.skill
    }

    /// Distance at which the bot has planned its next jump.
    pub fn trigger(&self) -> Option<f64> {
        self.trigger
    }

    /// Whether the bot jumps this tick.
    ///
    /// Never jumps while dead or airborne. `obstacles` must be sorted by `x`.
    pub fn decide<R: Rng + ?Sized>(
        &mut self,
        body: &Body,
        stats: &GameStats,
        obstacles: &[Obstacle],
        physics: &PhysicsParams,
        params: &BotParams,
        rng: &mut R,
    ) -> bool {
        if !body.alive || body.airborne {
            return false;
        }

        if let Some(trigger) = self.trigger {
            if body.distance >= trigger {
                self.trigger = None;
                return true;
            }
            return false;
        }

        let first_ahead = obstacles.partition_point(|o| o.x <= body.distance);
        let Some(target) = obstacles[first_ahead..]
            .iter()
            .take_while(|o| o.x - body.distance < params.reaction_distance)
            .find(|o| !o.kind.is_aerial())
        else {
            return false;
        };

        let lead = physics.airborne_speed(stats) * params.time_to_apex;
        let error = (rng.random::<f64>() - 0.5) * params.reaction_variance * (1.0 - self.skill);
        let trigger = target.left() - lead + error;

        if body.distance >= trigger {
            return true;
        }
        self.trigger = Some(trigger);
        false
    }
}
