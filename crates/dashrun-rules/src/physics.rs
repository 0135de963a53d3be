//! Movement, jumping and collision for a single participant.
//!
//! Humans and bots share every line of this module. The only difference
//! between them is *who* calls [`Body::try_jump`].

use serde::{Deserialize, Serialize};

use crate::{GameStats, Obstacle, StatBounds};

/// World y coordinate of the ground surface. Grows downward.
pub const GROUND_Y: f64 = 330.0;

/// Tunables for the shared physics path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsParams {
    /// Horizontal speed at speed stat 0, in units per second.
    pub base_speed: f64,
    /// Extra speed per point of the speed stat.
    pub speed_stat_multiplier: f64,
    /// Fraction of speed lost while airborne at the lowest jump stat.
    pub jump_slowdown_base: f64,
    /// Initial vertical velocity of a jump. Negative is up.
    pub jump_force: f64,
    /// Downward acceleration while airborne.
    pub gravity: f64,
    /// Side length of the square participant hitbox.
    pub body_size: f64,
    /// Obstacles further than this beyond the hitbox edges are not tested.
    pub collision_window: f64,
    pub stat_bounds: StatBounds,
}

impl Default for PhysicsParams {
    fn default() -> Self {
        Self {
            base_speed: 200.0,
            speed_stat_multiplier: 10.0,
            jump_slowdown_base: 0.5,
            jump_force: -650.0,
            gravity: 1500.0,
            body_size: 40.0,
            collision_window: 100.0,
            stat_bounds: StatBounds::default(),
        }
    }
}

impl PhysicsParams {
    /// Ground speed: `base_speed + speed_stat * speed_stat_multiplier`.
    pub fn speed(&self, stats: &GameStats) -> f64 {
        self.base_speed + stats.speed * self.speed_stat_multiplier
    }

    /// Speed factor applied while airborne.
    ///
    /// Lowest jump stat loses `jump_slowdown_base` of the speed, the highest
    /// loses nothing.
    pub fn jump_speed_multiplier(&self, stats: &GameStats) -> f64 {
        let normalized = self.stat_bounds.normalize(stats.jump);
        1.0 - self.jump_slowdown_base * (1.0 - normalized)
    }

    /// Horizontal speed while in the air.
    pub fn airborne_speed(&self, stats: &GameStats) -> f64 {
        self.speed(stats) * self.jump_speed_multiplier(stats)
    }

    pub fn half_size(&self) -> f64 {
        self.body_size / 2.0
    }

    /// Resting y of a participant's centre.
    pub fn ground_baseline(&self) -> f64 {
        GROUND_Y - self.half_size()
    }

    /// Seconds from take-off to the top of the arc.
    pub fn time_to_apex(&self) -> f64 {
        if self.gravity <= 0.0 {
            return 0.0;
        }
        -self.jump_force / self.gravity
    }

    /// Human-readable summary of how stats translate into movement.
    pub fn describe(&self) -> StatsDescription {
        let slowdown_pct = (self.jump_slowdown_base * 100.0).round();
        StatsDescription {
            speed: SpeedDescription {
                base: self.base_speed,
                multiplier: self.speed_stat_multiplier,
                description: format!(
                    "speed = {} + (speed * {}) units/s",
                    self.base_speed, self.speed_stat_multiplier
                ),
            },
            jump: JumpDescription {
                slowdown: self.jump_slowdown_base,
                description: format!(
                    "airborne slowdown: jump={} -> -{}%, jump={} -> 0%",
                    self.stat_bounds.min, slowdown_pct, self.stat_bounds.max
                ),
            },
            min: self.stat_bounds.min,
            max: self.stat_bounds.max,
        }
    }
}

/// Payload of the `stats-info` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsDescription {
    pub speed: SpeedDescription,
    pub jump: JumpDescription,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeedDescription {
    pub base: f64,
    pub multiplier: f64,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JumpDescription {
    pub slowdown: f64,
    pub description: String,
}

// ---------------------------------------------------------------------------
// Body
// ---------------------------------------------------------------------------

/// Kinematic state of one participant.
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    /// Distance run from the start. Also the hitbox centre x.
    pub distance: f64,
    /// Hitbox centre y.
    pub y: f64,
    pub velocity_y: f64,
    pub airborne: bool,
    pub alive: bool,
}

impl Body {
    /// A living body standing at the start line.
    pub fn at_start(params: &PhysicsParams) -> Self {
        Self {
            distance: 0.0,
            y: params.ground_baseline(),
            velocity_y: 0.0,
            airborne: false,
            alive: true,
        }
    }

    /// Applies the jump impulse if alive and grounded.
    ///
    /// Returns whether the jump happened.
    pub fn try_jump(&mut self, params: &PhysicsParams) -> bool {
        if !self.alive || self.airborne {
            return false;
        }
        self.airborne = true;
        self.velocity_y = params.jump_force;
        true
    }

    /// Moves the body forward by `dt` seconds. Dead bodies stay put.
    pub fn advance(&mut self, params: &PhysicsParams, stats: &GameStats, dt: f64) {
        if !self.alive {
            return;
        }
        let dt = dt.max(0.0);

        let speed = if self.airborne {
            params.airborne_speed(stats)
        } else {
            params.speed(stats)
        };
        self.distance += speed * dt;

        if self.airborne {
            self.velocity_y += params.gravity * dt;
            self.y += self.velocity_y * dt;

            let baseline = params.ground_baseline();
            if self.y >= baseline {
                self.y = baseline;
                self.velocity_y = 0.0;
                self.airborne = false;
            }
        }
    }

    /// First obstacle overlapping this body's hitbox, if any.
    ///
    /// `obstacles` must be sorted by `x`; only those whose centre lies within
    /// `collision_window` of the hitbox are tested. Edges that merely touch
    /// do not collide.
    pub fn find_collision<'a>(
        &self,
        params: &PhysicsParams,
        obstacles: &'a [Obstacle],
    ) -> Option<&'a Obstacle> {
        self.find_collision_from(params, obstacles, self.distance)
    }

    /// Like [`find_collision`](Self::find_collision), but the hitbox spans
    /// everything from `from` to the current distance.
    ///
    /// Only valid when `y` did not change over that stretch, i.e. for a body
    /// that stayed on the ground. A long tick then cannot carry it through an
    /// obstacle.
    pub fn find_collision_from<'a>(
        &self,
        params: &PhysicsParams,
        obstacles: &'a [Obstacle],
        from: f64,
    ) -> Option<&'a Obstacle> {
        let half = params.half_size();
        let left = from.min(self.distance) - half;
        let right = self.distance.max(from) + half;
        let top = self.y - half;
        let bottom = self.y + half;

        let window_start = left - params.collision_window;
        let window_end = right + params.collision_window;
        let first = obstacles.partition_point(|o| o.x < window_start);

        obstacles[first..]
            .iter()
            .take_while(|o| o.x <= window_end)
            .find(|o| right > o.left() && left < o.right() && bottom > o.top() && top < o.bottom())
    }
}
