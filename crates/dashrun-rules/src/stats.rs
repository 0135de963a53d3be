//! Participant stats: speed and jump, each on a 0–20 scale.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::StatsError;

/// The two tunable stats every participant carries.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GameStats {
    /// Running speed. Higher is faster.
    pub speed: f64,
    /// Jump quality. Higher means less slowdown while airborne.
    pub jump: f64,
}

impl GameStats {
    pub fn new(speed: f64, jump: f64) -> Self {
        Self { speed, jump }
    }

    /// Overwrites only the fields present in `patch`.
    ///
    /// Does not validate; call [`StatBounds::validate`] first.
    pub fn apply(&mut self, patch: &StatsPatch) {
        if let Some(speed) = patch.speed {
            self.speed = speed;
        }
        if let Some(jump) = patch.jump {
            self.jump = jump;
        }
    }
}

/// A partial stat update. Absent fields are left untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsPatch {
    pub speed: Option<f64>,
    pub jump: Option<f64>,
}

impl StatsPatch {
    pub fn is_empty(&self) -> bool {
        self.speed.is_none() && self.jump.is_none()
    }
}

/// Which stat a validation error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatKind {
    Speed,
    Jump,
}

impl fmt::Display for StatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Speed => write!(f, "speed"),
            Self::Jump => write!(f, "jump"),
        }
    }
}

/// Inclusive range every stat must lie in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatBounds {
    pub min: f64,
    pub max: f64,
}

impl Default for StatBounds {
    fn default() -> Self {
        Self { min: 0.0, max: 20.0 }
    }
}

impl StatBounds {
    /// Checks a single value. NaN is always rejected.
    pub fn check(&self, stat: StatKind, value: f64) -> Result<(), StatsError> {
        if (self.min..=self.max).contains(&value) {
            Ok(())
        } else {
            Err(StatsError::OutOfRange {
                stat,
                value,
                min: self.min,
                max: self.max,
            })
        }
    }

    /// Checks every field present in `patch`, speed first.
    pub fn validate(&self, patch: &StatsPatch) -> Result<(), StatsError> {
        if let Some(speed) = patch.speed {
            self.check(StatKind::Speed, speed)?;
        }
        if let Some(jump) = patch.jump {
            self.check(StatKind::Jump, jump)?;
        }
        Ok(())
    }

    /// Maps `value` onto `[0, 1]` relative to the bounds.
    pub fn normalize(&self, value: f64) -> f64 {
        let span = self.max - self.min;
        if span <= 0.0 {
            return 1.0;
        }
        ((value - self.min) / span).clamp(0.0, 1.0)
    }
}

/// Raw attributes of a spirit as stored by the profile service.
///
/// Humans who join with a known spirit get their race stats derived from
/// these via [`SpiritAttributes::to_game_stats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpiritAttributes {
    pub maneuver: f64,
    pub impulse: f64,
    pub fluidity: f64,
    pub depth: f64,
    pub reaction: f64,
    pub flow: f64,
}

impl SpiritAttributes {
    /// Weighted attribute sums divided by 5, rounded and clamped into `bounds`.
    ///
    /// Speed draws on flow (0.5), maneuver (0.3) and fluidity (0.2); jump on
    /// impulse (0.7) and reaction (0.3). Depth is unused.
    pub fn to_game_stats(&self, bounds: &StatBounds) -> GameStats {
        const SCALE: f64 = 5.0;
        let derive = |sum: f64| (sum / SCALE).round().clamp(bounds.min, bounds.max);

        GameStats {
            speed: derive(self.flow * 0.5 + self.maneuver * 0.3 + self.fluidity * 0.2),
            jump: derive(self.impulse * 0.7 + self.reaction * 0.3),
        }
    }
}
