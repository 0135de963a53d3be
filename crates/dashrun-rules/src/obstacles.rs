//! Seeded obstacle field generation.
//!
//! Clients rebuild the course locally from the `game-start` seed and
//! settings, so the sequence of [`Lcg`] draws below must never change:
//!
//! 1. one draw per slot for the jitter, plus one draw for every spacing push
//! 2. after sorting, per obstacle: a type roll, then its size rolls
//!    (two for ground kinds, one for aerial)

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{GROUND_Y, Lcg, Seed};

/// Nothing is placed within this distance of the finish line.
const FINISH_MARGIN: f64 = 100.0;

/// Extra random push, on top of `min_spacing`, when two slots collide.
const SPACING_PAD: f64 = 50.0;

/// Height of an aerial obstacle's lowest possible bottom edge above ground.
const AERIAL_CLEARANCE: f64 = 60.0;

/// Obstacle shape family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ObstacleKind {
    /// Narrow and tall, standing on the ground.
    GroundLow,
    /// Wide and squat, standing on the ground.
    GroundMid,
    /// Floating above head height. A grounded runner passes underneath.
    Aerial,
}

impl ObstacleKind {
    pub fn is_aerial(&self) -> bool {
        matches!(self, Self::Aerial)
    }

    fn from_roll(roll: f64) -> Self {
        if roll < 0.60 {
            Self::GroundLow
        } else if roll < 0.84 {
            Self::GroundMid
        } else {
            Self::Aerial
        }
    }
}

impl fmt::Display for ObstacleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GroundLow => write!(f, "ground-low"),
            Self::GroundMid => write!(f, "ground-mid"),
            Self::Aerial => write!(f, "aerial"),
        }
    }
}

/// One obstacle. `x` is the horizontal centre, `y` the top edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: u32,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub kind: ObstacleKind,
}

impl Obstacle {
    pub fn left(&self) -> f64 {
        self.x - self.width / 2.0
    }

    pub fn right(&self) -> f64 {
        self.x + self.width / 2.0
    }

    pub fn top(&self) -> f64 {
        self.y
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }
}

/// Course layout parameters, announced to clients in `game-start`.
///
/// Serialized in camelCase for the wire; snake_case keys are accepted too so
/// the same struct can sit in a config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ObstacleSettings {
    pub count: u32,
    #[serde(alias = "min_spacing")]
    pub min_spacing: f64,
    #[serde(alias = "safe_zone_start")]
    pub safe_zone_start: f64,
}

impl Default for ObstacleSettings {
    fn default() -> Self {
        Self {
            count: 12,
            min_spacing: 150.0,
            safe_zone_start: 500.0,
        }
    }
}

/// Builds the obstacle field for `seed`, sorted by `x`.
///
/// Returns an empty field, without touching the generator, when `count` is
/// zero or `no_obstacles` is set.
///
/// Spacing repair is a single greedy pass against earlier positions. A push
/// can land past `finish_distance - 100` and be clamped back, so near the
/// finish two obstacles may end up closer than `min_spacing`.
pub fn generate_obstacles(
    seed: Seed,
    settings: &ObstacleSettings,
    finish_distance: f64,
    no_obstacles: bool,
) -> Vec<Obstacle> {
    let mut rng = Lcg::new(seed);
    let field = generate_from(&mut rng, settings, finish_distance, no_obstacles);
    debug!(
        seed,
        obstacles = field.len(),
        draws = rng.draws(),
        "obstacle field generated"
    );
    field
}

fn generate_from(
    rng: &mut Lcg,
    settings: &ObstacleSettings,
    finish_distance: f64,
    no_obstacles: bool,
) -> Vec<Obstacle> {
    if no_obstacles || settings.count == 0 {
        return Vec::new();
    }

    let count = settings.count as usize;
    let safe = settings.safe_zone_start;
    let last_allowed = finish_distance - FINISH_MARGIN;
    let slot = (finish_distance - safe - FINISH_MARGIN) / count as f64;

    let mut positions: Vec<f64> = Vec::with_capacity(count);
    for i in 0..count {
        let mut x = safe + slot * i as f64 + (rng.next_f64() - 0.5) * slot * 0.5;
        for &prev in &positions {
            if (x - prev).abs() < settings.min_spacing {
                x = prev + settings.min_spacing + rng.next_f64() * SPACING_PAD;
            }
        }
        positions.push(x.min(last_allowed).max(safe));
    }
    positions.sort_by(f64::total_cmp);

    positions
        .into_iter()
        .zip(0u32..)
        .map(|(x, id)| {
            let kind = ObstacleKind::from_roll(rng.next_f64());
            let (width, height, y) = match kind {
                ObstacleKind::GroundLow => {
                    let width = 20.0 + rng.next_f64() * 15.0;
                    let height = 40.0 + rng.next_f64() * 30.0;
                    (width, height, GROUND_Y - height)
                }
                ObstacleKind::GroundMid => {
                    let width = 30.0 + rng.next_f64() * 20.0;
                    let height = 25.0 + rng.next_f64() * 15.0;
                    (width, height, GROUND_Y - height)
                }
                ObstacleKind::Aerial => {
                    let y = GROUND_Y - AERIAL_CLEARANCE - rng.next_f64() * 30.0;
                    (25.0, 20.0, y)
                }
            };
            Obstacle {
                id,
                x,
                y,
                width,
                height,
                kind,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(count: u32) -> ObstacleSettings {
        ObstacleSettings {
            count,
            min_spacing: 150.0,
            safe_zone_start: 500.0,
        }
    }

    #[test]
    fn test_reference_field_for_seed_12345() {
        let mut rng = Lcg::new(12345);
        let field = generate_from(&mut rng, &settings(10), 3000.0, false);

        assert_eq!(field.len(), 10);
        // 10 jitter draws, 1 spacing push, 10 type rolls, 18 size rolls.
        assert_eq!(rng.draws(), 39);

        // First slot jitters below the safe zone and is clamped onto it.
        assert_eq!(field[0].x, 500.0);
        assert_eq!(field[0].kind, ObstacleKind::GroundMid);

        let kinds: Vec<_> = field.iter().map(|o| o.kind).collect();
        use ObstacleKind::*;
        assert_eq!(
            kinds,
            [
                GroundMid, GroundMid, Aerial, Aerial, GroundMid, GroundLow, GroundLow, GroundLow,
                GroundLow, GroundLow,
            ]
        );
        assert!((field[1].x - 681.985_741_788_521_4).abs() < 1e-9);
        assert!((field[9].x - 2_604.782_518_092_543).abs() < 1e-9);
    }

    #[test]
    fn test_generation_is_repeatable() {
        let a = generate_obstacles(12345, &settings(10), 3000.0, false);
        let b = generate_obstacles(12345, &settings(10), 3000.0, false);
        assert_eq!(a, b);

        let c = generate_obstacles(12346, &settings(10), 3000.0, false);
        assert_ne!(a, c);
    }

    #[test]
    fn test_disabled_field_takes_no_draws() {
        let mut rng = Lcg::new(99);
        assert!(generate_from(&mut rng, &settings(0), 3000.0, false).is_empty());
        assert!(generate_from(&mut rng, &settings(10), 3000.0, true).is_empty());
        assert_eq!(rng.draws(), 0);
    }

    #[test]
    fn test_field_is_sorted_and_inside_bounds() {
        for seed in [1, 7, 12345, 999_999, u32::MAX] {
            let field = generate_obstacles(seed, &settings(12), 3000.0, false);
            assert!(field.windows(2).all(|w| w[0].x <= w[1].x));
            assert!(field.iter().all(|o| (500.0..=2900.0).contains(&o.x)));
            assert!(field.iter().enumerate().all(|(i, o)| o.id as usize == i));
        }
    }

    #[test]
    fn test_ground_kinds_rest_on_ground_and_aerials_float() {
        let field = generate_obstacles(4242, &settings(12), 3000.0, false);
        for o in &field {
            match o.kind {
                ObstacleKind::GroundLow | ObstacleKind::GroundMid => {
                    assert!((o.bottom() - GROUND_Y).abs() < 1e-9);
                }
                ObstacleKind::Aerial => {
                    assert_eq!((o.width, o.height), (25.0, 20.0));
                    assert!(o.bottom() <= GROUND_Y - 40.0);
                }
            }
        }
    }

    #[test]
    fn test_spacing_holds_when_slots_are_wide_enough() {
        for seed in 0..50 {
            let field = generate_obstacles(seed, &settings(10), 3000.0, false);
            assert!(
                field.windows(2).all(|w| w[1].x - w[0].x >= 150.0),
                "seed {seed}"
            );
        }
    }

    #[test]
    fn test_kind_names_are_kebab_case() {
        let json = serde_json::to_string(&ObstacleKind::GroundLow).unwrap();
        assert_eq!(json, "\"ground-low\"");
        assert_eq!(ObstacleKind::Aerial.to_string(), "aerial");
    }

    #[test]
    fn test_settings_accept_both_key_styles() {
        let wire = serde_json::to_value(ObstacleSettings::default()).unwrap();
        assert_eq!(wire["minSpacing"], 150.0);

        let cfg: ObstacleSettings =
            serde_json::from_str(r#"{"count":3,"safe_zone_start":800}"#).unwrap();
        assert_eq!(cfg.count, 3);
        assert_eq!(cfg.safe_zone_start, 800.0);
        assert_eq!(cfg.min_spacing, 150.0);
    }
}
