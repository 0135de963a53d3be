//! Final standings and reward intents.

use dashrun_protocol::{ParticipantId, PlayerId};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// A participant as they stood when the race ended.
#[derive(Debug, Clone, PartialEq)]
pub struct Finisher {
    pub participant: ParticipantId,
    pub spirit_id: String,
    pub distance: f64,
}

/// One row of the `game-end` results table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    #[serde(rename = "playerId")]
    pub participant: ParticipantId,
    pub spirit_id: String,
    /// Distance floored to whole units.
    pub distance: u64,
    /// 1-based.
    pub place: u32,
    pub is_bot: bool,
}

/// What a human earned. Persisting it is someone else's job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reward {
    pub player_id: PlayerId,
    pub spirit_id: String,
    pub currency: u64,
    pub experience: u64,
    /// Zero unless the rare drop hit.
    pub premium_currency: f64,
    pub bonus_capsule: bool,
}

struct PlaceTable {
    base: u64,
    divisor: u64,
    experience: u64,
    premium_chance: f64,
    premium_amount: f64,
    capsule_chance: f64,
}

const PLACES: [PlaceTable; 4] = [
    PlaceTable {
        base: 250,
        divisor: 100,
        experience: 30,
        premium_chance: 0.05,
        premium_amount: 0.10,
        capsule_chance: 0.10,
    },
    PlaceTable {
        base: 150,
        divisor: 150,
        experience: 20,
        premium_chance: 0.02,
        premium_amount: 0.05,
        capsule_chance: 0.03,
    },
    PlaceTable {
        base: 50,
        divisor: 200,
        experience: 10,
        premium_chance: 0.01,
        premium_amount: 0.02,
        capsule_chance: 0.01,
    },
    PlaceTable {
        base: 25,
        divisor: 250,
        experience: 5,
        premium_chance: 0.0,
        premium_amount: 0.0,
        capsule_chance: 0.0,
    },
];

fn table_for(place: u32) -> &'static PlaceTable {
    let idx = (place.max(1) as usize - 1).min(PLACES.len() - 1);
    &PLACES[idx]
}

/// Orders finishers by distance, furthest first.
///
/// The sort is stable: equal distances keep their input order.
pub fn rank(mut finishers: Vec<Finisher>) -> Vec<Placement> {
    finishers.sort_by(|a, b| b.distance.total_cmp(&a.distance));
    finishers
        .into_iter()
        .zip(1u32..)
        .map(|(f, place)| Placement {
            participant: f.participant,
            spirit_id: f.spirit_id,
            distance: f.distance.max(0.0).floor() as u64,
            place,
            is_bot: f.participant.is_bot(),
        })
        .collect()
}

/// Rewards for every human in `placements`. Bots earn nothing.
///
/// Per human the premium drop is rolled before the capsule drop.
pub fn calculate_rewards<R: Rng + ?Sized>(placements: &[Placement], rng: &mut R) -> Vec<Reward> {
    placements
        .iter()
        .filter_map(|p| {
            let player_id = p.participant.as_player()?;
            let table = table_for(p.place);

            let premium_hit = table.premium_chance > 0.0 && rng.random::<f64>() < table.premium_chance;
            let capsule_hit = table.capsule_chance > 0.0 && rng.random::<f64>() < table.capsule_chance;

            Some(Reward {
                player_id,
                spirit_id: p.spirit_id.clone(),
                currency: table.base + p.distance / table.divisor,
                experience: table.experience,
                premium_currency: if premium_hit { table.premium_amount } else { 0.0 },
                bonus_capsule: capsule_hit,
            })
        })
        .collect()
}
