//! Race participants: one record shape for humans and bots.

use dashrun_protocol::{BotId, ParticipantId, PlayerId};
use dashrun_rules::{Body, BotBrain, GameStats, PhysicsParams};

use crate::events::{ParticipantSnapshot, ParticipantStats, StartingParticipant};

/// Who is behind a participant.
#[derive(Debug, Clone, PartialEq)]
pub enum Controller {
    Human { id: PlayerId, ready: bool },
    Bot { id: BotId, name: String, brain: BotBrain },
}

/// A single lane in the race.
///
/// Movement and collision go through [`Body`] for everyone; only the
/// [`Controller`] differs.
#[derive(Debug, Clone, PartialEq)]
pub struct Participant {
    pub controller: Controller,
    pub spirit_id: String,
    pub stats: GameStats,
    pub body: Body,
}

impl Participant {
    pub fn human(id: PlayerId, spirit_id: String, stats: GameStats, physics: &PhysicsParams) -> Self {
        Self {
            controller: Controller::Human { id, ready: false },
            spirit_id,
            stats,
            body: Body::at_start(physics),
        }
    }

    pub fn bot(
        id: BotId,
        name: String,
        brain: BotBrain,
        stats: GameStats,
        physics: &PhysicsParams,
    ) -> Self {
        Self {
            controller: Controller::Bot { id, name, brain },
            spirit_id: format!("bot_spirit_{}", id.0),
            stats,
            body: Body::at_start(physics),
        }
    }

    pub fn id(&self) -> ParticipantId {
        match &self.controller {
            Controller::Human { id, .. } => ParticipantId::Player(*id),
            Controller::Bot { id, .. } => ParticipantId::Bot(*id),
        }
    }

    pub fn player_id(&self) -> Option<PlayerId> {
        match &self.controller {
            Controller::Human { id, .. } => Some(*id),
            Controller::Bot { .. } => None,
        }
    }

    pub fn is_bot(&self) -> bool {
        matches!(self.controller, Controller::Bot { .. })
    }

    pub fn name(&self) -> Option<&str> {
        match &self.controller {
            Controller::Bot { name, .. } => Some(name),
            Controller::Human { .. } => None,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.body.alive
    }

    pub(crate) fn start_entry(&self) -> StartingParticipant {
        StartingParticipant {
            id: self.id(),
            spirit_id: self.spirit_id.clone(),
            y: self.body.y,
            stats: self.stats,
            is_bot: self.is_bot(),
            name: self.name().map(str::to_owned),
        }
    }

    pub(crate) fn snapshot(&self) -> ParticipantSnapshot {
        ParticipantSnapshot {
            id: self.id(),
            y: self.body.y,
            distance: self.body.distance.max(0.0).floor() as u64,
            is_alive: self.body.alive,
            is_jumping: self.body.airborne,
            is_bot: self.is_bot(),
        }
    }

    pub(crate) fn stats_entry(&self, physics: &PhysicsParams) -> ParticipantStats {
        ParticipantStats {
            id: self.id(),
            spirit_id: self.spirit_id.clone(),
            name: self.name().map(str::to_owned),
            is_bot: self.is_bot(),
            stats: self.stats,
            calculated_speed: physics.speed(&self.stats),
            jump_speed_multiplier: physics.jump_speed_multiplier(&self.stats),
        }
    }
}
