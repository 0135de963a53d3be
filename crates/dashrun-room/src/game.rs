//! The race aggregate.
//!
//! [`GameRoom`] owns one race from countdown to results. It is plain,
//! synchronous state: every operation mutates the room and returns the
//! events it produced as `(Recipient, ServerEvent)` pairs. The room actor
//! decides when operations run and delivers the events.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashrun_protocol::{BotId, ParticipantId, PlayerId, Recipient, RoomId};
use dashrun_rules::{
    BotBrain, Finisher, GameStats, Obstacle, Placement, Reward, Seed, SpiritAttributes,
    StatsPatch, calculate_rewards, generate_obstacles, rank,
};
use rand::rngs::StdRng;
use tracing::{debug, info};

use crate::events::{ParticipantsReport, PlayerInput, ServerEvent};
use crate::participant::{Controller, Participant};
use crate::{MatchPhase, RoomConfig, RoomError};

/// Counter for bot ids. Shared by every room so ids never repeat.
static NEXT_BOT_ID: AtomicU64 = AtomicU64::new(1);

/// Events produced by one room operation.
pub type Outbox = Vec<(Recipient, ServerEvent)>;

/// A human taken off the queue into a room.
#[derive(Debug, Clone, PartialEq)]
pub struct Entrant {
    pub player_id: PlayerId,
    pub spirit_id: String,
    pub spirit: Option<SpiritAttributes>,
}

impl Entrant {
    pub fn new(player_id: PlayerId, spirit_id: impl Into<String>) -> Self {
        Self {
            player_id,
            spirit_id: spirit_id.into(),
            spirit: None,
        }
    }
}

/// Final outcome, kept after the race ends.
#[derive(Debug, Clone, PartialEq)]
pub struct Standings {
    pub results: Vec<Placement>,
    pub rewards: Vec<Reward>,
}

/// One race.
///
/// Participants live in arena order: humans in match order, then bots.
/// That order drives the per-tick update and breaks ties in the results.
#[derive(Debug)]
pub struct GameRoom {
    room_id: RoomId,
    phase: MatchPhase,
    seed: Seed,
    config: Arc<RoomConfig>,
    participants: Vec<Participant>,
    obstacles: Vec<Obstacle>,
    connected: HashSet<PlayerId>,
    countdown: u32,
    game_time: f64,
    rng: StdRng,
    standings: Option<Standings>,
}

impl GameRoom {
    /// Builds a room in the countdown phase with `bot_count` bots appended.
    ///
    /// `rng` drives bot skill, bot stats, trigger jitter and reward drops.
    /// The course comes from `seed` alone.
    pub fn new(
        room_id: RoomId,
        entrants: Vec<Entrant>,
        bot_count: usize,
        config: Arc<RoomConfig>,
        seed: Seed,
        mut rng: StdRng,
    ) -> Self {
        let physics = &config.physics;
        let mut participants = Vec::with_capacity(entrants.len() + bot_count);
        let mut connected = HashSet::with_capacity(entrants.len());

        for entrant in entrants {
            let stats = config.starting_stats(entrant.spirit.as_ref());
            connected.insert(entrant.player_id);
            participants.push(Participant::human(
                entrant.player_id,
                entrant.spirit_id,
                stats,
                physics,
            ));
        }

        for _ in 0..bot_count {
            let id = BotId(NEXT_BOT_ID.fetch_add(1, Ordering::Relaxed));
            let brain = BotBrain::spawn(&config.bots, &mut rng);
            let stats = config.bots.roll_stats(&mut rng);
            let name = config.bots.name_for(id.0);
            debug!(%room_id, bot = %id, %name, skill = brain.skill(), "bot added");
            participants.push(Participant::bot(id, name, brain, stats, physics));
        }

        Self {
            room_id,
            phase: MatchPhase::Countdown,
            seed,
            countdown: config.countdown_seconds,
            config,
            participants,
            obstacles: Vec::new(),
            connected,
            game_time: 0.0,
            rng,
            standings: None,
        }
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// One countdown beat: broadcasts the current count, then decrements.
    ///
    /// The beat after `0` has been broadcast starts the race, so with a
    /// countdown of 3 players see 3, 2, 1, 0 and then `game-start`.
    pub fn countdown_step(&mut self) -> Outbox {
        if self.phase != MatchPhase::Countdown {
            return Vec::new();
        }

        let mut out = vec![(
            Recipient::All,
            ServerEvent::GameCountdown {
                count: self.countdown,
            },
        )];
        match self.countdown.checked_sub(1) {
            Some(next) => self.countdown = next,
            None => out.extend(self.start_game()),
        }
        out
    }

    /// Generates the course, freezes the roster and enters `Playing`.
    pub fn start_game(&mut self) -> Outbox {
        if !self.phase.can_transition_to(MatchPhase::Playing) {
            return Vec::new();
        }
        self.phase = MatchPhase::Playing;
        self.game_time = 0.0;

        let no_obstacles = self.config.no_obstacles();
        self.obstacles = generate_obstacles(
            self.seed,
            &self.config.obstacles,
            self.config.finish_distance,
            no_obstacles,
        );

        info!(
            room_id = %self.room_id,
            seed = self.seed,
            participants = self.participants.len(),
            obstacles = self.obstacles.len(),
            "race started"
        );

        vec![(
            Recipient::All,
            ServerEvent::GameStart {
                seed: self.seed,
                players: self.participants.iter().map(Participant::start_entry).collect(),
                finish_distance: self.config.finish_distance,
                no_obstacles,
                obstacle_settings: self.config.obstacles.clone(),
            },
        )]
    }

    /// Advances the simulation by `dt` seconds of measured wall time.
    pub fn tick(&mut self, dt: f64) -> Outbox {
        if self.phase != MatchPhase::Playing {
            return Vec::new();
        }
        let dt = dt.max(0.0);
        self.game_time += dt;

        let mut out = Vec::new();
        let Self {
            participants,
            obstacles,
            config,
            rng,
            room_id,
            ..
        } = self;
        let obstacles: &[Obstacle] = obstacles;
        let physics = &config.physics;

        for p in participants.iter_mut().filter(|p| p.body.alive) {
            if let Controller::Bot { brain, .. } = &mut p.controller {
                if brain.decide(&p.body, &p.stats, obstacles, physics, &config.bots, &mut *rng) {
                    p.body.try_jump(physics);
                }
            }

            let grounded_from = (!p.body.airborne).then_some(p.body.distance);
            p.body.advance(physics, &p.stats, dt);

            let hit = match grounded_from {
                Some(from) => p.body.find_collision_from(physics, obstacles, from),
                None => p.body.find_collision(physics, obstacles),
            };
            if let Some(hit) = hit {
                p.body.alive = false;
                let id = p.id();
                debug!(
                    %room_id,
                    participant = %id,
                    distance = p.body.distance,
                    obstacle = hit.id,
                    kind = %hit.kind,
                    "participant eliminated"
                );
                out.push((
                    Recipient::All,
                    ServerEvent::PlayerEliminated {
                        player_id: id,
                        distance: p.body.distance.floor() as u64,
                        is_bot: id.is_bot(),
                    },
                ));
            }
        }

        let finish = config.finish_distance;
        let someone_finished = participants
            .iter()
            .any(|p| p.body.alive && p.body.distance >= finish);
        if someone_finished {
            for p in participants.iter_mut() {
                p.body.distance = p.body.distance.min(finish);
            }
        }

        out.push((
            Recipient::All,
            ServerEvent::GameState {
                game_time: self.game_time,
                players: self.participants.iter().map(Participant::snapshot).collect(),
            },
        ));

        if someone_finished || !self.participants.iter().any(Participant::is_alive) {
            out.extend(self.end());
        }
        out
    }

    /// Ranks everyone, computes rewards and enters `Finished`.
    ///
    /// Calling it again is a no-op.
    pub fn end(&mut self) -> Outbox {
        if self.phase.is_finished() {
            return Vec::new();
        }
        self.phase = MatchPhase::Finished;

        let finishers = self
            .participants
            .iter()
            .map(|p| Finisher {
                participant: p.id(),
                spirit_id: p.spirit_id.clone(),
                distance: p.body.distance,
            })
            .collect();
        let results = rank(finishers);
        let rewards = calculate_rewards(&results, &mut self.rng);

        info!(
            room_id = %self.room_id,
            game_time = self.game_time,
            winner = ?results.first().map(|p| p.participant),
            "race finished"
        );

        self.standings = Some(Standings {
            results: results.clone(),
            rewards: rewards.clone(),
        });
        vec![(Recipient::All, ServerEvent::GameEnd { results, rewards })]
    }

    // -----------------------------------------------------------------------
    // Player operations
    // -----------------------------------------------------------------------

    /// Applies a jump request. Returns whether a jump started.
    ///
    /// Ignored outside `Playing`, for dead or airborne participants, and for
    /// unknown players.
    pub fn handle_input(&mut self, player_id: PlayerId, input: &PlayerInput) -> bool {
        if self.phase != MatchPhase::Playing || !input.wants_jump() {
            return false;
        }
        let config = Arc::clone(&self.config);
        match self.participant_mut(ParticipantId::Player(player_id)) {
            Some(p) => p.body.try_jump(&config.physics),
            None => false,
        }
    }

    pub fn set_ready(&mut self, player_id: PlayerId) -> bool {
        match self.participant_mut(ParticipantId::Player(player_id)) {
            Some(Participant {
                controller: Controller::Human { ready, .. },
                ..
            }) => {
                *ready = true;
                true
            }
            _ => false,
        }
    }

    /// Overwrites the supplied stats of `target`.
    ///
    /// Every supplied value is checked before anything changes.
    pub fn set_stats(
        &mut self,
        target: ParticipantId,
        patch: &StatsPatch,
    ) -> Result<GameStats, RoomError> {
        self.config.physics.stat_bounds.validate(patch)?;
        let room_id = self.room_id;
        let p = self
            .participant_mut(target)
            .ok_or(RoomError::UnknownParticipant(target, room_id))?;
        p.stats.apply(patch);
        debug!(%room_id, participant = %target, speed = p.stats.speed, jump = p.stats.jump, "stats updated");
        Ok(p.stats)
    }

    /// Marks the player dead and drops their connection.
    pub fn handle_disconnect(&mut self, player_id: PlayerId) -> Outbox {
        let was_connected = self.connected.remove(&player_id);
        let Some(p) = self.participant_mut(ParticipantId::Player(player_id)) else {
            return Vec::new();
        };
        p.body.alive = false;
        debug!(room_id = %self.room_id, %player_id, was_connected, "player disconnected");
        vec![(
            Recipient::AllExcept(player_id),
            ServerEvent::PlayerDisconnected { player_id },
        )]
    }

    /// `true` once no human connection remains.
    pub fn is_empty(&self) -> bool {
        self.connected.is_empty()
    }

    pub fn participants_report(&self) -> ParticipantsReport {
        let physics = &self.config.physics;
        let (bots, players): (Vec<_>, Vec<_>) = self
            .participants
            .iter()
            .map(|p| p.stats_entry(physics))
            .partition(|entry| entry.is_bot);
        ParticipantsReport {
            players,
            bots,
            stats_info: physics.describe(),
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    pub fn phase(&self) -> MatchPhase {
        self.phase
    }

    pub fn seed(&self) -> Seed {
        self.seed
    }

    pub fn game_time(&self) -> f64 {
        self.game_time
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn participant(&self, id: ParticipantId) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id() == id)
    }

    /// Players still connected, in no particular order.
    pub fn connected(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.connected.iter().copied()
    }

    pub fn human_ids(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.participants.iter().filter_map(Participant::player_id)
    }

    pub fn standings(&self) -> Option<&Standings> {
        self.standings.as_ref()
    }

    fn participant_mut(&mut self, id: ParticipantId) -> Option<&mut Participant> {
        self.participants.iter_mut().find(|p| p.id() == id)
    }
}
