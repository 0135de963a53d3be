//! Matchmaking: the waiting queue, bot-fill timers and the room directory.
//!
//! All three live in one [`Registry`] behind a single Tokio mutex, so taking
//! players off the queue and assigning them a room is one atomic step.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use dashrun_protocol::{PlayerId, RoomId};
use dashrun_rules::{Seed, SpiritAttributes};
use dashrun_tick::ScheduledTask;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::{Mutex, mpsc};
use tokio::time::Instant;

use crate::events::{GameType, RosterEntry, ServerEvent};
use crate::game::{Entrant, GameRoom};
use crate::room::{PlayerSender, RoomHandle, RoomNotice, spawn_room};
use crate::{MatchmakingError, RoomConfig, RoomError};

/// Counter for generating unique room IDs.
static NEXT_ROOM_ID: AtomicU64 = AtomicU64::new(1);

/// A player asking to be matched.
#[derive(Debug, Clone)]
pub struct Contestant {
    pub player_id: PlayerId,
    pub spirit_id: String,
    pub spirit: Option<SpiritAttributes>,
    /// Where the room will deliver this player's events.
    pub sender: PlayerSender,
}

/// What `queue-status` reports to a player who just joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueStatus {
    /// 1-based place in the queue for the game type.
    pub position: usize,
    pub players_in_queue: usize,
    pub players_needed: usize,
}

impl From<QueueStatus> for ServerEvent {
    fn from(status: QueueStatus) -> Self {
        ServerEvent::QueueStatus {
            position: status.position,
            players_in_queue: status.players_in_queue,
            players_needed: status.players_needed,
        }
    }
}

#[derive(Debug)]
struct QueueEntry {
    contestant: Contestant,
    game_type: GameType,
    joined_at: Instant,
    seq: u64,
}

#[derive(Debug)]
struct FillTimer {
    id: u64,
    task: ScheduledTask,
}

#[derive(Debug, Default)]
struct Registry {
    queue: HashMap<PlayerId, QueueEntry>,
    rooms: HashMap<RoomId, RoomHandle>,
    /// A player is in at most one room.
    player_rooms: HashMap<PlayerId, RoomId>,
    /// At most one pending bot-fill per game type.
    fill_timers: HashMap<GameType, FillTimer>,
    next_seq: u64,
    next_timer: u64,
}

impl Registry {
    /// Waiting players for `game_type`, oldest first.
    fn waiting(&self, game_type: &GameType) -> Vec<PlayerId> {
        let mut entries: Vec<&QueueEntry> = self
            .queue
            .values()
            .filter(|e| &e.game_type == game_type)
            .collect();
        entries.sort_by_key(|e| (e.joined_at, e.seq));
        entries.iter().map(|e| e.contestant.player_id).collect()
    }

    fn cancel_fill_timer(&mut self, game_type: &GameType) {
        if let Some(timer) = self.fill_timers.remove(game_type) {
            timer.task.cancel();
            tracing::debug!(%game_type, timer = timer.id, "bot-fill timer canceled");
        }
    }
}

struct Shared {
    config: Arc<RoomConfig>,
    registry: Mutex<Registry>,
    notices: mpsc::UnboundedSender<RoomNotice>,
    results: Option<mpsc::UnboundedSender<RoomNotice>>,
}

/// Matches queued players into race rooms.
///
/// Cheap to clone; clones share one registry.
#[derive(Clone)]
pub struct Matchmaker {
    shared: Arc<Shared>,
}

impl Matchmaker {
    /// Creates a matchmaker. Must be called within a Tokio runtime.
    pub fn new(config: Arc<RoomConfig>) -> Self {
        Self::build(config, None)
    }

    /// Like [`Matchmaker::new`], additionally forwarding every finished
    /// race's standings to `results`.
    pub fn with_results(config: Arc<RoomConfig>, results: mpsc::UnboundedSender<RoomNotice>) -> Self {
        Self::build(config, Some(results))
    }

    fn build(config: Arc<RoomConfig>, results: Option<mpsc::UnboundedSender<RoomNotice>>) -> Self {
        let (notices, notice_rx) = mpsc::unbounded_channel();
        let shared = Arc::new(Shared {
            config,
            registry: Mutex::new(Registry::default()),
            notices,
            results,
        });
        tokio::spawn(reap_finished_rooms(Arc::downgrade(&shared), notice_rx));
        Self { shared }
    }

    pub fn config(&self) -> &RoomConfig {
        &self.shared.config
    }

    // -----------------------------------------------------------------------
    // Queue
    // -----------------------------------------------------------------------

    /// Queues a player and tries to form a match.
    ///
    /// The player receives `queue-status` before any `match-found`.
    pub async fn add_to_queue(
        &self,
        contestant: Contestant,
        game_type: GameType,
    ) -> Result<QueueStatus, MatchmakingError> {
        let player_id = contestant.player_id;
        if !self.shared.config.knows_game_type(game_type.as_str()) {
            return Err(MatchmakingError::UnknownGameType(game_type.0));
        }

        let mut reg = self.shared.registry.lock().await;
        if reg.queue.contains_key(&player_id) {
            return Err(MatchmakingError::AlreadyQueued(player_id));
        }
        if reg.player_rooms.contains_key(&player_id) {
            return Err(MatchmakingError::AlreadyInMatch(player_id));
        }

        let seq = reg.next_seq;
        reg.next_seq += 1;
        let sender = contestant.sender.clone();
        reg.queue.insert(
            player_id,
            QueueEntry {
                contestant,
                game_type: game_type.clone(),
                joined_at: Instant::now(),
                seq,
            },
        );

        let waiting = reg.waiting(&game_type);
        let status = QueueStatus {
            position: waiting.iter().position(|p| *p == player_id).map_or(waiting.len(), |i| i + 1),
            players_in_queue: waiting.len(),
            players_needed: self.players_per_match().saturating_sub(waiting.len()),
        };
        tracing::info!(%player_id, %game_type, position = status.position, "player queued");
        let _ = sender.send(status.into());

        self.try_match(&mut reg, &game_type);
        Ok(status)
    }

    /// Removes a waiting player. Returns whether they were queued.
    pub async fn remove_from_queue(&self, player_id: PlayerId) -> bool {
        let mut reg = self.shared.registry.lock().await;
        Self::dequeue(&mut reg, player_id)
    }

    fn dequeue(reg: &mut Registry, player_id: PlayerId) -> bool {
        let Some(entry) = reg.queue.remove(&player_id) else {
            return false;
        };
        tracing::info!(%player_id, game_type = %entry.game_type, "player left queue");
        if reg.waiting(&entry.game_type).is_empty() {
            reg.cancel_fill_timer(&entry.game_type);
        }
        true
    }

    // -----------------------------------------------------------------------
    // Matching
    // -----------------------------------------------------------------------

    fn players_per_match(&self) -> usize {
        self.shared.config.players_per_match.max(1)
    }

    fn try_match(&self, reg: &mut Registry, game_type: &GameType) {
        let needed = self.players_per_match();
        let mut waiting = reg.waiting(game_type);

        if waiting.len() >= needed {
            waiting.truncate(needed);
            reg.cancel_fill_timer(game_type);
            self.create_match(reg, game_type, waiting, 0);
        } else if !waiting.is_empty()
            && self.shared.config.bots.enabled
            && !reg.fill_timers.contains_key(game_type)
        {
            self.start_fill_timer(reg, game_type);
        }
    }

    fn start_fill_timer(&self, reg: &mut Registry, game_type: &GameType) {
        let id = reg.next_timer;
        reg.next_timer += 1;

        let shared = Arc::downgrade(&self.shared);
        let target = game_type.clone();
        let delay = self.shared.config.bot_fill_timeout();
        let task = ScheduledTask::after(delay, async move {
            if let Some(shared) = shared.upgrade() {
                Matchmaker { shared }.fill_with_bots(target, id).await;
            }
        });

        tracing::debug!(%game_type, timer = id, delay_ms = delay.as_millis() as u64, "bot-fill timer started");
        reg.fill_timers.insert(game_type.clone(), FillTimer { id, task });
    }

    /// Bot-fill timer expiry: match whoever is still waiting, plus bots.
    async fn fill_with_bots(&self, game_type: GameType, timer_id: u64) {
        let mut reg = self.shared.registry.lock().await;

        // Canceled or superseded while we waited for the lock.
        if reg.fill_timers.get(&game_type).map(|t| t.id) != Some(timer_id) {
            tracing::debug!(%game_type, timer = timer_id, "stale bot-fill timer ignored");
            return;
        }
        reg.fill_timers.remove(&game_type);

        let mut waiting = reg.waiting(&game_type);
        if waiting.is_empty() {
            return;
        }
        let needed = self.players_per_match();
        waiting.truncate(needed);
        let bots = needed - waiting.len();
        self.create_match(&mut reg, &game_type, waiting, bots);
    }

    /// Moves `players` from the queue into a new room with `bot_count` bots.
    fn create_match(
        &self,
        reg: &mut Registry,
        game_type: &GameType,
        players: Vec<PlayerId>,
        bot_count: usize,
    ) -> RoomId {
        let config = &self.shared.config;
        let room_id = RoomId(NEXT_ROOM_ID.fetch_add(1, Ordering::Relaxed));

        let mut entrants = Vec::with_capacity(players.len());
        let mut senders = HashMap::with_capacity(players.len());
        for entry in players.iter().filter_map(|p| reg.queue.remove(p)) {
            let Contestant {
                player_id,
                spirit_id,
                spirit,
                sender,
            } = entry.contestant;
            reg.player_rooms.insert(player_id, room_id);
            senders.insert(player_id, sender);
            entrants.push(Entrant {
                player_id,
                spirit_id,
                spirit,
            });
        }

        let roster: Vec<RosterEntry> = entrants
            .iter()
            .map(|e| RosterEntry {
                id: e.player_id,
                spirit_id: e.spirit_id.clone(),
            })
            .collect();
        for (player_id, sender) in &senders {
            let _ = sender.send(ServerEvent::MatchFound {
                room_id,
                game_type: game_type.clone(),
                my_player_id: *player_id,
                players: roster.clone(),
                bots_count: bot_count,
            });
        }

        let mut seeder = rand::rng();
        let seed: Seed = seeder.random();
        let rng = StdRng::from_rng(&mut seeder);
        let game = GameRoom::new(room_id, entrants, bot_count, Arc::clone(config), seed, rng);

        let handle = spawn_room(
            game,
            senders,
            config.tick_rate,
            config.command_buffer,
            Some(self.shared.notices.clone()),
        );
        reg.rooms.insert(room_id, handle);

        tracing::info!(
            %room_id,
            %game_type,
            humans = roster.len(),
            bots = bot_count,
            seed,
            "match created"
        );
        room_id
    }

    // -----------------------------------------------------------------------
    // Disconnects and lookups
    // -----------------------------------------------------------------------

    /// Removes every trace of a departed player.
    ///
    /// A room left without any human connection is shut down.
    pub async fn handle_disconnect(&self, player_id: PlayerId) {
        let handle = {
            let mut reg = self.shared.registry.lock().await;
            Self::dequeue(&mut reg, player_id);
            let Some(room_id) = reg.player_rooms.remove(&player_id) else {
                return;
            };
            reg.rooms.get(&room_id).cloned()
        };
        let Some(handle) = handle else {
            return;
        };

        // A room that already stopped counts as empty.
        let empty = handle.disconnect(player_id).await.unwrap_or(true);
        if !empty {
            return;
        }

        let room_id = handle.room_id();
        self.shared.registry.lock().await.rooms.remove(&room_id);
        let _ = handle.shutdown().await;
        tracing::info!(%room_id, "empty room destroyed");
    }

    pub async fn room_of(&self, player_id: PlayerId) -> Option<RoomId> {
        self.shared.registry.lock().await.player_rooms.get(&player_id).copied()
    }

    /// Handle to the room the player races in.
    pub async fn room_for(&self, player_id: PlayerId) -> Result<RoomHandle, RoomError> {
        let reg = self.shared.registry.lock().await;
        reg.player_rooms
            .get(&player_id)
            .and_then(|room_id| reg.rooms.get(room_id))
            .cloned()
            .ok_or(RoomError::NotInRoom(player_id))
    }

    pub async fn room_count(&self) -> usize {
        self.shared.registry.lock().await.rooms.len()
    }

    pub async fn queue_len(&self, game_type: &GameType) -> usize {
        self.shared.registry.lock().await.waiting(game_type).len()
    }

    pub async fn is_queued(&self, player_id: PlayerId) -> bool {
        self.shared.registry.lock().await.queue.contains_key(&player_id)
    }

    /// Whether a bot-fill timer is pending for `game_type`.
    pub async fn fill_pending(&self, game_type: &GameType) -> bool {
        self.shared.registry.lock().await.fill_timers.contains_key(game_type)
    }
}

/// Releases the roster of every finished room.
async fn reap_finished_rooms(shared: Weak<Shared>, mut notices: mpsc::UnboundedReceiver<RoomNotice>) {
    while let Some(notice) = notices.recv().await {
        let Some(shared) = shared.upgrade() else {
            break;
        };
        let RoomNotice::Finished {
            room_id, players, ..
        } = &notice;

        {
            let mut reg = shared.registry.lock().await;
            reg.rooms.remove(room_id);
            for player_id in players {
                if reg.player_rooms.get(player_id) == Some(room_id) {
                    reg.player_rooms.remove(player_id);
                }
            }
        }
        tracing::info!(%room_id, players = players.len(), "finished room released");

        if let Some(results) = &shared.results {
            let _ = results.send(notice);
        }
    }
}
