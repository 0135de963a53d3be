//! Room actor: a Tokio task that owns one [`GameRoom`].
//!
//! The actor multiplexes three sources in a single `select!` loop: commands
//! from its [`RoomHandle`], the one-second countdown beat, and the fixed-rate
//! simulation tick. Only one of the two timers is live at a time; each is
//! dropped as soon as its phase is over.

use std::collections::HashMap;
use std::time::Duration;

use dashrun_protocol::{ParticipantId, PlayerId, RoomId};
use dashrun_rules::{GameStats, Seed, StatsPatch};
use dashrun_tick::{TickInfo, TickScheduler};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{self, Instant, Interval, MissedTickBehavior};

use crate::events::{ParticipantsReport, PlayerInput, ServerEvent};
use crate::game::{GameRoom, Outbox, Standings};
use crate::{MatchPhase, RoomError};

/// Channel sender for delivering events to one player's connection.
pub type PlayerSender = mpsc::UnboundedSender<ServerEvent>;

const COUNTDOWN_BEAT: Duration = Duration::from_secs(1);

/// Commands sent to a room actor through its channel.
pub(crate) enum RoomCommand {
    Input {
        player_id: PlayerId,
        input: PlayerInput,
    },

    Ready {
        player_id: PlayerId,
    },

    SetStats {
        target: ParticipantId,
        patch: StatsPatch,
        reply: oneshot::Sender<Result<GameStats, RoomError>>,
    },

    Participants {
        reply: oneshot::Sender<ParticipantsReport>,
    },

    /// Replies whether the room is now empty.
    Disconnect {
        player_id: PlayerId,
        reply: oneshot::Sender<bool>,
    },

    GetInfo {
        reply: oneshot::Sender<RoomInfo>,
    },

    Shutdown,
}

/// A snapshot of room metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct RoomInfo {
    pub room_id: RoomId,
    pub phase: MatchPhase,
    pub seed: Seed,
    /// Humans and bots.
    pub participants: usize,
    pub alive: usize,
    pub connected: usize,
    pub game_time: f64,
}

/// Sent by a room actor to whoever spawned it.
#[derive(Debug, Clone, PartialEq)]
pub enum RoomNotice {
    /// The race ended. `players` is the full human roster.
    Finished {
        room_id: RoomId,
        players: Vec<PlayerId>,
        standings: Standings,
    },
}

/// Handle to a running room actor.
///
/// Cheap to clone; the matchmaker holds one per room.
#[derive(Debug, Clone)]
pub struct RoomHandle {
    room_id: RoomId,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    /// Forwards a jump request (fire-and-forget).
    pub async fn input(&self, player_id: PlayerId, input: PlayerInput) -> Result<(), RoomError> {
        self.send(RoomCommand::Input { player_id, input }).await
    }

    pub async fn ready(&self, player_id: PlayerId) -> Result<(), RoomError> {
        self.send(RoomCommand::Ready { player_id }).await
    }

    /// Changes the stats of any participant in the room.
    pub async fn set_stats(
        &self,
        target: ParticipantId,
        patch: StatsPatch,
    ) -> Result<GameStats, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RoomCommand::SetStats {
            target,
            patch,
            reply: reply_tx,
        })
        .await?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))?
    }

    pub async fn participants(&self) -> Result<ParticipantsReport, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RoomCommand::Participants { reply: reply_tx }).await?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))
    }

    /// Marks the player disconnected. Returns whether no human remains.
    pub async fn disconnect(&self, player_id: PlayerId) -> Result<bool, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RoomCommand::Disconnect {
            player_id,
            reply: reply_tx,
        })
        .await?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))
    }

    pub async fn info(&self) -> Result<RoomInfo, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RoomCommand::GetInfo { reply: reply_tx }).await?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))
    }

    /// Tells the room to stop. Pending timers die with it.
    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.send(RoomCommand::Shutdown).await
    }

    /// Whether the actor task has exited.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    async fn send(&self, cmd: RoomCommand) -> Result<(), RoomError> {
        self.sender
            .send(cmd)
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))
    }
}

/// The internal room actor state. Runs inside a Tokio task.
struct RoomActor {
    room_id: RoomId,
    game: GameRoom,
    tick_rate: u32,
    senders: HashMap<PlayerId, PlayerSender>,
    receiver: mpsc::Receiver<RoomCommand>,
    notices: Option<mpsc::UnboundedSender<RoomNotice>>,
}

impl RoomActor {
    async fn run(mut self) {
        tracing::info!(room_id = %self.room_id, "room actor started");

        let mut countdown = Some(countdown_interval());
        let mut ticker: Option<TickScheduler> = None;

        loop {
            tokio::select! {
                cmd = self.receiver.recv() => match cmd {
                    Some(RoomCommand::Shutdown) | None => {
                        tracing::info!(room_id = %self.room_id, "room shutting down");
                        break;
                    }
                    Some(cmd) => self.handle_command(cmd),
                },
                () = next_beat(&mut countdown) => {
                    let out = self.game.countdown_step();
                    self.dispatch(out);
                    if self.game.phase() != MatchPhase::Countdown {
                        countdown = None;
                        ticker = Some(TickScheduler::with_rate(self.tick_rate));
                    }
                }
                info = next_tick(&mut ticker) => {
                    let out = self.game.tick(info.dt.as_secs_f64());
                    self.dispatch(out);
                    if let Some(scheduler) = ticker.as_mut() {
                        scheduler.record_tick_end();
                    }
                }
            }

            if self.game.phase().is_finished() {
                self.report_finished();
                break;
            }
        }

        tracing::info!(room_id = %self.room_id, "room actor stopped");
    }

    fn handle_command(&mut self, cmd: RoomCommand) {
        match cmd {
            RoomCommand::Input { player_id, input } => {
                if !self.game.handle_input(player_id, &input) {
                    tracing::trace!(room_id = %self.room_id, %player_id, "input ignored");
                }
            }
            RoomCommand::Ready { player_id } => {
                if self.game.set_ready(player_id) {
                    tracing::debug!(room_id = %self.room_id, %player_id, "player ready");
                }
            }
            RoomCommand::SetStats {
                target,
                patch,
                reply,
            } => {
                let _ = reply.send(self.game.set_stats(target, &patch));
            }
            RoomCommand::Participants { reply } => {
                let _ = reply.send(self.game.participants_report());
            }
            RoomCommand::Disconnect { player_id, reply } => {
                let out = self.game.handle_disconnect(player_id);
                self.senders.remove(&player_id);
                self.dispatch(out);
                let _ = reply.send(self.game.is_empty());
            }
            RoomCommand::GetInfo { reply } => {
                let _ = reply.send(self.info());
            }
            RoomCommand::Shutdown => {}
        }
    }

    fn report_finished(&mut self) {
        let (Some(notices), Some(standings)) = (self.notices.take(), self.game.standings()) else {
            return;
        };
        let _ = notices.send(RoomNotice::Finished {
            room_id: self.room_id,
            players: self.game.human_ids().collect(),
            standings: standings.clone(),
        });
    }

    /// Delivers events to every connected player the recipient covers.
    fn dispatch(&self, out: Outbox) {
        for (recipient, event) in out {
            for (pid, sender) in &self.senders {
                if recipient.includes(*pid) {
                    // Receiver gone means the player disconnected.
                    let _ = sender.send(event.clone());
                }
            }
        }
    }

    fn info(&self) -> RoomInfo {
        let participants = self.game.participants();
        RoomInfo {
            room_id: self.room_id,
            phase: self.game.phase(),
            seed: self.game.seed(),
            participants: participants.len(),
            alive: participants.iter().filter(|p| p.is_alive()).count(),
            connected: self.senders.len(),
            game_time: self.game.game_time(),
        }
    }
}

fn countdown_interval() -> Interval {
    let mut interval = time::interval_at(Instant::now() + COUNTDOWN_BEAT, COUNTDOWN_BEAT);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

async fn next_beat(countdown: &mut Option<Interval>) {
    match countdown {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

async fn next_tick(ticker: &mut Option<TickScheduler>) -> TickInfo {
    match ticker {
        Some(scheduler) => scheduler.wait_for_tick().await,
        None => std::future::pending().await,
    }
}

/// Spawns a room actor for `game` and returns a handle to it.
///
/// The countdown starts one second after spawning. `notices` receives a
/// [`RoomNotice::Finished`] when the race ends.
pub fn spawn_room(
    game: GameRoom,
    senders: HashMap<PlayerId, PlayerSender>,
    tick_rate: u32,
    channel_size: usize,
    notices: Option<mpsc::UnboundedSender<RoomNotice>>,
) -> RoomHandle {
    let room_id = game.room_id();
    let (tx, rx) = mpsc::channel(channel_size.max(1));

    let actor = RoomActor {
        room_id,
        game,
        tick_rate,
        senders,
        receiver: rx,
        notices,
    };

    tokio::spawn(actor.run());

    RoomHandle {
        room_id,
        sender: tx,
    }
}
