//! Per-event routing: queue events go to the matchmaker, race events to
//! the player's room actor.

use dashrun_protocol::{ParticipantId, PlayerId};
use dashrun_room::{
    ClientEvent, Contestant, Matchmaker, MatchmakingError, ParticipantStatsPatch, PlayerSender,
    RoomError, ServerEvent,
};

use crate::DashrunError;
use crate::engine::Session;

const NOT_IN_ROOM: &str = "Not in a room";
const TARGET_NOT_FOUND: &str = "Target not found";

pub(crate) async fn dispatch(
    matchmaker: &Matchmaker,
    player_id: PlayerId,
    session: &Session,
    event: ClientEvent,
) {
    let sender = &session.sender;
    match event {
        ClientEvent::JoinQueue(game_type) => {
            let contestant = Contestant {
                player_id,
                spirit_id: session.credentials.spirit_id.clone(),
                spirit: session.credentials.spirit,
                sender: sender.clone(),
            };
            if let Err(e) = matchmaker.add_to_queue(contestant, game_type).await {
                tracing::debug!(%player_id, error = %e, "join-queue rejected");
                reply_error(sender, e);
            }
        }

        ClientEvent::LeaveQueue => {
            matchmaker.remove_from_queue(player_id).await;
            send(sender, ServerEvent::QueueLeft);
        }

        ClientEvent::PlayerInput(input) => {
            let result = match matchmaker.room_for(player_id).await {
                Ok(room) => room.input(player_id, input).await,
                Err(e) => Err(e),
            };
            if let Err(e) = result {
                tracing::debug!(%player_id, error = %e, "input dropped");
            }
        }

        ClientEvent::PlayerReady => {
            let result = match matchmaker.room_for(player_id).await {
                Ok(room) => room.ready(player_id).await,
                Err(e) => Err(e),
            };
            if let Err(e) = result {
                tracing::debug!(%player_id, error = %e, "ready dropped");
            }
        }

        ClientEvent::SetStats(patch) => {
            let req = ParticipantStatsPatch {
                target_id: None,
                patch,
            };
            set_stats(matchmaker, player_id, sender, req).await;
        }

        ClientEvent::SetParticipantStats(req) => {
            set_stats(matchmaker, player_id, sender, req).await;
        }

        ClientEvent::GetParticipants => {
            let report = match matchmaker.room_for(player_id).await {
                Ok(room) => room.participants().await,
                Err(e) => Err(e),
            };
            let reply = match report {
                Ok(report) => ServerEvent::Participants(report),
                Err(e) => ServerEvent::ParticipantsError {
                    message: room_error_message(&e),
                },
            };
            send(sender, reply);
        }

        ClientEvent::GetStatsInfo => {
            send(sender, ServerEvent::StatsInfo(matchmaker.config().physics.describe()));
        }
    }
}

async fn set_stats(
    matchmaker: &Matchmaker,
    player_id: PlayerId,
    sender: &PlayerSender,
    req: ParticipantStatsPatch,
) {
    let target_id = req.target_id.unwrap_or(ParticipantId::Player(player_id));
    let result = match matchmaker.room_for(player_id).await {
        Ok(room) => room.set_stats(target_id, req.patch).await,
        Err(e) => Err(e),
    };
    let reply = match result {
        Ok(stats) => ServerEvent::StatsUpdated { target_id, stats },
        Err(e) => ServerEvent::StatsError {
            message: room_error_message(&e),
        },
    };
    send(sender, reply);
}

/// Message text clients already match on for the common failures.
fn room_error_message(err: &RoomError) -> String {
    match err {
        RoomError::NotInRoom(_) => NOT_IN_ROOM.to_string(),
        RoomError::UnknownParticipant(..) => TARGET_NOT_FOUND.to_string(),
        other => other.to_string(),
    }
}

fn reply_error(sender: &PlayerSender, err: MatchmakingError) {
    let err = DashrunError::from(err);
    send_error(sender, err.status_code(), &err.to_string());
}

/// Sends an `error` event. A closed channel means the player is gone.
pub(crate) fn send_error(sender: &PlayerSender, code: u16, message: &str) {
    send(sender, ServerEvent::error(code, message));
}

fn send(sender: &PlayerSender, event: ServerEvent) {
    let _ = sender.send(event);
}
