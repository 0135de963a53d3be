//! Integration tests for the matchmaker and the room actors it spawns.
//!
//! Every test runs on paused Tokio time, so bot-fill delays, the countdown
//! and the tick loop complete instantly and deterministically.

use std::sync::Arc;
use std::time::Duration;

use dashrun_protocol::PlayerId;
use dashrun_room::{
    Contestant, GameType, MatchPhase, Matchmaker, MatchmakingError, PlayerInput, QueueStatus,
    RoomConfig, RoomError, RoomNotice, ServerEvent,
};
use tokio::sync::mpsc;

// =========================================================================
// Helpers
// =========================================================================

fn flow_run() -> GameType {
    GameType::new("flow-run")
}

fn contestant(id: u64) -> (Contestant, mpsc::UnboundedReceiver<ServerEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let contestant = Contestant {
        player_id: PlayerId(id),
        spirit_id: format!("spirit-{id}"),
        spirit: None,
        sender: tx,
    };
    (contestant, rx)
}

fn config(players_per_match: usize, bots: bool) -> Arc<RoomConfig> {
    let mut config = RoomConfig {
        players_per_match,
        ..RoomConfig::default()
    };
    config.bots.enabled = bots;
    config.testing.no_obstacles = true;
    Arc::new(config)
}

async fn next(rx: &mut mpsc::UnboundedReceiver<ServerEvent>) -> ServerEvent {
    rx.recv().await.expect("player channel closed")
}

/// Skips snapshots and returns the first other event.
async fn next_non_state(rx: &mut mpsc::UnboundedReceiver<ServerEvent>) -> ServerEvent {
    loop {
        match next(rx).await {
            ServerEvent::GameState { .. } => continue,
            other => return other,
        }
    }
}

// =========================================================================
// Queueing
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_full_queue_forms_match_in_join_order() {
    let mm = Matchmaker::new(config(2, false));
    let (a, mut rx_a) = contestant(1);
    let (b, mut rx_b) = contestant(2);

    let status = mm.add_to_queue(a, flow_run()).await.unwrap();
    assert_eq!(
        status,
        QueueStatus {
            position: 1,
            players_in_queue: 1,
            players_needed: 1
        }
    );
    assert_eq!(mm.queue_len(&flow_run()).await, 1);
    assert_eq!(mm.room_count().await, 0);

    mm.add_to_queue(b, flow_run()).await.unwrap();
    assert_eq!(mm.queue_len(&flow_run()).await, 0);
    assert_eq!(mm.room_count().await, 1);

    let room_a = mm.room_of(PlayerId(1)).await.expect("A has a room");
    assert_eq!(mm.room_of(PlayerId(2)).await, Some(room_a));

    assert!(matches!(next(&mut rx_a).await, ServerEvent::QueueStatus { position: 1, .. }));
    match next(&mut rx_a).await {
        ServerEvent::MatchFound {
            room_id,
            my_player_id,
            players,
            bots_count,
            ..
        } => {
            assert_eq!(room_id, room_a);
            assert_eq!(my_player_id, PlayerId(1));
            assert_eq!(bots_count, 0);
            let ids: Vec<_> = players.iter().map(|p| p.id).collect();
            assert_eq!(ids, [PlayerId(1), PlayerId(2)]);
        }
        other => panic!("expected match-found, got {other:?}"),
    }

    assert!(matches!(
        next(&mut rx_b).await,
        ServerEvent::QueueStatus {
            players_in_queue: 2,
            players_needed: 0,
            ..
        }
    ));
    assert!(matches!(
        next(&mut rx_b).await,
        ServerEvent::MatchFound { my_player_id: PlayerId(2), .. }
    ));
}

#[tokio::test(start_paused = true)]
async fn test_duplicate_queue_and_match_are_rejected() {
    let mm = Matchmaker::new(config(2, false));
    let (a, _rx_a) = contestant(1);
    mm.add_to_queue(a.clone(), flow_run()).await.unwrap();

    let err = mm.add_to_queue(a.clone(), flow_run()).await.unwrap_err();
    assert!(matches!(err, MatchmakingError::AlreadyQueued(PlayerId(1))));

    let (b, _rx_b) = contestant(2);
    mm.add_to_queue(b, flow_run()).await.unwrap();

    let err = mm.add_to_queue(a, flow_run()).await.unwrap_err();
    assert!(matches!(err, MatchmakingError::AlreadyInMatch(PlayerId(1))));
}

#[tokio::test(start_paused = true)]
async fn test_room_lookup_requires_a_match() {
    let mm = Matchmaker::new(config(2, false));
    let (a, _rx_a) = contestant(1);
    mm.add_to_queue(a, flow_run()).await.unwrap();

    let err = mm.room_for(PlayerId(1)).await.unwrap_err();
    assert!(matches!(err, RoomError::NotInRoom(PlayerId(1))));

    let (b, _rx_b) = contestant(2);
    mm.add_to_queue(b, flow_run()).await.unwrap();
    assert!(mm.room_for(PlayerId(1)).await.is_ok());
}

#[tokio::test(start_paused = true)]
async fn test_unknown_game_type_is_rejected() {
    let mm = Matchmaker::new(config(2, false));
    let (a, _rx) = contestant(1);
    let err = mm.add_to_queue(a, GameType::new("chess")).await.unwrap_err();
    assert!(matches!(err, MatchmakingError::UnknownGameType(ref g) if g == "chess"));
    assert!(!mm.is_queued(PlayerId(1)).await);
}

#[tokio::test(start_paused = true)]
async fn test_remove_from_queue() {
    let mm = Matchmaker::new(config(3, true));
    let (a, _rx) = contestant(1);
    mm.add_to_queue(a, flow_run()).await.unwrap();
    assert!(mm.fill_pending(&flow_run()).await);

    assert!(mm.remove_from_queue(PlayerId(1)).await);
    assert!(!mm.remove_from_queue(PlayerId(1)).await);
    assert!(!mm.fill_pending(&flow_run()).await);
}

// =========================================================================
// Bot fill
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_bot_fill_after_timeout() {
    let mm = Matchmaker::new(config(3, true));
    let (a, mut rx) = contestant(1);
    mm.add_to_queue(a, flow_run()).await.unwrap();

    tokio::time::sleep(Duration::from_millis(4_900)).await;
    assert_eq!(mm.room_count().await, 0);

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(mm.room_count().await, 1);
    assert!(!mm.fill_pending(&flow_run()).await);

    assert!(matches!(next(&mut rx).await, ServerEvent::QueueStatus { .. }));
    match next(&mut rx).await {
        ServerEvent::MatchFound {
            players, bots_count, ..
        } => {
            assert_eq!(players.len(), 1);
            assert_eq!(bots_count, 2);
        }
        other => panic!("expected match-found, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_bot_fill_disabled_keeps_waiting() {
    let mm = Matchmaker::new(config(3, false));
    let (a, _rx) = contestant(1);
    mm.add_to_queue(a, flow_run()).await.unwrap();
    assert!(!mm.fill_pending(&flow_run()).await);

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(mm.room_count().await, 0);
    assert!(mm.is_queued(PlayerId(1)).await);
}

#[tokio::test(start_paused = true)]
async fn test_canceled_timer_does_not_fire() {
    let mm = Matchmaker::new(config(3, true));
    let (a, _rx_a) = contestant(1);
    let (b, _rx_b) = contestant(2);

    // A's timer would fire at t=5s; A leaves at t=3s and B joins.
    mm.add_to_queue(a, flow_run()).await.unwrap();
    tokio::time::sleep(Duration::from_secs(3)).await;
    mm.remove_from_queue(PlayerId(1)).await;
    mm.add_to_queue(b, flow_run()).await.unwrap();

    tokio::time::sleep(Duration::from_millis(2_500)).await;
    assert_eq!(mm.room_count().await, 0, "first timer must not fire");
    assert!(mm.is_queued(PlayerId(2)).await);

    // B's own timer fires at t=8s.
    tokio::time::sleep(Duration::from_secs(3)).await;
    assert_eq!(mm.room_count().await, 1);
    assert!(mm.room_of(PlayerId(2)).await.is_some());
    assert_eq!(mm.room_of(PlayerId(1)).await, None);
}

#[tokio::test(start_paused = true)]
async fn test_full_queue_cancels_pending_fill() {
    let mm = Matchmaker::new(config(2, true));
    let (a, _rx_a) = contestant(1);
    let (b, _rx_b) = contestant(2);
    mm.add_to_queue(a, flow_run()).await.unwrap();
    assert!(mm.fill_pending(&flow_run()).await);
    mm.add_to_queue(b, flow_run()).await.unwrap();
    assert!(!mm.fill_pending(&flow_run()).await);

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(mm.room_count().await, 1);
}

// =========================================================================
// Room lifecycle
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_countdown_then_game_start() {
    let mm = Matchmaker::new(config(1, false));
    let (a, mut rx) = contestant(1);
    mm.add_to_queue(a, flow_run()).await.unwrap();

    assert!(matches!(next(&mut rx).await, ServerEvent::QueueStatus { .. }));
    assert!(matches!(next(&mut rx).await, ServerEvent::MatchFound { .. }));
    for expected in [3, 2, 1, 0] {
        match next(&mut rx).await {
            ServerEvent::GameCountdown { count } => assert_eq!(count, expected),
            other => panic!("expected countdown {expected}, got {other:?}"),
        }
    }
    match next(&mut rx).await {
        ServerEvent::GameStart {
            players,
            finish_distance,
            no_obstacles,
            ..
        } => {
            assert_eq!(players.len(), 1);
            assert_eq!(finish_distance, 3000.0);
            assert!(no_obstacles);
        }
        other => panic!("expected game-start, got {other:?}"),
    }
    assert!(matches!(next(&mut rx).await, ServerEvent::GameState { .. }));

    let handle = mm.room_for(PlayerId(1)).await.expect("room handle");
    let info = handle.info().await.unwrap();
    assert_eq!(info.phase, MatchPhase::Playing);
    assert_eq!(info.connected, 1);
}

#[tokio::test(start_paused = true)]
async fn test_finished_room_releases_roster() {
    let (results_tx, mut results_rx) = mpsc::unbounded_channel();
    let mm = Matchmaker::with_results(config(1, false), results_tx);
    let (a, mut rx) = contestant(1);
    mm.add_to_queue(a.clone(), flow_run()).await.unwrap();

    let (results, rewards) = loop {
        if let ServerEvent::GameEnd { results, rewards } = next_non_state(&mut rx).await {
            break (results, rewards);
        }
    };
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].distance, 3000);
    assert_eq!(rewards.len(), 1);
    assert!(rewards[0].currency >= 250);

    let RoomNotice::Finished {
        players, standings, ..
    } = results_rx.recv().await.expect("finish notice");
    assert_eq!(players, [PlayerId(1)]);
    assert_eq!(standings.results, results);

    assert_eq!(mm.room_count().await, 0);
    assert_eq!(mm.room_of(PlayerId(1)).await, None);
    mm.add_to_queue(a, flow_run()).await.expect("may queue again");
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_destroys_empty_room() {
    let mm = Matchmaker::new(config(1, false));
    let (a, _rx) = contestant(1);
    mm.add_to_queue(a, flow_run()).await.unwrap();
    let handle = mm.room_for(PlayerId(1)).await.expect("room handle");

    mm.handle_disconnect(PlayerId(1)).await;
    assert_eq!(mm.room_count().await, 0);
    assert_eq!(mm.room_of(PlayerId(1)).await, None);

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(handle.is_closed());
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_notifies_remaining_players() {
    let mm = Matchmaker::new(config(2, false));
    let (a, _rx_a) = contestant(1);
    let (b, mut rx_b) = contestant(2);
    mm.add_to_queue(a, flow_run()).await.unwrap();
    mm.add_to_queue(b, flow_run()).await.unwrap();

    mm.handle_disconnect(PlayerId(1)).await;
    assert_eq!(mm.room_count().await, 1);

    assert!(matches!(next(&mut rx_b).await, ServerEvent::QueueStatus { .. }));
    assert!(matches!(next(&mut rx_b).await, ServerEvent::MatchFound { .. }));
    assert_eq!(
        next(&mut rx_b).await,
        ServerEvent::PlayerDisconnected {
            player_id: PlayerId(1)
        }
    );
}

#[tokio::test(start_paused = true)]
async fn test_input_during_countdown_is_ignored() {
    let mm = Matchmaker::new(config(1, false));
    let (a, _rx) = contestant(1);
    mm.add_to_queue(a, flow_run()).await.unwrap();
    let handle = mm.room_for(PlayerId(1)).await.expect("room handle");

    handle.input(PlayerId(1), PlayerInput::jump()).await.unwrap();
    let report = handle.participants().await.unwrap();
    assert_eq!(report.players.len(), 1);
    let info = handle.info().await.unwrap();
    assert_eq!(info.phase, MatchPhase::Countdown);
    assert_eq!(info.game_time, 0.0);
}
