//! Integration tests for the race aggregate, driven tick by tick.

use std::sync::Arc;

use dashrun_protocol::{BotId, ParticipantId, PlayerId, Recipient, RoomId};
use dashrun_room::{
    Entrant, GameRoom, MatchPhase, Outbox, PlayerInput, RoomConfig, RoomError, ServerEvent,
};
use dashrun_rules::StatsPatch;
use rand::SeedableRng;
use rand::rngs::StdRng;

const DT: f64 = 1.0 / 30.0;

fn room_with(config: RoomConfig, humans: u64, bots: usize) -> GameRoom {
    let entrants = (1..=humans)
        .map(|i| Entrant::new(PlayerId(i), format!("spirit-{i}")))
        .collect();
    GameRoom::new(
        RoomId(100),
        entrants,
        bots,
        Arc::new(config),
        12345,
        StdRng::seed_from_u64(7),
    )
}

fn open_course() -> RoomConfig {
    let mut config = RoomConfig::default();
    config.testing.no_obstacles = true;
    config
}

/// Runs ticks until the race finishes, collecting every event.
fn run_to_end(room: &mut GameRoom) -> Outbox {
    let mut all = Vec::new();
    for _ in 0..10_000 {
        all.extend(room.tick(DT));
        if room.phase().is_finished() {
            break;
        }
    }
    all
}

fn started(mut room: GameRoom) -> GameRoom {
    room.start_game();
    room
}

// =========================================================================
// Race flow
// =========================================================================

#[test]
fn test_open_course_race_ends_once_with_ranked_results() {
    let mut room = started(room_with(open_course(), 1, 2));
    assert!(room.obstacles().is_empty());

    let events = run_to_end(&mut room);
    assert_eq!(room.phase(), MatchPhase::Finished);

    let ends: Vec<_> = events
        .iter()
        .filter_map(|(_, e)| match e {
            ServerEvent::GameEnd { results, rewards } => Some((results, rewards)),
            _ => None,
        })
        .collect();
    assert_eq!(ends.len(), 1);
    let (results, rewards) = ends[0];

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].distance, 3000);
    assert!(results.windows(2).all(|w| w[0].distance >= w[1].distance));
    let places: Vec<u32> = results.iter().map(|p| p.place).collect();
    assert_eq!(places, [1, 2, 3]);

    // Bots take places but never get rewards.
    assert_eq!(rewards.len(), 1);
    assert_eq!(rewards[0].player_id, PlayerId(1));

    // Nobody was eliminated on an empty course.
    assert!(!events.iter().any(|(_, e)| matches!(e, ServerEvent::PlayerEliminated { .. })));

    // Ticking a finished room does nothing.
    assert!(room.tick(DT).is_empty());
}

#[test]
fn test_every_tick_broadcasts_one_snapshot() {
    let mut room = started(room_with(open_course(), 2, 0));
    for _ in 0..5 {
        let out = room.tick(DT);
        assert_eq!(out.len(), 1);
        let (recipient, ServerEvent::GameState { players, .. }) = &out[0] else {
            panic!("expected game-state");
        };
        assert_eq!(*recipient, Recipient::All);
        assert_eq!(players.len(), 2);
    }
    assert!((room.game_time() - 5.0 * DT).abs() < 1e-9);
}

#[test]
fn test_snapshot_distances_never_pass_finish() {
    let mut room = started(room_with(open_course(), 2, 1));
    let events = run_to_end(&mut room);

    let last_state = events
        .iter()
        .rev()
        .find_map(|(_, e)| match e {
            ServerEvent::GameState { players, .. } => Some(players),
            _ => None,
        })
        .expect("at least one snapshot");
    assert!(last_state.iter().all(|p| p.distance <= 3000));
    assert!(last_state.iter().any(|p| p.distance == 3000));
}

#[test]
fn test_grounded_runner_is_eliminated_exactly_once() {
    let mut room = started(room_with(RoomConfig::default(), 1, 0));
    let events = run_to_end(&mut room);

    let eliminations: Vec<_> = events
        .iter()
        .filter_map(|(_, e)| match e {
            ServerEvent::PlayerEliminated {
                player_id,
                distance,
                is_bot,
            } => Some((*player_id, *distance, *is_bot)),
            _ => None,
        })
        .collect();
    assert_eq!(eliminations.len(), 1);
    let (who, distance, is_bot) = eliminations[0];
    assert_eq!(who, ParticipantId::Player(PlayerId(1)));
    assert!(!is_bot);
    assert!((400..500).contains(&distance), "crashed at {distance}");

    // Nobody left alive ends the race.
    assert_eq!(room.phase(), MatchPhase::Finished);
    let standings = room.standings().expect("standings after end");
    assert_eq!(standings.results[0].distance, distance);
}

#[test]
fn test_jump_lifts_the_runner_until_landing() {
    let mut room = started(room_with(open_course(), 1, 0));
    assert!(room.handle_input(PlayerId(1), &PlayerInput::jump()));
    room.tick(DT);

    let p = room.participant(PlayerId(1).into()).expect("participant");
    assert!(p.body.airborne);
    assert!(p.body.y < 310.0);

    // A jump lasts well under a second.
    for _ in 0..30 {
        room.tick(DT);
    }
    let p = room.participant(PlayerId(1).into()).expect("participant");
    assert!(!p.body.airborne);
    assert_eq!(p.body.y, 310.0);
}

#[test]
fn test_jump_while_airborne_changes_nothing() {
    let mut room = started(room_with(open_course(), 1, 0));
    assert!(room.handle_input(PlayerId(1), &PlayerInput::jump()));
    room.tick(DT);

    let before = room.participant(PlayerId(1).into()).expect("participant").body.clone();
    assert!(before.airborne);
    assert!(!room.handle_input(PlayerId(1), &PlayerInput::jump()));
    let after = &room.participant(PlayerId(1).into()).expect("participant").body;
    assert_eq!(after.velocity_y, before.velocity_y);
    assert_eq!(*after, before);
}

#[test]
fn test_fast_runner_beats_high_jumper_to_the_finish() {
    let mut room = room_with(open_course(), 2, 0);
    let fast = ParticipantId::Player(PlayerId(1));
    let jumper = ParticipantId::Player(PlayerId(2));
    room.set_stats(
        fast,
        &StatsPatch {
            speed: Some(20.0),
            jump: Some(0.0),
        },
    )
    .unwrap();
    room.set_stats(
        jumper,
        &StatsPatch {
            speed: Some(5.0),
            jump: Some(20.0),
        },
    )
    .unwrap();
    room.start_game();

    run_to_end(&mut room);
    let standings = room.standings().expect("standings after end");
    assert_eq!(standings.results[0].participant, fast);
    assert_eq!(standings.results[0].place, 1);
    assert_eq!(standings.results[0].distance, 3000);
    assert_eq!(standings.results[1].participant, jumper);
    assert!(standings.results[1].distance < 3000);
}

#[test]
fn test_distance_only_grows_and_freezes_on_elimination() {
    // Both runners never jump; the faster one crashes first.
    let mut room = room_with(RoomConfig::default(), 2, 0);
    let fast = ParticipantId::Player(PlayerId(1));
    let slow = ParticipantId::Player(PlayerId(2));
    room.set_stats(
        fast,
        &StatsPatch {
            speed: Some(20.0),
            jump: None,
        },
    )
    .unwrap();
    room.set_stats(
        slow,
        &StatsPatch {
            speed: Some(0.0),
            jump: None,
        },
    )
    .unwrap();
    room.start_game();

    let distance = |room: &GameRoom, id| room.participant(id).expect("participant").body.distance;
    let mut last = (0.0, 0.0);
    let mut frozen_at = None;
    let mut ticks_after_crash = 0;

    while !room.phase().is_finished() {
        room.tick(DT);
        let now = (distance(&room, fast), distance(&room, slow));
        assert!(now.0 >= last.0 && now.1 >= last.1, "distance went back: {last:?} -> {now:?}");

        let fast_alive = room.participant(fast).is_some_and(|p| p.is_alive());
        match frozen_at {
            Some(at) => {
                assert_eq!(now.0, at, "eliminated runner kept moving");
                if now.1 > last.1 {
                    ticks_after_crash += 1;
                }
            }
            None if !fast_alive => frozen_at = Some(now.0),
            None => {}
        }
        last = now;
    }

    assert!(frozen_at.is_some());
    assert!(ticks_after_crash > 0, "race should go on after the first crash");
}

#[test]
fn test_long_tick_cannot_carry_runner_through_obstacle() {
    let mut room = started(room_with(RoomConfig::default(), 1, 0));
    let first = room.obstacles()[0].clone();
    assert_eq!(first.x, 500.0);

    // One tick moves the runner from 0 to 570, past the first obstacle.
    let out = room.tick(1.9);
    assert!(
        out.iter().any(|(_, e)| matches!(e, ServerEvent::PlayerEliminated { .. })),
        "runner skipped the obstacle at {}",
        first.x
    );
    assert_eq!(room.phase(), MatchPhase::Finished);
}

// =========================================================================
// Stats
// =========================================================================

#[test]
fn test_set_stats_rejects_out_of_range_without_change() {
    let mut room = room_with(RoomConfig::default(), 1, 0);
    let target = ParticipantId::Player(PlayerId(1));
    let before = room.participant(target).map(|p| p.stats);

    let err = room
        .set_stats(
            target,
            &StatsPatch {
                speed: Some(12.0),
                jump: Some(21.0),
            },
        )
        .unwrap_err();
    assert!(matches!(err, RoomError::InvalidStats(_)));
    assert!(err.to_string().contains("jump"));
    assert_eq!(room.participant(target).map(|p| p.stats), before);
}

#[test]
fn test_set_stats_overwrites_only_supplied_fields() {
    let mut room = room_with(RoomConfig::default(), 1, 1);
    let stats = room
        .set_stats(
            ParticipantId::Player(PlayerId(1)),
            &StatsPatch {
                speed: Some(20.0),
                jump: None,
            },
        )
        .unwrap();
    assert_eq!(stats.speed, 20.0);
    assert_eq!(stats.jump, 10.0);

    let bot = room.participants()[1].id();
    let stats = room
        .set_stats(
            bot,
            &StatsPatch {
                speed: None,
                jump: Some(0.0),
            },
        )
        .unwrap();
    assert_eq!(stats.jump, 0.0);
}

#[test]
fn test_set_stats_unknown_target() {
    let mut room = room_with(RoomConfig::default(), 1, 0);
    let ghost = ParticipantId::Bot(BotId(u64::MAX));
    let err = room.set_stats(ghost, &StatsPatch::default()).unwrap_err();
    assert!(matches!(err, RoomError::UnknownParticipant(id, RoomId(100)) if id == ghost));
}

#[test]
fn test_participants_report_splits_humans_and_bots() {
    let room = room_with(RoomConfig::default(), 2, 1);
    let report = room.participants_report();
    assert_eq!(report.players.len(), 2);
    assert_eq!(report.bots.len(), 1);
    assert!(report.bots[0].name.is_some());
    assert_eq!(report.players[0].calculated_speed, 300.0);
    assert_eq!(report.stats_info.max, 20.0);
}

// =========================================================================
// Disconnects
// =========================================================================

#[test]
fn test_disconnect_kills_and_notifies_others() {
    let mut room = started(room_with(open_course(), 2, 0));
    let out = room.handle_disconnect(PlayerId(1));
    assert_eq!(
        out,
        vec![(
            Recipient::AllExcept(PlayerId(1)),
            ServerEvent::PlayerDisconnected {
                player_id: PlayerId(1)
            }
        )]
    );
    assert!(!room.participant(PlayerId(1).into()).is_some_and(|p| p.is_alive()));
    assert!(!room.handle_input(PlayerId(1), &PlayerInput::jump()));
    assert!(!room.is_empty());

    room.handle_disconnect(PlayerId(2));
    assert!(room.is_empty());
}

#[test]
fn test_disconnect_of_stranger_is_ignored() {
    let mut room = room_with(RoomConfig::default(), 1, 0);
    assert!(room.handle_disconnect(PlayerId(42)).is_empty());
    assert!(!room.is_empty());
}
