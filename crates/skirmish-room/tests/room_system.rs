//! Integration tests for room lifecycle through the registry.

use skirmish_protocol::{RoomId, RoomPhase, ServerEvent, SubmittedAction};
use skirmish_room::{
    Departure, EventSender, Player, RejectReason, RoomConfig, RoomError, RoomRegistry,
    Submission,
};
use skirmish_transport::ConnectionId;
use tokio::sync::mpsc;

// =========================================================================
// Helpers
// =========================================================================

fn player(name: &str, conn: u64) -> Player {
    Player::new(name, ConnectionId::new(conn))
}

/// Creates a dummy event sender (receiver is dropped immediately).
fn dummy_sender() -> EventSender {
    mpsc::unbounded_channel().0
}

fn arena() -> RoomId {
    RoomId::new("arena")
}

/// Registry with `names` seated in "arena", in order.
async fn seated(names: &[&str]) -> RoomRegistry {
    let registry = RoomRegistry::default();
    registry
        .create(arena(), player(names[0], 0), dummy_sender())
        .unwrap();
    for (i, name) in names.iter().enumerate().skip(1) {
        registry
            .try_join(&arena(), player(name, i as u64), dummy_sender())
            .await
            .unwrap();
    }
    registry
}

fn drain(rx: &mut mpsc::UnboundedReceiver<ServerEvent>) -> Vec<ServerEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

// =========================================================================
// create / list
// =========================================================================

#[tokio::test]
async fn test_create_room_starts_in_lobby_with_founder() {
    let registry = RoomRegistry::default();
    let id = registry
        .create(arena(), player("Alice", 1), dummy_sender())
        .unwrap();

    let view = registry.get(&id).await.unwrap();
    assert_eq!(view.phase, RoomPhase::Lobby);
    assert_eq!(view.players.len(), 1);
    assert_eq!(view.players[0].name, "Alice");
    assert_eq!(view.players[0].hp, 10);
}

#[tokio::test]
async fn test_create_existing_code_fails_and_keeps_original() {
    let registry = seated(&["Alice"]).await;

    let result = registry.create(arena(), player("Bob", 2), dummy_sender());

    assert!(matches!(result, Err(RoomError::AlreadyExists(_))));
    let view = registry.get(&arena()).await.unwrap();
    assert_eq!(view.players[0].name, "Alice");
}

#[tokio::test]
async fn test_list_ids_in_creation_order() {
    let registry = RoomRegistry::default();
    for (i, code) in ["zeta", "alpha", "mid"].iter().enumerate() {
        registry
            .create(RoomId::new(*code), player("Host", i as u64), dummy_sender())
            .unwrap();
    }

    let ids: Vec<String> = registry.list_ids().into_iter().map(|id| id.0).collect();
    assert_eq!(ids, ["zeta", "alpha", "mid"]);
    assert_eq!(registry.room_count(), 3);
}

#[tokio::test]
async fn test_concurrent_creates_of_one_code_admit_exactly_one() {
    let registry = std::sync::Arc::new(RoomRegistry::default());
    let mut tasks = Vec::new();
    for i in 0..16u64 {
        let registry = registry.clone();
        tasks.push(tokio::spawn(async move {
            registry
                .create(arena(), player(&format!("P{i}"), i), dummy_sender())
                .is_ok()
        }));
    }

    let mut wins = 0;
    for task in tasks {
        if task.await.unwrap() {
            wins += 1;
        }
    }
    assert_eq!(wins, 1);
    assert_eq!(registry.room_count(), 1);
}

// =========================================================================
// join
// =========================================================================

#[tokio::test]
async fn test_join_missing_room_fails() {
    let registry = RoomRegistry::default();
    let result = registry
        .try_join(&arena(), player("Alice", 1), dummy_sender())
        .await;
    assert!(matches!(result, Err(RoomError::NotFound(_))));
    assert!(!registry.join(&arena(), player("Alice", 1), dummy_sender()).await);
}

#[tokio::test]
async fn test_join_refuses_seventh_player() {
    let registry = seated(&["A", "B", "C", "D", "E", "F"]).await;

    let joined = registry.join(&arena(), player("G", 7), dummy_sender()).await;

    assert!(!joined);
    assert_eq!(registry.get(&arena()).await.unwrap().players.len(), 6);
}

#[tokio::test]
async fn test_join_refuses_duplicate_name() {
    let registry = seated(&["Alice", "Bob"]).await;

    let result = registry
        .try_join(&arena(), player("Alice", 9), dummy_sender())
        .await;

    assert!(matches!(result, Err(RoomError::DuplicateName(..))));
    assert_eq!(registry.get(&arena()).await.unwrap().players.len(), 2);
}

#[tokio::test]
async fn test_join_broadcasts_joined_then_room_info() {
    let registry = RoomRegistry::default();
    let (tx, mut rx) = mpsc::unbounded_channel();
    registry.create(arena(), player("Alice", 1), tx).unwrap();

    registry
        .try_join(&arena(), player("Bob", 2), dummy_sender())
        .await
        .unwrap();

    let events = drain(&mut rx);
    assert_eq!(events.len(), 2);
    assert!(matches!(&events[0], ServerEvent::PlayerJoinedRoom { room_id } if *room_id == arena()));
    match &events[1] {
        ServerEvent::RoomInfoUpdated { room } => {
            let names: Vec<_> = room.players.iter().map(|p| p.name.as_str()).collect();
            assert_eq!(names, ["Alice", "Bob"]);
        }
        other => panic!("expected RoomInfoUpdated, got {other:?}"),
    }
}

#[tokio::test]
async fn test_join_uses_configured_starting_hp() {
    let registry = RoomRegistry::new(RoomConfig {
        starting_hp: 25,
        ..RoomConfig::default()
    });
    registry
        .create(arena(), player("Alice", 1), dummy_sender())
        .unwrap();
    let view = registry
        .try_join(&arena(), player("Bob", 2), dummy_sender())
        .await
        .unwrap();

    assert!(view.players.iter().all(|p| p.hp == 25));
}

// =========================================================================
// start
// =========================================================================

#[tokio::test]
async fn test_start_with_one_player_is_refused_and_room_unchanged() {
    let registry = seated(&["Alice"]).await;

    assert!(!registry.is_startable(&arena()).await);
    let result = registry.start(&arena()).await;

    assert!(matches!(result, Err(RoomError::NotStartable { players: 1, .. })));
    assert_eq!(registry.get(&arena()).await.unwrap().phase, RoomPhase::Lobby);
}

#[tokio::test]
async fn test_start_moves_to_simultaneous_and_announces_round() {
    let registry = RoomRegistry::default();
    let (tx, mut rx) = mpsc::unbounded_channel();
    registry.create(arena(), player("Alice", 1), tx).unwrap();
    registry
        .try_join(&arena(), player("Bob", 2), dummy_sender())
        .await
        .unwrap();
    assert!(registry.is_startable(&arena()).await);
    drain(&mut rx);

    let view = registry.start(&arena()).await.unwrap();

    assert_eq!(view.phase, RoomPhase::Simultaneous);
    assert!(registry.is_startable(&arena()).await);
    let events = drain(&mut rx);
    assert!(matches!(&events[..], [ServerEvent::StartRound { room }] if room.phase == RoomPhase::Simultaneous));
}

#[tokio::test]
async fn test_second_start_announces_round_again_and_keeps_actions() {
    let registry = RoomRegistry::default();
    let (tx, mut rx) = mpsc::unbounded_channel();
    registry.create(arena(), player("Alice", 1), tx).unwrap();
    registry
        .try_join(&arena(), player("Bob", 2), dummy_sender())
        .await
        .unwrap();
    registry.start(&arena()).await.unwrap();
    let queued = registry
        .submit(SubmittedAction::defend("arena", "Alice"))
        .await;
    assert!(queued.is_accepted());
    drain(&mut rx);

    let view = registry.start(&arena()).await.unwrap();

    assert_eq!(view.phase, RoomPhase::Simultaneous);
    let events = drain(&mut rx);
    assert!(matches!(&events[..], [ServerEvent::StartRound { .. }]));
    let again = registry
        .submit(SubmittedAction::defend("arena", "Alice"))
        .await;
    assert_eq!(again, Submission::Rejected(RejectReason::AlreadyActed));
}

#[tokio::test]
async fn test_start_missing_room_is_not_found() {
    let registry = RoomRegistry::default();
    let result = registry.start(&arena()).await;
    assert!(matches!(result, Err(RoomError::NotFound(_))));
}

// =========================================================================
// submit
// =========================================================================

#[tokio::test]
async fn test_submit_to_missing_room_is_room_gone() {
    let registry = RoomRegistry::default();
    let result = registry
        .submit(SubmittedAction::defend("nowhere", "Alice"))
        .await;
    assert_eq!(result, Submission::Rejected(RejectReason::RoomGone));
}

#[tokio::test]
async fn test_duplicate_submission_rejected() {
    let registry = seated(&["Alice", "Bob", "Carol"]).await;

    let first = registry
        .submit(SubmittedAction::attack("arena", "Alice", "Bob"))
        .await;
    let second = registry
        .submit(SubmittedAction::defend("arena", "Alice"))
        .await;

    assert_eq!(first, Submission::Accepted { outcome: None });
    assert_eq!(second, Submission::Rejected(RejectReason::AlreadyActed));
}

#[tokio::test]
async fn test_submit_from_stranger_rejected() {
    let registry = seated(&["Alice", "Bob"]).await;
    let result = registry
        .submit(SubmittedAction::defend("arena", "Mallory"))
        .await;
    assert_eq!(result, Submission::Rejected(RejectReason::NotMember));
}

// =========================================================================
// disconnect / remove
// =========================================================================

#[tokio::test]
async fn test_disconnect_keeps_seat_and_hp() {
    let registry = seated(&["Alice", "Bob"]).await;

    let departure = registry.disconnect(&arena(), "Bob").await;

    assert_eq!(
        departure,
        Departure::Left {
            resolved: None,
            abandoned: false
        }
    );
    let view = registry.get(&arena()).await.unwrap();
    let bob = view.player("Bob").unwrap();
    assert!(!bob.connected);
    assert_eq!(bob.hp, 10);
    assert_eq!(view.players.len(), 2);
}

#[tokio::test]
async fn test_disconnect_twice_is_harmless() {
    let registry = seated(&["Alice", "Bob"]).await;

    registry.disconnect(&arena(), "Bob").await;
    let again = registry.disconnect(&arena(), "Bob").await;

    assert!(matches!(again, Departure::Left { resolved: None, abandoned: false }));
    let view = registry.get(&arena()).await.unwrap();
    assert!(view.player("Alice").unwrap().connected);
}

#[tokio::test]
async fn test_disconnect_unknown_player_or_room() {
    let registry = seated(&["Alice"]).await;
    assert_eq!(
        registry.disconnect(&arena(), "Mallory").await,
        Departure::NotMember
    );
    assert_eq!(
        registry.disconnect(&RoomId::new("gone"), "Alice").await,
        Departure::NotMember
    );
}

#[tokio::test]
async fn test_room_with_nobody_connected_is_torn_down() {
    let registry = seated(&["Alice", "Bob"]).await;

    registry.disconnect(&arena(), "Alice").await;
    let last = registry.disconnect(&arena(), "Bob").await;

    assert!(matches!(last, Departure::Left { abandoned: true, .. }));
    assert!(registry.get(&arena()).await.is_none());
    assert!(registry.list_ids().is_empty());
}

#[tokio::test]
async fn test_remove_then_submit_is_room_gone() {
    let registry = seated(&["Alice", "Bob"]).await;

    registry.remove(&arena()).await;

    let result = registry
        .submit(SubmittedAction::defend("arena", "Alice"))
        .await;
    assert_eq!(result, Submission::Rejected(RejectReason::RoomGone));
    assert_eq!(registry.room_count(), 0);
}
