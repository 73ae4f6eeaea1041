//! Integration tests for the propagation pipeline.
//!
//! Drives change sets through the session registry and broadcaster the way
//! the game loop does, and checks what each connected client actually
//! receives on the wire.

use std::time::Duration;

use meridian_protocol::{
    wire, EntityId, Message, ObjectId, ObjectSnapshot, PlayerId, SettlementSnapshot, TileId,
    UnitSnapshot,
};
use meridian_server::{channel_id, Broadcaster, PlayerView, ServerConfig, SessionManager};
use meridian_sync::{Change, ChangeSet, Visibility};

fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn unit(index: u32, owner: PlayerId, tile: TileId) -> UnitSnapshot {
    UnitSnapshot {
        id: EntityId::new(index, 0),
        type_name: "caravel".into(),
        owner,
        tile,
        hp: 8,
        moves_left: 2,
        base_moves: 4,
        orders: None,
        cargo: vec![],
        automated: false,
        disposed: false,
    }
}

fn settlement(index: u32, owner: PlayerId, tile: TileId) -> SettlementSnapshot {
    SettlementSnapshot {
        id: EntityId::new(index, 0),
        name: "Port Meridian".into(),
        owner,
        tile,
        population: 6,
        stockpile: vec![],
        producing: Some("warehouse".into()),
        disposed: false,
    }
}

/// A set with a public settlement update and a public attribute composes,
/// for every observer, into one envelope-derived result: the update as a
/// sub-fragment and the attribute merged onto the envelope.
#[test]
fn attribute_changes_merge_onto_the_envelope() {
    init_tracing();

    let site = TileId::new(3, 4);
    let town = settlement(1, PlayerId(0), site);

    let mut set = ChangeSet::new();
    set.add_update(
        Visibility::all(),
        ObjectSnapshot::Settlement(town.clone()),
    );
    set.add(Change::attribute(Visibility::all(), "sound", "bell"));

    for observer in [PlayerView::new(PlayerId(0)), PlayerView::new(PlayerId(1))] {
        let message = set.build(&observer).expect("public set composes");
        match message {
            Message::Multi {
                messages,
                attributes,
            } => {
                assert_eq!(messages.len(), 1);
                match &messages[0] {
                    Message::Update { objects } => {
                        assert_eq!(objects.len(), 1);
                        assert_eq!(objects[0].object_id(), ObjectId::Settlement(town.id));
                    }
                    other => panic!("expected Update sub-fragment, got {other:?}"),
                }
                // The attribute is envelope state, not a sub-fragment.
                assert_eq!(
                    attributes,
                    vec![("sound".to_string(), "bell".to_string())]
                );
            }
            other => panic!("expected Multi, got {other:?}"),
        }
    }
}

/// Full flow: two clients join, a unit moves out of one player's view, and
/// each client's queued payload decodes to a different composition.
#[test]
fn broadcast_delivers_per_recipient_payloads() {
    init_tracing();

    let mut sessions = SessionManager::new(ServerConfig::default());
    let (alice, _) = sessions.join(100, "Alice".into(), false).unwrap();
    let (bob, _) = sessions.join(101, "Bob".into(), false).unwrap();

    let origin = TileId::new(0, 0);
    let destination = TileId::new(6, 0);
    let scout = unit(1, alice, origin);

    // Alice tracks her own unit; Bob only watches the origin tile.
    let alice_view = PlayerView::with_tiles(alice, [origin, destination]);
    let bob_view = PlayerView::with_tiles(bob, [origin]);

    let mut set = ChangeSet::new();
    set.add(Change::movement(
        Visibility::perhaps(),
        &scout,
        origin,
        destination,
    ));

    let (broadcaster, mut rx) = Broadcaster::new();
    let recipients = [(100, &alice_view), (101, &bob_view)];
    let sent = broadcaster.broadcast(&set, recipients).unwrap();
    assert_eq!(sent, 2);

    let first = rx.try_recv().unwrap();
    assert_eq!(first.client_id, 100);
    assert_eq!(first.channel, channel_id::UPDATES);
    match wire::deserialize_message(&first.bytes).unwrap() {
        // Owner: just the animation, no removal.
        Message::Animate { from, to, unit, .. } => {
            assert_eq!(from, origin);
            assert_eq!(to, destination);
            assert_eq!(unit.moves_left, 2);
        }
        other => panic!("expected bare Animate for the owner, got {other:?}"),
    }

    let second = rx.try_recv().unwrap();
    assert_eq!(second.client_id, 101);
    match wire::deserialize_message(&second.bytes).unwrap() {
        // Bob: the animation plus the out-of-sight removal, removal last.
        Message::Multi { messages, .. } => {
            assert_eq!(messages.len(), 2);
            match &messages[0] {
                Message::Animate { unit, .. } => {
                    // Foreign unit arrives redacted.
                    assert_eq!(unit.moves_left, unit.base_moves);
                }
                other => panic!("expected Animate first, got {other:?}"),
            }
            match &messages[1] {
                Message::Remove { tile, objects } => {
                    assert_eq!(*tile, origin);
                    assert_eq!(objects, &vec![ObjectId::Unit(scout.id)]);
                }
                other => panic!("expected Remove last, got {other:?}"),
            }
        }
        other => panic!("expected Multi for the watcher, got {other:?}"),
    }

    assert!(rx.try_recv().is_err(), "no extra payloads queued");
}

/// Disconnect, grace expiry, AI takeover broadcast, reconnect.
#[test]
fn ai_takeover_is_announced_to_remaining_players() {
    init_tracing();

    let config = ServerConfig {
        disconnect_grace: Duration::from_millis(5),
        ..ServerConfig::default()
    };
    let mut sessions = SessionManager::new(config);
    let (alice, _) = sessions.join(100, "Alice".into(), false).unwrap();
    let (bob, bob_token) = sessions.join(101, "Bob".into(), false).unwrap();

    sessions.disconnect(101);
    std::thread::sleep(Duration::from_millis(10));
    let takeovers = sessions.process_disconnections();
    assert_eq!(takeovers, vec![bob]);

    // The takeover is broadcast to everyone still connected.
    let (broadcaster, mut rx) = Broadcaster::new();
    let alice_view = PlayerView::new(alice);
    for player in &takeovers {
        let set = ChangeSet::ai_control(*player, true);
        broadcaster.broadcast(&set, [(100, &alice_view)]).unwrap();
    }

    let payload = rx.try_recv().unwrap();
    match wire::deserialize_message(&payload.bytes).unwrap() {
        Message::Partial { object, fields } => {
            assert_eq!(object, ObjectId::Player(bob));
            assert_eq!(fields, vec![("ai".to_string(), "true".to_string())]);
        }
        other => panic!("expected Partial, got {other:?}"),
    }

    // Bob comes back and control returns to a human.
    assert_eq!(sessions.reconnect(102, &bob_token).unwrap(), bob);
    let set = ChangeSet::ai_control(bob, false);
    broadcaster.broadcast(&set, [(100, &alice_view)]).unwrap();
    let payload = rx.try_recv().unwrap();
    match wire::deserialize_message(&payload.bytes).unwrap() {
        Message::Partial { fields, .. } => {
            assert_eq!(fields, vec![("ai".to_string(), "false".to_string())]);
        }
        other => panic!("expected Partial, got {other:?}"),
    }
}

/// A rejected command turns into an error payload for its sender only.
#[test]
fn client_errors_are_private_and_ride_the_notify_channel() {
    init_tracing();

    let mut sessions = SessionManager::new(ServerConfig::default());
    let (alice, _) = sessions.join(100, "Alice".into(), false).unwrap();
    let (bob, _) = sessions.join(101, "Bob".into(), false).unwrap();

    let set = ChangeSet::client_error(bob, "server.command.invalid", "unit 7 not yours");

    let (broadcaster, mut rx) = Broadcaster::new();
    let alice_view = PlayerView::new(alice);
    let bob_view = PlayerView::new(bob);
    let sent = broadcaster
        .broadcast(&set, [(100, &alice_view), (101, &bob_view)])
        .unwrap();
    assert_eq!(sent, 1);

    let payload = rx.try_recv().unwrap();
    assert_eq!(payload.client_id, 101);
    assert_eq!(payload.channel, channel_id::NOTIFY);
    match wire::deserialize_message(&payload.bytes).unwrap() {
        Message::Error {
            template,
            diagnostic,
            ..
        } => {
            assert_eq!(template, "server.command.invalid");
            assert_eq!(diagnostic.as_deref(), Some("unit 7 not yours"));
        }
        other => panic!("expected Error, got {other:?}"),
    }
}
