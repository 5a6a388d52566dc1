//! Integration tests for table workers: joining, command flow and per-connection filtering.

use std::sync::Arc;
use std::time::Duration;

use settlers_core::{
    load_layout, EventLog, LayoutSource, ObservabilityMode, Rejection, ScriptedDice, Session,
    SessionOptions, SetupError,
};
use settlers_protocol::{Command, DevCardKind, Event, PlayerId, ResourceSet, SessionId};
use settlers_server::{
    protocol::{deserialize_server_message, serialize_client_message},
    ChannelTransport, ClientMessage, ConnectionId, JoinRejectReason, Job, RegistryError,
    ServerConfig, ServerMessage, SessionRegistry, TableQueue,
};
use tokio::sync::mpsc::UnboundedReceiver;

fn names(n: usize) -> Vec<String> {
    ["Ann", "Bob", "Cid", "Dee"]
        .iter()
        .take(n)
        .map(|s| s.to_string())
        .collect()
}

fn frame(msg: &ClientMessage) -> Vec<u8> {
    serialize_client_message(msg).unwrap()
}

fn command(command: Command) -> Vec<u8> {
    frame(&ClientMessage::Command { command })
}

async fn next(rx: &mut UnboundedReceiver<Vec<u8>>) -> ServerMessage {
    let payload = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("message within timeout")
        .expect("outbox open");
    deserialize_server_message(&payload).unwrap()
}

/// Skip events until one matches.
async fn next_event<F>(rx: &mut UnboundedReceiver<Vec<u8>>, mut wanted: F) -> Event
where
    F: FnMut(&Event) -> bool,
{
    loop {
        if let ServerMessage::Event { event } = next(rx).await {
            if wanted(&event) {
                return event;
            }
        }
    }
}

fn registry(transport: &ChannelTransport, config: ServerConfig) -> SessionRegistry {
    let layout = load_layout(LayoutSource::Embedded).unwrap();
    SessionRegistry::new(config, layout, Arc::new(transport.clone()))
}

fn quiet_config() -> ServerConfig {
    ServerConfig {
        tables: Vec::new(),
        ..ServerConfig::default()
    }
}

#[tokio::test]
async fn join_hands_out_seats_once() {
    let transport = ChannelTransport::new();
    let registry = registry(&transport, quiet_config());
    let id = SessionId::new("table");
    registry.create(id.clone(), &names(2), Some(3)).unwrap();
    assert!(matches!(
        registry.create(id.clone(), &names(2), None),
        Err(RegistryError::SessionExists(_))
    ));

    let mut first = transport.connect(ConnectionId(1)).unwrap();
    let mut second = transport.connect(ConnectionId(2)).unwrap();
    let mut third = transport.connect(ConnectionId(3)).unwrap();
    registry.join(&id, ConnectionId(1), Some(PlayerId(0))).unwrap();
    registry.join(&id, ConnectionId(2), Some(PlayerId(0))).unwrap();
    registry.join(&id, ConnectionId(3), Some(PlayerId(5))).unwrap();

    match next(&mut first).await {
        ServerMessage::Joined {
            session,
            seat,
            snapshot,
        } => {
            assert_eq!(session, id);
            assert_eq!(seat, Some(PlayerId(0)));
            assert_eq!(snapshot.players.len(), 2);
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(
        next(&mut second).await,
        ServerMessage::JoinRejected {
            reason: JoinRejectReason::SeatTaken
        }
    );
    assert_eq!(
        next(&mut third).await,
        ServerMessage::JoinRejected {
            reason: JoinRejectReason::NoSuchSeat
        }
    );

    assert!(matches!(
        registry.join(&SessionId::new("missing"), ConnectionId(4), None),
        Err(RegistryError::UnknownSession(_))
    ));
    registry.stop_all().await.unwrap();
}

#[tokio::test]
async fn tables_need_between_one_and_255_players() {
    let transport = ChannelTransport::new();
    let registry = registry(&transport, quiet_config());
    let crowd: Vec<String> = (0..256).map(|i| format!("p{i}")).collect();
    assert!(matches!(
        registry.create(SessionId::new("crowd"), &crowd, Some(1)),
        Err(RegistryError::Setup(SetupError::TooManyPlayers(256)))
    ));
    assert!(matches!(
        registry.create(SessionId::new("empty"), &[], Some(1)),
        Err(RegistryError::Setup(SetupError::NoPlayers))
    ));
    assert!(registry.sessions().is_empty());
    registry.stop_all().await.unwrap();
}

#[tokio::test]
async fn rejections_reach_only_the_sender() {
    let transport = ChannelTransport::new();
    let registry = registry(&transport, quiet_config());
    let id = SessionId::new("table");
    registry.create(id.clone(), &names(2), Some(11)).unwrap();

    let mut ann = transport.connect(ConnectionId(1)).unwrap();
    let mut bob = transport.connect(ConnectionId(2)).unwrap();
    let mut watcher = transport.connect(ConnectionId(3)).unwrap();
    registry.join(&id, ConnectionId(1), Some(PlayerId(0))).unwrap();
    registry.join(&id, ConnectionId(2), Some(PlayerId(1))).unwrap();
    registry.join(&id, ConnectionId(3), None).unwrap();
    for rx in [&mut ann, &mut bob, &mut watcher] {
        assert!(matches!(next(rx).await, ServerMessage::Joined { .. }));
    }

    // garbage is logged and dropped; the worker keeps going
    registry.submit(&id, vec![0xc1, 0x00], ConnectionId(2)).unwrap();
    registry
        .submit(&id, command(Command::RollDice), ConnectionId(2))
        .unwrap();
    assert_eq!(
        next(&mut bob).await,
        ServerMessage::Rejected {
            reason: Rejection::NotCurrentPlayer
        }
    );
    registry
        .submit(&id, command(Command::EndTurn), ConnectionId(3))
        .unwrap();
    assert_eq!(
        next(&mut watcher).await,
        ServerMessage::Rejected {
            reason: Rejection::NotCurrentPlayer
        }
    );

    registry
        .submit(&id, command(Command::RollDice), ConnectionId(1))
        .unwrap();
    for rx in [&mut ann, &mut bob, &mut watcher] {
        match next(rx).await {
            ServerMessage::Event {
                event: Event::DiceRolled { player, .. },
            } => assert_eq!(player, PlayerId(0)),
            other => panic!("unexpected {other:?}"),
        }
    }
    registry.stop_all().await.unwrap();
}

#[tokio::test]
async fn bought_cards_are_filtered_per_connection() {
    let transport = ChannelTransport::new();
    let layout = Arc::new(load_layout(LayoutSource::Embedded).unwrap());
    let mut session = Session::new(
        SessionId::new("cards"),
        layout,
        &names(2),
        SessionOptions::default(),
    )
    .unwrap()
    .with_dice(ScriptedDice::new([[4, 4]]));
    session.set_resources(PlayerId(0), ResourceSet::new(0, 1, 1, 1, 0));
    session.stack_deck(vec![DevCardKind::Monopoly]);
    let queue = TableQueue::spawn(
        session,
        Arc::new(transport.clone()),
        ObservabilityMode::Hidden,
        None,
    );

    let mut ann = transport.connect(ConnectionId(1)).unwrap();
    let mut bob = transport.connect(ConnectionId(2)).unwrap();
    let mut watcher = transport.connect(ConnectionId(3)).unwrap();
    for (c, seat) in [(1, Some(PlayerId(0))), (2, Some(PlayerId(1))), (3, None)] {
        queue
            .push(Job::Join {
                connection: ConnectionId(c),
                seat,
            })
            .unwrap();
    }
    for (c, raw) in [
        (1, command(Command::RollDice)),
        (1, command(Command::BuyDevCard)),
        (3, frame(&ClientMessage::RequestState)),
    ] {
        queue
            .push(Job::Submit {
                connection: ConnectionId(c),
                raw,
            })
            .unwrap();
    }

    let card_for = |event: Event| match event {
        Event::DevCardAction { card, .. } => card,
        other => panic!("unexpected {other:?}"),
    };
    let is_card = |e: &Event| matches!(e, Event::DevCardAction { .. });
    assert_eq!(
        card_for(next_event(&mut ann, is_card).await),
        DevCardKind::Monopoly
    );
    assert_eq!(
        card_for(next_event(&mut bob, is_card).await),
        DevCardKind::Unknown
    );
    assert_eq!(
        card_for(next_event(&mut watcher, is_card).await),
        DevCardKind::Unknown
    );

    // the watcher's state answer hides Ann's hand
    loop {
        match next(&mut watcher).await {
            ServerMessage::State { snapshot } => {
                assert_eq!(snapshot.players[0].new_dev_cards, vec![DevCardKind::Unknown]);
                assert_eq!(snapshot.players[0].resources, ResourceSet::unknown(0));
                break;
            }
            ServerMessage::Event { .. } => continue,
            other => panic!("unexpected {other:?}"),
        }
    }
    queue.stop().await;
}

#[tokio::test]
async fn stopping_saves_the_event_log() {
    let dir = std::env::temp_dir().join(format!("settlers-server-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let transport = ChannelTransport::new();
    let config = ServerConfig {
        event_log_dir: Some(dir.clone()),
        ..quiet_config()
    };
    let registry = registry(&transport, config);
    let id = SessionId::new("logged");
    registry.create(id.clone(), &names(2), Some(5)).unwrap();

    let mut ann = transport.connect(ConnectionId(1)).unwrap();
    registry.join(&id, ConnectionId(1), Some(PlayerId(0))).unwrap();
    registry
        .submit(&id, command(Command::RollDice), ConnectionId(1))
        .unwrap();
    next_event(&mut ann, |e| matches!(e, Event::DiceRolled { .. })).await;

    registry.stop_all().await.unwrap();
    assert!(registry.sessions().is_empty());
    assert!(matches!(
        registry.submit(&id, command(Command::EndTurn), ConnectionId(1)),
        Err(RegistryError::UnknownSession(_))
    ));

    let log = EventLog::load(dir.join("logged.log")).unwrap();
    assert!(log
        .entries()
        .iter()
        .any(|e| matches!(e.event, Event::DiceRolled { .. })));
    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn tables_come_from_config() {
    let config = ServerConfig::from_yaml(
        "tables:\n  - { id: north, players: [Ann, Bob] }\n  - { id: south, players: [Cid, Dee, Eve], seed: 9 }\n",
    )
    .unwrap();
    tokio_test::block_on(async {
        let transport = ChannelTransport::new();
        let registry = registry(&transport, config.clone());
        for table in &config.tables {
            registry
                .create(table.id.clone(), &table.players, table.seed)
                .unwrap();
        }
        assert_eq!(
            registry.sessions(),
            vec![SessionId::new("north"), SessionId::new("south")]
        );
        registry.stop_all().await.unwrap();
    });
}
