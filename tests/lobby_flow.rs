//! Rooms, clocks, observers and statistics working together.

use std::{sync::Arc, time::Duration};

use chessroom::{
    config::EngineConfig,
    lobby::{Lobby, RoomStatus},
    model::{ChessColor, Position, attacking::GameStatus},
    notation::Parsable,
    observer::BroadcastObserver,
    session::{Rejection, Verdict, Winner, players::Player},
    stats::MemoryStats,
};

fn sq(s: &str) -> Position {
    Position::parse_str(s).unwrap()
}

fn fast_config() -> EngineConfig {
    EngineConfig::from_toml_str(
        r#"
        [clock]
        default_time_limit = 3
        allowed_time_limits = []
        tick_interval_ms = 1000
        "#,
    )
    .unwrap()
}

#[tokio::test(start_paused = true)]
async fn checkmate_reaches_the_leaderboard() {
    let stats = Arc::new(MemoryStats::new());
    let lobby = Lobby::new(EngineConfig::default(), stats.clone());
    let alice = Player::new("alice", "Alice").unwrap();
    let bruno = Player::new("bruno", "Bruno").unwrap();
    stats.register(&alice);
    stats.register(&bruno);

    let id = lobby.create_room("rematch", &alice, None).unwrap();
    assert!(lobby.join_room(id, &bruno).await.unwrap().is_committed());

    let plies = [
        (&alice, "f2", "f3"),
        (&bruno, "e7", "e5"),
        (&alice, "g2", "g4"),
        (&bruno, "d8", "h4"),
    ];
    for (who, from, to) in plies {
        let v = lobby.submit_move(id, &who.id, sq(from), sq(to)).await.unwrap();
        assert!(v.is_committed(), "{from}{to}");
    }

    let session = lobby.snapshot(id).await.unwrap();
    assert_eq!(session.game_status(), GameStatus::CHECKMATE);
    assert_eq!(session.winner(), Some(Winner::BLACK));

    // The clock is stopped and further play is refused.
    tokio::time::sleep(Duration::from_secs(30)).await;
    let later = lobby.snapshot(id).await.unwrap();
    assert_eq!(later, session);
    assert_eq!(
        lobby.submit_move(id, &alice.id, sq("a2"), sq("a3")).await.unwrap(),
        Verdict::Rejected(Rejection::GameOver)
    );

    let standings = stats.standings();
    assert_eq!(standings[0].0, bruno.id);
    assert_eq!(standings[0].1.wins, 1);
    assert_eq!(standings[0].1.username, "Bruno");
    assert_eq!(standings[1].1.losses, 1);
}

#[tokio::test(start_paused = true)]
async fn the_driver_times_out_an_idle_player() {
    let stats = Arc::new(MemoryStats::new());
    let lobby = Lobby::new(fast_config(), stats.clone());
    let alice = Player::new("alice", "Alice").unwrap();
    let bruno = Player::new("bruno", "Bruno").unwrap();

    let id = lobby.create_room("blitz", &alice, None).unwrap();
    lobby.join_room(id, &bruno).await.unwrap();
    lobby.submit_move(id, &alice.id, sq("e2"), sq("e4")).await.unwrap();

    tokio::time::sleep(Duration::from_secs(10)).await;
    let session = lobby.snapshot(id).await.unwrap();
    assert_eq!(session.game_status(), GameStatus::TIMEOUT);
    assert_eq!(session.winner(), Some(Winner::WHITE));
    assert_eq!(session.time_remaining(ChessColor::BLACK), 0);

    let alice_stats = stats.summary(&alice.id).unwrap();
    let bruno_stats = stats.summary(&bruno.id).unwrap();
    assert_eq!((alice_stats.wins, bruno_stats.losses), (1, 1));
    assert_eq!(alice_stats.total_games(), 1);
}

#[tokio::test(start_paused = true)]
async fn observers_see_every_commit() {
    let broadcast = BroadcastObserver::new(16);
    let mut rx = broadcast.subscribe();
    let lobby = Lobby::new(EngineConfig::default(), Arc::new(MemoryStats::new()))
        .with_observer(Arc::new(broadcast));
    let alice = Player::new("alice", "Alice").unwrap();
    let bruno = Player::new("bruno", "Bruno").unwrap();

    let id = lobby.create_room("watched", &alice, Some(900)).unwrap();
    lobby.join_room(id, &bruno).await.unwrap();
    lobby.submit_move(id, &bruno.id, sq("e7"), sq("e5")).await.unwrap();
    lobby.submit_move(id, &alice.id, sq("e2"), sq("e4")).await.unwrap();

    let revisions: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok())
        .map(|c| c.revision)
        .collect();
    assert_eq!(revisions, [1, 2, 3]);
}

#[tokio::test(start_paused = true)]
async fn listing_and_deleting_rooms() {
    let lobby = Lobby::new(EngineConfig::default(), Arc::new(MemoryStats::new()));
    let alice = Player::new("alice", "Alice").unwrap();
    let bruno = Player::new("bruno", "Bruno").unwrap();

    let first = lobby.create_room("first", &alice, None).unwrap();
    let second = lobby.create_room("second", &bruno, Some(180)).unwrap();
    lobby.join_room(second, &alice).await.unwrap();

    let rooms = lobby.list_rooms().await;
    assert_eq!(rooms.len(), 2);
    assert_eq!((rooms[0].id, rooms[0].status), (first, RoomStatus::WAITING));
    assert_eq!((rooms[1].id, rooms[1].status), (second, RoomStatus::PLAYING));
    assert_eq!(rooms[1].host_name, "Bruno");
    assert_eq!(rooms[1].time_limit, 180);
    assert_eq!(rooms[0].time_limit, 600);

    let json = serde_json::to_value(&rooms[0]).unwrap();
    assert_eq!(json["status"], "waiting");
    assert_eq!(json["players"]["white"]["username"], "Alice");

    lobby.delete_room(second).unwrap();
    let rooms = lobby.list_rooms().await;
    assert_eq!(rooms.len(), 1);
    assert_eq!(rooms[0].name, "first");

    assert_eq!(
        lobby.possible_moves(first, sq("b1")).await.unwrap(),
        [sq("a3"), sq("c3")]
    );
}
