//! # Rooms
//!
//! The lobby keeps every open game. Each room holds one [`Table`] behind
//! an async mutex, so operations on a game are applied one at a time and
//! the first to commit a terminal status wins.
//!
//! Once both seats are taken the lobby spawns a clock driver for the room.
//! It ticks every `tick_interval_ms` until the game ends or the room is
//! deleted.
//!
//! Every room also carries a chat log, which goes away with the room.

use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIs};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::{
    config::EngineConfig,
    error::{ChessError, Result},
    model::{Position, attacking::GameStatus},
    observer::SessionObserver,
    session::{
        Players, Session, Verdict,
        players::{Player, PlayerId},
        table::Table,
    },
    stats::StatsAggregator,
};

/// Handle of a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub u64);

impl RoomId {
    pub fn random() -> Self {
        Self(rand::random())
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIs, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RoomStatus {
    /// Only the host is seated.
    WAITING,
    PLAYING,
}

/// What the lobby shows about a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    pub id: RoomId,
    pub name: String,
    pub host: PlayerId,
    pub host_name: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    pub status: RoomStatus,
    pub time_limit: u32,
    pub players: Players,
    pub game_status: GameStatus,
}

/// One line of a room's chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub text: String,
    /// Display name of the author when the message was sent.
    pub sender: String,
    pub sender_uid: PlayerId,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

struct Room {
    id: RoomId,
    name: String,
    host: Player,
    created_at: DateTime<Utc>,
    time_limit: u32,
    table: tokio::sync::Mutex<Table>,
    chat: Mutex<Vec<ChatMessage>>,
    cancel: CancellationToken,
}

impl Room {
    async fn summary(&self) -> RoomSummary {
        let table = self.table.lock().await;
        let session = table.session();
        RoomSummary {
            id: self.id,
            name: self.name.clone(),
            host: self.host.id.clone(),
            host_name: self.host.username.clone(),
            created_at: self.created_at,
            status: if session.is_full() {
                RoomStatus::PLAYING
            } else {
                RoomStatus::WAITING
            },
            time_limit: self.time_limit,
            players: session.players().clone(),
            game_status: session.game_status(),
        }
    }

    fn chat(&self) -> MutexGuard<'_, Vec<ChatMessage>> {
        self.chat.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Tick the running clock once per `period` until the game is over
    /// or the room is cancelled.
    async fn run_clock(&self, period: Duration) {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        interval.tick().await;

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = interval.tick() => {
                    let mut table = self.table.lock().await;
                    table.tick();
                    if table.session().is_over() {
                        break;
                    }
                }
            }
        }
        debug!(room = %self.id, "clock stopped");
    }
}

/// All open rooms.
pub struct Lobby {
    config: EngineConfig,
    stats: Arc<dyn StatsAggregator>,
    observers: Vec<Arc<dyn SessionObserver>>,
    rooms: Mutex<IndexMap<RoomId, Arc<Room>>>,
}

impl Lobby {
    pub fn new(config: EngineConfig, stats: Arc<dyn StatsAggregator>) -> Self {
        Self {
            config,
            stats,
            observers: Vec::new(),
            rooms: Mutex::new(IndexMap::new()),
        }
    }

    /// Observers attached to every room created afterwards.
    pub fn with_observer(mut self, observer: Arc<dyn SessionObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn rooms(&self) -> MutexGuard<'_, IndexMap<RoomId, Arc<Room>>> {
        self.rooms.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn room(&self, id: RoomId) -> Result<Arc<Room>> {
        self.rooms()
            .get(&id)
            .cloned()
            .ok_or(ChessError::RoomNotFound(id))
    }

    /// Open a room with the host seated as white.
    pub fn create_room(
        &self,
        name: &str,
        host: &Player,
        time_limit: Option<u32>,
    ) -> Result<RoomId> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ChessError::MissingRoomName);
        }
        let time_limit = self.config.clock.time_limit(time_limit)?;
        let session = Session::create(&self.config, Some(time_limit))?;

        let mut table = Table::new(session, self.stats.clone());
        for obs in &self.observers {
            table = table.with_observer(obs.clone());
        }
        table.join(host);

        let id = RoomId::random();
        let room = Arc::new(Room {
            id,
            name: name.to_owned(),
            host: host.clone(),
            created_at: Utc::now(),
            time_limit,
            table: tokio::sync::Mutex::new(table),
            chat: Mutex::new(Vec::new()),
            cancel: CancellationToken::new(),
        });
        self.rooms().insert(id, room);

        info!(room = %id, name, host = %host.id, time_limit, "room created");
        Ok(id)
    }

    /// Take the free seat of a room. Filling the room starts its clock.
    pub async fn join_room(&self, id: RoomId, player: &Player) -> Result<Verdict> {
        let room = self.room(id)?;
        let mut table = room.table.lock().await;
        let res = table.join(player);
        if res.is_committed() && table.session().is_full() {
            self.start_clock(&room);
        }
        Ok(res)
    }

    /// Close a room and stop its clock.
    pub fn delete_room(&self, id: RoomId) -> Result<()> {
        let room = self
            .rooms()
            .shift_remove(&id)
            .ok_or(ChessError::RoomNotFound(id))?;
        room.cancel.cancel();
        info!(room = %id, "room deleted");
        Ok(())
    }

    /// Every room, oldest first.
    pub async fn list_rooms(&self) -> Vec<RoomSummary> {
        let rooms: Vec<_> = self.rooms().values().cloned().collect();
        let mut res = Vec::with_capacity(rooms.len());
        for room in rooms {
            res.push(room.summary().await);
        }
        res
    }

    pub async fn summary(&self, id: RoomId) -> Result<RoomSummary> {
        Ok(self.room(id)?.summary().await)
    }

    /// A copy of the room's session as it stands.
    pub async fn snapshot(&self, id: RoomId) -> Result<Session> {
        let room = self.room(id)?;
        let table = room.table.lock().await;
        Ok(table.session().clone())
    }

    pub async fn submit_move(
        &self,
        id: RoomId,
        player: &PlayerId,
        from: Position,
        to: Position,
    ) -> Result<Verdict> {
        let room = self.room(id)?;
        let mut table = room.table.lock().await;
        let res = table.submit_move(player, from, to)?;
        if table.session().is_over() {
            room.cancel.cancel();
        }
        Ok(res)
    }

    /// One elapsed second on the room's running clock, for integrators
    /// that drive time themselves.
    pub async fn tick(&self, id: RoomId) -> Result<Verdict> {
        let room = self.room(id)?;
        let mut table = room.table.lock().await;
        let res = table.tick();
        if table.session().is_over() {
            room.cancel.cancel();
        }
        Ok(res)
    }

    pub async fn possible_moves(&self, id: RoomId, pos: Position) -> Result<Vec<Position>> {
        let room = self.room(id)?;
        let table = room.table.lock().await;
        Ok(table.possible_moves(pos))
    }

    /// Post to a room's chat. Anyone may talk, seated or not. Blank
    /// messages are refused.
    pub fn post_message(&self, id: RoomId, sender: &Player, text: &str) -> Result<()> {
        if text.trim().is_empty() {
            return Err(ChessError::EmptyMessage);
        }
        let room = self.room(id)?;
        room.chat().push(ChatMessage {
            text: text.to_owned(),
            sender: sender.username.clone(),
            sender_uid: sender.id.clone(),
            timestamp: Utc::now(),
        });
        debug!(room = %id, sender = %sender.id, "chat message");
        Ok(())
    }

    /// A room's chat, oldest first.
    pub fn messages(&self, id: RoomId) -> Result<Vec<ChatMessage>> {
        let mut res = self.room(id)?.chat().clone();
        res.sort_by_key(|m| m.timestamp);
        Ok(res)
    }

    fn start_clock(&self, room: &Arc<Room>) {
        let room = room.clone();
        let period = self.config.clock.tick_interval();
        info!(room = %room.id, ?period, "clock started");
        tokio::spawn(async move { room.run_clock(period).await });
    }
}

#[cfg(test)]
fn players() -> (Player, Player) {
    (
        Player::new("host", "Hostess").unwrap(),
        Player::new("guest", "Guest").unwrap(),
    )
}

#[tokio::test(start_paused = true)]
async fn rooms_need_a_name_and_a_valid_limit() {
    let lobby = Lobby::new(EngineConfig::default(), Arc::new(crate::stats::MemoryStats::new()));
    let (host, _) = players();

    assert!(matches!(
        lobby.create_room("  ", &host, None),
        Err(ChessError::MissingRoomName)
    ));
    assert!(matches!(
        lobby.create_room("game", &host, Some(42)),
        Err(ChessError::InvalidTimeLimit(42))
    ));
    assert!(lobby.list_rooms().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn joining_fills_the_room() {
    use crate::session::Rejection;

    let lobby = Lobby::new(EngineConfig::default(), Arc::new(crate::stats::MemoryStats::new()));
    let (host, guest) = players();
    let id = lobby.create_room(" Friday game ", &host, Some(300)).unwrap();

    let summary = lobby.summary(id).await.unwrap();
    assert_eq!(summary.name, "Friday game");
    assert_eq!(summary.status, RoomStatus::WAITING);
    assert_eq!(summary.players.white.id, Some(host.id.clone()));
    assert_eq!(summary.players.white.time_remaining, 300);

    assert_eq!(
        lobby.join_room(id, &host).await.unwrap(),
        Verdict::Rejected(Rejection::AlreadySeated)
    );
    assert!(lobby.join_room(id, &guest).await.unwrap().is_committed());
    assert_eq!(lobby.summary(id).await.unwrap().status, RoomStatus::PLAYING);

    let third = Player::new("third", "Third").unwrap();
    assert_eq!(
        lobby.join_room(id, &third).await.unwrap(),
        Verdict::Rejected(Rejection::SessionFull)
    );
}

#[tokio::test(start_paused = true)]
async fn unknown_rooms() {
    let lobby = Lobby::new(EngineConfig::default(), Arc::new(crate::stats::MemoryStats::new()));
    let (host, guest) = players();
    let id = lobby.create_room("gone", &host, None).unwrap();
    lobby.delete_room(id).unwrap();

    assert!(matches!(
        lobby.join_room(id, &guest).await,
        Err(ChessError::RoomNotFound(_))
    ));
    assert!(matches!(lobby.snapshot(id).await, Err(ChessError::RoomNotFound(_))));
    assert!(matches!(lobby.delete_room(id), Err(ChessError::RoomNotFound(_))));
}

#[tokio::test(start_paused = true)]
async fn the_clock_runs_once_both_are_seated() {
    use crate::model::ChessColor;

    let lobby = Lobby::new(EngineConfig::default(), Arc::new(crate::stats::MemoryStats::new()));
    let (host, guest) = players();
    let id = lobby.create_room("clocked", &host, Some(180)).unwrap();

    tokio::time::sleep(Duration::from_millis(3_500)).await;
    let s = lobby.snapshot(id).await.unwrap();
    assert_eq!(s.time_remaining(ChessColor::WHITE), 180);

    lobby.join_room(id, &guest).await.unwrap();
    tokio::time::sleep(Duration::from_millis(5_500)).await;
    let s = lobby.snapshot(id).await.unwrap();
    assert_eq!(s.time_remaining(ChessColor::WHITE), 175);
    assert_eq!(s.time_remaining(ChessColor::BLACK), 180);
}

#[tokio::test(start_paused = true)]
async fn rooms_keep_a_chat() {
    let lobby = Lobby::new(EngineConfig::default(), Arc::new(crate::stats::MemoryStats::new()));
    let (host, guest) = players();
    let id = lobby.create_room("chatty", &host, None).unwrap();
    assert!(lobby.messages(id).unwrap().is_empty());

    lobby.post_message(id, &host, "good luck").unwrap();
    // Spectators may talk too.
    lobby.post_message(id, &guest, "have fun").unwrap();
    assert!(matches!(
        lobby.post_message(id, &guest, " \n "),
        Err(ChessError::EmptyMessage)
    ));

    let log = lobby.messages(id).unwrap();
    let lines: Vec<_> = log.iter().map(|m| (m.sender.as_str(), m.text.as_str())).collect();
    assert_eq!(lines, [("Hostess", "good luck"), ("Guest", "have fun")]);
    assert_eq!(log[1].sender_uid, guest.id);
    assert!(log[0].timestamp <= log[1].timestamp);

    let json = serde_json::to_value(&log[0]).unwrap();
    assert_eq!(json["senderUid"], "host");
    assert!(json["timestamp"].is_i64());

    lobby.delete_room(id).unwrap();
    assert!(matches!(lobby.messages(id), Err(ChessError::RoomNotFound(_))));
    assert!(matches!(
        lobby.post_message(id, &host, "hello?"),
        Err(ChessError::RoomNotFound(_))
    ));
}
