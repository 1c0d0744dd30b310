use thiserror::Error;

use crate::{lobby::RoomId, session::players::PlayerId};

/// Hard failures: configuration, identity, and lookup problems.
///
/// Breaking the rules of the game is not an error. Those operations
/// return a [`Verdict`](crate::session::Verdict) instead and leave the
/// session untouched.
#[derive(Debug, Error)]
pub enum ChessError {
    #[error("please enter a room name")]
    MissingRoomName,

    #[error("please enter a username")]
    MissingUsername,

    #[error("please enter a message")]
    EmptyMessage,

    #[error("invalid player id {0:?}: expected 1-64 characters of [A-Za-z0-9_-]")]
    InvalidPlayerId(String),

    #[error("player {0} is not seated in this game")]
    UnknownPlayer(PlayerId),

    #[error("room {0} no longer exists")]
    RoomNotFound(RoomId),

    #[error("time limit of {0} seconds is not allowed")]
    InvalidTimeLimit(u32),

    #[error("unable to parse notation: {0}")]
    Notation(String),

    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T, E = ChessError> = std::result::Result<T, E>;
