use std::{fmt::Display, sync::LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{ChessError, Result};

static PLAYER_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_-]{1,64}$").unwrap_or_else(|e| panic!("player id pattern: {e}"))
});

/// Opaque identity of a player, as handed out by the authentication
/// collaborator.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PlayerId(String);

impl PlayerId {
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if PLAYER_ID.is_match(&id) {
            Ok(Self(id))
        } else {
            Err(ChessError::InvalidPlayerId(id))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for PlayerId {
    type Error = ChessError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<PlayerId> for String {
    fn from(value: PlayerId) -> Self {
        value.0
    }
}

impl Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A player as seen by a session: identity plus display name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub username: String,
}

impl Player {
    pub fn new(id: &str, username: &str) -> Result<Self> {
        let username = username.trim();
        if username.is_empty() {
            return Err(ChessError::MissingUsername);
        }
        Ok(Self {
            id: PlayerId::new(id)?,
            username: username.to_owned(),
        })
    }
}

/// One color's seat: who sits there, if anyone, and their clock.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSlot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<PlayerId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Seconds left on this color's clock.
    pub time_remaining: u32,
}

impl PlayerSlot {
    pub fn vacant(time_remaining: u32) -> Self {
        Self {
            id: None,
            username: None,
            time_remaining,
        }
    }

    #[inline]
    pub fn is_vacant(&self) -> bool {
        self.id.is_none()
    }

    pub fn seat(&mut self, player: &Player) {
        self.id = Some(player.id.clone());
        self.username = Some(player.username.clone());
    }
}

#[test]
fn player_id_validation() {
    assert!(PlayerId::new("uid_42-x").is_ok());
    assert!(matches!(
        PlayerId::new(""),
        Err(ChessError::InvalidPlayerId(_))
    ));
    assert!(PlayerId::new("has space").is_err());
    assert!(PlayerId::new("x".repeat(65)).is_err());

    let json = serde_json::to_string(&PlayerId::new("abc").unwrap()).unwrap();
    assert_eq!(json, "\"abc\"");
    assert!(serde_json::from_str::<PlayerId>("\"a/b\"").is_err());
}

#[test]
fn usernames_are_required() {
    assert!(matches!(
        Player::new("p1", "   "),
        Err(ChessError::MissingUsername)
    ));
    assert_eq!(Player::new("p1", " Ada ").unwrap().username, "Ada");
}
