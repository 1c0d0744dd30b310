//! # Per-player statistics
//!
//! A session reports each finished game exactly once as an [`Outcome`].
//! Aggregators receive those reports and keep the tallies; [`MemoryStats`]
//! is the in-process one.

use std::sync::{Mutex, MutexGuard, PoisonError};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    model::{ChessColor, attacking::GameStatus},
    session::players::{Player, PlayerId},
};

/// How a finished game ended, from the board's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameResult {
    Win(ChessColor),
    Draw,
}

/// The report of one finished game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub white: Option<PlayerId>,
    pub black: Option<PlayerId>,
    pub result: GameResult,
    /// The terminal status that ended the game.
    pub reason: GameStatus,
}

impl Outcome {
    pub fn player(&self, color: ChessColor) -> Option<&PlayerId> {
        match color {
            ChessColor::WHITE => self.white.as_ref(),
            ChessColor::BLACK => self.black.as_ref(),
        }
    }
}

/// Receives finished games.
pub trait StatsAggregator: Send + Sync {
    /// Called once per finished game. Implementations apply the whole
    /// outcome atomically.
    fn record(&self, outcome: &Outcome);
}

/// One player's tallies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSummary {
    pub username: String,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
}

impl PlayerSummary {
    pub fn total_games(&self) -> u32 {
        self.wins + self.losses + self.draws
    }

    /// Percentage of decided games that were won. Draws are not counted.
    pub fn win_rate(&self) -> f64 {
        let decided = self.wins + self.losses;
        if decided == 0 {
            return 0.0;
        }
        f64::from(self.wins) / f64::from(decided) * 100.0
    }
}

/// Statistics kept in memory behind one lock.
#[derive(Debug, Default)]
pub struct MemoryStats {
    players: Mutex<IndexMap<PlayerId, PlayerSummary>>,
}

impl MemoryStats {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, IndexMap<PlayerId, PlayerSummary>> {
        // Updates never panic halfway, so a poisoned map is still whole.
        self.players.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make a player known, keeping any tallies they already have.
    pub fn register(&self, player: &Player) {
        let mut players = self.lock();
        let entry = players.entry(player.id.clone()).or_default();
        entry.username.clone_from(&player.username);
    }

    pub fn summary(&self, id: &PlayerId) -> Option<PlayerSummary> {
        self.lock().get(id).cloned()
    }

    /// Everyone, most wins first, then best win rate.
    pub fn standings(&self) -> Vec<(PlayerId, PlayerSummary)> {
        let mut res: Vec<_> = self
            .lock()
            .iter()
            .map(|(id, s)| (id.clone(), s.clone()))
            .collect();
        res.sort_by(|(_, a), (_, b)| {
            b.wins
                .cmp(&a.wins)
                .then_with(|| b.win_rate().total_cmp(&a.win_rate()))
        });
        res
    }
}

impl StatsAggregator for MemoryStats {
    fn record(&self, outcome: &Outcome) {
        let mut players = self.lock();
        for color in [ChessColor::WHITE, ChessColor::BLACK] {
            let Some(id) = outcome.player(color) else {
                warn!(%color, reason = %outcome.reason, "finished game has an empty seat");
                continue;
            };
            let entry = players.entry(id.clone()).or_default();
            match outcome.result {
                GameResult::Draw => entry.draws += 1,
                GameResult::Win(c) if c == color => entry.wins += 1,
                GameResult::Win(_) => entry.losses += 1,
            }
        }
        info!(result = ?outcome.result, reason = %outcome.reason, "game recorded");
    }
}

#[cfg(test)]
fn outcome(white: &str, black: &str, result: GameResult) -> Outcome {
    Outcome {
        white: Some(PlayerId::new(white).unwrap()),
        black: Some(PlayerId::new(black).unwrap()),
        result,
        reason: match result {
            GameResult::Draw => GameStatus::STALEMATE,
            GameResult::Win(_) => GameStatus::CHECKMATE,
        },
    }
}

#[test]
fn wins_losses_and_draws() {
    let stats = MemoryStats::new();
    stats.register(&Player::new("ada", "Ada").unwrap());
    stats.register(&Player::new("bob", "Bob").unwrap());

    stats.record(&outcome("ada", "bob", GameResult::Win(ChessColor::WHITE)));
    stats.record(&outcome("bob", "ada", GameResult::Win(ChessColor::BLACK)));
    stats.record(&outcome("ada", "bob", GameResult::Draw));

    let ada = stats.summary(&PlayerId::new("ada").unwrap()).unwrap();
    assert_eq!((ada.wins, ada.losses, ada.draws), (2, 0, 1));
    assert_eq!(ada.username, "Ada");
    assert_eq!(ada.total_games(), 3);
    assert_eq!(ada.win_rate(), 100.0);

    let bob = stats.summary(&PlayerId::new("bob").unwrap()).unwrap();
    assert_eq!((bob.wins, bob.losses, bob.draws), (0, 2, 1));
    assert_eq!(bob.win_rate(), 0.0);
}

#[test]
fn empty_seats_are_skipped() {
    let stats = MemoryStats::new();
    let mut o = outcome("ada", "bob", GameResult::Win(ChessColor::BLACK));
    o.white = None;
    stats.record(&o);

    assert!(stats.summary(&PlayerId::new("ada").unwrap()).is_none());
    assert_eq!(stats.summary(&PlayerId::new("bob").unwrap()).unwrap().wins, 1);
}

#[test]
fn standings_order() {
    let stats = MemoryStats::new();
    stats.record(&outcome("cat", "eve", GameResult::Win(ChessColor::WHITE)));
    stats.record(&outcome("dan", "eve", GameResult::Win(ChessColor::WHITE)));
    stats.record(&outcome("dan", "fay", GameResult::Win(ChessColor::BLACK)));
    stats.record(&outcome("fay", "gus", GameResult::Win(ChessColor::WHITE)));
    stats.record(&outcome("fay", "gus", GameResult::Win(ChessColor::WHITE)));

    let order: Vec<_> = stats
        .standings()
        .into_iter()
        .map(|(id, _)| id.to_string())
        .collect();
    assert_eq!(order, ["fay", "cat", "dan", "eve", "gus"]);
}

#[test]
fn concurrent_reports_all_land() {
    use std::{sync::Arc, thread};

    let stats = Arc::new(MemoryStats::new());
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let stats = stats.clone();
            thread::spawn(move || {
                for _ in 0..100 {
                    stats.record(&outcome("ada", "bob", GameResult::Win(ChessColor::WHITE)));
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let ada = stats.summary(&PlayerId::new("ada").unwrap()).unwrap();
    let bob = stats.summary(&PlayerId::new("bob").unwrap()).unwrap();
    assert_eq!(ada.wins, 800);
    assert_eq!(bob.losses, 800);
}
