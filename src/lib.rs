//! A two-player chess rules engine with game sessions, chess clocks, and
//! per-player statistics.
//!
//! The [`model`] tree knows the rules: pseudo-legal moves, check,
//! checkmate, and stalemate, evaluated by brute force on an 8x8 board.
//! A [`session::Session`] turns those rules into a game between two
//! seated players. The [`lobby`] keeps many sessions, serializes access
//! to each, and drives their clocks.

/// Configuration read from TOML.
pub mod config;
pub mod error;
/// Rooms, their serialization, and their clock drivers.
pub mod lobby;
/// Modeling the game of chess.
pub mod model;
/// Algebraic squares, coordinate moves, FEN placement, symbols.
pub mod notation;
pub mod observer;
/// Game sessions.
pub mod session;
pub mod stats;

pub use error::{ChessError, Result};
