//! Classification of a position for one side.
//!
//! Every query here is answered by brute force on top of the pseudo-legal
//! generator: scan the 64 squares, generate moves for each relevant
//! chessman, and for mate/stalemate try each move on a throwaway copy of
//! the board. There is no attack map caching.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIs};

use crate::model::{
    ChessColor, ChessPiece, Position,
    board::Board,
    movegen::{captures_king, destinations_into, enumerate},
    moving::{ChessMove, apply},
};

/// Status of a game, as seen by the player about to move.
#[allow(non_camel_case_types)]
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, EnumIs, Display, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum GameStatus {
    #[default]
    PLAYING,
    CHECK,
    CHECKMATE,
    STALEMATE,
    TIMEOUT,
}

impl GameStatus {
    /// Terminal statuses are absorbing: nothing changes a session after.
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::CHECKMATE | Self::STALEMATE | Self::TIMEOUT)
    }
}

/// Find the king of the given color, or `None` on a malformed board.
pub fn locate_king(board: &Board, color: ChessColor) -> Option<Position> {
    board
        .men_of(color)
        .find(|(_, cm)| cm.piece == ChessPiece::KING)
        .map(|(pos, _)| pos)
}

/// Whether any chessman of `attacker` has `target` among its
/// pseudo-legal destinations.
pub fn is_under_attack(board: &Board, target: Position, attacker: ChessColor) -> bool {
    let mut buffer = Vec::with_capacity(28);
    board.men_of(attacker).any(|(from, _)| {
        buffer.clear();
        destinations_into(board, from, &mut buffer);
        buffer.contains(&target)
    })
}

/// Whether the king of `color` is attacked. A board without that king is
/// never in check.
pub fn is_in_check(board: &Board, color: ChessColor) -> bool {
    match locate_king(board, color) {
        Some(king) => is_under_attack(board, king, color.opp()),
        None => false,
    }
}

/// Whether `color` has any pseudo-legal move after which it is not in
/// check. Moves onto a king are never played, so they do not count.
pub fn has_escape(board: &Board, color: ChessColor) -> bool {
    let mut moves = Vec::with_capacity(64);
    enumerate(board, color, &mut moves);
    moves.into_iter().any(|mv: ChessMove| {
        !captures_king(board, mv) && !is_in_check(&apply(board, mv), color)
    })
}

/// In check, and no move gets out of it.
pub fn is_checkmate(board: &Board, color: ChessColor) -> bool {
    is_in_check(board, color) && !has_escape(board, color)
}

/// Not in check, but every move would leave the king attacked.
pub fn is_stalemate(board: &Board, color: ChessColor) -> bool {
    !is_in_check(board, color) && !has_escape(board, color)
}

/// Classify the position for the side about to move.
///
/// Checkmate takes precedence over stalemate, which takes precedence
/// over a plain check.
pub fn classify(board: &Board, to_move: ChessColor) -> GameStatus {
    let check = is_in_check(board, to_move);
    let escape = has_escape(board, to_move);
    match (check, escape) {
        (true, false) => GameStatus::CHECKMATE,
        (false, false) => GameStatus::STALEMATE,
        (true, true) => GameStatus::CHECK,
        (false, true) => GameStatus::PLAYING,
    }
}

#[cfg(test)]
use crate::model::{ChessMan, moving::make_move};

#[cfg(test)]
fn pos(row: u8, col: u8) -> Position {
    Position::new(row, col).unwrap()
}

#[test]
fn startpos_is_quiet() {
    let board = Board::startpos();
    for color in [ChessColor::WHITE, ChessColor::BLACK] {
        assert!(!is_in_check(&board, color));
        assert!(!is_checkmate(&board, color));
        assert!(!is_stalemate(&board, color));
        assert_eq!(classify(&board, color), GameStatus::PLAYING);
    }
    assert_eq!(locate_king(&board, ChessColor::WHITE), Some(pos(7, 4)));
    assert_eq!(locate_king(&board, ChessColor::BLACK), Some(pos(0, 4)));
}

#[test]
fn fools_mate() {
    let mut board = Board::startpos();
    // f2-f3, e7-e5, g2-g4, d8-h4
    for (from, to) in [
        (pos(6, 5), pos(5, 5)),
        (pos(1, 4), pos(3, 4)),
        (pos(6, 6), pos(4, 6)),
        (pos(0, 3), pos(4, 7)),
    ] {
        make_move(&mut board, ChessMove::new(from, to));
    }

    assert!(is_in_check(&board, ChessColor::WHITE));
    assert!(is_checkmate(&board, ChessColor::WHITE));
    assert!(!is_stalemate(&board, ChessColor::WHITE));
    assert_eq!(classify(&board, ChessColor::WHITE), GameStatus::CHECKMATE);
}

#[test]
fn lone_king_stalemate() {
    // Black king a8, white queen c7, white king c6: black to move.
    let board = Board::with_men([
        (pos(0, 0), ChessMan::black(ChessPiece::KING)),
        (pos(1, 2), ChessMan::white(ChessPiece::QUEEN)),
        (pos(2, 2), ChessMan::white(ChessPiece::KING)),
    ]);
    assert!(!is_in_check(&board, ChessColor::BLACK));
    assert!(is_stalemate(&board, ChessColor::BLACK));
    assert!(!is_checkmate(&board, ChessColor::BLACK));
    assert_eq!(classify(&board, ChessColor::BLACK), GameStatus::STALEMATE);
}

#[test]
fn check_with_escape() {
    let board = Board::with_men([
        (pos(0, 4), ChessMan::black(ChessPiece::KING)),
        (pos(7, 4), ChessMan::white(ChessPiece::ROOK)),
        (pos(7, 0), ChessMan::white(ChessPiece::KING)),
    ]);
    assert!(is_in_check(&board, ChessColor::BLACK));
    assert!(!is_checkmate(&board, ChessColor::BLACK));
    assert_eq!(classify(&board, ChessColor::BLACK), GameStatus::CHECK);
}

#[test]
fn attack_detection_respects_blockers() {
    let board = Board::with_men([
        (pos(0, 0), ChessMan::black(ChessPiece::ROOK)),
        (pos(0, 3), ChessMan::black(ChessPiece::PAWN)),
    ]);
    assert!(is_under_attack(&board, pos(0, 2), ChessColor::BLACK));
    assert!(!is_under_attack(&board, pos(0, 4), ChessColor::BLACK));
    // Attacked means reachable: the square ahead of a pawn counts, an
    // empty capture diagonal does not.
    assert!(is_under_attack(&board, pos(1, 3), ChessColor::BLACK));
    assert!(!is_under_attack(&board, pos(1, 4), ChessColor::BLACK));
}

#[test]
fn kingless_board_is_never_in_check() {
    let board = Board::with_men([(pos(3, 3), ChessMan::white(ChessPiece::QUEEN))]);
    assert_eq!(locate_king(&board, ChessColor::BLACK), None);
    assert!(!is_in_check(&board, ChessColor::BLACK));
}

#[test]
fn terminal_statuses() {
    use GameStatus::*;
    assert!(!PLAYING.is_terminal());
    assert!(!CHECK.is_terminal());
    assert!(CHECKMATE.is_terminal());
    assert!(STALEMATE.is_terminal());
    assert!(TIMEOUT.is_terminal());
    assert_eq!(TIMEOUT.to_string(), "timeout");
}

#[test]
fn attacking_the_king_is_no_escape() {
    use crate::notation::Parsable;

    // Black's only pseudo-legal move after Kc1 is bxc1, onto the king.
    let mut board = Board::parse_str("8/8/8/8/8/8/pp1K4/kp6").unwrap();
    make_move(&mut board, ChessMove::new(pos(6, 3), pos(7, 2)));

    let mut moves = Vec::new();
    enumerate(&board, ChessColor::BLACK, &mut moves);
    assert_eq!(moves, [ChessMove::new(pos(6, 1), pos(7, 2))]);

    assert!(!is_in_check(&board, ChessColor::BLACK));
    assert!(!has_escape(&board, ChessColor::BLACK));
    assert!(is_stalemate(&board, ChessColor::BLACK));
    assert!(!is_checkmate(&board, ChessColor::BLACK));
    assert_eq!(classify(&board, ChessColor::BLACK), GameStatus::STALEMATE);
}
