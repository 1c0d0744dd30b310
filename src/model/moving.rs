use crate::model::{ChessMan, ChessPiece, Position, board::Board};

/// Representation of a move on a chessboard: the chessman standing on
/// `from` travels to `to`.
///
/// The moves are generally assumed to be produced by the pseudo-legal
/// enumeration in [`movegen`](crate::model::movegen). Applying a move that
/// is invalid in a given position is not checked; the only guarantee is
/// that the result is still a well-formed board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChessMove {
    pub from: Position,
    pub to: Position,
}

impl ChessMove {
    #[inline]
    pub fn new(from: Position, to: Position) -> Self {
        Self { from, to }
    }

    /// Whether the chessman making this move promotes on arrival.
    #[inline]
    pub fn promotes(self, cm: ChessMan) -> bool {
        cm.piece == ChessPiece::PAWN && self.to.row() == cm.color.promotion_row()
    }
}

/// Apply a move to a copy of the board, leaving the input untouched.
///
/// The chessman on `from` is relocated to `to`, replacing whatever stood
/// there, and `from` is emptied. A pawn arriving on the far back rank is
/// replaced by a queen of its color; no other promotion exists. Moving
/// from an empty square yields an unchanged copy.
pub fn apply(board: &Board, mv: ChessMove) -> Board {
    let mut res = board.clone();
    make_move(&mut res, mv);
    res
}

/// In-place variant of [`apply`], for boards the caller already owns.
pub fn make_move(board: &mut Board, mv: ChessMove) {
    let Some(cm) = board.man(mv.from) else {
        return;
    };

    let arriving = if mv.promotes(cm) { cm.promoted() } else { cm };

    board.set(mv.to, arriving.into());
    board.set(mv.from, Default::default());
}

#[cfg(test)]
fn pos(row: u8, col: u8) -> Position {
    Position::new(row, col).unwrap()
}

#[test]
fn apply_relocates_without_mutating_input() {
    let board = Board::startpos();
    let mv = ChessMove::new(pos(6, 4), pos(4, 4));
    let after = apply(&board, mv);

    assert_eq!(board, Board::startpos());
    assert!(after.get(pos(6, 4)).is_empty());
    assert_eq!(after.man(pos(4, 4)), Some(ChessMan::white(ChessPiece::PAWN)));
}

#[test]
fn apply_captures_by_replacement() {
    let board = Board::with_men([
        (pos(4, 4), ChessMan::white(ChessPiece::ROOK)),
        (pos(1, 4), ChessMan::black(ChessPiece::KNIGHT)),
    ]);
    let after = apply(&board, ChessMove::new(pos(4, 4), pos(1, 4)));

    assert_eq!(after.men().count(), 1);
    assert_eq!(after.man(pos(1, 4)), Some(ChessMan::white(ChessPiece::ROOK)));
}

#[test]
fn pawns_promote_to_queens_only() {
    let board = Board::with_men([
        (pos(1, 0), ChessMan::white(ChessPiece::PAWN)),
        (pos(6, 7), ChessMan::black(ChessPiece::PAWN)),
    ]);

    let after = apply(&board, ChessMove::new(pos(1, 0), pos(0, 0)));
    assert_eq!(after.man(pos(0, 0)), Some(ChessMan::white(ChessPiece::QUEEN)));

    let after = apply(&after, ChessMove::new(pos(6, 7), pos(7, 7)));
    assert_eq!(after.man(pos(7, 7)), Some(ChessMan::black(ChessPiece::QUEEN)));

    // A pawn stepping onto its own back rank is not a promotion.
    let odd = Board::with_men([(pos(6, 3), ChessMan::white(ChessPiece::PAWN))]);
    let after = apply(&odd, ChessMove::new(pos(6, 3), pos(7, 3)));
    assert_eq!(after.man(pos(7, 3)), Some(ChessMan::white(ChessPiece::PAWN)));
}
