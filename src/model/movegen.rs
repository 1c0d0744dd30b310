use crate::model::{
    ChessColor, ChessMan, ChessPiece, Position,
    attacking::is_in_check,
    board::{Board, Square},
    moving::{ChessMove, apply},
};

/// Orthogonal rays, as `(d_row, d_col)`.
pub const ROOK_RAYS: [(i8, i8); 4] = [(0, 1), (0, -1), (1, 0), (-1, 0)];

/// Diagonal rays, as `(d_row, d_col)`.
pub const BISHOP_RAYS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

/// The eight L-shaped knight jumps.
pub const KNIGHT_JUMPS: [(i8, i8); 8] = [
    (-2, -1),
    (-2, 1),
    (-1, -2),
    (-1, 2),
    (1, -2),
    (1, 2),
    (2, -1),
    (2, 1),
];

/// The eight adjacent king steps.
pub const KING_STEPS: [(i8, i8); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// Enumerate the pseudo-legal destinations of the chessman on `from`.
///
/// Pseudo-legal means respecting movement, blocking, and capture rules
/// but not whether the mover's own king is left in check. An empty
/// square has no destinations. Destinations are always on the board and
/// never equal to `from`.
pub fn destinations(board: &Board, from: Position) -> Vec<Position> {
    let mut buffer = Vec::with_capacity(28);
    destinations_into(board, from, &mut buffer);
    buffer
}

/// Buffer-reusing variant of [`destinations`].
pub fn destinations_into(board: &Board, from: Position, buffer: &mut Vec<Position>) {
    let Some(cm) = board.man(from) else {
        return;
    };

    use ChessPiece::*;
    match cm.piece {
        PAWN => pawn_moves(board, from, cm.color, buffer),
        KNIGHT => leaper_moves(board, from, cm.color, &KNIGHT_JUMPS, buffer),
        BISHOP => slider_moves(board, from, cm.color, &BISHOP_RAYS, buffer),
        ROOK => slider_moves(board, from, cm.color, &ROOK_RAYS, buffer),
        QUEEN => {
            slider_moves(board, from, cm.color, &ROOK_RAYS, buffer);
            slider_moves(board, from, cm.color, &BISHOP_RAYS, buffer);
        }
        KING => leaper_moves(board, from, cm.color, &KING_STEPS, buffer),
    }
}

/// The legality gate applied before a move is executed: `to` must be among
/// the pseudo-legal destinations of the chessman on `from`.
pub fn is_valid_move(board: &Board, from: Position, to: Position) -> bool {
    destinations(board, from).contains(&to)
}

/// Whether making `mv` leaves the mover's own king attacked.
pub fn exposes_king(board: &Board, mv: ChessMove) -> bool {
    match board.man(mv.from) {
        Some(cm) => is_in_check(&apply(board, mv), cm.color),
        None => false,
    }
}

/// Whether `mv` lands on a king. Such moves are never played.
#[inline]
pub fn captures_king(board: &Board, mv: ChessMove) -> bool {
    board.man(mv.to).is_some_and(|cm| cm.piece == ChessPiece::KING)
}

/// Destinations that may actually be played: pseudo-legal, never onto a
/// king, and with `forbid_self_check` never leaving the mover in check.
pub fn legal_destinations(
    board: &Board,
    from: Position,
    forbid_self_check: bool,
) -> Vec<Position> {
    let mut res = destinations(board, from);
    res.retain(|&to| {
        let mv = ChessMove::new(from, to);
        !captures_king(board, mv) && !(forbid_self_check && exposes_king(board, mv))
    });
    res
}

/// Every pseudo-legal move available to one side.
pub fn enumerate(board: &Board, color: ChessColor, buffer: &mut Vec<ChessMove>) {
    let mut tos = Vec::with_capacity(28);
    for (from, _) in board.men_of(color) {
        tos.clear();
        destinations_into(board, from, &mut tos);
        buffer.extend(tos.iter().map(|&to| ChessMove::new(from, to)));
    }
}

/// A destination is reachable by a non-sliding move if empty or hostile.
#[inline]
fn open_to(sq: Square, color: ChessColor) -> bool {
    !sq.is_color(color)
}

fn pawn_moves(board: &Board, from: Position, color: ChessColor, buffer: &mut Vec<Position>) {
    let dir = color.forward();

    if let Some(one) = from.offset(dir, 0)
        && board.get(one).is_empty()
    {
        buffer.push(one);

        if from.row() == color.pawn_row()
            && let Some(two) = from.offset(2 * dir, 0)
            && board.get(two).is_empty()
        {
            buffer.push(two);
        }
    }

    for side in [-1, 1] {
        if let Some(to) = from.offset(dir, side)
            && board.get(to).is_color(color.opp())
        {
            buffer.push(to);
        }
    }
}

fn leaper_moves(
    board: &Board,
    from: Position,
    color: ChessColor,
    offsets: &[(i8, i8)],
    buffer: &mut Vec<Position>,
) {
    for &(dr, dc) in offsets {
        if let Some(to) = from.offset(dr, dc)
            && open_to(board.get(to), color)
        {
            buffer.push(to);
        }
    }
}

fn slider_moves(
    board: &Board,
    from: Position,
    color: ChessColor,
    rays: &[(i8, i8)],
    buffer: &mut Vec<Position>,
) {
    for &(dr, dc) in rays {
        let mut cur = from;
        while let Some(to) = cur.offset(dr, dc) {
            match board.get(to) {
                Square::Empty => buffer.push(to),
                Square::Occupied(ChessMan { color: c, .. }) => {
                    if c != color {
                        buffer.push(to);
                    }
                    break;
                }
            }
            cur = to;
        }
    }
}

#[cfg(test)]
fn pos(row: u8, col: u8) -> Position {
    Position::new(row, col).unwrap()
}

#[cfg(test)]
fn sorted(mut v: Vec<Position>) -> Vec<Position> {
    v.sort();
    v
}

#[test]
fn startpos_pawn_and_knight() {
    let board = Board::startpos();
    assert_eq!(
        sorted(destinations(&board, pos(6, 4))),
        vec![pos(4, 4), pos(5, 4)]
    );
    assert_eq!(
        sorted(destinations(&board, pos(7, 1))),
        vec![pos(5, 0), pos(5, 2)]
    );
    assert!(destinations(&board, pos(7, 0)).is_empty());
    assert!(destinations(&board, pos(4, 4)).is_empty());
}

#[test]
fn pawn_double_push_needs_both_squares_empty() {
    let board = Board::with_men([
        (pos(1, 2), ChessMan::black(ChessPiece::PAWN)),
        (pos(3, 2), ChessMan::white(ChessPiece::KNIGHT)),
        (pos(6, 5), ChessMan::white(ChessPiece::PAWN)),
        (pos(5, 5), ChessMan::black(ChessPiece::BISHOP)),
    ]);
    assert_eq!(destinations(&board, pos(1, 2)), vec![pos(2, 2)]);
    assert!(destinations(&board, pos(6, 5)).is_empty());
}

#[test]
fn pawn_captures_diagonally_only_enemies() {
    let board = Board::with_men([
        (pos(4, 3), ChessMan::white(ChessPiece::PAWN)),
        (pos(3, 2), ChessMan::black(ChessPiece::ROOK)),
        (pos(3, 4), ChessMan::white(ChessPiece::ROOK)),
        (pos(3, 3), ChessMan::black(ChessPiece::PAWN)),
    ]);
    assert_eq!(destinations(&board, pos(4, 3)), vec![pos(3, 2)]);
}

#[test]
fn sliders_stop_at_blockers() {
    let board = Board::with_men([
        (pos(4, 4), ChessMan::white(ChessPiece::ROOK)),
        (pos(4, 6), ChessMan::white(ChessPiece::PAWN)),
        (pos(1, 4), ChessMan::black(ChessPiece::PAWN)),
    ]);
    let moves = sorted(destinations(&board, pos(4, 4)));
    assert!(moves.contains(&pos(1, 4)));
    assert!(!moves.contains(&pos(0, 4)));
    assert!(moves.contains(&pos(4, 5)));
    assert!(!moves.contains(&pos(4, 6)));
    assert_eq!(moves.len(), 3 + 1 + 3 + 4);
}

#[test]
fn queen_is_rook_plus_bishop() {
    let board = Board::with_men([(pos(3, 3), ChessMan::black(ChessPiece::QUEEN))]);
    assert_eq!(destinations(&board, pos(3, 3)).len(), 27);
    let king = Board::with_men([(pos(0, 0), ChessMan::black(ChessPiece::KING))]);
    assert_eq!(destinations(&king, pos(0, 0)).len(), 3);
}

#[test]
fn destinations_stay_on_board_and_move() {
    let mut board = Board::startpos();
    board.set(pos(4, 4), ChessMan::white(ChessPiece::QUEEN).into());
    board.set(pos(3, 0), ChessMan::black(ChessPiece::KNIGHT).into());
    board.set(pos(5, 7), ChessMan::black(ChessPiece::KING).into());

    for from in Position::all() {
        for to in destinations(&board, from) {
            assert!(to.row() < 8 && to.col() < 8);
            assert_ne!(to, from);
        }
    }
}

#[test]
fn legal_filter_removes_self_check() {
    // The e-file rook is pinned against its king.
    let board = Board::with_men([
        (pos(7, 4), ChessMan::white(ChessPiece::KING)),
        (pos(5, 4), ChessMan::white(ChessPiece::ROOK)),
        (pos(0, 4), ChessMan::black(ChessPiece::ROOK)),
    ]);
    let pseudo = destinations(&board, pos(5, 4));
    let legal = legal_destinations(&board, pos(5, 4), true);
    assert!(pseudo.contains(&pos(5, 0)));
    assert!(!legal.contains(&pos(5, 0)));
    assert!(legal.iter().all(|p| p.col() == 4));
    assert!(legal.contains(&pos(0, 4)));
    assert_eq!(legal_destinations(&board, pos(5, 4), false), pseudo);
}

#[test]
fn kings_are_not_destinations() {
    let board = Board::with_men([
        (pos(7, 0), ChessMan::white(ChessPiece::KING)),
        (pos(7, 4), ChessMan::white(ChessPiece::ROOK)),
        (pos(0, 4), ChessMan::black(ChessPiece::KING)),
    ]);
    assert!(destinations(&board, pos(7, 4)).contains(&pos(0, 4)));
    assert!(captures_king(&board, ChessMove::new(pos(7, 4), pos(0, 4))));

    let legal = legal_destinations(&board, pos(7, 4), false);
    assert!(!legal.contains(&pos(0, 4)));
    assert!(legal.contains(&pos(1, 4)));
}
