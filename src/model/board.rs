//! # The 8x8 board
//!
//! This is the simple and most obvious representation, using a
//! separate value in an array for each square, a so-called
//! 'board'-centric representation. It is indexed `[row][col]` with
//! row 0 being black's back rank, matching the wire format of a session.

use serde::{Deserialize, Serialize};

use crate::model::{ChessColor, ChessMan, ChessPiece, Position};

/// Content of a single square: empty, or holding exactly one chessman.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "SquareRepr", try_from = "SquareRepr")]
pub enum Square {
    #[default]
    Empty,
    Occupied(ChessMan),
}

impl Square {
    #[inline]
    pub fn man(self) -> Option<ChessMan> {
        match self {
            Self::Empty => None,
            Self::Occupied(cm) => Some(cm),
        }
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self == Self::Empty
    }

    /// Holds a chessman of the given color.
    #[inline]
    pub fn is_color(self, color: ChessColor) -> bool {
        matches!(self, Self::Occupied(cm) if cm.color == color)
    }
}

impl From<ChessMan> for Square {
    fn from(value: ChessMan) -> Self {
        Self::Occupied(value)
    }
}

/// Wire shape of a square: `{type, color}` or `{empty: true}`.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum SquareRepr {
    Occupied(ChessMan),
    Empty { empty: bool },
}

impl From<Square> for SquareRepr {
    fn from(value: Square) -> Self {
        match value {
            Square::Empty => SquareRepr::Empty { empty: true },
            Square::Occupied(cm) => SquareRepr::Occupied(cm),
        }
    }
}

impl TryFrom<SquareRepr> for Square {
    type Error = &'static str;

    fn try_from(value: SquareRepr) -> Result<Self, Self::Error> {
        match value {
            SquareRepr::Occupied(cm) => Ok(Square::Occupied(cm)),
            SquareRepr::Empty { empty: true } => Ok(Square::Empty),
            SquareRepr::Empty { empty: false } => Err("square is neither empty nor occupied"),
        }
    }
}

/// Exactly 8x8 squares.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Board(pub [[Square; 8]; 8]);

impl Board {
    /// The officers on a back rank, a-file to h-file.
    const OFFICERS: [ChessPiece; 8] = {
        use ChessPiece::*;
        [ROOK, KNIGHT, BISHOP, QUEEN, KING, BISHOP, KNIGHT, ROOK]
    };

    /// A board with no chessmen on it.
    pub fn empty() -> Self {
        Self([[Square::Empty; 8]; 8])
    }

    /// The standard starting position.
    pub fn startpos() -> Self {
        let mut res = Self::empty();

        for color in [ChessColor::WHITE, ChessColor::BLACK] {
            let back = color.back_rank() as usize;
            let pawns = color.pawn_row() as usize;
            for col in 0..8 {
                res.0[back][col] = ChessMan::new(color, Self::OFFICERS[col]).into();
                res.0[pawns][col] = ChessMan::new(color, ChessPiece::PAWN).into();
            }
        }

        res
    }

    /// Set up an arbitrary position from a list of placements.
    pub fn with_men(men: impl IntoIterator<Item = (Position, ChessMan)>) -> Self {
        let mut res = Self::empty();
        for (pos, cm) in men {
            res.set(pos, cm.into());
        }
        res
    }

    #[inline]
    pub fn get(&self, pos: Position) -> Square {
        self.0[pos.row() as usize][pos.col() as usize]
    }

    #[inline]
    pub fn set(&mut self, pos: Position, sq: Square) {
        self.0[pos.row() as usize][pos.col() as usize] = sq
    }

    #[inline]
    pub fn man(&self, pos: Position) -> Option<ChessMan> {
        self.get(pos).man()
    }

    /// Iterate over every occupied square.
    pub fn men(&self) -> impl Iterator<Item = (Position, ChessMan)> + '_ {
        Position::all().filter_map(|pos| self.man(pos).map(|cm| (pos, cm)))
    }

    /// Iterate over the chessmen of one color.
    pub fn men_of(&self, color: ChessColor) -> impl Iterator<Item = (Position, ChessMan)> + '_ {
        self.men().filter(move |(_, cm)| cm.color == color)
    }

    /// Number of chessmen of the given kind on the board.
    pub fn count(&self, cm: ChessMan) -> usize {
        self.men().filter(|(_, x)| *x == cm).count()
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::startpos()
    }
}

#[test]
fn startpos_material() {
    use ChessPiece::*;

    let board = Board::startpos();
    for color in [ChessColor::WHITE, ChessColor::BLACK] {
        let men = |piece| board.count(ChessMan::new(color, piece));
        assert_eq!(men(PAWN), 8);
        assert_eq!(men(ROOK), 2);
        assert_eq!(men(KNIGHT), 2);
        assert_eq!(men(BISHOP), 2);
        assert_eq!(men(QUEEN), 1);
        assert_eq!(men(KING), 1);
    }
    assert_eq!(board.men().count(), 32);

    let at = |r, c| board.man(Position::new(r, c).unwrap());
    assert_eq!(at(0, 4), Some(ChessMan::black(KING)));
    assert_eq!(at(7, 3), Some(ChessMan::white(QUEEN)));
    assert_eq!(at(6, 0), Some(ChessMan::white(PAWN)));
    assert_eq!(at(4, 4), None);
}

#[test]
fn square_wire_shape() {
    let empty = serde_json::to_value(Square::Empty).unwrap();
    assert_eq!(empty, serde_json::json!({ "empty": true }));

    let rook = serde_json::to_value(Square::from(ChessMan::black(ChessPiece::ROOK))).unwrap();
    assert_eq!(rook, serde_json::json!({ "type": "rook", "color": "black" }));

    let back: Square = serde_json::from_value(rook).unwrap();
    assert_eq!(back, Square::Occupied(ChessMan::black(ChessPiece::ROOK)));
    assert!(serde_json::from_value::<Square>(serde_json::json!({ "empty": false })).is_err());
}
