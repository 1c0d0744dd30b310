use serde::{Deserialize, Serialize};
use strum::{EnumIs, EnumIter, FromRepr, VariantArray};

/// Evaluation of positions: check, checkmate, stalemate.
pub mod attacking;
/// The 8x8 board of squares and the standard setup.
pub mod board;
/// Pseudo-legal move enumeration.
pub mod movegen;
/// Moves and their application to a board.
pub mod moving;

/// Representation of color of a player or chessman.
///
/// The discriminants are used to index arrays of the form
/// `[<white value>, <black value>]`.
#[allow(non_camel_case_types)]
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIs, EnumIter, VariantArray,
    FromRepr, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum ChessColor {
    WHITE = 0,
    BLACK = 1,
}

impl ChessColor {
    /// The other player.
    #[inline]
    pub fn opp(self) -> Self {
        match self {
            Self::WHITE => Self::BLACK,
            Self::BLACK => Self::WHITE,
        }
    }

    /// Associated array index.
    #[inline]
    pub fn ix(self) -> usize {
        self as usize
    }

    /// Row delta of a pawn advance: white moves toward row 0.
    #[inline]
    pub fn forward(self) -> i8 {
        match self {
            Self::WHITE => -1,
            Self::BLACK => 1,
        }
    }

    /// Row holding this color's pawns at setup.
    #[inline]
    pub fn pawn_row(self) -> u8 {
        match self {
            Self::WHITE => 6,
            Self::BLACK => 1,
        }
    }

    /// Row holding this color's officers at setup.
    #[inline]
    pub fn back_rank(self) -> u8 {
        match self {
            Self::WHITE => 7,
            Self::BLACK => 0,
        }
    }

    /// Row on which this color's pawns promote: the opponent's back rank.
    #[inline]
    pub fn promotion_row(self) -> u8 {
        self.opp().back_rank()
    }
}

/// Representation of the piece types of chessmen.
///
/// Discriminants start at 1 so that [`ChessPiece::ix`] can be used to
/// index arrays of length six.
#[allow(non_camel_case_types)]
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIs, EnumIter, VariantArray,
    FromRepr, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum ChessPiece {
    PAWN = 1,
    KNIGHT = 2,
    BISHOP = 3,
    ROOK = 4,
    QUEEN = 5,
    KING = 6,
}

impl ChessPiece {
    /// Use as an array index: equal to one less than the discriminant value.
    #[inline]
    pub fn ix(self) -> usize {
        self as usize - 1
    }
}

/// Representation of a chessman: a piece type together with its color.
///
/// The name chessman is used because it allows a distinction between
/// pawns and pieces. Moving a chessman relocates the value; the only
/// operation that changes one is promotion, which replaces it outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChessMan {
    #[serde(rename = "type")]
    pub piece: ChessPiece,
    pub color: ChessColor,
}

impl ChessMan {
    pub const fn new(color: ChessColor, piece: ChessPiece) -> Self {
        Self { piece, color }
    }

    pub const fn white(piece: ChessPiece) -> Self {
        Self::new(ChessColor::WHITE, piece)
    }

    pub const fn black(piece: ChessPiece) -> Self {
        Self::new(ChessColor::BLACK, piece)
    }

    /// The same color, promoted to the strongest piece.
    #[inline]
    pub fn promoted(self) -> Self {
        Self::new(self.color, ChessPiece::QUEEN)
    }
}

/// A square coordinate on the board.
///
/// Row 0 is black's back rank (the eighth rank), row 7 is white's
/// back rank. Columns run from the a-file (0) to the h-file (7).
/// Values outside `0..8` cannot be constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "[u8; 2]", try_from = "[u8; 2]")]
pub struct Position {
    row: u8,
    col: u8,
}

impl Position {
    /// Checked constructor.
    #[inline]
    pub fn new(row: u8, col: u8) -> Option<Self> {
        (row < 8 && col < 8).then_some(Self { row, col })
    }

    #[inline]
    pub fn row(self) -> u8 {
        self.row
    }

    #[inline]
    pub fn col(self) -> u8 {
        self.col
    }

    /// Step by a signed delta, or `None` if that leaves the board.
    #[inline]
    pub fn offset(self, d_row: i8, d_col: i8) -> Option<Self> {
        let row = self.row as i8 + d_row;
        let col = self.col as i8 + d_col;
        if (0..8).contains(&row) && (0..8).contains(&col) {
            Some(Self {
                row: row as u8,
                col: col as u8,
            })
        } else {
            None
        }
    }

    /// All 64 positions in row-major order.
    pub fn all() -> impl Iterator<Item = Position> {
        (0..8u8).flat_map(|row| (0..8u8).map(move |col| Position { row, col }))
    }
}

impl From<Position> for [u8; 2] {
    fn from(value: Position) -> Self {
        [value.row, value.col]
    }
}

impl TryFrom<[u8; 2]> for Position {
    type Error = String;

    fn try_from([row, col]: [u8; 2]) -> Result<Self, Self::Error> {
        Position::new(row, col).ok_or_else(|| format!("position [{row}, {col}] is off the board"))
    }
}

#[test]
fn position_bounds() {
    assert!(Position::new(7, 7).is_some());
    assert!(Position::new(8, 0).is_none());
    assert!(Position::new(0, 8).is_none());

    let corner = Position::new(0, 0).unwrap();
    assert_eq!(corner.offset(-1, 0), None);
    assert_eq!(corner.offset(1, 1), Position::new(1, 1));
    assert_eq!(Position::all().count(), 64);
}

#[test]
fn color_geometry() {
    use ChessColor::*;
    assert_eq!(WHITE.opp(), BLACK);
    assert_eq!(WHITE.promotion_row(), 0);
    assert_eq!(BLACK.promotion_row(), 7);
    assert_eq!(WHITE.forward(), -1);
    assert_eq!(BLACK.pawn_row(), 1);
}
