use std::fmt::Display;

use chumsky::{Parser, prelude::*};

use crate::{
    model::{Position, moving::ChessMove},
    notation::{Parsable, Prs},
};

/// A move written as two squares, `e2e4`. A dash or a single space
/// between the squares is accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CoordNotation {
    pub from: Position,
    pub to: Position,
}

impl CoordNotation {
    pub fn new(from: Position, to: Position) -> Self {
        Self { from, to }
    }
}

impl From<ChessMove> for CoordNotation {
    fn from(value: ChessMove) -> Self {
        Self::new(value.from, value.to)
    }
}

impl From<CoordNotation> for ChessMove {
    fn from(value: CoordNotation) -> Self {
        ChessMove::new(value.from, value.to)
    }
}

impl Display for CoordNotation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.from, self.to)
    }
}

impl Parsable for CoordNotation {
    fn parser<'s>() -> impl Prs<'s, Self> {
        group((
            Position::parser(),
            one_of("- ").or_not().ignored(),
            Position::parser(),
        ))
        .map(|(from, _, to)| Self::new(from, to))
    }
}

#[test]
fn separators() {
    let e2 = Position::new(6, 4).unwrap();
    let e4 = Position::new(4, 4).unwrap();
    for s in ["e2e4", "e2-e4", "e2 e4"] {
        assert_eq!(
            CoordNotation::parse_str(s).unwrap(),
            CoordNotation::new(e2, e4),
            "{s}"
        );
    }
    assert_eq!(CoordNotation::new(e2, e4).to_string(), "e2e4");
}

#[test]
fn malformed_moves() {
    for s in ["e2", "e2--e4", "e2  e4", "e2e4q", "e9e4"] {
        assert!(CoordNotation::parse_str(s).is_err(), "{s:?}");
    }
}
