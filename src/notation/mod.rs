//! # Text formats
//!
//! Squares are written in algebraic form, file letter then rank digit,
//! with `a8` in the top-left corner of the board (row 0, column 0) and
//! `h1` in the bottom-right (row 7, column 7).
//!
//! Parsers are built with `chumsky` and exposed through [`Parsable`].

pub mod coord_notation;
pub mod fen;
pub mod square;

use std::fmt::Display;

use chumsky::{Parser, error::Rich, extra, prelude::end};

use crate::{
    error::{ChessError, Result},
    model::{ChessColor, ChessMan, ChessPiece, Position},
    session::{MoveRecord, Session},
};

pub type Extra<'s> = extra::Err<Rich<'s, char>>;

/// Shorthand for a string parser with rich errors.
pub trait Prs<'s, O>: Parser<'s, &'s str, O, Extra<'s>> {}

impl<'s, O, P: Parser<'s, &'s str, O, Extra<'s>>> Prs<'s, O> for P {}

/// Types with a canonical text form.
pub trait Parsable: Sized {
    fn parser<'s>() -> impl Prs<'s, Self>;

    /// Parse the whole of `s`.
    fn parse_str(s: &str) -> Result<Self> {
        Self::parser()
            .then_ignore(end())
            .parse(s)
            .into_result()
            .map_err(|errs| {
                ChessError::Notation(
                    errs.iter()
                        .map(|e| e.to_string())
                        .collect::<Vec<_>>()
                        .join("; "),
                )
            })
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", (b'a' + self.col()) as char, 8 - self.row())
    }
}

impl Display for ChessColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::WHITE => "white",
            Self::BLACK => "black",
        })
    }
}

impl ChessPiece {
    /// Upper-case letter, as used by FEN for white.
    pub fn letter(self) -> char {
        match self {
            Self::PAWN => 'P',
            Self::KNIGHT => 'N',
            Self::BISHOP => 'B',
            Self::ROOK => 'R',
            Self::QUEEN => 'Q',
            Self::KING => 'K',
        }
    }
}

impl ChessMan {
    /// FEN letter: upper case for white, lower case for black.
    pub fn letter(self) -> char {
        let c = self.piece.letter();
        match self.color {
            ChessColor::WHITE => c,
            ChessColor::BLACK => c.to_ascii_lowercase(),
        }
    }

    /// Unicode chess symbol.
    pub fn symbol(self) -> char {
        const SYMBOLS: [[char; 6]; 2] = [
            ['♙', '♘', '♗', '♖', '♕', '♔'],
            ['♟', '♞', '♝', '♜', '♛', '♚'],
        ];
        SYMBOLS[self.color.ix()][self.piece.ix()]
    }
}

impl Display for ChessMan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl Display for MoveRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} → {}", self.from, self.to)
    }
}

impl Session {
    /// The move history as numbered lines, one per ply: `1. f2 → f3`.
    pub fn history_lines(&self) -> Vec<String> {
        self.move_history()
            .iter()
            .enumerate()
            .map(|(i, rec)| format!("{}. {rec}", i + 1))
            .collect()
    }
}

#[test]
fn algebraic_corners() {
    assert_eq!(Position::new(0, 0).unwrap().to_string(), "a8");
    assert_eq!(Position::new(7, 7).unwrap().to_string(), "h1");
    assert_eq!(Position::new(6, 5).unwrap().to_string(), "f2");
}

#[test]
fn symbols_and_letters() {
    assert_eq!(ChessMan::white(ChessPiece::KING).to_string(), "♔");
    assert_eq!(ChessMan::black(ChessPiece::PAWN).to_string(), "♟");
    assert_eq!(ChessMan::black(ChessPiece::KNIGHT).letter(), 'n');
    assert_eq!(ChessMan::white(ChessPiece::QUEEN).letter(), 'Q');
}

#[test]
fn history_lines() {
    let mut session = Session::new(60);
    let f2 = Position::new(6, 5).unwrap();
    let f3 = Position::new(5, 5).unwrap();
    let e7 = Position::new(1, 4).unwrap();
    let e5 = Position::new(3, 4).unwrap();
    session.play(ChessColor::WHITE, f2, f3);
    session.play(ChessColor::BLACK, e7, e5);

    assert_eq!(session.history_lines(), ["1. f2 → f3", "2. e7 → e5"]);
}
