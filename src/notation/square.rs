use chumsky::{Parser, prelude::*};

use crate::{
    model::Position,
    notation::{Parsable, Prs},
};

fn file<'s>() -> impl Prs<'s, u8> {
    one_of("abcdefgh")
        .map(|c: char| c as u8 - b'a')
        .labelled("a file letter a ... h")
}

fn rank<'s>() -> impl Prs<'s, u8> {
    one_of("12345678")
        .map(|c: char| b'8' - c as u8)
        .labelled("a rank number 1 ... 8")
}

impl Parsable for Position {
    fn parser<'s>() -> impl Prs<'s, Self> {
        group((file(), rank()))
            .try_map(|(col, row), span| {
                Position::new(row, col).ok_or_else(|| Rich::custom(span, "square off the board"))
            })
            .labelled("a square a1 ... h8")
    }
}

#[test]
fn every_square_reads_back() {
    for pos in Position::all() {
        let s = pos.to_string();
        assert_eq!(Position::parse_str(&s).unwrap(), pos, "{s}");
    }
}

#[test]
fn bad_squares() {
    for s in ["", "i1", "a9", "a0", "A1", "e2e4", "e"] {
        assert!(Position::parse_str(s).is_err(), "{s:?}");
    }
}
