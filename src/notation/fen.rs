//! # Forsyth-Edwards piece placement
//!
//! Only the first field of a FEN record is supported: the chessboard.
//!
//! The chessboard is written out as eight solidus-separated (`/`) ranks,
//! starting with the 8th rank, and then in descending order. The
//! individual ranks are written with files in a-h order.
//!
//! Occupied squares are denoted by a letter, upper case for white and
//! lower case for black: P for pawns, N for knights, B for bishops, R for
//! rooks, Q for queens, and K for kings. Empty squares are run-length
//! encoded as digits, up to 8 meaning an entirely empty rank.
//!
//! The standard starting position is:
//! ```text
//! rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR
//! ```

use chumsky::{Parser, prelude::*};

use crate::{
    model::{
        ChessMan, ChessPiece,
        board::{Board, Square},
    },
    notation::{Parsable, Prs},
};

pub const STARTPOS: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR";

impl Parsable for Board {
    fn parser<'s>() -> impl Prs<'s, Self> {
        fen_rank()
            .separated_by(just('/').labelled("solidus (/)"))
            .exactly(8)
            .collect::<Vec<_>>()
            .try_map(|ranks, span| {
                <[[Square; 8]; 8]>::try_from(ranks)
                    .map(Board)
                    .map_err(|v| Rich::custom(span, format!("{} ranks, expected 8", v.len())))
            })
    }
}

impl Board {
    /// The piece placement field of this board.
    pub fn placement(&self) -> String {
        let mut res = String::with_capacity(71);
        for (i, rank) in self.0.iter().enumerate() {
            if i > 0 {
                res.push('/');
            }
            let mut gap = 0u8;
            for sq in rank {
                match sq.man() {
                    None => gap += 1,
                    Some(cm) => {
                        if gap > 0 {
                            res.push((b'0' + gap) as char);
                            gap = 0;
                        }
                        res.push(cm.letter());
                    }
                }
            }
            if gap > 0 {
                res.push((b'0' + gap) as char);
            }
        }
        res
    }
}

fn fen_rank<'s>() -> impl Prs<'s, [Square; 8]> {
    choice((
        fen_chessman().map(|cm| vec![Square::from(cm)]),
        one_of("12345678")
            .map(|c: char| vec![Square::Empty; (c as u8 - b'0') as usize])
            .labelled("a run of empty squares 1 ... 8"),
    ))
    .repeated()
    .at_least(1)
    .collect::<Vec<_>>()
    .try_map(|runs, span| {
        <[Square; 8]>::try_from(runs.concat())
            .map_err(|v| Rich::custom(span, format!("rank of {} squares, expected 8", v.len())))
    })
}

fn fen_chessman<'s>() -> impl Prs<'s, ChessMan> {
    use ChessPiece::*;
    choice((
        just('k').to(ChessMan::black(KING)),
        just('q').to(ChessMan::black(QUEEN)),
        just('r').to(ChessMan::black(ROOK)),
        just('b').to(ChessMan::black(BISHOP)),
        just('n').to(ChessMan::black(KNIGHT)),
        just('p').to(ChessMan::black(PAWN)),
        just('P').to(ChessMan::white(PAWN)),
        just('N').to(ChessMan::white(KNIGHT)),
        just('B').to(ChessMan::white(BISHOP)),
        just('R').to(ChessMan::white(ROOK)),
        just('Q').to(ChessMan::white(QUEEN)),
        just('K').to(ChessMan::white(KING)),
    ))
    .labelled("one of PNBRQKpnbrqk")
}

#[test]
fn startpos_placement() {
    assert_eq!(Board::startpos().placement(), STARTPOS);
    assert_eq!(Board::parse_str(STARTPOS).unwrap(), Board::startpos());
}

#[test]
fn placement_reads_back() {
    use crate::model::Position;

    let fen = "rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR";
    let board = Board::parse_str(fen).unwrap();
    assert_eq!(
        board.man(Position::new(4, 7).unwrap()),
        Some(ChessMan::black(ChessPiece::QUEEN))
    );
    assert!(board.get(Position::new(0, 3).unwrap()).is_empty());
    assert_eq!(board.placement(), fen);
}

#[test]
fn malformed_placements() {
    for s in [
        "",
        "8/8/8/8/8/8/8",
        "8/8/8/8/8/8/8/8/8",
        "9/8/8/8/8/8/8/8",
        "ppppppppp/8/8/8/8/8/8/8",
        "8/8/8/8/8/8/8/7x",
        "8/8/8/8/8/8/8/8 w",
    ] {
        assert!(Board::parse_str(s).is_err(), "{s:?}");
    }
}
