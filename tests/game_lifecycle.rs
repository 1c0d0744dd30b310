//! End-to-end games through the public session API.

use chessroom::{
    model::{
        ChessColor, ChessMan, ChessPiece, Position,
        attacking::{GameStatus, is_checkmate, is_stalemate},
        board::Board,
        movegen::destinations,
        moving::{ChessMove, apply},
    },
    notation::{Parsable, coord_notation::CoordNotation},
    session::{
        Rejection, Session, Verdict, Winner,
        players::Player,
    },
    stats::GameResult,
};

fn sq(s: &str) -> Position {
    Position::parse_str(s).unwrap()
}

fn seated(time_limit: u32) -> (Session, Player, Player) {
    let white = Player::new("alice", "Alice").unwrap();
    let black = Player::new("bruno", "Bruno").unwrap();
    let mut session = Session::new(time_limit);
    session.join(&white);
    session.join(&black);
    (session, white, black)
}

#[test]
fn standard_setup() {
    use ChessPiece::*;

    let session = Session::new(600);
    let board = session.board();
    for color in [ChessColor::WHITE, ChessColor::BLACK] {
        let counts = [(PAWN, 8), (ROOK, 2), (KNIGHT, 2), (BISHOP, 2), (QUEEN, 1), (KING, 1)];
        for (piece, n) in counts {
            assert_eq!(board.count(ChessMan::new(color, piece)), n, "{color} {piece:?}");
        }
        for col in 0..8 {
            let pawn = Position::new(color.pawn_row(), col).unwrap();
            assert_eq!(board.man(pawn), Some(ChessMan::new(color, PAWN)));
        }
    }
    assert_eq!(board.man(sq("e1")), Some(ChessMan::white(KING)));
    assert_eq!(board.man(sq("d8")), Some(ChessMan::black(QUEEN)));
    assert_eq!(session.current_turn(), ChessColor::WHITE);
    assert_eq!(session.game_status(), GameStatus::PLAYING);
}

#[test]
fn destinations_stay_on_the_board() {
    let boards = [
        Board::startpos(),
        Board::parse_str("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R").unwrap(),
        Board::parse_str("8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8").unwrap(),
    ];
    for board in &boards {
        for from in Position::all() {
            for to in destinations(board, from) {
                assert!(to.row() < 8 && to.col() < 8);
                assert_ne!(to, from);
            }
        }
    }
}

#[test]
fn apply_moves_the_chessman() {
    let board = Board::startpos();
    let after = apply(&board, ChessMove::new(sq("g1"), sq("f3")));
    assert!(after.get(sq("g1")).is_empty());
    assert_eq!(after.man(sq("f3")), Some(ChessMan::white(ChessPiece::KNIGHT)));
    assert_eq!(board, Board::startpos());
}

#[test]
fn fools_mate() {
    let (mut session, alice, bruno) = seated(600);
    let moves = [("f2-f3", &alice), ("e7-e5", &bruno), ("g2-g4", &alice)];
    for (text, who) in moves {
        let mv = CoordNotation::parse_str(text).unwrap();
        let v = session.submit_move(&who.id, mv.from, mv.to).unwrap();
        assert_eq!(v, Verdict::Committed { outcome: None }, "{text}");
    }

    let mv = CoordNotation::parse_str("d8h4").unwrap();
    let v = session.submit_move(&bruno.id, mv.from, mv.to).unwrap();
    let outcome = v.outcome().unwrap();
    assert_eq!(outcome.result, GameResult::Win(ChessColor::BLACK));
    assert_eq!(outcome.reason, GameStatus::CHECKMATE);

    assert!(is_checkmate(session.board(), ChessColor::WHITE));
    assert_eq!(session.winner(), Some(Winner::BLACK));
    assert_eq!(
        session.history_lines(),
        ["1. f2 → f3", "2. e7 → e5", "3. g2 → g4", "4. d8 → h4"]
    );
}

#[test]
fn lone_king_stalemate() {
    let board = Board::parse_str("k7/2Q5/2K5/8/8/8/8/8").unwrap();
    assert!(is_stalemate(&board, ChessColor::BLACK));
    assert!(!is_checkmate(&board, ChessColor::BLACK));
}

#[test]
fn timeout_freezes_the_game() {
    let (mut session, alice, _) = seated(5);
    for _ in 0..5 {
        assert!(session.tick().is_committed());
    }
    assert_eq!(session.game_status(), GameStatus::TIMEOUT);
    assert_eq!(session.winner(), Some(Winner::BLACK));

    let frozen = session.to_json().unwrap();
    assert_eq!(session.tick(), Verdict::Rejected(Rejection::GameOver));
    assert_eq!(
        session.submit_move(&alice.id, sq("e2"), sq("e4")).unwrap(),
        Verdict::Rejected(Rejection::GameOver)
    );
    assert_eq!(session.to_json().unwrap(), frozen);
}

#[test]
fn wrong_turn_changes_no_byte() {
    let (mut session, alice, bruno) = seated(600);
    session.submit_move(&alice.id, sq("d2"), sq("d4")).unwrap();
    let before = session.to_json().unwrap();

    let v = session.submit_move(&alice.id, sq("d4"), sq("d5")).unwrap();
    assert_eq!(v, Verdict::Rejected(Rejection::WrongTurn));
    assert_eq!(session.to_json().unwrap(), before);

    assert!(session.submit_move(&bruno.id, sq("d7"), sq("d5")).unwrap().is_committed());
}

#[test]
fn pawns_only_become_queens() {
    let board = Board::parse_str("7k/P7/8/8/8/8/8/4K3").unwrap();
    let mut session = Session::from_position(board, ChessColor::WHITE, 60);
    assert!(session.play(ChessColor::WHITE, sq("a7"), sq("a8")).is_committed());
    assert_eq!(session.board().man(sq("a8")), Some(ChessMan::white(ChessPiece::QUEEN)));
    assert_eq!(session.board().placement(), "Q6k/8/8/8/8/8/8/4K3");
    assert_eq!(session.game_status(), GameStatus::CHECK);
}

#[test]
fn sessions_survive_the_wire() {
    let (mut session, alice, _) = seated(300);
    session.submit_move(&alice.id, sq("e2"), sq("e4")).unwrap();
    let json = session.to_json().unwrap();
    let back = Session::from_json(&json).unwrap();
    assert_eq!(back, session);
    assert_eq!(back.possible_moves(sq("e7")), [sq("e6"), sq("e5")]);
}
