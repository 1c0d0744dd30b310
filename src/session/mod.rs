//! # The game session state machine
//!
//! A [`Session`] owns everything about one game: the board, whose turn it
//! is, the status, the move history, and both clocks. It changes only
//! through [`Session::join`], [`Session::submit_move`] (or its color-level
//! form [`Session::play`]), and [`Session::tick`].
//!
//! ```text
//! playing <-> check ---> checkmate | stalemate | timeout
//! ```
//!
//! The terminal statuses are absorbing. An operation that breaks a rule of
//! the game is not an error: it returns [`Verdict::Rejected`] and the
//! session is left exactly as it was.
//!
//! A session has no internal locking. Integrators must serialize
//! operations on one session (the [`lobby`](crate::lobby) does so with a
//! mutex per room); whichever operation commits first decides a race for
//! the terminal status, and the loser becomes a rejected no-op.

pub mod clock;
pub mod players;
pub mod table;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIs};
use tracing::debug;

use crate::{
    config::{EngineConfig, Rules},
    error::{ChessError, Result},
    model::{
        ChessColor, ChessMan, Position,
        attacking::{GameStatus, classify},
        board::Board,
        movegen::{captures_king, destinations, exposes_king, legal_destinations},
        moving::{ChessMove, apply},
    },
    session::players::{Player, PlayerId, PlayerSlot},
    stats::{GameResult, Outcome},
};

/// Who won a finished game.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIs, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Winner {
    WHITE,
    BLACK,
    DRAW,
}

impl From<ChessColor> for Winner {
    fn from(value: ChessColor) -> Self {
        match value {
            ChessColor::WHITE => Self::WHITE,
            ChessColor::BLACK => Self::BLACK,
        }
    }
}

impl From<Winner> for GameResult {
    fn from(value: Winner) -> Self {
        match value {
            Winner::WHITE => GameResult::Win(ChessColor::WHITE),
            Winner::BLACK => GameResult::Win(ChessColor::BLACK),
            Winner::DRAW => GameResult::Draw,
        }
    }
}

/// One ply of the move history.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MoveRecord {
    pub from: Position,
    pub to: Position,
    /// The chessman as it stood on `from`, before any promotion.
    pub piece: ChessMan,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    pub player: ChessColor,
}

/// Both seats of a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Players {
    pub white: PlayerSlot,
    pub black: PlayerSlot,
}

/// Why an operation was turned down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIs, Display)]
pub enum Rejection {
    #[strum(to_string = "the game is over")]
    GameOver,
    #[strum(to_string = "it is not this player's turn")]
    WrongTurn,
    #[strum(to_string = "there is nothing on that square")]
    EmptySquare,
    #[strum(to_string = "that chessman belongs to the opponent")]
    NotYourPiece,
    #[strum(to_string = "that chessman cannot move there")]
    IllegalMove,
    #[strum(to_string = "kings are never captured")]
    KingCapture,
    #[strum(to_string = "that move leaves the king in check")]
    SelfCheck,
    #[strum(to_string = "both colors are already taken")]
    SessionFull,
    #[strum(to_string = "the player is already seated")]
    AlreadySeated,
}

/// Result of a state-changing operation on a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The operation took effect. `outcome` is set exactly when it moved
    /// the game into a terminal status.
    Committed { outcome: Option<Outcome> },
    /// Nothing changed.
    Rejected(Rejection),
}

impl Verdict {
    #[inline]
    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Committed { .. })
    }

    pub fn outcome(&self) -> Option<&Outcome> {
        match self {
            Self::Committed { outcome } => outcome.as_ref(),
            Self::Rejected(_) => None,
        }
    }

    pub fn rejection(&self) -> Option<Rejection> {
        match self {
            Self::Committed { .. } => None,
            Self::Rejected(r) => Some(*r),
        }
    }
}

/// The state of one game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    board: Board,
    current_turn: ChessColor,
    game_status: GameStatus,
    move_history: Vec<MoveRecord>,
    players: Players,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    winner: Option<Winner>,
    #[serde(skip)]
    rules: Rules,
}

impl Session {
    /// A fresh game from the standard setup, with both clocks at
    /// `time_limit` seconds and no players seated.
    pub fn new(time_limit: u32) -> Self {
        Self::from_position(Board::startpos(), ChessColor::WHITE, time_limit)
    }

    /// A fresh game under a configuration. `time_limit` falls back to the
    /// configured default and must be one the configuration allows.
    pub fn create(config: &EngineConfig, time_limit: Option<u32>) -> Result<Self> {
        let secs = config.clock.time_limit(time_limit)?;
        Ok(Self::new(secs).with_rules(config.rules))
    }

    /// A game starting from an arbitrary position.
    pub fn from_position(board: Board, to_move: ChessColor, time_limit: u32) -> Self {
        Self {
            board,
            current_turn: to_move,
            game_status: GameStatus::PLAYING,
            move_history: Vec::new(),
            players: Players {
                white: PlayerSlot::vacant(time_limit),
                black: PlayerSlot::vacant(time_limit),
            },
            winner: None,
            rules: Rules::default(),
        }
    }

    pub fn with_rules(mut self, rules: Rules) -> Self {
        self.rules = rules;
        self
    }

    #[inline]
    pub fn board(&self) -> &Board {
        &self.board
    }

    #[inline]
    pub fn current_turn(&self) -> ChessColor {
        self.current_turn
    }

    #[inline]
    pub fn game_status(&self) -> GameStatus {
        self.game_status
    }

    #[inline]
    pub fn is_over(&self) -> bool {
        self.game_status.is_terminal()
    }

    #[inline]
    pub fn move_history(&self) -> &[MoveRecord] {
        &self.move_history
    }

    #[inline]
    pub fn players(&self) -> &Players {
        &self.players
    }

    #[inline]
    pub fn winner(&self) -> Option<Winner> {
        self.winner
    }

    #[inline]
    pub fn rules(&self) -> Rules {
        self.rules
    }

    #[inline]
    pub fn slot(&self, color: ChessColor) -> &PlayerSlot {
        match color {
            ChessColor::WHITE => &self.players.white,
            ChessColor::BLACK => &self.players.black,
        }
    }

    #[inline]
    fn slot_mut(&mut self, color: ChessColor) -> &mut PlayerSlot {
        match color {
            ChessColor::WHITE => &mut self.players.white,
            ChessColor::BLACK => &mut self.players.black,
        }
    }

    /// The color a player is seated as, if any.
    pub fn seat_of(&self, player: &PlayerId) -> Option<ChessColor> {
        [ChessColor::WHITE, ChessColor::BLACK]
            .into_iter()
            .find(|&c| self.slot(c).id.as_ref() == Some(player))
    }

    /// Both colors are taken.
    pub fn is_full(&self) -> bool {
        !self.players.white.is_vacant() && !self.players.black.is_vacant()
    }

    /// Seat a player on the first free color, white before black.
    pub fn join(&mut self, player: &Player) -> Verdict {
        if self.seat_of(&player.id).is_some() {
            return Verdict::Rejected(Rejection::AlreadySeated);
        }

        let Some(color) = [ChessColor::WHITE, ChessColor::BLACK]
            .into_iter()
            .find(|&c| self.slot(c).is_vacant())
        else {
            return Verdict::Rejected(Rejection::SessionFull);
        };

        self.slot_mut(color).seat(player);
        Verdict::Committed { outcome: None }
    }

    /// Submit a move on behalf of a seated player.
    ///
    /// Fails hard only if the player has no seat in this game; everything
    /// else is decided by [`Session::play`].
    pub fn submit_move(
        &mut self,
        player: &PlayerId,
        from: Position,
        to: Position,
    ) -> Result<Verdict> {
        let color = self
            .seat_of(player)
            .ok_or_else(|| ChessError::UnknownPlayer(player.clone()))?;
        Ok(self.play(color, from, to))
    }

    /// Decide whether `mover` may move the chessman on `from` to `to`.
    pub fn check_move(&self, mover: ChessColor, from: Position, to: Position) -> Option<Rejection> {
        if self.game_status.is_terminal() {
            return Some(Rejection::GameOver);
        }
        if mover != self.current_turn {
            return Some(Rejection::WrongTurn);
        }
        let Some(cm) = self.board.man(from) else {
            return Some(Rejection::EmptySquare);
        };
        if cm.color != mover {
            return Some(Rejection::NotYourPiece);
        }
        if !destinations(&self.board, from).contains(&to) {
            return Some(Rejection::IllegalMove);
        }
        self.screen(ChessMove::new(from, to))
    }

    /// Rules applied on top of pseudo-legality: a king is never captured,
    /// and, if the session forbids it, no move may expose the mover's king.
    fn screen(&self, mv: ChessMove) -> Option<Rejection> {
        if captures_king(&self.board, mv) {
            return Some(Rejection::KingCapture);
        }
        if self.rules.forbid_self_check && exposes_king(&self.board, mv) {
            return Some(Rejection::SelfCheck);
        }
        None
    }

    /// Make a move for a color.
    ///
    /// The resulting position is classified for the opponent: checkmate
    /// wins for the mover, stalemate is a draw, and otherwise the status
    /// becomes check or playing. Board, history, turn, and status are all
    /// committed together or not at all.
    pub fn play(&mut self, mover: ChessColor, from: Position, to: Position) -> Verdict {
        if let Some(rejection) = self.check_move(mover, from, to) {
            debug!(%mover, %from, %to, %rejection, "move rejected");
            return Verdict::Rejected(rejection);
        }

        let Some(piece) = self.board.man(from) else {
            return Verdict::Rejected(Rejection::EmptySquare);
        };

        let board = apply(&self.board, ChessMove::new(from, to));
        let next = mover.opp();
        let status = classify(&board, next);
        let winner = match status {
            GameStatus::CHECKMATE => Some(Winner::from(mover)),
            GameStatus::STALEMATE => Some(Winner::DRAW),
            _ => None,
        };

        self.move_history.push(MoveRecord {
            from,
            to,
            piece,
            timestamp: Utc::now(),
            player: mover,
        });
        self.board = board;
        self.current_turn = next;
        self.game_status = status;
        self.winner = winner;

        Verdict::Committed {
            outcome: self.outcome(),
        }
    }

    /// Destinations the chessman on `pos` could be moved to when its
    /// color is to play, for highlighting. Empty for an empty square.
    pub fn possible_moves(&self, pos: Position) -> Vec<Position> {
        legal_destinations(&self.board, pos, self.rules.forbid_self_check)
    }

    /// The terminal outcome of this game, if it has one.
    pub fn outcome(&self) -> Option<Outcome> {
        if !self.game_status.is_terminal() {
            return None;
        }
        Some(Outcome {
            white: self.players.white.id.clone(),
            black: self.players.black.id.clone(),
            result: self.winner?.into(),
            reason: self.game_status,
        })
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }
}

#[cfg(test)]
use crate::model::ChessPiece;

#[cfg(test)]
fn pos(row: u8, col: u8) -> Position {
    Position::new(row, col).unwrap()
}

#[cfg(test)]
fn seated() -> (Session, Player, Player) {
    let white = Player::new("white_1", "Ada").unwrap();
    let black = Player::new("black_1", "Bob").unwrap();
    let mut session = Session::new(600);
    assert!(session.join(&white).is_committed());
    assert!(session.join(&black).is_committed());
    (session, white, black)
}

#[test]
fn fresh_session() {
    let session = Session::new(600);
    assert_eq!(session.board(), &Board::startpos());
    assert_eq!(session.current_turn(), ChessColor::WHITE);
    assert_eq!(session.game_status(), GameStatus::PLAYING);
    assert!(session.move_history().is_empty());
    assert_eq!(session.winner(), None);
    assert_eq!(session.time_remaining(ChessColor::WHITE), 600);
    assert_eq!(session.time_remaining(ChessColor::BLACK), 600);
    assert!(session.players().white.is_vacant());
}

#[test]
fn joining_fills_white_then_black() {
    let (mut session, white, black) = seated();
    assert_eq!(session.seat_of(&white.id), Some(ChessColor::WHITE));
    assert_eq!(session.seat_of(&black.id), Some(ChessColor::BLACK));
    assert!(session.is_full());

    let before = session.clone();
    let third = Player::new("third", "Cy").unwrap();
    assert_eq!(session.join(&third), Verdict::Rejected(Rejection::SessionFull));
    assert_eq!(session.join(&white), Verdict::Rejected(Rejection::AlreadySeated));
    assert_eq!(session, before);
}

#[test]
fn moves_alternate_turns() {
    let (mut session, white, black) = seated();
    let v = session.submit_move(&white.id, pos(6, 4), pos(4, 4)).unwrap();
    assert_eq!(v, Verdict::Committed { outcome: None });
    assert_eq!(session.current_turn(), ChessColor::BLACK);
    assert_eq!(session.move_history().len(), 1);

    let rec = &session.move_history()[0];
    assert_eq!((rec.from, rec.to), (pos(6, 4), pos(4, 4)));
    assert_eq!(rec.piece, ChessMan::white(ChessPiece::PAWN));
    assert_eq!(rec.player, ChessColor::WHITE);

    let v = session.submit_move(&black.id, pos(1, 4), pos(3, 4)).unwrap();
    assert!(v.is_committed());
    assert_eq!(session.current_turn(), ChessColor::WHITE);
}

#[test]
fn out_of_turn_leaves_session_untouched() {
    let (mut session, _, black) = seated();
    let before = session.to_json().unwrap();

    let v = session.submit_move(&black.id, pos(1, 4), pos(3, 4)).unwrap();
    assert_eq!(v, Verdict::Rejected(Rejection::WrongTurn));
    assert_eq!(session.to_json().unwrap(), before);
}

#[test]
fn rejected_moves_change_nothing() {
    let (mut session, white, _) = seated();
    let before = session.clone();

    let cases = [
        (pos(4, 4), pos(3, 4), Rejection::EmptySquare),
        (pos(1, 4), pos(2, 4), Rejection::NotYourPiece),
        (pos(6, 4), pos(3, 4), Rejection::IllegalMove),
        (pos(7, 0), pos(5, 0), Rejection::IllegalMove),
    ];
    for (from, to, why) in cases {
        let v = session.submit_move(&white.id, from, to).unwrap();
        assert_eq!(v, Verdict::Rejected(why));
    }
    assert_eq!(session, before);
}

#[test]
fn strangers_are_hard_errors() {
    let (mut session, _, _) = seated();
    let stranger = PlayerId::new("stranger").unwrap();
    assert!(matches!(
        session.submit_move(&stranger, pos(6, 4), pos(4, 4)),
        Err(ChessError::UnknownPlayer(_))
    ));
}

#[test]
fn fools_mate_ends_the_game() {
    let (mut session, white, black) = seated();
    let plies = [
        (ChessColor::WHITE, pos(6, 5), pos(5, 5)),
        (ChessColor::BLACK, pos(1, 4), pos(3, 4)),
        (ChessColor::WHITE, pos(6, 6), pos(4, 6)),
    ];
    for (color, from, to) in plies {
        assert_eq!(session.play(color, from, to), Verdict::Committed { outcome: None });
    }

    let v = session.play(ChessColor::BLACK, pos(0, 3), pos(4, 7));
    let outcome = v.outcome().cloned().unwrap();
    assert_eq!(outcome.result, GameResult::Win(ChessColor::BLACK));
    assert_eq!(outcome.reason, GameStatus::CHECKMATE);
    assert_eq!(outcome.white, Some(white.id.clone()));
    assert_eq!(outcome.black, Some(black.id.clone()));

    assert_eq!(session.game_status(), GameStatus::CHECKMATE);
    assert_eq!(session.winner(), Some(Winner::BLACK));
    assert_eq!(session.current_turn(), ChessColor::WHITE);
    assert_eq!(session.move_history().len(), 4);

    assert_eq!(
        session.play(ChessColor::WHITE, pos(6, 0), pos(5, 0)),
        Verdict::Rejected(Rejection::GameOver)
    );
}

#[test]
fn check_is_not_terminal() {
    let board = Board::with_men([
        (pos(7, 0), ChessMan::white(ChessPiece::KING)),
        (pos(7, 7), ChessMan::white(ChessPiece::ROOK)),
        (pos(0, 4), ChessMan::black(ChessPiece::KING)),
    ]);
    let mut session = Session::from_position(board, ChessColor::WHITE, 60);
    assert!(session.play(ChessColor::WHITE, pos(7, 7), pos(7, 4)).is_committed());
    assert_eq!(session.game_status(), GameStatus::CHECK);
    assert_eq!(session.winner(), None);

    assert!(session.play(ChessColor::BLACK, pos(0, 4), pos(0, 3)).is_committed());
    assert_eq!(session.game_status(), GameStatus::PLAYING);
}

#[test]
fn stalemate_is_a_draw() {
    let board = Board::with_men([
        (pos(0, 0), ChessMan::black(ChessPiece::KING)),
        (pos(2, 2), ChessMan::white(ChessPiece::KING)),
        (pos(1, 7), ChessMan::white(ChessPiece::QUEEN)),
    ]);
    let mut session = Session::from_position(board, ChessColor::WHITE, 60);
    let v = session.play(ChessColor::WHITE, pos(1, 7), pos(1, 2));

    assert_eq!(v.outcome().map(|o| o.result), Some(GameResult::Draw));
    assert_eq!(session.game_status(), GameStatus::STALEMATE);
    assert_eq!(session.winner(), Some(Winner::DRAW));
}

#[test]
fn a_king_that_only_attacks_the_other_king_is_stalemated() {
    use crate::notation::Parsable;

    let board = Board::parse_str("8/8/8/8/8/8/pp1K4/kp6").unwrap();
    let mut session = Session::from_position(board, ChessColor::WHITE, 60);
    let v = session.play(ChessColor::WHITE, pos(6, 3), pos(7, 2));

    assert_eq!(v.outcome().map(|o| o.result), Some(GameResult::Draw));
    assert_eq!(session.game_status(), GameStatus::STALEMATE);
    assert_eq!(session.winner(), Some(Winner::DRAW));
    assert!(session.possible_moves(pos(6, 1)).is_empty());
}

#[test]
fn promotion_through_a_session() {
    let board = Board::with_men([
        (pos(1, 0), ChessMan::white(ChessPiece::PAWN)),
        (pos(7, 4), ChessMan::white(ChessPiece::KING)),
        (pos(2, 7), ChessMan::black(ChessPiece::KING)),
    ]);
    let mut session = Session::from_position(board, ChessColor::WHITE, 60);
    assert!(session.play(ChessColor::WHITE, pos(1, 0), pos(0, 0)).is_committed());

    assert_eq!(session.board().man(pos(0, 0)), Some(ChessMan::white(ChessPiece::QUEEN)));
    assert!(session.board().get(pos(1, 0)).is_empty());
    assert_eq!(session.move_history()[0].piece, ChessMan::white(ChessPiece::PAWN));
}

#[test]
fn kings_are_never_captured() {
    // Black left its king en prise; white still may not take it.
    let board = Board::with_men([
        (pos(7, 0), ChessMan::white(ChessPiece::KING)),
        (pos(7, 4), ChessMan::white(ChessPiece::ROOK)),
        (pos(0, 4), ChessMan::black(ChessPiece::KING)),
    ]);
    let mut session = Session::from_position(board, ChessColor::WHITE, 60);
    assert_eq!(
        session.play(ChessColor::WHITE, pos(7, 4), pos(0, 4)),
        Verdict::Rejected(Rejection::KingCapture)
    );
    assert!(!session.possible_moves(pos(7, 4)).contains(&pos(0, 4)));
    assert!(session.possible_moves(pos(7, 4)).contains(&pos(1, 4)));
}

#[test]
fn self_check_is_allowed_unless_forbidden() {
    let board = Board::with_men([
        (pos(7, 4), ChessMan::white(ChessPiece::KING)),
        (pos(5, 4), ChessMan::white(ChessPiece::ROOK)),
        (pos(0, 4), ChessMan::black(ChessPiece::ROOK)),
        (pos(0, 0), ChessMan::black(ChessPiece::KING)),
    ]);

    let mut lax = Session::from_position(board.clone(), ChessColor::WHITE, 60);
    assert!(lax.play(ChessColor::WHITE, pos(5, 4), pos(5, 0)).is_committed());

    let strict_rules = Rules {
        forbid_self_check: true,
    };
    let mut strict = Session::from_position(board, ChessColor::WHITE, 60).with_rules(strict_rules);
    assert_eq!(
        strict.play(ChessColor::WHITE, pos(5, 4), pos(5, 0)),
        Verdict::Rejected(Rejection::SelfCheck)
    );
    assert!(strict.possible_moves(pos(5, 4)).iter().all(|p| p.col() == 4));
}

#[test]
fn wire_shape() {
    let (mut session, white, _) = seated();
    session.submit_move(&white.id, pos(6, 4), pos(4, 4)).unwrap();

    let json = serde_json::to_value(&session).unwrap();
    assert_eq!(json["board"][2][0], serde_json::json!({ "empty": true }));
    assert_eq!(json["board"][0][4], serde_json::json!({ "type": "king", "color": "black" }));
    assert_eq!(json["currentTurn"], "black");
    assert_eq!(json["gameStatus"], "playing");
    assert_eq!(json["moveHistory"][0]["from"], serde_json::json!([6, 4]));
    assert_eq!(json["moveHistory"][0]["player"], "white");
    assert_eq!(json["players"]["white"]["id"], "white_1");
    assert_eq!(json["players"]["black"]["timeRemaining"], 600);
    assert!(json.get("winner").is_none());
    assert!(json.get("rules").is_none());

    let back = Session::from_json(&session.to_json().unwrap()).unwrap();
    assert_eq!(back, session);

    let strict = Rules {
        forbid_self_check: true,
    };
    let session = session.with_rules(strict);
    let back = Session::from_json(&session.to_json().unwrap()).unwrap();
    assert_eq!(back.rules(), Rules::default());
    assert_eq!(back.with_rules(strict), session);
}
