use std::fmt::Display;

use crate::{
    model::{ChessColor, attacking::GameStatus},
    session::{Rejection, Session, Verdict, Winner, players::PlayerSlot},
};

impl Session {
    /// Seconds left on a color's clock.
    #[inline]
    pub fn time_remaining(&self, color: ChessColor) -> u32 {
        self.slot(color).time_remaining
    }

    /// One elapsed second, charged to the player whose turn it is.
    ///
    /// When that clock reaches zero the game ends in a timeout won by
    /// the other color. Past the end of the game this is a no-op.
    pub fn tick(&mut self) -> Verdict {
        self.tick_for(self.current_turn)
    }

    /// A tick from a source bound to one color. Has no effect unless it is
    /// that color's turn.
    pub fn tick_for(&mut self, color: ChessColor) -> Verdict {
        if self.game_status.is_terminal() {
            return Verdict::Rejected(Rejection::GameOver);
        }
        if color != self.current_turn {
            return Verdict::Rejected(Rejection::WrongTurn);
        }

        let remaining = self.slot(color).time_remaining.saturating_sub(1);
        self.slot_mut(color).time_remaining = remaining;

        if remaining > 0 {
            return Verdict::Committed { outcome: None };
        }

        self.game_status = GameStatus::TIMEOUT;
        self.winner = Some(Winner::from(color.opp()));
        Verdict::Committed {
            outcome: self.outcome(),
        }
    }
}

/// Clock display as `m:ss`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockFace(pub u32);

impl Display for ClockFace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{:02}", self.0 / 60, self.0 % 60)
    }
}

impl Session {
    #[inline]
    pub fn clock_face(&self, color: ChessColor) -> ClockFace {
        ClockFace(self.time_remaining(color))
    }
}

/// A seat as a clock line: `Ada 9:58`, or `- 10:00` when vacant.
impl Display for PlayerSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = self.username.as_deref().unwrap_or("-");
        write!(f, "{name} {}", ClockFace(self.time_remaining))
    }
}

#[test]
fn clock_face() {
    assert_eq!(ClockFace(600).to_string(), "10:00");
    assert_eq!(ClockFace(65).to_string(), "1:05");
    assert_eq!(ClockFace(0).to_string(), "0:00");
}

#[test]
fn seats_read_as_clock_lines() {
    use crate::session::players::Player;

    let mut session = Session::new(600);
    assert_eq!(session.players().white.to_string(), "- 10:00");

    session.join(&Player::new("ada", "Ada").unwrap());
    session.tick();
    session.tick();
    assert_eq!(session.players().white.to_string(), "Ada 9:58");
    assert_eq!(session.clock_face(ChessColor::WHITE), ClockFace(598));
    assert_eq!(session.clock_face(ChessColor::BLACK).to_string(), "10:00");
}

#[test]
fn ticks_only_run_the_current_clock() {
    let mut session = Session::new(10);
    assert!(session.tick().is_committed());
    assert_eq!(session.time_remaining(ChessColor::WHITE), 9);
    assert_eq!(session.time_remaining(ChessColor::BLACK), 10);

    let before = session.clone();
    assert_eq!(
        session.tick_for(ChessColor::BLACK),
        Verdict::Rejected(Rejection::WrongTurn)
    );
    assert_eq!(session, before);
}

#[test]
fn timeout_is_absorbing() {
    use crate::model::Position;

    let mut session = Session::new(3);
    let mut outcomes = vec![];
    for _ in 0..3 {
        if let Verdict::Committed { outcome } = session.tick() {
            outcomes.extend(outcome);
        }
    }

    assert_eq!(session.game_status(), GameStatus::TIMEOUT);
    assert_eq!(session.winner(), Some(Winner::BLACK));
    assert_eq!(session.time_remaining(ChessColor::WHITE), 0);
    assert_eq!(outcomes.len(), 1);

    let frozen = session.clone();
    assert_eq!(session.tick(), Verdict::Rejected(Rejection::GameOver));
    let e2 = Position::new(6, 4).unwrap();
    let e4 = Position::new(4, 4).unwrap();
    assert_eq!(
        session.play(ChessColor::WHITE, e2, e4),
        Verdict::Rejected(Rejection::GameOver)
    );
    assert_eq!(session, frozen);
}
