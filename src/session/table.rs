use std::sync::Arc;

use tracing::{info, warn};

use crate::{
    error::Result,
    model::Position,
    observer::{SessionObserver, StateChanged},
    session::{
        Session, Verdict,
        players::{Player, PlayerId},
    },
    stats::{Outcome, StatsAggregator},
};

/// A session together with the parties that hear about it.
///
/// Every committed operation bumps the revision and is published to the
/// observers. The outcome of a finished game goes to the aggregator
/// exactly once.
pub struct Table {
    session: Session,
    revision: u64,
    reported: bool,
    stats: Arc<dyn StatsAggregator>,
    observers: Vec<Arc<dyn SessionObserver>>,
}

impl Table {
    pub fn new(session: Session, stats: Arc<dyn StatsAggregator>) -> Self {
        Self {
            session,
            revision: 0,
            reported: false,
            stats,
            observers: Vec::new(),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn SessionObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    #[inline]
    pub fn session(&self) -> &Session {
        &self.session
    }

    #[inline]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn join(&mut self, player: &Player) -> Verdict {
        let res = self.session.join(player);
        if res.is_committed()
            && let Some(color) = self.session.seat_of(&player.id)
        {
            info!(
                player = %player.id,
                %color,
                seat = %self.session.slot(color),
                full = self.session.is_full(),
                "player seated"
            );
        }
        self.settle(res)
    }

    pub fn submit_move(
        &mut self,
        player: &PlayerId,
        from: Position,
        to: Position,
    ) -> Result<Verdict> {
        let res = self.session.submit_move(player, from, to)?;
        Ok(self.settle(res))
    }

    pub fn tick(&mut self) -> Verdict {
        let res = self.session.tick();
        self.settle(res)
    }

    #[inline]
    pub fn possible_moves(&self, pos: Position) -> Vec<Position> {
        self.session.possible_moves(pos)
    }

    /// Publish a committed verdict and forward its outcome, if any.
    fn settle(&mut self, verdict: Verdict) -> Verdict {
        if !verdict.is_committed() {
            return verdict;
        }

        self.revision += 1;
        if let Some(outcome) = verdict.outcome() {
            self.report(outcome);
        }

        let change = StateChanged {
            revision: self.revision,
            session: Arc::new(self.session.clone()),
        };
        for obs in &self.observers {
            obs.on_state_changed(&change);
        }
        verdict
    }

    fn report(&mut self, outcome: &Outcome) {
        if self.reported {
            warn!(revision = self.revision, "outcome already reported");
            return;
        }
        self.reported = true;
        info!(
            status = %outcome.reason,
            result = ?outcome.result,
            revision = self.revision,
            "game over"
        );
        self.stats.record(outcome);
    }
}

#[cfg(test)]
use std::sync::Mutex;

#[cfg(test)]
#[derive(Default)]
struct Recorder {
    outcomes: Mutex<Vec<Outcome>>,
    revisions: Mutex<Vec<u64>>,
}

#[cfg(test)]
impl StatsAggregator for Recorder {
    fn record(&self, outcome: &Outcome) {
        self.outcomes.lock().unwrap().push(outcome.clone());
    }
}

#[cfg(test)]
impl SessionObserver for Recorder {
    fn on_state_changed(&self, change: &StateChanged) {
        self.revisions.lock().unwrap().push(change.revision);
    }
}

#[cfg(test)]
fn recorded_table(time_limit: u32) -> (Table, Arc<Recorder>, Player, Player) {
    let rec = Arc::new(Recorder::default());
    let mut table = Table::new(Session::new(time_limit), rec.clone()).with_observer(rec.clone());
    let white = Player::new("w", "White").unwrap();
    let black = Player::new("b", "Black").unwrap();
    assert!(table.join(&white).is_committed());
    assert!(table.join(&black).is_committed());
    (table, rec, white, black)
}

#[test]
fn publishes_only_commits() {
    use crate::session::Rejection;

    let (mut table, rec, white, black) = recorded_table(60);
    let e2 = Position::new(6, 4).unwrap();
    let e4 = Position::new(4, 4).unwrap();

    let v = table.submit_move(&black.id, e2, e4).unwrap();
    assert_eq!(v, Verdict::Rejected(Rejection::WrongTurn));
    assert_eq!(table.revision(), 2);

    assert!(table.submit_move(&white.id, e2, e4).unwrap().is_committed());
    assert!(table.tick().is_committed());
    assert_eq!(*rec.revisions.lock().unwrap(), [1, 2, 3, 4]);
    assert!(rec.outcomes.lock().unwrap().is_empty());

    let players = table.session().players();
    assert_eq!(players.white.to_string(), "White 1:00");
    assert_eq!(players.black.to_string(), "Black 0:59");
}

#[test]
fn timeout_is_reported_once() {
    use crate::{
        model::{ChessColor, attacking::GameStatus},
        stats::GameResult,
    };

    let (mut table, rec, white, black) = recorded_table(2);
    table.tick();
    table.tick();
    assert_eq!(table.session().game_status(), GameStatus::TIMEOUT);

    for _ in 0..3 {
        assert!(!table.tick().is_committed());
    }

    let outcomes = rec.outcomes.lock().unwrap();
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].result, GameResult::Win(ChessColor::BLACK));
    assert_eq!(outcomes[0].white, Some(white.id));
    assert_eq!(outcomes[0].black, Some(black.id));
    assert_eq!(table.revision(), 4);
}
