//! Notification of committed session changes.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::trace;

use crate::session::Session;

/// A committed change to a session.
///
/// `revision` counts commits on that session, starting at 1. Observers
/// only ever see committed states; rejected operations publish nothing.
#[derive(Debug, Clone)]
pub struct StateChanged {
    pub revision: u64,
    pub session: Arc<Session>,
}

/// Anything interested in committed session states.
pub trait SessionObserver: Send + Sync {
    fn on_state_changed(&self, change: &StateChanged);
}

/// Fans committed states out over a tokio broadcast channel.
///
/// Slow subscribers lag and skip revisions rather than holding up play.
#[derive(Debug, Clone)]
pub struct BroadcastObserver {
    tx: broadcast::Sender<StateChanged>,
}

impl BroadcastObserver {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StateChanged> {
        self.tx.subscribe()
    }
}

impl SessionObserver for BroadcastObserver {
    fn on_state_changed(&self, change: &StateChanged) {
        if self.tx.send(change.clone()).is_err() {
            trace!(revision = change.revision, "no subscribers");
        }
    }
}

#[test]
fn broadcast_delivers_to_every_subscriber() {
    let obs = BroadcastObserver::new(4);
    let mut a = obs.subscribe();
    let mut b = obs.subscribe();

    let change = StateChanged {
        revision: 1,
        session: Arc::new(Session::new(60)),
    };
    obs.on_state_changed(&change);

    assert_eq!(a.try_recv().unwrap().revision, 1);
    assert_eq!(*b.try_recv().unwrap().session, *change.session);
    assert!(a.try_recv().is_err());
}

#[test]
fn nobody_listening_is_fine() {
    let obs = BroadcastObserver::new(1);
    obs.on_state_changed(&StateChanged {
        revision: 7,
        session: Arc::new(Session::new(60)),
    });
}
