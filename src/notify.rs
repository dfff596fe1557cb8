#![cfg(feature = "std")]

use std::sync::{Arc, Mutex};

use crate::game::{MatchId, MatchResult, MatchStatus, PlayerId, ShotRecord, Side};
use crate::grid::BoardView;

/// Who an event is addressed to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Recipient {
    /// Every observer of the match.
    Broadcast,
    Player(PlayerId),
}

/// Observer updates pushed after a state change has been stored.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Event {
    PlayerJoined { player: PlayerId },
    PlayerReady { side: Side },
    MatchStarted { turn: Side },
    ShotFired(ShotRecord),
    TurnChanged { turn: Side },
    /// Perspective view for one participant: own ships visible, opponent's hidden.
    BoardUpdate {
        own: BoardView,
        opponent: BoardView,
        turn: Side,
        status: MatchStatus,
    },
    MatchFinished { result: MatchResult },
}

/// Fire-and-forget push sink. Errors are reported by the caller, never
/// propagated into the match.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, id: MatchId, to: Recipient, event: Event) -> anyhow::Result<()>;
}

/// Drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullNotifier;

#[async_trait::async_trait]
impl Notifier for NullNotifier {
    async fn notify(&self, _id: MatchId, _to: Recipient, _event: Event) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Keeps every event in order; handy for observers in tests and the CLI.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    events: Arc<Mutex<Vec<(MatchId, Recipient, Event)>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events seen so far.
    pub fn events(&self) -> Vec<(MatchId, Recipient, Event)> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn events_for(&self, id: MatchId) -> Vec<(Recipient, Event)> {
        self.events()
            .into_iter()
            .filter(|(m, _, _)| *m == id)
            .map(|(_, to, ev)| (to, ev))
            .collect()
    }
}

#[async_trait::async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, id: MatchId, to: Recipient, event: Event) -> anyhow::Result<()> {
        self.events
            .lock()
            .map_err(|_| anyhow::anyhow!("event log poisoned"))?
            .push((id, to, event));
        Ok(())
    }
}
