//! Defines the events broadcast by the clock engine.
//!
//! Events are a fire-and-forget notification hook: the engine sends them after
//! the fact and never waits on, or fails because of, a subscriber.

use crate::common::TournamentId;
use crate::engine::ClockAction;
use crate::error::Rejection;
use crate::tournament::TournamentStatus;
use chrono::{DateTime, Utc};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::broadcast::Receiver;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClockEvent {
    /// An action passed validation and both stores were updated.
    ActionApplied {
        tournament_id: TournamentId,
        action: ClockAction,
        status: TournamentStatus,
        current_level: usize,
        at: DateTime<Utc>,
    },
    /// An action was refused; nothing changed.
    ActionRejected {
        tournament_id: TournamentId,
        action: ClockAction,
        reason: Rejection,
        at: DateTime<Utc>,
    },
    /// A missing clock state was rebuilt from the tournament record.
    ClockRecovered {
        tournament_id: TournamentId,
        at: DateTime<Utc>,
    },
}

impl ClockEvent {
    pub fn tournament_id(&self) -> &TournamentId {
        match self {
            ClockEvent::ActionApplied { tournament_id, .. }
            | ClockEvent::ActionRejected { tournament_id, .. }
            | ClockEvent::ClockRecovered { tournament_id, .. } => tournament_id,
        }
    }
}

/// Hands every event from `clock_rx` to `handle` until the engine is dropped.
///
/// A receiver that falls behind the channel capacity skips the overwritten
/// events and keeps going. Returns the number of events skipped that way.
pub async fn forward_clock_events<F>(mut clock_rx: Receiver<ClockEvent>, mut handle: F) -> u64
where
    F: FnMut(ClockEvent),
{
    let mut skipped = 0;
    loop {
        match clock_rx.recv().await {
            Ok(event) => handle(event),
            Err(RecvError::Lagged(count)) => {
                warn!(skipped = count, "clock events dropped");
                skipped += count;
            }
            Err(RecvError::Closed) => break,
        }
    }
    skipped
}
