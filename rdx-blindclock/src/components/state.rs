//! The volatile timing record of a tournament's current level.

use crate::tournament::{TournamentRecord, TournamentStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Timing of the current level.
///
/// `paused_at` is set exactly when `is_running` is false. `paused_duration_ms`
/// only grows, and only on resume; a level change starts a fresh record.
/// All transitions are pure: they return the next state instead of mutating,
/// so the engine can commit them only after the tournament record is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockState {
    pub is_running: bool,
    pub level_started_at: DateTime<Utc>,
    pub paused_at: Option<DateTime<Utc>>,
    pub paused_duration_ms: u64,
}

impl ClockState {
    /// A level that has just started and is running.
    pub fn started(now: DateTime<Utc>) -> Self {
        Self::level_reset(now, true)
    }

    /// A fresh level beginning at `now`, frozen if `running` is false.
    pub fn level_reset(now: DateTime<Utc>, running: bool) -> Self {
        Self {
            is_running: running,
            level_started_at: now,
            paused_at: if running { None } else { Some(now) },
            paused_duration_ms: 0,
        }
    }

    /// Best-effort reconstruction after the volatile record was lost.
    ///
    /// The level is assumed to have started at `actual_start` with no pauses;
    /// pause time accumulated before the loss is not recovered. A paused
    /// tournament is frozen at `now`.
    pub fn recovered(record: &TournamentRecord, now: DateTime<Utc>) -> Self {
        let level_started_at = record.actual_start.unwrap_or(now);
        let running = record.status != TournamentStatus::Paused;
        Self {
            is_running: running,
            level_started_at,
            paused_at: if running { None } else { Some(now) },
            paused_duration_ms: 0,
        }
    }

    pub fn paused(&self, now: DateTime<Utc>) -> Self {
        Self {
            is_running: false,
            paused_at: Some(now),
            ..*self
        }
    }

    pub fn resumed(&self, now: DateTime<Utc>) -> Self {
        let paused_for = self.paused_at.map_or(0, |paused_at| millis_between(paused_at, now));
        Self {
            is_running: true,
            paused_at: None,
            paused_duration_ms: self.paused_duration_ms.saturating_add(paused_for),
            ..*self
        }
    }

    /// Running time spent in the current level as of `now`, excluding pauses.
    pub fn elapsed_ms(&self, now: DateTime<Utc>) -> u64 {
        let until = match (self.is_running, self.paused_at) {
            (false, Some(paused_at)) => paused_at,
            _ => now,
        };
        millis_between(self.level_started_at, until).saturating_sub(self.paused_duration_ms)
    }
}

/// Milliseconds from `from` to `to`, clamped at zero.
fn millis_between(from: DateTime<Utc>, to: DateTime<Utc>) -> u64 {
    u64::try_from((to - from).num_milliseconds()).unwrap_or(0)
}
