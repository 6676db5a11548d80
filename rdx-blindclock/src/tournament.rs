//! The persisted tournament entity and its partial-update contract.

use crate::common::{TournamentId, VenueId};
use crate::structure::BlindStructure;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Lifecycle status of a tournament.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentStatus {
    #[default]
    Scheduled,
    Running,
    Paused,
    FinalTable,
    Completed,
    Cancelled,
}

impl TournamentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TournamentStatus::Scheduled => "scheduled",
            TournamentStatus::Running => "running",
            TournamentStatus::Paused => "paused",
            TournamentStatus::FinalTable => "final_table",
            TournamentStatus::Completed => "completed",
            TournamentStatus::Cancelled => "cancelled",
        }
    }

    /// Statuses in which a clock is ticking or frozen and `current_level` is valid.
    pub fn has_clock(&self) -> bool {
        matches!(
            self,
            TournamentStatus::Running | TournamentStatus::Paused | TournamentStatus::FinalTable
        )
    }

    /// Statuses in which the level may be changed.
    pub fn is_active(&self) -> bool {
        matches!(self, TournamentStatus::Running | TournamentStatus::Paused)
    }
}

impl fmt::Display for TournamentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The authoritative tournament row, owned by the persistence collaborator.
///
/// Only `status`, `current_level`, `actual_start`, `ended_at` and `updated_at`
/// are ever written by the engine; everything else is passed through to the
/// projection untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TournamentRecord {
    pub id: TournamentId,
    pub venue_id: VenueId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: TournamentStatus,
    #[serde(default)]
    pub current_level: usize,
    #[serde(default)]
    pub blind_structure: BlindStructure,
    #[serde(default)]
    pub actual_start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub current_entries: u32,
    #[serde(default)]
    pub players_remaining: u32,
    #[serde(default)]
    pub average_stack: u64,
    #[serde(default)]
    pub total_chips_in_play: u64,
}

impl TournamentRecord {
    /// Creates a scheduled tournament with no field data beyond its structure.
    pub fn scheduled(
        id: impl Into<TournamentId>,
        venue_id: impl Into<VenueId>,
        name: impl Into<String>,
        blind_structure: BlindStructure,
    ) -> Self {
        Self {
            id: id.into(),
            venue_id: venue_id.into(),
            name: name.into(),
            status: TournamentStatus::Scheduled,
            current_level: 0,
            blind_structure,
            actual_start: None,
            ended_at: None,
            updated_at: None,
            current_entries: 0,
            players_remaining: 0,
            average_stack: 0,
            total_chips_in_play: 0,
        }
    }

    /// Checks that a clock-bearing record points at a level of its structure.
    pub fn validate(&self) -> Result<(), RecordError> {
        if self.status.has_clock() && !self.blind_structure.contains(self.current_level) {
            return Err(RecordError::LevelOutOfRange {
                id: self.id.clone(),
                status: self.status,
                level: self.current_level,
                levels: self.blind_structure.len(),
            });
        }
        Ok(())
    }

    /// Applies a partial update in place. Used by repository implementations.
    pub fn apply_update(&mut self, update: &TournamentUpdate) {
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(level) = update.current_level {
            self.current_level = level;
        }
        if let Some(started) = update.actual_start {
            self.actual_start = Some(started);
        }
        if let Some(ended) = update.ended_at {
            self.ended_at = Some(ended);
        }
        self.updated_at = Some(update.updated_at);
    }
}

/// Reasons a stored tournament record is unusable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("tournament {id} is {status} at level {level}, but its structure has {levels} levels")]
    LevelOutOfRange {
        id: TournamentId,
        status: TournamentStatus,
        level: usize,
        levels: usize,
    },
}

/// The narrow write contract the engine uses against the persistence collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TournamentUpdate {
    pub status: Option<TournamentStatus>,
    pub current_level: Option<usize>,
    pub actual_start: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl TournamentUpdate {
    /// An update that only stamps `updated_at`.
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            status: None,
            current_level: None,
            actual_start: None,
            ended_at: None,
            updated_at: now,
        }
    }

    pub fn status(mut self, status: TournamentStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn level(mut self, level: usize) -> Self {
        self.current_level = Some(level);
        self
    }

    pub fn started(mut self, at: DateTime<Utc>) -> Self {
        self.actual_start = Some(at);
        self
    }

    pub fn ended(mut self, at: DateTime<Utc>) -> Self {
        self.ended_at = Some(at);
        self
    }
}
