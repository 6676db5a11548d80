//! The read-side projection shown on clock screens.

use crate::common::TournamentId;
use crate::components::state::ClockState;
use crate::structure::BlindLevel;
use crate::tournament::{TournamentRecord, TournamentStatus};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Everything a staff console or spectator screen needs to draw the clock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayPayload {
    pub tournament: TournamentSummary,
    pub clock: ClockView,
    pub current_blind: Option<LevelView>,
    pub next_blind: Option<LevelView>,
    pub blind_structure: Vec<LevelView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TournamentSummary {
    pub id: TournamentId,
    pub name: String,
    pub status: TournamentStatus,
    pub current_level: usize,
    pub current_entries: u32,
    pub players_remaining: u32,
    pub average_stack: u64,
    pub total_chips_in_play: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClockView {
    pub is_running: bool,
    pub is_paused: bool,
    pub elapsed_ms: u64,
    pub level_duration_ms: u64,
    pub time_remaining_ms: u64,
    pub time_remaining_secs: u64,
    pub level_started_at: Option<DateTime<Utc>>,
}

/// A blind level annotated for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LevelView {
    #[serde(flatten)]
    pub blind: BlindLevel,
    /// 1-based level number.
    pub number: usize,
    pub is_current: bool,
}

impl LevelView {
    fn of(blind: &BlindLevel, current_level: usize) -> Self {
        Self {
            blind: blind.clone(),
            number: blind.number(),
            is_current: blind.index == current_level,
        }
    }
}

/// Derives the display payload from a record, its clock (if any) and `now`.
///
/// Pure: `now` is the only notion of time used. A missing clock reads as zero
/// elapsed time. A zero `time_remaining_ms` does not advance the level; only an
/// explicit `next_level` does.
pub fn project(
    tournament: &TournamentRecord,
    clock: Option<&ClockState>,
    now: DateTime<Utc>,
) -> DisplayPayload {
    let structure = &tournament.blind_structure;
    let current_level = tournament.current_level;
    let current = structure.get(current_level);

    let elapsed_ms = clock.map_or(0, |clock| clock.elapsed_ms(now));
    let level_duration_ms = current.map_or(0, BlindLevel::duration_ms);
    let time_remaining_ms = level_duration_ms.saturating_sub(elapsed_ms);

    DisplayPayload {
        tournament: TournamentSummary {
            id: tournament.id.clone(),
            name: tournament.name.clone(),
            status: tournament.status,
            current_level,
            current_entries: tournament.current_entries,
            players_remaining: tournament.players_remaining,
            average_stack: tournament.average_stack,
            total_chips_in_play: tournament.total_chips_in_play,
        },
        clock: ClockView {
            is_running: clock.is_some_and(|clock| clock.is_running),
            is_paused: tournament.status == TournamentStatus::Paused,
            elapsed_ms,
            level_duration_ms,
            time_remaining_ms,
            time_remaining_secs: time_remaining_ms / 1_000,
            level_started_at: clock.map(|clock| clock.level_started_at),
        },
        current_blind: current.map(|blind| LevelView::of(blind, current_level)),
        next_blind: current_level
            .checked_add(1)
            .and_then(|next| structure.get(next))
            .map(|blind| LevelView::of(blind, current_level)),
        blind_structure: structure
            .iter()
            .map(|blind| LevelView::of(blind, current_level))
            .collect(),
    }
}
