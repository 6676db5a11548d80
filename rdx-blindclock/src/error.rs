//! Error types returned by the clock engine.

use crate::common::TournamentId;
use crate::persistence::RepositoryError;
use crate::tournament::TournamentStatus;
use thiserror::Error;

/// Why a requested action is not legal in the tournament's current state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("tournament is already running")]
    AlreadyRunning,
    #[error("tournament has no blind structure configured")]
    EmptyStructure,
    #[error("tournament is not running (status: {0})")]
    NotRunning(TournamentStatus),
    #[error("tournament is not paused (status: {0})")]
    NotPaused(TournamentStatus),
    #[error("tournament is not active (status: {0})")]
    NotActive(TournamentStatus),
    #[error("no more levels in structure (level {current} is the last)")]
    NoMoreLevels { current: usize },
    #[error("level {level} is out of range (structure has {levels} levels)")]
    LevelOutOfRange { level: usize, levels: usize },
    #[error("tournament cannot be ended (status: {0})")]
    CannotEnd(TournamentStatus),
}

#[derive(Debug, Error)]
pub enum ClockError {
    #[error("tournament {0} not found")]
    NotFound(TournamentId),
    #[error("invalid transition: {0}")]
    InvalidTransition(#[from] Rejection),
    #[error("persistence failure: {0}")]
    Persistence(String),
}

impl ClockError {
    pub fn is_rejection(&self) -> bool {
        matches!(self, ClockError::InvalidTransition(_))
    }
}

impl From<RepositoryError> for ClockError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(id) => ClockError::NotFound(id),
            RepositoryError::Unavailable(message) => ClockError::Persistence(message),
        }
    }
}
