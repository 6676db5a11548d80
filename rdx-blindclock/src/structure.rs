//! Defines the blind structure a tournament plays through.
//!
//! A `BlindStructure` is validated once, when it is built or deserialized, and
//! is never mutated by the engine afterwards.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Milliseconds in one minute, used to turn level durations into clock time.
pub const MS_PER_MINUTE: u64 = 60_000;

/// A single row of a tournament's schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlindLevel {
    /// Position of the level in its structure, starting at 0.
    pub index: usize,
    pub small_blind: u64,
    pub big_blind: u64,
    #[serde(default)]
    pub ante: u64,
    /// Length of the level in minutes. Always greater than zero.
    pub duration_minutes: u32,
    #[serde(default)]
    pub is_break: bool,
}

impl BlindLevel {
    /// The level length expressed in milliseconds.
    pub fn duration_ms(&self) -> u64 {
        u64::from(self.duration_minutes) * MS_PER_MINUTE
    }

    /// The 1-based level number shown to players.
    pub fn number(&self) -> usize {
        self.index + 1
    }
}

/// Reasons a list of levels cannot form a `BlindStructure`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructureError {
    #[error("level at position {position} has index {found}, expected {position}")]
    NonContiguousIndex { position: usize, found: usize },
    #[error("level {index} must have small_blind > 0 and big_blind >= small_blind")]
    InvalidBlinds { index: usize },
    #[error("level {index} must have a duration greater than zero")]
    ZeroDuration { index: usize },
}

/// An immutable, ordered sequence of levels with indices contiguous from 0.
///
/// An empty structure is representable (tournaments may be created before
/// their structure is configured) but the engine refuses to start one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<BlindLevel>", into = "Vec<BlindLevel>")]
pub struct BlindStructure {
    levels: Vec<BlindLevel>,
}

impl BlindStructure {
    /// Validates `levels` and wraps them into a structure.
    pub fn new(levels: Vec<BlindLevel>) -> Result<Self, StructureError> {
        for (position, level) in levels.iter().enumerate() {
            if level.index != position {
                return Err(StructureError::NonContiguousIndex {
                    position,
                    found: level.index,
                });
            }
            // Breaks are allowed to carry zero blinds.
            if !level.is_break && (level.small_blind == 0 || level.big_blind < level.small_blind)
            {
                return Err(StructureError::InvalidBlinds { index: level.index });
            }
            if level.duration_minutes == 0 {
                return Err(StructureError::ZeroDuration { index: level.index });
            }
        }
        Ok(Self { levels })
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&BlindLevel> {
        self.levels.get(index)
    }

    /// Whether `index` addresses a level of this structure.
    pub fn contains(&self, index: usize) -> bool {
        index < self.levels.len()
    }

    /// The highest valid level index, or `None` for an empty structure.
    pub fn last_index(&self) -> Option<usize> {
        self.levels.len().checked_sub(1)
    }

    pub fn iter(&self) -> impl Iterator<Item = &BlindLevel> {
        self.levels.iter()
    }
}

impl TryFrom<Vec<BlindLevel>> for BlindStructure {
    type Error = StructureError;

    fn try_from(levels: Vec<BlindLevel>) -> Result<Self, Self::Error> {
        Self::new(levels)
    }
}

impl From<BlindStructure> for Vec<BlindLevel> {
    fn from(structure: BlindStructure) -> Self {
        structure.levels
    }
}
