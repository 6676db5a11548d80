//! The authorization collaborator consulted before any clock action.
//!
//! The engine never re-checks permissions; the action surfaces ask a
//! `StaffAuthorizer` first and only call `ClockEngine::apply` on success.

use crate::common::{StaffId, VenueId};
use crate::tournament::TournamentRecord;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};

/// An authenticated staff member and the venues they work at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaffMember {
    pub staff_id: StaffId,
    pub venues: HashSet<VenueId>,
}

pub trait StaffAuthorizer: Send + Sync {
    /// Resolves a bearer token to a staff member.
    fn authenticate(&self, token: &str) -> Option<StaffMember>;

    /// Whether `staff` may perform venue-staff actions on `tournament`.
    fn may_operate(&self, staff: &StaffMember, tournament: &TournamentRecord) -> bool {
        staff.venues.contains(&tournament.venue_id)
    }
}

/// One `[[staff]]` entry of the configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StaffEntry {
    pub token: String,
    pub staff_id: StaffId,
    #[serde(default)]
    pub venues: Vec<VenueId>,
}

/// A fixed token → staff directory, loaded from configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticStaffDirectory {
    by_token: HashMap<String, StaffMember>,
}

impl StaticStaffDirectory {
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = &'a StaffEntry>) -> Self {
        let by_token = entries
            .into_iter()
            .map(|entry| {
                let member = StaffMember {
                    staff_id: entry.staff_id.clone(),
                    venues: entry.venues.iter().cloned().collect(),
                };
                (entry.token.clone(), member)
            })
            .collect();
        Self { by_token }
    }

    pub fn len(&self) -> usize {
        self.by_token.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_token.is_empty()
    }
}

impl StaffAuthorizer for StaticStaffDirectory {
    fn authenticate(&self, token: &str) -> Option<StaffMember> {
        self.by_token.get(token).cloned()
    }
}
