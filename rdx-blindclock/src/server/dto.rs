use serde::Serialize;

use crate::common::{TournamentId, VenueId};
use crate::tournament::{TournamentRecord, TournamentStatus};

/// Envelope of every successful response.
#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            message: None,
        }
    }

    pub fn with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data,
            message: Some(message.into()),
        }
    }
}

#[derive(Serialize)]
pub struct TournamentListing {
    pub id: TournamentId,
    pub venue_id: VenueId,
    pub name: String,
    pub status: TournamentStatus,
    pub current_level: usize,
    pub levels: usize,
}

impl From<&TournamentRecord> for TournamentListing {
    fn from(record: &TournamentRecord) -> Self {
        Self {
            id: record.id.clone(),
            venue_id: record.venue_id.clone(),
            name: record.name.clone(),
            status: record.status,
            current_level: record.current_level,
            levels: record.blind_structure.len(),
        }
    }
}
