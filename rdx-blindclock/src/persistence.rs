//! The persistence collaborator that owns `TournamentRecord`s.
//!
//! The engine only needs two calls: read a record, and write a partial update.
//! Production deployments put a managed database behind this trait; the crate
//! ships an in-memory implementation used by the binaries and tests.

use crate::common::TournamentId;
use crate::tournament::{TournamentRecord, TournamentUpdate};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("tournament {0} not found")]
    NotFound(TournamentId),
    #[error("tournament store unavailable: {0}")]
    Unavailable(String),
}

/// Read/write access to tournament records.
///
/// Implementations must give the calling process read-your-writes consistency.
#[async_trait]
pub trait TournamentRepository: Send + Sync {
    async fn read_tournament(&self, id: &TournamentId) -> Result<TournamentRecord, RepositoryError>;

    /// Applies `update` and returns the record as stored afterwards.
    async fn write_tournament(
        &self,
        id: &TournamentId,
        update: TournamentUpdate,
    ) -> Result<TournamentRecord, RepositoryError>;

    /// All known records, ordered by id.
    async fn list_tournaments(&self) -> Result<Vec<TournamentRecord>, RepositoryError>;
}

/// A process-local repository backed by a map.
#[derive(Clone, Default)]
pub struct InMemoryTournaments {
    records: Arc<RwLock<HashMap<TournamentId, TournamentRecord>>>,
}

impl InMemoryTournaments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: impl IntoIterator<Item = TournamentRecord>) -> Self {
        let records = records
            .into_iter()
            .map(|record| (record.id.clone(), record))
            .collect();
        Self {
            records: Arc::new(RwLock::new(records)),
        }
    }
}

#[async_trait]
impl TournamentRepository for InMemoryTournaments {
    async fn read_tournament(&self, id: &TournamentId) -> Result<TournamentRecord, RepositoryError> {
        self.records
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(id.clone()))
    }

    async fn write_tournament(
        &self,
        id: &TournamentId,
        update: TournamentUpdate,
    ) -> Result<TournamentRecord, RepositoryError> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(id)
            .ok_or_else(|| RepositoryError::NotFound(id.clone()))?;
        record.apply_update(&update);
        Ok(record.clone())
    }

    async fn list_tournaments(&self) -> Result<Vec<TournamentRecord>, RepositoryError> {
        let mut records: Vec<_> = self.records.read().await.values().cloned().collect();
        records.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(records)
    }
}
