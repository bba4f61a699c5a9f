use async_trait::async_trait;
use thiserror::Error;

use casevalue_core::domain::case::{CaseId, HistoricalCase};

pub mod historical_case;
pub mod memory;

pub use historical_case::SqlHistoricalCaseRepository;
pub use memory::InMemoryHistoricalCaseRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

/// Bulk-read access to the corpus of resolved claims.
///
/// The valuation engine only ever calls [`list_all`](Self::list_all); writes exist
/// for seeding and imports.
#[async_trait]
pub trait HistoricalCaseRepository: Send + Sync {
    async fn list_all(&self) -> Result<Vec<HistoricalCase>, RepositoryError>;
    async fn find_by_id(&self, id: &CaseId) -> Result<Option<HistoricalCase>, RepositoryError>;
    async fn save(&self, case: HistoricalCase) -> Result<(), RepositoryError>;
    async fn count(&self) -> Result<u64, RepositoryError>;
}
