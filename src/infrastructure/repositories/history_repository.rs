use crate::domain::history::{HistoryEntry, HistoryQuery};
use crate::error::AppResult;
use async_trait::async_trait;
use uuid::Uuid;

/// Durable record store for completed conversions.
///
/// Implementations must agree on search semantics: case-insensitive
/// substring match over preview, filename and full text, inclusive date
/// bounds, newest first.
#[async_trait]
pub trait HistoryRepository: Send + Sync {
    async fn insert(&self, entry: &HistoryEntry) -> AppResult<()>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<HistoryEntry>>;

    async fn search(&self, query: &HistoryQuery) -> AppResult<Vec<HistoryEntry>>;

    /// Every entry, oldest first. Used to pick eviction victims.
    async fn find_oldest_first(&self) -> AppResult<Vec<HistoryEntry>>;

    /// Returns false when no record had that id
    async fn delete(&self, id: Uuid) -> AppResult<bool>;
}
