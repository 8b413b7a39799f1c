use super::history_repository::HistoryRepository;
use crate::domain::history::{HistoryEntry, HistoryQuery};
use crate::error::AppResult;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

/// History kept in process memory, lost on restart
#[derive(Default)]
pub struct InMemoryHistoryRepository {
    entries: RwLock<HashMap<Uuid, HistoryEntry>>,
}

impl InMemoryHistoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn sorted_by_age(&self, newest_first: bool) -> Vec<HistoryEntry> {
        let mut entries: Vec<HistoryEntry> = self.entries.read().values().cloned().collect();
        entries.sort_by_key(|entry| (entry.created_at, entry.id));
        if newest_first {
            entries.reverse();
        }
        entries
    }
}

#[async_trait]
impl HistoryRepository for InMemoryHistoryRepository {
    async fn insert(&self, entry: &HistoryEntry) -> AppResult<()> {
        self.entries.write().insert(entry.id, entry.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<HistoryEntry>> {
        Ok(self.entries.read().get(&id).cloned())
    }

    async fn search(&self, query: &HistoryQuery) -> AppResult<Vec<HistoryEntry>> {
        let entries = self
            .sorted_by_age(true)
            .into_iter()
            .filter(|entry| query.matches(entry))
            .skip(query.offset.max(0) as usize)
            .take(query.limit.max(0) as usize)
            .collect();

        Ok(entries)
    }

    async fn find_oldest_first(&self) -> AppResult<Vec<HistoryEntry>> {
        Ok(self.sorted_by_age(false))
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.entries.write().remove(&id).is_some())
    }
}
