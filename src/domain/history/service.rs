use super::error::HistoryServiceError;
use super::{
    AudioFile, HistoryDetail, HistoryEntry, HistoryItem, HistoryPage, HistoryParams, HistoryQuery,
    ResultResponse,
};
use crate::domain::storage::StorageManager;
use crate::infrastructure::repositories::HistoryRepository;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

pub const PAGE_SIZE: u32 = 20;

pub struct HistoryService {
    history_repo: Arc<dyn HistoryRepository>,
    storage: Arc<StorageManager>,
}

impl HistoryService {
    pub fn new(history_repo: Arc<dyn HistoryRepository>, storage: Arc<StorageManager>) -> Self {
        Self {
            history_repo,
            storage,
        }
    }
}

#[async_trait]
pub trait HistoryServiceApi: Send + Sync {
    /// Newest first, filtered by free text and an inclusive date range
    async fn list(&self, params: HistoryParams) -> Result<HistoryPage, HistoryServiceError>;

    async fn get(&self, id: Uuid) -> Result<HistoryDetail, HistoryServiceError>;

    async fn result(&self, id: Uuid) -> Result<ResultResponse, HistoryServiceError>;

    async fn load_audio(&self, id: Uuid) -> Result<AudioFile, HistoryServiceError>;

    /// Removes the audio file first; the record survives if that fails
    async fn delete(&self, id: Uuid) -> Result<(), HistoryServiceError>;
}

#[async_trait]
impl HistoryServiceApi for HistoryService {
    async fn list(&self, params: HistoryParams) -> Result<HistoryPage, HistoryServiceError> {
        let page = params.page.unwrap_or(1).max(1);
        let query = HistoryQuery {
            text: params
                .q
                .map(|q| q.trim().to_string())
                .filter(|q| !q.is_empty()),
            from: parse_date_bound(params.from.as_deref(), false)?,
            to: parse_date_bound(params.to.as_deref(), true)?,
            // One extra row tells whether another page exists
            limit: PAGE_SIZE as i64 + 1,
            offset: (page as i64 - 1) * PAGE_SIZE as i64,
        };

        let mut entries = self
            .history_repo
            .search(&query)
            .await
            .map_err(|e| HistoryServiceError::Dependency(e.to_string()))?;

        let has_more = entries.len() > PAGE_SIZE as usize;
        entries.truncate(PAGE_SIZE as usize);

        Ok(HistoryPage {
            items: entries.iter().map(HistoryItem::from).collect(),
            page,
            per_page: PAGE_SIZE,
            has_more,
        })
    }

    async fn get(&self, id: Uuid) -> Result<HistoryDetail, HistoryServiceError> {
        Ok(self.find_entry(id).await?.into())
    }

    async fn result(&self, id: Uuid) -> Result<ResultResponse, HistoryServiceError> {
        Ok(self.find_entry(id).await?.into())
    }

    async fn load_audio(&self, id: Uuid) -> Result<AudioFile, HistoryServiceError> {
        let entry = self.find_entry(id).await?;
        let bytes = self.storage.read_artifact(&entry).await?;

        Ok(AudioFile {
            bytes,
            download_name: download_name(&entry),
        })
    }

    async fn delete(&self, id: Uuid) -> Result<(), HistoryServiceError> {
        let entry = self.find_entry(id).await?;
        self.storage.delete_entry(&entry).await?;

        tracing::info!(entry_id = %id, "Conversion deleted");
        Ok(())
    }
}

impl HistoryService {
    async fn find_entry(&self, id: Uuid) -> Result<HistoryEntry, HistoryServiceError> {
        self.history_repo
            .find_by_id(id)
            .await
            .map_err(|e| HistoryServiceError::Dependency(e.to_string()))?
            .ok_or(HistoryServiceError::NotFound)
    }
}

/// Accepts RFC 3339 or `YYYY-MM-DD`. A bare date used as an upper bound
/// covers the whole day.
fn parse_date_bound(
    raw: Option<&str>,
    end_of_day: bool,
) -> Result<Option<DateTime<Utc>>, HistoryServiceError> {
    let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return Ok(None);
    };

    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(timestamp.with_timezone(&Utc)));
    }

    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| HistoryServiceError::Invalid(format!("Invalid date: {}", raw)))?;
    let time = if end_of_day {
        date.and_hms_micro_opt(23, 59, 59, 999_999)
    } else {
        date.and_hms_opt(0, 0, 0)
    };

    time.map(|naive| Some(naive.and_utc()))
        .ok_or_else(|| HistoryServiceError::Invalid(format!("Invalid date: {}", raw)))
}

fn download_name(entry: &HistoryEntry) -> String {
    let stem = entry
        .original_filename
        .as_deref()
        .and_then(|name| Path::new(name).file_stem())
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty());

    match stem {
        Some(stem) => format!("{}.mp3", stem),
        None => format!("tinytts-{}.mp3", entry.created_at.format("%Y%m%d-%H%M%S")),
    }
}
