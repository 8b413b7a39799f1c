pub mod error;
pub mod model;
pub mod service;

pub use error::HistoryServiceError;
pub use model::{HistoryEntry, HistoryQuery, InputType};
pub use service::{HistoryService, HistoryServiceApi, PAGE_SIZE};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub fn audio_url(id: Uuid) -> String {
    format!("/api/audio/{}", id)
}

/// Query string of GET /api/history
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct HistoryParams {
    pub q: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub page: Option<u32>,
}

/// One row of the history listing
#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryItem {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub input_type: InputType,
    pub title: String,
    pub content_preview: String,
    pub content_length: i32,
    pub voice: String,
    pub speed: f32,
    pub audio_duration: Option<f64>,
    pub audio_size: i64,
    pub audio_url: String,
}

impl From<&HistoryEntry> for HistoryItem {
    fn from(entry: &HistoryEntry) -> Self {
        Self {
            id: entry.id,
            created_at: entry.created_at,
            input_type: entry.input_type,
            title: entry.title().to_string(),
            content_preview: entry.content_preview.clone(),
            content_length: entry.content_length,
            voice: entry.voice.clone(),
            speed: entry.speed,
            audio_duration: entry.audio_duration,
            audio_size: entry.audio_size,
            audio_url: audio_url(entry.id),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryPage {
    pub items: Vec<HistoryItem>,
    pub page: u32,
    pub per_page: u32,
    pub has_more: bool,
}

/// Response for GET /api/history/{id}
#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryDetail {
    #[serde(flatten)]
    pub item: HistoryItem,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_filename: Option<String>,
    pub full_text: String,
}

impl From<HistoryEntry> for HistoryDetail {
    fn from(entry: HistoryEntry) -> Self {
        Self {
            item: HistoryItem::from(&entry),
            original_filename: entry.original_filename,
            full_text: entry.full_text,
        }
    }
}

/// Response for GET /api/result/{id}
#[derive(Debug, Serialize, Deserialize)]
pub struct ResultResponse {
    pub id: Uuid,
    pub audio_url: String,
    pub audio_duration: Option<f64>,
    pub audio_size: i64,
    pub created_at: DateTime<Utc>,
}

impl From<HistoryEntry> for ResultResponse {
    fn from(entry: HistoryEntry) -> Self {
        Self {
            id: entry.id,
            audio_url: audio_url(entry.id),
            audio_duration: entry.audio_duration,
            audio_size: entry.audio_size,
            created_at: entry.created_at,
        }
    }
}

/// Audio body plus the name offered for download
#[derive(Debug)]
pub struct AudioFile {
    pub bytes: Vec<u8>,
    pub download_name: String,
}
