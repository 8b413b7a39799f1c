use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Characters of normalized text kept as the listing preview
pub const PREVIEW_CHARS: usize = 200;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub input_type: InputType,
    pub original_filename: Option<String>,
    pub content_preview: String,
    pub content_length: i32,
    pub voice: String,
    pub speed: f32,
    pub audio_path: String,
    pub audio_duration: Option<f64>,
    pub audio_size: i64,
    pub full_text: String,
}

impl HistoryEntry {
    pub fn preview_of(text: &str) -> String {
        text.chars().take(PREVIEW_CHARS).collect()
    }

    /// Filename when uploaded, otherwise the start of the text
    pub fn title(&self) -> &str {
        self.original_filename
            .as_deref()
            .unwrap_or(&self.content_preview)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "text")]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    Paste,
    Upload,
}

impl std::fmt::Display for InputType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputType::Paste => write!(f, "paste"),
            InputType::Upload => write!(f, "upload"),
        }
    }
}

/// Filters for a history page. `text` matches preview, filename and full text.
#[derive(Debug, Clone, Default)]
pub struct HistoryQuery {
    pub text: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub limit: i64,
    pub offset: i64,
}

impl HistoryQuery {
    /// In-process equivalent of the SQL filter
    pub fn matches(&self, entry: &HistoryEntry) -> bool {
        if let Some(from) = self.from {
            if entry.created_at < from {
                return false;
            }
        }
        if let Some(to) = self.to {
            if entry.created_at > to {
                return false;
            }
        }

        match self.text.as_deref() {
            None => true,
            Some(needle) => {
                let needle = needle.to_lowercase();
                entry.content_preview.to_lowercase().contains(&needle)
                    || entry.full_text.to_lowercase().contains(&needle)
                    || entry
                        .original_filename
                        .as_deref()
                        .is_some_and(|name| name.to_lowercase().contains(&needle))
            }
        }
    }
}
