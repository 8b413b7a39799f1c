use super::history_repository::HistoryRepository;
use crate::domain::history::{HistoryEntry, HistoryQuery};
use crate::error::AppResult;
use crate::infrastructure::db::DbPool;
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

pub struct PgHistoryRepository {
    pool: Arc<DbPool>,
}

impl PgHistoryRepository {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }
}

/// Escape LIKE wildcards so user input is matched literally
fn like_pattern(text: &str) -> String {
    let escaped = text
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

#[async_trait]
impl HistoryRepository for PgHistoryRepository {
    async fn insert(&self, entry: &HistoryEntry) -> AppResult<()> {
        let pool = self.pool.as_ref();
        sqlx::query(
            r#"
            INSERT INTO conversions (
                id, created_at, input_type, original_filename, content_preview,
                content_length, voice, speed, audio_path, audio_duration,
                audio_size, full_text
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(entry.id)
        .bind(entry.created_at)
        .bind(entry.input_type)
        .bind(&entry.original_filename)
        .bind(&entry.content_preview)
        .bind(entry.content_length)
        .bind(&entry.voice)
        .bind(entry.speed)
        .bind(&entry.audio_path)
        .bind(entry.audio_duration)
        .bind(entry.audio_size)
        .bind(&entry.full_text)
        .execute(pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<HistoryEntry>> {
        let pool = self.pool.as_ref();
        let entry = sqlx::query_as::<_, HistoryEntry>(
            r#"
            SELECT id, created_at, input_type, original_filename, content_preview,
                   content_length, voice, speed, audio_path, audio_duration,
                   audio_size, full_text
            FROM conversions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(entry)
    }

    async fn search(&self, query: &HistoryQuery) -> AppResult<Vec<HistoryEntry>> {
        let pool = self.pool.as_ref();
        let pattern = query.text.as_deref().map(like_pattern);

        let entries = sqlx::query_as::<_, HistoryEntry>(
            r#"
            SELECT id, created_at, input_type, original_filename, content_preview,
                   content_length, voice, speed, audio_path, audio_duration,
                   audio_size, full_text
            FROM conversions
            WHERE ($1::text IS NULL
                   OR content_preview ILIKE $1
                   OR original_filename ILIKE $1
                   OR full_text ILIKE $1)
              AND ($2::timestamptz IS NULL OR created_at >= $2)
              AND ($3::timestamptz IS NULL OR created_at <= $3)
            ORDER BY created_at DESC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(pattern)
        .bind(query.from)
        .bind(query.to)
        .bind(query.limit)
        .bind(query.offset)
        .fetch_all(pool)
        .await?;

        Ok(entries)
    }

    async fn find_oldest_first(&self) -> AppResult<Vec<HistoryEntry>> {
        let pool = self.pool.as_ref();
        let entries = sqlx::query_as::<_, HistoryEntry>(
            r#"
            SELECT id, created_at, input_type, original_filename, content_preview,
                   content_length, voice, speed, audio_path, audio_duration,
                   audio_size, full_text
            FROM conversions
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(entries)
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let pool = self.pool.as_ref();
        let result = sqlx::query(
            r#"
            DELETE FROM conversions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
