use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::history::{HistoryDetail, HistoryPage, HistoryParams, ResultResponse};
use crate::{
    domain::history::{HistoryService, HistoryServiceApi},
    error::AppResult,
};

/// Query string of GET /api/audio/{id}
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct AudioParams {
    pub download: Option<String>,
}

impl AudioParams {
    fn wants_download(&self) -> bool {
        matches!(self.download.as_deref(), Some("1" | "true" | "yes"))
    }
}

pub struct HistoryController {
    history_service: Arc<HistoryService>,
}

impl HistoryController {
    pub fn new(history_service: Arc<HistoryService>) -> Self {
        Self { history_service }
    }

    /// GET /api/history - Past conversions, newest first
    pub async fn list(
        State(controller): State<Arc<HistoryController>>,
        Query(params): Query<HistoryParams>,
    ) -> AppResult<Json<HistoryPage>> {
        let page = controller.history_service.list(params).await?;
        Ok(Json(page))
    }

    /// GET /api/history/{id} - One conversion with its full text
    pub async fn get(
        State(controller): State<Arc<HistoryController>>,
        Path(id): Path<Uuid>,
    ) -> AppResult<Json<HistoryDetail>> {
        let detail = controller.history_service.get(id).await?;
        Ok(Json(detail))
    }

    /// DELETE /api/history/{id} - Remove a conversion and its audio
    pub async fn delete(
        State(controller): State<Arc<HistoryController>>,
        Path(id): Path<Uuid>,
    ) -> AppResult<StatusCode> {
        controller.history_service.delete(id).await?;
        Ok(StatusCode::NO_CONTENT)
    }

    /// GET /api/result/{id} - Where to fetch a finished conversion
    pub async fn result(
        State(controller): State<Arc<HistoryController>>,
        Path(id): Path<Uuid>,
    ) -> AppResult<Json<ResultResponse>> {
        let result = controller.history_service.result(id).await?;
        Ok(Json(result))
    }

    /// GET /api/audio/{id} - MP3 body, as an attachment with `?download=1`
    pub async fn audio(
        State(controller): State<Arc<HistoryController>>,
        Path(id): Path<Uuid>,
        Query(params): Query<AudioParams>,
    ) -> AppResult<(StatusCode, HeaderMap, Vec<u8>)> {
        let audio = controller.history_service.load_audio(id).await?;

        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("audio/mpeg"));

        let disposition = if params.wants_download() {
            format!("attachment; filename=\"{}\"", audio.download_name.replace('"', ""))
        } else {
            "inline".to_string()
        };
        let disposition = HeaderValue::from_str(&disposition)
            .unwrap_or_else(|_| HeaderValue::from_static("attachment"));
        headers.insert(header::CONTENT_DISPOSITION, disposition);

        Ok((StatusCode::OK, headers, audio.bytes))
    }
}
