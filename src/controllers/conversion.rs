use axum::{
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::conversion::{
    ConvertRequest, DocumentUpload, JobAccepted, JobSnapshot, VoicesResponse,
};
use crate::{
    domain::conversion::{ConversionService, ConversionServiceApi},
    error::{AppError, AppResult},
};

pub struct ConversionController {
    conversion_service: Arc<ConversionService>,
}

impl ConversionController {
    pub fn new(conversion_service: Arc<ConversionService>) -> Self {
        Self { conversion_service }
    }

    /// GET /api/voices - Voices and speeds offered to clients
    pub async fn voices(
        State(controller): State<Arc<ConversionController>>,
    ) -> Json<VoicesResponse> {
        Json(controller.conversion_service.voices())
    }

    /// POST /api/convert - Start converting pasted text
    pub async fn convert(
        State(controller): State<Arc<ConversionController>>,
        Json(request): Json<ConvertRequest>,
    ) -> AppResult<(StatusCode, Json<JobAccepted>)> {
        let accepted = controller.conversion_service.convert_text(request).await?;
        Ok((StatusCode::ACCEPTED, Json(accepted)))
    }

    /// POST /api/convert/upload - Start converting an uploaded document
    ///
    /// Multipart fields: `file` (required), `voice`, `speed`
    pub async fn convert_upload(
        State(controller): State<Arc<ConversionController>>,
        mut multipart: Multipart,
    ) -> AppResult<(StatusCode, Json<JobAccepted>)> {
        let mut upload = DocumentUpload::default();
        let mut has_file = false;

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            match field.name() {
                Some("file") => {
                    upload.filename = field.file_name().map(str::to_string);
                    upload.content_type = field.content_type().map(str::to_string);
                    upload.bytes = field.bytes().await.map_err(multipart_error)?.to_vec();
                    has_file = true;
                }
                Some("voice") => {
                    let voice = field.text().await.map_err(multipart_error)?;
                    upload.voice = Some(voice).filter(|v| !v.trim().is_empty());
                }
                Some("speed") => {
                    let raw = field.text().await.map_err(multipart_error)?;
                    if !raw.trim().is_empty() {
                        let speed = raw.trim().parse::<f32>().map_err(|_| {
                            AppError::BadRequest(format!("Invalid speed: {}", raw))
                        })?;
                        upload.speed = Some(speed);
                    }
                }
                _ => {}
            }
        }

        if !has_file {
            return Err(AppError::BadRequest("No file uploaded".to_string()));
        }

        let accepted = controller.conversion_service.convert_upload(upload).await?;
        Ok((StatusCode::ACCEPTED, Json(accepted)))
    }

    /// GET /api/status/{job_id} - Progress of a conversion
    pub async fn status(
        State(controller): State<Arc<ConversionController>>,
        Path(job_id): Path<Uuid>,
    ) -> AppResult<Json<JobSnapshot>> {
        let snapshot = controller.conversion_service.get_status(job_id).await?;
        Ok(Json(snapshot))
    }

    /// POST /api/cancel/{job_id} - Stop a running conversion
    pub async fn cancel(
        State(controller): State<Arc<ConversionController>>,
        Path(job_id): Path<Uuid>,
    ) -> AppResult<Json<JobSnapshot>> {
        let snapshot = controller.conversion_service.cancel_job(job_id).await?;
        Ok(Json(snapshot))
    }
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(err.body_text())
    } else {
        AppError::BadRequest(err.body_text())
    }
}
