use crate::error::AppError;
use crate::infrastructure::extraction::ExtractionError;

#[derive(Debug, thiserror::Error)]
pub enum ConversionServiceError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("job not found")]
    NotFound,
    #[error("dependency error: {0}")]
    Dependency(String),
}

impl From<ExtractionError> for ConversionServiceError {
    fn from(err: ExtractionError) -> Self {
        ConversionServiceError::Validation(err.to_string())
    }
}

impl From<AppError> for ConversionServiceError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::BadRequest(msg) => ConversionServiceError::Validation(msg),
            AppError::NotFound(_) => ConversionServiceError::NotFound,
            _ => ConversionServiceError::Dependency(err.to_string()),
        }
    }
}

impl From<ConversionServiceError> for AppError {
    fn from(err: ConversionServiceError) -> Self {
        match err {
            ConversionServiceError::Validation(msg) => AppError::BadRequest(msg),
            ConversionServiceError::NotFound => AppError::NotFound("Job not found".to_string()),
            ConversionServiceError::Dependency(msg) => AppError::Internal(msg),
        }
    }
}
