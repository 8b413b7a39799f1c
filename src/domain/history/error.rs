use crate::domain::storage::StorageError;
use crate::error::AppError;

#[derive(Debug, thiserror::Error)]
pub enum HistoryServiceError {
    #[error("dependency error: {0}")]
    Dependency(String),
    #[error("invalid input: {0}")]
    Invalid(String),
    #[error("conversion not found")]
    NotFound,
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<StorageError> for HistoryServiceError {
    fn from(err: StorageError) -> Self {
        if err.is_missing_file() {
            return HistoryServiceError::NotFound;
        }
        HistoryServiceError::Storage(err.to_string())
    }
}

impl From<AppError> for HistoryServiceError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::BadRequest(msg) => HistoryServiceError::Invalid(msg),
            AppError::NotFound(_) => HistoryServiceError::NotFound,
            AppError::Storage(msg) => HistoryServiceError::Storage(msg),
            _ => HistoryServiceError::Dependency(err.to_string()),
        }
    }
}

impl From<HistoryServiceError> for AppError {
    fn from(err: HistoryServiceError) -> Self {
        match err {
            HistoryServiceError::Invalid(msg) => AppError::BadRequest(msg),
            HistoryServiceError::NotFound => AppError::NotFound("Conversion not found".to_string()),
            HistoryServiceError::Storage(msg) => AppError::Storage(msg),
            HistoryServiceError::Dependency(msg) => AppError::Internal(msg),
        }
    }
}
