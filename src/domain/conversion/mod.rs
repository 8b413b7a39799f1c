pub mod error;
pub mod job;
pub mod service;
pub mod worker;

pub use error::ConversionServiceError;
pub use job::{ConversionJob, FailureKind, JobFailure, JobSnapshot, JobStatus};
pub use service::{ConversionService, ConversionServiceApi, ConversionSettings};

use crate::domain::history::InputType;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request for POST /api/convert
#[derive(Debug, Serialize, Deserialize)]
pub struct ConvertRequest {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<f32>,
}

/// Fields of a POST /api/convert/upload form
#[derive(Debug, Default)]
pub struct DocumentUpload {
    pub bytes: Vec<u8>,
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub voice: Option<String>,
    pub speed: Option<f32>,
}

/// A validated conversion, ready to hand to a worker
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    pub text: String,
    pub voice: String,
    pub speed: f32,
    pub original_filename: Option<String>,
    pub input_type: InputType,
}

/// Response for a started conversion
#[derive(Debug, Serialize, Deserialize)]
pub struct JobAccepted {
    pub job_id: Uuid,
    /// Characters of raw input
    pub content_length: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Response for GET /api/voices
#[derive(Debug, Serialize, Deserialize)]
pub struct VoicesResponse {
    pub voices: Vec<String>,
    pub speeds: Vec<f32>,
    pub default_voice: String,
    pub default_speed: f32,
}
