use super::error::ConversionServiceError;
use super::job::{ConversionJob, JobSnapshot};
use super::worker::JobWorker;
use super::{ConversionRequest, ConvertRequest, DocumentUpload, JobAccepted, VoicesResponse};
use crate::domain::history::InputType;
use crate::domain::storage::StorageManager;
use crate::infrastructure::audio::AudioAssembler;
use crate::infrastructure::config::{Config, MAX_SPEED, MIN_SPEED, SPEEDS};
use crate::infrastructure::extraction::{declared_type_for, sanitize_filename, DocumentExtractor};
use crate::infrastructure::repositories::{HistoryRepository, TtsRepository};
use async_trait::async_trait;
use moka::future::Cache;
use moka::Expiry;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use uuid::Uuid;

/// Tunables of the conversion pipeline
#[derive(Debug, Clone)]
pub struct ConversionSettings {
    pub chunk_size: usize,
    pub max_concurrent_jobs: usize,
    pub synthesis_concurrency: usize,
    pub max_attempts: u32,
    pub retry_delay: Duration,
    pub quota_bytes: u64,
    pub job_retention: Duration,
    pub large_input_warning: usize,
    pub voices: Vec<String>,
    pub default_voice: String,
    pub default_speed: f32,
}

impl ConversionSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            chunk_size: config.chunk_size,
            max_concurrent_jobs: config.max_concurrent_jobs,
            synthesis_concurrency: config.synthesis_concurrency,
            max_attempts: config.synthesis_max_attempts,
            retry_delay: Duration::from_millis(config.synthesis_retry_delay_ms),
            quota_bytes: config.quota_bytes(),
            job_retention: Duration::from_secs(config.job_retention_secs),
            large_input_warning: config.large_input_warning,
            voices: config.voices.clone(),
            default_voice: config.default_voice.clone(),
            default_speed: config.default_speed,
        }
    }
}

/// Jobs never expire while running; the retention window starts once the
/// worker hands back a terminal job
struct JobExpiry {
    retention: Duration,
}

impl JobExpiry {
    fn ttl(&self, job: &ConversionJob) -> Option<Duration> {
        job.status().is_terminal().then_some(self.retention)
    }
}

impl Expiry<Uuid, Arc<ConversionJob>> for JobExpiry {
    fn expire_after_create(
        &self,
        _job_id: &Uuid,
        job: &Arc<ConversionJob>,
        _created_at: Instant,
    ) -> Option<Duration> {
        self.ttl(job)
    }

    fn expire_after_update(
        &self,
        _job_id: &Uuid,
        job: &Arc<ConversionJob>,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        self.ttl(job)
    }
}

pub struct ConversionService {
    worker: Arc<JobWorker>,
    extractor: Arc<dyn DocumentExtractor>,
    jobs: Cache<Uuid, Arc<ConversionJob>>,
    settings: ConversionSettings,
}

impl ConversionService {
    pub fn new(
        tts_repo: Arc<dyn TtsRepository>,
        history_repo: Arc<dyn HistoryRepository>,
        storage: Arc<StorageManager>,
        assembler: Arc<dyn AudioAssembler>,
        extractor: Arc<dyn DocumentExtractor>,
        settings: ConversionSettings,
    ) -> Self {
        let jobs = Cache::builder()
            .expire_after(JobExpiry {
                retention: settings.job_retention,
            })
            .build();

        let worker = Arc::new(JobWorker {
            tts_repo,
            assembler,
            storage,
            history_repo,
            admission: Arc::new(Semaphore::new(settings.max_concurrent_jobs.max(1))),
            settings: settings.clone(),
        });

        Self {
            worker,
            extractor,
            jobs,
            settings,
        }
    }
}

#[async_trait]
pub trait ConversionServiceApi: Send + Sync {
    /// Start converting pasted text
    async fn convert_text(&self, request: ConvertRequest)
        -> Result<JobAccepted, ConversionServiceError>;

    /// Extract text from an uploaded document and start converting it
    async fn convert_upload(
        &self,
        upload: DocumentUpload,
    ) -> Result<JobAccepted, ConversionServiceError>;

    /// Register a validated request and hand it to a background worker
    async fn start_job(
        &self,
        request: ConversionRequest,
    ) -> Result<JobAccepted, ConversionServiceError>;

    async fn get_status(&self, job_id: Uuid) -> Result<JobSnapshot, ConversionServiceError>;

    /// Stop a job. Finished jobs are returned unchanged.
    async fn cancel_job(&self, job_id: Uuid) -> Result<JobSnapshot, ConversionServiceError>;

    fn voices(&self) -> VoicesResponse;
}

#[async_trait]
impl ConversionServiceApi for ConversionService {
    async fn convert_text(
        &self,
        request: ConvertRequest,
    ) -> Result<JobAccepted, ConversionServiceError> {
        let request = self.validate(
            request.text,
            request.voice,
            request.speed,
            None,
            InputType::Paste,
        )?;
        self.start_job(request).await
    }

    async fn convert_upload(
        &self,
        upload: DocumentUpload,
    ) -> Result<JobAccepted, ConversionServiceError> {
        let declared_type =
            declared_type_for(upload.filename.as_deref(), upload.content_type.as_deref());
        let size = upload.bytes.len();

        let extractor = self.extractor.clone();
        let bytes = upload.bytes;
        let kind = declared_type.clone();
        let text = tokio::task::spawn_blocking(move || extractor.extract(&bytes, &kind))
            .await
            .map_err(|e| ConversionServiceError::Dependency(e.to_string()))??;

        tracing::info!(
            filename = ?upload.filename,
            declared_type = %declared_type,
            bytes = size,
            "Document extracted"
        );

        let filename = upload.filename.as_deref().and_then(sanitize_filename);
        let request = self.validate(
            text,
            upload.voice,
            upload.speed,
            filename,
            InputType::Upload,
        )?;
        self.start_job(request).await
    }

    async fn start_job(
        &self,
        request: ConversionRequest,
    ) -> Result<JobAccepted, ConversionServiceError> {
        let content_length = request.text.chars().count();
        let warning = (content_length > self.settings.large_input_warning).then(|| {
            format!(
                "Large input ({} characters); conversion may take several minutes",
                content_length
            )
        });

        let job = Arc::new(ConversionJob::new());
        let job_id = job.id();
        self.jobs.insert(job_id, job.clone()).await;

        tracing::info!(
            job_id = %job_id,
            input_type = %request.input_type,
            content_length,
            "Job accepted"
        );

        let worker = self.worker.clone();
        let jobs = self.jobs.clone();
        tokio::spawn(async move {
            worker.run(job.clone(), request).await;
            // Re-inserting a terminal job starts its retention window
            jobs.insert(job_id, job).await;
        });

        Ok(JobAccepted {
            job_id,
            content_length,
            warning,
        })
    }

    async fn get_status(&self, job_id: Uuid) -> Result<JobSnapshot, ConversionServiceError> {
        Ok(self.find_job(job_id).await?.snapshot())
    }

    async fn cancel_job(&self, job_id: Uuid) -> Result<JobSnapshot, ConversionServiceError> {
        let job = self.find_job(job_id).await?;
        if job.cancel() {
            tracing::info!(job_id = %job_id, "Job cancellation requested");
        }
        Ok(job.snapshot())
    }

    fn voices(&self) -> VoicesResponse {
        VoicesResponse {
            voices: self.settings.voices.clone(),
            speeds: SPEEDS.to_vec(),
            default_voice: self.settings.default_voice.clone(),
            default_speed: self.settings.default_speed,
        }
    }
}

impl ConversionService {
    async fn find_job(&self, job_id: Uuid) -> Result<Arc<ConversionJob>, ConversionServiceError> {
        self.jobs
            .get(&job_id)
            .await
            .ok_or(ConversionServiceError::NotFound)
    }

    fn validate(
        &self,
        text: String,
        voice: Option<String>,
        speed: Option<f32>,
        original_filename: Option<String>,
        input_type: InputType,
    ) -> Result<ConversionRequest, ConversionServiceError> {
        if text.trim().is_empty() {
            return Err(ConversionServiceError::Validation(
                "No text provided".to_string(),
            ));
        }

        let voice = voice
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| self.settings.default_voice.clone());
        if !self.settings.voices.is_empty() && !self.settings.voices.contains(&voice) {
            return Err(ConversionServiceError::Validation(format!(
                "Unknown voice: {}",
                voice
            )));
        }

        let speed = speed.unwrap_or(self.settings.default_speed);
        if !speed.is_finite() || !(MIN_SPEED..=MAX_SPEED).contains(&speed) {
            return Err(ConversionServiceError::Validation(format!(
                "Speed must be between {} and {}",
                MIN_SPEED, MAX_SPEED
            )));
        }

        Ok(ConversionRequest {
            text,
            voice,
            speed,
            original_filename,
            input_type,
        })
    }
}
