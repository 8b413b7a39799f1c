use super::job::{ConversionJob, FailureKind, JobFailure};
use super::service::ConversionSettings;
use super::ConversionRequest;
use crate::domain::chunker;
use crate::domain::history::HistoryEntry;
use crate::domain::normalizer;
use crate::domain::storage::StorageManager;
use crate::infrastructure::audio::{AssembledAudio, AudioAssembler};
use crate::infrastructure::repositories::{HistoryRepository, SynthesisError, TtsRepository};
use chrono::Utc;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use uuid::Uuid;

/// Chunks with fewer letters or digits than this are not sent for synthesis
const MIN_SPEAKABLE_CHARS: usize = 3;

/// Drives conversion jobs from raw text to a stored history entry
pub struct JobWorker {
    pub tts_repo: Arc<dyn TtsRepository>,
    pub assembler: Arc<dyn AudioAssembler>,
    pub storage: Arc<StorageManager>,
    pub history_repo: Arc<dyn HistoryRepository>,
    pub admission: Arc<Semaphore>,
    pub settings: ConversionSettings,
}

/// Normalized text and the chunks that will be synthesized
struct PreparedText {
    text: String,
    chunks: Vec<String>,
}

impl JobWorker {
    /// Run one job to a terminal state.
    ///
    /// Waits for an admission slot while pending. Cancellation is honoured
    /// while waiting and during synthesis. Once audio is assembled the job
    /// refuses cancellation and finishes its storage work, so a history
    /// entry only ever exists for a completed job.
    pub async fn run(self: Arc<Self>, job: Arc<ConversionJob>, request: ConversionRequest) {
        let job_id = job.id();
        let token = job.cancellation_token().clone();

        let permit = tokio::select! {
            _ = token.cancelled() => {
                tracing::info!(job_id = %job_id, "Job cancelled before it started");
                return;
            }
            permit = self.admission.clone().acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(e) => {
                    job.fail(JobFailure::new(FailureKind::Internal, e.to_string()));
                    return;
                }
            },
        };

        if !job.start_processing() {
            return;
        }

        tracing::info!(
            job_id = %job_id,
            voice = %request.voice,
            speed = request.speed,
            input_chars = request.text.chars().count(),
            "Job processing"
        );

        let started = Instant::now();
        let outcome = self.process(&job, request).await;
        drop(permit);

        match outcome {
            Ok(entry) => {
                if job.complete(entry.id) {
                    tracing::info!(
                        job_id = %job_id,
                        entry_id = %entry.id,
                        duration_ms = started.elapsed().as_millis() as u64,
                        audio_bytes = entry.audio_size,
                        audio_seconds = ?entry.audio_duration,
                        "Job completed"
                    );
                }
            }
            Err(failure) => {
                if failure.kind == FailureKind::Cancelled {
                    tracing::info!(job_id = %job_id, "Job cancelled");
                } else {
                    tracing::error!(
                        job_id = %job_id,
                        kind = ?failure.kind,
                        error = %failure.message,
                        "Job failed"
                    );
                }
                job.fail(failure);
            }
        }
    }

    async fn process(
        &self,
        job: &ConversionJob,
        request: ConversionRequest,
    ) -> Result<HistoryEntry, JobFailure> {
        let chunk_size = self.settings.chunk_size;
        let raw = request.text.clone();
        let prepared = tokio::task::spawn_blocking(move || prepare(&raw, chunk_size))
            .await
            .map_err(|e| JobFailure::new(FailureKind::Internal, e.to_string()))??;

        job.set_chunks_total(prepared.chunks.len());
        tracing::debug!(
            job_id = %job.id(),
            chunks = prepared.chunks.len(),
            normalized_chars = prepared.text.chars().count(),
            "Text prepared"
        );

        let token = job.cancellation_token();
        let buffers = tokio::select! {
            biased;
            _ = token.cancelled() => return Err(JobFailure::cancelled()),
            buffers = self.synthesize_all(job, &prepared.chunks, &request.voice, request.speed) => buffers?,
        };

        let assembler = self.assembler.clone();
        let audio = tokio::task::spawn_blocking(move || assembler.assemble(buffers))
            .await
            .map_err(|e| JobFailure::new(FailureKind::Internal, e.to_string()))?
            .map_err(|e| JobFailure::new(FailureKind::Assembly, e.to_string()))?;

        if !job.begin_finalizing() {
            return Err(JobFailure::cancelled());
        }

        self.finalize(request, prepared.text, audio).await
    }

    /// Synthesize every chunk, at most `synthesis_concurrency` at a time.
    ///
    /// Audio is slotted by chunk index so completion order does not matter.
    /// The first exhausted chunk aborts the rest.
    async fn synthesize_all(
        &self,
        job: &ConversionJob,
        chunks: &[String],
        voice: &str,
        speed: f32,
    ) -> Result<Vec<Vec<u8>>, JobFailure> {
        let total = chunks.len();
        let mut slots: Vec<Option<Vec<u8>>> = vec![None; total];

        let job_id = job.id();
        let pending: Vec<_> = chunks
            .iter()
            .enumerate()
            .map(|(index, text)| async move {
                (index, self.synthesize_chunk(job_id, index, text, voice, speed).await)
            })
            .collect();
        let mut results =
            stream::iter(pending).buffer_unordered(self.settings.synthesis_concurrency.max(1));

        while let Some((index, result)) = results.next().await {
            let audio = result.map_err(|e| {
                JobFailure::new(
                    FailureKind::Synthesis,
                    format!("Chunk {} of {} failed: {}", index + 1, total, e),
                )
            })?;

            let bytes = audio.len();
            slots[index] = Some(audio);
            let done = job.chunk_done();

            tracing::debug!(
                job_id = %job.id(),
                chunk_index = index,
                bytes,
                chunks_done = done,
                chunks_total = total,
                "Chunk synthesized"
            );
        }

        slots
            .into_iter()
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| JobFailure::new(FailureKind::Internal, "Missing audio for a chunk"))
    }

    /// One chunk with exponential backoff on retryable failures
    async fn synthesize_chunk(
        &self,
        job_id: Uuid,
        index: usize,
        text: &str,
        voice: &str,
        speed: f32,
    ) -> Result<Vec<u8>, SynthesisError> {
        let max_attempts = self.settings.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            let result = match self.tts_repo.synthesize(text, voice, speed).await {
                Ok(audio) if audio.is_empty() => Err(SynthesisError::Transport(
                    "speech backend returned no audio".to_string(),
                )),
                other => other,
            };

            match result {
                Ok(audio) => return Ok(audio),
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    let delay = self.settings.retry_delay * 2u32.saturating_pow(attempt - 1);
                    tracing::warn!(
                        job_id = %job_id,
                        chunk_index = index,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Chunk synthesis failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Persist the audio, record it in history, then run the quota pass
    async fn finalize(
        &self,
        request: ConversionRequest,
        text: String,
        audio: AssembledAudio,
    ) -> Result<HistoryEntry, JobFailure> {
        let entry_id = Uuid::new_v4();
        let artifact = self
            .storage
            .persist(entry_id, &audio.bytes)
            .await
            .map_err(|e| JobFailure::new(FailureKind::Storage, e.to_string()))?;

        let entry = HistoryEntry {
            id: entry_id,
            created_at: Utc::now(),
            input_type: request.input_type,
            original_filename: request.original_filename,
            content_preview: HistoryEntry::preview_of(&text),
            content_length: text.chars().count() as i32,
            voice: request.voice,
            speed: request.speed,
            audio_path: artifact.path.to_string_lossy().to_string(),
            audio_duration: audio.duration_seconds,
            audio_size: artifact.size as i64,
            full_text: text,
        };

        if let Err(e) = self.history_repo.insert(&entry).await {
            self.storage.discard(entry_id, &artifact).await;
            return Err(JobFailure::new(
                FailureKind::Storage,
                format!("Failed to record conversion: {}", e),
            ));
        }

        // The conversion already succeeded; eviction problems are only logged
        match self
            .storage
            .enforce_quota(self.settings.quota_bytes, Some(entry_id))
            .await
        {
            Ok(report) if report.over_quota() => tracing::warn!(
                entry_id = %entry_id,
                usage_bytes = report.usage_bytes,
                quota_bytes = report.quota_bytes,
                "Audio storage still over quota"
            ),
            Ok(_) => {}
            Err(e) => tracing::error!(
                entry_id = %entry_id,
                error = %e,
                "Quota enforcement failed"
            ),
        }

        Ok(entry)
    }
}

fn prepare(raw: &str, chunk_size: usize) -> Result<PreparedText, JobFailure> {
    let text = normalizer::normalize(raw);
    let chunks: Vec<String> = chunker::chunk(&text, chunk_size)
        .into_iter()
        .filter(|chunk| is_speakable(chunk))
        .collect();

    if chunks.is_empty() {
        return Err(JobFailure::new(
            FailureKind::NoSpeakableText,
            "No speakable text left after normalization",
        ));
    }

    Ok(PreparedText { text, chunks })
}

fn is_speakable(chunk: &str) -> bool {
    chunk.chars().filter(|c| c.is_alphanumeric()).count() >= MIN_SPEAKABLE_CHARS
}
