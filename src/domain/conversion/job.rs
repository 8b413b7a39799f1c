use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    NoSpeakableText,
    Synthesis,
    Assembly,
    Storage,
    Cancelled,
    Internal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl JobFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn cancelled() -> Self {
        Self::new(FailureKind::Cancelled, "Conversion cancelled")
    }
}

#[derive(Debug)]
struct JobState {
    status: JobStatus,
    chunks_total: usize,
    chunks_done: usize,
    error: Option<JobFailure>,
    result_id: Option<Uuid>,
    finalizing: bool,
}

/// One conversion request and its progress.
///
/// Only the worker driving the job mutates it; pollers take snapshots.
/// Every transition checks the current state under the write lock, so a
/// terminal job never changes again and `chunks_done` only grows up to
/// `chunks_total`.
#[derive(Debug)]
pub struct ConversionJob {
    id: Uuid,
    created_at: DateTime<Utc>,
    state: RwLock<JobState>,
    cancel: CancellationToken,
}

impl ConversionJob {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            state: RwLock::new(JobState {
                status: JobStatus::Pending,
                chunks_total: 0,
                chunks_done: 0,
                error: None,
                result_id: None,
                finalizing: false,
            }),
            cancel: CancellationToken::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn status(&self) -> JobStatus {
        self.state.read().status
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// pending -> processing. False when the job already left pending.
    pub fn start_processing(&self) -> bool {
        let mut state = self.state.write();
        if state.status != JobStatus::Pending {
            return false;
        }
        state.status = JobStatus::Processing;
        true
    }

    /// Fixed once chunking is done; later calls are ignored
    pub fn set_chunks_total(&self, total: usize) {
        let mut state = self.state.write();
        if state.status == JobStatus::Processing && state.chunks_total == 0 {
            state.chunks_total = total;
        }
    }

    /// Count one more synthesized chunk and return the new count
    pub fn chunk_done(&self) -> usize {
        let mut state = self.state.write();
        if state.status == JobStatus::Processing && state.chunks_done < state.chunks_total {
            state.chunks_done += 1;
        }
        state.chunks_done
    }

    /// Audio is assembled and about to be stored. False when the job was
    /// cancelled or failed first; afterwards `cancel` is refused.
    pub fn begin_finalizing(&self) -> bool {
        let mut state = self.state.write();
        if state.status != JobStatus::Processing || self.cancel.is_cancelled() {
            return false;
        }
        state.finalizing = true;
        true
    }

    /// processing -> completed
    pub fn complete(&self, result_id: Uuid) -> bool {
        let mut state = self.state.write();
        if state.status != JobStatus::Processing || state.chunks_done < state.chunks_total {
            return false;
        }
        state.status = JobStatus::Completed;
        state.result_id = Some(result_id);
        true
    }

    /// Any non-terminal state -> failed
    pub fn fail(&self, failure: JobFailure) -> bool {
        let mut state = self.state.write();
        if state.status.is_terminal() {
            return false;
        }
        state.status = JobStatus::Failed;
        state.error = Some(failure);
        true
    }

    /// Stop issuing synthesis calls and fail the job right away.
    /// No effect on finished or finalizing jobs.
    pub fn cancel(&self) -> bool {
        let mut state = self.state.write();
        if state.status.is_terminal() || state.finalizing {
            return false;
        }
        self.cancel.cancel();
        state.status = JobStatus::Failed;
        state.error = Some(JobFailure::cancelled());
        true
    }

    pub fn snapshot(&self) -> JobSnapshot {
        let state = self.state.read();
        let progress = match (state.status, state.chunks_total) {
            (JobStatus::Completed, _) => 100,
            (_, 0) => 0,
            (_, total) => (state.chunks_done * 100 / total) as u8,
        };

        JobSnapshot {
            job_id: self.id,
            status: state.status,
            chunks_done: state.chunks_done,
            chunks_total: state.chunks_total,
            progress,
            error: state.error.clone(),
            result_id: state.result_id,
            created_at: self.created_at,
        }
    }
}

impl Default for ConversionJob {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time view of a job, as returned by GET /api/status/{job_id}
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSnapshot {
    pub job_id: Uuid,
    pub status: JobStatus,
    pub chunks_done: usize,
    pub chunks_total: usize,
    /// Integer percent
    pub progress: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JobFailure>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}
