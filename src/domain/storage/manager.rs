use super::{EvictionReport, PersistedArtifact, StorageError};
use crate::domain::history::HistoryEntry;
use crate::infrastructure::repositories::HistoryRepository;
use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::Mutex;
use uuid::Uuid;

const AUDIO_EXTENSION: &str = "mp3";
const PARTIAL_EXTENSION: &str = "part";

#[derive(Debug, Default)]
struct Ledger {
    usage: u64,
    /// Persisted artifacts whose job has not run its quota pass yet
    fresh: HashSet<Uuid>,
}

/// Owns the audio directory and keeps it under the storage quota.
///
/// Every operation that changes which files exist goes through the ledger
/// lock, so usage accounting and eviction decisions are serialized across
/// jobs.
pub struct StorageManager {
    audio_dir: PathBuf,
    history_repo: Arc<dyn HistoryRepository>,
    ledger: Mutex<Ledger>,
}

impl StorageManager {
    /// Create the audio directory if needed and measure what is already there
    pub async fn open(
        audio_dir: PathBuf,
        history_repo: Arc<dyn HistoryRepository>,
    ) -> Result<Self, StorageError> {
        fs::create_dir_all(&audio_dir)
            .await
            .map_err(|source| StorageError::Init {
                path: audio_dir.clone(),
                source,
            })?;

        let usage = scan_usage(&audio_dir)
            .await
            .map_err(|source| StorageError::Init {
                path: audio_dir.clone(),
                source,
            })?;

        tracing::info!(
            audio_dir = %audio_dir.display(),
            usage_bytes = usage,
            "Audio storage opened"
        );

        Ok(Self {
            audio_dir,
            history_repo,
            ledger: Mutex::new(Ledger {
                usage,
                fresh: HashSet::new(),
            }),
        })
    }

    pub fn audio_dir(&self) -> &Path {
        &self.audio_dir
    }

    pub fn artifact_path(&self, id: Uuid) -> PathBuf {
        self.audio_dir.join(format!("{}.{}", id, AUDIO_EXTENSION))
    }

    pub async fn current_usage(&self) -> u64 {
        self.ledger.lock().await.usage
    }

    /// Write the audio for `id` and count it against the quota.
    ///
    /// The artifact is protected from eviction until the owning job calls
    /// [`enforce_quota`](Self::enforce_quota) with its id or discards it.
    pub async fn persist(&self, id: Uuid, bytes: &[u8]) -> Result<PersistedArtifact, StorageError> {
        let path = self.artifact_path(id);
        let partial = path.with_extension(PARTIAL_EXTENSION);

        let written = async {
            fs::write(&partial, bytes).await?;
            fs::rename(&partial, &path).await
        }
        .await;

        if let Err(source) = written {
            fs::remove_file(&partial).await.ok();
            return Err(StorageError::Write { path, source });
        }

        let size = bytes.len() as u64;
        let mut ledger = self.ledger.lock().await;
        ledger.usage += size;
        ledger.fresh.insert(id);

        tracing::debug!(
            artifact_id = %id,
            path = %path.display(),
            bytes = size,
            usage_bytes = ledger.usage,
            "Audio file persisted"
        );

        Ok(PersistedArtifact { path, size })
    }

    /// Remove an artifact that never got a history record
    pub async fn discard(&self, id: Uuid, artifact: &PersistedArtifact) {
        let mut ledger = self.ledger.lock().await;
        ledger.fresh.remove(&id);

        match fs::remove_file(&artifact.path).await {
            Ok(()) => ledger.usage = ledger.usage.saturating_sub(artifact.size),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                ledger.usage = ledger.usage.saturating_sub(artifact.size)
            }
            Err(e) => tracing::error!(
                artifact_id = %id,
                path = %artifact.path.display(),
                error = %e,
                "Failed to discard unrecorded audio file"
            ),
        }
    }

    /// Evict the oldest conversions until usage is within `quota_bytes`.
    ///
    /// Artifacts still waiting for their own quota pass are skipped, so a
    /// single artifact larger than the quota survives and usage stays over.
    /// Passing `just_written` ends that artifact's protection once the pass
    /// is done. Individual eviction failures are logged and counted in the
    /// report.
    pub async fn enforce_quota(
        &self,
        quota_bytes: u64,
        just_written: Option<Uuid>,
    ) -> Result<EvictionReport, StorageError> {
        let mut ledger = self.ledger.lock().await;
        let result = self.evict_oldest(&mut ledger, quota_bytes).await;

        if let Some(id) = just_written {
            ledger.fresh.remove(&id);
        }

        result
    }

    /// Delete a conversion's audio file and then its record.
    ///
    /// When the file cannot be removed the record is kept. When the record
    /// cannot be removed after the file is gone, the orphan is logged.
    pub async fn delete_entry(&self, entry: &HistoryEntry) -> Result<(), StorageError> {
        let mut ledger = self.ledger.lock().await;
        self.remove_entry(&mut ledger, entry).await
    }

    pub async fn read_artifact(&self, entry: &HistoryEntry) -> Result<Vec<u8>, StorageError> {
        let path = PathBuf::from(&entry.audio_path);
        fs::read(&path)
            .await
            .map_err(|source| StorageError::Read { path, source })
    }

    async fn evict_oldest(
        &self,
        ledger: &mut Ledger,
        quota_bytes: u64,
    ) -> Result<EvictionReport, StorageError> {
        let mut report = EvictionReport {
            usage_bytes: ledger.usage,
            quota_bytes,
            ..Default::default()
        };
        if ledger.usage <= quota_bytes {
            return Ok(report);
        }

        let candidates = self
            .history_repo
            .find_oldest_first()
            .await
            .map_err(|e| StorageError::Record(e.to_string()))?;

        for entry in candidates {
            if ledger.usage <= quota_bytes {
                break;
            }
            if ledger.fresh.contains(&entry.id) {
                continue;
            }

            match self.remove_entry(ledger, &entry).await {
                Ok(()) => {
                    tracing::info!(
                        entry_id = %entry.id,
                        created_at = %entry.created_at,
                        usage_bytes = ledger.usage,
                        quota_bytes = quota_bytes,
                        "Evicted conversion to stay under storage quota"
                    );
                    report.evicted.push(entry.id);
                }
                Err(e) => {
                    tracing::error!(
                        entry_id = %entry.id,
                        error = %e,
                        "Failed to evict conversion"
                    );
                    report.failed += 1;
                }
            }
        }

        report.usage_bytes = ledger.usage;
        if report.over_quota() {
            tracing::warn!(
                usage_bytes = report.usage_bytes,
                quota_bytes = quota_bytes,
                "Storage still over quota after eviction"
            );
        }

        Ok(report)
    }

    async fn remove_entry(&self, ledger: &mut Ledger, entry: &HistoryEntry) -> Result<(), StorageError> {
        let path = PathBuf::from(&entry.audio_path);
        let size = match fs::metadata(&path).await {
            Ok(metadata) if metadata.is_file() => metadata.len(),
            _ => 0,
        };

        match fs::remove_file(&path).await {
            Ok(()) => {}
            Err(source) if source.kind() == ErrorKind::NotFound => {
                tracing::warn!(
                    entry_id = %entry.id,
                    path = %path.display(),
                    "Audio file already missing"
                );
            }
            Err(source) => return Err(StorageError::Delete { path, source }),
        }
        ledger.usage = ledger.usage.saturating_sub(size);

        if let Err(e) = self.history_repo.delete(entry.id).await {
            tracing::error!(
                entry_id = %entry.id,
                path = %path.display(),
                error = %e,
                "History record orphaned after its audio file was removed"
            );
            return Err(StorageError::Record(e.to_string()));
        }

        Ok(())
    }
}

/// Total size of the files in `dir`. Leftover partial writes are deleted.
async fn scan_usage(dir: &Path) -> std::io::Result<u64> {
    let mut usage = 0;
    let mut entries = fs::read_dir(dir).await?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let metadata = entry.metadata().await?;
        if !metadata.is_file() {
            continue;
        }

        if path.extension().is_some_and(|ext| ext == PARTIAL_EXTENSION) {
            tracing::warn!(path = %path.display(), "Removing interrupted audio write");
            fs::remove_file(&path).await.ok();
            continue;
        }
        usage += metadata.len();
    }

    Ok(usage)
}
