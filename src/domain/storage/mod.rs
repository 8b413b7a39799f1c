pub mod error;
pub mod manager;

pub use error::StorageError;
pub use manager::StorageManager;

use std::path::PathBuf;
use uuid::Uuid;

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// An audio file written to the audio directory
#[derive(Debug, Clone)]
pub struct PersistedArtifact {
    pub path: PathBuf,
    pub size: u64,
}

/// Outcome of one quota enforcement pass
#[derive(Debug, Clone, Default)]
pub struct EvictionReport {
    pub evicted: Vec<Uuid>,
    pub failed: usize,
    pub usage_bytes: u64,
    pub quota_bytes: u64,
}

impl EvictionReport {
    pub fn over_quota(&self) -> bool {
        self.usage_bytes > self.quota_bytes
    }
}

pub fn bytes_to_gb(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_GB
}
