use serde::Deserialize;
use std::env;
use std::path::PathBuf;

const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Kokoro voice names (af = American female, am = American male, bm = British male)
const DEFAULT_VOICES: [&str; 10] = [
    "af_alloy", "af_nova", "af_bella", "af_sarah", "af_sky", "am_echo", "am_onyx", "am_adam",
    "bm_fable", "bm_george",
];

/// Speeds offered to clients. Any value inside [MIN_SPEED, MAX_SPEED] is accepted.
pub const SPEEDS: [f32; 8] = [0.5, 0.75, 1.0, 1.25, 1.5, 2.0, 3.0, 4.0];
pub const MIN_SPEED: f32 = 0.5;
pub const MAX_SPEED: f32 = 4.0;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub environment: Environment,
    pub log_format: LogFormat,
    /// History is kept in memory when unset
    pub database_url: Option<String>,
    // Speech backend
    pub tts_base_url: String,
    pub tts_api_key: String,
    pub tts_model: String,
    pub tts_request_timeout_secs: u64,
    pub default_voice: String,
    pub default_speed: f32,
    pub voices: Vec<String>,
    // Storage
    pub data_dir: PathBuf,
    pub max_storage_gb: f64,
    // Pipeline
    pub chunk_size: usize,
    pub max_concurrent_jobs: usize,
    pub synthesis_concurrency: usize,
    pub synthesis_max_attempts: u32,
    pub synthesis_retry_delay_ms: u64,
    pub job_retention_secs: u64,
    pub large_input_warning: usize,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key/value source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Box<dyn std::error::Error>>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let voices: Vec<String> = lookup("VOICES")
            .map(|raw| {
                raw.split(',')
                    .map(|v| v.trim().to_string())
                    .filter(|v| !v.is_empty())
                    .collect()
            })
            .unwrap_or_else(|| DEFAULT_VOICES.iter().map(|v| v.to_string()).collect());

        let config = Config {
            host: var("HOST", "0.0.0.0"),
            port: var("PORT", "4040").parse()?,
            environment: match var("ENVIRONMENT", "development").as_str() {
                "production" => Environment::Production,
                _ => Environment::Development,
            },
            log_format: match var("LOG_FORMAT", "pretty").as_str() {
                "json" => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
            database_url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),
            tts_base_url: var("TTS_BASE_URL", "http://localhost:4000/v1"),
            tts_api_key: var("TTS_API_KEY", ""),
            tts_model: var("TTS_MODEL", "tts-kokoro"),
            tts_request_timeout_secs: var("TTS_REQUEST_TIMEOUT_SECS", "120").parse()?,
            default_voice: var("DEFAULT_VOICE", "af_alloy"),
            default_speed: var("DEFAULT_SPEED", "1.0").parse()?,
            voices,
            data_dir: PathBuf::from(var("DATA_DIR", "/data")),
            max_storage_gb: var("MAX_STORAGE_GB", "10").parse()?,
            chunk_size: var("CHUNK_SIZE", "4000").parse()?,
            max_concurrent_jobs: var("MAX_CONCURRENT_JOBS", "2").parse()?,
            synthesis_concurrency: var("SYNTHESIS_CONCURRENCY", "1").parse()?,
            synthesis_max_attempts: var("SYNTHESIS_MAX_ATTEMPTS", "3").parse()?,
            synthesis_retry_delay_ms: var("SYNTHESIS_RETRY_DELAY_MS", "1000").parse()?,
            job_retention_secs: var("JOB_RETENTION_SECS", "3600").parse()?,
            large_input_warning: var("LARGE_INPUT_WARNING", "100000").parse()?,
            max_upload_bytes: var("MAX_UPLOAD_BYTES", "20971520").parse()?,
        };

        Ok(config)
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }

    pub fn audio_dir(&self) -> PathBuf {
        self.data_dir.join("audio")
    }

    pub fn quota_bytes(&self) -> u64 {
        (self.max_storage_gb * GIB).max(0.0) as u64
    }
}
