use async_trait::async_trait;

/// Why one synthesis call failed
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum SynthesisError {
    #[error("voice not supported by the speech backend: {0}")]
    InvalidVoice(String),
    #[error("speech backend rate limited the request: {0}")]
    RateLimited(String),
    #[error("speech backend unreachable or failed: {0}")]
    Transport(String),
    #[error("speech backend quota exhausted: {0}")]
    QuotaExceeded(String),
    #[error("speech backend rejected the request: {0}")]
    Rejected(String),
}

impl SynthesisError {
    /// Rate limits and transport failures are worth another attempt
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited(_) | Self::Transport(_))
    }
}

/// Repository for TTS synthesis operations.
/// Abstracts the speech backend so the orchestrator can be driven by test doubles.
///
/// One call synthesizes one chunk. Splitting long text and merging the
/// resulting audio happen upstream.
#[async_trait]
pub trait TtsRepository: Send + Sync {
    /// Synthesize one chunk of normalized text
    ///
    /// Returns MP3 audio for the chunk
    ///
    /// # Arguments
    /// * `text` - One chunk, already within the backend length limit
    /// * `voice` - Backend voice identifier
    /// * `speed` - Playback speed multiplier
    async fn synthesize(&self, text: &str, voice: &str, speed: f32)
        -> Result<Vec<u8>, SynthesisError>;
}
