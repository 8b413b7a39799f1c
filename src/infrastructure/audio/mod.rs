pub mod mp3;

pub use mp3::Mp3Assembler;

/// Final audio for one conversion
#[derive(Debug, Clone)]
pub struct AssembledAudio {
    pub bytes: Vec<u8>,
    /// None when no audio frames could be recognized
    pub duration_seconds: Option<f64>,
}

#[derive(Debug, thiserror::Error)]
pub enum AssemblyError {
    #[error("no audio to assemble")]
    Empty,
}

/// Joins per-chunk audio buffers into one playable stream.
///
/// Called once per job with buffers in chunk order. Runs on the blocking
/// pool so implementations may do CPU-bound work.
pub trait AudioAssembler: Send + Sync {
    fn assemble(&self, chunks: Vec<Vec<u8>>) -> Result<AssembledAudio, AssemblyError>;
}
