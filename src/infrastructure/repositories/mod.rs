pub mod history_repository;
pub mod memory_history_repository;
pub mod openai_tts_repository;
pub mod pg_history_repository;
pub mod tts_repository;

pub use history_repository::HistoryRepository;
pub use memory_history_repository::InMemoryHistoryRepository;
pub use openai_tts_repository::OpenAiCompatibleTtsRepository;
pub use pg_history_repository::PgHistoryRepository;
pub use tts_repository::{SynthesisError, TtsRepository};
