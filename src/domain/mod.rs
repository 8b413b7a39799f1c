pub mod chunker;
pub mod conversion;
pub mod history;
pub mod normalizer;
pub mod storage;
