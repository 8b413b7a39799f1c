pub mod pdf;
pub mod text;

pub use pdf::PdfDocumentExtractor;
pub use text::TextDocumentExtractor;

use std::path::Path;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ExtractionError {
    #[error("unsupported file type: {0}. Use .txt, .md or .pdf")]
    UnsupportedFormat(String),
    #[error("could not read document: {0}")]
    Unreadable(String),
    #[error("document contains no text")]
    Empty,
}

/// Pulls raw text out of an uploaded document.
///
/// `declared_type` is a lowercase extension (`md`) or MIME type
/// (`text/markdown`). Markup is returned as-is; normalization happens later.
pub trait DocumentExtractor: Send + Sync {
    fn supports(&self, declared_type: &str) -> bool;

    fn extract(&self, bytes: &[u8], declared_type: &str) -> Result<String, ExtractionError>;
}

/// Hands each upload to the first extractor that supports its type
pub struct UploadExtractor {
    extractors: Vec<Box<dyn DocumentExtractor>>,
}

impl UploadExtractor {
    pub fn new(extractors: Vec<Box<dyn DocumentExtractor>>) -> Self {
        Self { extractors }
    }
}

impl Default for UploadExtractor {
    fn default() -> Self {
        let extractors: Vec<Box<dyn DocumentExtractor>> = vec![
            Box::new(TextDocumentExtractor),
            Box::new(PdfDocumentExtractor),
        ];
        Self::new(extractors)
    }
}

impl DocumentExtractor for UploadExtractor {
    fn supports(&self, declared_type: &str) -> bool {
        self.extractors
            .iter()
            .any(|extractor| extractor.supports(declared_type))
    }

    fn extract(&self, bytes: &[u8], declared_type: &str) -> Result<String, ExtractionError> {
        let declared_type = declared_type.trim().to_lowercase();
        match self
            .extractors
            .iter()
            .find(|extractor| extractor.supports(&declared_type))
        {
            Some(extractor) => extractor.extract(bytes, &declared_type),
            None if declared_type.is_empty() => {
                Err(ExtractionError::UnsupportedFormat("unknown".to_string()))
            }
            None => Err(ExtractionError::UnsupportedFormat(declared_type)),
        }
    }
}

/// Prefer the filename extension, fall back to the part's content type
pub fn declared_type_for(filename: Option<&str>, content_type: Option<&str>) -> String {
    let extension = filename
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase);

    extension
        .or_else(|| {
            content_type.map(|ct| {
                ct.split(';')
                    .next()
                    .unwrap_or_default()
                    .trim()
                    .to_lowercase()
            })
        })
        .unwrap_or_default()
}

/// Reduce a client supplied filename to a safe display name
pub fn sanitize_filename(raw: &str) -> Option<String> {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_matches(|c| c == '.' || c == '_').to_string();

    (!cleaned.is_empty()).then_some(cleaned)
}
