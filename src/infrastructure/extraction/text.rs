use super::{DocumentExtractor, ExtractionError};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Plain text and markdown uploads
#[derive(Debug, Default, Clone, Copy)]
pub struct TextDocumentExtractor;

impl DocumentExtractor for TextDocumentExtractor {
    fn supports(&self, declared_type: &str) -> bool {
        matches!(
            declared_type,
            "txt" | "text" | "text/plain" | "md" | "markdown" | "text/markdown" | "text/x-markdown"
        )
    }

    fn extract(&self, bytes: &[u8], declared_type: &str) -> Result<String, ExtractionError> {
        let declared_type = declared_type.trim().to_lowercase();
        if !self.supports(&declared_type) {
            let shown = if declared_type.is_empty() {
                "unknown".to_string()
            } else {
                declared_type
            };
            return Err(ExtractionError::UnsupportedFormat(shown));
        }

        let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
        let text = std::str::from_utf8(bytes)
            .map_err(|e| ExtractionError::Unreadable(format!("not valid UTF-8 text ({})", e)))?;

        if text.trim().is_empty() {
            return Err(ExtractionError::Empty);
        }

        Ok(text.to_string())
    }
}
