use super::{DocumentExtractor, ExtractionError};
use lopdf::Document;

/// Text layer of PDF uploads, one paragraph per page.
///
/// Scanned pages carry no text layer and contribute nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfDocumentExtractor;

impl DocumentExtractor for PdfDocumentExtractor {
    fn supports(&self, declared_type: &str) -> bool {
        matches!(declared_type, "pdf" | "application/pdf")
    }

    fn extract(&self, bytes: &[u8], declared_type: &str) -> Result<String, ExtractionError> {
        if !self.supports(declared_type) {
            return Err(ExtractionError::UnsupportedFormat(declared_type.to_string()));
        }

        let document = Document::load_mem(bytes)
            .map_err(|e| ExtractionError::Unreadable(format!("invalid PDF ({})", e)))?;

        let mut pages = Vec::new();
        for page_number in document.get_pages().into_keys() {
            match document.extract_text(&[page_number]) {
                Ok(text) if !text.trim().is_empty() => pages.push(text.trim().to_string()),
                Ok(_) => {}
                Err(e) => tracing::warn!(
                    page = page_number,
                    error = %e,
                    "Skipping PDF page without readable text"
                ),
            }
        }

        if pages.is_empty() {
            return Err(ExtractionError::Empty);
        }

        Ok(pages.join("\n\n"))
    }
}
