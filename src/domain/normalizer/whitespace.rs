use once_cell::sync::Lazy;
use regex::Regex;

static PARAGRAPH_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n[ \t]*\n\s*").expect("valid paragraph pattern"));
static WHITESPACE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace pattern"));

/// Collapse whitespace while keeping paragraph breaks.
///
/// Paragraphs end up separated by exactly one blank line. Line breaks
/// inside a paragraph become spaces so the voice does not pause mid
/// sentence.
pub fn clean_whitespace(text: &str) -> String {
    let text = normalize_line_breaks(text);

    PARAGRAPH_BREAK
        .split(&text)
        .map(|paragraph| WHITESPACE_RUN.replace_all(paragraph, " ").trim().to_string())
        .filter(|paragraph| !paragraph.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn normalize_line_breaks(text: &str) -> String {
    text.replace("\r\n", "\n")
        .replace(['\r', '\x0c', '\x0b', '\u{2028}'], "\n")
        .replace('\u{2029}', "\n\n")
}
