use super::lists::is_list_item;
use once_cell::sync::Lazy;
use regex::Regex;

fn pattern(source: &str) -> Regex {
    Regex::new(source).expect("valid markdown pattern")
}

static CODE_BLOCK: Lazy<Regex> = Lazy::new(|| pattern(r"(?s)```.*?```"));
static HORIZONTAL_RULE: Lazy<Regex> = Lazy::new(|| {
    pattern(r"(?m)^[ \t]*(?:(?:-[ \t]*){3,}|(?:\*[ \t]*){3,}|(?:_[ \t]*){3,})$")
});
static IMAGE: Lazy<Regex> = Lazy::new(|| pattern(r"!\[[^\]]*\]\([^)]*\)"));
static LINK: Lazy<Regex> = Lazy::new(|| pattern(r"\[([^\]]+)\]\([^)]+\)"));
static HEADING: Lazy<Regex> = Lazy::new(|| pattern(r"(?m)^[ \t]{0,3}#{1,6}[ \t]+(.*?)[ \t#]*$"));
static BOLD_STAR: Lazy<Regex> = Lazy::new(|| pattern(r"\*\*([^*\s](?:[^*]*[^*\s])?)\*\*"));
static BOLD_UNDERSCORE: Lazy<Regex> = Lazy::new(|| pattern(r"__([^_\s](?:[^_]*[^_\s])?)__"));
static ITALIC_STAR: Lazy<Regex> = Lazy::new(|| pattern(r"\*([^*\s](?:[^*]*[^*\s])?)\*"));
// `_` is a word character, so these boundaries keep snake_case identifiers intact
static ITALIC_UNDERSCORE: Lazy<Regex> =
    Lazy::new(|| pattern(r"\b_([^_\s](?:[^_]*[^_\s])?)_\b"));
static STRIKETHROUGH: Lazy<Regex> = Lazy::new(|| pattern(r"~~([^~]+)~~"));
static INLINE_CODE: Lazy<Regex> = Lazy::new(|| pattern(r"`([^`\n]+)`"));
static BLOCKQUOTE: Lazy<Regex> = Lazy::new(|| pattern(r"(?m)^[ \t]*>[ \t]?"));
static HTML_TAG: Lazy<Regex> = Lazy::new(|| pattern(r"</?[A-Za-z][A-Za-z0-9-]*(?:\s[^<>]*)?/?>"));

/// Remove markdown syntax while keeping the readable content.
///
/// Headings and sub-header lines (ending in `:`) are followed by a
/// paragraph break so the voice pauses after them. Unterminated markers
/// stay as literal text.
pub fn strip_markdown(text: &str) -> String {
    // Code goes first so nothing inside a fence gets rewritten
    let text = CODE_BLOCK.replace_all(text, "");
    let text = HORIZONTAL_RULE.replace_all(&text, "");
    let text = IMAGE.replace_all(&text, "");
    let text = LINK.replace_all(&text, "${1}");
    let text = HEADING.replace_all(&text, "${1}\n\n");
    let text = break_after_sub_headers(&text);
    let text = BOLD_STAR.replace_all(&text, "${1}");
    let text = BOLD_UNDERSCORE.replace_all(&text, "${1}");
    let text = ITALIC_STAR.replace_all(&text, "${1}");
    let text = ITALIC_UNDERSCORE.replace_all(&text, "${1}");
    let text = STRIKETHROUGH.replace_all(&text, "${1}");
    let text = INLINE_CODE.replace_all(&text, "${1}");
    let text = BLOCKQUOTE.replace_all(&text, "");
    HTML_TAG.replace_all(&text, "").into_owned()
}

fn break_after_sub_headers(text: &str) -> String {
    text.split('\n')
        .map(|line| {
            let trimmed = line.trim_end();
            if trimmed.ends_with(':') && trimmed.len() > 1 && !is_list_item(trimmed) {
                format!("{}\n", trimmed)
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
