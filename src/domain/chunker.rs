//! Splits normalized text into segments the synthesis backend accepts.
//!
//! Lengths are counted in characters. Paragraphs are packed greedily and
//! joined with a blank line, sentences of an oversized paragraph are packed
//! the same way and joined with a space. A sentence that alone exceeds the
//! limit is cut on whitespace.

use once_cell::sync::Lazy;
use regex::Regex;

static PARAGRAPH_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n\s*\n").expect("valid paragraph pattern"));

const PARAGRAPH_SEPARATOR: &str = "\n\n";
const SENTENCE_SEPARATOR: &str = " ";

/// Words whose trailing period never ends a sentence
const ABBREVIATIONS: [&str; 16] = [
    "mr", "mrs", "ms", "dr", "prof", "sr", "jr", "st", "vs", "etc", "e.g", "i.e", "fig", "inc",
    "ltd", "approx",
];

/// Split `text` into ordered chunks of at most `max_len` characters.
///
/// Deterministic, and never splits inside a word unless the word itself is
/// longer than `max_len`.
pub fn chunk(text: &str, max_len: usize) -> Vec<String> {
    let mut builder = ChunkBuilder::new(max_len.max(1));

    for paragraph in split_paragraphs(text) {
        if builder.fits_alone(paragraph) {
            builder.push(paragraph, PARAGRAPH_SEPARATOR);
            continue;
        }

        // Oversized paragraph starts on a fresh chunk
        builder.flush();
        for sentence in split_sentences(paragraph) {
            if builder.fits_alone(sentence) {
                builder.push(sentence, SENTENCE_SEPARATOR);
            } else {
                builder.flush();
                for piece in hard_split(sentence, builder.max_len) {
                    builder.emit(piece);
                }
            }
        }
    }

    builder.finish()
}

struct ChunkBuilder {
    max_len: usize,
    chunks: Vec<String>,
    current: String,
    current_len: usize,
}

impl ChunkBuilder {
    fn new(max_len: usize) -> Self {
        Self {
            max_len,
            chunks: Vec::new(),
            current: String::new(),
            current_len: 0,
        }
    }

    fn fits_alone(&self, piece: &str) -> bool {
        piece.chars().count() <= self.max_len
    }

    /// Append `piece` to the open chunk, closing it first when it would overflow
    fn push(&mut self, piece: &str, separator: &str) {
        let piece_len = piece.chars().count();

        if !self.current.is_empty() {
            let joined_len = self.current_len + separator.chars().count() + piece_len;
            if joined_len <= self.max_len {
                self.current.push_str(separator);
                self.current.push_str(piece);
                self.current_len = joined_len;
                return;
            }
            self.flush();
        }

        self.current.push_str(piece);
        self.current_len = piece_len;
    }

    fn emit(&mut self, piece: String) {
        self.flush();
        self.chunks.push(piece);
    }

    fn flush(&mut self) {
        if !self.current.is_empty() {
            self.chunks.push(std::mem::take(&mut self.current));
            self.current_len = 0;
        }
    }

    fn finish(mut self) -> Vec<String> {
        self.flush();
        self.chunks
    }
}

fn split_paragraphs(text: &str) -> impl Iterator<Item = &str> {
    PARAGRAPH_BREAK
        .split(text)
        .map(str::trim)
        .filter(|paragraph| !paragraph.is_empty())
}

/// Sentence boundary: `.`, `!` or `?` (plus any closing quotes), then
/// whitespace, then a capital letter or an opening quote.
pub(crate) fn split_sentences(paragraph: &str) -> Vec<&str> {
    let chars: Vec<(usize, char)> = paragraph.char_indices().collect();
    let byte_at = |index: usize| chars.get(index).map_or(paragraph.len(), |(b, _)| *b);

    let mut sentences = Vec::new();
    let mut start = 0;
    let mut index = 0;

    while index < chars.len() {
        let (position, c) = chars[index];
        if !matches!(c, '.' | '!' | '?') {
            index += 1;
            continue;
        }

        let mut end = index + 1;
        while end < chars.len() && is_closing(chars[end].1) {
            end += 1;
        }
        let mut next = end;
        while next < chars.len() && chars[next].1.is_whitespace() {
            next += 1;
        }

        let is_boundary = next > end
            && next < chars.len()
            && starts_sentence(chars[next].1)
            && !(c == '.' && ends_with_abbreviation(&paragraph[start..position]));

        if is_boundary {
            sentences.push(paragraph[start..byte_at(end)].trim());
            start = byte_at(next);
            index = next;
        } else {
            index = end;
        }
    }

    let rest = paragraph[start..].trim();
    if !rest.is_empty() {
        sentences.push(rest);
    }
    sentences
}

fn is_closing(c: char) -> bool {
    matches!(c, '.' | '!' | '?' | '"' | '\'' | ')' | ']' | '”' | '’')
}

fn starts_sentence(c: char) -> bool {
    c.is_uppercase() || matches!(c, '"' | '\'' | '(' | '[' | '“' | '‘')
}

fn ends_with_abbreviation(before_period: &str) -> bool {
    let word = before_period
        .rsplit(char::is_whitespace)
        .next()
        .unwrap_or_default()
        .trim_start_matches(|c: char| !c.is_alphanumeric());

    let mut letters = word.chars();
    if let (Some(initial), None) = (letters.next(), letters.next()) {
        if initial.is_uppercase() {
            return true;
        }
    }

    ABBREVIATIONS.contains(&word.to_lowercase().as_str())
}

/// Cut on the last whitespace at or before the limit; a single word longer
/// than the limit is cut at the limit.
fn hard_split(text: &str, max_len: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut rest = text.trim();

    while let Some((limit, at_limit)) = rest.char_indices().nth(max_len) {
        let window = &rest[..limit + at_limit.len_utf8()];
        match window.rfind(char::is_whitespace) {
            Some(cut) if cut > 0 => {
                pieces.push(rest[..cut].trim_end().to_string());
                rest = rest[cut..].trim_start();
            }
            _ => {
                pieces.push(rest[..limit].to_string());
                rest = &rest[limit..];
            }
        }
    }

    if !rest.is_empty() {
        pieces.push(rest.to_string());
    }
    pieces
}
