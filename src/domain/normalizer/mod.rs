//! Turns arbitrary markup into prose a speech backend reads naturally.
//!
//! Each stage is a stateless `&str -> String` rule. The pipeline order is
//! fixed since later rules rely on the output of earlier ones (list
//! detection needs headings gone, whitespace cleanup runs last).

mod lists;
mod markdown;
mod spoken;
mod symbols;
mod tables;
mod whitespace;

pub use lists::lists_to_sentences;
pub use markdown::strip_markdown;
pub use spoken::expand_spoken_forms;
pub use symbols::remove_unspeakable;
pub use tables::tables_to_prose;
pub use whitespace::clean_whitespace;

pub type Rule = fn(&str) -> String;

pub const PIPELINE: [(&str, Rule); 6] = [
    ("tables", tables_to_prose),
    ("markdown", strip_markdown),
    ("lists", lists_to_sentences),
    ("spoken_forms", expand_spoken_forms),
    ("symbols", remove_unspeakable),
    ("whitespace", clean_whitespace),
];

/// Run the full pipeline. Never fails; malformed markup is kept as text.
pub fn normalize(raw: &str) -> String {
    if raw.trim().is_empty() {
        return String::new();
    }

    PIPELINE.iter().fold(raw.to_string(), |text, (name, rule)| {
        let output = rule(&text);
        tracing::trace!(
            rule = *name,
            before = text.len(),
            after = output.len(),
            "Applied normalization rule"
        );
        output
    })
}
