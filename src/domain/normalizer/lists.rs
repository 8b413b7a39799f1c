use once_cell::sync::Lazy;
use regex::Regex;

// ASCII bullets need a following space so "-5 degrees" is not a list item
static BULLET_ITEM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[ \t]*(?:[-*+][ \t]+|[•◦▪▸►●○‣⁃][ \t]*)(.*)$").expect("valid bullet pattern")
});
static NUMBERED_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[ \t]*\d+[.)][ \t]+(.*)$").expect("valid numbered pattern"));

pub(crate) fn is_list_item(line: &str) -> bool {
    BULLET_ITEM.is_match(line) || NUMBERED_ITEM.is_match(line)
}

/// Turn every bullet or numbered item into its own sentence
pub fn lists_to_sentences(text: &str) -> String {
    let mut output: Vec<String> = Vec::new();

    for line in text.split('\n') {
        let item = BULLET_ITEM
            .captures(line)
            .or_else(|| NUMBERED_ITEM.captures(line))
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim());

        match item {
            Some("") => {}
            Some(item) => output.push(terminate_sentence(item)),
            None => output.push(line.to_string()),
        }
    }

    output.join("\n")
}

fn terminate_sentence(item: &str) -> String {
    let core = item.trim_end_matches(['"', '\'', ')', ']', '”', '’']);
    if core.ends_with(['.', '!', '?']) {
        item.to_string()
    } else {
        format!("{}.", item)
    }
}
