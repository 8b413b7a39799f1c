use once_cell::sync::Lazy;
use regex::Regex;

static SEPARATOR_ROW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\|?\s*:?-+:?\s*(\|\s*:?-+:?\s*)*\|?$").expect("valid separator pattern")
});

/// Rewrite markdown tables as one sentence per data row.
///
/// | Item  | Price |
/// |-------|-------|
/// | Apple | $2    |
///
/// becomes `Item is Apple, Price is $2.`. Blocks without the header,
/// separator and at least one data row are left untouched.
pub fn tables_to_prose(text: &str) -> String {
    let lines: Vec<&str> = text.split('\n').collect();
    let mut output: Vec<String> = Vec::with_capacity(lines.len());
    let mut index = 0;

    while index < lines.len() {
        match parse_table(&lines[index..]) {
            Some((consumed, sentences)) => {
                output.extend(sentences);
                index += consumed;
            }
            None => {
                output.push(lines[index].to_string());
                index += 1;
            }
        }
    }

    output.join("\n")
}

/// Returns the number of lines the table spans and its prose rendering
fn parse_table(lines: &[&str]) -> Option<(usize, Vec<String>)> {
    let headers = split_row(lines.first()?)?;
    let separator = lines.get(1)?.trim();
    if !separator.contains('|') && headers.len() > 1 {
        return None;
    }
    if !SEPARATOR_ROW.is_match(separator) {
        return None;
    }

    let rows: Vec<Vec<String>> = lines[2..].iter().map_while(|line| split_row(line)).collect();
    if rows.is_empty() {
        return None;
    }

    let sentences = rows
        .iter()
        .filter_map(|cells| row_to_sentence(&headers, cells))
        .collect();

    Some((rows.len() + 2, sentences))
}

fn split_row(line: &str) -> Option<Vec<String>> {
    let trimmed = line.trim();
    if !trimmed.contains('|') {
        return None;
    }
    let inner = trimmed.strip_prefix('|').unwrap_or(trimmed);
    let inner = inner.strip_suffix('|').unwrap_or(inner);
    Some(inner.split('|').map(|cell| cell.trim().to_string()).collect())
}

fn row_to_sentence(headers: &[String], cells: &[String]) -> Option<String> {
    let pairs: Vec<String> = headers
        .iter()
        .zip(cells)
        .filter(|(_, value)| !value.is_empty())
        .map(|(header, value)| {
            if header.is_empty() {
                value.clone()
            } else {
                format!("{} is {}", header, value)
            }
        })
        .collect();

    if pairs.is_empty() {
        return None;
    }
    Some(format!("{}.", pairs.join(", ")))
}
