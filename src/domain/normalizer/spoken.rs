use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::HashMap;

const MONTHS: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December",
];

/// Unit abbreviation, singular, plural
const UNITS: [(&str, &str, &str); 15] = [
    ("km", "kilometer", "kilometers"),
    ("m", "meter", "meters"),
    ("cm", "centimeter", "centimeters"),
    ("mm", "millimeter", "millimeters"),
    ("kg", "kilogram", "kilograms"),
    ("mg", "milligram", "milligrams"),
    ("ml", "milliliter", "milliliters"),
    ("lb", "pound", "pounds"),
    ("lbs", "pound", "pounds"),
    ("oz", "ounce", "ounces"),
    ("mi", "mile", "miles"),
    ("ft", "foot", "feet"),
    ("in", "inch", "inches"),
    ("mph", "mile per hour", "miles per hour"),
    ("kph", "kilometer per hour", "kilometers per hour"),
];

const ABBREVIATIONS: [(&str, &str); 14] = [
    ("Dr.", "Doctor"),
    ("Mr.", "Mister"),
    ("Mrs.", "Missus"),
    ("Ms.", "Miss"),
    ("Jr.", "Junior"),
    ("Sr.", "Senior"),
    ("Prof.", "Professor"),
    ("etc.", "et cetera"),
    ("e.g.", "for example"),
    ("i.e.", "that is"),
    ("vs.", "versus"),
    ("St.", "Saint"),
    ("Ave.", "Avenue"),
    ("Blvd.", "Boulevard"),
];

/// Always followed by a name, so their period never closes a sentence
const TITLES: [&str; 6] = ["dr.", "mr.", "mrs.", "ms.", "prof.", "st."];

static CURRENCY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$(\d{1,3}(?:,\d{3})+|\d+)(?:\.(\d{2}))?\b").expect("valid currency pattern")
});
static PERCENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+(?:\.\d+)?)%").expect("valid percent pattern"));
static DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,2})/(\d{1,2})/(\d{4})\b").expect("valid date pattern"));
static UNIT: Lazy<Regex> = Lazy::new(|| {
    // Longest first so "mm" wins over "m"
    let mut abbreviations: Vec<&str> = UNITS.iter().map(|(abbr, _, _)| *abbr).collect();
    abbreviations.sort_by_key(|abbr| std::cmp::Reverse(abbr.len()));
    Regex::new(&format!(r"\b(\d+(?:\.\d+)?)({})\b", abbreviations.join("|")))
        .expect("valid unit pattern")
});
static ABBREVIATION: Lazy<Regex> = Lazy::new(|| {
    let mut sources: Vec<&str> = ABBREVIATIONS.iter().map(|(abbr, _)| *abbr).collect();
    sources.sort_by_key(|abbr| std::cmp::Reverse(abbr.len()));
    let alternation: Vec<String> = sources.iter().map(|abbr| regex::escape(abbr)).collect();
    Regex::new(&format!(r"(?i)\b(?:{})", alternation.join("|"))).expect("valid abbreviation pattern")
});
static ABBREVIATION_EXPANSIONS: Lazy<HashMap<String, &'static str>> = Lazy::new(|| {
    ABBREVIATIONS
        .iter()
        .map(|(abbr, expansion)| (abbr.to_lowercase(), *expansion))
        .collect()
});

/// Expand symbols, dates, units and abbreviations into words.
///
/// Each rewrite runs left to right over the whole string with
/// non-overlapping matches. Suffixed ordinals like `1st` are already
/// speakable and are left alone.
pub fn expand_spoken_forms(text: &str) -> String {
    let text = CURRENCY.replace_all(text, currency_words);
    let text = PERCENT.replace_all(&text, "${1} percent");
    let text = DATE.replace_all(&text, date_words);
    let text = UNIT.replace_all(&text, unit_words);
    expand_abbreviations(&text)
}

fn currency_words(caps: &Captures) -> String {
    let dollars = &caps[1];
    let dollar_word = if dollars == "1" { "dollar" } else { "dollars" };

    let cents = caps
        .get(2)
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .filter(|cents| *cents > 0);

    match cents {
        Some(cents) => {
            let cent_word = if cents == 1 { "cent" } else { "cents" };
            format!("{} {} and {} {}", dollars, dollar_word, cents, cent_word)
        }
        None => format!("{} {}", dollars, dollar_word),
    }
}

fn date_words(caps: &Captures) -> String {
    let month: usize = caps[1].parse().unwrap_or(0);
    let day: u32 = caps[2].parse().unwrap_or(0);

    if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return caps[0].to_string();
    }

    format!("{} {}{}, {}", MONTHS[month - 1], day, ordinal_suffix(day), &caps[3])
}

pub(crate) fn ordinal_suffix(n: u32) -> &'static str {
    match (n % 100, n % 10) {
        (11..=13, _) => "th",
        (_, 1) => "st",
        (_, 2) => "nd",
        (_, 3) => "rd",
        _ => "th",
    }
}

fn unit_words(caps: &Captures) -> String {
    let number = &caps[1];
    let abbreviation = &caps[2];
    let Some((_, singular, plural)) = UNITS.iter().find(|(abbr, _, _)| *abbr == abbreviation)
    else {
        return caps[0].to_string();
    };

    let is_one = number.parse::<f64>().map(|n| n == 1.0).unwrap_or(false);
    format!("{} {}", number, if is_one { singular } else { plural })
}

/// Titles only match when capitalized (`Ms.` but not the `ms.` of
/// milliseconds). Any other abbreviation keeps a period when it ends the
/// sentence, so the chunker still sees the boundary.
fn expand_abbreviations(text: &str) -> String {
    let mut expanded = String::with_capacity(text.len());
    let mut last = 0;

    for found in ABBREVIATION.find_iter(text) {
        let matched = found.as_str();
        let key = matched.to_lowercase();
        let Some(expansion) = ABBREVIATION_EXPANSIONS.get(&key) else {
            continue;
        };

        let is_title = TITLES.contains(&key.as_str());
        if is_title && !matched.starts_with(|c: char| c.is_uppercase()) {
            continue;
        }

        expanded.push_str(&text[last..found.start()]);
        expanded.push_str(expansion);
        if !is_title && closes_sentence(&text[found.end()..]) {
            expanded.push('.');
        }
        last = found.end();
    }

    expanded.push_str(&text[last..]);
    expanded
}

fn closes_sentence(rest: &str) -> bool {
    match rest.trim_start_matches([' ', '\t']).chars().next() {
        None | Some('\n') => true,
        Some(next) => next.is_uppercase(),
    }
}
