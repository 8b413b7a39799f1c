use once_cell::sync::Lazy;
use regex::Regex;

// Arrows, math operators, box drawing, geometric shapes, misc symbols,
// dingbats, emoji and the emoji variation selector
static UNSPEAKABLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"[\x{2190}-\x{21FF}\x{2200}-\x{22FF}\x{2500}-\x{257F}\x{25A0}-\x{25FF}",
        r"\x{2600}-\x{27BF}\x{1F300}-\x{1FAFF}\x{FE0F}",
        r"•·©®™°±×÷]",
    ))
    .expect("valid symbol pattern")
});

/// Drop glyphs a speech backend cannot pronounce
pub fn remove_unspeakable(text: &str) -> String {
    UNSPEAKABLE.replace_all(text, "").into_owned()
}
