// Block substitution: the last step before a censored copy hits disk.
//
// Detectors hand over literal strings; this module replaces every occurrence
// of each one with a run of block characters of the same length, so the
// document keeps its layout.

pub mod models;

pub use models::{censored_path, Category, CategorySet, CensorRequest, EntitySpan};

/// Character used to black out censored text.
pub const BLOCK_CHAR: char = '█';

/// Replace every literal occurrence of each span's text with block characters.
///
/// Spans are applied in the order given. Text that an earlier span already
/// blocked out is made of `BLOCK_CHAR` and can't match again. The result has
/// the same number of characters as the input.
pub fn censor(text: &str, spans: &[EntitySpan]) -> String {
    let mut censored = text.to_string();
    for span in spans {
        if span.text.is_empty() || !censored.contains(span.text.as_str()) {
            continue;
        }
        let block = blocks_for(&span.text);
        censored = censored.replace(span.text.as_str(), &block);
    }
    censored
}

/// A run of block characters as long (in characters) as `text`.
pub fn blocks_for(text: &str) -> String {
    std::iter::repeat_n(BLOCK_CHAR, text.chars().count()).collect()
}

/// Sort spans into the fixed category order used for redaction, keeping the
/// detection order within a category.
pub fn order_spans(mut spans: Vec<EntitySpan>) -> Vec<EntitySpan> {
    spans.sort_by_key(|s| {
        Category::REDACTION_ORDER
            .iter()
            .position(|c| *c == s.category)
            .unwrap_or(Category::COUNT)
    });
    spans
}
