// Model-free detection: regex pattern detectors and sentence segmentation.

pub mod patterns;
pub mod sentences;

use crate::censor::{Category, CategorySet, EntitySpan};

/// Run the regex detectors for every enabled category.
///
/// PERSON contributes email local-parts, ADDRESS street addresses, DATE
/// dates, and PHONE phone numbers. CONCEPT has no pattern detector.
pub fn pattern_spans(text: &str, categories: &CategorySet) -> Vec<EntitySpan> {
    let mut spans = Vec::new();
    for category in categories.iter() {
        let found = match category {
            Category::Person => patterns::email_local_parts(text),
            Category::Address => patterns::street_addresses(text),
            Category::Date => patterns::dates(text),
            Category::Phone => patterns::phone_numbers(text),
            Category::Concept => continue,
        };
        spans.extend(found.into_iter().map(|m| EntitySpan::new(category, m)));
    }
    spans
}
