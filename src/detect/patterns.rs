// Regular-expression detectors for the formats the NER model misses.
//
// All of these are best-effort heuristics over raw text. They never consult
// the model and return the literal matched substrings, borrowed from the
// input. False positives are acceptable: over-redacting "may" as a month is
// preferable to leaking a date.

use std::sync::LazyLock;

use regex_lite::Regex;

/// Month names and their common abbreviations. Longer spellings first so
/// alternation prefers "March" over "Mar".
const MONTHS: &str = "January|February|March|April|May|June|July|August|September|October|November|December|\
                      Jan|Feb|Mar|Apr|Jun|Jul|Aug|Sept|Sep|Oct|Nov|Dec";

/// Street types, spelled out and abbreviated.
const STREET_TYPES: &str = "Street|St|Avenue|Ave|Road|Rd|Boulevard|Blvd|Lane|Ln|Drive|Dr|\
                            Square|Sq|Place|Pl|Trail|Trl|Court|Ct|Way|Parkway|Pkwy|\
                            Terrace|Ter|Loop|Lp";

static EMAIL_LOCAL_PART: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-zA-Z0-9_.+-]+)@").expect("valid email pattern"));

static PHONE_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b\d{3}[-.\s]?\d{3}[-.\s]?\d{4}\b").expect("valid phone pattern")
});

static STREET_ADDRESS: LazyLock<Regex> = LazyLock::new(|| {
    let pattern = format!(
        concat!(
            r"\b\d{{1,6}}[ \t]+[A-Za-z0-9 \t]+[ \t](?:{types})\.?",
            r"(?:[ \t]*(?:Apt|Suite|Ste|#)\.?[ \t]*\d+)?",
            r"(?:,[ \t]*[A-Za-z \t]+,[ \t]*[A-Z]{{2}}[ \t]*\d{{5}})?\b",
        ),
        types = STREET_TYPES
    );
    Regex::new(&pattern).expect("valid address pattern")
});

static DATE: LazyLock<Regex> = LazyLock::new(|| {
    let layouts = [
        // 28th July 2024, 28-Jul-24
        format!(r"\d{{1,2}}(?:st|nd|rd|th)?[-/\s](?:{MONTHS})[-/\s]\d{{2,4}}"),
        // 2024-07-28, 2024/07/28
        r"\d{4}[-/\s]\d{1,2}[-/\s]\d{1,2}".to_string(),
        // July 28th, 2024
        format!(r"(?:{MONTHS})\s+\d{{1,2}}(?:st|nd|rd|th)?,?\s+\d{{4}}"),
        // 28 July 2024
        format!(r"\d{{1,2}}\s+(?:{MONTHS})\s+\d{{4}}"),
        // 28/07/2024
        r"\d{1,2}[/\s]\d{1,2}[/\s]\d{4}".to_string(),
        // July 2024
        format!(r"(?:{MONTHS})\s+\d{{4}}"),
        // 28-07-24
        r"\d{1,2}[-/\s]\d{1,2}[-/\s]\d{2}".to_string(),
        // 15th August
        format!(r"\d{{1,2}}(?:st|nd|rd|th)?\s+(?:{MONTHS})"),
        // August 15th
        format!(r"(?:{MONTHS})\s+\d{{1,2}}(?:st|nd|rd|th)?"),
        // July
        format!(r"(?:{MONTHS})"),
    ];
    let pattern = format!(r"(?i)\b(?:{})\b", layouts.join("|"));
    Regex::new(&pattern).expect("valid date pattern")
});

/// The part of each email address before the `@`.
pub fn email_local_parts(text: &str) -> Vec<&str> {
    EMAIL_LOCAL_PART
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .collect()
}

/// Ten-digit phone numbers grouped 3-3-4 with optional `-`, `.` or space separators.
pub fn phone_numbers(text: &str) -> Vec<&str> {
    PHONE_NUMBER.find_iter(text).map(|m| m.as_str()).collect()
}

/// Street addresses: house number, street name, street type, optional unit
/// and optional `City, ST 12345` tail.
pub fn street_addresses(text: &str) -> Vec<&str> {
    STREET_ADDRESS.find_iter(text).map(|m| m.as_str()).collect()
}

/// Whether `text` ends with a street address, so a period right after it
/// closes the address rather than an abbreviation.
pub fn ends_with_street_address(text: &str) -> bool {
    STREET_ADDRESS
        .find_iter(text)
        .last()
        .is_some_and(|m| m.end() == text.len())
}

/// Dates in any of the supported layouts, case-insensitive.
pub fn dates(text: &str) -> Vec<&str> {
    DATE.find_iter(text).map(|m| m.as_str()).collect()
}
