// Rule-based sentence segmentation.
//
// Used by the concept matcher (which redacts whole sentences) and by the NER
// tagger (which runs the model sentence by sentence to stay within the
// model's sequence limit).

use super::patterns;

/// Abbreviations whose trailing period doesn't end a sentence.
const ABBREVIATIONS: &[&str] = &[
    "mr", "mrs", "ms", "dr", "prof", "sr", "jr", "st", "mt", "vs", "e.g", "i.e", "approx",
];

/// A sentence borrowed from its document, with byte offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sentence<'a> {
    pub text: &'a str,
    pub start: usize,
    pub end: usize,
}

/// Split `text` into sentences.
///
/// A sentence ends after `.`, `!` or `?` (with any closing quotes or
/// brackets) when followed by whitespace or the end of the text, or at a
/// blank line. Surrounding whitespace is trimmed and empty pieces dropped.
pub fn split(text: &str) -> Vec<Sentence<'_>> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        match c {
            '.' | '!' | '?' => {
                let mut end = i + c.len_utf8();
                while let Some(&(j, next)) = chars.peek() {
                    if is_terminator(next) || is_closer(next) {
                        end = j + next.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                let at_break = chars.peek().map_or(true, |&(_, next)| next.is_whitespace());
                if at_break && !(c == '.' && period_continues(&text[start..i])) {
                    push_trimmed(&mut sentences, text, start, end);
                    start = end;
                }
            }
            '\n' if starts_blank_line(&text[i + 1..]) => {
                push_trimmed(&mut sentences, text, start, i);
                start = i + 1;
            }
            _ => {}
        }
    }
    push_trimmed(&mut sentences, text, start, text.len());
    sentences
}

fn is_terminator(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

fn is_closer(c: char) -> bool {
    matches!(c, '"' | '\'' | ')' | ']' | '\u{201D}' | '\u{2019}')
}

/// True when the rest of the current line is blank and another newline follows.
fn starts_blank_line(rest: &str) -> bool {
    rest.trim_start_matches([' ', '\t', '\r']).starts_with('\n')
}

/// Whether a period after `before` sits inside the sentence. A street type
/// that closes an address ("12 Oak St.") ends the sentence even though it
/// is also an abbreviation.
fn period_continues(before: &str) -> bool {
    ends_with_abbreviation(before) && !patterns::ends_with_street_address(before)
}

/// Whether the word right before a period is a known abbreviation or a
/// single-letter initial.
fn ends_with_abbreviation(before: &str) -> bool {
    let Some(word) = before.split_whitespace().last() else {
        return false;
    };
    let word = word.trim_start_matches(['(', '"', '\'', '\u{201C}']);
    let mut letters = word.chars();
    if let (Some(first), None) = (letters.next(), letters.next()) {
        if first.is_uppercase() {
            return true;
        }
    }
    let lower = word.to_lowercase();
    ABBREVIATIONS.contains(&lower.as_str())
}

fn push_trimmed<'a>(out: &mut Vec<Sentence<'a>>, text: &'a str, start: usize, end: usize) {
    let piece = &text[start..end];
    let trimmed_start = piece.trim_start();
    let lead = piece.len() - trimmed_start.len();
    let trimmed = trimmed_start.trim_end();
    if trimmed.is_empty() {
        return;
    }
    let start = start + lead;
    out.push(Sentence {
        text: trimmed,
        start,
        end: start + trimmed.len(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(text: &str) -> Vec<&str> {
        split(text).into_iter().map(|s| s.text).collect()
    }

    #[test]
    fn test_split_on_terminators() {
        assert_eq!(
            texts("Hello world. How are you? Fine!"),
            vec!["Hello world.", "How are you?", "Fine!"]
        );
    }

    #[test]
    fn test_offsets_point_into_source() {
        let text = "  First one.   Second one.  ";
        for s in split(text) {
            assert_eq!(&text[s.start..s.end], s.text);
        }
    }

    #[test]
    fn test_abbreviations_do_not_split() {
        assert_eq!(
            texts("Mr. Smith met Dr. Jones. They talked."),
            vec!["Mr. Smith met Dr. Jones.", "They talked."]
        );
    }

    #[test]
    fn test_street_type_after_address_ends_sentence() {
        assert_eq!(
            texts("I live at 12 Oak St. The University of Florida is great."),
            vec!["I live at 12 Oak St.", "The University of Florida is great."]
        );
        assert_eq!(
            texts("Dr. Smith works at 655 Reitz Union Dr. He is nice."),
            vec!["Dr. Smith works at 655 Reitz Union Dr.", "He is nice."]
        );
    }

    #[test]
    fn test_street_name_without_number_does_not_split() {
        assert_eq!(
            texts("We met on Main St. near the park."),
            vec!["We met on Main St. near the park."]
        );
    }

    #[test]
    fn test_initials_do_not_split() {
        assert_eq!(texts("J. R. Tolkien wrote books."), vec!["J. R. Tolkien wrote books."]);
    }

    #[test]
    fn test_eg_does_not_split() {
        assert_eq!(texts("Fruit, e.g. apples, is good."), vec!["Fruit, e.g. apples, is good."]);
    }

    #[test]
    fn test_decimal_point_does_not_split() {
        assert_eq!(texts("It costs 3.50 dollars."), vec!["It costs 3.50 dollars."]);
    }

    #[test]
    fn test_closing_quote_stays_with_sentence() {
        assert_eq!(
            texts("He said \"stop.\" Then he left."),
            vec!["He said \"stop.\"", "Then he left."]
        );
    }

    #[test]
    fn test_blank_line_ends_sentence() {
        assert_eq!(
            texts("Meeting notes\n\nAttendees were late"),
            vec!["Meeting notes", "Attendees were late"]
        );
    }

    #[test]
    fn test_single_newline_does_not_split() {
        assert_eq!(texts("one line\ncontinues here."), vec!["one line\ncontinues here."]);
    }

    #[test]
    fn test_no_terminator_is_one_sentence() {
        let text = "This is the official address of Reitz Union - 655 Reitz Union Dr";
        assert_eq!(texts(text), vec![text]);
    }

    #[test]
    fn test_empty_and_whitespace() {
        assert!(split("").is_empty());
        assert!(split("   \n\n  ").is_empty());
    }
}
