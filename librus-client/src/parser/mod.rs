//! HTML response parsing utilities

mod messages;
mod timetable;

pub use messages::{MessagePage, MessageParser};
pub use timetable::TimetableParser;

/// Collapse every whitespace run (newlines, non-breaking spaces and literal
/// `&nbsp` remnants included) into a single space and trim the ends
pub fn sanitize(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&nbsp", " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const NBSP: char = '\u{a0}';

    #[test]
    fn test_sanitize_mixed_whitespace() {
        assert_eq!(sanitize("A\u{a0}\u{a0}B\n\nC  D"), "A B C D");
    }

    #[test]
    fn test_sanitize_nbsp_remnants() {
        assert_eq!(sanitize("&nbsp;-&nbsp;Jan Kowalski"), "- Jan Kowalski");
        assert_eq!(sanitize("Jan&nbspKowalski"), "Jan Kowalski");
    }

    #[test]
    fn test_sanitize_blank() {
        assert_eq!(sanitize(" \n\t\u{a0} "), "");
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        #[test]
        fn prop_sanitize_normal_form(text in "[a-zA-Z \\n\\t\u{a0}]{0,100}") {
            let clean = sanitize(&text);

            prop_assert!(!clean.contains('\n'));
            prop_assert!(!clean.contains(NBSP), "non-breaking space left in {:?}", clean);
            prop_assert!(!clean.contains("  "));
            prop_assert_eq!(clean.trim(), clean.as_str());
            prop_assert_eq!(sanitize(&clean), clean.clone());
        }
    }
}
