use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;

static WHITESPACE_RUNS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("Whitespace regex pattern is valid and should compile"));

/// Collapse every whitespace run to a single space and trim the ends.
pub fn collapse_whitespace(text: &str) -> Cow<'_, str> {
    let trimmed = text.trim();
    if trimmed.contains(|c: char| c.is_whitespace() && c != ' ') || trimmed.contains("  ") {
        Cow::Owned(WHITESPACE_RUNS.replace_all(trimmed, " ").into_owned())
    } else {
        Cow::Borrowed(trimmed)
    }
}

/// Uppercase the first letter, lowercase the rest.
pub fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Capitalize each whitespace-separated word.
pub fn title_case(text: &str) -> String {
    text.split_whitespace().map(capitalize).collect::<Vec<_>>().join(" ")
}

/// True when `text` has at least one letter and no lowercase letters.
pub fn is_all_caps(text: &str) -> bool {
    text.chars().any(char::is_alphabetic) && !text.chars().any(char::is_lowercase)
}

/// True when every word starts uppercase and continues lowercase ("Ravi Kumar").
pub fn is_title_case(text: &str) -> bool {
    let mut words = text.split_whitespace().peekable();
    if words.peek().is_none() {
        return false;
    }
    words.all(|w| {
        let mut chars = w.chars();
        matches!(chars.next(), Some(c) if c.is_uppercase())
            && chars.all(|c| c.is_lowercase() || c == '.' || c == '\'')
    })
}

/// True for a non-empty string of ASCII digits.
pub fn is_digits(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit())
}

pub fn has_digit(text: &str) -> bool {
    text.bytes().any(|b| b.is_ascii_digit())
}

pub fn has_letter(text: &str) -> bool {
    text.chars().any(char::is_alphabetic)
}

/// Case-insensitive substring test against a list of markers.
pub fn contains_any_ci(text: &str, markers: &[&str]) -> bool {
    let lower = text.to_lowercase();
    markers.iter().any(|m| lower.contains(&m.to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  a \t b\n\nc  "), "a b c");
        assert!(matches!(collapse_whitespace("a b"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("RAVI  KUMAR"), "Ravi Kumar");
        assert_eq!(title_case("anna university"), "Anna University");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn test_case_predicates() {
        assert!(is_all_caps("RAVI KUMAR"));
        assert!(!is_all_caps("1234"));
        assert!(is_title_case("Ravi Kumar"));
        assert!(!is_title_case("Ravi kumar"));
        assert!(!is_title_case(""));
    }

    #[test]
    fn test_is_digits() {
        assert!(is_digits("093"));
        assert!(!is_digits(""));
        assert!(!is_digits("9a"));
    }

    #[test]
    fn test_contains_any_ci() {
        assert!(contains_any_ci("Government of India", &["govt", "government"]));
        assert!(!contains_any_ci("Ravi Kumar", &["govt"]));
    }
}
