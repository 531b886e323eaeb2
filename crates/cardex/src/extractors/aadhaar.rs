//! Aadhaar card field extraction.

use crate::core::config::DateStyle;
use crate::text::dates::{DateMatch, find_dates};
use crate::text::string_utils::{contains_any_ci, title_case};
use crate::types::{DocumentType, FieldRecord};
use once_cell::sync::Lazy;
use regex::Regex;

static AADHAAR_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(\d{4})\s?(\d{4})\s?(\d{4})\b").expect("Aadhaar number regex pattern is valid")
});
static YEAR_OF_BIRTH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:year\s+of\s+birth|\byob\b)\s*[:\-/]?\s*(\d{4})\b").expect("Year of birth regex pattern is valid")
});
static GENDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(male|female)\b").expect("Gender regex pattern is valid"));
static LEGEND: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)nomenclature|abbreviations").expect("Legend regex pattern is valid"));
static TITLE_CASE_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z][a-z]+(?:\s[A-Z][a-z]+)+$").expect("Title case name regex pattern is valid"));
static CAPS_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z\s]+$").expect("Caps name regex pattern is valid"));

/// Words printed before a date that make it something other than the date of birth.
const DOB_NOISE_CONTEXT: &[&str] = &["download", "issue", "generated", "valid", "update"];
const DOB_CONTEXT_WINDOW: usize = 25;

/// Lines carrying any of these are card furniture, never the holder's name.
const NAME_NOISE: &[&str] = &[
    "govt",
    "india",
    "unique",
    "authorit",
    "enrollment",
    "enrolment",
    "help",
    "www",
    "dob",
    "year",
    "male",
    "female",
];

/// Extract Aadhaar fields. Absent fields are left out of the record.
pub fn extract(blob: &str, lines: &[String]) -> FieldRecord {
    let mut record = FieldRecord::for_document(DocumentType::Aadhaar);
    record.insert_opt("aadhaar_number", aadhaar_number(blob));
    record.insert_opt("dob", date_of_birth(blob));
    record.insert_opt("gender", gender(blob));
    record.insert_opt("name", name(lines));
    record
}

/// The first 12-digit group, regrouped as `XXXX XXXX XXXX`.
pub fn aadhaar_number(blob: &str) -> Option<String> {
    AADHAAR_NUMBER
        .captures(blob)
        .map(|caps| format!("{} {} {}", &caps[1], &caps[2], &caps[3]))
}

fn date_of_birth(blob: &str) -> Option<String> {
    let is_noise = |date: &DateMatch| {
        let mut from = date.start.saturating_sub(DOB_CONTEXT_WINDOW);
        while !blob.is_char_boundary(from) {
            from -= 1;
        }
        contains_any_ci(&blob[from..date.start], DOB_NOISE_CONTEXT)
    };

    if let Some(date) = find_dates(blob).into_iter().find(|d| !is_noise(d)) {
        return Some(date.format(DateStyle::DayFirst));
    }

    YEAR_OF_BIRTH
        .captures(blob)
        .map(|caps| format!("01-01-{}", &caps[1]))
}

/// Earliest MALE/FEMALE token, ignoring the abbreviation legend some cards print at the bottom.
fn gender(blob: &str) -> Option<&'static str> {
    let zone = match LEGEND.find(blob) {
        Some(legend) => &blob[..legend.start()],
        None => blob,
    };
    GENDER.captures(zone).map(|caps| {
        if caps[1].eq_ignore_ascii_case("male") {
            "Male"
        } else {
            "Female"
        }
    })
}

fn name(lines: &[String]) -> Option<String> {
    lines
        .iter()
        .filter(|line| !contains_any_ci(line, NAME_NOISE))
        .find(|line| {
            TITLE_CASE_NAME.is_match(line)
                || (CAPS_NAME.is_match(line) && line.split_whitespace().count() >= 2)
        })
        .map(|line| title_case(line))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_full_card() {
        let lines = lines(&[
            "Government of India",
            "Ravi Kumar",
            "DOB: 12/05/1990",
            "MALE",
            "2345 6789 0123",
        ]);
        let record = extract(&lines.join(" "), &lines);
        assert_eq!(record.get_text("aadhaar_number"), Some("2345 6789 0123"));
        assert_eq!(record.get_text("dob"), Some("12-05-1990"));
        assert_eq!(record.get_text("gender"), Some("Male"));
        assert_eq!(record.get_text("name"), Some("Ravi Kumar"));
        assert_eq!(record.document_type(), DocumentType::Aadhaar);
    }

    #[test]
    fn test_number_regrouped_from_unspaced_digits() {
        assert_eq!(aadhaar_number("No. 234567890123").as_deref(), Some("2345 6789 0123"));
    }

    #[test]
    fn test_download_date_is_not_dob() {
        let blob = "Download Date: 01/02/2023 Priya Sharma DOB: 03/04/1995";
        assert_eq!(date_of_birth(blob).as_deref(), Some("03-04-1995"));
    }

    #[test]
    fn test_year_of_birth_fallback() {
        assert_eq!(date_of_birth("Year of Birth : 1987").as_deref(), Some("01-01-1987"));
    }

    // Earliest-occurrence tie-break is a heuristic; these pin the current behaviour.
    #[test]
    fn test_gender_earliest_token_wins() {
        assert_eq!(gender("FEMALE ... MALE"), Some("Female"));
        assert_eq!(gender("Male / Female"), Some("Male"));
    }

    #[test]
    fn test_gender_ignores_legend() {
        assert_eq!(gender("Ravi Abbreviations: M = MALE F = FEMALE"), None);
        assert_eq!(gender("FEMALE Nomenclature MALE"), Some("Female"));
    }

    #[test]
    fn test_all_caps_name_title_cased() {
        let lines = lines(&["GOVERNMENT OF INDIA", "RAVI", "RAVI KUMAR", "DOB 12/05/1990"]);
        assert_eq!(name(&lines).as_deref(), Some("Ravi Kumar"));
    }

    #[test]
    fn test_missing_fields_are_absent() {
        let record = extract("", &[]);
        assert_eq!(record.len(), 1);
        assert!(!record.contains_key("aadhaar_number"));
    }
}
