//! University marksheet reconstruction.
//!
//! Header fields (university, college, seat number, student name, percentage) come from a
//! single label/regex scan over the whole document. The subject table comes from the
//! [`state`] machine, which walks the same lines independently.

pub mod state;
pub mod table;

pub use state::{ParseState, Reconstructor, reconstruct_table};
pub use table::SemesterTable;

use crate::core::config::MarksheetConfig;
use crate::text::string_utils::{collapse_whitespace, contains_any_ci, title_case};
use crate::types::{DocumentType, FieldRecord, FieldValue, SubjectResult};
use once_cell::sync::Lazy;
use regex::Regex;

static UNIVERSITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(Visvesvaraya\s+Technological\s+University|\bVTU\b|Anna\s+University|Osmania\s+University|Jawaharlal\s+Nehru\s+Technological\s+University|\bJNTU[A-Z]*\b|University\s+of\s+[A-Z][a-z]+(?:\s+[A-Z][a-z]+)?)",
    )
    .expect("University regex pattern is valid")
});
static USN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([1-4][A-Z]{2}\d{2}[A-Z]{2,6}\d{1,3})\b").expect("USN regex pattern is valid"));
static USN_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:USN|Seat\s*(?:No|Number))\.?\s*[:\-]?\s*([A-Z0-9]{6,12})\b").expect("USN label regex pattern is valid")
});
static PERCENTAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{1,3}\.\d{1,2})\s*%").expect("Percentage regex pattern is valid"));

const UNKNOWN: &str = "Unknown";
const NAME_REJECT: &[&str] = &["usn", "semester", "result"];
const OTHER_NAME_LABELS: &[&str] = &["college", "institute", "university", "father", "mother"];

/// Reconstruct a marksheet record from its blob and cleaned lines.
pub fn reconstruct(blob: &str, lines: &[String], config: &MarksheetConfig) -> FieldRecord {
    let mut record = FieldRecord::for_document(DocumentType::Marksheet);
    record.insert("university_name", university_name(blob).unwrap_or_else(|| UNKNOWN.to_string()));
    record.insert("college_name", college_name(lines).unwrap_or_else(|| UNKNOWN.to_string()));
    record.insert("student_name", student_name(lines).unwrap_or_else(|| UNKNOWN.to_string()));
    record.insert("seat_number", seat_number(blob).unwrap_or_else(|| UNKNOWN.to_string()));

    let table = reconstruct_table(lines, config);
    tracing::debug!(
        max_semester = ?table.max_semester(),
        subjects = table.total_subjects(),
        "Reconstructed marksheet table"
    );

    let semester = table
        .max_semester()
        .map(|n| n.to_string())
        .unwrap_or_else(|| UNKNOWN.to_string());
    record.insert("semester", semester);
    record.insert("subjects", table.current_subjects().to_vec());
    for backlog in [1, 2] {
        if let Some(subjects) = table.backlog(backlog) {
            record.insert(format!("semester_{backlog}"), subjects.to_vec());
        }
    }

    record.insert_opt("percentage", percentage(blob));
    record.insert("remarks", FieldValue::Map(SubjectResult::legend()));
    record
}

pub fn university_name(blob: &str) -> Option<String> {
    UNIVERSITY
        .captures(blob)
        .map(|caps| collapse_whitespace(&caps[1]).into_owned())
}

/// First line naming a college or institute, with any leading label removed.
pub fn college_name(lines: &[String]) -> Option<String> {
    lines
        .iter()
        .find(|line| contains_any_ci(line, &["college", "institute"]))
        .map(|line| match line.split_once(':') {
            Some((label, value)) if contains_any_ci(label, &["name"]) && !value.trim().is_empty() => {
                value.trim().to_string()
            }
            _ => line.trim().to_string(),
        })
}

/// University seat number: a USN-shaped code anywhere, else the value after a `USN:` label.
pub fn seat_number(blob: &str) -> Option<String> {
    USN.captures(blob)
        .or_else(|| USN_LABEL.captures(blob))
        .map(|caps| caps[1].to_uppercase())
}

pub fn student_name(lines: &[String]) -> Option<String> {
    let accept = |candidate: &str| {
        let candidate = candidate.trim();
        let lower = candidate.to_lowercase();
        (!candidate.is_empty() && !NAME_REJECT.iter().any(|w| lower.contains(w))).then(|| title_case(candidate))
    };

    for (i, line) in lines.iter().enumerate() {
        if line.contains("Name") && line.contains(':') {
            if let Some((label, value)) = line.split_once(':')
                && !contains_any_ci(label, OTHER_NAME_LABELS)
                && let Some(name) = accept(value.split(':').next().unwrap_or(value))
            {
                return Some(name);
            }
        } else if (line.contains("Name") || line.contains("NAME"))
            && let Some(next) = lines.get(i + 1)
            && let Some(value) = next.strip_prefix(':')
            && let Some(name) = accept(&value.replace(':', ""))
        {
            return Some(name);
        }
    }
    None
}

pub fn percentage(blob: &str) -> Option<String> {
    PERCENTAGE.captures(blob).map(|caps| caps[1].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_two_subjects_single_semester() {
        let lines = lines(&[
            "Semester: 3",
            "18CS31",
            "Data Structures",
            "28",
            "65",
            "93",
            "P",
            "18CS32",
            "Mathematics",
            "25",
            "60",
            "85",
            "F",
        ]);
        let record = reconstruct(&lines.join(" "), &lines, &MarksheetConfig::default());

        assert_eq!(record.get_text("semester"), Some("3"));
        let subjects = record.get("subjects").and_then(FieldValue::as_subjects).unwrap();
        assert_eq!(subjects.len(), 2);
        assert_eq!(subjects[0].subject_code, "18CS31");
        assert_eq!(subjects[0].subject_name, "Data Structures");
        assert_eq!(subjects[0].result, SubjectResult::Pass);
        assert_eq!(subjects[1].total, "85");
        assert_eq!(subjects[1].result, SubjectResult::Fail);
        assert!(!record.contains_key("semester_1"));
        assert!(!record.contains_key("semester_2"));
    }

    #[test]
    fn test_header_fields() {
        let lines = lines(&[
            "VISVESVARAYA TECHNOLOGICAL UNIVERSITY, BELAGAVI",
            "College Name: R V College of Engineering",
            "Student Name: PRIYA SHARMA",
            "University Seat Number 1RV18CS101",
            "Percentage 78.50 %",
        ]);
        let record = reconstruct(&lines.join("\n"), &lines, &MarksheetConfig::default());
        assert_eq!(record.get_text("university_name"), Some("VISVESVARAYA TECHNOLOGICAL UNIVERSITY"));
        assert_eq!(record.get_text("college_name"), Some("R V College of Engineering"));
        assert_eq!(record.get_text("student_name"), Some("Priya Sharma"));
        assert_eq!(record.get_text("seat_number"), Some("1RV18CS101"));
        assert_eq!(record.get_text("percentage"), Some("78.50"));
        assert_eq!(record.get_text("semester"), Some("Unknown"));
    }

    #[test]
    fn test_defaults_when_header_missing() {
        let record = reconstruct("", &[], &MarksheetConfig::default());
        for key in ["university_name", "college_name", "student_name", "seat_number", "semester"] {
            assert_eq!(record.get_text(key), Some("Unknown"), "{key}");
        }
        assert_eq!(record.get("subjects").and_then(FieldValue::as_subjects).map(<[_]>::len), Some(0));
        assert!(record.get("remarks").and_then(FieldValue::as_map).is_some());
        assert!(!record.contains_key("percentage"));
    }

    #[test]
    fn test_name_on_following_colon_line() {
        let lines = lines(&["NAME OF THE CANDIDATE", ": ANIL KUMAR"]);
        assert_eq!(student_name(&lines).as_deref(), Some("Anil Kumar"));
    }

    #[test]
    fn test_name_rejects_usn_value() {
        let lines = lines(&["Name: USN 1RV18CS101", "Student Name: Meera Rao"]);
        assert_eq!(student_name(&lines).as_deref(), Some("Meera Rao"));
    }

    #[test]
    fn test_usn_label_fallback() {
        assert_eq!(seat_number("USN: 5XY22AB01").as_deref(), Some("5XY22AB01"));
    }

    #[test]
    fn test_backlog_semesters_exposed() {
        let lines = lines(&[
            "Semester 1",
            "18MAT11",
            "Calculus",
            "20",
            "21",
            "41",
            "F",
            "Semester 3",
            "18CS31",
            "Data Structures",
            "28",
            "65",
            "93",
            "P",
        ]);
        let record = reconstruct("", &lines, &MarksheetConfig::default());
        assert_eq!(record.get_text("semester"), Some("3"));
        let backlog = record.get("semester_1").and_then(FieldValue::as_subjects).unwrap();
        assert_eq!(backlog[0].subject_code, "18MAT11");
        assert!(!record.contains_key("semester_2"));
    }
}
