//! Document classification.
//!
//! An ordered cascade over the normalized blob: the first rule that matches decides the
//! document type. Identity-number shapes are checked before keywords because they are the
//! most discriminating signal; marksheets come before driving licences and passports because
//! their keywords ("result", "subject") rarely appear on identity cards.

use crate::types::DocumentType;
use once_cell::sync::Lazy;
use regex::Regex;

static AADHAAR_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\d{4}\s?\d{4}\s?\d{4}\b").expect("Aadhaar number regex pattern is valid"));
static PAN_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Z]{5}[0-9]{4}[A-Z]\b").expect("PAN number regex pattern is valid"));
static MARKSHEET_KEYWORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:university|marks|semester|subject|result)\b").expect("Marksheet keyword regex pattern is valid")
});
static DRIVING_LICENCE_KEYWORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\bdl\s*no\b|driving\s+licen[cs]e|valid\s+throughout\s+india|\bmcwg\b|\blmv\b|licen[cs]ing\s+authority|\bform\s*-?\s*7\b",
    )
    .expect("Driving licence keyword regex pattern is valid")
});
static PASSPORT_KEYWORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)passport|\bp<|republic\s+of\s+india|/\s*nationality").expect("Passport keyword regex pattern is valid")
});

/// Classify a document from its normalized blob.
///
/// Total and pure: every input, including the empty string, yields exactly one tag.
/// The cleaned lines are accepted for signature symmetry with the extractors; the blob
/// already contains every line.
pub fn classify(blob: &str, _lines: &[String]) -> DocumentType {
    let document_type = if AADHAAR_NUMBER.is_match(blob) {
        DocumentType::Aadhaar
    } else if PAN_NUMBER.is_match(blob) {
        DocumentType::Pan
    } else if MARKSHEET_KEYWORDS.is_match(blob) {
        DocumentType::Marksheet
    } else if DRIVING_LICENCE_KEYWORDS.is_match(blob) {
        DocumentType::DrivingLicence
    } else if PASSPORT_KEYWORDS.is_match(blob) {
        DocumentType::Passport
    } else {
        DocumentType::Unknown
    };

    tracing::debug!(document_type = %document_type, "Classified document");
    document_type
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify_blob(blob: &str) -> DocumentType {
        classify(blob, &[])
    }

    #[test]
    fn test_aadhaar_with_and_without_spaces() {
        assert_eq!(classify_blob("Ravi Kumar MALE 2345 6789 0123"), DocumentType::Aadhaar);
        assert_eq!(classify_blob("234567890123"), DocumentType::Aadhaar);
    }

    #[test]
    fn test_aadhaar_wins_over_pan() {
        assert_eq!(classify_blob("ABCDE1234F 2345 6789 0123"), DocumentType::Aadhaar);
    }

    #[test]
    fn test_pan() {
        assert_eq!(
            classify_blob("INCOME TAX DEPARTMENT RAVI KUMAR ABCDE1234F"),
            DocumentType::Pan
        );
    }

    #[test]
    fn test_marksheet_keywords() {
        assert_eq!(classify_blob("Visvesvaraya Technological University Semester 3"), DocumentType::Marksheet);
        assert_eq!(classify_blob("Subject Code 18CS31"), DocumentType::Marksheet);
    }

    #[test]
    fn test_driving_licence_keywords() {
        assert_eq!(classify_blob("DL No KA01 20190001234"), DocumentType::DrivingLicence);
        assert_eq!(classify_blob("Indian Union Driving Licence"), DocumentType::DrivingLicence);
        assert_eq!(classify_blob("Valid Throughout India"), DocumentType::DrivingLicence);
    }

    #[test]
    fn test_passport_keywords() {
        assert_eq!(classify_blob("REPUBLIC OF INDIA Type/Type P"), DocumentType::Passport);
        assert_eq!(classify_blob("P<INDSHARMA<<RAVI<<<<"), DocumentType::Passport);
    }

    #[test]
    fn test_empty_and_unmatched_are_unknown() {
        assert_eq!(classify_blob(""), DocumentType::Unknown);
        assert_eq!(classify_blob("hello world"), DocumentType::Unknown);
    }

    #[test]
    fn test_pure_and_deterministic() {
        let blob = "Semester 5 Result";
        assert_eq!(classify_blob(blob), classify_blob(blob));
    }
}
