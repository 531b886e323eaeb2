//! Per-document-type record shapes.

use crate::types::DocumentType;
use once_cell::sync::Lazy;
use regex::Regex;

static AADHAAR_FORMAT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}\s\d{4}\s\d{4}$").expect("Aadhaar format regex pattern is valid"));
static PAN_FORMAT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]{5}[0-9]{4}[A-Z]$").expect("PAN format regex pattern is valid"));
static DL_FORMAT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]{2}[0-9]{2,14}$").expect("Driving licence format regex pattern is valid"));
static PASSPORT_FORMAT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z][0-9]{7}$").expect("Passport format regex pattern is valid"));

/// Identifier formats checked by the validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdFormat {
    Aadhaar,
    Pan,
    DrivingLicence,
    Passport,
}

impl IdFormat {
    /// Canonical form of `value` for this format: licence numbers lose spaces and hyphens.
    pub fn canonical(&self, value: &str) -> String {
        match self {
            IdFormat::DrivingLicence => value.chars().filter(|c| !c.is_whitespace() && *c != '-').collect(),
            IdFormat::Passport => value.trim().to_string(),
            IdFormat::Aadhaar | IdFormat::Pan => value.to_string(),
        }
    }

    pub fn matches(&self, value: &str) -> bool {
        let canonical = self.canonical(value);
        match self {
            IdFormat::Aadhaar => AADHAAR_FORMAT.is_match(&canonical),
            IdFormat::Pan => PAN_FORMAT.is_match(&canonical),
            IdFormat::DrivingLicence => DL_FORMAT.is_match(&canonical),
            IdFormat::Passport => PASSPORT_FORMAT.is_match(&canonical),
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            IdFormat::Aadhaar => "XXXX XXXX XXXX digits",
            IdFormat::Pan => "5 letters, 4 digits, 1 letter",
            IdFormat::DrivingLicence => "2 letters followed by 2-14 digits",
            IdFormat::Passport => "1 letter followed by 7 digits",
        }
    }
}

/// Expected value shape of one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Number,
    Map,
    List,
    Subjects,
    Identifier(IdFormat),
}

#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

const fn required(name: &'static str, kind: FieldKind) -> FieldRule {
    FieldRule {
        name,
        kind,
        required: true,
    }
}

const fn optional(name: &'static str, kind: FieldKind) -> FieldRule {
    FieldRule {
        name,
        kind,
        required: false,
    }
}

const BASE: &[FieldRule] = &[
    required("document_type", FieldKind::Text),
    optional("face_image", FieldKind::Text),
    optional("ocr_accuracy_score", FieldKind::Number),
];

const AADHAAR: &[FieldRule] = &[
    required("aadhaar_number", FieldKind::Identifier(IdFormat::Aadhaar)),
    optional("name", FieldKind::Text),
    optional("dob", FieldKind::Text),
    optional("gender", FieldKind::Text),
];

const PAN: &[FieldRule] = &[
    required("pan_number", FieldKind::Identifier(IdFormat::Pan)),
    optional("name", FieldKind::Text),
    optional("father_name", FieldKind::Text),
    optional("dob", FieldKind::Text),
];

const DRIVING_LICENCE: &[FieldRule] = &[
    required("dl_number", FieldKind::Identifier(IdFormat::DrivingLicence)),
    optional("name", FieldKind::Text),
    optional("father_name", FieldKind::Text),
    optional("dob", FieldKind::Text),
    optional("date_of_issue", FieldKind::Text),
    optional("valid_till", FieldKind::Text),
    optional("address", FieldKind::Map),
    optional("vehicle_classes", FieldKind::List),
    optional("issuing_authority", FieldKind::Text),
    optional("national_validity", FieldKind::Text),
    optional("form_number", FieldKind::Text),
];

const PASSPORT: &[FieldRule] = &[
    required("passport_number", FieldKind::Identifier(IdFormat::Passport)),
    optional("surname", FieldKind::Text),
    optional("given_names", FieldKind::Text),
    optional("full_name", FieldKind::Text),
    optional("date_of_birth", FieldKind::Text),
    optional("sex", FieldKind::Text),
    optional("nationality", FieldKind::Text),
    optional("date_of_issue", FieldKind::Text),
    optional("date_of_expiry", FieldKind::Text),
    optional("mrz", FieldKind::Map),
];

const MARKSHEET: &[FieldRule] = &[
    required("subjects", FieldKind::Subjects),
    optional("semester", FieldKind::Text),
    optional("semester_1", FieldKind::Subjects),
    optional("semester_2", FieldKind::Subjects),
    optional("university_name", FieldKind::Text),
    optional("college_name", FieldKind::Text),
    optional("student_name", FieldKind::Text),
    optional("seat_number", FieldKind::Text),
    optional("percentage", FieldKind::Text),
    optional("remarks", FieldKind::Map),
];

/// Field rules for one document type. Fields not listed are accepted as-is.
#[derive(Debug, Clone, Copy)]
pub struct DocumentSchema {
    pub document_type: DocumentType,
    specific: &'static [FieldRule],
}

impl DocumentSchema {
    pub fn for_type(document_type: DocumentType) -> Self {
        let specific = match document_type {
            DocumentType::Aadhaar => AADHAAR,
            DocumentType::Pan => PAN,
            DocumentType::DrivingLicence => DRIVING_LICENCE,
            DocumentType::Passport => PASSPORT,
            DocumentType::Marksheet => MARKSHEET,
            DocumentType::Unknown => &[],
        };
        Self {
            document_type,
            specific,
        }
    }

    /// Base rules followed by the type-specific ones.
    pub fn rules(&self) -> impl Iterator<Item = &FieldRule> {
        BASE.iter().chain(self.specific.iter())
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.rules().filter(|rule| rule.required).map(|rule| rule.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_fields_per_type() {
        let required: Vec<_> = DocumentSchema::for_type(DocumentType::Pan).required_fields().collect();
        assert_eq!(required, vec!["document_type", "pan_number"]);

        let required: Vec<_> = DocumentSchema::for_type(DocumentType::Unknown).required_fields().collect();
        assert_eq!(required, vec!["document_type"]);
    }

    #[test]
    fn test_id_formats() {
        assert!(IdFormat::Aadhaar.matches("1234 5678 9012"));
        assert!(!IdFormat::Aadhaar.matches("123456789012"));
        assert!(IdFormat::DrivingLicence.matches("KA-01 20190012345"));
        assert!(!IdFormat::DrivingLicence.matches("KA01X2019"));
        assert!(IdFormat::Passport.matches(" J1234567 "));
        assert!(!IdFormat::Passport.matches("j1234567"));
        assert!(!IdFormat::Pan.matches("abcde1234f"));
    }
}
