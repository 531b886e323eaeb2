//! Per-document-type field extractors.
//!
//! Every extractor takes the normalized blob and line list and returns a [`FieldRecord`]
//! carrying `document_type` plus whatever fields it could find. Missing fields are simply
//! absent; none of the extractors fail.

pub mod aadhaar;
pub mod driving_licence;
pub mod pan;
pub mod passport;

use crate::core::config::ExtractionConfig;
use crate::marksheet;
use crate::text::NormalizedText;
use crate::types::{DocumentType, FieldRecord};

/// Dispatch to the extractor for `document_type`.
///
/// `Unknown` yields a record holding only the document type.
pub fn extract_fields(document_type: DocumentType, text: &NormalizedText, config: &ExtractionConfig) -> FieldRecord {
    let blob = text.blob.as_str();
    let lines = text.lines.as_slice();

    let record = match document_type {
        DocumentType::Aadhaar => aadhaar::extract(blob, lines),
        DocumentType::Pan => pan::extract(blob, lines),
        DocumentType::DrivingLicence => driving_licence::extract(blob, lines),
        DocumentType::Passport => passport::extract(blob, lines),
        DocumentType::Marksheet => marksheet::reconstruct(blob, lines, &config.marksheet),
        DocumentType::Unknown => FieldRecord::for_document(DocumentType::Unknown),
    };

    tracing::debug!(
        document_type = document_type.as_str(),
        fields = record.len(),
        "Extracted fields"
    );
    record
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(lines: &[&str]) -> NormalizedText {
        let lines: Vec<String> = lines.iter().map(|s| s.to_string()).collect();
        NormalizedText {
            blob: lines.join(" "),
            lines,
        }
    }

    #[test]
    fn test_unknown_has_only_document_type() {
        let record = extract_fields(DocumentType::Unknown, &text(&["hello"]), &ExtractionConfig::default());
        assert_eq!(record.len(), 1);
        assert_eq!(record.document_type(), DocumentType::Unknown);
    }

    #[test]
    fn test_dispatch_sets_document_type() {
        let input = text(&["ABCDE1234F"]);
        let record = extract_fields(DocumentType::Pan, &input, &ExtractionConfig::default());
        assert_eq!(record.document_type(), DocumentType::Pan);
        assert_eq!(record.get_text("pan_number"), Some("ABCDE1234F"));
    }
}
