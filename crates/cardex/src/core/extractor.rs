//! Synchronous core: line stream in, classified field record out.
//!
//! No I/O and no collaborators live here. Everything is a pure function of the line stream
//! and the configuration, so it is safe to call from any number of threads at once.

use crate::classifier::classify;
use crate::core::config::ExtractionConfig;
use crate::extractors::extract_fields;
use crate::text::{NormalizedText, normalize};
use crate::types::{DocumentType, FieldRecord, LineStream};

/// Output of the synchronous core.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub document_type: DocumentType,
    pub fields: FieldRecord,
    /// Normalized text the fields were extracted from.
    pub normalized: NormalizedText,
}

/// Normalize, classify and extract.
///
/// An empty stream yields `Unknown` with only the `document_type` field.
pub fn extract_lines(stream: &LineStream, config: &ExtractionConfig) -> Extraction {
    extract_with_raw_text(stream, None, config)
}

/// Like [`extract_lines`], with the engine's own concatenated page text used as the blob.
pub fn extract_with_raw_text(stream: &LineStream, raw_text: Option<&str>, config: &ExtractionConfig) -> Extraction {
    let normalized = normalize(stream, raw_text, &config.normalizer);
    let document_type = classify(&normalized.blob, &normalized.lines);
    let fields = extract_fields(document_type, &normalized, config);

    tracing::debug!(
        lines = normalized.lines.len(),
        document_type = document_type.as_str(),
        "Core extraction finished"
    );

    Extraction {
        document_type,
        fields,
        normalized,
    }
}

/// Classify without extracting.
pub fn classify_lines(stream: &LineStream, config: &ExtractionConfig) -> DocumentType {
    let normalized = normalize(stream, None, &config.normalizer);
    classify(&normalized.blob, &normalized.lines)
}
