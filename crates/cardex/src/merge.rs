//! Merge & clean layer.
//!
//! The layout model's guess comes in first, OCR-derived fields are laid on top, and pipeline
//! metadata (face crop, confidence score, raw text) goes last. The merged record is then
//! renormalized: dates to one separator convention, shouted names to title case, institution
//! names to their canonical form.

use crate::core::config::MergeConfig;
use crate::text::dates::normalize_date;
use crate::text::institution::canonicalize_institution;
use crate::text::string_utils::{contains_any_ci, is_all_caps, title_case};
use crate::types::{FieldRecord, FieldValue};

const PERSON_NAME_FIELDS: &[&str] = &["name", "father_name", "student_name", "full_name"];
const INSTITUTION_FIELDS: &[&str] = &["university_name", "college_name"];

/// Filler the marksheet extractor writes for header fields it could not find.
const UNKNOWN_PLACEHOLDER: &str = "Unknown";

/// Union of layout, OCR and extra fields.
///
/// OCR values override layout values, except that a blank or `"Unknown"` OCR value never
/// erases a real layout value. Layout-only keys whose names carry a portal-watermark marker
/// (`noise_key_markers`) are dropped. Merging an empty layout record and no extras returns
/// the OCR record unchanged.
pub fn merge(layout: FieldRecord, ocr: FieldRecord, extra: FieldRecord, config: &MergeConfig) -> FieldRecord {
    let markers: Vec<&str> = config.noise_key_markers.iter().map(String::as_str).collect();

    let mut merged: FieldRecord = layout
        .into_iter()
        .filter(|(key, _)| ocr.contains_key(key) || !contains_any_ci(key, &markers))
        .collect();

    for (key, value) in ocr {
        let keep_layout = is_placeholder(&value) && merged.get(&key).is_some_and(|existing| !is_placeholder(existing));
        if !keep_layout {
            merged.insert(key, value);
        }
    }

    for (key, value) in extra {
        merged.insert(key, value);
    }

    merged
}

fn is_placeholder(value: &FieldValue) -> bool {
    value.is_blank() || value.as_text().is_some_and(|text| text.trim() == UNKNOWN_PLACEHOLDER)
}

/// Renormalize a merged record in place.
pub fn clean(record: &mut FieldRecord, config: &MergeConfig) {
    for (key, value) in record.iter_mut() {
        normalize_dates(value, config);

        if PERSON_NAME_FIELDS.contains(&key.as_str())
            && let FieldValue::Text(name) = value
            && is_all_caps(name)
        {
            *name = title_case(name);
        }

        if INSTITUTION_FIELDS.contains(&key.as_str())
            && let FieldValue::Text(institution) = value
            && let Some(canonical) = canonicalize_institution(institution, config)
        {
            *institution = canonical;
        }
    }
}

/// [`merge`] followed by [`clean`].
pub fn merge_and_clean(layout: FieldRecord, ocr: FieldRecord, extra: FieldRecord, config: &MergeConfig) -> FieldRecord {
    let mut record = merge(layout, ocr, extra, config);
    clean(&mut record, config);
    record
}

fn normalize_dates(value: &mut FieldValue, config: &MergeConfig) {
    match value {
        FieldValue::Text(text) => {
            if let Some(date) = normalize_date(text, config.date_style) {
                *text = date;
            }
        }
        FieldValue::List(items) => items.iter_mut().for_each(|item| normalize_dates(item, config)),
        FieldValue::Map(map) => map.values_mut().for_each(|item| normalize_dates(item, config)),
        FieldValue::Number(_) | FieldValue::Subjects(_) => {}
    }
}
