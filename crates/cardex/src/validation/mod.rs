//! Schema validation of merged records.
//!
//! Validation never fails the pipeline. A rejected record is handed back unchanged together
//! with a message listing every problem found; an accepted record may come back lightly
//! coerced (licence numbers without separators, numeric strings as numbers).

pub mod schema;

pub use schema::{DocumentSchema, FieldKind, FieldRule, IdFormat};

use crate::types::{DocumentType, FieldRecord, FieldValue};

/// Result of validating one record.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationOutcome {
    pub valid: bool,
    /// Coerced record when valid, the original record otherwise.
    pub record: FieldRecord,
    /// `"; "`-joined problems, `None` when valid.
    pub error: Option<String>,
}

/// Validates records against the schema of their `document_type` field.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaValidator;

impl SchemaValidator {
    pub fn new() -> Self {
        Self
    }

    pub fn validate(&self, record: &FieldRecord) -> ValidationOutcome {
        let document_type = record.document_type();
        let schema = DocumentSchema::for_type(document_type);

        let mut coerced = record.clone();
        let mut errors = Vec::new();

        for rule in schema.rules() {
            match coerced.get_mut(rule.name) {
                None => {
                    if rule.required {
                        errors.push(format!("{}: field required", rule.name));
                    }
                }
                Some(value) => {
                    if let Err(problem) = check_field(rule.kind, value) {
                        errors.push(format!("{}: {}", rule.name, problem));
                    }
                }
            }
        }

        if errors.is_empty() {
            ValidationOutcome {
                valid: true,
                record: coerced,
                error: None,
            }
        } else {
            let message = errors.join("; ");
            tracing::debug!(
                document_type = document_type.as_str(),
                error = %message,
                "Record failed validation"
            );
            ValidationOutcome {
                valid: false,
                record: record.clone(),
                error: Some(message),
            }
        }
    }
}

/// Validate with the default validator.
pub fn validate_record(record: &FieldRecord) -> ValidationOutcome {
    SchemaValidator::new().validate(record)
}

fn check_field(kind: FieldKind, value: &mut FieldValue) -> Result<(), String> {
    match kind {
        FieldKind::Text => value.as_text().map(|_| ()).ok_or_else(|| "expected a string".to_string()),
        FieldKind::Number => match value {
            FieldValue::Number(_) => Ok(()),
            FieldValue::Text(text) => {
                let number: f64 = text.trim().parse().map_err(|_| "expected a number".to_string())?;
                *value = FieldValue::Number(number);
                Ok(())
            }
            _ => Err("expected a number".to_string()),
        },
        FieldKind::Map => value.as_map().map(|_| ()).ok_or_else(|| "expected an object".to_string()),
        FieldKind::List => match value {
            FieldValue::List(_) | FieldValue::Subjects(_) => Ok(()),
            _ => Err("expected a list".to_string()),
        },
        FieldKind::Subjects => value
            .as_subjects()
            .map(|_| ())
            .ok_or_else(|| "expected a list of subjects".to_string()),
        FieldKind::Identifier(format) => {
            let text = value.as_text().ok_or_else(|| "expected a string".to_string())?;
            if !format.matches(text) {
                return Err(format!("'{}' does not match {}", text, format.description()));
            }
            let canonical = format.canonical(text);
            *value = FieldValue::Text(canonical);
            Ok(())
        }
    }
}

impl DocumentType {
    /// Field names a record of this type must carry.
    pub fn required_fields(&self) -> Vec<&'static str> {
        DocumentSchema::for_type(*self).required_fields().collect()
    }
}
