//! Adapters from the OCR result shapes seen in the wild to [`LineStream`].
//!
//! Each function accepts exactly one shape and fails with [`CardexError::Parsing`] on anything
//! else, so shape checks stay here instead of leaking into extraction code.

use crate::types::{LineStream, OcrLine};
use crate::{CardexError, Result};
use serde_json::Value;

pub use super::tsv::from_tsv;

/// `{ "rec_texts": [...], "rec_scores": [...] }`.
///
/// Missing or short score arrays give the affected lines zero confidence.
pub fn from_rec_result(value: &Value) -> Result<LineStream> {
    let texts = value
        .get("rec_texts")
        .and_then(Value::as_array)
        .ok_or_else(|| CardexError::parsing("OCR result has no 'rec_texts' array"))?;
    let scores = value.get("rec_scores").and_then(Value::as_array);

    texts
        .iter()
        .enumerate()
        .map(|(i, text)| {
            let text = text
                .as_str()
                .ok_or_else(|| CardexError::parsing(format!("rec_texts[{}] is not a string", i)))?;
            let score = scores
                .and_then(|s| s.get(i))
                .and_then(Value::as_f64)
                .unwrap_or(0.0);
            Ok(OcrLine::new(text, score as f32))
        })
        .collect::<Result<Vec<_>>>()
        .map(LineStream::new)
}

/// `[[box, [text, score]], ...]`, optionally wrapped in an outer list of pages.
pub fn from_legacy_nested(value: &Value) -> Result<LineStream> {
    let entries = value
        .as_array()
        .ok_or_else(|| CardexError::parsing("Legacy OCR result is not a list"))?;

    let mut stream = LineStream::default();
    for entry in entries {
        if is_legacy_page(entry) {
            for line in entry.as_array().into_iter().flatten() {
                stream.push(legacy_line(line)?);
            }
        } else {
            stream.push(legacy_line(entry)?);
        }
    }
    Ok(stream)
}

fn legacy_line(entry: &Value) -> Result<OcrLine> {
    let text_score = entry
        .as_array()
        .filter(|parts| parts.len() >= 2)
        .and_then(|parts| parts[1].as_array())
        .filter(|pair| pair.len() >= 2)
        .ok_or_else(|| CardexError::parsing("Legacy OCR entry is not [box, [text, score]]"))?;

    let text = text_score[0]
        .as_str()
        .ok_or_else(|| CardexError::parsing("Legacy OCR text is not a string"))?;
    let score = text_score[1].as_f64().unwrap_or(0.0);
    Ok(OcrLine::new(text, score as f32))
}

fn is_legacy_entry(value: &Value) -> bool {
    value
        .as_array()
        .and_then(|parts| parts.get(1))
        .and_then(Value::as_array)
        .and_then(|pair| pair.first())
        .is_some_and(Value::is_string)
}

/// A page is a list whose first element is itself a `[box, [text, score]]` entry.
fn is_legacy_page(value: &Value) -> bool {
    value
        .as_array()
        .and_then(|items| items.first())
        .is_some_and(is_legacy_entry)
}

/// `[{ "text": .., "confidence": .. }, ...]`. `score` is accepted as an alias of `confidence`.
pub fn from_line_objects(value: &Value) -> Result<LineStream> {
    let items = value
        .as_array()
        .ok_or_else(|| CardexError::parsing("Line-object OCR result is not a list"))?;

    items
        .iter()
        .map(|item| {
            let text = item
                .get("text")
                .and_then(Value::as_str)
                .ok_or_else(|| CardexError::parsing("OCR line object has no 'text' string"))?;
            let confidence = item
                .get("confidence")
                .or_else(|| item.get("score"))
                .and_then(Value::as_f64)
                .unwrap_or(1.0);
            Ok(OcrLine::new(text, confidence as f32))
        })
        .collect::<Result<Vec<_>>>()
        .map(LineStream::new)
}

/// One line per text line, each with full confidence. Blank lines are kept for the normalizer.
pub fn from_plain_text(text: &str) -> LineStream {
    LineStream::from_texts(text.lines())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rec_result() {
        let value = json!({"rec_texts": ["GOVERNMENT OF INDIA", "MALE"], "rec_scores": [0.98, 0.5]});
        let stream = from_rec_result(&value).unwrap();
        assert_eq!(stream.len(), 2);
        assert_eq!(stream.lines()[1].text, "MALE");
        assert_eq!(stream.lines()[1].confidence, 0.5);
    }

    #[test]
    fn test_rec_result_without_scores() {
        let stream = from_rec_result(&json!({"rec_texts": ["a"]})).unwrap();
        assert_eq!(stream.lines()[0].confidence, 0.0);
        assert!(from_rec_result(&json!({"texts": []})).is_err());
    }

    #[test]
    fn test_legacy_nested_flat_and_paged() {
        let flat = json!([[[[0, 0], [1, 0], [1, 1], [0, 1]], ["PAN", 0.9]], [[], ["ABCDE1234F", 0.8]]]);
        let stream = from_legacy_nested(&flat).unwrap();
        assert_eq!(stream.texts().collect::<Vec<_>>(), vec!["PAN", "ABCDE1234F"]);

        let paged = json!([[[[], ["PAN", 0.9]], [[], ["ABCDE1234F", 0.8]]]]);
        assert_eq!(from_legacy_nested(&paged).unwrap(), stream);
    }

    #[test]
    fn test_legacy_rejects_other_shapes() {
        assert!(matches!(
            from_legacy_nested(&json!([["only one"]])),
            Err(CardexError::Parsing { .. })
        ));
        assert!(matches!(
            from_line_objects(&json!([{"score": 0.5}])),
            Err(CardexError::Parsing { .. })
        ));
    }

    #[test]
    fn test_line_objects() {
        let value = json!([{"text": "Name", "confidence": 0.7}, {"text": "RAVI", "score": 0.9}, {"text": "x"}]);
        let stream = from_line_objects(&value).unwrap();
        assert_eq!(stream.lines()[0].confidence, 0.7);
        assert_eq!(stream.lines()[1].confidence, 0.9);
        assert_eq!(stream.lines()[2].confidence, 1.0);
    }

    #[test]
    fn test_plain_text() {
        let stream = from_plain_text("Semester 3\n18CS31\n");
        assert_eq!(stream.len(), 2);
        assert_eq!(stream.mean_confidence(), 1.0);
    }
}
