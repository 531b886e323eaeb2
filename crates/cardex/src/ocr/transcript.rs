//! Pre-recognized OCR transcripts.
//!
//! A transcript is the saved output of an OCR engine: one of the JSON shapes handled by
//! [`super::adapters`], Tesseract TSV, or plain text. Decoding sniffs which one it is.

use super::adapters::{from_legacy_nested, from_line_objects, from_plain_text, from_rec_result};
use super::tsv::{TSV_HEADER_PREFIX, from_tsv};
use crate::plugins::{OcrBackend, Plugin};
use crate::types::LineStream;
use crate::{CardexError, Result};
use async_trait::async_trait;
use serde_json::Value;

/// Decode a transcript into a line stream.
pub fn decode_transcript(bytes: &[u8]) -> Result<LineStream> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| CardexError::parsing_with_source("Transcript is not valid UTF-8", e))?;
    let text = text.trim_start_matches('\u{feff}');
    let trimmed = text.trim_start();

    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        let value: Value = serde_json::from_str(trimmed)
            .map_err(|e| CardexError::parsing_with_source("Transcript is not valid JSON", e))?;
        return from_json_value(&value);
    }

    if trimmed.starts_with(TSV_HEADER_PREFIX) {
        return from_tsv(trimmed);
    }

    Ok(from_plain_text(text))
}

/// Dispatch a JSON OCR result to its adapter.
///
/// A single-element outer list around a `rec_texts` object is unwrapped.
pub fn from_json_value(value: &Value) -> Result<LineStream> {
    match value {
        Value::Object(map) if map.contains_key("rec_texts") => from_rec_result(value),
        Value::Array(items) if items.is_empty() => Ok(LineStream::default()),
        Value::Array(items) if items.len() == 1 && items[0].get("rec_texts").is_some() => from_rec_result(&items[0]),
        Value::Array(items) if items.iter().all(Value::is_object) => from_line_objects(value),
        Value::Array(_) => from_legacy_nested(value),
        _ => Err(CardexError::UnsupportedFormat(
            "JSON transcript is neither a rec_texts object nor a list of lines".to_string(),
        )),
    }
}

/// OCR backend whose "image" bytes are already a transcript.
///
/// Lets the full pipeline run from saved OCR output, which is how the command-line tool
/// and the integration tests drive it.
#[derive(Debug, Clone, Copy, Default)]
pub struct TranscriptOcrBackend;

impl Plugin for TranscriptOcrBackend {
    fn name(&self) -> &str {
        "transcript"
    }

    fn version(&self) -> String {
        env!("CARGO_PKG_VERSION").to_string()
    }

    fn initialize(&self) -> Result<()> {
        Ok(())
    }

    fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    fn description(&self) -> &str {
        "Reads saved OCR output (JSON, TSV or plain text) instead of recognizing an image"
    }
}

#[async_trait]
impl OcrBackend for TranscriptOcrBackend {
    async fn recognize(&self, image: &[u8]) -> Result<LineStream> {
        decode_transcript(image)
    }
}
