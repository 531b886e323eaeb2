//! OCR boundary.
//!
//! The OCR engine itself is an external collaborator (see [`crate::plugins::OcrBackend`]).
//! This module turns whatever shape an engine hands back into the one [`LineStream`]
//! contract the rest of the crate reads.
//!
//! [`LineStream`]: crate::types::LineStream

pub mod adapters;
pub mod transcript;
pub mod tsv;

pub use adapters::{from_legacy_nested, from_line_objects, from_plain_text, from_rec_result, from_tsv};
pub use transcript::{TranscriptOcrBackend, decode_transcript, from_json_value};
