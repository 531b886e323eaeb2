//! Cardex - structured field extraction for Indian identity and academic documents
//!
//! Cardex turns the flat, noisy line stream an OCR engine produces for a photographed
//! Aadhaar card, PAN card, driving licence, passport or university marksheet into a typed,
//! validated record.
//!
//! # Quick Start
//!
//! ```rust
//! use cardex::{ExtractionConfig, LineStream, extract_lines};
//!
//! let stream = LineStream::from_texts([
//!     "Semester: 3", "18CS31", "Data Structures", "28", "65", "93", "P",
//! ]);
//! let extraction = extract_lines(&stream, &ExtractionConfig::default());
//! assert_eq!(extraction.document_type.as_str(), "marksheet");
//! ```
//!
//! # Architecture
//!
//! - **Text** (`text`): Line normalization, dates, institution names
//! - **Classifier** (`classifier`): Ordered cascade picking one document type
//! - **Extractors** (`extractors`, `marksheet`): One parser per document type; the marksheet
//!   table is rebuilt by a streaming state machine
//! - **Merge** (`merge`): Layout-model and OCR fields combined and renormalized
//! - **Validation** (`validation`): Per-type record schemas
//! - **Core** (`core`): Pure extraction entry point and the async pipeline
//! - **Plugins** (`plugins`, `ocr`, `dataset`): Collaborator traits, OCR result adapters and
//!   the dataset archive

#![deny(unsafe_code)]

pub mod classifier;
pub mod core;
pub mod dataset;
pub mod error;
pub mod extractors;
pub mod marksheet;
pub mod merge;
pub mod ocr;
pub mod plugins;
pub mod text;
pub mod types;
pub mod validation;

pub use error::{CardexError, Result};
pub use types::*;

pub use classifier::classify;
pub use core::config::ExtractionConfig;
pub use core::extractor::{Extraction, extract_lines};
pub use core::pipeline::{DocumentPipeline, DocumentPipelineBuilder};
pub use dataset::DatasetArchive;
pub use merge::{merge, merge_and_clean};
pub use validation::{SchemaValidator, ValidationOutcome, validate_record};
