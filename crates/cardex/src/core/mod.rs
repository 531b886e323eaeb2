//! Core extraction orchestration.
//!
//! - [`extractor`] - Pure, synchronous line-stream-to-record core
//! - [`pipeline`] - Async pipeline around the core with injected collaborators
//! - [`config`] - Configuration types and file loading
//! - [`io`] - File reading helpers

pub mod config;
pub mod extractor;
pub mod io;
pub mod pipeline;

pub use config::{
    ArchiveConfig, DateStyle, ExtractionConfig, ForceCompletionPolicy, MarksheetConfig, MergeConfig, NormalizerConfig,
};
pub use extractor::{Extraction, classify_lines, extract_lines, extract_with_raw_text};
pub use pipeline::{DocumentPipeline, DocumentPipelineBuilder};
