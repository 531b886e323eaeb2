//! Archive sink plugin trait.

use crate::Result;
use crate::plugins::Plugin;
use crate::types::{DocumentType, FieldRecord};
use serde::Serialize;
use std::path::PathBuf;

/// Everything an archive needs to file one processed document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArchiveEntry {
    /// Image the record came from, when it was read from disk.
    pub source: Option<PathBuf>,
    pub document_type: DocumentType,
    pub valid: bool,
    pub record: FieldRecord,
    pub validation_error: Option<String>,
}

/// Persists processed documents, e.g. as a labelled dataset.
///
/// Storing is fire-and-forget from the pipeline's side: errors are logged and never change
/// the extraction result.
pub trait ArchiveSink: Plugin {
    fn store(&self, entry: &ArchiveEntry) -> Result<()>;
}
