//! Labelled dataset archive.
//!
//! Every processed document becomes a training sample: a JSON annotation holding the final
//! record as ground truth, plus (optionally) a copy of the source image with the same stem.
//! Accepted and rejected records go to separate directories so rejected samples can be
//! reviewed and corrected before they are used.
//!
//! ```text
//! {dir}/valid/aadhaar_3f9c2a1b.json
//! {dir}/valid/aadhaar_3f9c2a1b.jpg
//! {dir}/rejected/pan_a01b22cd.json
//! ```

use crate::core::config::ArchiveConfig;
use crate::plugins::{ArchiveEntry, ArchiveSink, Plugin};
use crate::types::FieldRecord;
use crate::{CardexError, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

const VALID_DIR: &str = "valid";
const REJECTED_DIR: &str = "rejected";

#[derive(Serialize)]
struct Annotation<'a> {
    image: Option<&'a str>,
    ground_truth: &'a FieldRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    validation_error: Option<&'a str>,
}

/// File-system [`ArchiveSink`].
#[derive(Debug, Clone)]
pub struct DatasetArchive {
    root: PathBuf,
    copy_images: bool,
}

impl DatasetArchive {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            copy_images: true,
        }
    }

    pub fn from_config(config: &ArchiveConfig) -> Self {
        Self {
            root: config.dir.clone(),
            copy_images: config.copy_images,
        }
    }

    pub fn with_copy_images(mut self, copy_images: bool) -> Self {
        self.copy_images = copy_images;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write one annotation and return its path.
    pub fn write(&self, entry: &ArchiveEntry) -> Result<PathBuf> {
        let dir = self.root.join(if entry.valid { VALID_DIR } else { REJECTED_DIR });
        fs::create_dir_all(&dir)?;

        let id = Uuid::new_v4().simple().to_string();
        let stem = format!("{}_{}", entry.document_type.as_str(), &id[..8]);

        let image_name = entry.source.as_deref().map(|source| match source.extension() {
            Some(ext) => format!("{}.{}", stem, ext.to_string_lossy()),
            None => stem.clone(),
        });

        if self.copy_images
            && let (Some(source), Some(name)) = (entry.source.as_deref(), image_name.as_deref())
            && source.is_file()
        {
            fs::copy(source, dir.join(name))?;
        }

        let annotation = Annotation {
            image: image_name.as_deref(),
            ground_truth: &entry.record,
            validation_error: if entry.valid {
                None
            } else {
                entry.validation_error.as_deref()
            },
        };
        let json = serde_json::to_vec_pretty(&annotation)?;

        let path = dir.join(format!("{}.json", stem));
        fs::write(&path, json)?;
        tracing::debug!(path = %path.display(), valid = entry.valid, "Archived record");
        Ok(path)
    }
}

impl Plugin for DatasetArchive {
    fn name(&self) -> &str {
        "dataset-archive"
    }

    fn version(&self) -> String {
        env!("CARGO_PKG_VERSION").to_string()
    }

    fn initialize(&self) -> Result<()> {
        for sub in [VALID_DIR, REJECTED_DIR] {
            fs::create_dir_all(self.root.join(sub)).map_err(|e| {
                CardexError::plugin(self.name(), format!("cannot create {}: {}", self.root.join(sub).display(), e))
            })?;
        }
        Ok(())
    }

    fn shutdown(&self) -> Result<()> {
        Ok(())
    }
}

impl ArchiveSink for DatasetArchive {
    fn store(&self, entry: &ArchiveEntry) -> Result<()> {
        self.write(entry).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DocumentType;

    fn entry(valid: bool, source: Option<PathBuf>) -> ArchiveEntry {
        let mut record = FieldRecord::for_document(DocumentType::Pan);
        record.insert("pan_number", "ABCDE1234F");
        ArchiveEntry {
            source,
            document_type: DocumentType::Pan,
            valid,
            record,
            validation_error: (!valid).then(|| "pan_number: field required".to_string()),
        }
    }

    #[test]
    fn test_valid_record_with_image_copy() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("scan.jpg");
        fs::write(&image, b"jpeg").unwrap();

        let archive = DatasetArchive::new(dir.path().join("dataset"));
        let path = archive.write(&entry(true, Some(image))).unwrap();

        assert!(path.starts_with(dir.path().join("dataset").join("valid")));
        let name = path.file_stem().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("pan_"));
        assert_eq!(name.len(), "pan_".len() + 8);

        let json: serde_json::Value = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(json["image"], format!("{}.jpg", name));
        assert_eq!(json["ground_truth"]["pan_number"], "ABCDE1234F");
        assert!(json.get("validation_error").is_none());
        assert!(path.with_extension("jpg").is_file());
    }

    #[test]
    fn test_rejected_record_without_source() {
        let dir = tempfile::tempdir().unwrap();
        let archive = DatasetArchive::new(dir.path());
        let path = archive.write(&entry(false, None)).unwrap();

        assert!(path.starts_with(dir.path().join("rejected")));
        let json: serde_json::Value = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        assert!(json["image"].is_null());
        assert_eq!(json["validation_error"], "pan_number: field required");
    }

    #[test]
    fn test_copy_images_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("scan.png");
        fs::write(&image, b"png").unwrap();

        let archive = DatasetArchive::new(dir.path().join("out")).with_copy_images(false);
        let path = archive.write(&entry(true, Some(image))).unwrap();
        assert!(!path.with_extension("png").exists());
    }

    #[test]
    fn test_initialize_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let archive = DatasetArchive::new(dir.path().join("ds"));
        archive.initialize().unwrap();
        assert!(dir.path().join("ds/valid").is_dir());
        assert!(dir.path().join("ds/rejected").is_dir());
    }
}
