//! End-to-end document pipeline.
//!
//! ```text
//! image ─┬─> FaceDetector ──────────────────────────────┐ (face_image)
//!        ├─> OcrBackend ─> extract_lines ─> OCR fields ─┼─> merge & clean ─> validate ─> archive
//!        └─> LayoutModel ─> layout fields ──────────────┘
//! ```
//!
//! Collaborators are injected through [`DocumentPipelineBuilder`] and initialized lazily,
//! exactly once, on first use. Any collaborator failure is logged and treated as an empty
//! contribution: the pipeline still returns a record built from whatever is left.

use crate::core::config::ExtractionConfig;
use crate::core::extractor::extract_lines;
use crate::core::io;
use crate::dataset::DatasetArchive;
use crate::merge::merge_and_clean;
use crate::plugins::{ArchiveEntry, ArchiveSink, FaceDetector, LayoutModel, OcrBackend, Plugin};
use crate::types::{DocumentType, FieldRecord, LineStream, ProcessedDocument};
use crate::validation::SchemaValidator;
use crate::{CardexError, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::path::Path;
use std::sync::{Arc, OnceLock};

#[cfg(feature = "tokio-runtime")]
use once_cell::sync::Lazy;

/// Global Tokio runtime for the blocking wrappers.
///
/// Built on first use and shared by every `*_sync` call, so no call pays for runtime
/// construction. Creation only fails when the process is out of threads or memory.
#[cfg(feature = "tokio-runtime")]
static GLOBAL_RUNTIME: Lazy<tokio::runtime::Runtime> = Lazy::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Failed to create global Tokio runtime - system may be out of resources")
});

/// A plugin plus its one-shot initialization state.
struct PluginHandle<T: ?Sized> {
    plugin: Arc<T>,
    init: OnceLock<std::result::Result<(), String>>,
}

impl<T: ?Sized + Plugin> PluginHandle<T> {
    fn new(plugin: Arc<T>) -> Self {
        Self {
            plugin,
            init: OnceLock::new(),
        }
    }

    /// The plugin, initialized on first call. A failed initialization is remembered.
    fn get(&self) -> Result<&T> {
        let state = self.init.get_or_init(|| {
            tracing::debug!(plugin = self.plugin.name(), "Initializing plugin");
            self.plugin.initialize().map_err(|e| e.to_string())
        });
        match state {
            Ok(()) => Ok(self.plugin.as_ref()),
            Err(message) => Err(CardexError::plugin(
                self.plugin.name(),
                format!("initialization failed: {}", message),
            )),
        }
    }

    fn shutdown(&self) -> Result<()> {
        if matches!(self.init.get(), Some(Ok(()))) {
            self.plugin.shutdown()?;
        }
        Ok(())
    }
}

struct PipelineInner {
    ocr: PluginHandle<dyn OcrBackend>,
    layout: Option<PluginHandle<dyn LayoutModel>>,
    face: Option<PluginHandle<dyn FaceDetector>>,
    archive: Option<Arc<PluginHandle<dyn ArchiveSink>>>,
    validator: SchemaValidator,
    config: ExtractionConfig,
}

/// Builder for [`DocumentPipeline`].
///
/// # Example
///
/// ```rust
/// use cardex::core::pipeline::DocumentPipeline;
/// use cardex::ocr::TranscriptOcrBackend;
/// use std::sync::Arc;
///
/// let pipeline = DocumentPipeline::builder()
///     .ocr(Arc::new(TranscriptOcrBackend))
///     .build()
///     .unwrap();
/// ```
#[derive(Default)]
pub struct DocumentPipelineBuilder {
    ocr: Option<Arc<dyn OcrBackend>>,
    layout: Option<Arc<dyn LayoutModel>>,
    face: Option<Arc<dyn FaceDetector>>,
    archive: Option<Arc<dyn ArchiveSink>>,
    config: ExtractionConfig,
}

impl DocumentPipelineBuilder {
    pub fn ocr(mut self, backend: Arc<dyn OcrBackend>) -> Self {
        self.ocr = Some(backend);
        self
    }

    pub fn layout_model(mut self, model: Arc<dyn LayoutModel>) -> Self {
        self.layout = Some(model);
        self
    }

    pub fn face_detector(mut self, detector: Arc<dyn FaceDetector>) -> Self {
        self.face = Some(detector);
        self
    }

    /// Archive sink. Overrides a sink derived from `config.archive`.
    pub fn archive(mut self, sink: Arc<dyn ArchiveSink>) -> Self {
        self.archive = Some(sink);
        self
    }

    pub fn config(mut self, config: ExtractionConfig) -> Self {
        self.config = config;
        self
    }

    /// # Errors
    ///
    /// Returns `CardexError::Validation` when no OCR backend was supplied.
    pub fn build(self) -> Result<DocumentPipeline> {
        let ocr = self
            .ocr
            .ok_or_else(|| CardexError::validation("DocumentPipeline requires an OCR backend"))?;

        let archive = self.archive.or_else(|| {
            self.config
                .archive
                .as_ref()
                .map(|cfg| Arc::new(DatasetArchive::from_config(cfg)) as Arc<dyn ArchiveSink>)
        });

        Ok(DocumentPipeline {
            inner: Arc::new(PipelineInner {
                ocr: PluginHandle::new(ocr),
                layout: self.layout.map(PluginHandle::new),
                face: self.face.map(PluginHandle::new),
                archive: archive.map(|sink| Arc::new(PluginHandle::new(sink))),
                validator: SchemaValidator::new(),
                config: self.config,
            }),
        })
    }
}

/// Runs documents through OCR, extraction, merge, validation and archiving.
///
/// Cheap to clone; clones share collaborators and their initialization state.
#[derive(Clone)]
pub struct DocumentPipeline {
    inner: Arc<PipelineInner>,
}

impl DocumentPipeline {
    pub fn builder() -> DocumentPipelineBuilder {
        DocumentPipelineBuilder::default()
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.inner.config
    }

    /// Process one image held in memory.
    ///
    /// Never fails because of a collaborator: OCR, layout, face detection and archiving errors
    /// are logged and the run continues without that contribution.
    pub async fn process_bytes(&self, image: &[u8], source: Option<&Path>) -> Result<ProcessedDocument> {
        let inner = &self.inner;
        tracing::info!(source = ?source, bytes = image.len(), "Processing document");

        let face_image = self.detect_face(image).await;
        let stream = self.recognize(image).await;
        let layout = self.infer_layout(image).await;

        let extraction = extract_lines(&stream, &inner.config);

        let mut extra = FieldRecord::new();
        extra.insert_opt("face_image", face_image);
        extra.insert("ocr_accuracy_score", round2(stream.mean_confidence() * 100.0));
        if extraction.document_type == DocumentType::Unknown && !extraction.normalized.blob.is_empty() {
            extra.insert("raw_text", extraction.normalized.blob.clone());
        }

        let merged = merge_and_clean(layout, extraction.fields, extra, &inner.config.merge);
        let outcome = inner.validator.validate(&merged);

        if let Some(error) = &outcome.error {
            tracing::warn!(document_type = extraction.document_type.as_str(), error = %error, "Record failed validation");
        }

        let document = ProcessedDocument {
            document_type: extraction.document_type,
            record: outcome.record,
            valid: outcome.valid,
            validation_error: outcome.error,
            source: source.map(|p| p.display().to_string()),
        };

        self.archive(&document, source).await;

        tracing::info!(
            document_type = document.document_type.as_str(),
            valid = document.valid,
            "Processed document"
        );
        Ok(document)
    }

    /// Read and process one image file.
    ///
    /// # Errors
    ///
    /// Returns `CardexError::Io` when the file cannot be read.
    pub async fn process_file(&self, path: impl AsRef<Path>) -> Result<ProcessedDocument> {
        let path = path.as_ref();
        let bytes = io::read_file_async(path).await?;
        self.process_bytes(&bytes, Some(path)).await
    }

    /// Process many files concurrently, keeping input order.
    ///
    /// Concurrency is bounded by `max_concurrent_extractions` (default `num_cpus * 2`).
    /// I/O errors abort the batch; any other per-file error becomes an `Unknown` record
    /// carrying the error message.
    #[cfg(feature = "tokio-runtime")]
    pub async fn batch_process_files(&self, paths: Vec<impl AsRef<Path>>) -> Result<Vec<ProcessedDocument>> {
        use tokio::sync::Semaphore;
        use tokio::task::JoinSet;

        if paths.is_empty() {
            return Ok(vec![]);
        }

        let max_concurrent = self
            .inner
            .config
            .max_concurrent_extractions
            .unwrap_or_else(|| num_cpus::get() * 2)
            .max(1);
        let semaphore = Arc::new(Semaphore::new(max_concurrent));

        let mut tasks = JoinSet::new();

        for (index, path) in paths.into_iter().enumerate() {
            let path_buf = path.as_ref().to_path_buf();
            let pipeline = self.clone();
            let semaphore_clone = Arc::clone(&semaphore);

            tasks.spawn(async move {
                let result = match semaphore_clone.acquire().await {
                    Ok(_permit) => pipeline.process_file(&path_buf).await,
                    Err(e) => Err(CardexError::Other(format!("Semaphore closed: {}", e))),
                };
                (index, path_buf, result)
            });
        }

        let mut results: Vec<Option<ProcessedDocument>> = vec![None; tasks.len()];

        while let Some(task_result) = tasks.join_next().await {
            match task_result {
                Ok((index, _, Ok(document))) => {
                    results[index] = Some(document);
                }
                Ok((index, path, Err(e))) => {
                    if matches!(e, CardexError::Io(_)) {
                        return Err(e);
                    }
                    results[index] = Some(failed_document(&path, &e));
                }
                Err(join_err) => {
                    return Err(CardexError::Other(format!("Task panicked: {}", join_err)));
                }
            }
        }

        Ok(results.into_iter().flatten().collect())
    }

    /// Blocking wrapper for [`Self::process_bytes`] on the global runtime.
    #[cfg(feature = "tokio-runtime")]
    pub fn process_bytes_sync(&self, image: &[u8], source: Option<&Path>) -> Result<ProcessedDocument> {
        GLOBAL_RUNTIME.block_on(self.process_bytes(image, source))
    }

    /// Blocking wrapper for [`Self::process_file`] on the global runtime.
    #[cfg(feature = "tokio-runtime")]
    pub fn process_file_sync(&self, path: impl AsRef<Path>) -> Result<ProcessedDocument> {
        GLOBAL_RUNTIME.block_on(self.process_file(path))
    }

    /// Blocking wrapper for [`Self::batch_process_files`] on the global runtime.
    #[cfg(feature = "tokio-runtime")]
    pub fn batch_process_files_sync(&self, paths: Vec<impl AsRef<Path>>) -> Result<Vec<ProcessedDocument>> {
        GLOBAL_RUNTIME.block_on(self.batch_process_files(paths))
    }

    /// Shut down every collaborator that was initialized.
    pub fn shutdown(&self) -> Result<()> {
        let inner = &self.inner;
        inner.ocr.shutdown()?;
        if let Some(layout) = &inner.layout {
            layout.shutdown()?;
        }
        if let Some(face) = &inner.face {
            face.shutdown()?;
        }
        if let Some(archive) = &inner.archive {
            archive.shutdown()?;
        }
        Ok(())
    }

    async fn recognize(&self, image: &[u8]) -> LineStream {
        let result = match self.inner.ocr.get() {
            Ok(ocr) => ocr.recognize(image).await,
            Err(e) => Err(e),
        };
        result.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "OCR failed, continuing with no text");
            LineStream::default()
        })
    }

    async fn infer_layout(&self, image: &[u8]) -> FieldRecord {
        let Some(handle) = &self.inner.layout else {
            return FieldRecord::new();
        };
        let result = match handle.get() {
            Ok(model) => model.infer(image).await,
            Err(e) => Err(e),
        };
        result.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Layout model failed, using OCR fields only");
            FieldRecord::new()
        })
    }

    async fn detect_face(&self, image: &[u8]) -> Option<String> {
        let handle = self.inner.face.as_ref()?;
        let result = match handle.get() {
            Ok(detector) => detector.detect(image).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(crop) => crop.map(|bytes| STANDARD.encode(bytes)),
            Err(e) => {
                tracing::warn!(error = %e, "Face detection failed");
                None
            }
        }
    }

    async fn archive(&self, document: &ProcessedDocument, source: Option<&Path>) {
        let Some(handle) = self.inner.archive.clone() else {
            return;
        };
        let entry = ArchiveEntry {
            source: source.map(Path::to_path_buf),
            document_type: document.document_type,
            valid: document.valid,
            record: document.record.clone(),
            validation_error: document.validation_error.clone(),
        };

        #[cfg(feature = "tokio-runtime")]
        let result = tokio::task::spawn_blocking(move || handle.get()?.store(&entry))
            .await
            .unwrap_or_else(|e| Err(CardexError::Other(format!("Archive task panicked: {}", e))));

        #[cfg(not(feature = "tokio-runtime"))]
        let result = handle.get().and_then(|sink| sink.store(&entry));

        if let Err(e) = result {
            tracing::warn!(error = %e, "Archiving failed; extraction result is unaffected");
        }
    }
}

#[cfg(feature = "tokio-runtime")]
fn failed_document(path: &Path, error: &CardexError) -> ProcessedDocument {
    let mut record = FieldRecord::for_document(DocumentType::Unknown);
    record.insert("error", error.to_string());
    ProcessedDocument {
        document_type: DocumentType::Unknown,
        record,
        valid: false,
        validation_error: Some(error.to_string()),
        source: Some(path.display().to_string()),
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::TranscriptOcrBackend;
    use crate::types::FieldValue;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingOcr {
        init_calls: AtomicUsize,
    }

    impl Plugin for CountingOcr {
        fn name(&self) -> &str {
            "counting-ocr"
        }

        fn version(&self) -> String {
            "1.0.0".to_string()
        }

        fn initialize(&self) -> Result<()> {
            self.init_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn shutdown(&self) -> Result<()> {
            Ok(())
        }
    }

    #[async_trait]
    impl OcrBackend for CountingOcr {
        async fn recognize(&self, image: &[u8]) -> Result<LineStream> {
            crate::ocr::decode_transcript(image)
        }
    }

    #[test]
    fn test_builder_requires_ocr() {
        assert!(matches!(
            DocumentPipeline::builder().build(),
            Err(CardexError::Validation { .. })
        ));
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(93.456), 93.46);
        assert_eq!(round2(0.0), 0.0);
    }

    #[tokio::test]
    async fn test_plugin_initialized_once() {
        let ocr = Arc::new(CountingOcr {
            init_calls: AtomicUsize::new(0),
        });
        let pipeline = DocumentPipeline::builder().ocr(ocr.clone()).build().unwrap();
        assert_eq!(ocr.init_calls.load(Ordering::SeqCst), 0);

        pipeline.process_bytes(b"ABCDE1234F", None).await.unwrap();
        pipeline.process_bytes(b"ABCDE1234F", None).await.unwrap();
        assert_eq!(ocr.init_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unknown_document_keeps_raw_text() {
        let pipeline = DocumentPipeline::builder()
            .ocr(Arc::new(TranscriptOcrBackend))
            .build()
            .unwrap();
        let document = pipeline.process_bytes(b"hello world", None).await.unwrap();
        assert_eq!(document.document_type, DocumentType::Unknown);
        assert!(document.valid);
        assert_eq!(document.record.get_text("raw_text"), Some("hello world"));
        assert_eq!(
            document.record.get("ocr_accuracy_score").and_then(FieldValue::as_number),
            Some(100.0)
        );
    }

    #[tokio::test]
    async fn test_process_missing_file_is_io_error() {
        let pipeline = DocumentPipeline::builder()
            .ocr(Arc::new(TranscriptOcrBackend))
            .build()
            .unwrap();
        let result = pipeline.process_file("/nonexistent/scan.txt").await;
        assert!(matches!(result, Err(CardexError::Io(_))));
    }
}
