//! Collaborator plugins.
//!
//! The pipeline never owns an OCR engine, vision model or storage backend itself. It talks to
//! them through the traits below, held as `Arc<dyn Trait>` handles supplied by
//! [`crate::core::pipeline::DocumentPipelineBuilder`].
//!
//! # Plugin Types
//!
//! - [`Plugin`] - Base trait: name, version and lifecycle
//! - [`OcrBackend`] - Image to ordered text lines
//! - [`LayoutModel`] - Image to best-effort key-value record
//! - [`FaceDetector`] - Image to optional face crop
//! - [`ArchiveSink`] - Persistence of processed records
//!
//! # Example
//!
//! ```rust
//! use cardex::plugins::{LayoutModel, Plugin};
//! use cardex::types::FieldRecord;
//! use cardex::Result;
//! use async_trait::async_trait;
//!
//! struct NoLayout;
//!
//! impl Plugin for NoLayout {
//!     fn name(&self) -> &str { "no-layout" }
//!     fn version(&self) -> String { "1.0.0".to_string() }
//!     fn initialize(&self) -> Result<()> { Ok(()) }
//!     fn shutdown(&self) -> Result<()> { Ok(()) }
//! }
//!
//! #[async_trait]
//! impl LayoutModel for NoLayout {
//!     async fn infer(&self, _image: &[u8]) -> Result<FieldRecord> {
//!         Ok(FieldRecord::new())
//!     }
//! }
//! ```

mod archive;
mod face;
mod layout;
mod ocr;
mod traits;

pub use archive::{ArchiveEntry, ArchiveSink};
pub use face::FaceDetector;
pub use layout::LayoutModel;
pub use ocr::OcrBackend;
pub use traits::Plugin;
