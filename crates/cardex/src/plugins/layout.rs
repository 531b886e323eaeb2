//! Layout / vision model plugin trait.

use crate::Result;
use crate::plugins::Plugin;
use crate::types::FieldRecord;
use async_trait::async_trait;

/// A learned model that reads key-value pairs straight off the image.
///
/// Its output is best-effort: the pipeline treats an error or an empty record as
/// "no layout contribution" and lets OCR-derived fields take precedence on overlap.
#[async_trait]
pub trait LayoutModel: Plugin {
    async fn infer(&self, image: &[u8]) -> Result<FieldRecord>;
}
