//! OCR engine plugin trait.

use crate::Result;
use crate::plugins::Plugin;
use crate::types::LineStream;
use async_trait::async_trait;
use std::path::Path;

/// An OCR engine: image bytes in, ordered text lines with confidences out.
///
/// Returning an empty stream is allowed; the pipeline then classifies the document as
/// `Unknown` with every field absent.
#[async_trait]
pub trait OcrBackend: Plugin {
    async fn recognize(&self, image: &[u8]) -> Result<LineStream>;

    async fn recognize_file(&self, path: &Path) -> Result<LineStream> {
        let bytes = crate::core::io::read_file_async(path).await?;
        self.recognize(&bytes).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OcrLine;

    struct FixedOcr;

    impl Plugin for FixedOcr {
        fn name(&self) -> &str {
            "fixed-ocr"
        }

        fn version(&self) -> String {
            "1.0.0".to_string()
        }

        fn initialize(&self) -> Result<()> {
            Ok(())
        }

        fn shutdown(&self) -> Result<()> {
            Ok(())
        }
    }

    #[async_trait]
    impl OcrBackend for FixedOcr {
        async fn recognize(&self, image: &[u8]) -> Result<LineStream> {
            Ok(LineStream::new(vec![OcrLine::new(
                String::from_utf8_lossy(image).into_owned(),
                0.9,
            )]))
        }
    }

    #[tokio::test]
    async fn test_recognize_file_reads_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.png");
        std::fs::write(&path, "GOVERNMENT OF INDIA").unwrap();

        let stream = FixedOcr.recognize_file(&path).await.unwrap();
        assert_eq!(stream.lines()[0].text, "GOVERNMENT OF INDIA");
    }

    #[tokio::test]
    async fn test_recognize_file_missing_is_io_error() {
        let result = FixedOcr.recognize_file(Path::new("/nonexistent/scan.png")).await;
        assert!(matches!(result, Err(crate::CardexError::Io(_))));
    }
}
