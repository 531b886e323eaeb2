//! Face detector plugin trait.

use crate::Result;
use crate::plugins::Plugin;
use async_trait::async_trait;

/// Finds the holder's photo on an identity document.
///
/// The crop is purely additive: it lands base64-encoded in `face_image` and never influences
/// classification or field extraction.
#[async_trait]
pub trait FaceDetector: Plugin {
    /// Encoded crop of the detected face, `None` when no face was found.
    async fn detect(&self, image: &[u8]) -> Result<Option<Vec<u8>>>;
}
