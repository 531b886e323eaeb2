//! Base plugin trait definition.
//!
//! Every collaborator the pipeline talks to (OCR engine, layout model, face detector,
//! archive sink) implements [`Plugin`] for metadata and lifecycle.

use crate::Result;

pub trait Plugin: Send + Sync {
    /// Stable identifier, used in logs and in [`crate::CardexError::Plugin`].
    fn name(&self) -> &str;

    fn version(&self) -> String;

    /// Load models or open resources.
    ///
    /// [`crate::core::pipeline::DocumentPipeline`] calls this lazily, exactly once per
    /// plugin, before the first call into the plugin.
    fn initialize(&self) -> Result<()>;

    fn shutdown(&self) -> Result<()>;

    fn description(&self) -> &str {
        ""
    }

    fn author(&self) -> &str {
        ""
    }
}
