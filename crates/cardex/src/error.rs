//! Error types for Cardex.
//!
//! Field extraction itself is infallible: a pattern that does not match simply leaves the
//! field out of the record. Errors in this module come from the edges of the system:
//!
//! - `Io` - File system errors (always bubble up unchanged)
//! - `Parsing` - A saved transcript is malformed (bad UTF-8, JSON, TSV or line shape)
//! - `Ocr` - The OCR backend itself failed
//! - `Plugin` - A layout model, face detector or archive sink failed
//! - `Validation` - Invalid configuration or parameters
//! - `Serialization` - JSON encoding/decoding failures
//!
//! The pipeline catches collaborator errors at the boundary, logs them and continues with
//! reduced information. Only I/O errors on the caller's own input abort a run.
//!
//! # Example
//!
//! ```rust
//! use cardex::{CardexError, Result};
//!
//! fn read_transcript(path: &str) -> Result<String> {
//!     let content = std::fs::read_to_string(path)?;
//!
//!     if content.trim().is_empty() {
//!         return Err(CardexError::ocr(format!("Transcript is empty: {}", path)));
//!     }
//!
//!     Ok(content)
//! }
//! ```
use thiserror::Error;

/// Result type alias using `CardexError`.
pub type Result<T> = std::result::Result<T, CardexError>;

/// Main error type for all Cardex operations.
#[derive(Debug, Error)]
pub enum CardexError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parsing error: {message}")]
    Parsing {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("OCR error: {message}")]
    Ocr {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Serialization error: {message}")]
    Serialization {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Plugin error in '{plugin_name}': {message}")]
    Plugin { message: String, plugin_name: String },

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for CardexError {
    fn from(err: serde_json::Error) -> Self {
        CardexError::Serialization {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

macro_rules! error_constructor {
    ($name:ident, $variant:ident) => {
        pastey::paste! {
            #[doc = "Create a " $variant " error"]
            pub fn $name<S: Into<String>>(message: S) -> Self {
                Self::$variant {
                    message: message.into(),
                    source: None,
                }
            }

            #[doc = "Create a " $variant " error with source"]
            pub fn [<$name _with_source>]<S: Into<String>, E: std::error::Error + Send + Sync + 'static>(
                message: S,
                source: E,
            ) -> Self {
                Self::$variant {
                    message: message.into(),
                    source: Some(Box::new(source)),
                }
            }
        }
    };
}

impl CardexError {
    error_constructor!(parsing, Parsing);
    error_constructor!(ocr, Ocr);
    error_constructor!(validation, Validation);

    /// Create a plugin error attributed to `plugin_name`.
    pub fn plugin<M: Into<String>, N: Into<String>>(plugin_name: N, message: M) -> Self {
        Self::Plugin {
            message: message.into(),
            plugin_name: plugin_name.into(),
        }
    }
}
