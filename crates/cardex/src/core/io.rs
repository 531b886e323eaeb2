//! File I/O utilities.
//!
//! Read failures are returned as `CardexError::Io` and never wrapped, so callers can tell a
//! missing input apart from an extraction problem.

use crate::{CardexError, Result};
use std::path::Path;

#[cfg(feature = "tokio-runtime")]
pub async fn read_file_async(path: impl AsRef<Path>) -> Result<Vec<u8>> {
    tokio::fs::read(path.as_ref()).await.map_err(CardexError::Io)
}

#[cfg(not(feature = "tokio-runtime"))]
pub async fn read_file_async(path: impl AsRef<Path>) -> Result<Vec<u8>> {
    read_file_sync(path)
}

pub fn read_file_sync(path: impl AsRef<Path>) -> Result<Vec<u8>> {
    std::fs::read(path.as_ref()).map_err(CardexError::Io)
}

pub fn validate_file_exists(path: impl AsRef<Path>) -> Result<()> {
    if !path.as_ref().exists() {
        return Err(CardexError::validation(format!(
            "File does not exist: {}",
            path.as_ref().display()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_file_sync() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.txt");
        std::fs::write(&path, b"PAN").unwrap();
        assert_eq!(read_file_sync(&path).unwrap(), b"PAN");
    }

    #[test]
    fn test_read_missing_file_is_io_error() {
        assert!(matches!(read_file_sync("/nonexistent/scan.txt"), Err(CardexError::Io(_))));
    }

    #[tokio::test]
    async fn test_read_file_async() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.txt");
        std::fs::write(&path, b"MALE").unwrap();
        assert_eq!(read_file_async(&path).await.unwrap(), b"MALE");
    }

    #[test]
    fn test_validate_file_exists() {
        let dir = tempfile::tempdir().unwrap();
        assert!(validate_file_exists(dir.path()).is_ok());
        assert!(matches!(
            validate_file_exists(dir.path().join("missing")),
            Err(CardexError::Validation { .. })
        ));
    }
}
