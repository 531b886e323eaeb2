//! Configuration loading and management.
//!
//! This module provides utilities for loading extraction configuration from various
//! sources (TOML, YAML, JSON) and discovering configuration files in the project hierarchy.

use crate::{CardexError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main extraction configuration.
///
/// Every field has a default, so an empty file is a valid configuration.
///
/// # Example
///
/// ```rust
/// use cardex::core::config::ExtractionConfig;
///
/// // Create with defaults
/// let config = ExtractionConfig::default();
/// assert!(config.normalizer.fix_confusables);
///
/// // Load from TOML file
/// // let config = ExtractionConfig::from_toml_file("cardex.toml")?;
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Line normalizer options
    #[serde(default)]
    pub normalizer: NormalizerConfig,

    /// Marksheet reconstructor options
    #[serde(default)]
    pub marksheet: MarksheetConfig,

    /// Merge & clean options
    #[serde(default)]
    pub merge: MergeConfig,

    /// Dataset archive (None = records are not archived)
    #[serde(default)]
    pub archive: Option<ArchiveConfig>,

    /// Maximum concurrent extractions in batch operations (None = num_cpus * 2).
    #[serde(default)]
    pub max_concurrent_extractions: Option<usize>,
}

/// Line normalizer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizerConfig {
    /// Repair letters misread inside numeric tokens ("2O19" -> "2019")
    #[serde(default = "default_true")]
    pub fix_confusables: bool,

    /// Lines below this confidence are discarded before extraction
    #[serde(default)]
    pub min_line_confidence: f32,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            fix_confusables: true,
            min_line_confidence: 0.0,
        }
    }
}

/// What to do with a subject that is still being built when the next subject code shows up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForceCompletionPolicy {
    /// Discard the incomplete subject.
    #[default]
    Drop,
    /// Complete it from the last three buffered marks with an `Unknown` result,
    /// provided at least three marks were buffered.
    DefaultUnknown,
}

/// Marksheet reconstructor configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarksheetConfig {
    #[serde(default)]
    pub force_completion: ForceCompletionPolicy,

    /// Append stray text lines after a completed subject to that subject's name
    #[serde(default)]
    pub merge_orphan_fragments: bool,

    /// Semester headers above this number are treated as noise
    #[serde(default = "default_max_semester")]
    pub max_semester: u32,
}

impl Default for MarksheetConfig {
    fn default() -> Self {
        Self {
            force_completion: ForceCompletionPolicy::Drop,
            merge_orphan_fragments: false,
            max_semester: default_max_semester(),
        }
    }
}

/// Output convention for normalized dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateStyle {
    /// `DD-MM-YYYY`
    #[default]
    DayFirst,
    /// `YYYY-MM-DD`
    Iso,
}

/// Merge & clean configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeConfig {
    #[serde(default)]
    pub date_style: DateStyle,

    /// All-caps words up to this length are kept as acronyms by the institution canonicalizer
    #[serde(default = "default_acronym_max_len")]
    pub acronym_max_len: usize,

    /// Canonicalized institution names shorter than this are discarded as noise
    #[serde(default = "default_min_institution_len")]
    pub min_institution_len: usize,

    /// Trailing place names stripped from institution names
    #[serde(default = "default_location_suffixes")]
    pub location_suffixes: Vec<String>,

    /// Layout-model keys containing any of these substrings are dropped
    #[serde(default = "default_noise_key_markers")]
    pub noise_key_markers: Vec<String>,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            date_style: DateStyle::DayFirst,
            acronym_max_len: default_acronym_max_len(),
            min_institution_len: default_min_institution_len(),
            location_suffixes: default_location_suffixes(),
            noise_key_markers: default_noise_key_markers(),
        }
    }
}

/// Dataset archive configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveConfig {
    /// Root directory; `valid/` and `rejected/` are created beneath it
    pub dir: PathBuf,

    /// Copy the source image next to its record
    #[serde(default = "default_true")]
    pub copy_images: bool,
}

fn default_true() -> bool {
    true
}

fn default_max_semester() -> u32 {
    12
}

fn default_acronym_max_len() -> usize {
    5
}

fn default_min_institution_len() -> usize {
    4
}

fn default_location_suffixes() -> Vec<String> {
    ["Belagavi", "Belgaum", "Karnataka", "India"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_noise_key_markers() -> Vec<String> {
    ["download", "issue", "vid", "generated"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl ExtractionConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `CardexError::Validation` if file doesn't exist or is invalid TOML.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = read_config(path.as_ref())?;

        toml::from_str(&content)
            .map_err(|e| CardexError::validation(format!("Invalid TOML in {}: {}", path.as_ref().display(), e)))
    }

    /// Load configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = read_config(path.as_ref())?;

        serde_yaml_ng::from_str(&content)
            .map_err(|e| CardexError::validation(format!("Invalid YAML in {}: {}", path.as_ref().display(), e)))
    }

    /// Load configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = read_config(path.as_ref())?;

        serde_json::from_str(&content)
            .map_err(|e| CardexError::validation(format!("Invalid JSON in {}: {}", path.as_ref().display(), e)))
    }

    /// Load configuration, picking the parser from the file extension (TOML when unknown).
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase).as_deref() {
            Some("yaml") | Some("yml") => Self::from_yaml_file(path),
            Some("json") => Self::from_json_file(path),
            _ => Self::from_toml_file(path),
        }
    }

    /// Discover configuration file in parent directories.
    ///
    /// Searches for `cardex.toml` in current directory and parent directories.
    ///
    /// # Returns
    ///
    /// - `Some(config)` if found
    /// - `None` if no config file found
    pub fn discover() -> Result<Option<Self>> {
        let current = std::env::current_dir().map_err(CardexError::Io)?;
        Self::discover_from(&current)
    }

    /// Same as [`ExtractionConfig::discover`] but starting at `start`.
    pub fn discover_from(start: &Path) -> Result<Option<Self>> {
        let mut current = start.to_path_buf();

        loop {
            let cardex_toml = current.join("cardex.toml");
            if cardex_toml.exists() {
                return Ok(Some(Self::from_toml_file(cardex_toml)?));
            }

            if let Some(parent) = current.parent() {
                current = parent.to_path_buf();
            } else {
                break;
            }
        }

        Ok(None)
    }
}

fn read_config(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .map_err(|e| CardexError::validation(format!("Failed to read config file {}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = ExtractionConfig::default();
        assert!(config.normalizer.fix_confusables);
        assert_eq!(config.marksheet.force_completion, ForceCompletionPolicy::Drop);
        assert_eq!(config.marksheet.max_semester, 12);
        assert_eq!(config.merge.acronym_max_len, 5);
        assert_eq!(config.merge.date_style, DateStyle::DayFirst);
        assert!(config.archive.is_none());
    }

    #[test]
    fn test_from_toml_file() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("cardex.toml");

        fs::write(
            &config_path,
            r#"
max_concurrent_extractions = 3

[marksheet]
force_completion = "default_unknown"

[merge]
date_style = "iso"
acronym_max_len = 4
        "#,
        )
        .unwrap();

        let config = ExtractionConfig::from_toml_file(&config_path).unwrap();
        assert_eq!(config.max_concurrent_extractions, Some(3));
        assert_eq!(config.marksheet.force_completion, ForceCompletionPolicy::DefaultUnknown);
        assert_eq!(config.marksheet.max_semester, 12);
        assert_eq!(config.merge.date_style, DateStyle::Iso);
        assert_eq!(config.merge.acronym_max_len, 4);
        assert_eq!(config.merge.location_suffixes, default_location_suffixes());
    }

    #[test]
    fn test_from_yaml_file() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("cardex.yaml");

        fs::write(
            &config_path,
            "normalizer:\n  fix_confusables: false\narchive:\n  dir: /tmp/out\n",
        )
        .unwrap();

        let config = ExtractionConfig::from_file(&config_path).unwrap();
        assert!(!config.normalizer.fix_confusables);
        let archive = config.archive.unwrap();
        assert_eq!(archive.dir, PathBuf::from("/tmp/out"));
        assert!(archive.copy_images);
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("cardex.json");
        fs::write(&config_path, r#"{"marksheet": {"merge_orphan_fragments": true}}"#).unwrap();

        let config = ExtractionConfig::from_json_file(&config_path).unwrap();
        assert!(config.marksheet.merge_orphan_fragments);
    }

    #[test]
    fn test_invalid_toml_names_file() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("broken.toml");
        fs::write(&config_path, "[marksheet\nmax_semester = ").unwrap();

        let err = ExtractionConfig::from_toml_file(&config_path).unwrap_err();
        assert!(matches!(err, CardexError::Validation { .. }));
        assert!(err.to_string().contains("broken.toml"));
    }

    #[test]
    fn test_missing_file_is_validation_error() {
        let result = ExtractionConfig::from_toml_file("/nonexistent/cardex.toml");
        assert!(matches!(result, Err(CardexError::Validation { .. })));
    }

    #[test]
    fn test_discover_from_parent_directory() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("cardex.toml"), "max_concurrent_extractions = 7\n").unwrap();
        let nested = dir.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();

        let config = ExtractionConfig::discover_from(&nested).unwrap().unwrap();
        assert_eq!(config.max_concurrent_extractions, Some(7));
    }
}
