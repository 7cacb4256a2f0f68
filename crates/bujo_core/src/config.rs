//! Core configuration.
//!
//! # Responsibility
//! - Hold tunables for logging and line extraction.
//! - Load them from JSON with per-field defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Prefix the OCR collaborator writes when it could not read an image.
pub const DEFAULT_OCR_FAILURE_MARKER: &str = "OCR extraction failed";
/// Lines shorter than this are treated as scan noise, not notes.
pub const DEFAULT_MIN_NOTE_CHARS: usize = 2;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config `{path}`: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Rules applied while turning raw page text into entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionOptions {
    /// Minimum trimmed character count for a fallback note.
    pub min_note_chars: usize,
    /// Text starting with this prefix is an OCR failure report, not page text.
    pub ocr_failure_marker: String,
}

impl Default for ExtractionOptions {
    fn default() -> Self {
        Self {
            min_note_chars: DEFAULT_MIN_NOTE_CHARS,
            ocr_failure_marker: DEFAULT_OCR_FAILURE_MARKER.to_string(),
        }
    }
}

/// Top-level configuration for embedding callers and the CLI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// One of `trace|debug|info|warn|error`.
    pub log_level: String,
    /// Absolute directory for rolling log files. Logging stays off when unset.
    pub log_dir: Option<PathBuf>,
    pub extraction: ExtractionOptions,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            log_level: crate::logging::default_log_level().to_string(),
            log_dir: None,
            extraction: ExtractionOptions::default(),
        }
    }
}

impl CoreConfig {
    /// Parses a JSON document. Missing fields fall back to defaults.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.extraction.min_note_chars == 0 {
            return Err(ConfigError::Invalid(
                "extraction.min_note_chars must be at least 1".to_string(),
            ));
        }
        if self.extraction.ocr_failure_marker.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "extraction.ocr_failure_marker must not be blank".to_string(),
            ));
        }
        if let Some(dir) = &self.log_dir {
            if !dir.is_absolute() {
                return Err(ConfigError::Invalid(format!(
                    "log_dir must be an absolute path, got `{}`",
                    dir.display()
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, CoreConfig, DEFAULT_OCR_FAILURE_MARKER};

    #[test]
    fn empty_document_uses_defaults() {
        let config = CoreConfig::from_json_str("{}").unwrap();
        assert_eq!(config, CoreConfig::default());
        assert_eq!(
            config.extraction.ocr_failure_marker,
            DEFAULT_OCR_FAILURE_MARKER
        );
    }

    #[test]
    fn partial_extraction_block_keeps_other_defaults() {
        let config =
            CoreConfig::from_json_str(r#"{"extraction": {"min_note_chars": 4}}"#).unwrap();
        assert_eq!(config.extraction.min_note_chars, 4);
        assert_eq!(
            config.extraction.ocr_failure_marker,
            DEFAULT_OCR_FAILURE_MARKER
        );
    }

    #[test]
    fn rejects_zero_note_threshold_and_relative_log_dir() {
        let err = CoreConfig::from_json_str(r#"{"extraction": {"min_note_chars": 0}}"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = CoreConfig::from_json_str(r#"{"log_dir": "logs"}"#).unwrap_err();
        assert!(err.to_string().contains("absolute"));
    }

    #[test]
    fn load_reads_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bujo.json");
        std::fs::write(&path, r#"{"log_level": "warn"}"#).unwrap();

        let config = CoreConfig::load(&path).unwrap();
        assert_eq!(config.log_level, "warn");
    }
}
