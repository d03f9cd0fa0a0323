// src/core/document.rs

//! # Config Document Codec
//!
//! Parses and serializes the `OpsMatrixConfig` document in YAML or JSON. Missing top-level
//! collections default to empty; everything defined in the schema survives a round-trip.

use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

use crate::models::OpsMatrixConfig;

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("Invalid YAML document: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Invalid JSON document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("The document is empty.")]
    Empty,
    #[error("Unknown document format '{0}'. Expected 'yaml' or 'json'.")]
    UnknownFormat(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DocumentFormat {
    #[default]
    Yaml,
    Json,
}

impl DocumentFormat {
    /// Picks a format from a file extension. Anything that is not `.json` is YAML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => DocumentFormat::Json,
            _ => DocumentFormat::Yaml,
        }
    }

    /// Guesses the format of raw text: a leading `{` means JSON.
    pub fn sniff(text: &str) -> Self {
        if text.trim_start().starts_with('{') {
            DocumentFormat::Json
        } else {
            DocumentFormat::Yaml
        }
    }
}

impl FromStr for DocumentFormat {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "yaml" | "yml" => Ok(DocumentFormat::Yaml),
            "json" => Ok(DocumentFormat::Json),
            other => Err(DocumentError::UnknownFormat(other.to_string())),
        }
    }
}

/// Parses a document in the given format.
pub fn parse_config(text: &str, format: DocumentFormat) -> Result<OpsMatrixConfig, DocumentError> {
    if text.trim().is_empty() {
        return Err(DocumentError::Empty);
    }
    let config = match format {
        DocumentFormat::Yaml => serde_yaml::from_str(text)?,
        DocumentFormat::Json => serde_json::from_str(text)?,
    };
    Ok(config)
}

/// Parses a document, guessing its format from the content.
pub fn parse_config_auto(text: &str) -> Result<OpsMatrixConfig, DocumentError> {
    parse_config(text, DocumentFormat::sniff(text))
}

/// Serializes a document in the given format.
pub fn export_config(
    config: &OpsMatrixConfig,
    format: DocumentFormat,
) -> Result<String, DocumentError> {
    match format {
        DocumentFormat::Yaml => Ok(serde_yaml::to_string(config)?),
        DocumentFormat::Json => Ok(serde_json::to_string_pretty(config)?),
    }
}
