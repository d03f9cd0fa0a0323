// src/core/paths.rs

use lazy_static::lazy_static;
use std::env;
use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};
use thiserror::Error;

use crate::constants::{
    APP_DIR_NAME, DEFAULT_DOCUMENT_FILENAME, SESSION_CACHE_FILENAME, SETTINGS_ENV_VAR,
    SETTINGS_FILENAME,
};

lazy_static! {
    static ref CONFIG_DIR: Mutex<Option<PathBuf>> = Mutex::new(None);
}

#[derive(Error, Debug)]
pub enum PathError {
    #[error("Could not find system config directory.")]
    ConfigDirNotFound,
    #[error("Could not create config directory at '{path}': {source}")]
    ConfigDirCreation {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to expand path '{template}': {message}")]
    Expansion { template: String, message: String },
}

/// Returns the opsmatrix configuration directory (`~/.config/opsmatrix` on Linux),
/// creating it on first use.
///
/// Memoized: only the first call touches the filesystem.
pub fn config_dir() -> Result<PathBuf, PathError> {
    let mut cached = CONFIG_DIR.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(path) = &*cached {
        return Ok(path.clone());
    }

    let path = dirs::config_dir()
        .ok_or(PathError::ConfigDirNotFound)?
        .join(APP_DIR_NAME);
    if !path.exists() {
        fs::create_dir_all(&path).map_err(|e| PathError::ConfigDirCreation {
            path: path.display().to_string(),
            source: e,
        })?;
    }

    *cached = Some(path.clone());
    Ok(path)
}

/// The settings file. `OPSMATRIX_SETTINGS` points somewhere else entirely.
pub fn settings_path() -> Result<PathBuf, PathError> {
    match env::var(SETTINGS_ENV_VAR) {
        Ok(custom) if !custom.trim().is_empty() => expand_path(&custom),
        _ => config_dir().map(|dir| dir.join(SETTINGS_FILENAME)),
    }
}

/// Where the file backend keeps the document when settings do not say otherwise.
pub fn default_document_path() -> Result<PathBuf, PathError> {
    config_dir().map(|dir| dir.join(DEFAULT_DOCUMENT_FILENAME))
}

pub fn session_cache_path() -> Result<PathBuf, PathError> {
    config_dir().map(|dir| dir.join(SESSION_CACHE_FILENAME))
}

/// Expands `~` and environment variables (`$VAR`, `${VAR}`) in a user-supplied path.
pub fn expand_path(template: &str) -> Result<PathBuf, PathError> {
    let expanded = shellexpand::full(template).map_err(|e| PathError::Expansion {
        template: template.to_string(),
        message: e.to_string(),
    })?;
    Ok(PathBuf::from(expanded.into_owned()))
}
