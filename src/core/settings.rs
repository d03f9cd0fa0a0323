// src/core/settings.rs

//! # Application Settings
//!
//! Local, per-user settings read from `settings.toml`. They choose the config backend and
//! tune the store; they are never part of the shared config document.
//!
//! ```toml
//! backend = "http"                 # file | http | memory
//! api_url = "http://localhost:3001/api"
//! document = "~/ops/matrix.yaml"   # file backend only
//! debounce_ms = 500
//! default_view_mode = "grid"
//! substitute_link_urls = false
//!
//! [vars]
//! domain = "example.com"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::constants::{API_URL_ENV_VAR, DEFAULT_DEBOUNCE};
use crate::core::paths::{self, PathError};
use crate::core::url_resolver::LinkUrlMode;
use crate::models::ViewMode;
use crate::state::StoreOptions;
use crate::system::config_service::{ConfigService, ServiceError};
use crate::system::file_service::FileConfigService;
use crate::system::http_service::HttpConfigService;
use crate::system::memory_service::MemoryConfigService;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Filesystem Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid settings file: {0}")]
    Toml(#[from] toml::de::Error),
    #[error(transparent)]
    Path(#[from] PathError),
    #[error("The http backend needs an 'api_url' (or the {0} environment variable).")]
    MissingApiUrl(&'static str),
    #[error(transparent)]
    Service(#[from] ServiceError),
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    File,
    Http,
    Memory,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct AppSettings {
    pub backend: Backend,
    pub document: Option<String>,
    pub api_url: Option<String>,
    pub debounce_ms: u64,
    pub default_view_mode: ViewMode,
    pub substitute_link_urls: bool,
    /// Global template variables, the lowest layer of every substitution table.
    pub vars: BTreeMap<String, String>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            backend: Backend::File,
            document: None,
            api_url: None,
            debounce_ms: u64::try_from(DEFAULT_DEBOUNCE.as_millis()).unwrap_or(u64::MAX),
            default_view_mode: ViewMode::Grid,
            substitute_link_urls: false,
            vars: BTreeMap::new(),
        }
    }
}

impl AppSettings {
    /// Loads the settings file (missing = defaults) and applies environment overrides.
    pub fn load() -> Result<Self, SettingsError> {
        let path = paths::settings_path()?;
        let settings = Self::load_from(&path)?;
        Ok(settings.with_api_url_override(env::var(API_URL_ENV_VAR).ok()))
    }

    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            log::debug!("No settings file at '{}'. Using defaults.", path.display());
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        let settings = Self::from_toml_str(&content)?;
        log::debug!("Loaded settings from '{}'", path.display());
        Ok(settings)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, SettingsError> {
        Ok(toml::from_str(content)?)
    }

    /// A non-empty API URL from the environment wins over the file and selects http.
    pub fn with_api_url_override(mut self, api_url: Option<String>) -> Self {
        if let Some(url) = api_url.filter(|u| !u.trim().is_empty()) {
            self.api_url = Some(url);
            self.backend = Backend::Http;
        }
        self
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn link_url_mode(&self) -> LinkUrlMode {
        if self.substitute_link_urls {
            LinkUrlMode::Substituted
        } else {
            LinkUrlMode::Literal
        }
    }

    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            debounce: self.debounce(),
            default_view_mode: self.default_view_mode,
        }
    }

    /// The document file for the file backend, with `~` and `$VAR` expanded.
    pub fn document_path(&self) -> Result<PathBuf, SettingsError> {
        match &self.document {
            Some(template) => Ok(paths::expand_path(template)?),
            None => Ok(paths::default_document_path()?),
        }
    }

    /// Builds the config service selected by `backend`.
    pub fn open_service(&self) -> Result<Arc<dyn ConfigService>, SettingsError> {
        let service: Arc<dyn ConfigService> = match self.backend {
            Backend::File => Arc::new(FileConfigService::new(self.document_path()?)),
            Backend::Http => {
                let url = self
                    .api_url
                    .as_deref()
                    .ok_or(SettingsError::MissingApiUrl(API_URL_ENV_VAR))?;
                Arc::new(HttpConfigService::new(url)?)
            }
            Backend::Memory => Arc::new(MemoryConfigService::default()),
        };
        log::debug!("Using config backend: {}", service.describe());
        Ok(service)
    }
}
