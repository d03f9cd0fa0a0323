// src/system/config_service.rs

use async_trait::async_trait;
use thiserror::Error;

use crate::core::document::DocumentError;
use crate::models::{EnvSpecificConfig, OpsMatrixConfig};

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("Server responded with {status}: {message}")]
    Server { status: u16, message: String },
    #[error("Filesystem Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Error with temporary file: {0}")]
    TempFile(#[from] tempfile::PersistError),
    #[error("Config document error: {0}")]
    Document(#[from] DocumentError),
}

/// The persistence backend the store talks to. Exactly four operations: fetch, replace,
/// patch one environment's settings, and a liveness probe.
#[async_trait]
pub trait ConfigService: Send + Sync {
    /// Fetches the current config document.
    async fn fetch_config(&self) -> Result<OpsMatrixConfig, ServiceError>;

    /// Replaces the whole document. Returns the saved document.
    async fn save_config(&self, config: &OpsMatrixConfig) -> Result<OpsMatrixConfig, ServiceError>;

    /// Replaces one environment's `EnvSpecificConfig`. Returns the saved document.
    async fn patch_env_config(
        &self,
        env: &str,
        env_config: &EnvSpecificConfig,
    ) -> Result<OpsMatrixConfig, ServiceError>;

    /// Returns `true` when the backend is reachable.
    async fn health_check(&self) -> bool;

    /// Short human-readable description used in status output and logs.
    fn describe(&self) -> String;
}
