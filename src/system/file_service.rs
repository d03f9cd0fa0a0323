// src/system/file_service.rs

use async_trait::async_trait;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::core::document::{self, DocumentFormat};
use crate::models::{EnvSpecificConfig, OpsMatrixConfig};
use crate::system::config_service::{ConfigService, ServiceError};

/// Keeps the config document in a local YAML or JSON file (format by extension).
///
/// A missing file reads as the default, empty document. Writes go through a temporary
/// file in the same directory and are renamed into place.
#[derive(Debug, Clone)]
pub struct FileConfigService {
    path: PathBuf,
}

impl FileConfigService {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(path: &Path) -> Result<OpsMatrixConfig, ServiceError> {
        match fs::read_to_string(path) {
            Ok(text) if text.trim().is_empty() => Ok(OpsMatrixConfig::default()),
            Ok(text) => Ok(document::parse_config(&text, DocumentFormat::from_path(path))?),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::info!(
                    "No config document at '{}'. Starting from an empty matrix.",
                    path.display()
                );
                Ok(OpsMatrixConfig::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn write(path: &Path, config: &OpsMatrixConfig) -> Result<(), ServiceError> {
        let text = document::export_config(config, DocumentFormat::from_path(path))?;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;
        let mut temp = NamedTempFile::new_in(&dir)?;
        temp.write_all(text.as_bytes())?;
        temp.flush()?;
        temp.persist(path)?;
        log::debug!("Wrote config document to '{}'", path.display());
        Ok(())
    }

    /// Runs blocking file work off the async executor.
    async fn blocking<T, F>(&self, work: F) -> Result<T, ServiceError>
    where
        T: Send + 'static,
        F: FnOnce(PathBuf) -> Result<T, ServiceError> + Send + 'static,
    {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || work(path))
            .await
            .map_err(|e| ServiceError::Io(std::io::Error::other(e)))?
    }
}

#[async_trait]
impl ConfigService for FileConfigService {
    async fn fetch_config(&self) -> Result<OpsMatrixConfig, ServiceError> {
        self.blocking(|path| Self::read(&path)).await
    }

    async fn save_config(&self, config: &OpsMatrixConfig) -> Result<OpsMatrixConfig, ServiceError> {
        let config = config.clone();
        self.blocking(move |path| {
            Self::write(&path, &config)?;
            Ok(config)
        })
        .await
    }

    async fn patch_env_config(
        &self,
        env: &str,
        env_config: &EnvSpecificConfig,
    ) -> Result<OpsMatrixConfig, ServiceError> {
        let env = env.to_string();
        let env_config = env_config.clone();
        self.blocking(move |path| {
            let mut config = Self::read(&path)?;
            if env_config.is_empty() {
                config.env_configs.remove(&env);
            } else {
                config.env_configs.insert(env, env_config);
            }
            Self::write(&path, &config)?;
            Ok(config)
        })
        .await
    }

    async fn health_check(&self) -> bool {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.exists(),
            _ => true,
        }
    }

    fn describe(&self) -> String {
        format!("file '{}'", self.path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ServiceDefinition, ViewMode};
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_missing_file_reads_as_default() {
        let dir = tempdir().unwrap();
        let service = FileConfigService::new(dir.path().join("matrix.yaml"));
        let config = service.fetch_config().await.unwrap();
        assert_eq!(config, OpsMatrixConfig::default());
    }

    #[tokio::test]
    async fn test_save_then_fetch() {
        let dir = tempdir().unwrap();
        for name in ["matrix.yaml", "matrix.json"] {
            let service = FileConfigService::new(dir.path().join("nested").join(name));
            let config = OpsMatrixConfig {
                environments: vec!["prod".into()],
                services: vec![ServiceDefinition::new("api", "API")],
                ..Default::default()
            };
            let echoed = service.save_config(&config).await.unwrap();
            assert_eq!(echoed, config);
            assert_eq!(service.fetch_config().await.unwrap(), config);
        }
        let json = fs::read_to_string(dir.path().join("nested").join("matrix.json")).unwrap();
        assert!(json.trim_start().starts_with('{'));
    }

    #[tokio::test]
    async fn test_patch_env_config_touches_one_environment() {
        let dir = tempdir().unwrap();
        let service = FileConfigService::new(dir.path().join("matrix.yaml"));
        let base = OpsMatrixConfig {
            environments: vec!["prod".into(), "dev".into()],
            ..Default::default()
        };
        service.save_config(&base).await.unwrap();

        let patch = EnvSpecificConfig {
            visible_services: Some(vec![]),
            view_mode: Some(ViewMode::List),
            ..Default::default()
        };
        let saved = service.patch_env_config("prod", &patch).await.unwrap();
        assert_eq!(saved.env_configs.get("prod"), Some(&patch));
        assert!(saved.env_configs.get("dev").is_none());

        let cleared = service
            .patch_env_config("prod", &EnvSpecificConfig::default())
            .await
            .unwrap();
        assert!(cleared.env_configs.is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_a_document_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("matrix.yaml");
        fs::write(&path, "services: [").unwrap();
        let service = FileConfigService::new(path);
        assert!(matches!(
            service.fetch_config().await,
            Err(ServiceError::Document(_))
        ));
    }
}
