// src/system/memory_service.rs

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::models::{EnvSpecificConfig, OpsMatrixConfig};
use crate::system::config_service::{ConfigService, ServiceError};

/// Keeps the document in process memory. Backs `--dry-run` sessions (seeded from the real
/// backend, nothing written back) and the test suite, which inspects the call counters.
#[derive(Debug, Default)]
pub struct MemoryConfigService {
    config: Mutex<OpsMatrixConfig>,
    save_calls: AtomicUsize,
    patched: Mutex<Vec<String>>,
    failing: AtomicBool,
}

impl MemoryConfigService {
    pub fn with_config(config: OpsMatrixConfig) -> Self {
        Self {
            config: Mutex::new(config),
            ..Default::default()
        }
    }

    fn document(&self) -> MutexGuard<'_, OpsMatrixConfig> {
        self.config.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The document as last saved or patched.
    pub fn current(&self) -> OpsMatrixConfig {
        self.document().clone()
    }

    /// Number of `save_config` calls, failed ones included.
    pub fn save_calls(&self) -> usize {
        self.save_calls.load(Ordering::SeqCst)
    }

    /// Environments passed to `patch_env_config`, in call order.
    pub fn patched_envs(&self) -> Vec<String> {
        self.patched
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Makes every operation fail with a server error until turned off again.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check_failing(&self) -> Result<(), ServiceError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ServiceError::Server {
                status: 503,
                message: "service unavailable".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ConfigService for MemoryConfigService {
    async fn fetch_config(&self) -> Result<OpsMatrixConfig, ServiceError> {
        self.check_failing()?;
        Ok(self.current())
    }

    async fn save_config(&self, config: &OpsMatrixConfig) -> Result<OpsMatrixConfig, ServiceError> {
        self.save_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failing()?;
        *self.document() = config.clone();
        Ok(config.clone())
    }

    async fn patch_env_config(
        &self,
        env: &str,
        env_config: &EnvSpecificConfig,
    ) -> Result<OpsMatrixConfig, ServiceError> {
        self.patched
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(env.to_string());
        self.check_failing()?;
        let mut document = self.document();
        if env_config.is_empty() {
            document.env_configs.remove(env);
        } else {
            document
                .env_configs
                .insert(env.to_string(), env_config.clone());
        }
        Ok(document.clone())
    }

    async fn health_check(&self) -> bool {
        !self.failing.load(Ordering::SeqCst)
    }

    fn describe(&self) -> String {
        "in-memory document".to_string()
    }
}
