// src/system/http_service.rs

use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use std::time::Duration;

use crate::models::{EnvSpecificConfig, OpsMatrixConfig};
use crate::system::config_service::{ConfigService, ServiceError};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const HEALTH_TIMEOUT: Duration = Duration::from_secs(3);

/// Talks to the config REST API:
///
/// - `GET   {base}/config`
/// - `PUT   {base}/config`
/// - `PATCH {base}/config/env/{env}`
/// - `GET   {base}/health`
#[derive(Debug, Clone)]
pub struct HttpConfigService {
    client: Client,
    base_url: String,
}

impl HttpConfigService {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ServiceError::Network(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// `{base}/config/env/{env}` with the environment as one percent-encoded path segment,
    /// so names containing `/`, `?` or `#` still address that environment.
    fn env_url(&self, env: &str) -> Result<Url, ServiceError> {
        let mut url = Url::parse(&self.url("config/env"))
            .map_err(|e| ServiceError::Network(format!("invalid api url: {}", e)))?;
        url.path_segments_mut()
            .map_err(|()| ServiceError::Network("api url cannot take a path".to_string()))?
            .push(env);
        Ok(url)
    }

    /// Maps transport failures and non-success statuses to `ServiceError`, then decodes
    /// the echoed document.
    async fn decode(result: reqwest::Result<Response>) -> Result<OpsMatrixConfig, ServiceError> {
        let response = result.map_err(|e| ServiceError::Network(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| status.canonical_reason().unwrap_or("").to_string());
            return Err(ServiceError::Server {
                status: status.as_u16(),
                message,
            });
        }
        response
            .json::<OpsMatrixConfig>()
            .await
            .map_err(|e| ServiceError::Network(format!("invalid response body: {}", e)))
    }
}

#[async_trait]
impl ConfigService for HttpConfigService {
    async fn fetch_config(&self) -> Result<OpsMatrixConfig, ServiceError> {
        log::debug!("GET {}", self.url("config"));
        Self::decode(self.client.get(self.url("config")).send().await).await
    }

    async fn save_config(&self, config: &OpsMatrixConfig) -> Result<OpsMatrixConfig, ServiceError> {
        log::debug!("PUT {}", self.url("config"));
        Self::decode(self.client.put(self.url("config")).json(config).send().await).await
    }

    async fn patch_env_config(
        &self,
        env: &str,
        env_config: &EnvSpecificConfig,
    ) -> Result<OpsMatrixConfig, ServiceError> {
        let url = self.env_url(env)?;
        log::debug!("PATCH {}", url);
        Self::decode(self.client.patch(url).json(env_config).send().await).await
    }

    async fn health_check(&self) -> bool {
        match self
            .client
            .get(self.url("health"))
            .timeout(HEALTH_TIMEOUT)
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                log::debug!("Health probe failed: {}", e);
                false
            }
        }
    }

    fn describe(&self) -> String {
        format!("api '{}'", self.base_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joining() {
        let service = HttpConfigService::new("http://localhost:3001/api/").unwrap();
        assert_eq!(service.url("config"), "http://localhost:3001/api/config");
        assert_eq!(service.url("/health"), "http://localhost:3001/api/health");
    }

    #[test]
    fn test_env_url_keeps_the_name_in_one_segment() {
        let service = HttpConfigService::new("http://localhost:3001/api").unwrap();

        let url = service.env_url("prod").unwrap();
        assert_eq!(url.as_str(), "http://localhost:3001/api/config/env/prod");

        let url = service.env_url("qa?x=1").unwrap();
        assert_eq!(url.path(), "/api/config/env/qa%3Fx=1");
        assert_eq!(url.query(), None);

        let url = service.env_url("eu/prod").unwrap();
        assert_eq!(url.path(), "/api/config/env/eu%2Fprod");

        let url = service.env_url("lab #2").unwrap();
        assert_eq!(url.path(), "/api/config/env/lab%20%232");
        assert_eq!(url.fragment(), None);
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_a_network_error() {
        // Port 9 (discard) on localhost is closed in test environments.
        let service = HttpConfigService::new("http://127.0.0.1:9/api").unwrap();
        assert!(!service.health_check().await);
        assert!(matches!(
            service.fetch_config().await,
            Err(ServiceError::Network(_))
        ));
    }
}
