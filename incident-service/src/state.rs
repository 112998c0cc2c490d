//! 事件服务应用状态

use std::sync::Arc;
use std::time::Duration;

use common::config::AppConfig;
use common::credentials::{self, CredentialProvider};
use common::errors::{AppError, AppResult};
use sqladmin::SqlAdmin;

use crate::config::IncidentConfig;

/// 应用状态，启动后只读，在所有处理器间共享
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<IncidentConfig>,
    pub admin: SqlAdmin,
    pub credentials: Arc<dyn CredentialProvider>,
    pub http_client: reqwest::Client,
}

impl AppState {
    pub fn new(
        config: IncidentConfig,
        admin: SqlAdmin,
        credentials: Arc<dyn CredentialProvider>,
        http_client: reqwest::Client,
    ) -> Self {
        Self {
            config: Arc::new(config),
            admin,
            credentials,
            http_client,
        }
    }

    /// 解析凭据（仅一次）并创建 Admin API 客户端
    pub fn from_config(app: &AppConfig, config: IncidentConfig) -> AppResult<Self> {
        let http_client = build_http_client(config.http_timeout)?;
        let credentials = credentials::resolve(&app.google)?;
        let admin = SqlAdmin::new(
            &app.google.sqladmin_endpoint,
            http_client.clone(),
            credentials.clone(),
        )?;
        Ok(Self::new(config, admin, credentials, http_client))
    }
}

/// 共享 HTTP 客户端；单个请求设置的超时会覆盖默认值
pub fn build_http_client(timeout: Duration) -> AppResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| AppError::Internal(format!("failed to create HTTP client: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_http_client_has_default_timeout() {
        let server = MockServer::start().await;
        Mock::given(wiremock::matchers::any())
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let client = build_http_client(Duration::from_millis(100)).unwrap();
        let err = client.get(server.uri()).send().await.unwrap_err();
        assert!(err.is_timeout());
    }

    #[tokio::test]
    async fn test_request_timeout_overrides_default() {
        let server = MockServer::start().await;
        Mock::given(wiremock::matchers::any())
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(300)))
            .mount(&server)
            .await;

        let client = build_http_client(Duration::from_millis(100)).unwrap();
        let response = client
            .get(server.uri())
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 200);
    }
}
