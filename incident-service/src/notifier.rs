//! 外部通知：删除前的 Webhook 扇出与带身份令牌的删除触发

use std::sync::Arc;
use std::time::Duration;

use common::credentials::CredentialProvider;
use reqwest::{header::CONTENT_TYPE, Url};
use serde::Serialize;
use serde_json::json;
use utoipa::ToSchema;

/// 单个 Webhook 调用的结果
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WebhookDelivery {
    pub url: String,
    pub delivered: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// 按配置顺序将实例地址发送给每个接收方
#[derive(Clone)]
pub struct WebhookNotifier {
    http_client: reqwest::Client,
    urls: Vec<String>,
    timeout: Duration,
}

impl WebhookNotifier {
    pub fn new(http_client: reqwest::Client, urls: Vec<String>, timeout: Duration) -> Self {
        Self {
            http_client,
            urls,
            timeout,
        }
    }

    /// 尽力而为：失败只记录日志和结果，不重试，也不影响后续调用
    pub async fn notify_all(&self, ip_address: &str) -> Vec<WebhookDelivery> {
        let payload = json!({ "name": ip_address });
        let mut deliveries = Vec::with_capacity(self.urls.len());
        for url in &self.urls {
            deliveries.push(self.notify(url, &payload).await);
        }
        deliveries
    }

    async fn notify(&self, url: &str, payload: &serde_json::Value) -> WebhookDelivery {
        let result = self
            .http_client
            .post(url)
            .json(payload)
            .timeout(self.timeout)
            .send()
            .await;
        match result {
            Ok(response) => {
                let status = response.status();
                if status.is_success() {
                    tracing::info!(url, status = status.as_u16(), "Webhook 已送达");
                } else {
                    tracing::warn!(url, status = status.as_u16(), "Webhook 返回错误状态");
                }
                WebhookDelivery {
                    url: url.to_string(),
                    delivered: status.is_success(),
                    status: Some(status.as_u16()),
                    error: None,
                }
            }
            Err(err) => {
                tracing::warn!(url, timeout = err.is_timeout(), error = %err, "Webhook 调用失败");
                WebhookDelivery {
                    url: url.to_string(),
                    delivered: false,
                    status: None,
                    error: Some(err.to_string()),
                }
            }
        }
    }
}

/// 删除触发的结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum TriggerResult {
    /// 删除服务已响应（任意状态码）
    Sent { status: u16 },
    /// 超时未响应。删除服务会在实例删除完成前保持连接，属于预期情况
    TimedOut,
    Failed { error: String },
}

/// 调用删除服务的 `POST {base}/delete/{instance}`
#[derive(Clone)]
pub struct DeleteTrigger {
    http_client: reqwest::Client,
    credentials: Arc<dyn CredentialProvider>,
    base_url: String,
    timeout: Duration,
}

impl DeleteTrigger {
    pub fn new(
        http_client: reqwest::Client,
        credentials: Arc<dyn CredentialProvider>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            http_client,
            credentials,
            base_url: base_url.into(),
            timeout,
        }
    }

    fn delete_url(&self, instance: &str) -> Result<Url, String> {
        let mut url = Url::parse(&self.base_url).map_err(|e| e.to_string())?;
        url.path_segments_mut()
            .map_err(|_| format!("{} cannot carry a path", self.base_url))?
            .pop_if_empty()
            .extend(["delete", instance]);
        Ok(url)
    }

    /// 只发送一次；超时记录并返回，不重试
    pub async fn fire(&self, instance: &str) -> TriggerResult {
        let url = match self.delete_url(instance) {
            Ok(url) => url,
            Err(error) => {
                tracing::error!(instance, %error, "删除服务地址无效");
                return TriggerResult::Failed { error };
            }
        };
        let token = match self.credentials.identity_token(&self.base_url).await {
            Ok(token) => token,
            Err(err) => {
                tracing::error!(instance, error = %err, "获取身份令牌失败");
                return TriggerResult::Failed {
                    error: err.to_string(),
                };
            }
        };

        tracing::info!(instance, url = %url, "触发删除");
        let result = self
            .http_client
            .post(url)
            .bearer_auth(token)
            .header(CONTENT_TYPE, "application/json")
            .timeout(self.timeout)
            .send()
            .await;
        match result {
            Ok(response) => {
                let status = response.status().as_u16();
                tracing::info!(instance, status, "删除服务已响应");
                TriggerResult::Sent { status }
            }
            Err(err) if err.is_timeout() => {
                tracing::warn!(instance, "删除触发超时");
                TriggerResult::TimedOut
            }
            Err(err) => {
                tracing::error!(instance, error = %err, "删除触发失败");
                TriggerResult::Failed {
                    error: err.to_string(),
                }
            }
        }
    }
}
