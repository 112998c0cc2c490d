//! 事件服务配置

use std::time::Duration;

use common::config::{env_list, env_or, env_parse, env_required, AppConfig};
use common::errors::{AppError, AppResult};
use reqwest::Url;
use sqladmin::PollPolicy;

/// 事件处理流程配置（告警 → 通知 → 删除）
#[derive(Debug, Clone)]
pub struct IncidentConfig {
    pub project: String,
    /// 候选实例名称必须包含的子串
    pub instance_filter: String,
    /// 删除前接收实例地址通知的 Webhook 列表
    pub webhooks: Vec<String>,
    /// 提供 `POST /delete/{instance}` 的删除服务地址，同时作为身份令牌的 audience
    pub delete_service_url: String,
    pub webhook_timeout: Duration,
    /// Webhook 通知与删除触发之间的等待时间
    pub settle_delay: Duration,
    pub trigger_timeout: Duration,
    /// 出站 HTTP 请求的默认超时（Admin API 调用）
    pub http_timeout: Duration,
    pub readiness: PollPolicy,
    pub deprovision: PollPolicy,
}

impl IncidentConfig {
    /// 从环境变量加载配置
    pub fn from_env(app: &AppConfig) -> AppResult<Self> {
        let delete_service_url = env_required("DELETE_SERVICE_URL")?
            .trim_end_matches('/')
            .to_string();
        Url::parse(&delete_service_url).map_err(|e| {
            AppError::Config(format!("DELETE_SERVICE_URL is not a URL: {e}"))
        })?;

        Ok(Self {
            project: app.require_project()?,
            instance_filter: env_or("INSTANCE_NAME_FILTER", "autorep"),
            webhooks: env_list("DELETION_WEBHOOKS"),
            delete_service_url,
            webhook_timeout: Duration::from_secs(env_parse("WEBHOOK_TIMEOUT_SECS", 10)?),
            settle_delay: Duration::from_secs(env_parse("WEBHOOK_SETTLE_SECS", 10)?),
            trigger_timeout: Duration::from_secs(env_parse("DELETE_TRIGGER_TIMEOUT_SECS", 1)?),
            http_timeout: Duration::from_secs(env_parse("SQLADMIN_TIMEOUT_SECS", 30)?),
            readiness: PollPolicy::from_secs(
                env_parse("READINESS_POLL_SECS", 5)?,
                env_parse("READINESS_MAX_WAIT_SECS", 60)?,
            ),
            deprovision: PollPolicy::from_secs(
                env_parse("DEPROVISION_POLL_SECS", 30)?,
                env_parse("DEPROVISION_MAX_WAIT_SECS", 600)?,
            ),
        })
    }
}
