//! 事件处理业务逻辑

use std::sync::Arc;

use common::errors::{AppError, AppResult};
use common::models::{IncidentNotification, InstanceState};
use serde::Serialize;
use sqladmin::SqlAdmin;
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::config::IncidentConfig;
use crate::notifier::{DeleteTrigger, TriggerResult, WebhookDelivery, WebhookNotifier};
use crate::state::AppState;

/// 告警事件的处理结果
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum IntakeOutcome {
    /// 没有匹配命名规则的实例，副本数已是最小值
    NoMatchingInstance { filter: String },
    IncidentNotOpen { instance: String, state: String },
    InstanceNotReady {
        instance: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        last_state: Option<InstanceState>,
    },
    InstanceHasNoAddress { instance: String },
    DeletionTriggered {
        instance: String,
        ip_address: String,
        webhooks: Vec<WebhookDelivery>,
        trigger: TriggerResult,
    },
}

/// 直接删除请求的结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct DeletionOutcome {
    pub instance: String,
    /// Admin API 已接受删除请求
    pub accepted: bool,
    /// 在截止时间前实例已不存在
    pub deprovisioned: bool,
}

/// 事件服务
pub struct IncidentService {
    config: Arc<IncidentConfig>,
    admin: SqlAdmin,
    notifier: WebhookNotifier,
    trigger: DeleteTrigger,
}

impl IncidentService {
    pub fn new(state: &AppState) -> Self {
        let config = state.config.clone();
        let notifier = WebhookNotifier::new(
            state.http_client.clone(),
            config.webhooks.clone(),
            config.webhook_timeout,
        );
        let trigger = DeleteTrigger::new(
            state.http_client.clone(),
            state.credentials.clone(),
            config.delete_service_url.clone(),
            config.trigger_timeout,
        );
        Self {
            config,
            admin: state.admin.clone(),
            notifier,
            trigger,
        }
    }

    /// 处理一条告警：查找实例、状态检查、Webhook 通知、延迟后触发删除
    ///
    /// 只有实例查找失败会返回错误，其余分支都作为处理结果返回
    pub async fn handle_notification(
        &self,
        notification: &IncidentNotification,
    ) -> AppResult<IntakeOutcome> {
        let project = &self.config.project;
        let filter = &self.config.instance_filter;

        let instances = self.admin.instances().list(project).await.map_err(|e| {
            AppError::ExternalService(format!("instance discovery failed: {e}"))
        })?;
        let Some(candidate) = instances.into_iter().find(|i| i.name.contains(filter.as_str()))
        else {
            info!(project = %project, filter = %filter, "没有匹配的实例，已达到最小数量");
            return Ok(IntakeOutcome::NoMatchingInstance {
                filter: filter.clone(),
            });
        };
        let name = candidate.name;

        if !notification.is_open() {
            info!(instance = %name, state = %notification.incident.state, "事件未处于 open 状态，忽略");
            return Ok(IntakeOutcome::IncidentNotOpen {
                instance: name,
                state: notification.incident.state.clone(),
            });
        }

        let observed = self
            .admin
            .instances()
            .wait_for_state(project, &name, InstanceState::Runnable, self.config.readiness)
            .await;
        let instance = match observed {
            Some(instance) if instance.is_runnable() => instance,
            other => {
                let last_state = other.and_then(|i| i.state);
                warn!(instance = %name, state = ?last_state, "实例未就绪，跳过删除");
                return Ok(IntakeOutcome::InstanceNotReady {
                    instance: name,
                    last_state,
                });
            }
        };

        let Some(ip_address) = instance.first_ip_address().map(str::to_string) else {
            warn!(instance = %name, "实例没有 IP 地址，跳过删除");
            return Ok(IntakeOutcome::InstanceHasNoAddress { instance: name });
        };

        info!(instance = %name, ip = %ip_address, webhooks = self.config.webhooks.len(), "通知外部系统");
        let webhooks = self.notifier.notify_all(&ip_address).await;
        let delivered = webhooks.iter().filter(|d| d.delivered).count();
        info!(instance = %name, delivered, total = webhooks.len(), "Webhook 通知完成");

        tokio::time::sleep(self.config.settle_delay).await;
        let trigger = self.trigger.fire(&name).await;

        Ok(IntakeOutcome::DeletionTriggered {
            instance: name,
            ip_address,
            webhooks,
            trigger,
        })
    }

    /// 删除实例并等待其消失
    pub async fn delete_instance(&self, instance: &str) -> DeletionOutcome {
        let project = &self.config.project;
        info!(instance, project = %project, "删除实例");

        let accepted = self.admin.instances().delete(project, instance).await;
        let deprovisioned = if accepted {
            self.admin
                .instances()
                .wait_until_deleted(project, instance, self.config.deprovision)
                .await
        } else {
            warn!(instance, "删除请求未被接受");
            false
        };

        if deprovisioned {
            info!(instance, "实例已删除");
        } else if accepted {
            warn!(instance, "等待实例删除超时");
        }

        DeletionOutcome {
            instance: instance.to_string(),
            accepted,
            deprovisioned,
        }
    }
}
